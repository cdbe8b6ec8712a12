// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! User settings stored as `settings.json` in the app data directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Settings file name inside the data directory.
const SETTINGS_FILE: &str = "settings.json";
/// Environment variable overriding the schema location.
pub const SCHEMA_ENV: &str = "MUND_SCHEMA";
/// Schema bundled next to the executable's working directory.
pub const DEFAULT_SCHEMA_PATH: &str = "schema/data.schema.json";
/// Export name used when the entry has no dataset ID yet.
pub const DEFAULT_FILE_NAME: &str = "entry.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// JSON Schema describing an entry.
    pub schema_path: Option<String>,
    /// Optional UI schema replacing the built-in presentation hints.
    pub ui_schema_path: Option<String>,
    /// Suggested export file name when no dataset ID is available.
    pub default_file_name: String,
    /// Directory of the last successful export.
    pub last_export_dir: Option<String>,
    /// Indent exported JSON instead of writing it compactly.
    pub pretty_json: bool,

    // Window geometry
    pub window_w: Option<f32>,
    pub window_h: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_path: None,
            ui_schema_path: None,
            default_file_name: DEFAULT_FILE_NAME.to_string(),
            last_export_dir: None,
            pretty_json: false,
            window_w: None,
            window_h: None,
        }
    }
}

impl Settings {
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(SETTINGS_FILE);
        match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(settings) => {
                    debug!(path = %path.display(), "Settings loaded");
                    settings
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse settings, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No settings file found, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, data_dir: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;
        let path = data_dir.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;
        debug!(path = %path.display(), "Settings saved");
        Ok(())
    }

    /// Resolve the schema location: environment override, then settings, then the bundled schema.
    pub fn schema_path_or_default(&self) -> PathBuf {
        self.resolve_schema_path(std::env::var_os(SCHEMA_ENV))
    }

    fn resolve_schema_path(&self, env_override: Option<OsString>) -> PathBuf {
        env_override
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.schema_path.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCHEMA_PATH))
    }

    pub fn ui_schema_path(&self) -> Option<PathBuf> {
        self.ui_schema_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }

    pub fn last_export_dir(&self) -> Option<PathBuf> {
        self.last_export_dir.as_ref().map(PathBuf::from)
    }

    /// Fallback export name, never empty.
    pub fn default_file_name(&self) -> &str {
        let name = self.default_file_name.trim();
        if name.is_empty() {
            DEFAULT_FILE_NAME
        } else {
            name
        }
    }
}

/// Per-user data directory holding settings and logs.
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mund-entry")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path());
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_file_name(), DEFAULT_FILE_NAME);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested");
        let settings = Settings {
            schema_path: Some("/opt/mund/data.schema.json".into()),
            last_export_dir: Some("/home/user/entries".into()),
            pretty_json: true,
            ..Default::default()
        };

        settings.save(&dir).unwrap();
        assert_eq!(Settings::load(&dir), settings);
    }

    #[test]
    fn partial_file_fills_missing_keys() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(SETTINGS_FILE), r#"{"pretty_json": true}"#).unwrap();

        let settings = Settings::load(tmp.path());
        assert!(settings.pretty_json);
        assert_eq!(settings.default_file_name, DEFAULT_FILE_NAME);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(SETTINGS_FILE), "{not json").unwrap();
        assert_eq!(Settings::load(tmp.path()), Settings::default());
    }

    #[test]
    fn blank_default_file_name_uses_builtin() {
        let settings = Settings {
            default_file_name: "   ".into(),
            ..Default::default()
        };
        assert_eq!(settings.default_file_name(), DEFAULT_FILE_NAME);
    }

    #[test]
    fn schema_env_override_wins_over_settings() {
        let settings = Settings {
            schema_path: Some("/opt/mund/data.schema.json".into()),
            ..Default::default()
        };
        assert_eq!(
            settings.resolve_schema_path(Some(OsString::from("/tmp/other.schema.json"))),
            PathBuf::from("/tmp/other.schema.json")
        );
        assert_eq!(
            settings.resolve_schema_path(None),
            PathBuf::from("/opt/mund/data.schema.json")
        );
    }

    #[test]
    fn empty_schema_env_is_ignored() {
        let settings = Settings::default();
        assert_eq!(
            settings.resolve_schema_path(Some(OsString::new())),
            PathBuf::from(DEFAULT_SCHEMA_PATH)
        );
        assert_eq!(settings.resolve_schema_path(None), PathBuf::from(DEFAULT_SCHEMA_PATH));
    }

    #[test]
    fn blank_ui_schema_path_is_ignored() {
        let settings = Settings {
            ui_schema_path: Some(" ".into()),
            ..Default::default()
        };
        assert!(settings.ui_schema_path().is_none());
    }
}
