// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Writing finished entries to disk and reading them back.
//!
//! Responsibilities:
//! - Suggest an export file name from the entry's dataset ID.
//! - Serialize form data as compact (or indented) JSON.
//! - Load a previously exported entry so it can be edited again.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::info;

use crate::utils::sanitize_component;

/// Extension enforced on exported entries.
pub const ENTRY_EXTENSION: &str = "json";

/// Property whose value names the exported file.
const NAME_PROPERTY: &str = "datasetId";

/// Suggest a file name for `data`: the sanitized dataset ID, or `fallback`.
pub fn suggested_file_name(data: &Value, fallback: &str) -> String {
    let id = data
        .get(NAME_PROPERTY)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty());

    match id {
        Some(id) => format!("{}.{ENTRY_EXTENSION}", sanitize_component(id)),
        None => ensure_extension(PathBuf::from(fallback), ENTRY_EXTENSION)
            .to_string_lossy()
            .into_owned(),
    }
}

/// Force a specific extension onto a path when it is missing or different.
///
/// Keeps existing matching extension (case-insensitive); otherwise replaces it.
pub fn ensure_extension(mut path: PathBuf, extension: &str) -> PathBuf {
    let replace = !matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case(extension)
    );

    if replace {
        path.set_extension(extension);
    }
    path
}

/// Serialize an entry. Compact output matches what `JSON.stringify` produces.
pub fn serialize_entry(data: &Value, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(data)
    } else {
        serde_json::to_string(data)
    };
    text.context("Failed to serialize entry")
}

/// Write `data` to `output`, creating parent directories as needed.
pub fn write_entry(output: &Path, data: &Value, pretty: bool) -> Result<()> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }

    let text = serialize_entry(data, pretty)?;
    fs::write(output, &text)
        .with_context(|| format!("Failed to write entry file {:?}", output))?;
    info!(path = %output.display(), bytes = text.len(), "Entry exported");
    Ok(())
}

/// Read an exported entry. The top-level value must be a JSON object.
pub fn read_entry(path: &Path) -> Result<Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read entry file {:?}", path))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse entry file {:?}", path))?;
    if !value.is_object() {
        bail!("Entry file {:?} does not contain a JSON object", path);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn file_name_comes_from_dataset_id() {
        let data = json!({ "datasetId": " E1234.002 " });
        assert_eq!(suggested_file_name(&data, "entry.json"), "E1234.002.json");
    }

    #[test]
    fn file_name_falls_back_when_id_is_missing_or_blank() {
        assert_eq!(suggested_file_name(&json!({}), "entry.json"), "entry.json");
        assert_eq!(
            suggested_file_name(&json!({ "datasetId": "  " }), "export"),
            "export.json"
        );
        assert_eq!(
            suggested_file_name(&json!({ "datasetId": 12 }), "entry.json"),
            "entry.json"
        );
    }

    #[test]
    fn ensure_extension_replaces_or_keeps() {
        assert_eq!(
            ensure_extension(PathBuf::from("out.txt"), "json"),
            PathBuf::from("out.json")
        );
        assert_eq!(
            ensure_extension(PathBuf::from("out.JSON"), "json"),
            PathBuf::from("out.JSON")
        );
        assert_eq!(
            ensure_extension(PathBuf::from("out"), "json"),
            PathBuf::from("out.json")
        );
    }

    #[test]
    fn compact_output_keeps_key_order() {
        let data = json!({ "datasetId": "E1", "bibId": "B1", "nuclide": { "mass": 0 } });
        assert_eq!(
            serialize_entry(&data, false).unwrap(),
            r#"{"datasetId":"E1","bibId":"B1","nuclide":{"mass":0}}"#
        );
        assert!(serialize_entry(&data, true).unwrap().contains("\n  \"bibId\""));
    }

    #[test]
    fn write_then_read_round_trip() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("nested/dir/E1.json");
        let data = json!({ "datasetId": "E1", "observable": { "uncertainties": [{ "value": "5%" }] } });

        write_entry(&output, &data, false).unwrap();
        assert_eq!(read_entry(&output).unwrap(), data);
    }

    #[test]
    fn read_rejects_non_objects_and_garbage() {
        let tmp = TempDir::new().unwrap();
        let list = tmp.path().join("list.json");
        std::fs::write(&list, "[1,2]").unwrap();
        let broken = tmp.path().join("broken.json");
        std::fs::write(&broken, "{").unwrap();

        assert!(read_entry(&list).is_err());
        assert!(read_entry(&broken).is_err());
        assert!(read_entry(&tmp.path().join("missing.json")).is_err());
    }
}
