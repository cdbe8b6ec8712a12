// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Root Model-View-Update kernel wiring component state, messages, and commands.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::logic::export::{self, ENTRY_EXTENSION, ensure_extension, suggested_file_name};
use crate::models::schema::load_schema;
use crate::models::ui_schema::UiSchema;
use crate::settings::Settings;
use crate::ui::components::schema_form::{
    self, SchemaFormCommand, SchemaFormModel, SchemaFormMsg,
};

const VALIDATION_ERROR_TITLE: &str = "Validation error";

/// Lifecycle of the schema backing the form.
#[derive(Debug, Default)]
pub enum SchemaState {
    #[default]
    Loading,
    Ready(Box<SchemaFormModel>),
    Failed(String),
}

/// Top-level application state.
#[derive(Debug, Default)]
pub struct AppModel {
    pub settings: Settings,
    /// Where settings are persisted; `None` keeps changes in memory only.
    pub data_dir: Option<PathBuf>,
    /// Schema file currently shown (or being loaded).
    pub schema_path: PathBuf,
    pub form: SchemaState,
    /// Latest status message to display.
    pub status: Option<String>,
    /// Latest error to display in modal.
    pub error: Option<ErrorNotice>,
    /// Count of queued background commands.
    pub pending_commands: usize,
}

impl AppModel {
    pub fn new(settings: Settings, data_dir: Option<PathBuf>) -> Self {
        Self {
            schema_path: settings.schema_path_or_default(),
            settings,
            data_dir,
            ..Default::default()
        }
    }

    pub fn form(&self) -> Option<&SchemaFormModel> {
        match &self.form {
            SchemaState::Ready(form) => Some(&**form),
            _ => None,
        }
    }
}

/// Error shown in the modal window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorNotice {
    pub title: &'static str,
    pub message: String,
}

/// Application messages routed through the update function.
#[derive(Debug)]
pub enum Msg {
    LoadSchemaRequested,
    /// Result of a background load; `path` identifies the request it answers.
    SchemaLoaded {
        path: PathBuf,
        result: Result<Box<SchemaFormModel>, String>,
        /// Problem with the UI hints file that was worked around.
        hints_warning: Option<String>,
    },
    PickSchemaRequested,
    SchemaFileChosen(Option<PathBuf>),
    Form(SchemaFormMsg),
    ExportPathChosen { path: PathBuf, data: Value },
    ExportCancelled,
    ExportCompleted(Result<PathBuf, String>),
    OpenEntryRequested,
    EntryLoaded { data: Value, source: PathBuf },
    EntryLoadFailed(String),
    EntryOpenCancelled,
    SettingsSaved(Result<(), String>),
    DismissError,
}

/// Commands represent side-effects executed between frames.
#[derive(Debug)]
pub enum Command {
    LoadSchema {
        schema_path: PathBuf,
        ui_schema_path: Option<PathBuf>,
    },
    PickSchemaFile,
    PickExportPath {
        suggested: String,
        directory: Option<PathBuf>,
        data: Value,
    },
    WriteExport {
        path: PathBuf,
        data: Value,
        pretty: bool,
    },
    PickEntryFile,
    SaveSettings {
        settings: Settings,
        data_dir: PathBuf,
    },
}

/// Update the application model and enqueue commands.
pub fn update(model: &mut AppModel, msg: Msg, cmds: &mut Vec<Command>) {
    match msg {
        Msg::LoadSchemaRequested => request_schema_load(model, cmds),
        Msg::SchemaLoaded { path, .. } if path != model.schema_path => {
            debug!(path = %path.display(), "Discarding result of a superseded schema load");
        }
        Msg::SchemaLoaded {
            result,
            hints_warning,
            ..
        } => match result {
            Ok(form) => {
                info!(path = %model.schema_path.display(), "Schema ready");
                let title = form.title().unwrap_or("entry").to_string();
                model.form = SchemaState::Ready(form);
                let mut status = format!("Loaded schema for {title}.");
                if let Some(warning) = hints_warning {
                    status.push_str(&format!(" UI hints ignored: {warning}"));
                }
                model.status = Some(status);
            }
            Err(err) => {
                error!(path = %model.schema_path.display(), error = %err, "Failed to load schema");
                model.status = Some("Failed to load schema.".to_string());
                model.form = SchemaState::Failed(err);
            }
        },
        Msg::PickSchemaRequested => cmds.push(Command::PickSchemaFile),
        Msg::SchemaFileChosen(Some(path)) => {
            model.settings.schema_path = Some(path.to_string_lossy().into_owned());
            model.schema_path = path;
            persist_settings(model, cmds);
            request_schema_load(model, cmds);
        }
        Msg::SchemaFileChosen(None) => {
            surface_event(model, "Schema selection cancelled.".to_string(), None)
        }
        Msg::Form(m) => {
            let SchemaState::Ready(form) = &mut model.form else {
                warn!(msg = ?m, "Form message ignored while no schema is loaded");
                return;
            };
            let mut form_cmds = Vec::new();
            let event = schema_form::update(form, m, &mut form_cmds);
            if let Some(event) = event {
                let title = event.is_error.then_some(VALIDATION_ERROR_TITLE);
                surface_event(model, event.message, title);
            }
            for c in form_cmds {
                match c {
                    SchemaFormCommand::Export(data) => cmds.push(Command::PickExportPath {
                        suggested: suggested_file_name(&data, model.settings.default_file_name()),
                        directory: model.settings.last_export_dir(),
                        data,
                    }),
                }
            }
        }
        Msg::ExportPathChosen { path, data } => {
            let path = ensure_extension(path, ENTRY_EXTENSION);
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                let dir = dir.to_string_lossy().into_owned();
                if model.settings.last_export_dir.as_deref() != Some(dir.as_str()) {
                    model.settings.last_export_dir = Some(dir);
                    persist_settings(model, cmds);
                }
            }
            cmds.push(Command::WriteExport {
                path,
                data,
                pretty: model.settings.pretty_json,
            });
        }
        Msg::ExportCancelled => surface_event(model, "Export cancelled.".to_string(), None),
        Msg::ExportCompleted(result) => match result {
            Ok(path) => surface_event(model, format!("Entry saved: {}", path.display()), None),
            Err(err) => {
                error!(error = %err, "Export failed");
                surface_event(
                    model,
                    format!("Failed to save entry:\n\n{err}"),
                    Some("Export failed"),
                )
            }
        },
        Msg::OpenEntryRequested => cmds.push(Command::PickEntryFile),
        Msg::EntryLoaded { data, source } => {
            info!(path = %source.display(), "Entry opened");
            update(model, Msg::Form(SchemaFormMsg::DataLoaded { data, source }), cmds);
        }
        Msg::EntryLoadFailed(err) => {
            warn!(error = %err, "Failed to open entry");
            surface_event(
                model,
                format!("Failed to open entry:\n\n{err}"),
                Some("Could not open entry"),
            )
        }
        Msg::EntryOpenCancelled => surface_event(model, "Open cancelled.".to_string(), None),
        Msg::SettingsSaved(Ok(())) => {}
        Msg::SettingsSaved(Err(err)) => {
            warn!(error = %err, "Failed to save settings");
            model.status = Some(format!("Could not save settings: {err}"));
        }
        Msg::DismissError => model.error = None,
    }
}

/// Execute a command synchronously and return a resulting message.
pub fn run_command(cmd: Command) -> Msg {
    match cmd {
        Command::LoadSchema {
            schema_path,
            ui_schema_path,
        } => {
            let (result, hints_warning) = match load_form(&schema_path, ui_schema_path.as_deref()) {
                Ok((form, warning)) => (Ok(Box::new(form)), warning),
                Err(err) => (Err(format!("{err:#}")), None),
            };
            Msg::SchemaLoaded {
                path: schema_path,
                result,
                hints_warning,
            }
        }
        Command::PickSchemaFile => {
            let file = rfd::FileDialog::new()
                .set_title("Select JSON Schema")
                .add_filter("JSON Schema", &[ENTRY_EXTENSION])
                .pick_file();
            Msg::SchemaFileChosen(file)
        }
        Command::PickExportPath {
            suggested,
            directory,
            data,
        } => {
            let mut dialog = rfd::FileDialog::new()
                .set_title("Save entry")
                .add_filter("JSON", &[ENTRY_EXTENSION])
                .set_file_name(&suggested);
            if let Some(dir) = directory.filter(|d| d.is_dir()) {
                dialog = dialog.set_directory(dir);
            }
            match dialog.save_file() {
                Some(path) => Msg::ExportPathChosen { path, data },
                None => Msg::ExportCancelled,
            }
        }
        Command::WriteExport { path, data, pretty } => Msg::ExportCompleted(
            export::write_entry(&path, &data, pretty)
                .map(|_| path)
                .map_err(|e| format!("{e:#}")),
        ),
        Command::PickEntryFile => {
            let file = rfd::FileDialog::new()
                .set_title("Open entry")
                .add_filter("JSON", &[ENTRY_EXTENSION])
                .pick_file();
            match file {
                Some(path) => match export::read_entry(&path) {
                    Ok(data) => Msg::EntryLoaded { data, source: path },
                    Err(err) => Msg::EntryLoadFailed(format!("{err:#}")),
                },
                None => Msg::EntryOpenCancelled,
            }
        }
        Command::SaveSettings { settings, data_dir } => {
            Msg::SettingsSaved(settings.save(&data_dir).map_err(|e| format!("{e:#}")))
        }
    }
}

/// Dereference the schema, pick the UI hints, and build a fresh form.
///
/// An unusable UI hints file falls back to the built-in hints; the problem is
/// returned alongside the form.
fn load_form(
    schema_path: &Path,
    ui_schema_path: Option<&Path>,
) -> Result<(SchemaFormModel, Option<String>)> {
    let schema = load_schema(schema_path)?;
    let (ui_schema, warning) = match ui_schema_path.map(UiSchema::load) {
        Some(Ok(ui_schema)) => (ui_schema, None),
        Some(Err(err)) => {
            let err = format!("{err:#}");
            warn!(error = %err, "UI schema unusable, using built-in hints");
            (UiSchema::builtin(), Some(err))
        }
        None => (UiSchema::builtin(), None),
    };
    Ok((SchemaFormModel::new(schema, ui_schema)?, warning))
}

fn request_schema_load(model: &mut AppModel, cmds: &mut Vec<Command>) {
    info!(path = %model.schema_path.display(), "Loading schema");
    model.form = SchemaState::Loading;
    model.status = Some(format!("Loading schema {} ...", model.schema_path.display()));
    cmds.push(Command::LoadSchema {
        schema_path: model.schema_path.clone(),
        ui_schema_path: model.settings.ui_schema_path(),
    });
}

fn persist_settings(model: &AppModel, cmds: &mut Vec<Command>) {
    if let Some(data_dir) = &model.data_dir {
        cmds.push(Command::SaveSettings {
            settings: model.settings.clone(),
            data_dir: data_dir.clone(),
        });
    }
}

/// Update status/error fields consistently for user feedback.
///
/// A title marks the message as an error and opens the modal.
fn surface_event(model: &mut AppModel, message: String, error_title: Option<&'static str>) {
    if let Some(title) = error_title {
        model.error = Some(ErrorNotice {
            title,
            message: message.clone(),
        });
    }
    model.status = Some(message);
}
