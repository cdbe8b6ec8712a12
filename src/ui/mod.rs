// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Top-level egui application shell for editing a μND entry.
//! Handles layout, the schema lifecycle screens, and wiring to export.

pub mod components;

use std::path::PathBuf;

use eframe::egui;
use tracing::{info, warn};

use crate::mvu::{self, AppModel, Command, Msg, SchemaState};
use crate::settings::Settings;
use crate::ui::components::schema_form::{self, SchemaFormMsg};

/// Window and heading title.
pub const APP_TITLE: &str = "μND Entry Generator";
/// Width of the centred form column.
const FORM_WIDTH: f32 = 400.0;

/// Stateful egui application for filling in and exporting entries.
pub struct MundEntryApp {
    model: AppModel,
    inbox: Vec<Msg>,
    cmd_tx: crossbeam_channel::Sender<Command>,
    msg_rx: crossbeam_channel::Receiver<Msg>,
}

impl MundEntryApp {
    /// Spawn the command workers and start loading the configured schema.
    pub fn new(settings: Settings, data_dir: Option<PathBuf>) -> Self {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<Command>();
        let (msg_tx, msg_rx) = crossbeam_channel::unbounded::<Msg>();

        let threads = std::thread::available_parallelism()
            .map(|n| n.get().max(2))
            .unwrap_or(2);
        for _ in 0..threads {
            let cmd_rx = cmd_rx.clone();
            let msg_tx = msg_tx.clone();
            std::thread::spawn(move || {
                for cmd in cmd_rx.iter() {
                    let msg = mvu::run_command(cmd);
                    let _ = msg_tx.send(msg);
                }
            });
        }

        Self {
            model: AppModel::new(settings, data_dir),
            inbox: vec![Msg::LoadSchemaRequested],
            cmd_tx,
            msg_rx,
        }
    }
}

impl eframe::App for MundEntryApp {
    /// Drain worker results, apply queued messages, then draw the frame.
    ///
    /// Views only push messages into the inbox; they are applied on the next
    /// frame so the model is never mutated while it is being rendered.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_spacing(ctx);

        // Track window size for saving on exit.
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.model.settings.window_w = Some(rect.width());
            self.model.settings.window_h = Some(rect.height());
        }

        // Pull messages produced by the command workers.
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.model.pending_commands = self.model.pending_commands.saturating_sub(1);
            self.inbox.push(msg);
        }

        let msgs = std::mem::take(&mut self.inbox);
        for msg in msgs {
            let mut commands = Vec::new();
            mvu::update(&mut self.model, msg, &mut commands);
            for cmd in commands {
                if self.cmd_tx.send(cmd).is_ok() {
                    self.model.pending_commands += 1;
                }
            }
        }
        if self.model.pending_commands > 0 {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading(APP_TITLE);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_theme_controls(ui);
                    ui.separator();
                    self.render_file_actions(ui);
                });
            });
            ui.add_space(4.0);
        });

        self.render_error_modal(ctx);

        egui::TopBottomPanel::bottom("status_panel")
            .resizable(false)
            .show(ctx, |ui| {
                self.render_status(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| match &self.model.form {
            SchemaState::Loading => render_loading(ui, &self.model),
            SchemaState::Failed(err) => {
                let err = err.clone();
                self.render_load_failure(ui, &err);
            }
            SchemaState::Ready(form) => {
                let mut form_msgs = Vec::new();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.set_max_width(FORM_WIDTH);
                        ui.with_layout(egui::Layout::top_down(egui::Align::Min), |ui| {
                            ui.add_space(8.0);
                            form_msgs = schema_form::view(ui, form);
                            ui.add_space(8.0);
                        });
                    });
                });
                self.inbox.extend(form_msgs.into_iter().map(Msg::Form));
            }
        });
    }
}

impl Drop for MundEntryApp {
    fn drop(&mut self) {
        info!("Application shutting down");
        if let Some(data_dir) = &self.model.data_dir
            && let Err(err) = self.model.settings.save(data_dir)
        {
            warn!(error = %err, "Failed to save settings on exit");
        }
    }
}

impl MundEntryApp {
    fn ensure_spacing(&self, ctx: &egui::Context) {
        ctx.style_mut(|style| {
            style.spacing.item_spacing = egui::vec2(6.0, 6.0);
        });
    }

    /// Light, dark, and follow-system choices.
    fn render_theme_controls(&mut self, ui: &mut egui::Ui) {
        ui.add_space(2.0);
        egui::widgets::global_theme_preference_buttons(ui);
    }

    /// Schema picker, reset, and open buttons (right-to-left order).
    fn render_file_actions(&mut self, ui: &mut egui::Ui) {
        let ready = self.model.form().is_some();

        if ui
            .button(format!("{} Schema…", egui_phosphor::regular::FILE_CODE))
            .on_hover_text(format!(
                "Current schema: {}",
                self.model.schema_path.display()
            ))
            .clicked()
        {
            self.inbox.push(Msg::PickSchemaRequested);
        }
        if ui
            .add_enabled(
                ready,
                egui::Button::new(format!(
                    "{} Reset",
                    egui_phosphor::regular::ARROW_COUNTER_CLOCKWISE
                )),
            )
            .on_hover_text("Discard all input and restore defaults")
            .clicked()
        {
            self.inbox.push(Msg::Form(SchemaFormMsg::Reset));
        }
        if ui
            .add_enabled(
                ready,
                egui::Button::new(format!("{} Open entry", egui_phosphor::regular::FOLDER_OPEN)),
            )
            .on_hover_text("Load a previously exported entry for editing")
            .clicked()
        {
            self.inbox.push(Msg::OpenEntryRequested);
        }
    }

    fn render_load_failure(&mut self, ui: &mut egui::Ui, err: &str) {
        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            ui.label(
                egui::RichText::new(format!(
                    "{} Could not load schema",
                    egui_phosphor::regular::WARNING
                ))
                .heading()
                .color(ui.visuals().error_fg_color),
            );
            ui.add_space(8.0);
            ui.label(self.model.schema_path.display().to_string());
            ui.add_space(4.0);
            ui.label(egui::RichText::new(err).monospace());
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if ui
                    .button(format!("{} Retry", egui_phosphor::regular::ARROW_CLOCKWISE))
                    .clicked()
                {
                    self.inbox.push(Msg::LoadSchemaRequested);
                }
                if ui
                    .button(format!("{} Choose schema…", egui_phosphor::regular::FILE_CODE))
                    .clicked()
                {
                    self.inbox.push(Msg::PickSchemaRequested);
                }
            });
        });
    }

    /// Render a simple modal window for error messages.
    fn render_error_modal(&mut self, ctx: &egui::Context) {
        if let Some(notice) = self.model.error.clone() {
            egui::Window::new(notice.title)
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(notice.message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        self.inbox.push(Msg::DismissError);
                    }
                });
        }
    }

    /// Render latest status/error message when present.
    fn render_status(&self, ui: &mut egui::Ui) {
        if let Some(text) = &self.model.status {
            let display = if self.model.pending_commands > 0 {
                format!("{}  ({} working…)", text, self.model.pending_commands)
            } else {
                text.to_string()
            };
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(display).color(egui::Color32::from_gray(68)));
                if self.model.pending_commands > 0 {
                    ui.add(egui::Spinner::new().size(14.0))
                        .on_hover_text(format!(
                            "{} task(s) running in background",
                            self.model.pending_commands
                        ));
                }
            });
        }
    }
}

fn render_loading(ui: &mut egui::Ui, model: &AppModel) {
    ui.vertical_centered(|ui| {
        ui.add_space(24.0);
        ui.add(egui::Spinner::new().size(24.0));
        ui.add_space(8.0);
        ui.label(format!("Loading schema {} ...", model.schema_path.display()));
    });
}
