// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Application entry point wiring egui/eframe to launch the entry generator UI.

use std::path::PathBuf;

use eframe::egui;
use egui_phosphor::Variant;

use crate::settings::Settings;
use crate::ui::{APP_TITLE, MundEntryApp};

const DEFAULT_WINDOW_SIZE: [f32; 2] = [720.0, 800.0];

/// Bootstrap the desktop application and run the main egui event loop.
pub fn run(settings: Settings, data_dir: PathBuf) -> eframe::Result<()> {
    // Register Phosphor icon font.
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, Variant::Regular);

    let size = match (settings.window_w, settings.window_h) {
        (Some(w), Some(h)) if w > 0.0 && h > 0.0 => [w, h],
        _ => DEFAULT_WINDOW_SIZE,
    };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size(size)
            .with_min_inner_size([480.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(MundEntryApp::new(settings, Some(data_dir))))
        }),
    )
}
