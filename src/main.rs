// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

mod app;
mod logging;
mod logic;
mod models;
mod mvu;
mod settings;
mod ui;
mod utils;

use tracing::info;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> eframe::Result<()> {
    let data_dir = settings::data_dir();
    std::fs::create_dir_all(&data_dir).ok();

    // Guard must live for the entire app lifetime.
    let _log_guard = logging::init(&data_dir);
    info!(version = APP_VERSION, data_dir = %data_dir.display(), "μND Entry Generator starting");

    let settings = settings::Settings::load(&data_dir);
    app::run(settings, data_dir)
}
