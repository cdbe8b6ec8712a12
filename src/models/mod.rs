// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Domain layer: schema loading, presentation hints, form data, and validation.
//! Nothing here depends on egui.

pub mod form_data;
pub mod schema;
pub mod ui_schema;
pub mod validation;
