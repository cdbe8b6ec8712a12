// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Reusable egui components structured for MVU-style updates.

pub mod schema_form;
