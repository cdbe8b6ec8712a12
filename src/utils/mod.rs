// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Shared helper utilities reused by UI and export logic.

pub mod sanitize_component;

/// Sanitize user-provided strings into filesystem-safe path components.
pub use sanitize_component::sanitize_component;
