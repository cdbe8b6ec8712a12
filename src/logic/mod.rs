// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Business logic with file-system side effects.

pub mod export;
