// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 mund-entry contributors

//! Filesystem-safe file names derived from entry identifiers.

/// Name used when nothing printable survives sanitization.
pub const FALLBACK_NAME: &str = "entry";

/// Produce a filesystem-safe path component.
///
/// # Steps
/// - Transliterate Unicode to ASCII with `deunicode` (e.g., "Å" → "A").
/// - Allow ASCII alphanumerics plus `-`, `_`, and `.`; treat other characters as `_`.
/// - Collapse runs of `_` and `.`; trim trailing dots/spaces.
/// - Guard against reserved/empty names.
///
/// Dataset identifiers such as `E1234.002` keep their dots, so the suggested
/// export name stays recognisable on Windows and Unix.
pub fn sanitize_component(value: &str) -> String {
    // Step 1: transliterate to ASCII to avoid multi-byte surprises.
    let transliterated = deunicode::deunicode(value);
    let mut out = String::with_capacity(transliterated.len());
    let mut last: Option<char> = None;

    // Step 2: map characters into the allowed set and collapse runs of `_` and `.`.
    for ch in transliterated.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
            ch
        } else {
            '_'
        };

        match mapped {
            '_' => {
                if last != Some('_') {
                    out.push('_');
                    last = Some('_');
                }
            }
            '.' => {
                if last != Some('.') {
                    out.push('.');
                    last = Some('.');
                }
            }
            c => {
                out.push(c);
                last = Some(c);
            }
        }
    }

    // Additional cleanup: avoid a stray underscore immediately before a dot.
    while let Some(pos) = out.find("_.") {
        out.remove(pos);
    }

    // Trim trailing dots/spaces which can be problematic on Windows.
    while out.ends_with('.') || out.ends_with(' ') {
        out.pop();
    }

    // Fallback for empty or special dot-only names.
    if out.is_empty() || out == "." || out == ".." {
        return FALLBACK_NAME.to_string();
    }

    // Protect against Windows reserved device names for the basename.
    let (basename, ext) = match out.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (base.to_string(), Some(ext.to_string())),
        _ => (out.clone(), None),
    };

    let upper = basename.to_ascii_uppercase();
    let is_reserved = matches!(
        upper.as_str(),
        "CON"
            | "PRN"
            | "AUX"
            | "NUL"
            | "COM1"
            | "COM2"
            | "COM3"
            | "COM4"
            | "COM5"
            | "COM6"
            | "COM7"
            | "COM8"
            | "COM9"
            | "LPT1"
            | "LPT2"
            | "LPT3"
            | "LPT4"
            | "LPT5"
            | "LPT6"
            | "LPT7"
            | "LPT8"
            | "LPT9"
    );

    if is_reserved {
        let mut new_base = basename;
        new_base.push('_');
        out = if let Some(ext) = ext {
            format!("{new_base}.{ext}")
        } else {
            new_base
        };
    }

    out
}

#[cfg(test)]
mod tests {
    use super::{FALLBACK_NAME, sanitize_component};

    #[test]
    fn keeps_dataset_identifier_characters() {
        assert_eq!(sanitize_component("E1234.002_v-2"), "E1234.002_v-2");
    }

    // Nuclide notation and spaces collapse into single underscores.
    #[test]
    fn collapses_separators_in_nuclide_names() {
        assert_eq!(sanitize_component("Fe-56 (n,γ) / 2025"), "Fe-56_n_g_2025");
    }

    #[test]
    fn transliterates_non_ascii() {
        assert_eq!(sanitize_component("Ångström data"), "Angstrom_data");
    }

    #[test]
    fn deduplicates_dots_and_trims_trailing_ones() {
        assert_eq!(sanitize_component("run..3."), "run.3");
    }

    #[test]
    fn suffixes_windows_reserved_names() {
        assert_eq!(sanitize_component("AUX"), "AUX_");
        assert_eq!(sanitize_component("com1.json"), "com1_.json");
    }

    #[test]
    fn falls_back_for_empty_input() {
        assert_eq!(sanitize_component(""), FALLBACK_NAME);
        assert_eq!(sanitize_component(".."), FALLBACK_NAME);
    }
}
