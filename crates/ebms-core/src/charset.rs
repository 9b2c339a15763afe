// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canonicalization of `CharacterSet` part-property values.

/// Parse a declared character set name into its canonical IANA form.
/// Matching is case-insensitive and tolerant of common aliases; returns
/// `None` when the value is not a recognized charset name.
#[must_use]
pub fn canonical_charset(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => Some("UTF-8"),
        "utf-16" | "utf16" => Some("UTF-16"),
        "us-ascii" | "ascii" => Some("US-ASCII"),
        "iso-8859-1" | "latin1" | "latin-1" => Some("ISO-8859-1"),
        "windows-1252" | "cp1252" => Some("windows-1252"),
        _ => None,
    }
}
