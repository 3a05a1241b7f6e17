//! Key naming for filters and log output.
//!
//! Users write filters as key names (`"h,l"`, `"F5"`, `"Escape"`) or raw hex
//! VK codes (`"0x1b"`). Internally everything is a `u32` virtual-key code,
//! matching the width the low-level keyboard hook reports.

pub mod windows_vk;

pub use windows_vk::VK_ESCAPE;

use thiserror::Error;

/// Error returned when a key name cannot be resolved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("unknown key name '{0}'")]
    UnknownName(String),
    #[error("invalid key code '{0}': expected a value between 0x00 and 0xFF")]
    InvalidCode(String),
}

/// Resolves a key name, a single character, or a hex code to a VK code.
///
/// Accepted forms, in order of precedence:
/// - `0x..` hex literals in `0x00..=0xFF`
/// - names from the VK table or an alias (case-insensitive)
/// - a single ASCII letter or digit (`"h"` → `0x48`)
///
/// # Errors
///
/// Returns [`KeyParseError`] if `input` matches none of the above.
pub fn parse_key(input: &str) -> Result<u32, KeyParseError> {
    let input = input.trim();

    if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        return u32::from_str_radix(hex, 16)
            .ok()
            .filter(|&code| code <= 0xFF)
            .ok_or_else(|| KeyParseError::InvalidCode(input.to_string()));
    }

    if let Some(code) = windows_vk::vk_from_name(input) {
        return Ok(code);
    }

    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Ok(c.to_ascii_uppercase() as u32),
        _ => Err(KeyParseError::UnknownName(input.to_string())),
    }
}

/// Returns a display name for `code`: its table name, or a hex literal.
pub fn key_name(code: u32) -> String {
    windows_vk::vk_name(code)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{code:#04x}"))
}
