//! Loose text/number conversions for request input.
//!
//! Browser clients send ids, durations and names in whatever shape the UI
//! produced. These helpers accept the same forms a browser would when turning
//! text into a number or a number into text, so edge-case inputs behave the
//! same from either side of the wire.

use serde_json::Number;

/// Whitespace stripped around names and numeric text, including the
/// byte-order mark.
fn is_trimmable(c: char) -> bool {
    c.is_whitespace() || c == '\u{feff}'
}

/// Trim whitespace and BOMs from both ends.
pub fn trim_text(text: &str) -> &str {
    text.trim_matches(is_trimmable)
}

/// Convert text to a number the way a browser's `Number(text)` does.
///
/// Blank text is `0`. Unsigned `0x`/`0o`/`0b` literals are accepted.
/// Anything unparseable yields `NaN`.
pub fn number_from_text(text: &str) -> f64 {
    let trimmed = trim_text(text);
    if trimmed.is_empty() {
        return 0.0;
    }

    let radix = match trimmed.get(..2) {
        Some("0x") | Some("0X") => Some(16),
        Some("0o") | Some("0O") => Some(8),
        Some("0b") | Some("0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix(&trimmed[2..], radix);
    }

    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust also accepts "inf" and "nan" spellings; those are not numbers here
        _ if trimmed
            .chars()
            .any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) =>
        {
            f64::NAN
        }
        _ => trimmed.parse().unwrap_or(f64::NAN),
    }
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
        })
        .unwrap_or(f64::NAN)
}

/// Render a JSON number as text, dropping the fraction of whole floats
/// (`1.0` becomes `"1"`).
pub fn number_to_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{}", f as i128),
        _ => n.to_string(),
    }
}

/// Build a JSON number from a float, integral values serialized without a fraction.
pub fn json_number(value: f64) -> Option<Number> {
    if value.fract() == 0.0 && value.abs() <= u64::MAX as f64 {
        if value >= 0.0 {
            return Some(Number::from(value as u64));
        }
        if value >= i64::MIN as f64 {
            return Some(Number::from(value as i64));
        }
    }
    Number::from_f64(value)
}
