//! French locale number formatting.
//!
//! Matches what browsers produce for `fr-FR`: digits grouped by three with a
//! narrow no-break space, comma as decimal separator, at most three
//! fraction digits with trailing zeros dropped.

/// Thousands separator (U+202F NARROW NO-BREAK SPACE).
pub const THOUSANDS_SEPARATOR: char = '\u{202f}';

/// Decimal separator.
pub const DECIMAL_SEPARATOR: char = ',';

const MAX_FRACTION_DIGITS: usize = 3;

/// Format a number with grouped thousands, e.g. `12345.5` → `12 345,5`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let fixed = format!("{:.*}", MAX_FRACTION_DIGITS, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::new();
    // "-0" after rounding is printed as "0"
    if value < 0.0 && (int_part.chars().any(|c| c != '0') || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push(DECIMAL_SEPARATOR);
        out.push_str(frac_part);
    }
    out
}

/// Format with an explicit sign; zero gets `+`.
pub fn format_signed(value: f64) -> String {
    let formatted = format_number(value);
    if formatted.starts_with('-') {
        formatted
    } else {
        format!("+{}", formatted)
    }
}

/// Signed percentage with one decimal, e.g. `+20.0`.
pub fn format_percentage_signed(value: f64) -> String {
    format!("{:+.1}", value)
}

/// Unsigned percentage with one decimal, e.g. `20.0`.
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}", value.abs())
}

/// Evolution summary: `+20 (+20.0%)`.
pub fn format_evolution(difference: f64, signed_percentage: f64) -> String {
    format!(
        "{} ({}%)",
        format_signed(difference),
        format_percentage_signed(signed_percentage)
    )
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(THOUSANDS_SEPARATOR);
        }
        out.push(ch);
    }
    out
}
