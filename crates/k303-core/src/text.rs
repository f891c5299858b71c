//! Cell-text cleanup shared by headers, key fields and registry values.

/// Trim surrounding whitespace, control characters and byte-order marks.
///
/// Report exports routinely carry `\r` at line ends, a BOM on the first
/// header and stray tabs around codes.
pub fn clean_field(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c.is_control() || c == '\u{feff}')
}

/// Collapse internal whitespace runs to single spaces after trimming.
///
/// Trustee names are compared in this form.
pub fn normalize_spaces(raw: &str) -> String {
    clean_field(raw).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Return the digit run of an integral cell value.
///
/// Spreadsheet exports write integers as `5113022` or `5113022.0`; both yield
/// `Some("5113022")`. A fractional part other than zeros, a sign, or any
/// other character yields `None`.
pub fn integral_digits(raw: &str) -> Option<&str> {
    let value = clean_field(raw);
    let (int_part, frac_part) = match value.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (value, None),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(frac) = frac_part {
        if !frac.bytes().all(|b| b == b'0') {
            return None;
        }
    }
    Some(int_part)
}
