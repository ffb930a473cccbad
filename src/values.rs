//! Per-field value canonicalization.
//!
//! None of these functions fail. Unparseable input degrades to a sentinel
//! (`0` for course numbers, `""` for days) which callers treat as a
//! data-quality signal rather than an error.

use crate::data::CellValue;

/// Course number as an integer, or `None` when the cell cannot be read as one.
pub fn parse_course_number(value: &CellValue) -> Option<i64> {
    match value {
        CellValue::Empty => None,
        CellValue::Number(f) if f.is_finite() => Some(f.trunc() as i64),
        CellValue::Number(_) => None,
        CellValue::Text(s) => s.trim().parse::<i64>().ok(),
    }
}

/// Course number for identity keys; anything unparseable becomes `0`.
pub fn normalize_course_number(value: &CellValue) -> i64 {
    parse_course_number(value).unwrap_or(0)
}

/// True when a non-blank course number collapsed to the `0` sentinel.
pub fn is_unparseable_course_number(value: &CellValue) -> bool {
    !value.is_empty() && parse_course_number(value).is_none()
}

/// Meeting days with every whitespace character removed ("M W F" -> "MWF").
pub fn normalize_days(value: &CellValue) -> String {
    value
        .as_display()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Comparison form for non-key fields. Missing values, NaN and the literal
/// text `nan` all compare equal to an empty string.
pub fn normalize_for_compare(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Number(f) if f.is_nan() => String::new(),
        CellValue::Text(s) if s == "nan" => String::new(),
        other => other.as_display(),
    }
}
