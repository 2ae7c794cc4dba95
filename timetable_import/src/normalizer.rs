use itertools::Itertools;

/// Placeholder used when a multi-valued field has no usable segment.
pub const UNKNOWN: &str = "Unknown";

pub const DEFAULT_DELIMITER: char = ';';

/// Collapses every run of whitespace into a single space and trims both ends.
/// A missing value normalizes to the empty string.
pub fn normalize_whitespace<'a>(text: impl Into<Option<&'a str>>) -> String {
    text.into()
        .map(|text| text.split_whitespace().join(" "))
        .unwrap_or_default()
}

/// Splits a delimited field into normalized, non-empty segments.
/// Yields `["Unknown"]` when nothing survives.
pub fn split_multi<'a>(value: impl Into<Option<&'a str>>, delimiter: char) -> Vec<String> {
    let segments = value
        .into()
        .map(|value| {
            value
                .split(delimiter)
                .map(|segment| normalize_whitespace(segment))
                .filter(|segment| !segment.is_empty())
                .collect_vec()
        })
        .unwrap_or_default();

    if segments.is_empty() {
        vec![UNKNOWN.to_string()]
    } else {
        segments
    }
}
