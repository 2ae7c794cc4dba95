use crate::errors::ExtractionError;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

pub const TIMETABLE_VARIABLE: &str = "timetableData";

/// One timetable record as embedded in the page. Non-text values are read as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawEntry {
    #[serde(default, deserialize_with = "text_or_none")]
    pub subject_code: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub week_day: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub lecturer: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub type_with_section: Option<String>,
}

fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

/// Turns a timetable page into raw entries.
pub trait DatasetExtractor {
    fn extract_dataset(&self, document: &str) -> Result<Vec<RawEntry>, ExtractionError>;
}

lazy_static! {
    static ref SCRIPT: Selector = Selector::parse("script").expect("SCRIPT selector to parse");
    static ref TIMETABLE_DATA_REGEX: Regex =
        Regex::new(r"(?s)timetableData\s*=\s*(\[.*\])\s*;").expect("TIMETABLE_DATA_REGEX to compile");
}

/// Finds `timetableData = [...];` inside the page's inline scripts.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptVariableExtractor;

impl ScriptVariableExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DatasetExtractor for ScriptVariableExtractor {
    #[tracing::instrument(skip(self, document), level = "info")]
    fn extract_dataset(&self, document: &str) -> Result<Vec<RawEntry>, ExtractionError> {
        let html = Html::parse_document(document);

        for script in html.select(&SCRIPT) {
            let body = script.text().collect::<String>();
            if !body.contains(TIMETABLE_VARIABLE) {
                continue;
            }
            let Some(captures) = TIMETABLE_DATA_REGEX.captures(&body) else {
                warn!("Found a script mentioning {TIMETABLE_VARIABLE} that does not assign an array");
                continue;
            };

            let entries: Vec<RawEntry> = serde_json::from_str(&captures[1]).map_err(|source| {
                ExtractionError::Unparsable {
                    variable: TIMETABLE_VARIABLE,
                    source,
                }
            })?;
            if entries.is_empty() {
                return Err(ExtractionError::Empty {
                    variable: TIMETABLE_VARIABLE,
                });
            }
            info!(entries = entries.len(), "Extracted timetable data");
            return Ok(entries);
        }

        Err(ExtractionError::NotFound {
            variable: TIMETABLE_VARIABLE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DatasetExtractor, RawEntry, ScriptVariableExtractor};
    use crate::errors::ExtractionError;

    const TIMETABLE_PAGE: &str = r#"
        <html><head>
          <script src="/static/app.js"></script>
          <script>window.analytics = { timetableData: "see below" };</script>
          <script>
            var timetableData = [
              {"subject_code": "CSIT 111", "location": "LT1;2.08", "week_day": "Monday",
               "start_time": "09:30", "end_time": "11:30", "lecturer": "Dr A;Dr B",
               "type_with_section": "Lecture  L01"},
              {"subject_code": "MATH 221", "location": null, "week_day": "Tuesday",
               "start_time": 1030, "end_time": "12:30", "lecturer": "Dr C"}
            ];
            renderTimetable(timetableData);
          </script>
        </head><body></body></html>
    "#;

    #[test]
    fn test_that_the_embedded_array_is_extracted() {
        let entries = ScriptVariableExtractor::new()
            .extract_dataset(TIMETABLE_PAGE)
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].subject_code.as_deref(), Some("CSIT 111"));
        assert_eq!(entries[0].type_with_section.as_deref(), Some("Lecture  L01"));
        assert_eq!(
            entries[1],
            RawEntry {
                subject_code: Some("MATH 221".to_string()),
                location: None,
                week_day: Some("Tuesday".to_string()),
                start_time: None,
                end_time: Some("12:30".to_string()),
                lecturer: Some("Dr C".to_string()),
                type_with_section: None,
            }
        );
    }

    #[test]
    fn test_that_extraction_is_deterministic() {
        let extractor = ScriptVariableExtractor::new();
        let first = extractor.extract_dataset(TIMETABLE_PAGE).unwrap();
        let second = extractor.extract_dataset(TIMETABLE_PAGE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_that_a_page_without_the_variable_fails() {
        let result = ScriptVariableExtractor::new()
            .extract_dataset("<html><script>var other = [];</script></html>");
        assert!(matches!(result, Err(ExtractionError::NotFound { .. })));
    }

    #[test]
    fn test_that_broken_json_fails() {
        let page = "<script>var timetableData = [{\"subject_code\": }];</script>";
        let result = ScriptVariableExtractor::new().extract_dataset(page);
        assert!(matches!(result, Err(ExtractionError::Unparsable { .. })));
    }

    #[test]
    fn test_that_an_empty_array_fails() {
        let page = "<script>var timetableData = [];</script>";
        let result = ScriptVariableExtractor::new().extract_dataset(page);
        assert!(matches!(result, Err(ExtractionError::Empty { .. })));
    }
}
