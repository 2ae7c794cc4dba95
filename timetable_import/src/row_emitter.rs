use crate::extractor::RawEntry;
use crate::normalizer::{normalize_whitespace, split_multi, DEFAULT_DELIMITER};
use crate::room_mapping::RoomMapping;
use itertools::Itertools;
use serde::Serialize;
use tracing::info;

/// One (entry, room, teacher) combination, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    #[serde(rename = "SubCode")]
    pub subject_code: String,
    #[serde(rename = "Class")]
    pub class_label: String,
    #[serde(rename = "Day")]
    pub day: String,
    #[serde(rename = "StartTime")]
    pub start_time: String,
    #[serde(rename = "EndTime")]
    pub end_time: String,
    #[serde(rename = "Room")]
    pub room: String,
    #[serde(rename = "Teacher")]
    pub teacher: String,
}

impl OutputRow {
    pub const COLUMNS: [&'static str; 7] = [
        "SubCode",
        "Class",
        "Day",
        "StartTime",
        "EndTime",
        "Room",
        "Teacher",
    ];
}

pub struct RowEmitter<'a> {
    rooms: &'a RoomMapping,
}

impl<'a> RowEmitter<'a> {
    pub fn new(rooms: &'a RoomMapping) -> Self {
        Self { rooms }
    }

    /// Rows for a single entry, or `None` when a required field is blank.
    pub fn rows_for(&self, entry: &RawEntry) -> Option<Vec<OutputRow>> {
        let subject_code = normalize_whitespace(entry.subject_code.as_deref()).replace(' ', "");
        let location = normalize_whitespace(entry.location.as_deref());
        let day = normalize_whitespace(entry.week_day.as_deref());
        let start_time = normalize_whitespace(entry.start_time.as_deref());
        let end_time = normalize_whitespace(entry.end_time.as_deref());
        if [&subject_code, &location, &day, &start_time, &end_time]
            .iter()
            .any(|field| field.is_empty())
        {
            return None;
        }

        let class_label = normalize_whitespace(entry.type_with_section.as_deref());
        let rooms = split_multi(location.as_str(), DEFAULT_DELIMITER)
            .iter()
            .map(|location| self.rooms.map_room(location))
            .collect_vec();
        let teachers = split_multi(entry.lecturer.as_deref(), DEFAULT_DELIMITER);

        let rows = rooms
            .iter()
            .cartesian_product(teachers.iter())
            .map(|(room, teacher)| OutputRow {
                subject_code: subject_code.clone(),
                class_label: class_label.clone(),
                day: day.clone(),
                start_time: start_time.clone(),
                end_time: end_time.clone(),
                room: room.clone(),
                teacher: teacher.clone(),
            })
            .collect();
        Some(rows)
    }

    #[tracing::instrument(skip_all, fields(entries = entries.len()), level = "info")]
    pub fn emit(&self, entries: &[RawEntry]) -> Vec<OutputRow> {
        let mut filtered = 0usize;
        let rows = entries
            .iter()
            .filter_map(|entry| {
                let rows = self.rows_for(entry);
                if rows.is_none() {
                    filtered += 1;
                }
                rows
            })
            .flatten()
            .collect_vec();
        info!(rows = rows.len(), filtered, "Expanded timetable entries");
        rows
    }
}
