use crate::normalizer::normalize_whitespace;
use chrono::{Datelike, NaiveDate};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        };
        f.write_str(name)
    }
}

/// 1-based week of the month: days 1-7 are week 1, 8-14 week 2 and so on.
pub fn week_of_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

impl Season {
    pub fn for_date(date: NaiveDate) -> Season {
        let week = week_of_month(date);
        match date.month() {
            1 | 2 => Season::Winter,
            3 if week <= 3 => Season::Winter,
            3 => Season::Spring,
            4..=6 => Season::Spring,
            7 => Season::Summer,
            8 if week <= 2 => Season::Summer,
            8 => Season::Autumn,
            9..=11 => Season::Autumn,
            12 if week <= 1 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

/// Label of the term running on `date`, e.g. "Spring 2024".
pub fn current_term_label(date: NaiveDate) -> String {
    normalize_whitespace(format!("{} {}", Season::for_date(date), date.year()).as_str())
}
