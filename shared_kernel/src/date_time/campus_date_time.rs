use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
/// CampusDateTime stores the time as `DateTime<UTC>` and renders it in the campus timezone,
/// so "today" follows the campus calendar rather than the host's.
pub struct CampusDateTime {
    utc: DateTime<Utc>,
    timezone: Tz,
}

impl CampusDateTime {
    pub fn now(timezone: Tz) -> Self {
        Self::at(Utc::now(), timezone)
    }

    pub fn at(utc: DateTime<Utc>, timezone: Tz) -> Self {
        Self { utc, timezone }
    }

    pub fn date(&self) -> NaiveDate {
        self.to_date_time().date_naive()
    }

    pub fn to_date_time(&self) -> DateTime<Tz> {
        self.timezone.from_utc_datetime(&self.utc.naive_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::CampusDateTime;
    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::Asia::Dubai;

    #[test]
    fn test_that_the_campus_date_can_run_ahead_of_utc() {
        let utc = Utc.with_ymd_and_hms(2024, 2, 29, 21, 30, 0).unwrap();
        let campus = CampusDateTime::at(utc, Dubai);
        assert_eq!(campus.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_that_the_campus_date_matches_utc_during_the_day() {
        let utc = Utc.with_ymd_and_hms(2024, 8, 20, 8, 0, 0).unwrap();
        let campus = CampusDateTime::at(utc, Dubai);
        assert_eq!(campus.date(), NaiveDate::from_ymd_opt(2024, 8, 20).unwrap());
    }
}
