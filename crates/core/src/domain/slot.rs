use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Half-open `[start, end)` interval in UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DomainError> {
        if start >= end {
            return Err(DomainError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Anchors optional times of day on `date`, falling back to 00:00 and 23:59.
    pub fn on_date(
        date: NaiveDate,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
    ) -> Result<Self, DomainError> {
        let start = start.unwrap_or(NaiveTime::MIN);
        let end = end.unwrap_or_else(end_of_day);
        Self::new(date.and_time(start).and_utc(), date.and_time(end).and_utc())
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && self.start < end
    }
}

pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Busy period as reported by the calendar. Ordering is an external guarantee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    use super::TimeWindow;
    use crate::errors::DomainError;

    #[test]
    fn on_date_defaults_to_whole_day() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).expect("valid date");
        let window = TimeWindow::on_date(date, None, None).expect("window");

        assert_eq!(window.start, Utc.with_ymd_and_hms(2026, 10, 20, 0, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2026, 10, 20, 23, 59, 0).unwrap());
    }

    #[test]
    fn inverted_window_is_rejected() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).expect("valid date");
        let error = TimeWindow::on_date(
            date,
            NaiveTime::from_hms_opt(17, 0, 0),
            NaiveTime::from_hms_opt(15, 0, 0),
        )
        .expect_err("start after end");

        assert!(matches!(error, DomainError::InvalidWindow { .. }));
    }

    #[test]
    fn window_is_half_open() {
        let start = Utc.with_ymd_and_hms(2026, 10, 20, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 10, 20, 12, 0, 0).unwrap();
        let window = TimeWindow::new(start, end).expect("window");

        assert!(window.contains(start));
        assert!(!window.contains(end));
        assert!(!window.overlaps(end, end + chrono::Duration::hours(1)));
    }
}
