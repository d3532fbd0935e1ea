use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use crate::calendar::{CalendarError, CalendarPort};
use crate::domain::slot::{BusyInterval, TimeSlot, TimeWindow};
use crate::errors::ApplicationError;

/// Free slots inside `window` given busy periods sorted by start.
///
/// Single pass over `busy`. Overlapping or unsorted input is passed through
/// uncorrected, so the result is only as well-formed as the calendar data.
pub fn subtract_busy(window: TimeWindow, busy: &[BusyInterval]) -> Vec<TimeSlot> {
    let mut free = Vec::new();
    let mut cursor = window.start;

    for interval in busy {
        if interval.start > cursor {
            free.push(TimeSlot::new(cursor, interval.start));
        }
        cursor = cursor.max(interval.end);
    }

    if cursor < window.end {
        free.push(TimeSlot::new(cursor, window.end));
    }

    free
}

#[derive(Clone)]
pub struct AvailabilityResolver {
    calendar: Arc<dyn CalendarPort>,
}

impl AvailabilityResolver {
    pub fn new(calendar: Arc<dyn CalendarPort>) -> Self {
        Self { calendar }
    }

    pub async fn resolve(
        &self,
        date: NaiveDate,
        window_start: Option<NaiveTime>,
        window_end: Option<NaiveTime>,
    ) -> Result<Vec<TimeSlot>, ApplicationError> {
        let window = TimeWindow::on_date(date, window_start, window_end)?;
        Ok(self.list_free_slots(window).await?)
    }

    pub async fn list_free_slots(
        &self,
        window: TimeWindow,
    ) -> Result<Vec<TimeSlot>, CalendarError> {
        let busy = self.calendar.free_busy(window).await?;
        let free = subtract_busy(window, &busy);
        debug!(
            event_name = "availability.resolved",
            provider = self.calendar.provider_name(),
            busy_count = busy.len(),
            free_count = free.len(),
            "free slots computed"
        );
        Ok(free)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

    use super::{subtract_busy, AvailabilityResolver};
    use crate::calendar::InMemoryCalendar;
    use crate::domain::event::{CalendarEvent, EventId};
    use crate::domain::slot::{BusyInterval, TimeSlot, TimeWindow};
    use crate::errors::{ApplicationError, DomainError};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 20, hour, minute, 0).unwrap()
    }

    fn window(start: u32, end: u32) -> TimeWindow {
        TimeWindow::new(at(start, 0), at(end, 0)).expect("window")
    }

    #[test]
    fn no_busy_intervals_yield_the_whole_window() {
        let slots = subtract_busy(window(9, 12), &[]);
        assert_eq!(slots, vec![TimeSlot::new(at(9, 0), at(12, 0))]);
    }

    #[test]
    fn busy_interval_equal_to_window_leaves_nothing() {
        let slots = subtract_busy(window(9, 12), &[BusyInterval::new(at(9, 0), at(12, 0))]);
        assert!(slots.is_empty());
    }

    #[test]
    fn busy_interval_containing_window_leaves_nothing() {
        let slots = subtract_busy(window(9, 12), &[BusyInterval::new(at(8, 0), at(13, 0))]);
        assert!(slots.is_empty());
    }

    #[test]
    fn gaps_between_busy_intervals_become_slots() {
        let slots = subtract_busy(
            window(9, 17),
            &[BusyInterval::new(at(10, 0), at(11, 0)), BusyInterval::new(at(13, 30), at(14, 0))],
        );

        assert_eq!(
            slots,
            vec![
                TimeSlot::new(at(9, 0), at(10, 0)),
                TimeSlot::new(at(11, 0), at(13, 30)),
                TimeSlot::new(at(14, 0), at(17, 0)),
            ]
        );
    }

    #[test]
    fn back_to_back_busy_intervals_do_not_emit_empty_slots() {
        let slots = subtract_busy(
            window(9, 12),
            &[BusyInterval::new(at(9, 0), at(10, 0)), BusyInterval::new(at(10, 0), at(11, 0))],
        );
        assert_eq!(slots, vec![TimeSlot::new(at(11, 0), at(12, 0))]);
    }

    #[test]
    fn overlapping_busy_data_is_not_corrected() {
        let slots = subtract_busy(
            window(9, 12),
            &[BusyInterval::new(at(9, 30), at(11, 0)), BusyInterval::new(at(10, 0), at(10, 30))],
        );
        assert_eq!(
            slots,
            vec![TimeSlot::new(at(9, 0), at(9, 30)), TimeSlot::new(at(11, 0), at(12, 0))]
        );
    }

    #[tokio::test]
    async fn resolver_defaults_missing_times_to_the_whole_day() {
        let calendar = InMemoryCalendar::with_events(vec![CalendarEvent {
            id: EventId("evt-1".to_owned()),
            start: at(9, 0),
            end: at(10, 0),
            summary: "Standup".to_owned(),
        }]);
        let resolver = AvailabilityResolver::new(Arc::new(calendar.clone()));
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).expect("date");

        let slots = resolver.resolve(date, None, None).await.expect("slots");

        assert_eq!(
            slots,
            vec![TimeSlot::new(at(0, 0), at(9, 0)), TimeSlot::new(at(10, 0), at(23, 59))]
        );
        assert_eq!(calendar.free_busy_calls(), 1);
    }

    #[tokio::test]
    async fn resolver_rejects_inverted_window_without_calling_calendar() {
        let calendar = InMemoryCalendar::new();
        let resolver = AvailabilityResolver::new(Arc::new(calendar.clone()));
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).expect("date");

        let error = resolver
            .resolve(date, NaiveTime::from_hms_opt(17, 0, 0), NaiveTime::from_hms_opt(9, 0, 0))
            .await
            .expect_err("inverted window");

        assert!(matches!(error, ApplicationError::Domain(DomainError::InvalidWindow { .. })));
        assert_eq!(calendar.free_busy_calls(), 0);
    }
}
