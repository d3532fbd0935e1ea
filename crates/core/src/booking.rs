use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::calendar::{CalendarError, CalendarPort};
use crate::domain::event::{CalendarEvent, NewEvent};
use crate::domain::slot::TimeWindow;
use crate::errors::ApplicationError;

#[derive(Clone)]
pub struct BookingResolver {
    calendar: Arc<dyn CalendarPort>,
}

impl BookingResolver {
    pub fn new(calendar: Arc<dyn CalendarPort>) -> Self {
        Self { calendar }
    }

    pub async fn resolve(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        title: &str,
    ) -> Result<CalendarEvent, ApplicationError> {
        let window = TimeWindow::new(start, end)?;
        Ok(self.create_event(window, title).await?)
    }

    pub async fn create_event(
        &self,
        window: TimeWindow,
        title: &str,
    ) -> Result<CalendarEvent, CalendarError> {
        let result =
            self.calendar.insert_event(NewEvent::new(window.start, window.end, title)).await;
        match &result {
            Ok(event) => info!(
                event_name = "booking.created",
                provider = self.calendar.provider_name(),
                event_id = %event.id.0,
                "calendar event created"
            ),
            Err(error) => warn!(
                event_name = "booking.rejected",
                provider = self.calendar.provider_name(),
                error = %error,
                "calendar refused to create event"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::BookingResolver;
    use crate::calendar::{CalendarError, InMemoryCalendar};
    use crate::errors::ApplicationError;

    #[tokio::test]
    async fn creates_event_with_requested_window_and_title() {
        let calendar = InMemoryCalendar::new();
        let resolver = BookingResolver::new(Arc::new(calendar.clone()));
        let start = Utc.with_ymd_and_hms(2026, 10, 20, 15, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 10, 20, 17, 0, 0).unwrap();

        let event = resolver.resolve(start, end, "Alice").await.expect("booked");

        assert_eq!(event.summary, "Alice");
        assert_eq!(event.start, start);
        assert_eq!(event.end, end);
        assert_eq!(calendar.events(), vec![event]);
    }

    #[tokio::test]
    async fn downstream_failure_is_reported_as_calendar_error() {
        let resolver = BookingResolver::new(Arc::new(InMemoryCalendar::unavailable()));
        let start = Utc.with_ymd_and_hms(2026, 10, 20, 15, 0, 0).unwrap();

        let error = resolver
            .resolve(start, start + chrono::Duration::hours(1), "Sync")
            .await
            .expect_err("calendar offline");

        assert!(matches!(error, ApplicationError::Calendar(CalendarError::Unreachable(_))));
    }
}
