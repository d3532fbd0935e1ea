//! Calendar adapters for the scheduling assistant.
//!
//! [`calendar_from_config`] builds the single calendar handle a process
//! shares across requests.

use std::sync::Arc;

use tailortalk_core::calendar::{CalendarError, CalendarPort, InMemoryCalendar};
use tailortalk_core::config::{CalendarConfig, CalendarProvider};
use tracing::info;

mod google;
mod token;

pub use google::GoogleCalendarClient;

pub fn calendar_from_config(
    config: &CalendarConfig,
) -> Result<Arc<dyn CalendarPort>, CalendarError> {
    let calendar: Arc<dyn CalendarPort> = match config.provider {
        CalendarProvider::Google => Arc::new(GoogleCalendarClient::from_config(config)?),
        CalendarProvider::Memory => Arc::new(InMemoryCalendar::new()),
    };
    info!(
        event_name = "calendar.adapter_ready",
        provider = calendar.provider_name(),
        calendar_id = %config.calendar_id,
        "calendar adapter initialised"
    );
    Ok(calendar)
}
