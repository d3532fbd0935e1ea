//! Calendar capability consumed by the resolvers.
//!
//! The port is an explicit handle: it is built once at process start and
//! shared (`Arc<dyn CalendarPort>`) with every request. Concrete adapters live
//! outside this crate; [`InMemoryCalendar`] backs tests and local runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::event::{CalendarEvent, EventId, NewEvent};
use crate::domain::slot::{BusyInterval, TimeWindow};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("calendar service unreachable: {0}")]
    Unreachable(String),
    #[error("calendar service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("calendar service returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("calendar authentication failed: {0}")]
    Authentication(String),
    #[error("calendar adapter is misconfigured: {0}")]
    Misconfigured(String),
}

#[async_trait]
pub trait CalendarPort: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Busy periods inside `window`, sorted by start.
    async fn free_busy(&self, window: TimeWindow) -> Result<Vec<BusyInterval>, CalendarError>;

    async fn insert_event(&self, event: NewEvent) -> Result<CalendarEvent, CalendarError>;
}

#[derive(Clone, Default)]
pub struct InMemoryCalendar {
    events: Arc<Mutex<Vec<CalendarEvent>>>,
    unavailable: bool,
    free_busy_calls: Arc<AtomicUsize>,
    insert_calls: Arc<AtomicUsize>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<CalendarEvent>) -> Self {
        Self { events: Arc::new(Mutex::new(events)), ..Self::default() }
    }

    /// A calendar whose every call fails as if the backend were down.
    pub fn unavailable() -> Self {
        Self { unavailable: true, ..Self::default() }
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn free_busy_calls(&self) -> usize {
        self.free_busy_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), CalendarError> {
        if self.unavailable {
            return Err(CalendarError::Unreachable("in-memory calendar is offline".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarPort for InMemoryCalendar {
    fn provider_name(&self) -> &'static str {
        "memory"
    }

    async fn free_busy(&self, window: TimeWindow) -> Result<Vec<BusyInterval>, CalendarError> {
        self.free_busy_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut busy = self
            .events()
            .into_iter()
            .filter(|event| window.overlaps(event.start, event.end))
            .map(|event| BusyInterval::new(event.start.max(window.start), event.end.min(window.end)))
            .collect::<Vec<_>>();
        busy.sort_by_key(|interval| interval.start);
        Ok(busy)
    }

    async fn insert_event(&self, event: NewEvent) -> Result<CalendarEvent, CalendarError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let created = CalendarEvent {
            id: EventId(Uuid::new_v4().to_string()),
            start: event.start,
            end: event.end,
            summary: event.summary,
        };
        match self.events.lock() {
            Ok(mut events) => events.push(created.clone()),
            Err(poisoned) => poisoned.into_inner().push(created.clone()),
        }
        Ok(created)
    }
}
