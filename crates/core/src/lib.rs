pub mod audit;
pub mod availability;
pub mod booking;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use availability::{subtract_busy, AvailabilityResolver};
pub use booking::BookingResolver;
pub use calendar::{CalendarError, CalendarPort, InMemoryCalendar};
pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::event::{CalendarEvent, EventId, NewEvent};
pub use domain::outcome::{DialogueOutcome, FailureReason};
pub use domain::request::{ExtractedFields, Intent, SchedulingRequest, DEFAULT_MEETING_TITLE};
pub use domain::slot::{BusyInterval, TimeSlot, TimeWindow};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{DialogueEvent, DialogueState, FlowEngine, SchedulingFlow};
