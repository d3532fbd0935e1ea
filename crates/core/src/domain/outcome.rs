use serde::{Deserialize, Serialize};

use crate::domain::event::CalendarEvent;
use crate::domain::slot::TimeSlot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    MissingTimeInformation,
    InvalidTimeWindow,
    AvailabilityFailed,
    BookingFailed,
    FlowRejected,
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingTimeInformation => "missing time information",
            Self::InvalidTimeWindow => "invalid time window",
            Self::AvailabilityFailed => "availability lookup failed",
            Self::BookingFailed => "booking failed",
            Self::FlowRejected => "dialogue flow rejected the request",
        }
    }
}

/// Terminal artifact of a dialogue run, consumed by the response renderer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueOutcome {
    Slots(Vec<TimeSlot>),
    BookedEvent(CalendarEvent),
    Failure(FailureReason),
}

impl DialogueOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Slots(_) => "slots",
            Self::BookedEvent(_) => "booked_event",
            Self::Failure(_) => "failure",
        }
    }
}
