use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueState {
    Start,
    Parsed,
    CheckingAvailability,
    Booking,
    Responded,
}

impl DialogueState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Responded)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueEvent {
    FieldsExtracted,
    AvailabilityRequested,
    BookingRequested,
    RequestIncomplete,
    SlotsResolved,
    EventBooked,
    ResolutionFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueAction {
    RouteRequest,
    ResolveAvailability,
    ResolveBooking,
    RenderResponse,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: DialogueState,
    pub to: DialogueState,
    pub event: DialogueEvent,
    pub actions: Vec<DialogueAction>,
}
