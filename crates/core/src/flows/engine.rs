use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::request::{Intent, SchedulingRequest};
use crate::flows::states::{DialogueAction, DialogueEvent, DialogueState, TransitionOutcome};

pub trait FlowDefinition {
    fn name(&self) -> &'static str;
    fn initial_state(&self) -> DialogueState;
    fn transition(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// `Start -> Parsed -> {CheckingAvailability | Booking} -> Responded`.
#[derive(Clone, Debug, Default)]
pub struct SchedulingFlow;

impl FlowDefinition for SchedulingFlow {
    fn name(&self) -> &'static str {
        "scheduling"
    }

    fn initial_state(&self) -> DialogueState {
        DialogueState::Start
    }

    fn transition(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_scheduling(current, event)
    }
}

/// Routing rule applied in `Parsed`. A booking without both times never
/// reaches `Booking`.
pub fn route(request: &SchedulingRequest) -> DialogueEvent {
    match request.intent {
        Intent::Check => DialogueEvent::AvailabilityRequested,
        Intent::Book if request.has_time_range() => DialogueEvent::BookingRequested,
        Intent::Book => DialogueEvent::RequestIncomplete,
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn flow_name(&self) -> &'static str {
        self.flow.name()
    }

    pub fn initial_state(&self) -> DialogueState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &DialogueState,
        event: &DialogueEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit.correlation_id.clone(),
                        "flow.transition_applied",
                        AuditCategory::Flow,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("flow", self.flow_name())
                    .with_metadata("from", format!("{:?}", outcome.from))
                    .with_metadata("to", format!("{:?}", outcome.to))
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.correlation_id.clone(),
                        "flow.transition_rejected",
                        AuditCategory::Flow,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("flow", self.flow_name())
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<SchedulingFlow> {
    fn default() -> Self {
        Self::new(SchedulingFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: DialogueState, event: DialogueEvent },
}

fn transition_scheduling(
    current: &DialogueState,
    event: &DialogueEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use DialogueAction::{RenderResponse, ResolveAvailability, ResolveBooking, RouteRequest};
    use DialogueEvent::{
        AvailabilityRequested, BookingRequested, EventBooked, FieldsExtracted, RequestIncomplete,
        ResolutionFailed, SlotsResolved,
    };
    use DialogueState::{Booking, CheckingAvailability, Parsed, Responded, Start};

    let (to, actions) = match (current, event) {
        (Start, FieldsExtracted) => (Parsed, vec![RouteRequest]),
        (Parsed, AvailabilityRequested) => (CheckingAvailability, vec![ResolveAvailability]),
        (Parsed, BookingRequested) => (Booking, vec![ResolveBooking]),
        (Parsed, RequestIncomplete)
        | (CheckingAvailability, SlotsResolved)
        | (CheckingAvailability, ResolutionFailed)
        | (Booking, EventBooked)
        | (Booking, ResolutionFailed) => (Responded, vec![RenderResponse]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                state: *current,
                event: *event,
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: *event, actions })
}
