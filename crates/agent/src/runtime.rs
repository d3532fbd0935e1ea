use std::sync::Arc;

use tailortalk_core::audit::{
    AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, TracingAuditSink,
};
use tailortalk_core::availability::AvailabilityResolver;
use tailortalk_core::booking::BookingResolver;
use tailortalk_core::calendar::CalendarPort;
use tailortalk_core::clock::{Clock, SystemClock};
use tailortalk_core::config::AssistantConfig;
use tailortalk_core::domain::outcome::{DialogueOutcome, FailureReason};
use tailortalk_core::domain::request::SchedulingRequest;
use tailortalk_core::errors::ApplicationError;
use tailortalk_core::flows::{
    route, DialogueAction, DialogueEvent, DialogueState, FlowEngine, FlowTransitionError,
    SchedulingFlow, TransitionOutcome,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::extraction::{FieldExtractor, RuleBasedExtractor};
use crate::render::ResponseRenderer;

const ACTOR: &str = "dialogue-pipeline";

/// Stateless text-in, text-out scheduling assistant.
///
/// Every message runs the full `Start -> Parsed -> ... -> Responded` cycle
/// from scratch. Nothing is remembered between calls, and no call is retried.
pub struct AgentRuntime {
    extractor: Arc<dyn FieldExtractor>,
    engine: FlowEngine<SchedulingFlow>,
    availability: AvailabilityResolver,
    booking: BookingResolver,
    renderer: ResponseRenderer,
    clock: Arc<dyn Clock>,
    audit_sink: Arc<dyn AuditSink>,
    default_title: String,
}

impl AgentRuntime {
    pub fn new(calendar: Arc<dyn CalendarPort>, settings: &AssistantConfig) -> Self {
        Self {
            extractor: Arc::new(RuleBasedExtractor::with_booking_duration_minutes(
                settings.booking_duration_minutes,
            )),
            engine: FlowEngine::default(),
            availability: AvailabilityResolver::new(calendar.clone()),
            booking: BookingResolver::new(calendar),
            renderer: ResponseRenderer::new(),
            clock: Arc::new(SystemClock),
            audit_sink: Arc::new(TracingAuditSink),
            default_title: settings.default_title.clone(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audit_sink(mut self, audit_sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = audit_sink;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn FieldExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Structured fields for `text`, anchored at the runtime clock.
    pub fn extract(&self, text: &str) -> SchedulingRequest {
        self.extractor.extract(text, self.clock.now().naive_utc())
    }

    /// Runs one dialogue and returns the reply. Never fails.
    pub async fn handle_message(&self, text: &str) -> String {
        let correlation_id = Uuid::new_v4().to_string();
        let audit = AuditContext::new(correlation_id.clone(), ACTOR);

        let request = self.extract(text);
        self.audit_sink.emit(
            AuditEvent::new(
                correlation_id.clone(),
                "extraction.completed",
                AuditCategory::Extraction,
                ACTOR,
                AuditOutcome::Success,
            )
            .with_metadata("intent", request.intent.as_str())
            .with_metadata("date", request.date.to_string()),
        );

        let outcome = self.drive(&request, &audit).await;
        let reply = self.renderer.render(&outcome, request.intent);

        let mut responded = AuditEvent::new(
            correlation_id,
            "dialogue.responded",
            AuditCategory::Response,
            ACTOR,
            match &outcome {
                DialogueOutcome::Failure(_) => AuditOutcome::Failed,
                _ => AuditOutcome::Success,
            },
        )
        .with_metadata("intent", request.intent.as_str())
        .with_metadata("outcome", outcome.kind());
        if let DialogueOutcome::Failure(reason) = &outcome {
            responded = responded.with_metadata("reason", reason.code());
        }
        self.audit_sink.emit(responded);
        reply
    }

    async fn drive(&self, request: &SchedulingRequest, audit: &AuditContext) -> DialogueOutcome {
        let parsed = match self.step(DialogueState::Start, DialogueEvent::FieldsExtracted, audit) {
            Ok(transition) => transition,
            Err(error) => return flow_rejected(&error.to_string(), audit),
        };
        let routed = match self.step(parsed.to, route(request), audit) {
            Ok(transition) => transition,
            Err(error) => return flow_rejected(&error.to_string(), audit),
        };

        let (outcome, completion) = match routed.actions.as_slice() {
            [DialogueAction::ResolveAvailability] => self.check_availability(request, audit).await,
            [DialogueAction::ResolveBooking] => self.book(request, audit).await,
            [DialogueAction::RenderResponse] => {
                info!(
                    event_name = "dialogue.booking_incomplete",
                    correlation_id = %audit.correlation_id,
                    missing = ?request.missing_booking_fields(),
                    "booking request lacks a time range"
                );
                return DialogueOutcome::Failure(FailureReason::MissingTimeInformation);
            }
            actions => {
                return flow_rejected(&format!("no resolvable action in {actions:?}"), audit);
            }
        };

        if let Err(error) = self.step(routed.to, completion, audit) {
            warn!(
                event_name = "dialogue.completion_rejected",
                correlation_id = %audit.correlation_id,
                error = %error,
                "flow refused completion event"
            );
        }
        outcome
    }

    async fn check_availability(
        &self,
        request: &SchedulingRequest,
        audit: &AuditContext,
    ) -> (DialogueOutcome, DialogueEvent) {
        match self.availability.resolve(request.date, request.time_start, request.time_end).await
        {
            Ok(slots) => (DialogueOutcome::Slots(slots), DialogueEvent::SlotsResolved),
            Err(error) => {
                let reason = failure_reason(&error, FailureReason::AvailabilityFailed);
                self.record_failure("availability", &error, audit);
                (DialogueOutcome::Failure(reason), DialogueEvent::ResolutionFailed)
            }
        }
    }

    async fn book(
        &self,
        request: &SchedulingRequest,
        audit: &AuditContext,
    ) -> (DialogueOutcome, DialogueEvent) {
        let (Some(start), Some(end)) = (request.time_start, request.time_end) else {
            return (
                DialogueOutcome::Failure(FailureReason::MissingTimeInformation),
                DialogueEvent::ResolutionFailed,
            );
        };
        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(&self.default_title);

        let start = request.date.and_time(start).and_utc();
        let end = request.date.and_time(end).and_utc();
        match self.booking.resolve(start, end, title).await {
            Ok(event) => (DialogueOutcome::BookedEvent(event), DialogueEvent::EventBooked),
            Err(error) => {
                let reason = failure_reason(&error, FailureReason::BookingFailed);
                self.record_failure("booking", &error, audit);
                (DialogueOutcome::Failure(reason), DialogueEvent::ResolutionFailed)
            }
        }
    }

    fn step(
        &self,
        current: DialogueState,
        event: DialogueEvent,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.engine.apply_with_audit(&current, &event, self.audit_sink.as_ref(), audit)
    }

    fn record_failure(&self, operation: &str, error: &ApplicationError, audit: &AuditContext) {
        warn!(
            event_name = "calendar.call_failed",
            correlation_id = %audit.correlation_id,
            operation,
            error = %error,
            "calendar operation failed"
        );
        self.audit_sink.emit(
            AuditEvent::new(
                audit.correlation_id.clone(),
                "calendar.call_failed",
                AuditCategory::Calendar,
                audit.actor.clone(),
                AuditOutcome::Failed,
            )
            .with_metadata("operation", operation)
            .with_metadata("error", error.to_string()),
        );
    }
}

fn failure_reason(error: &ApplicationError, calendar_reason: FailureReason) -> FailureReason {
    match error {
        ApplicationError::Domain(_) => FailureReason::InvalidTimeWindow,
        ApplicationError::Calendar(_) => calendar_reason,
    }
}

fn flow_rejected(detail: &str, audit: &AuditContext) -> DialogueOutcome {
    warn!(
        event_name = "dialogue.flow_rejected",
        correlation_id = %audit.correlation_id,
        detail,
        "dialogue flow could not continue"
    );
    DialogueOutcome::Failure(FailureReason::FlowRejected)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tailortalk_core::audit::{AuditCategory, AuditContext, AuditOutcome, InMemoryAuditSink};
    use tailortalk_core::calendar::InMemoryCalendar;
    use tailortalk_core::clock::FixedClock;
    use tailortalk_core::config::AppConfig;
    use tailortalk_core::domain::event::{CalendarEvent, EventId};
    use tailortalk_core::domain::outcome::{DialogueOutcome, FailureReason};
    use tailortalk_core::domain::request::{Intent, SchedulingRequest};
    use tailortalk_core::flows::{DialogueEvent, DialogueState, FlowTransitionError};

    use super::{flow_rejected, AgentRuntime};
    use crate::extraction::FieldExtractor;
    use crate::render::{ResponseRenderer, GENERIC_APOLOGY, MISSING_TIME_DETAILS, NO_FREE_SLOTS};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0).single().expect("timestamp")
    }

    fn runtime(calendar: Arc<InMemoryCalendar>) -> AgentRuntime {
        AgentRuntime::new(calendar, &AppConfig::default().assistant)
            .with_clock(Arc::new(FixedClock(at(19, 10))))
    }

    fn busy(start: DateTime<Utc>, end: DateTime<Utc>) -> CalendarEvent {
        CalendarEvent { id: EventId("busy".to_owned()), start, end, summary: "Busy".to_owned() }
    }

    #[tokio::test]
    async fn availability_question_lists_free_slots() {
        let calendar = Arc::new(InMemoryCalendar::with_events(vec![busy(at(20, 15), at(20, 16))]));
        let reply =
            runtime(calendar.clone()).handle_message("Am I free tomorrow between 3-5pm?").await;

        assert_eq!(
            reply,
            "Here are your free slots:\n- 2026-10-20T16:00:00+00:00 to 2026-10-20T17:00:00+00:00"
        );
        assert_eq!(calendar.free_busy_calls(), 1);
        assert_eq!(calendar.insert_calls(), 0);
    }

    #[tokio::test]
    async fn fully_booked_window_reports_no_slots() {
        let calendar = Arc::new(InMemoryCalendar::with_events(vec![busy(at(20, 14), at(20, 18))]));
        let reply = runtime(calendar).handle_message("any availability tomorrow 3-5pm").await;

        assert_eq!(reply, NO_FREE_SLOTS);
    }

    #[tokio::test]
    async fn booking_request_creates_event_with_default_title() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let reply = runtime(calendar.clone())
            .handle_message("Book a meeting tomorrow from 3pm to 5pm")
            .await;

        assert_eq!(
            reply,
            "Your meeting “Meeting” is booked from 2026-10-20T15:00:00+00:00 to \
             2026-10-20T17:00:00+00:00."
        );
        let events = calendar.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].start, at(20, 15));
        assert_eq!(events[0].end, at(20, 17));
    }

    #[tokio::test]
    async fn booking_uses_extracted_title() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let reply = runtime(calendar.clone())
            .handle_message("Schedule a call with Priya tomorrow 10-11am")
            .await;

        assert!(reply.starts_with("Your meeting “Priya” is booked"), "{reply}");
        assert_eq!(calendar.events()[0].summary, "Priya");
    }

    #[tokio::test]
    async fn incomplete_booking_never_reaches_the_calendar() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let reply = runtime(calendar.clone()).handle_message("Book something tomorrow").await;

        assert_eq!(reply, MISSING_TIME_DETAILS);
        assert_eq!(calendar.insert_calls(), 0);
        assert_eq!(calendar.free_busy_calls(), 0);
    }

    #[tokio::test]
    async fn unreachable_calendar_yields_generic_apology() {
        let calendar = Arc::new(InMemoryCalendar::unavailable());
        let sink = InMemoryAuditSink::default();
        let runtime = runtime(calendar.clone()).with_audit_sink(Arc::new(sink.clone()));

        assert_eq!(runtime.handle_message("am I free tomorrow?").await, GENERIC_APOLOGY);
        assert_eq!(runtime.handle_message("book tomorrow 2-3pm").await, GENERIC_APOLOGY);
        assert_eq!(calendar.free_busy_calls(), 1);
        assert_eq!(calendar.insert_calls(), 1);
        assert_eq!(
            sink.event_types().iter().filter(|kind| *kind == "calendar.call_failed").count(),
            2
        );
    }

    #[tokio::test]
    async fn dialogue_transitions_are_audited_under_one_correlation_id() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let sink = InMemoryAuditSink::default();
        let runtime = runtime(calendar).with_audit_sink(Arc::new(sink.clone()));

        let _ = runtime.handle_message("free tomorrow morning?").await;

        let events = sink.events();
        assert_eq!(
            sink.event_types(),
            vec![
                "extraction.completed",
                "flow.transition_applied",
                "flow.transition_applied",
                "flow.transition_applied",
                "dialogue.responded"
            ]
        );
        assert!(events.iter().all(|event| event.correlation_id == events[0].correlation_id));
        assert_eq!(events[3].metadata.get("to").map(String::as_str), Some("Responded"));
        assert_eq!(events[4].category, AuditCategory::Response);
        assert_eq!(events[4].metadata.get("outcome").map(String::as_str), Some("slots"));
    }

    #[tokio::test]
    async fn failed_dialogues_record_the_failure_reason() {
        let sink = InMemoryAuditSink::default();
        let runtime =
            runtime(Arc::new(InMemoryCalendar::new())).with_audit_sink(Arc::new(sink.clone()));

        let _ = runtime.handle_message("book something").await;

        let responded = sink.events().pop().expect("response audit event");
        assert_eq!(responded.event_type, "dialogue.responded");
        assert_eq!(responded.outcome, AuditOutcome::Failed);
        assert_eq!(
            responded.metadata.get("reason").map(String::as_str),
            Some("missing time information")
        );
    }

    #[test]
    fn rejected_flow_is_reported_as_its_own_reason() {
        let audit = AuditContext::new("req-7", "dialogue-pipeline");
        let error = FlowTransitionError::InvalidTransition {
            state: DialogueState::Responded,
            event: DialogueEvent::FieldsExtracted,
        };

        let outcome = flow_rejected(&error.to_string(), &audit);

        assert_eq!(outcome, DialogueOutcome::Failure(FailureReason::FlowRejected));
        assert_eq!(GENERIC_APOLOGY, ResponseRenderer::new().render(&outcome, Intent::Check));
    }

    #[tokio::test]
    async fn scenario_booking_with_range_and_attendee() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let runtime = runtime(calendar.clone());
        let message = "book a meeting tomorrow 3-5pm with Alice";

        let request = runtime.extract(message);
        assert_eq!(request.intent, Intent::Book);
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2026, 10, 20).expect("date"));
        assert_eq!(request.time_start, NaiveTime::from_hms_opt(15, 0, 0));
        assert_eq!(request.time_end, NaiveTime::from_hms_opt(17, 0, 0));
        assert_eq!(request.title.as_deref(), Some("Alice"));

        let reply = runtime.handle_message(message).await;

        assert_eq!(
            reply,
            "Your meeting “Alice” is booked from 2026-10-20T15:00:00+00:00 to \
             2026-10-20T17:00:00+00:00."
        );
        assert_eq!(calendar.insert_calls(), 1);
        assert_eq!(calendar.free_busy_calls(), 0);
        let events = calendar.events();
        assert_eq!(events[0].summary, "Alice");
        assert_eq!((events[0].start, events[0].end), (at(20, 15), at(20, 17)));
    }

    #[tokio::test]
    async fn scenario_free_time_in_a_period() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let runtime = runtime(calendar.clone());
        let message = "any free time tomorrow morning";

        let request = runtime.extract(message);
        assert_eq!(request.intent, Intent::Check);
        assert_eq!(request.time_start, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(request.time_end, NaiveTime::from_hms_opt(12, 0, 0));
        assert_eq!(request.title, None);

        let reply = runtime.handle_message(message).await;

        assert_eq!(
            reply,
            "Here are your free slots:\n- 2026-10-20T09:00:00+00:00 to 2026-10-20T12:00:00+00:00"
        );
        assert_eq!(calendar.free_busy_calls(), 1);
        assert_eq!(calendar.insert_calls(), 0);
    }

    #[tokio::test]
    async fn scenario_booking_without_any_time() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let runtime = runtime(calendar.clone());
        let message = "schedule something";

        let request = runtime.extract(message);
        assert_eq!(request.intent, Intent::Book);
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2026, 10, 19).expect("date"));
        assert_eq!((request.time_start, request.time_end), (None, None));

        let reply = runtime.handle_message(message).await;

        assert_eq!(reply, MISSING_TIME_DETAILS);
        assert_eq!(calendar.free_busy_calls(), 0);
        assert_eq!(calendar.insert_calls(), 0);
    }

    struct CannedExtractor(SchedulingRequest);

    impl FieldExtractor for CannedExtractor {
        fn extract(&self, _text: &str, _now: NaiveDateTime) -> SchedulingRequest {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn blank_titles_fall_back_to_configured_default() {
        let calendar = Arc::new(InMemoryCalendar::new());
        let date = NaiveDate::from_ymd_opt(2026, 10, 21).expect("date");
        let request = SchedulingRequest::new(Intent::Book, date)
            .with_times(NaiveTime::from_hms_opt(9, 0, 0), NaiveTime::from_hms_opt(9, 30, 0))
            .with_title("   ");
        let runtime = runtime(calendar.clone()).with_extractor(Arc::new(CannedExtractor(request)));

        let _ = runtime.handle_message("ignored").await;

        assert_eq!(calendar.events()[0].summary, "Meeting");
    }
}
