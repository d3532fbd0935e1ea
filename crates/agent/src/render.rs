use serde::Serialize;
use tailortalk_core::domain::outcome::{DialogueOutcome, FailureReason};
use tailortalk_core::domain::request::Intent;
use tera::{Context, Tera};
use tracing::error;

pub const NO_FREE_SLOTS: &str = "Sorry, no free slots found.";
pub const MISSING_TIME_DETAILS: &str =
    "Time details missing. Please specify both start and end times.";
pub const GENERIC_APOLOGY: &str =
    "Sorry, something went wrong while handling your request. Please try again later.";

const FREE_SLOTS_TEMPLATE: &str = "free_slots.txt.tera";
const BOOKED_EVENT_TEMPLATE: &str = "booked_event.txt.tera";

#[derive(Serialize)]
struct SlotView {
    start: String,
    end: String,
}

/// Turns a dialogue outcome into the single reply string.
///
/// Rendering is infallible: template errors are logged and answered with
/// [`GENERIC_APOLOGY`].
#[derive(Clone, Debug)]
pub struct ResponseRenderer {
    templates: Option<Tera>,
}

impl Default for ResponseRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseRenderer {
    pub fn new() -> Self {
        let mut tera = Tera::default();
        let registered = tera.add_raw_templates(vec![
            (FREE_SLOTS_TEMPLATE, include_str!("../templates/free_slots.txt.tera")),
            (BOOKED_EVENT_TEMPLATE, include_str!("../templates/booked_event.txt.tera")),
        ]);
        match registered {
            Ok(()) => Self { templates: Some(tera) },
            Err(error) => {
                error!(
                    event_name = "render.templates_invalid",
                    error = %error,
                    "response templates failed to load"
                );
                Self { templates: None }
            }
        }
    }

    pub fn render(&self, outcome: &DialogueOutcome, intent: Intent) -> String {
        match (outcome, intent) {
            (DialogueOutcome::Slots(slots), Intent::Check) if slots.is_empty() => {
                NO_FREE_SLOTS.to_owned()
            }
            (DialogueOutcome::Slots(slots), Intent::Check) => {
                let views = slots
                    .iter()
                    .map(|slot| SlotView {
                        start: slot.start.to_rfc3339(),
                        end: slot.end.to_rfc3339(),
                    })
                    .collect::<Vec<_>>();
                let mut context = Context::new();
                context.insert("slots", &views);
                self.render_template(FREE_SLOTS_TEMPLATE, &context)
            }
            (DialogueOutcome::BookedEvent(event), Intent::Book) => {
                let mut context = Context::new();
                context.insert("summary", &event.summary);
                context.insert("start", &event.start.to_rfc3339());
                context.insert("end", &event.end.to_rfc3339());
                self.render_template(BOOKED_EVENT_TEMPLATE, &context)
            }
            (DialogueOutcome::Failure(FailureReason::MissingTimeInformation), _) => {
                MISSING_TIME_DETAILS.to_owned()
            }
            _ => GENERIC_APOLOGY.to_owned(),
        }
    }

    fn render_template(&self, name: &str, context: &Context) -> String {
        let Some(tera) = &self.templates else {
            return GENERIC_APOLOGY.to_owned();
        };
        match tera.render(name, context) {
            Ok(rendered) => rendered.trim_end().to_owned(),
            Err(error) => {
                error!(
                    event_name = "render.failed",
                    template = name,
                    error = %error,
                    "response template failed to render"
                );
                GENERIC_APOLOGY.to_owned()
            }
        }
    }
}
