//! Rule-based scheduling field extraction.
//!
//! Extraction never fails. Anything that cannot be recognised falls back to
//! the defaults of [`SchedulingRequest::new`]: an availability check for the
//! reference date with no times and no title.

mod intent;
mod patterns;
mod temporal;
mod title;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use tailortalk_core::domain::request::{Intent, SchedulingRequest};
use tailortalk_core::domain::slot::end_of_day;

use crate::extraction::temporal::RangeScan;

pub const DEFAULT_BOOKING_DURATION_MINUTES: u32 = 60;

/// Pluggable boundary between raw text and the dialogue pipeline.
pub trait FieldExtractor: Send + Sync {
    /// `now` anchors every relative expression ("tomorrow", "next friday").
    fn extract(&self, text: &str, now: NaiveDateTime) -> SchedulingRequest;
}

#[derive(Clone, Debug)]
pub struct RuleBasedExtractor {
    booking_duration: Duration,
}

impl Default for RuleBasedExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self::with_booking_duration_minutes(DEFAULT_BOOKING_DURATION_MINUTES)
    }

    pub fn with_booking_duration_minutes(minutes: u32) -> Self {
        Self { booking_duration: Duration::minutes(i64::from(minutes.max(1))) }
    }
}

impl FieldExtractor for RuleBasedExtractor {
    fn extract(&self, text: &str, now: NaiveDateTime) -> SchedulingRequest {
        let today = now.date();
        let Some(patterns) = patterns::patterns() else {
            return SchedulingRequest::new(Intent::Check, today);
        };

        let normalized = normalize_text(text);
        let intent = intent::detect_intent(&normalized, patterns);

        let date_match = temporal::resolve_date(&normalized, today, patterns);
        let date = date_match.as_ref().map_or(today, |found| found.date);
        let masked = temporal::mask(&normalized, date_match.as_ref().map(|found| &found.span));
        let period = temporal::detect_period(&normalized, patterns);

        let (time_start, time_end) = match temporal::detect_range(&masked, patterns) {
            RangeScan::Found { start, end } => (Some(start), Some(end)),
            RangeScan::Inverted => (None, None),
            RangeScan::Absent => match temporal::detect_single_time(&masked, period, patterns) {
                Some(start) if intent == Intent::Book => {
                    (Some(start), Some(repair_end(start, self.booking_duration)))
                }
                Some(start) => (Some(start), None),
                None => match period {
                    Some(period) => {
                        let (start, end) = period.window();
                        (Some(start), Some(end))
                    }
                    None => (None, None),
                },
            },
        };

        let mut request = SchedulingRequest::new(intent, date).with_times(time_start, time_end);
        if intent == Intent::Book {
            if let Some(title) = title::extract_title(&normalized, patterns) {
                request = request.with_title(title);
            }
        }

        tracing::debug!(
            event_name = "extraction.completed",
            intent = intent.as_str(),
            date = %request.date,
            has_start = request.time_start.is_some(),
            has_end = request.time_end.is_some(),
            has_title = request.title.is_some(),
            "scheduling fields extracted"
        );
        request
    }
}

/// `start + duration`, clamped to the last minute of the same day.
pub fn repair_end(start: NaiveTime, duration: Duration) -> NaiveTime {
    let (end, wrapped_seconds) = start.overflowing_add_signed(duration);
    if wrapped_seconds != 0 || end <= start {
        end_of_day()
    } else {
        end
    }
}

fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .replace("a.m.", "am")
        .replace("p.m.", "pm")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201c}', '\u{201d}'], "\"")
}
