use std::sync::OnceLock;

use regex::Regex;

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";
const WEEKDAYS: &str =
    "monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues|tue|wed|thurs|thur|thu|fri";

/// Compiled lexical patterns. All of them run against lower-cased text.
pub(crate) struct Patterns {
    pub booking_marker: Regex,
    pub inquiry_marker: Regex,
    pub iso_date: Regex,
    pub slash_date: Regex,
    pub month_day: Regex,
    pub day_month: Regex,
    pub relative_day: Regex,
    pub in_offset: Regex,
    pub next_week: Regex,
    pub weekday: Regex,
    pub time_range: Regex,
    pub meridiem_time: Regex,
    pub clock_time: Regex,
    pub at_hour: Regex,
    pub named_time: Regex,
    pub period: Regex,
    pub with_about: Regex,
    pub called: Regex,
    pub booking_object: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            booking_marker: Regex::new(r"\b(?:book|booking|schedule|reserve|arrange|set\s+up)\b")?,
            inquiry_marker: Regex::new(r"\b(?:free|available|availability|open)\b")?,
            iso_date: Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b")?,
            slash_date: Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b")?,
            month_day: Regex::new(&format!(
                r"\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?(?:,?\s+(\d{{4}}))?\b"
            ))?,
            day_month: Regex::new(&format!(
                r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({MONTHS})\b\.?(?:,?\s+(\d{{4}})\b)?"
            ))?,
            relative_day: Regex::new(r"\b(day after tomorrow|tomorrow|tmrw|today|tonight)\b")?,
            in_offset: Regex::new(
                r"\bin\s+(\d{1,3}|a|an|one|two|three|four|five|six|seven)\s+(days?|weeks?)\b",
            )?,
            next_week: Regex::new(r"\bnext\s+week\b")?,
            weekday: Regex::new(&format!(r"\b(?:(this|next|coming)\s+)?({WEEKDAYS})\b"))?,
            time_range: Regex::new(
                r"\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)?\s*(?:-|–|—|to|until|till)\s*(\d{1,2})(?::(\d{2}))?\s*(am|pm)?\b",
            )?,
            meridiem_time: Regex::new(r"\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b")?,
            clock_time: Regex::new(r"\b(\d{1,2}):(\d{2})\b")?,
            at_hour: Regex::new(r"\bat\s+(\d{1,2})\b")?,
            named_time: Regex::new(r"\b(noon|midday|midnight)\b")?,
            period: Regex::new(r"\b(morning|afternoon|evening|tonight)\b")?,
            with_about: Regex::new(r"\b(?:with|about)\s+")?,
            called: Regex::new(r#"\b(?:called|titled|named)\s+(?:"([^"]+)"|'([^']+)'|(.+)$)"#)?,
            booking_object: Regex::new(
                r"\b(?:book|booking|schedule|reserve|arrange|set\s+up)\s+(.+)$",
            )?,
        })
    }
}

static PATTERNS: OnceLock<Option<Patterns>> = OnceLock::new();

/// `None` only if a pattern failed to compile; callers degrade to defaults.
pub(crate) fn patterns() -> Option<&'static Patterns> {
    PATTERNS
        .get_or_init(|| match Patterns::compile() {
            Ok(patterns) => Some(patterns),
            Err(error) => {
                tracing::error!(
                    event_name = "extraction.patterns_invalid",
                    error = %error,
                    "extraction patterns failed to compile; falling back to defaults"
                );
                None
            }
        })
        .as_ref()
}
