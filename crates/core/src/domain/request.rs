use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MEETING_TITLE: &str = "Meeting";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    #[default]
    Check,
    Book,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Book => "book",
        }
    }
}

/// Structured fields pulled out of a single user message.
///
/// Built fresh for every message and dropped once the reply is rendered.
/// When both times are present the extractor guarantees `time_start <= time_end`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingRequest {
    pub intent: Intent,
    pub date: NaiveDate,
    pub time_start: Option<NaiveTime>,
    pub time_end: Option<NaiveTime>,
    pub title: Option<String>,
}

impl SchedulingRequest {
    pub fn new(intent: Intent, date: NaiveDate) -> Self {
        Self { intent, date, time_start: None, time_end: None, title: None }
    }

    pub fn with_times(mut self, start: Option<NaiveTime>, end: Option<NaiveTime>) -> Self {
        self.time_start = start;
        self.time_end = end;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn has_time_range(&self) -> bool {
        self.time_start.is_some() && self.time_end.is_some()
    }

    pub fn missing_booking_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.time_start.is_none() {
            missing.push("time_start".to_owned());
        }
        if self.time_end.is_none() {
            missing.push("time_end".to_owned());
        }
        missing
    }

    pub fn title_or_default(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(DEFAULT_MEETING_TITLE)
    }
}

/// Wire shape of the extractor boundary: `HH:MM` times and a `YYYY-MM-DD` date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub intent: Intent,
    pub date: String,
    pub time_start: Option<String>,
    pub time_end: Option<String>,
    pub title: Option<String>,
}

impl From<&SchedulingRequest> for ExtractedFields {
    fn from(request: &SchedulingRequest) -> Self {
        Self {
            intent: request.intent,
            date: request.date.format("%Y-%m-%d").to_string(),
            time_start: request.time_start.map(|time| time.format("%H:%M").to_string()),
            time_end: request.time_end.map(|time| time.format("%H:%M").to_string()),
            title: request.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{ExtractedFields, Intent, SchedulingRequest};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 20).expect("valid date")
    }

    #[test]
    fn wire_fields_use_short_time_format() {
        let request = SchedulingRequest::new(Intent::Book, date())
            .with_times(NaiveTime::from_hms_opt(15, 0, 0), NaiveTime::from_hms_opt(17, 0, 0))
            .with_title("Alice");

        let wire = ExtractedFields::from(&request);
        let json = serde_json::to_value(&wire).expect("serialize");

        assert_eq!(json["intent"], "book");
        assert_eq!(json["date"], "2026-10-20");
        assert_eq!(json["time_start"], "15:00");
        assert_eq!(json["time_end"], "17:00");
        assert_eq!(json["title"], "Alice");
    }

    #[test]
    fn absent_fields_serialize_as_null() {
        let wire = ExtractedFields::from(&SchedulingRequest::new(Intent::Check, date()));
        let json = serde_json::to_value(&wire).expect("serialize");

        assert_eq!(json["intent"], "check");
        assert!(json["time_start"].is_null());
        assert!(json["title"].is_null());
    }

    #[test]
    fn unknown_intent_is_rejected_at_the_wire() {
        let result = serde_json::from_str::<ExtractedFields>(
            r#"{"intent":"cancel","date":"2026-10-20","time_start":null,"time_end":null,"title":null}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_booking_fields_lists_each_absent_time() {
        let request = SchedulingRequest::new(Intent::Book, date())
            .with_times(NaiveTime::from_hms_opt(9, 0, 0), None);
        assert_eq!(request.missing_booking_fields(), vec!["time_end".to_owned()]);
        assert!(!request.has_time_range());
    }

    #[test]
    fn blank_title_falls_back_to_default() {
        let request = SchedulingRequest::new(Intent::Book, date()).with_title("  ");
        assert_eq!(request.title_or_default(), "Meeting");
    }
}
