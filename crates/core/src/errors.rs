use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::calendar::CalendarError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid time window: start {start} is not before end {end}")]
    InvalidWindow { start: DateTime<Utc>, end: DateTime<Utc> },
}

/// Failure of a resolver call. The pipeline turns every variant into a
/// `DialogueOutcome::Failure`; none reach the transport.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// Transport-level rejection. Only request decoding can fail at the edge,
/// since the pipeline itself always produces a reply.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Send a JSON body like {\"message\": \"...\"}."
            }
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } => correlation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::calendar::CalendarError;
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn bad_request_hides_decoder_detail() {
        let error = InterfaceError::BadRequest {
            message: "missing field `message` at line 1 column 18".to_owned(),
            correlation_id: "req-1".to_owned(),
        };

        assert_eq!(error.correlation_id(), "req-1");
        assert!(error.user_message().contains("JSON body"));
        assert!(!error.user_message().contains("missing field"));
    }

    #[test]
    fn resolver_errors_keep_their_source_message() {
        let start = Utc.with_ymd_and_hms(2026, 10, 20, 17, 0, 0).single().expect("timestamp");
        let end = Utc.with_ymd_and_hms(2026, 10, 20, 15, 0, 0).single().expect("timestamp");

        let domain = ApplicationError::from(DomainError::InvalidWindow { start, end });
        assert!(domain.to_string().starts_with("invalid time window"));

        let calendar =
            ApplicationError::from(CalendarError::Unreachable("connection refused".to_owned()));
        assert_eq!(calendar.to_string(), "calendar service unreachable: connection refused");
    }
}
