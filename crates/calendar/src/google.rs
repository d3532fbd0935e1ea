use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, Url};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tailortalk_core::calendar::{CalendarError, CalendarPort};
use tailortalk_core::config::CalendarConfig;
use tailortalk_core::domain::event::{CalendarEvent, EventId, NewEvent};
use tailortalk_core::domain::slot::{BusyInterval, TimeWindow};
use tracing::{debug, warn};

use crate::token::TokenSource;

const UTC_ZONE: &str = "UTC";

/// Google Calendar v3 REST adapter.
///
/// Uses two endpoints: `POST /freeBusy` for busy periods and
/// `POST /calendars/{id}/events` for inserts. All times go over the wire as
/// RFC 3339 in UTC.
pub struct GoogleCalendarClient {
    http: Client,
    api_base: Url,
    calendar_id: String,
    tokens: TokenSource,
}

impl GoogleCalendarClient {
    pub fn from_config(config: &CalendarConfig) -> Result<Self, CalendarError> {
        let api_base = Url::parse(&config.api_base_url).map_err(|error| {
            CalendarError::Misconfigured(format!(
                "invalid calendar api url `{}`: {error}",
                config.api_base_url
            ))
        })?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| CalendarError::Misconfigured(error.to_string()))?;

        Ok(Self {
            http,
            api_base,
            calendar_id: config.calendar_id.clone(),
            tokens: TokenSource::from_config(config)?,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CalendarError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                CalendarError::Misconfigured(format!("`{}` cannot be a base url", self.api_base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, CalendarError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.tokens.bearer(&self.http).await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|error| CalendarError::Unreachable(error.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CalendarError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_owned());
        return Err(CalendarError::Rejected { status: status.as_u16(), message });
    }
    response.json::<T>().await.map_err(|error| CalendarError::InvalidResponse(error.to_string()))
}

#[async_trait]
impl CalendarPort for GoogleCalendarClient {
    fn provider_name(&self) -> &'static str {
        "google"
    }

    async fn free_busy(&self, window: TimeWindow) -> Result<Vec<BusyInterval>, CalendarError> {
        let request = FreeBusyRequest {
            time_min: window.start,
            time_max: window.end,
            time_zone: UTC_ZONE,
            items: vec![CalendarItem { id: &self.calendar_id }],
        };
        let url = self.endpoint(&["freeBusy"])?;
        let mut response: FreeBusyResponse = self.post_json(url, &request).await?;

        let calendar = response.calendars.remove(&self.calendar_id).ok_or_else(|| {
            CalendarError::InvalidResponse(format!(
                "free/busy response has no entry for calendar `{}`",
                self.calendar_id
            ))
        })?;
        if let Some(error) = calendar.errors.first() {
            warn!(
                event_name = "calendar.freebusy_error",
                calendar_id = %self.calendar_id,
                reason = %error.reason,
                "calendar reported a free/busy error"
            );
            return Err(CalendarError::InvalidResponse(format!(
                "free/busy lookup failed: {}",
                error.reason
            )));
        }

        let mut busy = calendar
            .busy
            .into_iter()
            .map(|period| BusyInterval::new(period.start, period.end))
            .collect::<Vec<_>>();
        busy.sort_by_key(|interval| interval.start);
        debug!(
            event_name = "calendar.freebusy_fetched",
            calendar_id = %self.calendar_id,
            busy_count = busy.len(),
            "fetched busy periods"
        );
        Ok(busy)
    }

    async fn insert_event(&self, event: NewEvent) -> Result<CalendarEvent, CalendarError> {
        let request = EventRequest {
            summary: &event.summary,
            start: EventTime { date_time: event.start, time_zone: Some(UTC_ZONE.to_owned()) },
            end: EventTime { date_time: event.end, time_zone: Some(UTC_ZONE.to_owned()) },
        };
        let url = self.endpoint(&["calendars", self.calendar_id.as_str(), "events"])?;
        let created: EventResponse = self.post_json(url, &request).await?;

        Ok(CalendarEvent {
            id: EventId(created.id),
            start: created.start.date_time,
            end: created.end.date_time,
            summary: created.summary.unwrap_or(event.summary),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequest<'a> {
    time_min: DateTime<Utc>,
    time_max: DateTime<Utc>,
    time_zone: &'a str,
    items: Vec<CalendarItem<'a>>,
}

#[derive(Serialize)]
struct CalendarItem<'a> {
    id: &'a str,
}

#[derive(Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<BusyPeriod>,
    #[serde(default)]
    errors: Vec<FreeBusyError>,
}

#[derive(Deserialize)]
struct BusyPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct FreeBusyError {
    #[serde(default)]
    reason: String,
}

#[derive(Serialize)]
struct EventRequest<'a> {
    summary: &'a str,
    start: EventTime,
    end: EventTime,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

#[derive(Deserialize)]
struct EventResponse {
    id: String,
    summary: Option<String>,
    start: EventTime,
    end: EventTime,
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use secrecy::SecretString;
    use tailortalk_core::calendar::{CalendarError, CalendarPort};
    use tailortalk_core::config::{AppConfig, CalendarConfig};
    use tailortalk_core::domain::event::NewEvent;
    use tailortalk_core::domain::slot::TimeWindow;
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::GoogleCalendarClient;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 20, hour, 0, 0).single().expect("timestamp")
    }

    fn config(base: &str) -> CalendarConfig {
        let mut config = AppConfig::default().calendar;
        config.api_base_url = base.to_owned();
        config.access_token = Some(SecretString::from("test-token"));
        config
    }

    fn window() -> TimeWindow {
        TimeWindow::new(at(15), at(17)).expect("window")
    }

    #[tokio::test]
    async fn free_busy_posts_window_and_sorts_busy_periods() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/freeBusy"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_partial_json(serde_json::json!({
                "timeMin": "2026-10-20T15:00:00Z",
                "timeMax": "2026-10-20T17:00:00Z",
                "items": [{ "id": "primary" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "calendar#freeBusy",
                "calendars": {
                    "primary": {
                        "busy": [
                            { "start": "2026-10-20T16:30:00Z", "end": "2026-10-20T17:00:00Z" },
                            { "start": "2026-10-20T15:00:00Z", "end": "2026-10-20T16:00:00Z" }
                        ]
                    }
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::from_config(&config(&mock_server.uri())).expect("client");
        let busy = client.free_busy(window()).await.expect("busy periods");

        assert_eq!(busy.len(), 2);
        assert_eq!(busy[0].start, at(15));
        assert_eq!(busy[1].end, at(17));
    }

    #[tokio::test]
    async fn non_success_status_maps_to_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/freeBusy"))
            .respond_with(ResponseTemplate::new(403).set_body_string("insufficient scope"))
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::from_config(&config(&mock_server.uri())).expect("client");
        let error = client.free_busy(window()).await.expect_err("403 must fail");

        assert_eq!(
            error,
            CalendarError::Rejected { status: 403, message: "insufficient scope".to_owned() }
        );
    }

    #[tokio::test]
    async fn malformed_payload_maps_to_invalid_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/freeBusy"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::from_config(&config(&mock_server.uri())).expect("client");
        let error = client.free_busy(window()).await.expect_err("garbage must fail");

        assert!(matches!(error, CalendarError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn calendar_level_errors_are_surfaced() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/freeBusy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "calendars": {
                    "primary": { "errors": [{ "domain": "global", "reason": "notFound" }] }
                }
            })))
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::from_config(&config(&mock_server.uri())).expect("client");
        let error = client.free_busy(window()).await.expect_err("calendar error must fail");

        assert!(matches!(
            error,
            CalendarError::InvalidResponse(message) if message.contains("notFound")
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_maps_to_unreachable() {
        let client =
            GoogleCalendarClient::from_config(&config("http://127.0.0.1:9")).expect("client");
        let error = client.free_busy(window()).await.expect_err("nothing listens on port 9");

        assert!(matches!(error, CalendarError::Unreachable(_)));
    }

    #[tokio::test]
    async fn insert_event_posts_summary_and_returns_created_event() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendars/primary/events"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_partial_json(serde_json::json!({
                "summary": "Design Review",
                "start": { "dateTime": "2026-10-20T15:00:00Z", "timeZone": "UTC" },
                "end": { "dateTime": "2026-10-20T16:00:00Z", "timeZone": "UTC" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "evt-123",
                "status": "confirmed",
                "summary": "Design Review",
                "start": { "dateTime": "2026-10-20T15:00:00Z", "timeZone": "UTC" },
                "end": { "dateTime": "2026-10-20T16:00:00Z", "timeZone": "UTC" }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = GoogleCalendarClient::from_config(&config(&mock_server.uri())).expect("client");
        let created = client
            .insert_event(NewEvent::new(at(15), at(16), "Design Review"))
            .await
            .expect("event created");

        assert_eq!(created.id.0, "evt-123");
        assert_eq!(created.summary, "Design Review");
        assert_eq!(created.start, at(15));
        assert_eq!(created.end, at(16));
    }

    #[tokio::test]
    async fn refresh_credentials_are_exchanged_once_and_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh-token",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/freeBusy"))
            .and(header("Authorization", "Bearer fresh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "calendars": { "primary": { "busy": [] } }
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let mut config = config(&mock_server.uri());
        config.access_token = None;
        config.token_url = format!("{}/token", mock_server.uri());
        config.refresh_token = Some(SecretString::from("refresh-me"));
        config.client_id = Some("client-id".to_owned());
        config.client_secret = Some(SecretString::from("client-secret"));

        let client = GoogleCalendarClient::from_config(&config).expect("client");
        assert!(client.free_busy(window()).await.expect("first call").is_empty());
        assert!(client.free_busy(window()).await.expect("second call").is_empty());
    }

    #[tokio::test]
    async fn refused_refresh_maps_to_authentication_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&mock_server)
            .await;

        let mut config = config(&mock_server.uri());
        config.access_token = None;
        config.token_url = format!("{}/token", mock_server.uri());
        config.refresh_token = Some(SecretString::from("stale"));
        config.client_id = Some("client-id".to_owned());
        config.client_secret = Some(SecretString::from("client-secret"));

        let client = GoogleCalendarClient::from_config(&config).expect("client");
        let error = client.free_busy(window()).await.expect_err("refresh must fail");

        assert!(matches!(
            error,
            CalendarError::Authentication(message) if message.contains("invalid_grant")
        ));
    }

    #[test]
    fn missing_credentials_are_rejected_at_construction() {
        let mut config = config("https://www.googleapis.com/calendar/v3");
        config.access_token = None;

        assert!(matches!(
            GoogleCalendarClient::from_config(&config),
            Err(CalendarError::Misconfigured(_))
        ));
    }
}
