//! Access-token handling for the Google adapter.
//!
//! A static token is used as-is. Refresh credentials are exchanged at the
//! OAuth token endpoint and the result is cached until shortly before it
//! expires.

use std::time::{Duration, Instant};

use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tailortalk_core::calendar::CalendarError;
use tailortalk_core::config::CalendarConfig;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

pub(crate) enum TokenSource {
    Static(SecretString),
    Refresh(RefreshGrant),
}

pub(crate) struct RefreshGrant {
    token_url: Url,
    client_id: String,
    client_secret: SecretString,
    refresh_token: SecretString,
    cached: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    value: SecretString,
    refresh_after: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl TokenSource {
    pub(crate) fn from_config(config: &CalendarConfig) -> Result<Self, CalendarError> {
        if let Some(token) = config.access_token.as_ref() {
            return Ok(Self::Static(token.clone()));
        }

        match (&config.refresh_token, &config.client_id, &config.client_secret) {
            (Some(refresh_token), Some(client_id), Some(client_secret)) => {
                let token_url = Url::parse(&config.token_url).map_err(|error| {
                    CalendarError::Misconfigured(format!(
                        "invalid token url `{}`: {error}",
                        config.token_url
                    ))
                })?;
                Ok(Self::Refresh(RefreshGrant {
                    token_url,
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                    refresh_token: refresh_token.clone(),
                    cached: Mutex::new(None),
                }))
            }
            _ => Err(CalendarError::Misconfigured(
                "no access token or refresh credentials configured".to_owned(),
            )),
        }
    }

    pub(crate) async fn bearer(&self, http: &Client) -> Result<SecretString, CalendarError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::Refresh(grant) => grant.bearer(http).await,
        }
    }
}

impl RefreshGrant {
    async fn bearer(&self, http: &Client) -> Result<SecretString, CalendarError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_after {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.exchange(http).await?;
        let lifetime = Duration::from_secs(fresh.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));
        let value = SecretString::from(fresh.access_token);
        *cached = Some(CachedToken {
            value: value.clone(),
            refresh_after: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        });
        debug!(
            event_name = "calendar.token_refreshed",
            expires_in_secs = lifetime.as_secs(),
            "refreshed calendar access token"
        );
        Ok(value)
    }

    async fn exchange(&self, http: &Client) -> Result<TokenResponse, CalendarError> {
        let response = http
            .post(self.token_url.clone())
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
                ("refresh_token", self.refresh_token.expose_secret()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|error| {
                CalendarError::Authentication(format!("token refresh request failed: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                event_name = "calendar.token_refresh_rejected",
                status = status.as_u16(),
                "token endpoint refused refresh grant"
            );
            return Err(CalendarError::Authentication(format!(
                "token refresh failed ({status}): {body}"
            )));
        }

        response.json::<TokenResponse>().await.map_err(|error| {
            CalendarError::Authentication(format!("unreadable token response: {error}"))
        })
    }
}
