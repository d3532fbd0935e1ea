use std::env;
use std::fs;
use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use tailortalk_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let calendar = &config.calendar;
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "calendar.provider",
        calendar.provider.as_str(),
        source("calendar.provider", &["TAILORTALK_CALENDAR_PROVIDER"]),
    ));
    lines.push(render_line(
        "calendar.api_base_url",
        &calendar.api_base_url,
        source("calendar.api_base_url", &["TAILORTALK_CALENDAR_API_BASE_URL"]),
    ));
    lines.push(render_line(
        "calendar.token_url",
        &calendar.token_url,
        source("calendar.token_url", &["TAILORTALK_CALENDAR_TOKEN_URL"]),
    ));
    lines.push(render_line(
        "calendar.calendar_id",
        &calendar.calendar_id,
        source("calendar.calendar_id", &["TAILORTALK_CALENDAR_ID"]),
    ));
    lines.push(render_line(
        "calendar.access_token",
        &redact_secret(calendar.access_token.as_ref()),
        source("calendar.access_token", &["TAILORTALK_CALENDAR_ACCESS_TOKEN"]),
    ));
    lines.push(render_line(
        "calendar.refresh_token",
        &redact_secret(calendar.refresh_token.as_ref()),
        source("calendar.refresh_token", &["TAILORTALK_CALENDAR_REFRESH_TOKEN"]),
    ));
    lines.push(render_line(
        "calendar.client_id",
        calendar.client_id.as_deref().unwrap_or("<unset>"),
        source("calendar.client_id", &["TAILORTALK_CALENDAR_CLIENT_ID"]),
    ));
    lines.push(render_line(
        "calendar.client_secret",
        &redact_secret(calendar.client_secret.as_ref()),
        source("calendar.client_secret", &["TAILORTALK_CALENDAR_CLIENT_SECRET"]),
    ));
    lines.push(render_line(
        "calendar.timeout_secs",
        &calendar.timeout_secs.to_string(),
        source("calendar.timeout_secs", &["TAILORTALK_CALENDAR_TIMEOUT_SECS"]),
    ));

    lines.push(render_line(
        "assistant.default_title",
        &config.assistant.default_title,
        source("assistant.default_title", &["TAILORTALK_ASSISTANT_DEFAULT_TITLE"]),
    ));
    lines.push(render_line(
        "assistant.booking_duration_minutes",
        &config.assistant.booking_duration_minutes.to_string(),
        source(
            "assistant.booking_duration_minutes",
            &["TAILORTALK_ASSISTANT_BOOKING_DURATION_MINUTES"],
        ),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", &["TAILORTALK_SERVER_BIND_ADDRESS"]),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", &["TAILORTALK_SERVER_PORT"]),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        source("server.graceful_shutdown_secs", &["TAILORTALK_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
    ));
    lines.push(render_line(
        "server.cors_permissive",
        &config.server.cors_permissive.to_string(),
        source("server.cors_permissive", &["TAILORTALK_SERVER_CORS_PERMISSIVE"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["TAILORTALK_LOGGING_LEVEL", "TAILORTALK_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_ascii_lowercase(),
        source("logging.format", &["TAILORTALK_LOGGING_FORMAT", "TAILORTALK_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret.map(|value| value.expose_secret().trim()) {
        None => "<unset>".to_string(),
        Some("") => "<empty>".to_string(),
        // Google access tokens share the `ya29.` prefix; nothing after it is shown.
        Some(value) => match value.split_once('.') {
            Some((prefix, _)) if prefix.len() <= 8 => format!("{prefix}.***"),
            _ => "<redacted>".to_string(),
        },
    }
}
