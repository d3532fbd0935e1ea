use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GOOGLE_OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub calendar: CalendarConfig,
    pub assistant: AssistantConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CalendarConfig {
    pub provider: CalendarProvider,
    pub api_base_url: String,
    pub token_url: String,
    pub calendar_id: String,
    pub access_token: Option<SecretString>,
    pub refresh_token: Option<SecretString>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub default_title: String,
    pub booking_duration_minutes: u32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
    pub cors_permissive: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarProvider {
    Google,
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub calendar_provider: Option<CalendarProvider>,
    pub calendar_api_base_url: Option<String>,
    pub calendar_access_token: Option<String>,
    pub booking_duration_minutes: Option<u32>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            calendar: CalendarConfig {
                provider: CalendarProvider::Google,
                api_base_url: GOOGLE_CALENDAR_API_BASE.to_string(),
                token_url: GOOGLE_OAUTH_TOKEN_URL.to_string(),
                calendar_id: "primary".to_string(),
                access_token: None,
                refresh_token: None,
                client_id: None,
                client_secret: None,
                timeout_secs: 30,
            },
            assistant: AssistantConfig {
                default_title: "Meeting".to_string(),
                booking_duration_minutes: 60,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8000,
                graceful_shutdown_secs: 15,
                cors_permissive: true,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl CalendarProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Memory => "memory",
        }
    }
}

impl std::str::FromStr for CalendarProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "memory" | "in_memory" => Ok(Self::Memory),
            other => Err(ConfigError::Validation(format!(
                "unsupported calendar provider `{other}` (expected google|memory)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl CalendarConfig {
    pub fn has_static_token(&self) -> bool {
        self.access_token.as_ref().is_some_and(|token| !token.expose_secret().trim().is_empty())
    }

    pub fn has_refresh_credentials(&self) -> bool {
        let refresh =
            self.refresh_token.as_ref().is_some_and(|token| !token.expose_secret().is_empty());
        let secret =
            self.client_secret.as_ref().is_some_and(|secret| !secret.expose_secret().is_empty());
        let client_id = self.client_id.as_ref().is_some_and(|id| !id.trim().is_empty());
        refresh && secret && client_id
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("tailortalk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(calendar) = patch.calendar {
            if let Some(provider) = calendar.provider {
                self.calendar.provider = provider;
            }
            if let Some(api_base_url) = calendar.api_base_url {
                self.calendar.api_base_url = api_base_url;
            }
            if let Some(token_url) = calendar.token_url {
                self.calendar.token_url = token_url;
            }
            if let Some(calendar_id) = calendar.calendar_id {
                self.calendar.calendar_id = calendar_id;
            }
            if let Some(access_token_value) = calendar.access_token {
                self.calendar.access_token = Some(secret_value(access_token_value));
            }
            if let Some(refresh_token_value) = calendar.refresh_token {
                self.calendar.refresh_token = Some(secret_value(refresh_token_value));
            }
            if let Some(client_id) = calendar.client_id {
                self.calendar.client_id = Some(client_id);
            }
            if let Some(client_secret_value) = calendar.client_secret {
                self.calendar.client_secret = Some(secret_value(client_secret_value));
            }
            if let Some(timeout_secs) = calendar.timeout_secs {
                self.calendar.timeout_secs = timeout_secs;
            }
        }

        if let Some(assistant) = patch.assistant {
            if let Some(default_title) = assistant.default_title {
                self.assistant.default_title = default_title;
            }
            if let Some(booking_duration_minutes) = assistant.booking_duration_minutes {
                self.assistant.booking_duration_minutes = booking_duration_minutes;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
            if let Some(cors_permissive) = server.cors_permissive {
                self.server.cors_permissive = cors_permissive;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TAILORTALK_CALENDAR_PROVIDER") {
            self.calendar.provider = value.parse()?;
        }
        if let Some(value) = read_env("TAILORTALK_CALENDAR_API_BASE_URL") {
            self.calendar.api_base_url = value;
        }
        if let Some(value) = read_env("TAILORTALK_CALENDAR_TOKEN_URL") {
            self.calendar.token_url = value;
        }
        if let Some(value) = read_env("TAILORTALK_CALENDAR_ID") {
            self.calendar.calendar_id = value;
        }
        if let Some(value) = read_env("TAILORTALK_CALENDAR_ACCESS_TOKEN") {
            self.calendar.access_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("TAILORTALK_CALENDAR_REFRESH_TOKEN") {
            self.calendar.refresh_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("TAILORTALK_CALENDAR_CLIENT_ID") {
            self.calendar.client_id = Some(value);
        }
        if let Some(value) = read_env("TAILORTALK_CALENDAR_CLIENT_SECRET") {
            self.calendar.client_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env("TAILORTALK_CALENDAR_TIMEOUT_SECS") {
            self.calendar.timeout_secs = parse_u64("TAILORTALK_CALENDAR_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TAILORTALK_ASSISTANT_DEFAULT_TITLE") {
            self.assistant.default_title = value;
        }
        if let Some(value) = read_env("TAILORTALK_ASSISTANT_BOOKING_DURATION_MINUTES") {
            self.assistant.booking_duration_minutes =
                parse_u32("TAILORTALK_ASSISTANT_BOOKING_DURATION_MINUTES", &value)?;
        }

        if let Some(value) = read_env("TAILORTALK_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("TAILORTALK_SERVER_PORT") {
            self.server.port = parse_u16("TAILORTALK_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("TAILORTALK_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("TAILORTALK_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }
        if let Some(value) = read_env("TAILORTALK_SERVER_CORS_PERMISSIVE") {
            self.server.cors_permissive = parse_bool("TAILORTALK_SERVER_CORS_PERMISSIVE", &value)?;
        }

        let log_level =
            read_env("TAILORTALK_LOGGING_LEVEL").or_else(|| read_env("TAILORTALK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TAILORTALK_LOGGING_FORMAT").or_else(|| read_env("TAILORTALK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(provider) = overrides.calendar_provider {
            self.calendar.provider = provider;
        }
        if let Some(api_base_url) = overrides.calendar_api_base_url {
            self.calendar.api_base_url = api_base_url;
        }
        if let Some(access_token) = overrides.calendar_access_token {
            self.calendar.access_token = Some(secret_value(access_token));
        }
        if let Some(booking_duration_minutes) = overrides.booking_duration_minutes {
            self.assistant.booking_duration_minutes = booking_duration_minutes;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_calendar(&self.calendar)?;
        validate_assistant(&self.assistant)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("tailortalk.toml"), PathBuf::from("config/tailortalk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_calendar(calendar: &CalendarConfig) -> Result<(), ConfigError> {
    if calendar.timeout_secs == 0 || calendar.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "calendar.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if calendar.calendar_id.trim().is_empty() {
        return Err(ConfigError::Validation("calendar.calendar_id must not be empty".to_string()));
    }

    let urls = [
        ("calendar.api_base_url", &calendar.api_base_url),
        ("calendar.token_url", &calendar.token_url),
    ];
    for (key, url) in urls {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "{key} must start with http:// or https://"
            )));
        }
    }

    if calendar.provider == CalendarProvider::Google
        && !calendar.has_static_token()
        && !calendar.has_refresh_credentials()
    {
        return Err(ConfigError::Validation(
            "calendar.access_token (or calendar.refresh_token with client_id and client_secret) is required for the google provider. Create OAuth credentials at https://console.cloud.google.com/apis/credentials".to_string(),
        ));
    }

    Ok(())
}

fn validate_assistant(assistant: &AssistantConfig) -> Result<(), ConfigError> {
    if assistant.default_title.trim().is_empty() {
        return Err(ConfigError::Validation(
            "assistant.default_title must not be empty".to_string(),
        ));
    }

    if assistant.booking_duration_minutes == 0 || assistant.booking_duration_minutes > 720 {
        return Err(ConfigError::Validation(
            "assistant.booking_duration_minutes must be in range 1..=720".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    calendar: Option<CalendarPatch>,
    assistant: Option<AssistantPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CalendarPatch {
    provider: Option<CalendarProvider>,
    api_base_url: Option<String>,
    token_url: Option<String>,
    calendar_id: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AssistantPatch {
    default_title: Option<String>,
    booking_duration_minutes: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
    cors_permissive: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
