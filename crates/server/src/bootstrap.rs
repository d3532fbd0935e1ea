use std::sync::Arc;

use tailortalk_agent::AgentRuntime;
use tailortalk_calendar::calendar_from_config;
use tailortalk_core::calendar::CalendarError;
use tailortalk_core::config::{AppConfig, ConfigError, LoadOptions};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<AgentRuntime>,
    pub calendar_provider: &'static str,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("calendar adapter could not be initialised: {0}")]
    Calendar(#[from] CalendarError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let calendar = calendar_from_config(&config.calendar)?;
    let calendar_provider = calendar.provider_name();
    info!(
        event_name = "system.bootstrap.calendar_ready",
        correlation_id = "bootstrap",
        provider = calendar_provider,
        "calendar handle established"
    );

    let runtime = Arc::new(AgentRuntime::new(calendar, &config.assistant));
    Ok(Application { config, runtime, calendar_provider })
}
