use std::sync::Arc;

use tailortalk_agent::AgentRuntime;
use tailortalk_core::calendar::InMemoryCalendar;
use tailortalk_core::config::{AppConfig, LoadOptions};
use tailortalk_core::domain::request::ExtractedFields;

use super::{CommandResult, EXIT_CONFIG};

const COMMAND: &str = "extract";

/// Extraction never touches the calendar, so the configured adapter is not built.
pub fn run(message: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };

    let agent = AgentRuntime::new(Arc::new(InMemoryCalendar::new()), &config.assistant);
    let fields = ExtractedFields::from(&agent.extract(message));
    match serde_json::to_string(&fields) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(COMMAND, "serialization", error.to_string(), 1),
    }
}
