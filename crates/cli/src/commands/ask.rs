use tailortalk_agent::AgentRuntime;
use tailortalk_calendar::calendar_from_config;
use tailortalk_core::config::{AppConfig, LoadOptions};

use super::{current_thread_runtime, CommandResult, EXIT_CALENDAR, EXIT_CONFIG, EXIT_RUNTIME};

const COMMAND: &str = "ask";

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

    let calendar = match calendar_from_config(&config.calendar) {
        Ok(calendar) => calendar,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "calendar_adapter",
                error.to_string(),
                EXIT_CALENDAR,
            )
        }
    };

    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure(COMMAND, "runtime", error, EXIT_RUNTIME),
    };

    let agent = AgentRuntime::new(calendar, &config.assistant);
    let reply = runtime.block_on(agent.handle_message(message));
    CommandResult::success(COMMAND, reply)
}
