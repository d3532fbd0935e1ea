use chrono::{Duration, Utc};
use serde::Serialize;
use tailortalk_calendar::calendar_from_config;
use tailortalk_core::config::{AppConfig, CalendarProvider, LoadOptions};
use tailortalk_core::domain::slot::TimeWindow;

use super::{current_thread_runtime, CommandResult};

const EXIT_NOT_READY: u8 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_NOT_READY };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    CommandResult { exit_code, output: render_human(&report) }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_calendar_credentials(&config));
            checks.push(check_calendar_reachability(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("calendar_credentials"));
            checks.push(skipped("calendar_reachability"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

fn check_calendar_credentials(config: &AppConfig) -> DoctorCheck {
    let calendar = &config.calendar;
    let details = match calendar.provider {
        CalendarProvider::Memory => "in-memory calendar needs no credentials".to_string(),
        CalendarProvider::Google if calendar.has_static_token() => {
            "static access token configured".to_string()
        }
        CalendarProvider::Google if calendar.has_refresh_credentials() => {
            "refresh token with client credentials configured".to_string()
        }
        CalendarProvider::Google => {
            return DoctorCheck {
                name: "calendar_credentials",
                status: CheckStatus::Fail,
                details: "no access token or refresh credentials configured".to_string(),
            };
        }
    };

    DoctorCheck { name: "calendar_credentials", status: CheckStatus::Pass, details }
}

fn check_calendar_reachability(config: &AppConfig) -> DoctorCheck {
    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "calendar_reachability",
                status: CheckStatus::Fail,
                details: error,
            };
        }
    };

    let result = runtime.block_on(async {
        let calendar = calendar_from_config(&config.calendar)
            .map_err(|error| format!("failed to build calendar adapter: {error}"))?;
        let now = Utc::now();
        let window = TimeWindow::new(now, now + Duration::hours(1))
            .map_err(|error| format!("failed to build probe window: {error}"))?;
        let busy = calendar
            .free_busy(window)
            .await
            .map_err(|error| format!("free/busy probe failed: {error}"))?;
        Ok::<(&'static str, usize), String>((calendar.provider_name(), busy.len()))
    });

    match result {
        Ok((provider, busy)) => DoctorCheck {
            name: "calendar_reachability",
            status: CheckStatus::Pass,
            details: format!(
                "{provider} calendar `{}` answered free/busy ({busy} busy in the next hour)",
                config.calendar.calendar_id
            ),
        },
        Err(error) => {
            DoctorCheck { name: "calendar_reachability", status: CheckStatus::Fail, details: error }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
