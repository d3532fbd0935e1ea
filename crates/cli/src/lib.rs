pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "tailortalk",
    about = "TailorTalk operator CLI",
    long_about = "Drive the scheduling assistant from a terminal, inspect its configuration, and check calendar readiness.",
    after_help = "Examples:\n  tailortalk ask \"Am I free tomorrow between 3-5pm?\"\n  tailortalk extract \"Book a call with Alex on Friday at 2pm\"\n  tailortalk doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run one message through the assistant against the configured calendar")]
    Ask {
        #[arg(help = "Natural-language scheduling request")]
        message: String,
    },
    #[command(about = "Print the fields the extractor reads from a message, as JSON")]
    Extract {
        #[arg(help = "Natural-language scheduling request")]
        message: String,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, calendar credentials, and calendar reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask { message } => commands::ask::run(&message),
        Command::Extract { message } => commands::extract::run(&message),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
