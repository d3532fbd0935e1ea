use std::process::ExitCode;

fn main() -> ExitCode {
    tailortalk_cli::run()
}
