use std::process::ExitCode;

fn main() -> ExitCode {
    scently_cli::run()
}
