use std::process::ExitCode;

fn main() -> ExitCode {
    prosperity_cli::run()
}
