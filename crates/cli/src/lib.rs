pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "prosperity",
    about = "Prosperity operator CLI",
    long_about = "Apply migrations, inspect effective configuration, and list the whitelabel tenants the gateway serves.",
    after_help = "Examples:\n  prosperity migrate\n  prosperity config\n  prosperity tenants --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
    #[command(about = "List active whitelabel tenants and their lifecycle action")]
    Tenants {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Tenants { json } => commands::tenants::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
