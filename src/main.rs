mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    let outcome = match cli.command {
        Commands::Validate {
            path,
            schema,
            deny_warnings,
            output,
        } => commands::validate(&path, schema.as_deref(), deny_warnings, output),
        Commands::Format {
            path,
            sort,
            check,
            stdout,
        } => commands::format(&path, sort, check, stdout),
        Commands::Query {
            path,
            patterns,
            schema,
            output_type,
        } => commands::query(&path, &patterns, schema.as_deref(), output_type),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
