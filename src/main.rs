// src/main.rs

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Set up tracing: `RUST_LOG` wins, then `--debug`, otherwise warnings only
fn init_logging(cli: &Cli) -> Result<()> {
    let default_level = if cli.debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn to_exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Error: {e:#}");
        return to_exit_code(aptpip::EXIT_INPUT);
    }

    match commands::cmd_install(&cli) {
        Ok(code) => to_exit_code(code),
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            let code = e
                .downcast_ref::<aptpip::Error>()
                .map(aptpip::Error::exit_code)
                .unwrap_or(aptpip::EXIT_INPUT);
            to_exit_code(code)
        }
    }
}
