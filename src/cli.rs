// src/cli.rs
// CLI definitions for aptpip.
//
// This file is also pulled into build.rs with `include!` to render the man
// page, so it only depends on clap and std.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "aptpip")]
#[command(author, version)]
#[command(
    about = "Install a Python package's dependencies with apt where possible, pip for the rest",
    long_about = None
)]
pub struct Cli {
    /// Package to resolve and install (can be combined with -r)
    pub package_name: Option<String>,

    /// Requirements file with one package per line
    #[arg(short = 'r', long = "requirements", value_name = "REQUIREMENTS_FILE")]
    pub requirements: Option<PathBuf>,

    /// Log every probe, fetch and classification decision
    #[arg(long)]
    pub debug: bool,

    /// Include development dependencies
    #[arg(long)]
    pub dev: bool,

    /// Resolve and print the install commands without running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Do not print per-package progress
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the log to this file instead of stderr (truncated on start)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
