// src/error.rs

//! Error types for aptpip
//!
//! Lookup-layer variants (`NotFound`, `Download`, `Parse`) are
//! absorbed by the resolver and never reach the user. The rest surface at
//! the top level and decide the process exit code.

use thiserror::Error;

/// Exit code for usage errors (no root, bad arguments)
pub const EXIT_USAGE: i32 = 2;

/// Exit code for malformed input (unreadable or empty requirements, bad config)
pub const EXIT_INPUT: i32 = 1;

/// Exit code after SIGINT/SIGTERM
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("{0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{program} exited with code {code}")]
    Installer { program: String, code: i32 },

    #[error("Interrupted")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Process exit code for an error that reaches `main`
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            Self::Installer { code, .. } => *code,
            Self::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_INPUT,
        }
    }
}
