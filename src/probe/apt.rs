// src/probe/apt.rs

//! Probe the apt package cache with `apt-cache show`
//!
//! The query command comes from config (default `apt-cache show`) and the
//! candidate is appended as a single argument; no shell is involved.

use super::OsPackageProber;
use crate::config::OsSection;
use regex::Regex;
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Debian policy: lowercase alphanumerics, `+`, `-`, `.`; at least two
/// characters; must start with an alphanumeric
static OS_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9+.-]+$").unwrap());

/// Check whether a name is a legal Debian package name
pub fn is_valid_os_name(name: &str) -> bool {
    OS_NAME_RE.is_match(name)
}

/// Extract the first `Package:` field from `apt-cache show` output
pub fn parse_package_field(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("Package:"))
        .map(str::trim)
        .filter(|name| !name.is_empty() && !name.contains(char::is_whitespace))
        .map(str::to_string)
}

/// Prober backed by `apt-cache show`
#[derive(Debug, Clone)]
pub struct AptCacheProber {
    command: Vec<String>,
    timeout: Duration,
}

impl AptCacheProber {
    /// Create a prober from the `[os]` config section
    pub fn new(config: &OsSection) -> Self {
        Self {
            command: config.query_command.clone(),
            timeout: config.probe_timeout(),
        }
    }

    /// Check if the query tool is on `PATH`
    pub fn is_available(&self) -> bool {
        self.command
            .first()
            .is_some_and(|program| which::which(program).is_ok())
    }

    fn run_query(&self, candidate: &str) -> Option<String> {
        let (program, args) = self.command.split_first()?;
        debug!("Executing: {} {:?} {}", program, args, candidate);

        let mut child = match Command::new(program)
            .args(args)
            .arg(candidate)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                debug!("Failed to run '{}': {}", program, e);
                return None;
            }
        };

        // Drain stdout on a thread so a large record cannot fill the pipe
        // while we wait on the timeout.
        let mut stdout = child.stdout.take()?;
        let reader = std::thread::spawn(move || {
            let mut buf = String::new();
            stdout.read_to_string(&mut buf).map(|_| buf)
        });

        match child.wait_timeout(self.timeout) {
            Ok(Some(status)) if status.success() => reader.join().ok()?.ok(),
            Ok(Some(status)) => {
                debug!("{} {} exited with {}", program, candidate, status);
                None
            }
            Ok(None) => {
                warn!(
                    "{} {} timed out after {} seconds",
                    program,
                    candidate,
                    self.timeout.as_secs()
                );
                let _ = child.kill();
                let _ = child.wait();
                None
            }
            Err(e) => {
                debug!("Failed waiting on {}: {}", program, e);
                let _ = child.kill();
                None
            }
        }
    }
}

impl OsPackageProber for AptCacheProber {
    fn lookup(&self, candidate: &str) -> Option<String> {
        if !is_valid_os_name(candidate) {
            debug!("Not probing invalid OS package name '{}'", candidate);
            return None;
        }

        let found = self
            .run_query(candidate)
            .and_then(|output| parse_package_field(&output));

        match &found {
            Some(name) => debug!("Found OS package: {}", name),
            None => debug!("No OS package for {}", candidate),
        }
        found
    }
}
