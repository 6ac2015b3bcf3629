// src/installer/mod.rs

//! Install command construction and execution
//!
//! Turns a [`ResolutionResult`] into at most two invocations: one OS
//! install listing every OS package name, then one fallback install
//! listing every fallback spec. Both always run when present; a failure in
//! one does not cancel the other, and the worse exit code wins.

mod runner;

pub use runner::{CommandRunner, SystemRunner, display_command, exit_code};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::interrupt;
use crate::resolver::ResolutionResult;
use std::collections::HashSet;
use std::fmt;
use tracing::{error, info};

/// Which package manager an install step targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerKind {
    Os,
    Fallback,
}

impl fmt::Display for InstallerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Os => write!(f, "OS package"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// One install invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStep {
    pub kind: InstallerKind,
    pub argv: Vec<String>,
}

/// The install invocations for one run, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    pub steps: Vec<InstallStep>,
}

impl InstallPlan {
    /// Build the plan from a resolution result
    ///
    /// Names are deduplicated in first-seen order and an installer with
    /// nothing to install gets no step.
    pub fn new(result: &ResolutionResult, os_install: &[String], fallback_install: &[String]) -> Self {
        let mut steps = Vec::new();

        let os_names = dedup(result.os_names());
        if !os_names.is_empty() {
            steps.push(InstallStep {
                kind: InstallerKind::Os,
                argv: os_install.iter().cloned().chain(os_names).collect(),
            });
        }

        let specs = dedup(result.fallback_specs());
        if !specs.is_empty() {
            steps.push(InstallStep {
                kind: InstallerKind::Fallback,
                argv: fallback_install.iter().cloned().chain(specs).collect(),
            });
        }

        Self { steps }
    }

    /// Build the plan using the install commands from config
    pub fn from_config(result: &ResolutionResult, config: &Config) -> Self {
        Self::new(result, &config.os.install_command, &config.fallback.install_command)
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn dedup(names: Vec<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Result of one executed (or skipped) step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: InstallStep,
    /// Exit code; `None` when the step was only printed
    pub code: Option<i32>,
}

/// Results of executing a plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutcome {
    pub steps: Vec<StepOutcome>,
}

impl InstallOutcome {
    /// The worse of all step exit codes: any failure beats success, and
    /// between failures the larger code wins
    pub fn exit_code(&self) -> i32 {
        self.steps
            .iter()
            .filter_map(|s| s.code)
            .fold(0, worse_exit_code)
    }

    pub fn all_succeeded(&self) -> bool {
        self.exit_code() == 0
    }

    /// First failed step as an error, for callers that want `Result`
    pub fn into_result(self) -> Result<()> {
        let code = self.exit_code();
        if code == 0 {
            return Ok(());
        }
        let program = self
            .steps
            .iter()
            .find(|s| s.code == Some(code))
            .and_then(|s| s.step.argv.first().cloned())
            .unwrap_or_default();
        Err(Error::Installer { program, code })
    }
}

/// Combine two exit codes, keeping the worse one
pub fn worse_exit_code(a: i32, b: i32) -> i32 {
    match (a, b) {
        (0, other) | (other, 0) => other,
        (a, b) => a.max(b),
    }
}

/// Executes install plans through a [`CommandRunner`]
pub struct Installer<R> {
    runner: R,
    dry_run: bool,
    is_interrupted: fn() -> bool,
}

impl<R: CommandRunner> Installer<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            dry_run: false,
            is_interrupted: interrupt::interrupted,
        }
    }

    /// Print the commands instead of running them
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Replace the interrupt check (defaults to the process signal flag)
    pub fn with_interrupt_check(mut self, is_interrupted: fn() -> bool) -> Self {
        self.is_interrupted = is_interrupted;
        self
    }

    /// Run every step of the plan in order
    ///
    /// Fails only with `Error::Interrupted`; installer failures are
    /// reported in the outcome.
    pub fn execute(&self, plan: &InstallPlan) -> Result<InstallOutcome> {
        let mut outcome = InstallOutcome::default();

        for step in &plan.steps {
            interrupt::check(self.is_interrupted)?;

            let command = display_command(&step.argv);
            if self.dry_run {
                println!("Would run: {}", command);
                outcome.steps.push(StepOutcome {
                    step: step.clone(),
                    code: None,
                });
                continue;
            }

            info!("Running {} install: {}", step.kind, command);
            println!("Running: {}", command);
            let code = self.runner.run(&step.argv);
            if code != 0 {
                error!("{} install failed with exit code {}: {}", step.kind, code, command);
                eprintln!("Error: {} install failed with exit code {}", step.kind, code);
            }

            outcome.steps.push(StepOutcome {
                step: step.clone(),
                code: Some(code),
            });
        }

        Ok(outcome)
    }

    /// Build the plan for `result` and execute it, returning the exit code
    pub fn emit(&self, result: &ResolutionResult, config: &Config) -> Result<i32> {
        let plan = InstallPlan::from_config(result, config);
        Ok(self.execute(&plan)?.exit_code())
    }
}
