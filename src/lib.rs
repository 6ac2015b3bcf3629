// src/lib.rs

//! aptpip
//!
//! Installs the dependency tree of a Python package through the OS package
//! manager wherever a `python3-*` package exists, and through pip for the
//! rest.
//!
//! # Architecture
//!
//! - `resolver`: explicit-stack walk of the dependency graph with a shared
//!   visited set; OS-installable packages are leaves
//! - `probe`: does `apt-cache show python3-<name>` know the package?
//! - `index`: declared dependencies from the PyPI JSON API
//! - `names`: identity keys and OS candidate names
//! - `installer`: one apt invocation, one pip invocation, worse exit code wins
//!
//! Lookup failures are absorbed into conservative defaults (fallback
//! install, no dependencies); only input errors, installer failures and
//! interrupts reach the caller.

pub mod config;
mod error;
pub mod index;
pub mod installer;
pub mod interrupt;
pub mod names;
pub mod probe;
pub mod requirement;
pub mod requirements_file;
pub mod resolver;

pub use config::Config;
pub use error::{EXIT_INPUT, EXIT_INTERRUPTED, EXIT_USAGE, Error, Result};
pub use index::{IndexRequest, PackageIndex, PypiClient};
pub use installer::{CommandRunner, InstallOutcome, InstallPlan, Installer, SystemRunner};
pub use names::{NameMapper, canonical_name};
pub use probe::{AptCacheProber, OsPackageProber};
pub use requirement::Requirement;
pub use requirements_file::read_requirements;
pub use resolver::{Classification, PackageNode, ResolutionResult, Resolver, Verbosity};
