// src/index/mod.rs

//! Python package index access
//!
//! The resolver only needs one thing from the index: the declared
//! dependencies of a project. [`PackageIndex`] is that seam; [`PypiClient`]
//! implements it against the PyPI JSON API.

mod pypi;

pub use pypi::{PypiClient, parse_project_metadata};

use crate::error::Result;
use crate::names::canonical_name;
use crate::requirement::Requirement;
use tracing::debug;

/// Extras that conventionally hold development-only dependencies
const DEV_EXTRAS: &[&str] = &[
    "dev",
    "devel",
    "develop",
    "development",
    "test",
    "tests",
    "testing",
    "doc",
    "docs",
    "lint",
    "typing",
];

/// Name segments that mark a development tool
const DEV_NAME_SEGMENTS: &[&str] = &["test", "tests", "dev", "devel", "docs"];

/// A dependency lookup for one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRequest {
    /// Project name with extras and version stripped
    pub name: String,
    /// Extras requested on the project, canonicalized
    pub extras: Vec<String>,
    /// Include development dependency groups
    pub include_dev: bool,
}

impl IndexRequest {
    pub fn new(name: impl Into<String>, extras: &[String], include_dev: bool) -> Self {
        Self {
            name: name.into(),
            extras: extras.iter().map(|e| canonical_name(e)).collect(),
            include_dev,
        }
    }
}

/// Source of declared dependencies
pub trait PackageIndex {
    /// Fetch the dependencies `request.name` declares, filtered for the
    /// request's extras and dev flag
    ///
    /// An unknown project is `Error::NotFound`; the caller decides what a
    /// failed lookup means.
    fn fetch_dependencies(&self, request: &IndexRequest) -> Result<Vec<Requirement>>;
}

impl<T: PackageIndex + ?Sized> PackageIndex for &T {
    fn fetch_dependencies(&self, request: &IndexRequest) -> Result<Vec<Requirement>> {
        (**self).fetch_dependencies(request)
    }
}

/// Check whether a dependency name looks like a development tool
pub fn is_dev_dependency(name: &str) -> bool {
    let name = canonical_name(name);
    let is_dev = name.starts_with("pytest")
        || name
            .split('-')
            .any(|segment| DEV_NAME_SEGMENTS.contains(&segment));
    debug!("Is '{}' a dev dependency? {}", name, is_dev);
    is_dev
}

/// Select which declared dependencies apply to a request
///
/// - requirements whose platform markers exclude Linux never apply
/// - unconditional requirements always apply
/// - `extra == "x"` requirements apply when `x` was requested
/// - with `include_dev`, requirements gated on a development extra apply too
/// - without `include_dev`, anything named like a dev tool is dropped
pub fn select_dependencies(declared: Vec<Requirement>, request: &IndexRequest) -> Vec<Requirement> {
    declared
        .into_iter()
        .filter(|req| {
            let gates = req.marker_extras();
            let wanted = gates.is_empty()
                || gates.iter().any(|extra| request.extras.contains(extra))
                || (request.include_dev && gates.iter().any(|e| DEV_EXTRAS.contains(&e.as_str())));

            wanted
                && req.matches_host_platform()
                && (request.include_dev || !is_dev_dependency(&req.name))
        })
        .collect()
}
