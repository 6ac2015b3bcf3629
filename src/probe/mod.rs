// src/probe/mod.rs

//! OS package existence checks
//!
//! A prober answers one question: does the OS package index know a package
//! by this name? Implementations fail closed, so any error reads as "no"
//! and the dependency goes to the fallback installer.

mod apt;

pub use apt::{AptCacheProber, is_valid_os_name, parse_package_field};

/// Checks candidate names against the OS package index
pub trait OsPackageProber {
    /// Look up a candidate and return the package name the index reports
    ///
    /// `None` means the package is unavailable or the lookup failed.
    fn lookup(&self, candidate: &str) -> Option<String>;

    /// Whether the candidate exists in the OS package index
    fn exists(&self, candidate: &str) -> bool {
        self.lookup(candidate).is_some()
    }
}

impl<T: OsPackageProber + ?Sized> OsPackageProber for &T {
    fn lookup(&self, candidate: &str) -> Option<String> {
        (**self).lookup(candidate)
    }
}
