// src/names.rs

//! Name mapping between the Python index and the OS package index
//!
//! Two rules live here:
//! - the canonical identity key for a Python project (PEP 503), used for
//!   deduplication during resolution
//! - the Debian candidate name for a Python project (`python3-<name>`),
//!   used to probe apt
//!
//! Both are pure string functions.

/// Default prefix Debian uses for Python 3 library packages
pub const DEFAULT_OS_PREFIX: &str = "python3-";

/// Strip extras, version specifiers and markers from a requirement string
///
/// `coverage[toml]>=7 ; extra == "test"` becomes `coverage`.
pub fn bare_name(spec: &str) -> &str {
    let spec = spec.trim();
    let end = spec
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(spec.len());
    &spec[..end]
}

/// PEP 503 normalized project name
///
/// Lowercase, with every run of `-`, `_` and `.` collapsed to a single `-`.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in bare_name(name).chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.push(c.to_ascii_lowercase());
            in_separator = false;
        }
    }
    out
}

/// Maps Python project names to OS package candidates
#[derive(Debug, Clone)]
pub struct NameMapper {
    prefix: String,
}

impl NameMapper {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Candidate OS package name for a requirement string
    ///
    /// Debian's Python policy lowercases the module name and turns `_` into
    /// `-`; dots are legal in Debian names and are kept.
    pub fn os_candidate(&self, spec: &str) -> String {
        let name: String = bare_name(spec)
            .chars()
            .map(|c| if c == '_' { '-' } else { c.to_ascii_lowercase() })
            .collect();
        format!("{}{}", self.prefix, name)
    }
}

impl Default for NameMapper {
    fn default() -> Self {
        Self::new(DEFAULT_OS_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name() {
        assert_eq!(bare_name("coverage[toml]"), "coverage");
        assert_eq!(bare_name("requests>=2.0"), "requests");
        assert_eq!(bare_name("  six ; python_version < '3'"), "six");
        assert_eq!(bare_name("zope.interface"), "zope.interface");
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("PyYAML"), "pyyaml");
        assert_eq!(canonical_name("google_auth__oauthlib"), "google-auth-oauthlib");
        assert_eq!(canonical_name("zope.interface"), "zope-interface");
        assert_eq!(canonical_name("Coverage[toml]"), "coverage");
    }

    #[test]
    fn test_os_candidate() {
        let mapper = NameMapper::default();
        assert_eq!(mapper.os_candidate("gphotos-sync"), "python3-gphotos-sync");
        assert_eq!(mapper.os_candidate("coverage[toml]"), "python3-coverage");
        assert_eq!(mapper.os_candidate("PyYAML>=5"), "python3-pyyaml");
        assert_eq!(mapper.os_candidate("typing_extensions"), "python3-typing-extensions");
        assert_eq!(mapper.os_candidate("zope.interface"), "python3-zope.interface");
    }

    #[test]
    fn test_os_candidate_is_stable() {
        let mapper = NameMapper::new("pypy3-");
        let first = mapper.os_candidate("Attrs");
        assert_eq!(first, "pypy3-attrs");
        assert_eq!(mapper.os_candidate("Attrs"), first);
    }
}
