// src/requirements_file.rs

//! Requirements file reader
//!
//! Reads root requirements from a pip-style requirements file: one
//! requirement per line, `#` comments, and `-r`/`--requirement` includes
//! resolved relative to the including file. Other pip options are skipped.

use crate::error::{Error, Result};
use crate::requirement::Requirement;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read every root requirement from a requirements file
///
/// A missing or unreadable file is `Error::Input`, as is a file (with its
/// includes) that yields no requirements.
pub fn read_requirements(path: &Path) -> Result<Vec<Requirement>> {
    let mut roots = Vec::new();
    let mut seen_files = HashSet::new();
    read_into(path, &mut roots, &mut seen_files)?;

    if roots.is_empty() {
        return Err(Error::Input(format!(
            "No packages listed in requirements file {}",
            path.display()
        )));
    }

    debug!("Read {} requirements from {}", roots.len(), path.display());
    Ok(roots)
}

fn read_into(
    path: &Path,
    roots: &mut Vec<Requirement>,
    seen_files: &mut HashSet<PathBuf>,
) -> Result<()> {
    let canonical = path.canonicalize().map_err(|e| {
        Error::Input(format!("Requirements file not found: {}: {e}", path.display()))
    })?;
    if !seen_files.insert(canonical) {
        warn!("Skipping already included requirements file {}", path.display());
        return Ok(());
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Input(format!("Failed to read requirements file {}: {e}", path.display()))
    })?;

    for (lineno, line) in content.lines().enumerate() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(include) = include_target(line) {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            read_into(&base.join(include), roots, seen_files)?;
            continue;
        }

        if line.starts_with('-') {
            warn!(
                "{}:{}: skipping unsupported option '{}'",
                path.display(),
                lineno + 1,
                line
            );
            continue;
        }

        match Requirement::parse(line) {
            Ok(req) => roots.push(req),
            Err(e) => warn!("{}:{}: invalid line '{}': {}", path.display(), lineno + 1, line, e),
        }
    }

    Ok(())
}

/// Drop a `#` comment; pip only treats `#` as a comment at line start or
/// after whitespace
fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(" #").or_else(|| line.find("\t#")) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Target of a `-r FILE`, `-rFILE`, `--requirement FILE` or `--requirement=FILE` line
fn include_target(line: &str) -> Option<&str> {
    let rest = line
        .strip_prefix("--requirement")
        .map(|r| r.strip_prefix('=').unwrap_or(r))
        .or_else(|| line.strip_prefix("-r"))?;
    let target = rest.trim();
    (!target.is_empty()).then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("# whole line"), "");
        assert_eq!(strip_comment("attrs  # pinned later"), "attrs ");
        assert_eq!(strip_comment("pkg @ https://x.org/a#egg=pkg"), "pkg @ https://x.org/a#egg=pkg");
    }

    #[test]
    fn test_include_target() {
        assert_eq!(include_target("-r base.txt"), Some("base.txt"));
        assert_eq!(include_target("-rbase.txt"), Some("base.txt"));
        assert_eq!(include_target("--requirement base.txt"), Some("base.txt"));
        assert_eq!(include_target("--requirement=base.txt"), Some("base.txt"));
        assert_eq!(include_target("-r"), None);
        assert_eq!(include_target("-e ."), None);
        assert_eq!(include_target("attrs"), None);
    }
}
