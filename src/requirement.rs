// src/requirement.rs

//! Python requirement strings
//!
//! Parses the subset of PEP 508 that shows up in `requires_dist` metadata
//! and requirements files:
//!
//! ```text
//! name [extra1, extra2] version-spec ; marker
//! coverage[toml]>=7.2 ; extra == "test"
//! ```
//!
//! Only the name, extras, version specifier and the raw marker text are
//! kept. Two things are read out of markers: `extra == "..."` clauses, which
//! the index client uses to select optional dependencies, and platform
//! clauses (`sys_platform`, `platform_system`, `os_name`), which are checked
//! against the Linux host apt runs on. Any other clause counts as satisfied.

use crate::error::{Error, Result};
use crate::names::canonical_name;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static REQUIREMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:\[([^\]]*)\])?\s*(.*)$")
        .unwrap()
});

static EXTRA_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"extra\s*==\s*["']([^"']+)["']"#).unwrap());

static MARKER_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\(|\)|"[^"]*"|'[^']*'|[^\s()"']+"#).unwrap());

static PLATFORM_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(sys_platform|platform_system|os_name)\s*(==|!=)\s*["']([^"']*)["']$"#).unwrap()
});

/// Marker values of the host: apt only exists on Linux
const HOST_SYS_PLATFORM: &str = "linux";
const HOST_PLATFORM_SYSTEM: &str = "Linux";
const HOST_OS_NAME: &str = "posix";

/// A parsed dependency declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Project name as written
    pub name: String,
    /// Requested extras, in declaration order, without duplicates
    pub extras: Vec<String>,
    /// Version specifier (`>=1.0,<2`) or direct reference (`@ https://...`)
    pub version_spec: Option<String>,
    /// Environment marker text after `;`
    pub marker: Option<String>,
    /// The declaration as it was read, trimmed
    pub raw: String,
}

impl Requirement {
    /// Parse a requirement string
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(Error::Parse("empty requirement".to_string()));
        }

        let (spec, marker) = match raw.split_once(';') {
            Some((spec, marker)) => {
                let marker = marker.trim();
                (spec.trim(), (!marker.is_empty()).then(|| marker.to_string()))
            }
            None => (raw, None),
        };

        let caps = REQUIREMENT_RE
            .captures(spec)
            .ok_or_else(|| Error::Parse(format!("invalid requirement '{raw}'")))?;

        let name = caps[1].to_string();

        let mut extras: Vec<String> = Vec::new();
        if let Some(list) = caps.get(2) {
            for extra in list.as_str().split(',').map(str::trim).filter(|e| !e.is_empty()) {
                if !extras.iter().any(|e| canonical_name(e) == canonical_name(extra)) {
                    extras.push(extra.to_string());
                }
            }
        }

        let rest = caps.get(3).map(|m| m.as_str().trim()).unwrap_or("");
        let version_spec = if rest.is_empty() {
            None
        } else if rest.starts_with(['<', '>', '=', '!', '~', '@', '(']) {
            let spec = rest.trim_start_matches('(').trim_end_matches(')').trim();
            (!spec.is_empty()).then(|| spec.to_string())
        } else {
            return Err(Error::Parse(format!(
                "unexpected '{rest}' after package name in '{raw}'"
            )));
        };

        Ok(Self {
            name,
            extras,
            version_spec,
            marker,
            raw: raw.to_string(),
        })
    }

    /// Identity key: canonical name without extras or version
    pub fn key(&self) -> String {
        canonical_name(&self.name)
    }

    /// What the fallback installer receives: `name` or `name[extra,...]`
    pub fn install_spec(&self) -> String {
        if self.extras.is_empty() {
            self.name.clone()
        } else {
            format!("{}[{}]", self.name, self.extras.join(","))
        }
    }

    /// Extras named by `extra == "..."` clauses in the marker, canonicalized
    pub fn marker_extras(&self) -> Vec<String> {
        match &self.marker {
            Some(marker) => EXTRA_MARKER_RE
                .captures_iter(marker)
                .map(|c| canonical_name(&c[1]))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whether the marker's platform clauses allow a Linux host
    ///
    /// `pywin32 ; sys_platform == "win32"` does not; a requirement without a
    /// marker always does. `and`, `or` and parentheses are honoured.
    pub fn matches_host_platform(&self) -> bool {
        match &self.marker {
            Some(marker) => MarkerEval::new(marker).eval_or(),
            None => true,
        }
    }
}

/// Evaluates a marker with every non-platform clause taken as true
struct MarkerEval<'a> {
    tokens: Vec<&'a str>,
    pos: usize,
}

impl<'a> MarkerEval<'a> {
    fn new(marker: &'a str) -> Self {
        Self {
            tokens: MARKER_TOKEN_RE.find_iter(marker).map(|m| m.as_str()).collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn eval_or(&mut self) -> bool {
        let mut value = self.eval_and();
        while self.peek() == Some("or") {
            self.pos += 1;
            let rhs = self.eval_and();
            value = value || rhs;
        }
        value
    }

    fn eval_and(&mut self) -> bool {
        let mut value = self.eval_atom();
        while self.peek() == Some("and") {
            self.pos += 1;
            let rhs = self.eval_atom();
            value = value && rhs;
        }
        value
    }

    fn eval_atom(&mut self) -> bool {
        if self.peek() == Some("(") {
            self.pos += 1;
            let value = self.eval_or();
            if self.peek() == Some(")") {
                self.pos += 1;
            }
            return value;
        }

        let start = self.pos;
        while let Some(token) = self.peek() {
            if matches!(token, "and" | "or" | "(" | ")") {
                break;
            }
            self.pos += 1;
        }
        platform_clause_holds(&self.tokens[start..self.pos].join(" "))
    }
}

fn platform_clause_holds(clause: &str) -> bool {
    let Some(caps) = PLATFORM_CLAUSE_RE.captures(clause) else {
        return true;
    };
    let host = match &caps[1] {
        "sys_platform" => HOST_SYS_PLATFORM,
        "platform_system" => HOST_PLATFORM_SYSTEM,
        _ => HOST_OS_NAME,
    };
    let equal = &caps[3] == host;
    if &caps[2] == "==" { equal } else { !equal }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
