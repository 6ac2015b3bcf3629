// tests/common/mod.rs

//! Shared fakes for integration tests: an in-memory package index, an OS
//! prober backed by a name set, and a command runner that records argv.

#![allow(dead_code)]

use aptpip::{
    CommandRunner, Error, IndexRequest, NameMapper, OsPackageProber, PackageIndex, Requirement,
    Resolver, Result, Verbosity,
};
use aptpip::index::select_dependencies;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// Package index backed by a name -> declared dependencies map
///
/// Declared dependencies go through the same extras/platform selection as
/// the PyPI client. Unknown names fail with `Error::NotFound`, like a 404
/// from PyPI.
#[derive(Default)]
pub struct FakeIndex {
    deps: HashMap<String, Vec<String>>,
    pub requests: RefCell<Vec<IndexRequest>>,
}

impl FakeIndex {
    pub fn new(graph: &[(&str, &[&str])]) -> Self {
        Self {
            deps: graph
                .iter()
                .map(|(name, deps)| (name.to_string(), deps.iter().map(|d| d.to_string()).collect()))
                .collect(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn fetched_names(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|r| r.name.clone()).collect()
    }
}

impl PackageIndex for FakeIndex {
    fn fetch_dependencies(&self, request: &IndexRequest) -> Result<Vec<Requirement>> {
        self.requests.borrow_mut().push(request.clone());
        let deps = self
            .deps
            .get(&request.name)
            .ok_or_else(|| Error::NotFound(request.name.clone()))?;
        let declared = deps
            .iter()
            .map(|d| Requirement::parse(d))
            .collect::<Result<Vec<_>>>()?;
        Ok(select_dependencies(declared, request))
    }
}

/// OS prober that knows a fixed set of package names
#[derive(Default)]
pub struct FakeProber {
    available: Option<HashSet<String>>,
    pub probes: RefCell<Vec<String>>,
}

impl FakeProber {
    pub fn with(names: &[&str]) -> Self {
        Self {
            available: Some(names.iter().map(|n| n.to_string()).collect()),
            probes: RefCell::new(Vec::new()),
        }
    }

    /// Every candidate exists
    pub fn always() -> Self {
        Self {
            available: None,
            probes: RefCell::new(Vec::new()),
        }
    }

    pub fn probe_count(&self, candidate: &str) -> usize {
        self.probes.borrow().iter().filter(|p| *p == candidate).count()
    }
}

impl OsPackageProber for FakeProber {
    fn lookup(&self, candidate: &str) -> Option<String> {
        self.probes.borrow_mut().push(candidate.to_string());
        let found = match &self.available {
            Some(names) => names.contains(candidate),
            None => true,
        };
        found.then(|| candidate.to_string())
    }
}

/// Command runner that records argv and returns scripted exit codes
pub struct RecordingRunner {
    codes: HashMap<String, i32>,
    pub calls: RefCell<Vec<Vec<String>>>,
}

impl RecordingRunner {
    /// `codes` maps a program name to its exit code; others exit 0
    pub fn new(codes: &[(&str, i32)]) -> Self {
        Self {
            codes: codes.iter().map(|(p, c)| (p.to_string(), *c)).collect(),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, argv: &[String]) -> i32 {
        self.calls.borrow_mut().push(argv.to_vec());
        argv.first()
            .and_then(|program| self.codes.get(program))
            .copied()
            .unwrap_or(0)
    }
}

/// Quiet resolver over borrowed fakes, never interrupted
pub fn resolver<'a>(
    index: &'a FakeIndex,
    prober: &'a FakeProber,
) -> Resolver<&'a FakeIndex, &'a FakeProber> {
    Resolver::new(index, prober, NameMapper::default(), Verbosity::Quiet)
        .with_interrupt_check(|| false)
}

pub fn roots(specs: &[&str]) -> Vec<Requirement> {
    specs.iter().map(|s| Requirement::parse(s).unwrap()).collect()
}
