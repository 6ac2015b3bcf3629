// src/resolver/mod.rs

//! Dependency graph walker
//!
//! Walks the dependency graph from one or more roots and classifies every
//! reachable package as OS-installable or fallback-required.
//!
//! # Algorithm
//!
//! ```text
//! stack <- roots (reversed, so they pop in order)
//! while stack not empty:
//!     pop (requirement, provenance)
//!     key <- canonical name
//!     key visited?  -> skip
//!     mark key visited
//!     OS index has python3-<name>?
//!         yes -> os_packages, stop here (apt brings its own dependencies)
//!         no  -> fallback_packages, fetch dependencies, push them (reversed)
//! ```
//!
//! A key is marked visited before its dependencies are pushed, which is what
//! makes cyclic declarations terminate: every package is probed at most once
//! per run, whichever branch reaches it first.
//!
//! Reaching a fallback package again with extras it does not have yet
//! merges them into its install spec and walks only the dependencies gated
//! on those extras. OS packages ignore extras.
//!
//! Lookup failures never escape the walker. A failed probe means "not
//! OS-installable" and a failed index fetch means "no dependencies".

mod node;

pub use node::{Classification, PackageNode, ResolutionResult, WalkStats};

use crate::error::{Error, Result};
use crate::index::{IndexRequest, PackageIndex};
use crate::interrupt;
use crate::names::NameMapper;
use crate::probe::OsPackageProber;
use crate::requirement::Requirement;
use std::collections::HashMap;
use tracing::{debug, info};

/// How much per-package progress the walker prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Nothing on stdout
    Quiet,
    /// One `Checking ...` line per package
    #[default]
    Normal,
    /// Also the classification decision for each package
    Debug,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if debug {
            Self::Debug
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }
}

/// Where a classified key ended up
enum Visited {
    Os,
    /// Index into `fallback_packages`
    Fallback(usize),
}

/// One pending package on the work stack
struct Frame {
    requirement: Requirement,
    provenance: Vec<String>,
}

/// Dependency graph walker over an index and an OS prober
pub struct Resolver<I, P> {
    index: I,
    prober: P,
    mapper: NameMapper,
    include_dev: bool,
    verbosity: Verbosity,
    is_interrupted: fn() -> bool,
}

impl<I: PackageIndex, P: OsPackageProber> Resolver<I, P> {
    /// Create a resolver
    pub fn new(index: I, prober: P, mapper: NameMapper, verbosity: Verbosity) -> Self {
        Self {
            index,
            prober,
            mapper,
            include_dev: false,
            verbosity,
            is_interrupted: interrupt::interrupted,
        }
    }

    /// Ask the index for development dependency groups too
    pub fn include_dev(mut self, include_dev: bool) -> Self {
        self.include_dev = include_dev;
        self
    }

    /// Replace the interrupt check (defaults to the process signal flag)
    pub fn with_interrupt_check(mut self, is_interrupted: fn() -> bool) -> Self {
        self.is_interrupted = is_interrupted;
        self
    }

    /// Resolve all roots into one partition with a shared visited set
    ///
    /// Only fails with `Error::Interrupted`.
    pub fn resolve(&self, roots: &[Requirement]) -> Result<ResolutionResult> {
        let mut visited: HashMap<String, Visited> = HashMap::new();
        let mut result = ResolutionResult::default();
        let mut stack: Vec<Frame> = roots
            .iter()
            .rev()
            .map(|root| Frame {
                requirement: root.clone(),
                provenance: vec![root.name.clone()],
            })
            .collect();

        while let Some(frame) = stack.pop() {
            interrupt::check(self.is_interrupted)?;

            let key = frame.requirement.key();
            match visited.get(&key) {
                Some(Visited::Os) => {
                    debug!("Already classified {}, skipping", frame.requirement.name);
                    continue;
                }
                Some(Visited::Fallback(index)) => {
                    let node = &mut result.fallback_packages[*index];
                    let added = node.merge_extras(&frame.requirement.extras);
                    if added.is_empty() {
                        debug!("Already classified {}, skipping", frame.requirement.name);
                        continue;
                    }
                    debug!(
                        "Extras {:?} added to {} via {}",
                        added,
                        node.name,
                        frame.provenance.join(" -> ")
                    );
                    let request = IndexRequest::new(&node.name, &added, self.include_dev);
                    let deps =
                        self.fetch_dependencies(&request, &frame.provenance, &mut result.stats)?;
                    let gated = deps
                        .into_iter()
                        .filter(|dep| {
                            dep.marker_extras()
                                .iter()
                                .any(|e| request.extras.contains(e))
                        })
                        .collect();
                    push_dependencies(&mut stack, &visited, &frame.provenance, gated);
                    continue;
                }
                None => {}
            }

            let mut node = PackageNode::new(&frame.requirement, frame.provenance);
            self.report_checking(&node);

            let candidate = self.mapper.os_candidate(&node.name);
            result.stats.probes += 1;
            if let Some(os_name) = self.prober.lookup(&candidate) {
                self.report_decision(&node, &format!("OS package {os_name}"));
                node.classification = Classification::OsInstallable { os_name };
                visited.insert(key, Visited::Os);
                result.os_packages.push(node);
                continue;
            }

            visited.insert(key, Visited::Fallback(result.fallback_packages.len()));
            let request = IndexRequest::new(&node.name, &node.extras, self.include_dev);
            let deps = self.fetch_dependencies(&request, &node.provenance, &mut result.stats)?;
            self.report_decision(
                &node,
                &format!("fallback install {} ({} dependencies)", node.install_spec, deps.len()),
            );
            push_dependencies(&mut stack, &visited, &node.provenance, deps);

            node.classification = Classification::FallbackRequired;
            result.fallback_packages.push(node);
        }

        info!(
            "Resolved {} packages: {} from OS, {} from fallback ({} probes, {} index fetches, {} failed)",
            result.len(),
            result.os_packages.len(),
            result.fallback_packages.len(),
            result.stats.probes,
            result.stats.fetches,
            result.stats.failed_fetches
        );
        Ok(result)
    }

    /// Fetch declared dependencies; any failure except an interrupt means
    /// "no dependencies"
    fn fetch_dependencies(
        &self,
        request: &IndexRequest,
        provenance: &[String],
        stats: &mut WalkStats,
    ) -> Result<Vec<Requirement>> {
        stats.fetches += 1;
        match self.index.fetch_dependencies(request) {
            Ok(deps) => Ok(deps),
            Err(Error::Interrupted) => Err(Error::Interrupted),
            Err(e) => {
                debug!(
                    "Index lookup for {} ({}) failed, treating as no dependencies: {}",
                    request.name,
                    provenance.join(" -> "),
                    e
                );
                stats.failed_fetches += 1;
                Ok(Vec::new())
            }
        }
    }

    fn report_checking(&self, node: &PackageNode) {
        info!("Checking {} ({})", node.name, node.provenance_display());
        if self.verbosity >= Verbosity::Normal {
            println!("Checking {} ({})", node.name, node.provenance_display());
        }
    }

    fn report_decision(&self, node: &PackageNode, decision: &str) {
        debug!("{} ({}): {}", node.name, node.provenance_display(), decision);
        if self.verbosity >= Verbosity::Debug {
            println!("  {} -> {}", node.name, decision);
        }
    }
}

/// Push dependencies so they pop in declaration order
///
/// A dependency already classified is left off the stack unless it names
/// extras, which may still need merging into its fallback node.
fn push_dependencies(
    stack: &mut Vec<Frame>,
    visited: &HashMap<String, Visited>,
    provenance: &[String],
    deps: Vec<Requirement>,
) {
    for dep in deps.into_iter().rev() {
        if visited.contains_key(&dep.key()) && dep.extras.is_empty() {
            continue;
        }
        let mut path = provenance.to_vec();
        path.push(dep.name.clone());
        stack.push(Frame {
            requirement: dep,
            provenance: path,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    struct MapIndex {
        deps: HashMap<&'static str, Vec<&'static str>>,
        calls: RefCell<Vec<IndexRequest>>,
    }

    impl PackageIndex for MapIndex {
        fn fetch_dependencies(&self, request: &IndexRequest) -> Result<Vec<Requirement>> {
            self.calls.borrow_mut().push(request.clone());
            match self.deps.get(request.name.as_str()) {
                Some(deps) => Ok(deps.iter().map(|d| Requirement::parse(d).unwrap()).collect()),
                None => Err(Error::NotFound(request.name.clone())),
            }
        }
    }

    struct SetProber(HashSet<&'static str>);

    impl OsPackageProber for SetProber {
        fn lookup(&self, candidate: &str) -> Option<String> {
            self.0.contains(candidate).then(|| candidate.to_string())
        }
    }

    fn resolver(
        deps: &[(&'static str, &[&'static str])],
        os: &[&'static str],
    ) -> Resolver<MapIndex, SetProber> {
        let index = MapIndex {
            deps: deps.iter().map(|(k, v)| (*k, v.to_vec())).collect(),
            calls: RefCell::new(Vec::new()),
        };
        let prober = SetProber(os.iter().copied().collect());
        Resolver::new(index, prober, NameMapper::default(), Verbosity::Quiet)
            .with_interrupt_check(|| false)
    }

    fn roots(specs: &[&str]) -> Vec<Requirement> {
        specs.iter().map(|s| Requirement::parse(s).unwrap()).collect()
    }

    #[test]
    fn test_declaration_order_preserved() {
        let r = resolver(&[("a", &["b", "c"]), ("b", &["d"]), ("c", &[]), ("d", &[])], &[]);
        let result = r.resolve(&roots(&["a"])).unwrap();
        assert_eq!(result.fallback_specs(), ["a", "b", "d", "c"]);
    }

    #[test]
    fn test_provenance_recorded() {
        let r = resolver(&[("a", &["b"]), ("b", &["c"]), ("c", &[])], &["python3-c"]);
        let result = r.resolve(&roots(&["a"])).unwrap();
        assert_eq!(result.os_packages[0].provenance, ["a", "b", "c"]);
        assert_eq!(result.fallback_packages[1].provenance_display(), "a -> b");
    }

    #[test]
    fn test_failed_lookup_counts_and_continues() {
        let r = resolver(&[("a", &["missing"])], &[]);
        let result = r.resolve(&roots(&["a"])).unwrap();
        assert_eq!(result.fallback_specs(), ["a", "missing"]);
        assert_eq!(result.stats.fetches, 2);
        assert_eq!(result.stats.failed_fetches, 1);
    }

    #[test]
    fn test_extras_forwarded_to_index() {
        let r = resolver(&[("coverage", &[])], &[]);
        r.resolve(&roots(&["coverage[toml]"])).unwrap();
        let calls = r.index.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "coverage");
        assert_eq!(calls[0].extras, ["toml"]);
        assert!(!calls[0].include_dev);
    }

    #[test]
    fn test_include_dev_forwarded() {
        let r = resolver(&[("a", &[])], &[]).include_dev(true);
        r.resolve(&roots(&["a"])).unwrap();
        assert!(r.index.calls.borrow()[0].include_dev);
    }

    #[test]
    fn test_interrupt_aborts() {
        let r = resolver(&[("a", &[])], &[]).with_interrupt_check(|| true);
        assert!(matches!(r.resolve(&roots(&["a"])), Err(Error::Interrupted)));
        assert!(r.index.calls.borrow().is_empty());
    }

    #[test]
    fn test_interrupted_fetch_aborts() {
        struct InterruptedIndex;

        impl PackageIndex for InterruptedIndex {
            fn fetch_dependencies(&self, _: &IndexRequest) -> Result<Vec<Requirement>> {
                Err(Error::Interrupted)
            }
        }

        let r = Resolver::new(
            InterruptedIndex,
            SetProber(HashSet::new()),
            NameMapper::default(),
            Verbosity::Quiet,
        )
        .with_interrupt_check(|| false);
        assert!(matches!(r.resolve(&roots(&["a", "b"])), Err(Error::Interrupted)));
    }

    #[test]
    fn test_empty_roots() {
        let r = resolver(&[], &[]);
        let result = r.resolve(&[]).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.stats, WalkStats::default());
    }

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Debug);
    }
}
