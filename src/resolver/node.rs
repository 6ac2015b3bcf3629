// src/resolver/node.rs

//! Resolution data model

use crate::names::canonical_name;
use crate::requirement::Requirement;

/// Where a package will be installed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Unclassified,
    /// Available from the OS package index under `os_name`
    OsInstallable { os_name: String },
    /// Must go through the fallback installer
    FallbackRequired,
}

/// A package discovered during resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNode {
    /// Canonical identity key
    pub key: String,
    /// Project name as declared
    pub name: String,
    /// Declaration as read, including extras and version
    pub raw_spec: String,
    /// `name[extras]` as handed to the fallback installer
    pub install_spec: String,
    /// Requested extras
    pub extras: Vec<String>,
    /// Ancestor names from the root down to this node
    pub provenance: Vec<String>,
    pub classification: Classification,
}

impl PackageNode {
    pub fn new(requirement: &Requirement, provenance: Vec<String>) -> Self {
        Self {
            key: requirement.key(),
            name: requirement.name.clone(),
            raw_spec: requirement.raw.clone(),
            install_spec: requirement.install_spec(),
            extras: requirement.extras.clone(),
            provenance,
            classification: Classification::Unclassified,
        }
    }

    /// Add extras this node does not have yet and return the new ones
    ///
    /// The install spec is rebuilt to list every extra.
    pub fn merge_extras(&mut self, extras: &[String]) -> Vec<String> {
        let mut added = Vec::new();
        for extra in extras {
            let known = self
                .extras
                .iter()
                .any(|e| canonical_name(e) == canonical_name(extra));
            if !known {
                self.extras.push(extra.clone());
                added.push(extra.clone());
            }
        }
        if !added.is_empty() {
            self.install_spec = format!("{}[{}]", self.name, self.extras.join(","));
        }
        added
    }

    /// Provenance chain for display: `root -> dep -> this`
    pub fn provenance_display(&self) -> String {
        self.provenance.join(" -> ")
    }

    /// OS package name, if the node is OS-installable
    pub fn os_name(&self) -> Option<&str> {
        match &self.classification {
            Classification::OsInstallable { os_name } => Some(os_name),
            _ => None,
        }
    }
}

/// Counters for one resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// OS index probes issued
    pub probes: usize,
    /// Package index fetches issued
    pub fetches: usize,
    /// Package index fetches that failed and were treated as empty
    pub failed_fetches: usize,
}

/// The partition produced by one resolution run
#[derive(Debug, Clone, Default)]
pub struct ResolutionResult {
    /// OS-installable nodes, in discovery order
    pub os_packages: Vec<PackageNode>,
    /// Fallback nodes, in discovery order
    pub fallback_packages: Vec<PackageNode>,
    pub stats: WalkStats,
}

impl ResolutionResult {
    /// OS package names in discovery order
    pub fn os_names(&self) -> Vec<&str> {
        self.os_packages.iter().filter_map(|n| n.os_name()).collect()
    }

    /// Fallback install specs in discovery order
    pub fn fallback_specs(&self) -> Vec<&str> {
        self.fallback_packages
            .iter()
            .map(|n| n.install_spec.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.os_packages.is_empty() && self.fallback_packages.is_empty()
    }

    /// Total classified nodes
    pub fn len(&self) -> usize {
        self.os_packages.len() + self.fallback_packages.len()
    }
}
