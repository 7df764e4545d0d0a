//! Role-based access control list.
//!
//! The ACL is loaded once at startup from a JSON document and is read-only
//! until `clear` at teardown. Two sections are understood:
//!
//! ```json
//! {
//!   "assign": [ { "subject": "dashboard", "roles": ["admin"] } ],
//!   "roles":  { "admin": ["config:read", "config:write"] }
//! }
//! ```
//!
//! `roles` defines each role's capability set; `assign` maps caller
//! subjects to roles and is what token payloads reference. Individual
//! malformed entries are skipped with a warning; only an unreadable stream
//! or a non-JSON document fails the load. Unknown roles resolve to an
//! empty capability set, never an error.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::warn;

/// Set of capability strings granted to a role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(HashSet<String>);

impl CapabilitySet {
    pub fn contains(&self, capability: &str) -> bool {
        self.0.contains(capability)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<String> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Diagnostics from a completed load. Warnings only: a load that produced
/// a non-empty report still succeeded.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Roles named in the assign table but never defined. Resolving them
    /// yields deny-all.
    pub undefined: Vec<String>,
    /// Roles defined but never assigned to any subject.
    pub unreferenced: Vec<String>,
    /// Count of entries skipped for not having the expected shape.
    pub skipped: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.undefined.is_empty() && self.unreferenced.is_empty() && self.skipped == 0
    }
}

#[derive(Default)]
struct AclState {
    roles: HashMap<String, CapabilitySet>,
    assign: HashMap<String, Vec<String>>,
}

/// In-memory role→capability mapping with a subject→role assign table.
///
/// The lock only expresses the write-once-load / read-many / clear
/// lifecycle; request-path readers never contend with each other.
#[derive(Default)]
pub struct AccessControlList {
    inner: RwLock<AclState>,
}

impl AccessControlList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and install role definitions from a readable JSON stream.
    ///
    /// Replaces any previously loaded state. Returns the two diagnostic
    /// lists (sorted) described on `LoadReport`.
    pub fn load(&self, mut source: impl Read) -> Result<LoadReport> {
        let mut text = String::new();
        source
            .read_to_string(&mut text)
            .context("While reading ACL source")?;
        let doc: serde_json::Value =
            serde_json::from_str(&text).context("ACL source is not valid JSON")?;

        let mut skipped = 0usize;
        let mut roles: HashMap<String, CapabilitySet> = HashMap::new();
        if let Some(map) = doc.get("roles").and_then(|v| v.as_object()) {
            for (name, caps) in map {
                let Some(arr) = caps.as_array() else {
                    warn!("ACL role '{}' is not a capability array, skipped", name);
                    skipped += 1;
                    continue;
                };
                let set: CapabilitySet = arr
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.to_string())
                    .collect();
                roles.insert(name.clone(), set);
            }
        }

        let mut assign: HashMap<String, Vec<String>> = HashMap::new();
        if let Some(entries) = doc.get("assign").and_then(|v| v.as_array()) {
            for entry in entries {
                let Some(subject) = entry.get("subject").and_then(|v| v.as_str()) else {
                    warn!("ACL assign entry without a subject, skipped");
                    skipped += 1;
                    continue;
                };
                let mut assigned: Vec<String> = Vec::new();
                if let Some(role) = entry.get("role").and_then(|v| v.as_str()) {
                    assigned.push(role.to_string());
                }
                if let Some(list) = entry.get("roles").and_then(|v| v.as_array()) {
                    assigned.extend(
                        list.iter().filter_map(|v| v.as_str()).map(|s| s.to_string()),
                    );
                }
                if assigned.is_empty() {
                    warn!("ACL assign entry for '{}' names no roles, skipped", subject);
                    skipped += 1;
                    continue;
                }
                assign.entry(subject.to_string()).or_default().extend(assigned);
            }
        }

        let referenced: HashSet<&String> = assign.values().flatten().collect();
        let mut undefined: Vec<String> = referenced
            .iter()
            .filter(|r| !roles.contains_key(r.as_str()))
            .map(|r| r.to_string())
            .collect();
        undefined.sort();
        let mut unreferenced: Vec<String> = roles
            .keys()
            .filter(|r| !referenced.contains(r))
            .cloned()
            .collect();
        unreferenced.sort();

        let mut st = self.inner.write();
        st.roles = roles;
        st.assign = assign;

        Ok(LoadReport { undefined, unreferenced, skipped })
    }

    /// Capability set for `role`; an unknown role yields the empty
    /// (deny-all) set.
    pub fn resolve(&self, role: &str) -> CapabilitySet {
        self.inner.read().roles.get(role).cloned().unwrap_or_default()
    }

    /// Roles the assign table grants to `subject`; empty when unknown.
    pub fn assigned_roles(&self, subject: &str) -> Vec<String> {
        self.inner.read().assign.get(subject).cloned().unwrap_or_default()
    }

    pub fn role_count(&self) -> usize {
        self.inner.read().roles.len()
    }

    /// Drop every entry. Subsequent resolution sees an empty table.
    pub fn clear(&self) {
        let mut st = self.inner.write();
        st.roles.clear();
        st.assign.clear();
    }
}
