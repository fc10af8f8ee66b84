//! Privilege Capability Resolver
//!
//! The capability catalog maps a normalized object class to the privilege
//! codes that are legal for it. [`resolve`] folds the catalog over the
//! current selection to produce the privileges the edit model may offer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::object::NormalizedObjectClass;
use crate::selection::SelectionSet;

// ─── Privilege codes ──────────────────────────────────────────

/// A single grantable capability, as an ACL code (`r`, `X`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivilegeCode(pub String);

impl PrivilegeCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// SQL keyword for the code. Unknown codes display verbatim.
    pub fn keyword(&self) -> &str {
        match self.0.as_str() {
            "a" => "INSERT",
            "r" => "SELECT",
            "w" => "UPDATE",
            "d" => "DELETE",
            "D" => "TRUNCATE",
            "x" => "REFERENCES",
            "t" => "TRIGGER",
            "X" => "EXECUTE",
            "U" => "USAGE",
            "C" => "CREATE",
            "c" => "CONNECT",
            "T" => "TEMPORARY",
            other => other,
        }
    }
}

impl From<&str> for PrivilegeCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl fmt::Display for PrivilegeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

// ─── Capability catalog ───────────────────────────────────────

/// Privileges grantable on one class. Wire shape: `{ "acl": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCapabilities {
    #[serde(default)]
    pub acl: Vec<PrivilegeCode>,
}

/// Per-database mapping of object class to its legal privilege codes.
///
/// Loaded once at wizard start and read-only afterwards. Keys the crate
/// does not know about are kept but never consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrivilegeCapabilitySet {
    classes: BTreeMap<String, ClassCapabilities>,
}

impl PrivilegeCapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by tests and the in-memory service.
    pub fn with_class<I, P>(mut self, class: NormalizedObjectClass, privileges: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PrivilegeCode>,
    {
        if let Some(key) = class.catalog_key() {
            self.classes.insert(
                key.to_string(),
                ClassCapabilities {
                    acl: privileges.into_iter().map(Into::into).collect(),
                },
            );
        }
        self
    }

    /// Privileges for a class; empty when the class is unmapped or absent.
    pub fn privileges_for(&self, class: NormalizedObjectClass) -> &[PrivilegeCode] {
        class
            .catalog_key()
            .and_then(|key| self.classes.get(key))
            .map(|caps| caps.acl.as_slice())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

// ─── Effective privileges ─────────────────────────────────────

/// Ordered, deduplicated union of the privileges offered for a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EffectivePrivilegeSet {
    privileges: Vec<PrivilegeCode>,
}

impl EffectivePrivilegeSet {
    pub fn contains(&self, code: &PrivilegeCode) -> bool {
        self.privileges.contains(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PrivilegeCode> {
        self.privileges.iter()
    }

    pub fn as_slice(&self) -> &[PrivilegeCode] {
        &self.privileges
    }

    pub fn len(&self) -> usize {
        self.privileges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.privileges.is_empty()
    }
}

/// Union of catalog privileges over the selection's normalized classes.
///
/// The first class encountered in selection order contributes first;
/// duplicates are elided. Unmapped classes contribute nothing.
pub fn resolve(selection: &SelectionSet, catalog: &PrivilegeCapabilitySet) -> EffectivePrivilegeSet {
    let mut seen = HashSet::new();
    let privileges = selection
        .classes()
        .into_iter()
        .flat_map(|class| catalog.privileges_for(class).iter())
        .filter(|code| seen.insert(*code))
        .cloned()
        .collect();
    EffectivePrivilegeSet { privileges }
}
