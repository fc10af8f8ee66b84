//! Privilege Edit Model
//!
//! The editable table of grantee rows and the pure predicates that decide
//! whether it may be submitted. Nothing here knows about stages or
//! rendering; the engine consults these predicates in its guards.

use serde::{Deserialize, Serialize};

use crate::capability::{EffectivePrivilegeSet, PrivilegeCode};
use crate::state::{Blocker, BlockerType};

/// One privilege checked on a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeEntry {
    #[serde(rename = "privilege_type")]
    pub code: PrivilegeCode,
    /// Unchecked entries are carried on the wire but do not count as granted.
    #[serde(default = "checked")]
    pub privilege: bool,
    #[serde(default)]
    pub with_grant: bool,
}

fn checked() -> bool {
    true
}

impl PrivilegeEntry {
    pub fn new(code: impl Into<PrivilegeCode>) -> Self {
        Self {
            code: code.into(),
            privilege: true,
            with_grant: false,
        }
    }

    pub fn with_grant_option(mut self) -> Self {
        self.with_grant = true;
        self
    }
}

/// A grantee and the privileges it should receive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeGrantRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grantee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grantor: Option<String>,
    #[serde(default)]
    pub privileges: Vec<PrivilegeEntry>,
}

impl PrivilegeGrantRow {
    pub fn new(grantee: impl Into<String>) -> Self {
        Self {
            grantee: Some(grantee.into()),
            ..Default::default()
        }
    }

    pub fn grant(mut self, entry: impl Into<PrivilegeEntry>) -> Self {
        self.privileges.push(entry.into());
        self
    }

    /// Grantee, if one is set and not blank.
    pub fn grantee(&self) -> Option<&str> {
        self.grantee
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }

    /// Checked privileges, in row order.
    pub fn granted(&self) -> impl Iterator<Item = &PrivilegeEntry> {
        self.privileges.iter().filter(|p| p.privilege)
    }

    pub fn is_valid(&self) -> bool {
        self.grantee().is_some() && self.granted().next().is_some()
    }
}

impl From<PrivilegeCode> for PrivilegeEntry {
    fn from(code: PrivilegeCode) -> Self {
        Self::new(code)
    }
}

impl From<&str> for PrivilegeEntry {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Ordered grantee rows plus the validity predicates over them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantEditState {
    rows: Vec<PrivilegeGrantRow>,
}

impl GrantEditState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rows(&mut self, rows: Vec<PrivilegeGrantRow>) {
        self.rows = rows;
    }

    pub fn rows(&self) -> &[PrivilegeGrantRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True iff there is at least one row and every row has a grantee and
    /// a non-empty privilege subset.
    pub fn is_valid(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(PrivilegeGrantRow::is_valid)
    }

    /// Checked privileges that the current selection no longer offers,
    /// as `(row index, code)`.
    pub fn stale_privileges<'a>(
        &'a self,
        effective: &'a EffectivePrivilegeSet,
    ) -> impl Iterator<Item = (usize, &'a PrivilegeCode)> + 'a {
        self.rows.iter().enumerate().flat_map(move |(idx, row)| {
            row.granted()
                .filter(move |p| !effective.contains(&p.code))
                .map(move |p| (idx, &p.code))
        })
    }

    /// Every reason the rows cannot be submitted against `effective`.
    /// Empty when advancement is allowed.
    pub fn blockers(&self, effective: &EffectivePrivilegeSet) -> Vec<Blocker> {
        if self.rows.is_empty() {
            return vec![Blocker::new(
                BlockerType::NoGrantRows,
                "Please add at least one grantee.",
            )];
        }

        let mut blockers = Vec::new();
        for (idx, row) in self.rows.iter().enumerate() {
            if row.grantee().is_none() {
                blockers.push(Blocker::new(
                    BlockerType::MissingGrantee { row: idx },
                    format!("Row {}: grantee is required.", idx + 1),
                ));
            }
            if row.granted().next().is_none() {
                blockers.push(Blocker::new(
                    BlockerType::NoPrivileges { row: idx },
                    format!("Row {}: select at least one privilege.", idx + 1),
                ));
            }
        }
        for (idx, code) in self.stale_privileges(effective) {
            blockers.push(Blocker::new(
                BlockerType::StalePrivilege {
                    row: idx,
                    privilege: code.clone(),
                },
                format!(
                    "Row {}: {} is not grantable on the selected objects.",
                    idx + 1,
                    code
                ),
            ));
        }
        blockers
    }
}
