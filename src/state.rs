//! Wizard State Types
//!
//! Defines the stages of the grant wizard, its transition history and the
//! blockers that keep it from advancing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::capability::PrivilegeCode;

/// Stages of the wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    SelectObjects = 0,
    EditPrivileges = 1,
    Review = 2,
}

impl WizardStage {
    pub const ALL: [WizardStage; 3] = [
        WizardStage::SelectObjects,
        WizardStage::EditPrivileges,
        WizardStage::Review,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::SelectObjects => "Object Selection",
            Self::EditPrivileges => "Privilege Selection",
            Self::Review => "Review",
        }
    }

    pub fn next(&self) -> Option<WizardStage> {
        match self {
            Self::SelectObjects => Some(Self::EditPrivileges),
            Self::EditPrivileges => Some(Self::Review),
            Self::Review => None,
        }
    }

    pub fn previous(&self) -> Option<WizardStage> {
        match self {
            Self::SelectObjects => None,
            Self::EditPrivileges => Some(Self::SelectObjects),
            Self::Review => Some(Self::EditPrivileges),
        }
    }
}

impl fmt::Display for WizardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Record of a stage transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: WizardStage,
    pub to: WizardStage,
    pub transitioned_at: DateTime<Utc>,
    /// Set when the transition skipped stages on finish.
    #[serde(default)]
    pub jumped: bool,
}

/// A reason the wizard cannot advance, shown inline to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blocker {
    pub blocker_type: BlockerType,
    /// Human-readable description
    pub description: String,
}

impl Blocker {
    pub fn new(blocker_type: BlockerType, description: impl Into<String>) -> Self {
        Self {
            blocker_type,
            description: description.into(),
        }
    }

    pub fn empty_selection() -> Self {
        Self::new(
            BlockerType::EmptySelection,
            "Please select any database object.",
        )
    }
}

/// Types of blockers with their specific data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum BlockerType {
    /// No object is selected
    EmptySelection,
    /// The privilege table has no rows
    NoGrantRows,
    /// Row has no grantee
    MissingGrantee { row: usize },
    /// Row has no checked privilege
    NoPrivileges { row: usize },
    /// Row grants a privilege the current selection does not offer
    StalePrivilege { row: usize, privilege: PrivilegeCode },
}

/// Statement preview shown on the Review stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewState {
    #[default]
    Absent,
    Pending {
        token: u64,
    },
    Ready(String),
    Failed(String),
}

impl PreviewState {
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Ready(sql) => Some(sql),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Submission progress.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ApplyState {
    #[default]
    Idle,
    InFlight {
        token: u64,
        /// Stage the submission was started from.
        from: WizardStage,
    },
    Failed(String),
    Completed,
}
