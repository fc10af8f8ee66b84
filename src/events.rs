//! Wizard Events
//!
//! Everything the wizard tells its hosting shell: stage changes, preview
//! readiness, completion and closing, plus operator notifications.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::WizardStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A message for the operator's notification area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }
}

/// Events sent from the wizard to its hosting shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardEvent {
    Notify(Notification),
    StageChanged {
        from: WizardStage,
        to: WizardStage,
    },
    PreviewReady {
        token: u64,
    },
    /// Fired once, after the grants were applied successfully.
    Completed {
        session_id: Uuid,
    },
    /// The operator abandoned the wizard; all state was discarded.
    Closed {
        session_id: Uuid,
    },
}
