//! Grant wizard error model.
//!
//! Every externally caused failure maps to exactly one `GrantWizardError`
//! variant. Guard failures are not errors: they come back as
//! [`Blocker`](crate::state::Blocker) values inside a
//! [`StepOutcome`](crate::engine::StepOutcome).

/// Failures surfaced by the wizard and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum GrantWizardError {
    /// The capability catalog or object catalog could not be loaded.
    /// No partial catalog is ever accepted.
    #[error("Failed to load {what}: {reason}")]
    Load { what: String, reason: String },

    /// The statement preview request failed.
    #[error("Preview failed: {0}")]
    Preview(String),

    /// Submission failed; carries the server-provided detail text.
    #[error("Apply failed: {0}")]
    Apply(String),

    /// HTTP transport failure talking to the execution service.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The wizard was cancelled or has already completed.
    #[error("Grant wizard is closed")]
    Closed,

    /// A submission for this wizard is already in flight.
    #[error("A grant submission is already in progress")]
    ApplyInFlight,
}

impl GrantWizardError {
    pub fn load(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Load {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GrantWizardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GrantWizardError::load("capability catalog", "connection refused");
        assert_eq!(
            err.to_string(),
            "Failed to load capability catalog: connection refused"
        );
        assert_eq!(
            GrantWizardError::Apply("permission denied".into()).to_string(),
            "Apply failed: permission denied"
        );
    }
}
