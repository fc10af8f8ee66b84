//! Grant Wizard
//!
//! Workflow engine for granting privileges on database objects. An operator
//! selects objects, edits a grantee→privilege table constrained to what the
//! selection allows, reviews the generated statements and submits them to
//! the execution service.
//!
//! ```text
//! SelectionSet ──resolve──▶ EffectivePrivilegeSet ──constrains──▶ GrantEditState
//!        │                                                          │
//!        └──────────────▶ GrantWizard guards ◀──────────────────────┘
//!                              │
//!              Review ──▶ GrantService::preview_statements
//!              finish ──▶ GrantService::apply_grants
//! ```

pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod http;
pub mod memory;
pub mod object;
pub mod privilege;
pub mod selection;
pub mod service;
pub mod sql;
pub mod state;

pub use capability::{resolve, EffectivePrivilegeSet, PrivilegeCapabilitySet, PrivilegeCode};
pub use config::WizardConfig;
pub use engine::{ApplyStart, ApplyTicket, FinishOutcome, GrantWizard, PreviewTicket, StepOutcome};
pub use error::{GrantWizardError, Result};
pub use events::{Notification, NotificationLevel, WizardEvent};
pub use http::HttpGrantService;
pub use memory::MemoryGrantService;
pub use object::{DatabaseObject, NormalizedObjectClass, ObjectId, ObjectType};
pub use privilege::{GrantEditState, PrivilegeEntry, PrivilegeGrantRow};
pub use selection::SelectionSet;
pub use service::{CatalogScope, GrantRequest, GrantService};
pub use state::{ApplyState, Blocker, BlockerType, PreviewState, StageTransition, WizardStage};
