//! Grant Wizard Engine
//!
//! Owns the per-session state of one grant wizard: the loaded catalogs, the
//! object selection, the privilege rows and the current stage. Guards are
//! evaluated before every forward move; a failing guard is reported as
//! blockers, never as an error.
//!
//! Calls to the execution service follow a request/response shape: the
//! engine hands out a ticket carrying a token and the request body, and
//! accepts the response only while that token is still the current one.
//! Late responses for superseded requests are dropped. The `*_with` and
//! [`GrantWizard::finish`] drivers run that round trip against a
//! [`GrantService`] directly.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capability::{resolve, EffectivePrivilegeSet, PrivilegeCapabilitySet};
use crate::error::{GrantWizardError, Result};
use crate::events::{Notification, WizardEvent};
use crate::object::{DatabaseObject, ObjectId};
use crate::privilege::{GrantEditState, PrivilegeGrantRow};
use crate::selection::SelectionSet;
use crate::service::{CatalogScope, GrantRequest, GrantService};
use crate::state::{ApplyState, Blocker, PreviewState, StageTransition, WizardStage};

/// Shown by the host while [`GrantWizard::load`] is pending.
pub const LOADING_TEXT: &str = "Loading...";
pub const LOADING_SQL_TEXT: &str = "Loading SQL ...";
pub const SAVING_TEXT: &str = "Saving...";

const LOAD_FAILED: &str = "Error while fetching grant wizard data.";
const PREVIEW_FAILED: &str = "Error while fetching SQL.";
const STALE_ROWS: &str = "Some granted privileges are not available for the selected objects.";

/// A preview request the host must run and answer with
/// [`GrantWizard::complete_preview`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTicket {
    pub token: u64,
    pub request: GrantRequest,
}

/// A submission the host must run and answer with
/// [`GrantWizard::complete_apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyTicket {
    pub token: u64,
    pub request: GrantRequest,
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Moved {
        from: WizardStage,
        to: WizardStage,
        /// Issued when the move entered Review.
        preview: Option<PreviewTicket>,
    },
    Blocked(Vec<Blocker>),
    /// Already at the first or last stage.
    Unchanged,
}

/// Result of starting a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyStart {
    Blocked(Vec<Blocker>),
    Submit(ApplyTicket),
}

/// Result of [`GrantWizard::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    Blocked(Vec<Blocker>),
    Completed,
}

/// One grant wizard session.
pub struct GrantWizard {
    session_id: Uuid,
    scope: CatalogScope,
    catalog: PrivilegeCapabilitySet,
    objects: Vec<Arc<DatabaseObject>>,

    stage: WizardStage,
    selection: SelectionSet,
    effective: EffectivePrivilegeSet,
    edits: GrantEditState,

    preview: PreviewState,
    apply: ApplyState,
    next_token: u64,

    /// Inline message for the current stage.
    message: Option<Blocker>,
    history: Vec<StageTransition>,
    events: UnboundedSender<WizardEvent>,
    finished: bool,
}

impl GrantWizard {
    /// Create a wizard over already loaded catalogs.
    pub fn new(
        scope: CatalogScope,
        catalog: PrivilegeCapabilitySet,
        objects: Vec<DatabaseObject>,
        events: UnboundedSender<WizardEvent>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            scope,
            catalog,
            objects: objects.into_iter().map(Arc::new).collect(),
            stage: WizardStage::SelectObjects,
            selection: SelectionSet::new(),
            effective: EffectivePrivilegeSet::default(),
            edits: GrantEditState::new(),
            preview: PreviewState::Absent,
            apply: ApplyState::Idle,
            next_token: 0,
            message: None,
            history: Vec::new(),
            events,
            finished: false,
        }
    }

    /// Load both catalogs and start a wizard. Both loads must succeed;
    /// a partial catalog is never accepted.
    pub async fn load<S>(
        service: &S,
        scope: CatalogScope,
        events: UnboundedSender<WizardEvent>,
    ) -> Result<Self>
    where
        S: GrantService + ?Sized,
    {
        info!(
            server_id = %scope.server_id,
            database_id = scope.database_id,
            node_id = scope.node_id,
            node_type = scope.node_type(),
            "Loading grant wizard catalogs"
        );

        let loaded = tokio::try_join!(
            service.load_capability_catalog(&scope),
            service.load_object_catalog(&scope),
        );

        match loaded {
            Ok((catalog, objects)) => {
                info!(objects = objects.len(), "Grant wizard catalogs loaded");
                Ok(Self::new(scope, catalog, objects, events))
            }
            Err(e) => {
                warn!(error = %e, "Grant wizard catalog load failed");
                if events.send(WizardEvent::Notify(Notification::error(LOAD_FAILED))).is_err() {
                    debug!("Event receiver dropped");
                }
                Err(e)
            }
        }
    }

    // ─── Accessors ────────────────────────────────────────────

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn scope(&self) -> &CatalogScope {
        &self.scope
    }

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    pub fn objects(&self) -> &[Arc<DatabaseObject>] {
        &self.objects
    }

    /// Loaded objects whose label matches `query`.
    pub fn search(&self, query: &str) -> Vec<&Arc<DatabaseObject>> {
        self.objects
            .iter()
            .filter(|obj| obj.matches_search(query))
            .collect()
    }

    pub fn capability_catalog(&self) -> &PrivilegeCapabilitySet {
        &self.catalog
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Privileges the editing surface may offer.
    pub fn effective_privileges(&self) -> &EffectivePrivilegeSet {
        &self.effective
    }

    pub fn edits(&self) -> &GrantEditState {
        &self.edits
    }

    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    pub fn apply_state(&self) -> &ApplyState {
        &self.apply
    }

    pub fn message(&self) -> Option<&Blocker> {
        self.message.as_ref()
    }

    pub fn history(&self) -> &[StageTransition] {
        &self.history
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Loading indicator text, if a request is outstanding.
    pub fn loader_text(&self) -> Option<&'static str> {
        if matches!(self.apply, ApplyState::InFlight { .. }) {
            Some(SAVING_TEXT)
        } else if self.stage == WizardStage::Review && self.preview.is_pending() {
            Some(LOADING_SQL_TEXT)
        } else {
            None
        }
    }

    /// The body sent to preview and apply.
    pub fn request(&self) -> GrantRequest {
        GrantRequest {
            acl: self.edits.rows().to_vec(),
            objects: self.selection.to_objects(),
        }
    }

    // ─── Editing ──────────────────────────────────────────────

    /// Replace the whole selection.
    pub fn set_selection(&mut self, objects: Vec<Arc<DatabaseObject>>) -> Result<()> {
        self.ensure_editable()?;

        self.selection = SelectionSet::from_objects(objects);
        let effective = resolve(&self.selection, &self.catalog);
        if effective != self.effective {
            self.effective = effective;
            let stale = self.edits.stale_privileges(&self.effective).count();
            if stale > 0 {
                info!(stale, "Privilege rows reference privileges no longer offered");
                self.emit(WizardEvent::Notify(Notification::info(STALE_ROWS)));
            }
        }
        debug!(
            selected = self.selection.len(),
            privileges = self.effective.len(),
            "Selection replaced"
        );

        self.message = self
            .selection
            .is_empty()
            .then(Blocker::empty_selection);
        self.invalidate_preview();
        Ok(())
    }

    /// Replace the selection by id, resolved against the loaded objects.
    /// Unknown ids are ignored.
    pub fn select_ids(&mut self, ids: &[ObjectId]) -> Result<()> {
        let objects = ids
            .iter()
            .filter_map(|id| {
                let found = self.objects.iter().find(|obj| obj.id == *id).cloned();
                if found.is_none() {
                    debug!(%id, "Ignoring unknown object id");
                }
                found
            })
            .collect();
        self.set_selection(objects)
    }

    /// Replace the privilege rows.
    pub fn set_rows(&mut self, rows: Vec<PrivilegeGrantRow>) -> Result<()> {
        self.ensure_editable()?;
        self.edits.set_rows(rows);
        if self.stage == WizardStage::EditPrivileges {
            self.message = None;
        }
        self.invalidate_preview();
        Ok(())
    }

    pub fn dismiss_message(&mut self) {
        self.message = None;
    }

    // ─── Guards ───────────────────────────────────────────────

    /// Why the wizard cannot advance past `stage`. Empty when it can.
    pub fn stage_blockers(&self, stage: WizardStage) -> Vec<Blocker> {
        match stage {
            WizardStage::SelectObjects if self.selection.is_empty() => {
                vec![Blocker::empty_selection()]
            }
            WizardStage::SelectObjects => Vec::new(),
            WizardStage::EditPrivileges => self.edits.blockers(&self.effective),
            WizardStage::Review => Vec::new(),
        }
    }

    pub fn can_advance(&self) -> bool {
        self.stage.next().is_some() && self.stage_blockers(self.stage).is_empty()
    }

    // ─── Navigation ───────────────────────────────────────────

    /// Advance one stage. Entering Review issues exactly one preview ticket.
    pub fn next(&mut self) -> Result<StepOutcome> {
        self.ensure_editable()?;
        let Some(to) = self.stage.next() else {
            return Ok(StepOutcome::Unchanged);
        };

        let blockers = self.stage_blockers(self.stage);
        if !blockers.is_empty() {
            debug!(stage = %self.stage, blockers = blockers.len(), "Advance blocked");
            self.message = blockers.first().cloned();
            return Ok(StepOutcome::Blocked(blockers));
        }

        let from = self.move_to(to, false);
        let preview = (to == WizardStage::Review).then(|| self.begin_preview());
        Ok(StepOutcome::Moved { from, to, preview })
    }

    /// Go back one stage. Always permitted.
    pub fn back(&mut self) -> Result<StepOutcome> {
        self.ensure_editable()?;
        let Some(to) = self.stage.previous() else {
            return Ok(StepOutcome::Unchanged);
        };
        let from = self.move_to(to, false);
        if from == WizardStage::Review {
            self.invalidate_preview();
        }
        Ok(StepOutcome::Moved {
            from,
            to,
            preview: None,
        })
    }

    fn move_to(&mut self, to: WizardStage, jumped: bool) -> WizardStage {
        let from = std::mem::replace(&mut self.stage, to);
        self.history.push(StageTransition {
            from,
            to,
            transitioned_at: Utc::now(),
            jumped,
        });
        self.message = None;
        info!(session_id = %self.session_id, %from, %to, "Grant wizard stage changed");
        self.emit(WizardEvent::StageChanged { from, to });
        from
    }

    // ─── Preview ──────────────────────────────────────────────

    fn issue_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn begin_preview(&mut self) -> PreviewTicket {
        let token = self.issue_token();
        self.preview = PreviewState::Pending { token };
        debug!(token, "Preview requested");
        PreviewTicket {
            token,
            request: self.request(),
        }
    }

    /// Any edit makes the outstanding preview stale.
    fn invalidate_preview(&mut self) {
        if self.preview != PreviewState::Absent {
            debug!("Preview invalidated");
            self.preview = PreviewState::Absent;
        }
    }

    /// Re-request the preview while on Review.
    pub fn retry_preview(&mut self) -> Result<Option<PreviewTicket>> {
        self.ensure_editable()?;
        if self.stage != WizardStage::Review {
            return Ok(None);
        }
        Ok(Some(self.begin_preview()))
    }

    /// Deliver a preview response. Returns false if the ticket was
    /// superseded and the response was dropped.
    pub fn complete_preview(&mut self, token: u64, result: Result<String>) -> bool {
        if self.stage != WizardStage::Review || self.preview != (PreviewState::Pending { token }) {
            debug!(token, "Discarding stale preview response");
            return false;
        }

        match result {
            Ok(sql) => {
                self.preview = PreviewState::Ready(sql);
                self.emit(WizardEvent::PreviewReady { token });
            }
            Err(e) => {
                warn!(token, error = %e, "Preview request failed");
                self.preview = PreviewState::Failed(e.to_string());
                self.emit(WizardEvent::Notify(Notification::error(PREVIEW_FAILED)));
            }
        }
        true
    }

    // ─── Submission ───────────────────────────────────────────

    /// Start a submission. Every forward guard must pass, since rows may
    /// have been edited after Review was entered. From an earlier stage the
    /// wizard then jumps straight to Review without a preview; a failed
    /// submission returns it to the stage it started from.
    pub fn begin_apply(&mut self) -> Result<ApplyStart> {
        self.ensure_editable()?;

        let blockers: Vec<Blocker> = WizardStage::ALL
            .iter()
            .flat_map(|stage| self.stage_blockers(*stage))
            .collect();
        if !blockers.is_empty() {
            self.message = blockers.first().cloned();
            return Ok(ApplyStart::Blocked(blockers));
        }

        let from = self.stage;
        if from != WizardStage::Review {
            self.move_to(WizardStage::Review, true);
        }

        let token = self.issue_token();
        self.apply = ApplyState::InFlight { token, from };
        info!(
            session_id = %self.session_id,
            objects = self.selection.len(),
            rows = self.edits.rows().len(),
            "Submitting grants"
        );
        Ok(ApplyStart::Submit(ApplyTicket {
            token,
            request: self.request(),
        }))
    }

    /// Deliver the submission response. On failure the stage, selection and
    /// rows are as they were before the submission and the error is handed
    /// back.
    pub fn complete_apply(&mut self, token: u64, result: Result<()>) -> Result<()> {
        let from = match self.apply {
            ApplyState::InFlight { token: current, from } if current == token => from,
            _ => {
                warn!(token, "Discarding apply response for unknown submission");
                return Ok(());
            }
        };

        match result {
            Ok(()) => {
                self.apply = ApplyState::Completed;
                self.finished = true;
                info!(session_id = %self.session_id, "Grants applied");
                self.emit(WizardEvent::Completed {
                    session_id: self.session_id,
                });
                Ok(())
            }
            Err(e) => {
                let detail = match &e {
                    GrantWizardError::Apply(detail) => detail.clone(),
                    other => other.to_string(),
                };
                warn!(error = %detail, "Grant submission failed");
                self.apply = ApplyState::Failed(detail.clone());
                if self.stage != from {
                    self.move_to(from, true);
                }
                self.emit(WizardEvent::Notify(Notification::error(format!(
                    "Error while saving grant wizard data: {}",
                    detail
                ))));
                Err(e)
            }
        }
    }

    // ─── Service drivers ──────────────────────────────────────

    /// [`next`](Self::next), then run the preview if one was issued.
    pub async fn next_with<S>(&mut self, service: &S) -> Result<StepOutcome>
    where
        S: GrantService + ?Sized,
    {
        let outcome = self.next()?;
        if let StepOutcome::Moved {
            preview: Some(ticket),
            ..
        } = &outcome
        {
            self.run_preview(service, ticket.clone()).await;
        }
        Ok(outcome)
    }

    /// [`retry_preview`](Self::retry_preview) and run it.
    pub async fn retry_preview_with<S>(&mut self, service: &S) -> Result<()>
    where
        S: GrantService + ?Sized,
    {
        if let Some(ticket) = self.retry_preview()? {
            self.run_preview(service, ticket).await;
        }
        Ok(())
    }

    async fn run_preview<S>(&mut self, service: &S, ticket: PreviewTicket)
    where
        S: GrantService + ?Sized,
    {
        let result = service.preview_statements(&self.scope, &ticket.request).await;
        self.complete_preview(ticket.token, result);
    }

    /// Submit once. A failure leaves the wizard open for correction and
    /// retry; nothing is retried automatically.
    pub async fn finish<S>(&mut self, service: &S) -> Result<FinishOutcome>
    where
        S: GrantService + ?Sized,
    {
        match self.begin_apply()? {
            ApplyStart::Blocked(blockers) => Ok(FinishOutcome::Blocked(blockers)),
            ApplyStart::Submit(ticket) => {
                let result = service.apply_grants(&self.scope, &ticket.request).await;
                self.complete_apply(ticket.token, result)?;
                Ok(FinishOutcome::Completed)
            }
        }
    }

    /// Abandon the wizard and discard all state.
    pub fn cancel(self) {
        info!(session_id = %self.session_id, stage = %self.stage, "Grant wizard closed");
        self.emit(WizardEvent::Closed {
            session_id: self.session_id,
        });
    }

    // ─── Internals ────────────────────────────────────────────

    fn ensure_editable(&self) -> Result<()> {
        if self.finished {
            return Err(GrantWizardError::Closed);
        }
        if matches!(self.apply, ApplyState::InFlight { .. }) {
            return Err(GrantWizardError::ApplyInFlight);
        }
        Ok(())
    }

    fn emit(&self, event: WizardEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}
