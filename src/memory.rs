//! In-process GrantService.
//!
//! Serves a fixed capability catalog and object list, renders previews
//! locally and records every request. Failures can be injected per call so
//! the wizard's error paths can be driven without a server.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::capability::PrivilegeCapabilitySet;
use crate::error::{GrantWizardError, Result};
use crate::object::DatabaseObject;
use crate::service::{CatalogScope, GrantRequest, GrantService};
use crate::sql::render_grants;

#[derive(Debug, Default)]
struct Inner {
    fail_catalog: Option<String>,
    fail_objects: Option<String>,
    fail_preview: Option<String>,
    fail_apply: Option<String>,
    preview_requests: Vec<GrantRequest>,
    apply_requests: Vec<GrantRequest>,
    applied: Vec<GrantRequest>,
}

/// GrantService backed by memory.
#[derive(Debug)]
pub struct MemoryGrantService {
    catalog: PrivilegeCapabilitySet,
    objects: Vec<DatabaseObject>,
    inner: Mutex<Inner>,
}

impl MemoryGrantService {
    pub fn new(catalog: PrivilegeCapabilitySet, objects: Vec<DatabaseObject>) -> Self {
        Self {
            catalog,
            objects,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub async fn fail_capability_catalog(&self, reason: impl Into<String>) {
        self.inner.lock().await.fail_catalog = Some(reason.into());
    }

    pub async fn fail_object_catalog(&self, reason: impl Into<String>) {
        self.inner.lock().await.fail_objects = Some(reason.into());
    }

    /// Fail previews until cleared with `None`.
    pub async fn set_preview_failure(&self, reason: Option<String>) {
        self.inner.lock().await.fail_preview = reason;
    }

    /// Fail applies until cleared with `None`.
    pub async fn set_apply_failure(&self, reason: Option<String>) {
        self.inner.lock().await.fail_apply = reason;
    }

    pub async fn preview_requests(&self) -> Vec<GrantRequest> {
        self.inner.lock().await.preview_requests.clone()
    }

    pub async fn apply_requests(&self) -> Vec<GrantRequest> {
        self.inner.lock().await.apply_requests.clone()
    }

    /// Requests that were applied successfully.
    pub async fn applied(&self) -> Vec<GrantRequest> {
        self.inner.lock().await.applied.clone()
    }
}

#[async_trait]
impl GrantService for MemoryGrantService {
    async fn load_capability_catalog(
        &self,
        scope: &CatalogScope,
    ) -> Result<PrivilegeCapabilitySet> {
        debug!(server_id = %scope.server_id, database_id = scope.database_id, "Serving capability catalog");
        match &self.inner.lock().await.fail_catalog {
            Some(reason) => Err(GrantWizardError::load("capability catalog", reason)),
            None => Ok(self.catalog.clone()),
        }
    }

    async fn load_object_catalog(&self, scope: &CatalogScope) -> Result<Vec<DatabaseObject>> {
        debug!(node_id = scope.node_id, node_type = scope.node_type(), "Serving object catalog");
        match &self.inner.lock().await.fail_objects {
            Some(reason) => Err(GrantWizardError::load("object catalog", reason)),
            None => Ok(self.objects.clone()),
        }
    }

    async fn preview_statements(
        &self,
        _scope: &CatalogScope,
        request: &GrantRequest,
    ) -> Result<String> {
        let mut inner = self.inner.lock().await;
        inner.preview_requests.push(request.clone());
        match &inner.fail_preview {
            Some(reason) => Err(GrantWizardError::Preview(reason.clone())),
            None => Ok(render_grants(request)),
        }
    }

    async fn apply_grants(&self, _scope: &CatalogScope, request: &GrantRequest) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.apply_requests.push(request.clone());
        if let Some(reason) = &inner.fail_apply {
            return Err(GrantWizardError::Apply(reason.clone()));
        }
        inner.applied.push(request.clone());
        Ok(())
    }
}
