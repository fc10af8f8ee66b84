//! GrantService trait
//!
//! Boundary between the wizard and the execution service that owns the
//! catalogs and runs the statements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capability::PrivilegeCapabilitySet;
use crate::error::Result;
use crate::object::DatabaseObject;
use crate::privilege::PrivilegeGrantRow;

/// Where in the object tree the wizard was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogScope {
    pub server_id: String,
    pub database_id: u64,
    pub node_id: u64,
    node_type: String,
}

impl CatalogScope {
    pub fn new(
        server_id: impl Into<String>,
        database_id: u64,
        node_id: u64,
        node_type: &str,
    ) -> Self {
        Self {
            server_id: server_id.into(),
            database_id,
            node_id,
            node_type: normalize_node_type(node_type),
        }
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }
}

/// Collection and materialized node types share the object listing of
/// their plain type: `coll-mview` lists as `mview`.
pub fn normalize_node_type(node_type: &str) -> String {
    node_type.replacen("coll-", "", 1).replacen("materialized_", "", 1)
}

/// Body of the preview and apply requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRequest {
    pub acl: Vec<PrivilegeGrantRow>,
    pub objects: Vec<DatabaseObject>,
}

#[async_trait]
pub trait GrantService: Send + Sync {
    /// Per-database mapping of object class to grantable privileges.
    async fn load_capability_catalog(&self, scope: &CatalogScope)
        -> Result<PrivilegeCapabilitySet>;

    /// Objects below the node the wizard was opened on.
    async fn load_object_catalog(&self, scope: &CatalogScope) -> Result<Vec<DatabaseObject>>;

    /// Statement text for the request. Read-only on the backing store.
    async fn preview_statements(&self, scope: &CatalogScope, request: &GrantRequest)
        -> Result<String>;

    /// Execute the statements. Failures carry the server's detail text in
    /// [`GrantWizardError::Apply`](crate::error::GrantWizardError::Apply).
    async fn apply_grants(&self, scope: &CatalogScope, request: &GrantRequest) -> Result<()>;
}
