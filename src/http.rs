//! HTTP GrantService
//!
//! Talks to the grant wizard REST endpoints of the management server.
//! Failure bodies carry `{ "errormsg": "..." }`, which is surfaced verbatim
//! on apply.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::capability::PrivilegeCapabilitySet;
use crate::config::WizardConfig;
use crate::error::{GrantWizardError, Result};
use crate::object::DatabaseObject;
use crate::service::{CatalogScope, GrantRequest, GrantService};

#[derive(Debug, Deserialize)]
struct ObjectListResponse {
    result: Vec<DatabaseObject>,
}

#[derive(Debug, Deserialize)]
struct SqlResponse {
    data: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    errormsg: String,
}

pub struct HttpGrantService {
    client: Client,
    base_url: Url,
}

impl HttpGrantService {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &WizardConfig) -> Result<Self> {
        Self::new(
            config.base_url()?,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// `<base>/grant_wizard/<segments...>/`
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GrantWizardError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .push("grant_wizard")
            .extend(segments)
            .push("");
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, String> {
        debug!(%url, "GET");
        let response = self.client.get(url).send().await.map_err(|e| e.to_string())?;
        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| e.to_string())
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &GrantRequest,
    ) -> std::result::Result<T, String> {
        debug!(%url, objects = body.objects.len(), rows = body.acl.len(), "POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| e.to_string())
    }
}

/// Turn a non-success status into the server's `errormsg`, or the raw body.
async fn check_status(response: Response) -> std::result::Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.errormsg)
        .unwrap_or_else(|_| format!("{}: {}", status, text));
    warn!(%status, %message, "Grant wizard request failed");
    Err(message)
}

#[async_trait]
impl GrantService for HttpGrantService {
    async fn load_capability_catalog(
        &self,
        scope: &CatalogScope,
    ) -> Result<PrivilegeCapabilitySet> {
        let url = self.endpoint(&["acl", scope.server_id.as_str(), &scope.database_id.to_string()])?;
        self.get_json(url)
            .await
            .map_err(|e| GrantWizardError::load("capability catalog", e))
    }

    async fn load_object_catalog(&self, scope: &CatalogScope) -> Result<Vec<DatabaseObject>> {
        let url = self.endpoint(&[
            scope.server_id.as_str(),
            &scope.database_id.to_string(),
            &scope.node_id.to_string(),
            scope.node_type(),
        ])?;
        self.get_json::<ObjectListResponse>(url)
            .await
            .map(|body| body.result)
            .map_err(|e| GrantWizardError::load("object catalog", e))
    }

    async fn preview_statements(
        &self,
        scope: &CatalogScope,
        request: &GrantRequest,
    ) -> Result<String> {
        let url = self.endpoint(&["sql", scope.server_id.as_str(), &scope.database_id.to_string()])?;
        self.post_json::<SqlResponse>(url, request)
            .await
            .map(|body| body.data)
            .map_err(GrantWizardError::Preview)
    }

    async fn apply_grants(&self, scope: &CatalogScope, request: &GrantRequest) -> Result<()> {
        let url = self.endpoint(&["save", scope.server_id.as_str(), &scope.database_id.to_string()])?;
        self.post_json::<serde_json::Value>(url, request)
            .await
            .map(|_| ())
            .map_err(GrantWizardError::Apply)
    }
}
