//! Wizard configuration
//!
//! Loads connection and scope settings from a YAML file or from
//! `GRANT_WIZARD_*` environment variables.

use serde::Deserialize;
use std::path::Path;
use url::Url;

use crate::error::{GrantWizardError, Result};
use crate::service::CatalogScope;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_node_type() -> String {
    "database".to_string()
}

/// Where the management server lives and which node the wizard targets.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WizardConfig {
    pub base_url: String,
    pub server_id: String,
    pub database_id: u64,
    /// Defaults to the database itself.
    #[serde(default)]
    pub node_id: Option<u64>,
    #[serde(default = "default_node_type")]
    pub node_type: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl WizardConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| GrantWizardError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| GrantWizardError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read `GRANT_WIZARD_URL`, `GRANT_WIZARD_SERVER_ID`,
    /// `GRANT_WIZARD_DATABASE_ID` and the optional `GRANT_WIZARD_NODE_ID`,
    /// `GRANT_WIZARD_NODE_TYPE`, `GRANT_WIZARD_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| GrantWizardError::Config(format!("{} must be set", key)))
        };
        let parse = |key: &str, value: String| {
            value
                .parse::<u64>()
                .map_err(|e| GrantWizardError::Config(format!("{}: {}", key, e)))
        };

        let config = Self {
            base_url: required("GRANT_WIZARD_URL")?,
            server_id: required("GRANT_WIZARD_SERVER_ID")?,
            database_id: parse(
                "GRANT_WIZARD_DATABASE_ID",
                required("GRANT_WIZARD_DATABASE_ID")?,
            )?,
            node_id: lookup("GRANT_WIZARD_NODE_ID")
                .map(|v| parse("GRANT_WIZARD_NODE_ID", v))
                .transpose()?,
            node_type: lookup("GRANT_WIZARD_NODE_TYPE").unwrap_or_else(default_node_type),
            timeout_secs: lookup("GRANT_WIZARD_TIMEOUT_SECS")
                .map(|v| parse("GRANT_WIZARD_TIMEOUT_SECS", v))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.server_id.trim().is_empty() {
            return Err(GrantWizardError::Config("server_id is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(GrantWizardError::Config("timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| GrantWizardError::Config(format!("base_url {}: {}", self.base_url, e)))
    }

    pub fn scope(&self) -> CatalogScope {
        CatalogScope::new(
            self.server_id.clone(),
            self.database_id,
            self.node_id.unwrap_or(self.database_id),
            &self.node_type,
        )
    }
}
