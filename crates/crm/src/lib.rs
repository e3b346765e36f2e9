//! thread2task CRM Service
//!
//! Provides task creation in the CRM with support for:
//! - Salesforce REST API (`sobjects/Task`) for production
//! - Mock CRM service for testing and development
//! - Configurable instance URL, API version, and bearer token

pub mod mock;
pub mod salesforce;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SFDC_API_VERSION: &str = "v60.0";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrmError {
    #[error("CRM configuration error: {0}")]
    Configuration(String),

    #[error("CRM request error: {0}")]
    Request(String),

    #[error("CRM response error: {0}")]
    Response(String),
}

/// A Salesforce `Task` sObject as submitted for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskRecord {
    pub subject: String,
    pub status: String,
    pub priority: String,
    /// Contact/lead the task is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub who_id: Option<String>,
    pub description: String,
    /// Due date, serialized as `YYYY-MM-DD`
    pub activity_date: NaiveDate,
}

/// Identifier of the created CRM record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReceipt {
    pub id: String,
}

/// CRM service configuration
#[derive(Clone)]
pub struct CrmConfig {
    /// CRM provider (salesforce, mock)
    pub provider: String,
    /// Instance base URL, e.g. `https://example.my.salesforce.com`
    pub instance_url: String,
    pub api_version: String,
    /// Bearer access token
    pub access_token: String,
}

impl std::fmt::Debug for CrmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrmConfig")
            .field("provider", &self.provider)
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl CrmConfig {
    /// Create CRM config from environment variables
    pub fn from_env() -> Result<Self, CrmError> {
        dotenvy::dotenv().ok();

        let config = Self {
            provider: std::env::var("CRM_PROVIDER").unwrap_or_else(|_| "mock".to_string()),
            instance_url: std::env::var("SFDC_INSTANCE_URL").unwrap_or_default(),
            api_version: std::env::var("SFDC_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_SFDC_API_VERSION.to_string()),
            access_token: std::env::var("SFDC_TOKEN").unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CrmError> {
        if self.provider != "salesforce" {
            return Ok(());
        }
        if self.access_token.is_empty() {
            return Err(CrmError::Configuration(
                "SFDC_TOKEN is required for Salesforce provider".to_string(),
            ));
        }
        if self.instance_url.is_empty() {
            return Err(CrmError::Configuration(
                "SFDC_INSTANCE_URL is required for Salesforce provider".to_string(),
            ));
        }
        Ok(())
    }
}

/// CRM service trait for different backends
#[async_trait::async_trait]
pub trait CrmService: Send + Sync {
    /// Create a task record. Not retried.
    async fn create_task(&self, task: TaskRecord) -> Result<TaskReceipt, CrmError>;
}

/// Factory for creating CrmService implementations
pub struct CrmServiceFactory;

impl CrmServiceFactory {
    pub fn create(config: CrmConfig) -> Result<Box<dyn CrmService>, CrmError> {
        match config.provider.as_str() {
            "salesforce" => {
                tracing::info!(instance_url = %config.instance_url, "Creating Salesforce CRM service");
                config.validate()?;
                Ok(Box::new(salesforce::SalesforceClient::new(config)))
            }
            "mock" => {
                tracing::info!("Creating mock CRM service");
                Ok(Box::new(mock::MockCrmService::new()))
            }
            provider => Err(CrmError::Configuration(format!(
                "Unknown CRM provider: {}. Supported providers: salesforce, mock",
                provider
            ))),
        }
    }
}
