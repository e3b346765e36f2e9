//! Salesforce REST Client Implementation
//!
//! POSTs `Task` records to
//! `{instance_url}/services/data/{api_version}/sobjects/Task`.

use serde::Deserialize;

use crate::{CrmConfig, CrmError, CrmService, TaskReceipt, TaskRecord};

/// sObject create response
#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiError>,
}

/// Salesforce error entry (returned as a JSON array on failure)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiError {
    #[serde(default)]
    error_code: Option<String>,
    message: String,
}

fn describe_errors(errors: &[ApiError]) -> String {
    errors
        .iter()
        .map(|e| match &e.error_code {
            Some(code) => format!("{}: {}", code, e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Salesforce REST API client
pub struct SalesforceClient {
    http: reqwest::Client,
    task_url: String,
    access_token: String,
}

impl SalesforceClient {
    pub fn new(config: CrmConfig) -> Self {
        let task_url = format!(
            "{}/services/data/{}/sobjects/Task",
            config.instance_url.trim_end_matches('/'),
            config.api_version
        );
        Self {
            http: reqwest::Client::new(),
            task_url,
            access_token: config.access_token,
        }
    }
}

#[async_trait::async_trait]
impl CrmService for SalesforceClient {
    async fn create_task(&self, task: TaskRecord) -> Result<TaskReceipt, CrmError> {
        let response = self
            .http
            .post(&self.task_url)
            .bearer_auth(&self.access_token)
            .json(&task)
            .send()
            .await
            .map_err(|e| CrmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read response body".to_string());
            let detail = serde_json::from_str::<Vec<ApiError>>(&body)
                .map(|errors| describe_errors(&errors))
                .unwrap_or(body);
            return Err(CrmError::Response(format!(
                "Salesforce API returned {}: {}",
                status, detail
            )));
        }

        let created: CreateResponse = response
            .json()
            .await
            .map_err(|e| CrmError::Response(format!("Failed to parse response: {}", e)))?;

        if !created.success {
            return Err(CrmError::Response(format!(
                "Salesforce rejected task: {}",
                describe_errors(&created.errors)
            )));
        }

        tracing::debug!(task_id = %created.id, "Salesforce task created");
        Ok(TaskReceipt { id: created.id })
    }
}
