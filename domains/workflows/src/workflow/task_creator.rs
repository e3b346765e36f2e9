//! Task creator
//!
//! Maps an approved summary onto a Salesforce `Task` and submits it once.

use chrono::{NaiveDate, Utc};

use thread2task_crm::{CrmError, CrmService, TaskReceipt, TaskRecord};

use crate::domain::entities::SummaryResult;

pub const TASK_STATUS: &str = "Not Started";
pub const TASK_PRIORITY: &str = "Normal";

/// Build the task record for `summary`, dated `today`
pub fn build_task_record(
    summary: &SummaryResult,
    today: NaiveDate,
    who_id: Option<&str>,
) -> TaskRecord {
    TaskRecord {
        subject: format!("Meeting notes from {}", today.format("%Y-%m-%d")),
        status: TASK_STATUS.to_string(),
        priority: TASK_PRIORITY.to_string(),
        who_id: who_id.map(str::to_string),
        description: summary.text.clone(),
        activity_date: today,
    }
}

/// Create a task for `summary` dated today (UTC)
pub async fn create_task(
    crm: &dyn CrmService,
    summary: &SummaryResult,
    who_id: Option<&str>,
) -> Result<TaskReceipt, CrmError> {
    let record = build_task_record(summary, Utc::now().date_naive(), who_id);
    tracing::debug!(subject = %record.subject, "Submitting CRM task");

    match crm.create_task(record).await {
        Ok(receipt) => {
            tracing::info!(task_id = %receipt.id, "CRM task created");
            Ok(receipt)
        }
        Err(e) => {
            tracing::error!(error = %e, "CRM task creation failed");
            Err(e)
        }
    }
}
