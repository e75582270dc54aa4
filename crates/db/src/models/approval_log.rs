//! Approval audit trail models.

use careflow_core::approval::{ApprovalLevel, LogEntry};
use careflow_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `approval_logs` table. Rows are immutable once written.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApprovalLog {
    pub id: DbId,
    pub application_id: DbId,
    pub approver_id: DbId,
    pub approval_level: String,
    pub action: String,
    pub comments: Option<String>,
    pub created_at: Timestamp,
}

impl ApprovalLog {
    pub fn level(&self) -> Option<ApprovalLevel> {
        ApprovalLevel::from_str(&self.approval_level)
    }
}

/// DTO for appending an audit entry.
#[derive(Debug, Clone)]
pub struct CreateApprovalLog {
    pub application_id: DbId,
    pub approver_id: DbId,
    pub approval_level: String,
    pub action: String,
    pub comments: Option<String>,
}

impl CreateApprovalLog {
    /// Build the row for a domain log entry produced by a transition.
    pub fn from_entry(application_id: DbId, approver_id: DbId, entry: &LogEntry) -> Self {
        Self {
            application_id,
            approver_id,
            approval_level: entry.level.as_str().to_string(),
            action: entry.action.as_str().to_string(),
            comments: entry.comments.clone(),
        }
    }
}
