//! Staff application models and DTOs.

use careflow_core::application::{ApplicationStatus, DisbursementStatus, ReceiptConfirmation};
use careflow_core::approval::{ApplicationState, ApprovalLevel};
use careflow_core::error::CoreError;
use careflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::approval_log::ApprovalLog;

/// A row from the `applications` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Application {
    pub id: DbId,
    pub reference: String,
    pub user_id: DbId,
    pub application_type: String,
    pub comment: Option<String>,
    pub status: String,
    pub current_approval_level: String,
    pub amount: Option<i64>,
    pub cheque_number: Option<String>,
    pub disbursement_status: Option<String>,
    pub disbursement_confirmed: bool,
    pub disbursement_confirmed_at: Option<Timestamp>,
    pub disbursement_confirmed_by: Option<DbId>,
    pub disbursement_comment: Option<String>,
    pub receipt_confirmation: String,
    pub approval_history: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Application {
    /// Parse the rule-relevant columns into a domain snapshot.
    ///
    /// The columns are CHECK-constrained, so a parse failure means the row was
    /// written outside this service and is reported as an internal error.
    pub fn state(&self) -> Result<ApplicationState, CoreError> {
        let corrupt = |column: &str, value: &str| {
            CoreError::Internal(format!(
                "application {} has unrecognised {column} '{value}'",
                self.id
            ))
        };

        let disbursement_status = match &self.disbursement_status {
            Some(s) => Some(
                DisbursementStatus::from_str(s).ok_or_else(|| corrupt("disbursement_status", s))?,
            ),
            None => None,
        };

        Ok(ApplicationState {
            owner_id: self.user_id,
            status: ApplicationStatus::from_str(&self.status)
                .ok_or_else(|| corrupt("status", &self.status))?,
            level: ApprovalLevel::from_str(&self.current_approval_level)
                .ok_or_else(|| corrupt("current_approval_level", &self.current_approval_level))?,
            amount: self.amount,
            cheque_number: self.cheque_number.clone(),
            disbursement_status,
            disbursement_confirmed: self.disbursement_confirmed,
            receipt_confirmation: ReceiptConfirmation::from_str(&self.receipt_confirmation)
                .ok_or_else(|| corrupt("receipt_confirmation", &self.receipt_confirmation))?,
        })
    }
}

/// A row from the `application_documents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApplicationDocument {
    pub id: DbId,
    pub application_id: DbId,
    pub file_name: String,
    pub file_path: String,
    pub mime_type: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for inserting a new application.
#[derive(Debug, Clone)]
pub struct CreateApplication {
    pub reference: String,
    pub user_id: DbId,
    pub application_type: String,
    pub comment: Option<String>,
}

/// DTO for attaching a document reference to an application.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApplicationDocument {
    pub file_name: String,
    pub file_path: String,
    pub mime_type: Option<String>,
}

/// Disbursement officer's stamp written alongside a disbursement transition.
#[derive(Debug, Clone)]
pub struct DisbursementStamp {
    pub officer_id: DbId,
    pub comment: Option<String>,
}

/// An application with its documents and ordered audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    #[serde(flatten)]
    pub application: Application,
    pub documents: Vec<ApplicationDocument>,
    pub approval_logs: Vec<ApprovalLog>,
}
