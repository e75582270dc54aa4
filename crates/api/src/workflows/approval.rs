//! Application submission and the chair -> treasurer -> disbursement chain.

use careflow_core::application::{
    generate_reference, parse_amount, ApplicationType, DisbursementStatus, MAX_COMMENT_LENGTH,
};
use careflow_core::approval::{
    advance, ApprovalAction, ApprovalDecision, ApprovalLevel, FinancialFields,
};
use careflow_core::error::CoreError;
use careflow_core::types::DbId;
use careflow_db::models::application::{
    ApplicationDetail, CreateApplication, CreateApplicationDocument,
};
use careflow_db::repositories::{ApplicationDocumentRepo, ApplicationRepo};
use careflow_db::DbPool;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::Principal;
use crate::workflows::{load_detail, lock_application, persist_transition};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// A document reference uploaded out of band to the document store.
#[derive(Debug, Deserialize, Validate)]
pub struct DocumentInput {
    #[validate(length(min = 1, max = 255, message = "file_name is required"))]
    pub file_name: String,
    #[validate(length(min = 1, max = 1024, message = "file_path is required"))]
    pub file_path: String,
    #[validate(length(max = 255))]
    pub mime_type: Option<String>,
}

/// Body of `POST /applications`.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitApplicationRequest {
    pub application_type: ApplicationType,
    #[validate(length(max = MAX_COMMENT_LENGTH, message = "comment is too long"))]
    pub comment: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub documents: Vec<DocumentInput>,
}

/// Body of `POST /applications/{id}/status`.
///
/// `amount` is loosely typed: integers, floats and numeric strings are all
/// accepted and cast to an integer. The financial fields are only read when
/// the treasurer acts at the treasurer level; anywhere else they are ignored
/// unparsed.
#[derive(Debug, Deserialize, Validate)]
pub struct StatusUpdateRequest {
    pub action: ApprovalAction,
    #[validate(length(max = MAX_COMMENT_LENGTH, message = "comments are too long"))]
    pub comments: Option<String>,
    pub amount: Option<serde_json::Value>,
    #[validate(length(min = 1, max = 64, message = "cheque_number must be 1-64 characters"))]
    pub cheque_number: Option<String>,
    pub disbursement_status: Option<DisbursementStatus>,
}

impl StatusUpdateRequest {
    /// Convert into the typed decision. Financial fields are parsed only when
    /// `with_financials` is set and otherwise dropped.
    fn into_decision(
        self,
        with_financials: bool,
    ) -> Result<(ApprovalDecision, Option<String>), CoreError> {
        let decision = match self.action {
            ApprovalAction::Approved if with_financials => {
                let amount = match &self.amount {
                    None | Some(serde_json::Value::Null) => None,
                    Some(value) => Some(parse_amount(value)?),
                };
                ApprovalDecision::Approve {
                    financials: FinancialFields {
                        amount,
                        cheque_number: self.cheque_number,
                        disbursement_status: self.disbursement_status,
                    },
                }
            }
            ApprovalAction::Approved => ApprovalDecision::Approve {
                financials: FinancialFields::default(),
            },
            ApprovalAction::Rejected => ApprovalDecision::Reject,
            ApprovalAction::RequestedChanges => ApprovalDecision::RequestChanges,
        };
        Ok((decision, self.comments))
    }
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

/// Create an application at `pending@chair` together with its documents.
pub async fn submit_application(
    pool: &DbPool,
    principal: &Principal,
    input: SubmitApplicationRequest,
) -> AppResult<ApplicationDetail> {
    let mut tx = pool.begin().await?;

    let application = ApplicationRepo::create(
        &mut *tx,
        &CreateApplication {
            reference: generate_reference(chrono::Utc::now()),
            user_id: principal.user_id,
            application_type: input.application_type.as_str().to_string(),
            comment: input.comment,
        },
    )
    .await?;

    for doc in &input.documents {
        ApplicationDocumentRepo::create(
            &mut *tx,
            application.id,
            &CreateApplicationDocument {
                file_name: doc.file_name.clone(),
                file_path: doc.file_path.clone(),
                mime_type: doc.mime_type.clone(),
            },
        )
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        application_id = application.id,
        reference = %application.reference,
        user_id = principal.user_id,
        documents = input.documents.len(),
        "Application submitted"
    );

    load_detail(pool, application.id).await
}

/// Apply an approver decision to an application.
///
/// The role check and the transition are evaluated against the row-locked
/// snapshot, so of two concurrent approvers at most one can act on a level.
/// The request body is only interpreted against that snapshot too.
pub async fn advance_application(
    pool: &DbPool,
    principal: &Principal,
    application_id: DbId,
    input: StatusUpdateRequest,
) -> AppResult<ApplicationDetail> {
    let mut tx = pool.begin().await?;
    let locked = lock_application(&mut *tx, application_id).await?;
    let current = locked.state()?;

    let with_financials = current.level == ApprovalLevel::Treasurer
        && principal.role.approval_level() == Some(ApprovalLevel::Treasurer);
    let (decision, comments) = input.into_decision(with_financials)?;
    let action = decision.action();

    let transition = advance(&current, principal.role, decision, comments).map_err(|e| {
        tracing::warn!(
            application_id,
            user_id = principal.user_id,
            role = %principal.role,
            level = %current.level,
            status = %current.status,
            action = %action,
            error = %e,
            "Approval decision refused"
        );
        e
    })?;

    let (application, log) =
        persist_transition(&mut *tx, application_id, principal.user_id, &transition).await?;
    tx.commit().await?;

    tracing::info!(
        application_id,
        approver_id = principal.user_id,
        log_id = log.id,
        level = %transition.log.level,
        action = %action,
        status = %application.status,
        next_level = %application.current_approval_level,
        "Approval decision recorded"
    );

    load_detail(pool, application_id).await
}
