//! Disbursement confirmation by the disbursement officer and receipt
//! confirmation by the applicant.

use careflow_core::application::{ReceiptConfirmation, MAX_COMMENT_LENGTH};
use careflow_core::disbursement::{confirm_disbursement, confirm_receipt};
use careflow_core::types::DbId;
use careflow_db::models::application::{ApplicationDetail, DisbursementStamp};
use careflow_db::repositories::ApplicationRepo;
use careflow_db::DbPool;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::Principal;
use crate::workflows::{load_detail, lock_application, persist_transition};

/// Body of `PUT /applications/{id}/disbursement-confirmation`.
#[derive(Debug, Deserialize, Validate)]
pub struct DisbursementConfirmationRequest {
    pub disbursement_confirmed: bool,
    #[validate(length(max = MAX_COMMENT_LENGTH, message = "disbursement_comment is too long"))]
    pub disbursement_comment: Option<String>,
}

/// Body of `PUT /applications/{id}/receipt-confirmation`.
#[derive(Debug, Deserialize, Validate)]
pub struct ReceiptConfirmationRequest {
    pub receipt_confirmation: ReceiptConfirmation,
}

/// Record (or retract) the release of funds.
pub async fn update_disbursement_confirmation(
    pool: &DbPool,
    principal: &Principal,
    application_id: DbId,
    input: DisbursementConfirmationRequest,
) -> AppResult<ApplicationDetail> {
    let mut tx = pool.begin().await?;
    let locked = lock_application(&mut *tx, application_id).await?;
    let current = locked.state()?;

    let transition = confirm_disbursement(
        &current,
        principal.role,
        input.disbursement_confirmed,
        input.disbursement_comment.clone(),
    )
    .map_err(|e| {
        tracing::warn!(
            application_id,
            user_id = principal.user_id,
            role = %principal.role,
            error = %e,
            "Disbursement confirmation refused"
        );
        e
    })?;

    persist_transition(&mut *tx, application_id, principal.user_id, &transition).await?;
    let application = ApplicationRepo::stamp_disbursement(
        &mut *tx,
        application_id,
        &DisbursementStamp {
            officer_id: principal.user_id,
            comment: input.disbursement_comment,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        application_id,
        officer_id = principal.user_id,
        confirmed = input.disbursement_confirmed,
        disbursement_status = ?application.disbursement_status,
        "Disbursement confirmation recorded"
    );

    load_detail(pool, application_id).await
}

/// Record the applicant's acknowledgement (or retraction) of received funds.
///
/// Repeating the same value is accepted and appends another audit entry.
pub async fn update_receipt_confirmation(
    pool: &DbPool,
    principal: &Principal,
    application_id: DbId,
    input: ReceiptConfirmationRequest,
) -> AppResult<ApplicationDetail> {
    let mut tx = pool.begin().await?;
    let locked = lock_application(&mut *tx, application_id).await?;
    let current = locked.state()?;

    let transition = confirm_receipt(&current, principal.user_id, input.receipt_confirmation)
        .map_err(|e| {
            tracing::warn!(
                application_id,
                user_id = principal.user_id,
                requested = input.receipt_confirmation.as_str(),
                error = %e,
                "Receipt confirmation refused"
            );
            e
        })?;

    let (application, log) =
        persist_transition(&mut *tx, application_id, principal.user_id, &transition).await?;
    tx.commit().await?;

    tracing::info!(
        application_id,
        user_id = principal.user_id,
        log_id = log.id,
        receipt_confirmation = %application.receipt_confirmation,
        disbursement_status = ?application.disbursement_status,
        status = %application.status,
        "Receipt confirmation recorded"
    );

    load_detail(pool, application_id).await
}
