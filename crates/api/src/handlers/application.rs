//! Handlers for the `/applications` resource.
//!
//! Reads are scoped by role; every state change is delegated to a workflow in
//! [`crate::workflows`] that runs inside one transaction.

use axum::extract::{Path, State};
use careflow_core::application::{can_view, ApplicationScope};
use careflow_core::error::CoreError;
use careflow_core::types::DbId;
use careflow_db::models::application::{Application, ApplicationDetail};
use careflow_db::models::approval_log::ApprovalLog;
use careflow_db::repositories::{ApplicationRepo, ApprovalLogRepo};

use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::middleware::auth::Principal;
use crate::middleware::rbac::RequireAdmin;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::workflows::approval::{self, StatusUpdateRequest, SubmitApplicationRequest};
use crate::workflows::disbursement::{
    self, DisbursementConfirmationRequest, ReceiptConfirmationRequest,
};
use crate::workflows::load_detail;

/// GET /api/v1/applications
///
/// Admin and claims see every application, approvers see the queue at their
/// level, everyone else sees their own.
pub async fn list_applications(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<ApiResponse<Vec<Application>>> {
    let applications = match ApplicationScope::for_principal(principal.role, principal.user_id) {
        ApplicationScope::All => ApplicationRepo::list_all(&state.pool).await?,
        ApplicationScope::Level(level) => ApplicationRepo::list_at_level(&state.pool, level).await?,
        ApplicationScope::Owner(user_id) => {
            ApplicationRepo::list_for_owner(&state.pool, user_id).await?
        }
    };
    Ok(ApiResponse::ok("Applications retrieved", applications))
}

/// GET /api/v1/applications/{id}
pub async fn get_application(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<ApplicationDetail>> {
    let detail = load_detail(&state.pool, id).await?;
    ensure_can_view(&principal, &detail.application)?;
    Ok(ApiResponse::ok("Application retrieved", detail))
}

/// GET /api/v1/applications/{id}/logs
pub async fn list_application_logs(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<Vec<ApprovalLog>>> {
    let application = ApplicationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Application",
            id,
        })?;
    ensure_can_view(&principal, &application)?;
    let logs = ApprovalLogRepo::list_for_application(&state.pool, id).await?;
    Ok(ApiResponse::ok("Approval logs retrieved", logs))
}

/// POST /api/v1/applications
pub async fn submit_application(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(input): ValidatedJson<SubmitApplicationRequest>,
) -> AppResult<ApiResponse<ApplicationDetail>> {
    let detail = approval::submit_application(&state.pool, &principal, input).await?;
    Ok(ApiResponse::created("Application submitted", detail))
}

/// POST /api/v1/applications/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<StatusUpdateRequest>,
) -> AppResult<ApiResponse<ApplicationDetail>> {
    let detail = approval::advance_application(&state.pool, &principal, id, input).await?;
    Ok(ApiResponse::ok("Application status updated", detail))
}

/// PUT /api/v1/applications/{id}/disbursement-confirmation
pub async fn update_disbursement_confirmation(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<DisbursementConfirmationRequest>,
) -> AppResult<ApiResponse<ApplicationDetail>> {
    let detail =
        disbursement::update_disbursement_confirmation(&state.pool, &principal, id, input).await?;
    Ok(ApiResponse::ok("Disbursement confirmation updated", detail))
}

/// PUT /api/v1/applications/{id}/receipt-confirmation
pub async fn update_receipt_confirmation(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<ReceiptConfirmationRequest>,
) -> AppResult<ApiResponse<ApplicationDetail>> {
    let detail =
        disbursement::update_receipt_confirmation(&state.pool, &principal, id, input).await?;
    Ok(ApiResponse::ok("Receipt confirmation updated", detail))
}

/// DELETE /api/v1/applications/{id}
///
/// Documents and approval logs go with the application (cascade).
pub async fn delete_application(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<()>> {
    if !ApplicationRepo::delete(&state.pool, id).await? {
        return Err(CoreError::NotFound {
            entity: "Application",
            id,
        }
        .into());
    }
    tracing::info!(application_id = id, admin_id = admin.user_id, "Application deleted");
    Ok(ApiResponse::ok("Application deleted", ()))
}

fn ensure_can_view(principal: &Principal, application: &Application) -> Result<(), CoreError> {
    if can_view(principal.role, principal.user_id, application.user_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "You do not have access to this application".to_string(),
        ))
    }
}
