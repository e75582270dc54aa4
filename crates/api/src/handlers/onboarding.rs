//! Handlers for the `/onboardings` resource and `/users/{id}/onboarding`.
//!
//! Every path resolves the caller's onboarding scope first; records outside
//! it are reported as not found.

use axum::extract::{Path, State};
use careflow_core::types::DbId;
use careflow_db::models::onboarding::Onboarding;

use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::middleware::auth::Principal;
use crate::middleware::rbac::RequireAdmin;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::workflows::onboarding_activation::{
    self as activation, CreateOnboardingRequest, UpdateOnboardingRequest,
};

/// GET /api/v1/onboardings
pub async fn list_onboardings(
    State(state): State<AppState>,
    principal: Principal,
) -> AppResult<ApiResponse<Vec<Onboarding>>> {
    let onboardings = activation::list_visible(&state.pool, &principal).await?;
    Ok(ApiResponse::ok("Onboardings retrieved", onboardings))
}

/// GET /api/v1/onboardings/{id}
pub async fn get_onboarding(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<Onboarding>> {
    let onboarding = activation::find_visible(&state.pool, &principal, id).await?;
    Ok(ApiResponse::ok("Onboarding retrieved", onboarding))
}

/// GET /api/v1/users/{user_id}/onboarding
pub async fn get_user_onboarding(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<DbId>,
) -> AppResult<ApiResponse<Onboarding>> {
    let onboarding = activation::find_for_user(&state.pool, &principal, user_id).await?;
    Ok(ApiResponse::ok("Onboarding retrieved", onboarding))
}

/// POST /api/v1/onboardings
///
/// Rejected with 400 `payment_verification_failed` unless the claimed payment
/// verifies; nothing is written in that case.
pub async fn create_onboarding(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(input): ValidatedJson<CreateOnboardingRequest>,
) -> AppResult<ApiResponse<Onboarding>> {
    let onboarding = activation::create_onboarding(&state.pool, &principal, input).await?;
    Ok(ApiResponse::created("Onboarding created", onboarding))
}

/// PUT /api/v1/onboardings/{id}
pub async fn update_onboarding(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<UpdateOnboardingRequest>,
) -> AppResult<ApiResponse<Onboarding>> {
    let onboarding = activation::update_onboarding(&state.pool, &principal, id, input).await?;
    Ok(ApiResponse::ok("Onboarding updated", onboarding))
}

/// POST /api/v1/onboardings/{id}/complete
pub async fn complete_onboarding(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<Onboarding>> {
    let onboarding = activation::complete_onboarding(&state.pool, &principal, id).await?;
    Ok(ApiResponse::ok("Onboarding payment completed", onboarding))
}

/// DELETE /api/v1/onboardings/{id}
pub async fn delete_onboarding(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<()>> {
    activation::delete_onboarding(&state.pool, &principal, id).await?;
    Ok(ApiResponse::ok("Onboarding deleted", ()))
}

/// POST /api/v1/onboardings/{id}/restore
pub async fn restore_onboarding(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<Onboarding>> {
    let onboarding = activation::restore_onboarding(&state.pool, &admin, id).await?;
    Ok(ApiResponse::ok("Onboarding restored", onboarding))
}
