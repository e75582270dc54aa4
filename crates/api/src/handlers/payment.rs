//! Handlers for simulated payment evidence: `/payments/mpesa` and
//! `/insurance`.
//!
//! There is no real gateway. A mobile-money payment is recorded as pending
//! and a confirm call stands in for the provider's callback.

use axum::extract::{Path, State};
use careflow_core::error::CoreError;
use careflow_core::payment::generate_transaction_reference;
use careflow_core::types::DbId;
use careflow_db::models::payment::{CreateInsurance, CreateMpesaPayment, Insurance, MpesaPayment};
use careflow_db::repositories::{InsuranceRepo, MpesaPaymentRepo};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::extract::ValidatedJson;
use crate::middleware::auth::Principal;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Body of `POST /payments/mpesa`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMpesaPaymentRequest {
    #[validate(length(min = 7, max = 20, message = "phone_number must be 7-20 characters"))]
    pub phone_number: String,
    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount: i64,
}

/// Body of `POST /insurance`. Staff who manage payments may record a policy
/// for another user via `user_id`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateInsuranceRequest {
    pub user_id: Option<DbId>,
    #[validate(length(min = 1, max = 255, message = "provider is required"))]
    pub provider: String,
    #[validate(length(min = 1, max = 64, message = "policy_number is required"))]
    pub policy_number: String,
    #[validate(length(max = 64))]
    pub member_number: Option<String>,
}

/// POST /api/v1/payments/mpesa
pub async fn create_mpesa_payment(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(input): ValidatedJson<CreateMpesaPaymentRequest>,
) -> AppResult<ApiResponse<MpesaPayment>> {
    let payment = MpesaPaymentRepo::create(
        &state.pool,
        &CreateMpesaPayment {
            user_id: principal.user_id,
            phone_number: input.phone_number,
            amount: input.amount,
            transaction_reference: generate_transaction_reference(),
        },
    )
    .await?;

    tracing::info!(
        payment_id = payment.id,
        user_id = principal.user_id,
        transaction_reference = %payment.transaction_reference,
        "M-Pesa payment recorded"
    );

    Ok(ApiResponse::created("Payment recorded", payment))
}

/// GET /api/v1/payments/mpesa/{id}
pub async fn get_mpesa_payment(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<MpesaPayment>> {
    let payment = find_mpesa(&state, id).await?;
    ensure_payment_access(&principal, payment.user_id)?;
    Ok(ApiResponse::ok("Payment retrieved", payment))
}

/// POST /api/v1/payments/mpesa/{id}/confirm
///
/// Confirming an already completed payment returns it unchanged.
pub async fn confirm_mpesa_payment(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<MpesaPayment>> {
    let payment = find_mpesa(&state, id).await?;
    ensure_payment_access(&principal, payment.user_id)?;

    let payment = MpesaPaymentRepo::mark_completed(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "MpesaPayment",
            id,
        })?;

    tracing::info!(
        payment_id = id,
        confirmed_by = principal.user_id,
        "M-Pesa payment confirmed"
    );

    Ok(ApiResponse::ok("Payment confirmed", payment))
}

/// POST /api/v1/insurance
pub async fn create_insurance(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(input): ValidatedJson<CreateInsuranceRequest>,
) -> AppResult<ApiResponse<Insurance>> {
    let user_id = input.user_id.unwrap_or(principal.user_id);
    ensure_payment_access(&principal, user_id)?;

    let insurance = InsuranceRepo::create(
        &state.pool,
        &CreateInsurance {
            user_id,
            provider: input.provider,
            policy_number: input.policy_number,
            member_number: input.member_number,
        },
    )
    .await?;

    tracing::info!(
        insurance_id = insurance.id,
        user_id,
        recorded_by = principal.user_id,
        "Insurance recorded"
    );

    Ok(ApiResponse::created("Insurance recorded", insurance))
}

/// GET /api/v1/insurance/{id}
pub async fn get_insurance(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<DbId>,
) -> AppResult<ApiResponse<Insurance>> {
    let insurance = InsuranceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Insurance",
            id,
        })?;
    ensure_payment_access(&principal, insurance.user_id)?;
    Ok(ApiResponse::ok("Insurance retrieved", insurance))
}

async fn find_mpesa(state: &AppState, id: DbId) -> AppResult<MpesaPayment> {
    let payment = MpesaPaymentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "MpesaPayment",
            id,
        })?;
    Ok(payment)
}

/// Evidence belongs to its payer-of-record; admin and navigators act on
/// anyone's.
fn ensure_payment_access(principal: &Principal, owner_id: DbId) -> Result<(), CoreError> {
    if principal.user_id == owner_id || principal.role.manages_payments() {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "You do not have access to this payment record".to_string(),
        ))
    }
}
