//! Payment-gated onboarding lifecycle: create, complete, update, delete and
//! restore, plus the scoped lookups shared by the onboarding and assessment
//! handlers.

use careflow_core::error::CoreError;
use careflow_core::onboarding::{
    ensure_can_complete, ensure_status_change, parse_diagnoses, resolve_creation, Diagnosis,
    PaymentStatus,
};
use careflow_core::payment::{parse_method, PaymentMethod};
use careflow_core::types::DbId;
use careflow_db::models::onboarding::{CreateOnboarding, Onboarding, UpdateOnboarding};
use careflow_db::repositories::{OnboardingRepo, UserRepo};
use careflow_db::DbPool;
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgConnection;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::Principal;
use crate::workflows::payment_verifier::{link_payment, unlink_payments, verify_payment};

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /onboardings`.
///
/// `user_id` names the patient when staff onboard on someone's behalf; it is
/// ignored for self-service users. `payer_id` is forced to the caller's own
/// affiliation for payers.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOnboardingRequest {
    pub user_id: Option<DbId>,
    pub payer_id: Option<DbId>,
    #[validate(length(min = 1, max = 255, message = "full_name is required"))]
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 32))]
    pub gender: Option<String>,
    #[validate(length(min = 7, max = 20, message = "phone_number must be 7-20 characters"))]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub diagnoses: Vec<String>,
    pub clinic_id: Option<DbId>,
    pub insurance_id: Option<DbId>,
    #[validate(length(min = 1, message = "payment_method is required"))]
    pub payment_method: String,
    pub payment_id: DbId,
}

/// Body of `PUT /onboardings/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateOnboardingRequest {
    #[validate(length(min = 1, max = 255, message = "full_name must not be empty"))]
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(max = 32))]
    pub gender: Option<String>,
    #[validate(length(min = 7, max = 20, message = "phone_number must be 7-20 characters"))]
    pub phone_number: Option<String>,
    pub diagnoses: Option<Vec<String>>,
    pub clinic_id: Option<DbId>,
    pub payment_status: Option<PaymentStatus>,
}

fn diagnosis_names(diagnoses: &[Diagnosis]) -> Vec<String> {
    diagnoses.iter().map(|d| d.as_str().to_string()).collect()
}

fn not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "Onboarding",
        id,
    }
}

// ---------------------------------------------------------------------------
// Scoped lookups
// ---------------------------------------------------------------------------

/// Load a live onboarding the principal may see. Records outside the
/// principal's scope are reported as missing.
pub async fn find_visible(
    pool: &DbPool,
    principal: &Principal,
    id: DbId,
) -> AppResult<Onboarding> {
    let scope = principal.onboarding_scope()?;
    let onboarding = OnboardingRepo::find_by_id(pool, id)
        .await?
        .filter(|o| scope.permits(o.user_id, o.payer_id))
        .ok_or_else(|| not_found(id))?;
    Ok(onboarding)
}

/// Row-lock a live onboarding the principal may mutate.
async fn lock_visible(
    conn: &mut PgConnection,
    principal: &Principal,
    id: DbId,
) -> AppResult<Onboarding> {
    let scope = principal.onboarding_scope()?;
    let onboarding = OnboardingRepo::find_for_update(conn, id)
        .await?
        .filter(|o| scope.permits(o.user_id, o.payer_id))
        .ok_or_else(|| not_found(id))?;
    Ok(onboarding)
}

/// Live onboardings within the principal's scope.
pub async fn list_visible(pool: &DbPool, principal: &Principal) -> AppResult<Vec<Onboarding>> {
    let scope = principal.onboarding_scope()?;
    Ok(OnboardingRepo::list(pool, scope).await?)
}

/// The live onboarding of `user_id`, if the principal may see it.
pub async fn find_for_user(
    pool: &DbPool,
    principal: &Principal,
    user_id: DbId,
) -> AppResult<Onboarding> {
    let scope = principal.onboarding_scope()?;
    let onboarding = OnboardingRepo::find_by_user(pool, user_id)
        .await?
        .filter(|o| scope.permits(o.user_id, o.payer_id))
        .ok_or(CoreError::NotFound {
            entity: "Onboarding for user",
            id: user_id,
        })?;
    Ok(onboarding)
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

/// Verify the claimed payment and create the onboarding.
///
/// Verification, the insert and the payment back-reference are one
/// transaction: a failure at any step leaves no onboarding and no link.
pub async fn create_onboarding(
    pool: &DbPool,
    principal: &Principal,
    input: CreateOnboardingRequest,
) -> AppResult<Onboarding> {
    let target = resolve_creation(&principal.as_creator(), input.user_id, input.payer_id)
        .map_err(|e| {
            tracing::warn!(
                user_id = principal.user_id,
                role = %principal.role,
                error = %e,
                "Onboarding creation refused"
            );
            e
        })?;

    if target.owner_id != principal.user_id
        && UserRepo::find_by_id(pool, target.owner_id).await?.is_none()
    {
        return Err(CoreError::NotFound {
            entity: "User",
            id: target.owner_id,
        }
        .into());
    }

    let diagnoses = parse_diagnoses(&input.diagnoses)?;
    let method = parse_method(&input.payment_method).map_err(CoreError::from)?;
    let insurance_id = match method {
        PaymentMethod::Insurance => input.insurance_id.or(Some(input.payment_id)),
        PaymentMethod::Mpesa => input.insurance_id,
    };

    let mut tx = pool.begin().await?;
    let verified = verify_payment(&mut *tx, method, input.payment_id, None).await?;

    let onboarding = OnboardingRepo::create(
        &mut *tx,
        &CreateOnboarding {
            user_id: target.owner_id,
            full_name: input.full_name,
            date_of_birth: input.date_of_birth,
            gender: input.gender,
            phone_number: input.phone_number,
            diagnoses: diagnosis_names(&diagnoses),
            payer_id: target.payer_id,
            clinic_id: input.clinic_id,
            insurance_id,
            payment_method: method.as_str().to_string(),
            payment_id: verified.payment_id,
        },
    )
    .await?;

    link_payment(&mut *tx, &verified, onboarding.id).await?;
    tx.commit().await?;

    tracing::info!(
        onboarding_id = onboarding.id,
        owner_id = onboarding.user_id,
        created_by = principal.user_id,
        payer_id = ?onboarding.payer_id,
        payment_method = %method,
        payment_id = verified.payment_id,
        "Onboarding created"
    );

    Ok(onboarding)
}

/// Mark the onboarding's payment completed, which activates it.
pub async fn complete_onboarding(
    pool: &DbPool,
    principal: &Principal,
    id: DbId,
) -> AppResult<Onboarding> {
    let mut tx = pool.begin().await?;
    let current = lock_visible(&mut *tx, principal, id).await?;

    ensure_can_complete(current.payment_status()?).map_err(|e| {
        tracing::warn!(
            onboarding_id = id,
            user_id = principal.user_id,
            error = %e,
            "Completion refused"
        );
        e
    })?;

    let patch = UpdateOnboarding {
        payment_status: Some(PaymentStatus::Completed.as_str().to_string()),
        ..Default::default()
    };
    let onboarding = OnboardingRepo::update(&mut *tx, id, &patch, true)
        .await?
        .ok_or_else(|| not_found(id))?;
    tx.commit().await?;

    tracing::info!(
        onboarding_id = id,
        user_id = principal.user_id,
        "Onboarding payment completed"
    );

    Ok(onboarding)
}

/// Patch identity and clinical fields and, for staff, the payment status.
/// `is_active` follows the resulting payment status.
pub async fn update_onboarding(
    pool: &DbPool,
    principal: &Principal,
    id: DbId,
    input: UpdateOnboardingRequest,
) -> AppResult<Onboarding> {
    let diagnoses = match &input.diagnoses {
        Some(names) => Some(diagnosis_names(&parse_diagnoses(names)?)),
        None => None,
    };

    let mut tx = pool.begin().await?;
    let current = lock_visible(&mut *tx, principal, id).await?;
    let current_status = current.payment_status()?;

    if let Some(requested) = input.payment_status {
        ensure_status_change(principal.role, current_status, requested).map_err(|e| {
            tracing::warn!(
                onboarding_id = id,
                user_id = principal.user_id,
                role = %principal.role,
                current = %current_status,
                requested = %requested,
                error = %e,
                "Payment status change refused"
            );
            e
        })?;
    }
    let next_status = input.payment_status.unwrap_or(current_status);

    let patch = UpdateOnboarding {
        full_name: input.full_name,
        date_of_birth: input.date_of_birth,
        gender: input.gender,
        phone_number: input.phone_number,
        diagnoses,
        clinic_id: input.clinic_id,
        payment_status: input.payment_status.map(|s| s.as_str().to_string()),
    };
    let onboarding = OnboardingRepo::update(&mut *tx, id, &patch, next_status.activates())
        .await?
        .ok_or_else(|| not_found(id))?;
    tx.commit().await?;

    tracing::info!(
        onboarding_id = id,
        user_id = principal.user_id,
        payment_status = %next_status,
        is_active = onboarding.is_active,
        "Onboarding updated"
    );

    Ok(onboarding)
}

/// Release the payment back-reference, then soft-delete.
pub async fn delete_onboarding(pool: &DbPool, principal: &Principal, id: DbId) -> AppResult<()> {
    let mut tx = pool.begin().await?;
    lock_visible(&mut *tx, principal, id).await?;

    let released = unlink_payments(&mut *tx, id).await?;
    if !OnboardingRepo::soft_delete(&mut *tx, id).await? {
        return Err(not_found(id).into());
    }
    tx.commit().await?;

    tracing::info!(
        onboarding_id = id,
        user_id = principal.user_id,
        released_payments = released,
        "Onboarding deleted"
    );

    Ok(())
}

/// Bring back a soft-deleted onboarding and re-link its payment.
///
/// Fails with 400 if the onboarding is not deleted, if its user has been
/// onboarded again since, or if its payment now backs another onboarding.
pub async fn restore_onboarding(
    pool: &DbPool,
    principal: &Principal,
    id: DbId,
) -> AppResult<Onboarding> {
    let existing = OnboardingRepo::find_by_id_include_deleted(pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    if existing.deleted_at.is_none() {
        return Err(CoreError::BusinessRule("Onboarding is not deleted".to_string()).into());
    }

    let claimed = existing.verified_payment()?;
    let mut tx = pool.begin().await?;
    let verified = verify_payment(&mut *tx, claimed.method, claimed.payment_id, Some(id)).await?;
    let onboarding = OnboardingRepo::restore(&mut *tx, id)
        .await?
        .ok_or_else(|| CoreError::BusinessRule("Onboarding is not deleted".to_string()))?;
    link_payment(&mut *tx, &verified, id).await?;
    tx.commit().await?;

    tracing::info!(
        onboarding_id = id,
        owner_id = onboarding.user_id,
        restored_by = principal.user_id,
        "Onboarding restored"
    );

    Ok(onboarding)
}
