//! Onboarding (patient enrollment) models and DTOs.

use careflow_core::error::CoreError;
use careflow_core::onboarding::{parse_diagnoses, Diagnosis, PaymentStatus};
use careflow_core::payment::{PaymentMethod, VerifiedPayment};
use careflow_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `onboardings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Onboarding {
    pub id: DbId,
    pub user_id: DbId,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone_number: Option<String>,
    pub diagnoses: Vec<String>,
    pub payer_id: Option<DbId>,
    pub clinic_id: Option<DbId>,
    pub insurance_id: Option<DbId>,
    pub payment_method: String,
    pub payment_id: DbId,
    pub payment_status: String,
    pub is_active: bool,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Onboarding {
    /// The parsed payment status. The column is CHECK-constrained, so a parse
    /// failure is reported as an internal error.
    pub fn payment_status(&self) -> Result<PaymentStatus, CoreError> {
        PaymentStatus::from_str(&self.payment_status).ok_or_else(|| {
            CoreError::Internal(format!(
                "onboarding {} has unrecognised payment_status '{}'",
                self.id, self.payment_status
            ))
        })
    }

    pub fn diagnoses(&self) -> Result<Vec<Diagnosis>, CoreError> {
        parse_diagnoses(&self.diagnoses)
    }

    /// The evidence this onboarding was verified against.
    pub fn verified_payment(&self) -> Result<VerifiedPayment, CoreError> {
        let method = PaymentMethod::from_str(&self.payment_method).ok_or_else(|| {
            CoreError::Internal(format!(
                "onboarding {} has unrecognised payment_method '{}'",
                self.id, self.payment_method
            ))
        })?;
        Ok(VerifiedPayment {
            method,
            payment_id: self.payment_id,
        })
    }
}

/// DTO for inserting an onboarding after payment verification.
#[derive(Debug, Clone)]
pub struct CreateOnboarding {
    pub user_id: DbId,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone_number: Option<String>,
    pub diagnoses: Vec<String>,
    pub payer_id: Option<DbId>,
    pub clinic_id: Option<DbId>,
    pub insurance_id: Option<DbId>,
    pub payment_method: String,
    pub payment_id: DbId,
}

/// DTO for patching an onboarding. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct UpdateOnboarding {
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone_number: Option<String>,
    pub diagnoses: Option<Vec<String>>,
    pub clinic_id: Option<DbId>,
    pub payment_status: Option<String>,
}
