//! Payment evidence models: simulated M-Pesa payments and insurance records.

use careflow_core::payment::{EvidenceStatus, PaymentEvidence};
use careflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `mpesa_payments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MpesaPayment {
    pub id: DbId,
    pub user_id: DbId,
    pub phone_number: String,
    pub amount: i64,
    pub transaction_reference: String,
    pub status: String,
    pub onboarding_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a new (pending) M-Pesa payment.
#[derive(Debug, Clone)]
pub struct CreateMpesaPayment {
    pub user_id: DbId,
    pub phone_number: String,
    pub amount: i64,
    pub transaction_reference: String,
}

/// A row from the `insurance` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Insurance {
    pub id: DbId,
    pub user_id: DbId,
    pub provider: String,
    pub policy_number: String,
    pub member_number: Option<String>,
    pub status: String,
    pub onboarding_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording an insurance record.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInsurance {
    pub user_id: DbId,
    pub provider: String,
    pub policy_number: String,
    pub member_number: Option<String>,
}

/// The projection used by payment verification. `onboarding_id` is only set
/// when the back-reference points at a live onboarding.
#[derive(Debug, Clone, FromRow)]
pub struct EvidenceRow {
    pub id: DbId,
    pub status: String,
    pub onboarding_id: Option<DbId>,
}

impl EvidenceRow {
    /// Convert to the domain view. Unknown statuses count as pending.
    pub fn evidence(&self) -> PaymentEvidence {
        PaymentEvidence {
            id: self.id,
            status: EvidenceStatus::from_str(&self.status).unwrap_or(EvidenceStatus::Pending),
            linked_onboarding: self.onboarding_id,
        }
    }
}
