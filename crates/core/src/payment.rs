//! Payment verification rules for onboarding activation.
//!
//! A claimed payment is either a mobile-money (M-Pesa) record or an insurance
//! record. Verification is synchronous and idempotent; the DB layer fetches
//! the evidence row and [`verify`] decides.
//!
//! M-Pesa evidence must be `completed`. Insurance evidence only has to exist:
//! its status is deliberately not checked, matching the behaviour the rest of
//! the programme relies on. Tightening this is a product decision.

use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Reason reported by every failed verification.
pub const REASON_PAYMENT_NOT_VERIFIED: &str = "payment_not_verified";

/// Error code surfaced by the onboarding workflow when verification fails.
pub const PAYMENT_VERIFICATION_FAILED: &str = "payment_verification_failed";

/// Prefix of transaction references issued by the simulated M-Pesa gateway.
pub const SIMULATED_REFERENCE_PREFIX: &str = "SIM";

/// Length of the random part of a simulated transaction reference.
pub const SIMULATED_REFERENCE_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Mpesa,
    Insurance,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mpesa => "mpesa",
            Self::Insurance => "insurance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mpesa" => Some(Self::Mpesa),
            "insurance" => Some(Self::Insurance),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status carried by an M-Pesa or insurance evidence row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    Pending,
    Completed,
}

impl EvidenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// The rule-relevant part of an evidence row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentEvidence {
    pub id: DbId,
    pub status: EvidenceStatus,
    /// The live onboarding this evidence already verified, if any.
    pub linked_onboarding: Option<DbId>,
}

/// A payment that passed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerifiedPayment {
    pub method: PaymentMethod,
    pub payment_id: DbId,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    #[error("payment_not_verified: unsupported payment method '{0}'")]
    UnsupportedMethod(String),

    #[error("payment_not_verified: no {method} record with id {payment_id}")]
    Missing { method: PaymentMethod, payment_id: DbId },

    #[error("payment_not_verified: {method} record {payment_id} is still pending")]
    Incomplete { method: PaymentMethod, payment_id: DbId },

    #[error("payment_not_verified: {method} record {payment_id} backs onboarding {onboarding_id}")]
    AlreadyUsed {
        method: PaymentMethod,
        payment_id: DbId,
        onboarding_id: DbId,
    },
}

impl VerificationFailure {
    pub fn reason(&self) -> &'static str {
        REASON_PAYMENT_NOT_VERIFIED
    }
}

impl From<VerificationFailure> for CoreError {
    fn from(failure: VerificationFailure) -> Self {
        CoreError::BusinessRule(format!("{PAYMENT_VERIFICATION_FAILED}: {failure}"))
    }
}

/// Issue a transaction reference for a simulated M-Pesa payment, e.g.
/// `SIMQ7K2M9XD4A`.
pub fn generate_transaction_reference() -> String {
    let code: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SIMULATED_REFERENCE_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("{SIMULATED_REFERENCE_PREFIX}{code}")
}

/// Parse the claimed payment method, failing verification for unknown values.
pub fn parse_method(method: &str) -> Result<PaymentMethod, VerificationFailure> {
    PaymentMethod::from_str(method)
        .ok_or_else(|| VerificationFailure::UnsupportedMethod(method.to_string()))
}

/// Decide whether the evidence found for `payment_id` verifies the payment.
///
/// `claimant` is the onboarding the evidence is being linked to: `None` for a
/// new onboarding, `Some(id)` when an existing one is restored. Evidence that
/// already backs any other live onboarding is refused.
pub fn verify(
    method: PaymentMethod,
    payment_id: DbId,
    evidence: Option<PaymentEvidence>,
    claimant: Option<DbId>,
) -> Result<VerifiedPayment, VerificationFailure> {
    let evidence = evidence.ok_or(VerificationFailure::Missing { method, payment_id })?;

    if method == PaymentMethod::Mpesa && evidence.status != EvidenceStatus::Completed {
        return Err(VerificationFailure::Incomplete { method, payment_id });
    }
    if let Some(onboarding_id) = evidence.linked_onboarding {
        if claimant != Some(onboarding_id) {
            return Err(VerificationFailure::AlreadyUsed {
                method,
                payment_id,
                onboarding_id,
            });
        }
    }

    Ok(VerifiedPayment {
        method,
        payment_id: evidence.id,
    })
}
