//! Payment evidence lookups for onboarding activation.
//!
//! The decision itself is [`careflow_core::payment::verify`]; this module
//! fetches (and row-locks) the evidence inside the caller's transaction and
//! maintains the `onboarding_id` back-reference on whichever table verified.

use careflow_core::error::CoreError;
use careflow_core::payment::{verify, PaymentMethod, VerifiedPayment};
use careflow_core::types::DbId;
use careflow_db::repositories::{InsuranceRepo, MpesaPaymentRepo};
use sqlx::PgConnection;

use crate::error::AppResult;

/// Verify that `payment_id` is acceptable evidence for `method`, and not
/// already backing a live onboarding other than `claimant`.
///
/// The evidence row stays locked until the caller's transaction ends, so it
/// cannot be confirmed, relinked or removed while the onboarding is written.
pub async fn verify_payment(
    conn: &mut PgConnection,
    method: PaymentMethod,
    payment_id: DbId,
    claimant: Option<DbId>,
) -> AppResult<VerifiedPayment> {
    let row = match method {
        PaymentMethod::Mpesa => MpesaPaymentRepo::find_evidence(conn, payment_id).await?,
        PaymentMethod::Insurance => InsuranceRepo::find_evidence(conn, payment_id).await?,
    };

    verify(method, payment_id, row.map(|r| r.evidence()), claimant).map_err(|failure| {
        tracing::warn!(
            payment_method = %method,
            payment_id,
            claimant = ?claimant,
            reason = failure.reason(),
            error = %failure,
            "Payment verification failed"
        );
        CoreError::from(failure).into()
    })
}

/// Point the verifying evidence row at the new onboarding.
pub async fn link_payment(
    conn: &mut PgConnection,
    payment: &VerifiedPayment,
    onboarding_id: DbId,
) -> AppResult<()> {
    let linked = match payment.method {
        PaymentMethod::Mpesa => {
            MpesaPaymentRepo::link_onboarding(conn, payment.payment_id, onboarding_id).await?
        }
        PaymentMethod::Insurance => {
            InsuranceRepo::link_onboarding(conn, payment.payment_id, onboarding_id).await?
        }
    };
    if !linked {
        return Err(CoreError::NotFound {
            entity: payment_entity(payment.method),
            id: payment.payment_id,
        }
        .into());
    }
    Ok(())
}

/// Release every evidence row pointing at `onboarding_id`, in both tables.
/// Returns the number of rows released.
pub async fn unlink_payments(conn: &mut PgConnection, onboarding_id: DbId) -> AppResult<u64> {
    let mpesa = MpesaPaymentRepo::unlink_onboarding(&mut *conn, onboarding_id).await?;
    let insurance = InsuranceRepo::unlink_onboarding(&mut *conn, onboarding_id).await?;
    Ok(mpesa + insurance)
}

fn payment_entity(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Mpesa => "MpesaPayment",
        PaymentMethod::Insurance => "Insurance",
    }
}
