//! Repositories for the payment evidence tables, `mpesa_payments` and
//! `insurance`.
//!
//! The `onboarding_id` back-reference is loose (no FK). It is written by the
//! onboarding workflow inside the same transaction as the onboarding insert,
//! and cleared the same way before an onboarding is deleted.

use careflow_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::payment::{
    CreateInsurance, CreateMpesaPayment, EvidenceRow, Insurance, MpesaPayment,
};

/// Column list for mpesa_payments queries.
const MPESA_COLUMNS: &str = "id, user_id, phone_number, amount, transaction_reference, \
    status, onboarding_id, created_at, updated_at";

/// Column list for insurance queries.
const INSURANCE_COLUMNS: &str = "id, user_id, provider, policy_number, member_number, \
    status, onboarding_id, created_at, updated_at";

/// Verification projection over an evidence table aliased `e`, left-joined
/// to its live onboarding `o`.
const EVIDENCE_COLUMNS: &str = "e.id, e.status, o.id AS onboarding_id";

// ---------------------------------------------------------------------------
// M-Pesa
// ---------------------------------------------------------------------------

pub struct MpesaPaymentRepo;

impl MpesaPaymentRepo {
    /// Record a pending payment, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMpesaPayment,
    ) -> Result<MpesaPayment, sqlx::Error> {
        let query = format!(
            "INSERT INTO mpesa_payments (user_id, phone_number, amount, transaction_reference)
             VALUES ($1, $2, $3, $4)
             RETURNING {MPESA_COLUMNS}"
        );
        sqlx::query_as::<_, MpesaPayment>(&query)
            .bind(input.user_id)
            .bind(&input.phone_number)
            .bind(input.amount)
            .bind(&input.transaction_reference)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MpesaPayment>, sqlx::Error> {
        let query = format!("SELECT {MPESA_COLUMNS} FROM mpesa_payments WHERE id = $1");
        sqlx::query_as::<_, MpesaPayment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Mark a payment as completed (the simulated gateway callback).
    pub async fn mark_completed(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MpesaPayment>, sqlx::Error> {
        let query = format!(
            "UPDATE mpesa_payments SET status = 'completed'
             WHERE id = $1
             RETURNING {MPESA_COLUMNS}"
        );
        sqlx::query_as::<_, MpesaPayment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch and lock the verification projection of a payment. A stale
    /// back-reference to a deleted onboarding reads as unlinked.
    pub async fn find_evidence(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<EvidenceRow>, sqlx::Error> {
        let query = format!(
            "SELECT {EVIDENCE_COLUMNS}
             FROM mpesa_payments e
             LEFT JOIN onboardings o ON o.id = e.onboarding_id AND o.deleted_at IS NULL
             WHERE e.id = $1
             FOR UPDATE OF e"
        );
        sqlx::query_as::<_, EvidenceRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Point a payment at the onboarding it verified.
    pub async fn link_onboarding(
        conn: &mut PgConnection,
        id: DbId,
        onboarding_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE mpesa_payments SET onboarding_id = $2 WHERE id = $1")
            .bind(id)
            .bind(onboarding_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Null every back-reference to `onboarding_id`. Returns the number of
    /// rows released.
    pub async fn unlink_onboarding(
        conn: &mut PgConnection,
        onboarding_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE mpesa_payments SET onboarding_id = NULL WHERE onboarding_id = $1")
                .bind(onboarding_id)
                .execute(conn)
                .await?;
        Ok(result.rows_affected())
    }
}

// ---------------------------------------------------------------------------
// Insurance
// ---------------------------------------------------------------------------

pub struct InsuranceRepo;

impl InsuranceRepo {
    /// Record an insurance policy, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateInsurance) -> Result<Insurance, sqlx::Error> {
        let query = format!(
            "INSERT INTO insurance (user_id, provider, policy_number, member_number)
             VALUES ($1, $2, $3, $4)
             RETURNING {INSURANCE_COLUMNS}"
        );
        sqlx::query_as::<_, Insurance>(&query)
            .bind(input.user_id)
            .bind(&input.provider)
            .bind(&input.policy_number)
            .bind(&input.member_number)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Insurance>, sqlx::Error> {
        let query = format!("SELECT {INSURANCE_COLUMNS} FROM insurance WHERE id = $1");
        sqlx::query_as::<_, Insurance>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch and lock the verification projection of an insurance record.
    pub async fn find_evidence(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<EvidenceRow>, sqlx::Error> {
        let query = format!(
            "SELECT {EVIDENCE_COLUMNS}
             FROM insurance e
             LEFT JOIN onboardings o ON o.id = e.onboarding_id AND o.deleted_at IS NULL
             WHERE e.id = $1
             FOR UPDATE OF e"
        );
        sqlx::query_as::<_, EvidenceRow>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Point an insurance record at the onboarding it verified.
    pub async fn link_onboarding(
        conn: &mut PgConnection,
        id: DbId,
        onboarding_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE insurance SET onboarding_id = $2 WHERE id = $1")
            .bind(id)
            .bind(onboarding_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Null every back-reference to `onboarding_id`. Returns the number of
    /// rows released.
    pub async fn unlink_onboarding(
        conn: &mut PgConnection,
        onboarding_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE insurance SET onboarding_id = NULL WHERE onboarding_id = $1")
                .bind(onboarding_id)
                .execute(conn)
                .await?;
        Ok(result.rows_affected())
    }
}
