//! Repository for the `onboardings` table.
//!
//! Onboardings are soft-deleted: every read except
//! [`OnboardingRepo::find_by_id_include_deleted`] excludes rows with a
//! `deleted_at`.

use careflow_core::onboarding::OnboardingScope;
use careflow_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::onboarding::{CreateOnboarding, Onboarding, UpdateOnboarding};

/// Column list for onboardings queries.
const COLUMNS: &str = "id, user_id, full_name, date_of_birth, gender, phone_number, diagnoses, \
    payer_id, clinic_id, insurance_id, payment_method, payment_id, payment_status, is_active, \
    deleted_at, created_at, updated_at";

pub struct OnboardingRepo;

impl OnboardingRepo {
    /// Insert a new onboarding with pending payment, returning the created row.
    ///
    /// Fails with a unique violation on `uq_onboardings_user_id` if the user
    /// already has a live onboarding.
    pub async fn create(
        conn: &mut PgConnection,
        input: &CreateOnboarding,
    ) -> Result<Onboarding, sqlx::Error> {
        let query = format!(
            "INSERT INTO onboardings
                (user_id, full_name, date_of_birth, gender, phone_number, diagnoses,
                 payer_id, clinic_id, insurance_id, payment_method, payment_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Onboarding>(&query)
            .bind(input.user_id)
            .bind(&input.full_name)
            .bind(input.date_of_birth)
            .bind(&input.gender)
            .bind(&input.phone_number)
            .bind(&input.diagnoses)
            .bind(input.payer_id)
            .bind(input.clinic_id)
            .bind(input.insurance_id)
            .bind(&input.payment_method)
            .bind(input.payment_id)
            .fetch_one(conn)
            .await
    }

    /// Find a live onboarding by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Onboarding>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM onboardings WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Onboarding>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an onboarding by ID, including soft-deleted rows. Used by restore.
    pub async fn find_by_id_include_deleted(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Onboarding>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM onboardings WHERE id = $1");
        sqlx::query_as::<_, Onboarding>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load and row-lock a live onboarding for the rest of the transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Onboarding>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM onboardings WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
        );
        sqlx::query_as::<_, Onboarding>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// The live onboarding owned by `user_id`, if any.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Onboarding>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM onboardings WHERE user_id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Onboarding>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Live onboardings visible within `scope`, newest first.
    pub async fn list(
        pool: &PgPool,
        scope: OnboardingScope,
    ) -> Result<Vec<Onboarding>, sqlx::Error> {
        let base = format!("SELECT {COLUMNS} FROM onboardings WHERE deleted_at IS NULL");
        match scope {
            OnboardingScope::All => {
                let query = format!("{base} ORDER BY created_at DESC, id DESC");
                sqlx::query_as::<_, Onboarding>(&query).fetch_all(pool).await
            }
            OnboardingScope::Payer(payer_id) => {
                let query = format!("{base} AND payer_id = $1 ORDER BY created_at DESC, id DESC");
                sqlx::query_as::<_, Onboarding>(&query)
                    .bind(payer_id)
                    .fetch_all(pool)
                    .await
            }
            OnboardingScope::Owner(user_id) => {
                let query = format!("{base} AND user_id = $1 ORDER BY created_at DESC, id DESC");
                sqlx::query_as::<_, Onboarding>(&query)
                    .bind(user_id)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Patch an onboarding. Only non-`None` fields in `input` are applied;
    /// `is_active` is always written and must agree with the resulting
    /// payment status.
    pub async fn update(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateOnboarding,
        is_active: bool,
    ) -> Result<Option<Onboarding>, sqlx::Error> {
        let query = format!(
            "UPDATE onboardings SET
                full_name = COALESCE($2, full_name),
                date_of_birth = COALESCE($3, date_of_birth),
                gender = COALESCE($4, gender),
                phone_number = COALESCE($5, phone_number),
                diagnoses = COALESCE($6, diagnoses),
                clinic_id = COALESCE($7, clinic_id),
                payment_status = COALESCE($8, payment_status),
                is_active = $9
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Onboarding>(&query)
            .bind(id)
            .bind(&input.full_name)
            .bind(input.date_of_birth)
            .bind(&input.gender)
            .bind(&input.phone_number)
            .bind(&input.diagnoses)
            .bind(input.clinic_id)
            .bind(&input.payment_status)
            .bind(is_active)
            .fetch_optional(conn)
            .await
    }

    /// Soft-delete an onboarding. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE onboardings SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Restore a soft-deleted onboarding, returning the restored row.
    ///
    /// Fails with a unique violation on `uq_onboardings_user_id` if the user
    /// has been onboarded again in the meantime.
    pub async fn restore(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Onboarding>, sqlx::Error> {
        let query = format!(
            "UPDATE onboardings SET deleted_at = NULL
             WHERE id = $1 AND deleted_at IS NOT NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Onboarding>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }
}
