//! Repository for the `assessments` table.

use careflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::assessment::{Assessment, CreateAssessment};

/// Column list for assessments queries.
const COLUMNS: &str = "id, onboarding_id, kind, recorded_by, blood_glucose, systolic_bp, \
    diastolic_bp, weight_kg, height_cm, bmi, notes, created_at";

pub struct AssessmentRepo;

impl AssessmentRepo {
    /// Insert an assessment, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAssessment,
    ) -> Result<Assessment, sqlx::Error> {
        let query = format!(
            "INSERT INTO assessments
                (onboarding_id, kind, recorded_by, blood_glucose, systolic_bp, diastolic_bp,
                 weight_kg, height_cm, bmi, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(input.onboarding_id)
            .bind(&input.kind)
            .bind(input.recorded_by)
            .bind(input.blood_glucose)
            .bind(input.systolic_bp)
            .bind(input.diastolic_bp)
            .bind(input.weight_kg)
            .bind(input.height_cm)
            .bind(input.bmi)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    /// Assessments of an onboarding, newest first.
    pub async fn list_for_onboarding(
        pool: &PgPool,
        onboarding_id: DbId,
    ) -> Result<Vec<Assessment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assessments
             WHERE onboarding_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Assessment>(&query)
            .bind(onboarding_id)
            .fetch_all(pool)
            .await
    }
}
