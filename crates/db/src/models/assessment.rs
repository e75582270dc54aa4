//! Clinical assessment models.

use careflow_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `assessments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assessment {
    pub id: DbId,
    pub onboarding_id: DbId,
    pub kind: String,
    pub recorded_by: DbId,
    pub blood_glucose: Option<f64>,
    pub systolic_bp: Option<i32>,
    pub diastolic_bp: Option<i32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub bmi: Option<f64>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for recording an assessment.
#[derive(Debug, Clone)]
pub struct CreateAssessment {
    pub onboarding_id: DbId,
    pub kind: String,
    pub recorded_by: DbId,
    pub blood_glucose: Option<f64>,
    pub systolic_bp: Option<i32>,
    pub diastolic_bp: Option<i32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub bmi: Option<f64>,
    pub notes: Option<String>,
}
