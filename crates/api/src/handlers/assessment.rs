//! Handlers for `/onboardings/{id}/assessments`.

use axum::extract::{Path, State};
use careflow_core::assessment::{missing_fields, AssessmentKind, Measurements};
use careflow_core::onboarding::ensure_assessable;
use careflow_core::types::DbId;
use careflow_db::models::assessment::{Assessment, CreateAssessment};
use careflow_db::repositories::AssessmentRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult, FieldErrors};
use crate::extract::ValidatedJson;
use crate::middleware::auth::Principal;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::workflows::onboarding_activation::find_visible;

/// Body of `POST /onboardings/{id}/assessments`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAssessmentRequest {
    pub kind: AssessmentKind,
    #[validate(range(min = 0.0, max = 100.0, message = "blood_glucose must be 0-100 mmol/L"))]
    pub blood_glucose: Option<f64>,
    #[validate(range(min = 40, max = 300, message = "systolic_bp must be 40-300 mmHg"))]
    pub systolic_bp: Option<i32>,
    #[validate(range(min = 20, max = 200, message = "diastolic_bp must be 20-200 mmHg"))]
    pub diastolic_bp: Option<i32>,
    #[validate(range(min = 0.5, max = 500.0, message = "weight_kg must be 0.5-500"))]
    pub weight_kg: Option<f64>,
    #[validate(range(min = 30.0, max = 272.0, message = "height_cm must be 30-272"))]
    pub height_cm: Option<f64>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

impl CreateAssessmentRequest {
    fn measurements(&self) -> Measurements {
        Measurements {
            blood_glucose: self.blood_glucose,
            systolic_bp: self.systolic_bp,
            diastolic_bp: self.diastolic_bp,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
        }
    }
}

/// POST /api/v1/onboardings/{id}/assessments
///
/// The onboarding must be approved, and the measurements its diagnoses make
/// mandatory must all be present.
pub async fn create_assessment(
    State(state): State<AppState>,
    principal: Principal,
    Path(onboarding_id): Path<DbId>,
    ValidatedJson(input): ValidatedJson<CreateAssessmentRequest>,
) -> AppResult<ApiResponse<Assessment>> {
    let onboarding = find_visible(&state.pool, &principal, onboarding_id).await?;
    ensure_assessable(onboarding.payment_status()?)?;

    let measurements = input.measurements();
    let missing = missing_fields(&onboarding.diagnoses()?, &measurements);
    if !missing.is_empty() {
        let errors: FieldErrors = missing
            .iter()
            .map(|field| {
                (
                    field.to_string(),
                    vec![format!("{field} is required for this patient's diagnoses")],
                )
            })
            .collect();
        return Err(AppError::Fields {
            message: "Required measurements are missing".to_string(),
            errors,
        });
    }

    let assessment = AssessmentRepo::create(
        &state.pool,
        &CreateAssessment {
            onboarding_id,
            kind: input.kind.as_str().to_string(),
            recorded_by: principal.user_id,
            blood_glucose: measurements.blood_glucose,
            systolic_bp: measurements.systolic_bp,
            diastolic_bp: measurements.diastolic_bp,
            weight_kg: measurements.weight_kg,
            height_cm: measurements.height_cm,
            bmi: measurements.bmi(),
            notes: input.notes,
        },
    )
    .await?;

    tracing::info!(
        assessment_id = assessment.id,
        onboarding_id,
        kind = input.kind.as_str(),
        recorded_by = principal.user_id,
        "Assessment recorded"
    );

    Ok(ApiResponse::created("Assessment recorded", assessment))
}

/// GET /api/v1/onboardings/{id}/assessments
pub async fn list_assessments(
    State(state): State<AppState>,
    principal: Principal,
    Path(onboarding_id): Path<DbId>,
) -> AppResult<ApiResponse<Vec<Assessment>>> {
    let onboarding = find_visible(&state.pool, &principal, onboarding_id).await?;
    let assessments = AssessmentRepo::list_for_onboarding(&state.pool, onboarding.id).await?;
    Ok(ApiResponse::ok("Assessments retrieved", assessments))
}
