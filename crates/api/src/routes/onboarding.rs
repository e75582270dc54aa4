//! Route definitions for onboardings and their clinical assessments.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{assessment, onboarding};
use crate::state::AppState;

/// Routes mounted at `/onboardings`.
///
/// ```text
/// GET    /                    -> list_onboardings
/// POST   /                    -> create_onboarding
/// GET    /{id}                -> get_onboarding
/// PUT    /{id}                -> update_onboarding
/// DELETE /{id}                -> delete_onboarding
/// POST   /{id}/complete       -> complete_onboarding
/// POST   /{id}/restore        -> restore_onboarding (admin)
/// GET    /{id}/assessments    -> list_assessments
/// POST   /{id}/assessments    -> create_assessment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(onboarding::list_onboardings).post(onboarding::create_onboarding),
        )
        .route(
            "/{id}",
            get(onboarding::get_onboarding)
                .put(onboarding::update_onboarding)
                .delete(onboarding::delete_onboarding),
        )
        .route("/{id}/complete", post(onboarding::complete_onboarding))
        .route("/{id}/restore", post(onboarding::restore_onboarding))
        .route(
            "/{id}/assessments",
            get(assessment::list_assessments).post(assessment::create_assessment),
        )
}

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /{user_id}/onboarding  -> get_user_onboarding
/// ```
pub fn user_router() -> Router<AppState> {
    Router::new().route("/{user_id}/onboarding", get(onboarding::get_user_onboarding))
}
