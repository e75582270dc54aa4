//! Route definitions for the `/applications` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::application;
use crate::state::AppState;

/// Routes mounted at `/applications`.
///
/// ```text
/// GET    /                                -> list_applications
/// POST   /                                -> submit_application
/// GET    /{id}                            -> get_application
/// DELETE /{id}                            -> delete_application (admin)
/// GET    /{id}/logs                       -> list_application_logs
/// POST   /{id}/status                     -> update_status
/// PUT    /{id}/disbursement-confirmation  -> update_disbursement_confirmation
/// PUT    /{id}/receipt-confirmation       -> update_receipt_confirmation
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(application::list_applications).post(application::submit_application),
        )
        .route(
            "/{id}",
            get(application::get_application).delete(application::delete_application),
        )
        .route("/{id}/logs", get(application::list_application_logs))
        .route("/{id}/status", post(application::update_status))
        .route(
            "/{id}/disbursement-confirmation",
            put(application::update_disbursement_confirmation),
        )
        .route(
            "/{id}/receipt-confirmation",
            put(application::update_receipt_confirmation),
        )
}
