pub mod application;
pub mod health;
pub mod onboarding;
pub mod payment;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /applications                                    list, submit
/// /applications/{id}                               detail, delete (admin)
/// /applications/{id}/logs                          approval audit trail
/// /applications/{id}/status                        approver decision (POST)
/// /applications/{id}/disbursement-confirmation     disbursement officer (PUT)
/// /applications/{id}/receipt-confirmation          applicant (PUT)
///
/// /onboardings                                     list, create (payment-gated)
/// /onboardings/{id}                                get, update, delete
/// /onboardings/{id}/complete                       complete payment (POST)
/// /onboardings/{id}/restore                        undo soft delete (POST, admin)
/// /onboardings/{id}/assessments                    list, record
///
/// /users/{user_id}/onboarding                      onboarding of one user
///
/// /payments/mpesa                                  record simulated payment
/// /payments/mpesa/{id}                             get
/// /payments/mpesa/{id}/confirm                     simulated gateway callback
///
/// /insurance                                       record policy
/// /insurance/{id}                                  get
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Staff applications and the approval chain.
        .nest("/applications", application::router())
        // Payment-gated onboarding and clinical assessments.
        .nest("/onboardings", onboarding::router())
        .nest("/users", onboarding::user_router())
        // Simulated payment evidence.
        .nest("/payments", payment::router())
        .nest("/insurance", payment::insurance_router())
}
