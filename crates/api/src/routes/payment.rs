//! Route definitions for simulated payment evidence.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payment;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// POST   /mpesa               -> create_mpesa_payment
/// GET    /mpesa/{id}          -> get_mpesa_payment
/// POST   /mpesa/{id}/confirm  -> confirm_mpesa_payment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mpesa", post(payment::create_mpesa_payment))
        .route("/mpesa/{id}", get(payment::get_mpesa_payment))
        .route("/mpesa/{id}/confirm", post(payment::confirm_mpesa_payment))
}

/// Routes mounted at `/insurance`.
///
/// ```text
/// POST   /        -> create_insurance
/// GET    /{id}    -> get_insurance
/// ```
pub fn insurance_router() -> Router<AppState> {
    Router::new()
        .route("/", post(payment::create_insurance))
        .route("/{id}", get(payment::get_insurance))
}
