//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`Principal`] and rejects requests whose role does
//! not meet the requirement. Finer-grained, state-dependent checks (approval
//! level, ownership, payer scope) live in `careflow_core`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use careflow_core::error::CoreError;
use careflow_core::roles::Role;

use super::auth::Principal;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(admin): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub Principal);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        if principal.role != Role::Admin {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(principal))
    }
}
