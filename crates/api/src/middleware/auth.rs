//! JWT-based principal extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use careflow_core::error::CoreError;
use careflow_core::onboarding::{Creator, OnboardingScope};
use careflow_core::roles::Role;
use careflow_core::types::DbId;
use careflow_db::repositories::UserRepo;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller.
///
/// The token only proves *who* the caller is; role, payer affiliation and
/// active flag are read from the `users` table so a role change takes effect
/// on the next request.
///
/// ```ignore
/// async fn my_handler(principal: Principal) -> AppResult<Json<()>> {
///     tracing::info!(user_id = principal.user_id, role = %principal.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: DbId,
    pub role: Role,
    pub payer_id: Option<DbId>,
    pub is_active: bool,
}

impl Principal {
    /// The onboardings this principal may read or mutate.
    pub fn onboarding_scope(&self) -> Result<OnboardingScope, CoreError> {
        OnboardingScope::for_principal(self.role, self.user_id, self.payer_id)
    }

    pub fn as_creator(&self) -> Creator {
        Creator {
            user_id: self.user_id,
            role: self.role,
            is_active: self.is_active,
            payer_id: self.payer_id,
        }
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        let user = UserRepo::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;

        let role = user.role().ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(format!(
                "Role '{}' is not recognised",
                user.role
            )))
        })?;

        Ok(Principal {
            user_id: user.id,
            role,
            payer_id: user.payer_id,
            is_active: user.is_active,
        })
    }
}
