use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use careflow_core::error::CoreError;
use serde_json::json;

/// Whether 500 responses carry the internal error text under
/// `details.internal`. Set once at router construction from
/// [`ServerConfig::expose_internal_errors`](crate::config::ServerConfig).
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

/// Field name -> human-readable messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce the failure envelope:
///
/// ```json
/// { "success": false, "message": "...", "code": "...", "errors": {...}, "details": {...} }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `careflow_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request DTO validation failures from `validator`.
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Field-keyed validation failures raised by domain checks.
    #[error("{message}")]
    Fields { message: String, errors: FieldErrors },

    /// The body could not be parsed as the expected JSON shape.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Status, code, message, and optional `errors` / `details` payloads.
struct Failure {
    status: StatusCode,
    code: &'static str,
    message: String,
    errors: Option<FieldErrors>,
    details: Option<serde_json::Value>,
}

impl Failure {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            errors: None,
            details: None,
        }
    }

    fn internal(source: &str) -> Self {
        let mut failure = Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        );
        if EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed) {
            failure.details = Some(json!({ "internal": source }));
        }
        failure
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let failure = match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => Failure::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    Failure::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", msg)
                }
                CoreError::BusinessRule(msg) => {
                    Failure::new(StatusCode::BAD_REQUEST, "BUSINESS_RULE_VIOLATION", msg)
                }
                CoreError::InvalidState { message, details } => Failure {
                    details: Some(details),
                    ..Failure::new(StatusCode::BAD_REQUEST, "BUSINESS_RULE_VIOLATION", message)
                },
                CoreError::Unauthorized(msg) => {
                    Failure::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
                }
                CoreError::Forbidden(msg) => Failure::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    Failure::internal(&msg)
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(&err),

            // --- Request validation ---
            AppError::Validation(errs) => Failure {
                errors: Some(field_errors(&errs)),
                ..Failure::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    "The given data was invalid",
                )
            },
            AppError::Fields { message, errors } => Failure {
                errors: Some(errors),
                ..Failure::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
            },
            AppError::InvalidBody(msg) => {
                Failure::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", msg)
            }

            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                Failure::internal(&msg)
            }
        };

        let mut body = json!({
            "success": false,
            "message": failure.message,
            "code": failure.code,
        });
        if let Some(errors) = failure.errors {
            body["errors"] = json!(errors);
        }
        if let Some(details) = failure.details {
            body["details"] = details;
        }

        (failure.status, axum::Json(body)).into_response()
    }
}

/// Flatten `validator` output into the field-keyed error map.
fn field_errors(errs: &validator::ValidationErrors) -> FieldErrors {
    errs.field_errors()
        .into_iter()
        .map(|(field, list)| {
            let messages = list
                .iter()
                .map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{field} is invalid ({})", e.code),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Classify a sqlx error into the failure envelope.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map
///   to 400: a duplicate is a business-rule rejection, never a 500.
/// - Foreign key violations map to 422.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Failure {
    match err {
        sqlx::Error::RowNotFound => {
            Failure::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
        }
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return Failure::new(
                        StatusCode::BAD_REQUEST,
                        "BUSINESS_RULE_VIOLATION",
                        duplicate_message(constraint),
                    );
                }
            }
            // Foreign key violation: the request named a row that does not exist.
            if db_err.code().as_deref() == Some("23503") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                return Failure::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_ERROR",
                    format!("Referenced record does not exist: {constraint}"),
                );
            }
            tracing::error!(error = %db_err, "Database error");
            Failure::internal(&db_err.to_string())
        }
        other => {
            tracing::error!(error = %other, "Database error");
            Failure::internal(&other.to_string())
        }
    }
}

fn duplicate_message(constraint: &str) -> String {
    match constraint {
        "uq_onboardings_user_id" => "User already has an onboarding".to_string(),
        _ => format!("Duplicate value violates unique constraint: {constraint}"),
    }
}
