use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed or missing input.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The request is well-formed but the entity is in the wrong state for it.
    #[error("Business rule violated: {0}")]
    BusinessRule(String),

    /// Like [`CoreError::BusinessRule`], with a structured payload describing
    /// the state that blocked the operation.
    #[error("Invalid state: {message}")]
    InvalidState {
        message: String,
        details: serde_json::Value,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
