//! User rows as seen by the workflows. Registration and credentials belong to
//! the external identity service.

use careflow_core::roles::Role;
use careflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
    pub payer_id: Option<DbId>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// The parsed role, or `None` if the stored name is outside the fixed set.
    pub fn role(&self) -> Option<Role> {
        Role::from_str(&self.role)
    }
}

/// DTO for creating a user (seeding and tests).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub role: String,
    pub payer_id: Option<DbId>,
}
