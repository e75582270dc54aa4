//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize`/plain create DTOs for inserts
//! - Update DTOs (all `Option` fields) where the entity supports patches

pub mod application;
pub mod approval_log;
pub mod assessment;
pub mod onboarding;
pub mod payment;
pub mod user;
