//! Authentication and authorization extractors.
//!
//! - [`auth::Principal`] -- The authenticated caller, resolved from a JWT
//!   Bearer token and the `users` table.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.

pub mod auth;
pub mod rbac;
