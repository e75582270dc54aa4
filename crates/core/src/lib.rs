//! Domain rules for the careflow administration backend.
//!
//! Everything in this crate is pure: no database, no async, no I/O. The DB and
//! API layers load rows, hand snapshots to these functions, and persist
//! whatever they decide.

pub mod application;
pub mod approval;
pub mod assessment;
pub mod disbursement;
pub mod error;
pub mod onboarding;
pub mod payment;
pub mod roles;
pub mod types;
