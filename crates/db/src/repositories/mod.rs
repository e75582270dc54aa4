//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Single-statement reads and writes take `&PgPool`; steps of a multi-write
//! workflow take `&mut PgConnection` so the caller can run them inside one
//! transaction (`&mut *tx`).

pub mod application_repo;
pub mod approval_log_repo;
pub mod assessment_repo;
pub mod onboarding_repo;
pub mod payment_repo;
pub mod user_repo;

pub use application_repo::{ApplicationDocumentRepo, ApplicationRepo};
pub use approval_log_repo::ApprovalLogRepo;
pub use assessment_repo::AssessmentRepo;
pub use onboarding_repo::OnboardingRepo;
pub use payment_repo::{InsuranceRepo, MpesaPaymentRepo};
pub use user_repo::UserRepo;
