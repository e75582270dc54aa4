pub mod application;
pub mod assessment;
pub mod onboarding;
pub mod payment;
