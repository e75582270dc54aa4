//! Onboarding (patient enrollment) rules: who may create one, whose records a
//! principal can see, and when an enrollment counts as active.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// Message returned to payer principals with no payer affiliation.
pub const PAYER_ID_NOT_SET: &str = "payer_id not set";

// ---------------------------------------------------------------------------
// Payment status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Approved,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Approved => "approved",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "approved" => Some(Self::Approved),
            _ => None,
        }
    }

    /// An onboarding is active exactly when its payment is settled.
    pub fn activates(&self) -> bool {
        matches!(self, Self::Completed | Self::Approved)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Diagnoses
// ---------------------------------------------------------------------------

/// Enrolled condition. Drives which measurements later assessments require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    Diabetes,
    Cardiovascular,
    Obesity,
}

impl Diagnosis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diabetes => "diabetes",
            Self::Cardiovascular => "cardiovascular",
            Self::Obesity => "obesity",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "diabetes" => Some(Self::Diabetes),
            "cardiovascular" => Some(Self::Cardiovascular),
            "obesity" => Some(Self::Obesity),
            _ => None,
        }
    }
}

/// Parse stored diagnosis names, ignoring duplicates. Unknown names are an error.
pub fn parse_diagnoses(names: &[String]) -> Result<Vec<Diagnosis>, CoreError> {
    let mut out: Vec<Diagnosis> = Vec::with_capacity(names.len());
    for name in names {
        let d = Diagnosis::from_str(name).ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid diagnosis '{name}'. Must be one of: diabetes, cardiovascular, obesity"
            ))
        })?;
        if !out.contains(&d) {
            out.push(d);
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// The set of onboardings a principal may read or mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingScope {
    All,
    Payer(DbId),
    Owner(DbId),
}

impl OnboardingScope {
    /// Resolve the scope of a principal.
    pub fn for_principal(
        role: Role,
        user_id: DbId,
        payer_id: Option<DbId>,
    ) -> Result<Self, CoreError> {
        if role.sees_all_onboardings() {
            Ok(Self::All)
        } else if role.is_payer_scoped() {
            payer_id
                .map(Self::Payer)
                .ok_or_else(|| CoreError::Forbidden(PAYER_ID_NOT_SET.to_string()))
        } else if role.is_self_scoped() {
            Ok(Self::Owner(user_id))
        } else {
            Err(CoreError::Forbidden(format!(
                "Role '{role}' has no access to onboardings"
            )))
        }
    }

    pub fn permits(&self, owner_id: DbId, payer_id: Option<DbId>) -> bool {
        match *self {
            Self::All => true,
            Self::Payer(p) => payer_id == Some(p),
            Self::Owner(u) => owner_id == u,
        }
    }
}

// ---------------------------------------------------------------------------
// Creation preconditions
// ---------------------------------------------------------------------------

/// The creating principal, as far as onboarding rules care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Creator {
    pub user_id: DbId,
    pub role: Role,
    pub is_active: bool,
    pub payer_id: Option<DbId>,
}

/// Who will own the new onboarding, and which payer it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreationTarget {
    pub owner_id: DbId,
    pub payer_id: Option<DbId>,
}

/// Check the creator's eligibility and resolve owner and payer.
///
/// Users onboard themselves; staff onboard a patient by passing `user_id`.
/// A payer always attaches its own affiliation.
pub fn resolve_creation(
    creator: &Creator,
    requested_user_id: Option<DbId>,
    requested_payer_id: Option<DbId>,
) -> Result<CreationTarget, CoreError> {
    if !creator.role.can_create_onboarding() {
        return Err(CoreError::Forbidden(format!(
            "Role '{}' cannot create onboardings",
            creator.role
        )));
    }
    if !creator.is_active {
        return Err(CoreError::Forbidden("Account is inactive".to_string()));
    }

    let payer_id = if creator.role.is_payer_scoped() {
        let own = creator
            .payer_id
            .ok_or_else(|| CoreError::Forbidden(PAYER_ID_NOT_SET.to_string()))?;
        if requested_payer_id.is_some_and(|p| p != own) {
            return Err(CoreError::Forbidden(
                "Payers can only onboard patients under their own payer".to_string(),
            ));
        }
        Some(own)
    } else {
        requested_payer_id
    };

    let owner_id = if creator.role.is_self_scoped() {
        creator.user_id
    } else {
        requested_user_id.ok_or_else(|| {
            CoreError::Validation(
                "user_id is required when onboarding on behalf of a patient".to_string(),
            )
        })?
    };

    Ok(CreationTarget { owner_id, payer_id })
}

// ---------------------------------------------------------------------------
// Lifecycle guards
// ---------------------------------------------------------------------------

/// Reject a second completion of the same onboarding.
pub fn ensure_can_complete(current: PaymentStatus) -> Result<(), CoreError> {
    if current == PaymentStatus::Completed {
        return Err(CoreError::BusinessRule(
            "Onboarding payment is already completed".to_string(),
        ));
    }
    Ok(())
}

/// Clinical assessments may only be recorded against an approved onboarding.
pub fn ensure_assessable(current: PaymentStatus) -> Result<(), CoreError> {
    if current != PaymentStatus::Approved {
        return Err(CoreError::BusinessRule(format!(
            "Assessments require an approved onboarding payment (current: {current})"
        )));
    }
    Ok(())
}

/// Check a requested `payment_status` change made through an update.
///
/// Only staff who see every onboarding may move payment status, a settled
/// payment never returns to pending, and completion is not repeatable.
pub fn ensure_status_change(
    role: Role,
    current: PaymentStatus,
    requested: PaymentStatus,
) -> Result<(), CoreError> {
    if !role.sees_all_onboardings() {
        return Err(CoreError::Forbidden(format!(
            "Role '{role}' cannot change onboarding payment status"
        )));
    }
    if requested == PaymentStatus::Pending && current.activates() {
        return Err(CoreError::BusinessRule(format!(
            "Onboarding payment is already {current} and cannot return to pending"
        )));
    }
    if requested == PaymentStatus::Completed {
        ensure_can_complete(current)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn creator(role: Role) -> Creator {
        Creator {
            user_id: 10,
            role,
            is_active: true,
            payer_id: None,
        }
    }

    #[test]
    fn only_settled_payments_activate() {
        assert!(!PaymentStatus::Pending.activates());
        assert!(PaymentStatus::Completed.activates());
        assert!(PaymentStatus::Approved.activates());
    }

    #[test]
    fn staff_see_everything() {
        for role in [Role::Admin, Role::Navigator, Role::Claims] {
            assert_eq!(
                OnboardingScope::for_principal(role, 1, None).unwrap(),
                OnboardingScope::All
            );
        }
    }

    #[test]
    fn payer_scope_requires_affiliation() {
        assert_matches!(
            OnboardingScope::for_principal(Role::Payer, 1, None),
            Err(CoreError::Forbidden(msg)) if msg == PAYER_ID_NOT_SET
        );
        let scope = OnboardingScope::for_principal(Role::Payer, 1, Some(4)).unwrap();
        assert!(scope.permits(99, Some(4)));
        assert!(!scope.permits(99, Some(5)));
        assert!(!scope.permits(99, None));
    }

    #[test]
    fn users_see_only_their_own() {
        let scope = OnboardingScope::for_principal(Role::User, 8, None).unwrap();
        assert!(scope.permits(8, None));
        assert!(!scope.permits(9, None));
    }

    #[test]
    fn approvers_have_no_onboarding_access() {
        assert_matches!(
            OnboardingScope::for_principal(Role::Treasurer, 1, None),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn user_onboards_themselves() {
        let target = resolve_creation(&creator(Role::User), Some(555), None).unwrap();
        assert_eq!(target.owner_id, 10);
    }

    #[test]
    fn staff_must_name_the_patient() {
        assert_matches!(
            resolve_creation(&creator(Role::Navigator), None, None),
            Err(CoreError::Validation(_))
        );
        let target = resolve_creation(&creator(Role::Navigator), Some(20), Some(3)).unwrap();
        assert_eq!(target, CreationTarget { owner_id: 20, payer_id: Some(3) });
    }

    #[test]
    fn payer_creation_pins_affiliation() {
        assert_matches!(
            resolve_creation(&creator(Role::Payer), Some(20), None),
            Err(CoreError::Forbidden(msg)) if msg == PAYER_ID_NOT_SET
        );

        let payer = Creator {
            payer_id: Some(6),
            ..creator(Role::Payer)
        };
        assert_eq!(
            resolve_creation(&payer, Some(20), None).unwrap().payer_id,
            Some(6)
        );
        assert_matches!(
            resolve_creation(&payer, Some(20), Some(7)),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn inactive_or_ineligible_creators_are_rejected() {
        let inactive = Creator {
            is_active: false,
            ..creator(Role::Admin)
        };
        assert_matches!(resolve_creation(&inactive, Some(1), None), Err(CoreError::Forbidden(_)));
        assert_matches!(
            resolve_creation(&creator(Role::Chair), Some(1), None),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn completion_is_not_repeatable() {
        assert!(ensure_can_complete(PaymentStatus::Pending).is_ok());
        assert!(ensure_can_complete(PaymentStatus::Approved).is_ok());
        assert_matches!(
            ensure_can_complete(PaymentStatus::Completed),
            Err(CoreError::BusinessRule(_))
        );
    }

    #[test]
    fn assessments_need_approved_payment() {
        assert!(ensure_assessable(PaymentStatus::Approved).is_ok());
        assert_matches!(
            ensure_assessable(PaymentStatus::Completed),
            Err(CoreError::BusinessRule(_))
        );
        assert_matches!(
            ensure_assessable(PaymentStatus::Pending),
            Err(CoreError::BusinessRule(_))
        );
    }

    #[test]
    fn diagnoses_parse_and_dedupe() {
        let parsed =
            parse_diagnoses(&["diabetes".into(), "obesity".into(), "diabetes".into()]).unwrap();
        assert_eq!(parsed, vec![Diagnosis::Diabetes, Diagnosis::Obesity]);
        assert_matches!(parse_diagnoses(&["asthma".into()]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn status_changes_are_staff_only_and_monotonic() {
        assert!(
            ensure_status_change(Role::Admin, PaymentStatus::Completed, PaymentStatus::Approved)
                .is_ok()
        );
        assert!(ensure_status_change(
            Role::Navigator,
            PaymentStatus::Pending,
            PaymentStatus::Completed
        )
        .is_ok());
        assert_matches!(
            ensure_status_change(Role::User, PaymentStatus::Pending, PaymentStatus::Approved),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            ensure_status_change(Role::Payer, PaymentStatus::Pending, PaymentStatus::Approved),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            ensure_status_change(Role::Admin, PaymentStatus::Approved, PaymentStatus::Pending),
            Err(CoreError::BusinessRule(_))
        );
        assert_matches!(
            ensure_status_change(Role::Admin, PaymentStatus::Completed, PaymentStatus::Completed),
            Err(CoreError::BusinessRule(_))
        );
    }
}
