//! The closed set of principal roles and the capability predicates derived
//! from them.
//!
//! Role names must match the `CHECK` constraint on `users.role` in
//! `20261019000002_create_users_table.sql`.

use serde::{Deserialize, Serialize};

use crate::approval::ApprovalLevel;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
pub const ROLE_NAVIGATOR: &str = "navigator";
pub const ROLE_PAYER: &str = "payer";
pub const ROLE_CLAIMS: &str = "claims";
pub const ROLE_CHAIR: &str = "chair";
pub const ROLE_TREASURER: &str = "treasurer";
pub const ROLE_DISBURSEMENT: &str = "disbursement";

/// Role tag carried by every authenticated principal. Immutable for the
/// lifetime of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
    Navigator,
    Payer,
    Claims,
    Chair,
    Treasurer,
    Disbursement,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::User => ROLE_USER,
            Self::Navigator => ROLE_NAVIGATOR,
            Self::Payer => ROLE_PAYER,
            Self::Claims => ROLE_CLAIMS,
            Self::Chair => ROLE_CHAIR,
            Self::Treasurer => ROLE_TREASURER,
            Self::Disbursement => ROLE_DISBURSEMENT,
        }
    }

    /// Parse a role name. Returns `None` for names outside the fixed set.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            ROLE_ADMIN => Some(Self::Admin),
            ROLE_USER => Some(Self::User),
            ROLE_NAVIGATOR => Some(Self::Navigator),
            ROLE_PAYER => Some(Self::Payer),
            ROLE_CLAIMS => Some(Self::Claims),
            ROLE_CHAIR => Some(Self::Chair),
            ROLE_TREASURER => Some(Self::Treasurer),
            ROLE_DISBURSEMENT => Some(Self::Disbursement),
            _ => None,
        }
    }

    /// The approval level this role is empowered to act on, if any.
    pub fn approval_level(&self) -> Option<ApprovalLevel> {
        match self {
            Self::Chair => Some(ApprovalLevel::Chair),
            Self::Treasurer => Some(ApprovalLevel::Treasurer),
            Self::Disbursement => Some(ApprovalLevel::Disbursement),
            _ => None,
        }
    }

    pub fn is_approver(&self) -> bool {
        self.approval_level().is_some()
    }

    /// Staff roles that see every application regardless of level or owner.
    pub fn sees_all_applications(&self) -> bool {
        matches!(self, Self::Admin | Self::Claims)
    }

    /// Roles allowed to create an onboarding, either for themselves (`user`)
    /// or by proxy for a patient.
    pub fn can_create_onboarding(&self) -> bool {
        matches!(
            self,
            Self::Admin | Self::Navigator | Self::Payer | Self::User | Self::Claims
        )
    }

    /// Staff roles that see every onboarding.
    pub fn sees_all_onboardings(&self) -> bool {
        matches!(self, Self::Admin | Self::Navigator | Self::Claims)
    }

    /// Roles that may confirm or inspect any simulated payment record, not
    /// just their own.
    pub fn manages_payments(&self) -> bool {
        matches!(self, Self::Admin | Self::Navigator)
    }

    /// Roles whose onboarding visibility is narrowed to their payer affiliation.
    pub fn is_payer_scoped(&self) -> bool {
        matches!(self, Self::Payer)
    }

    /// Roles that may only ever see records they own.
    pub fn is_self_scoped(&self) -> bool {
        matches!(self, Self::User)
    }

    pub const ALL: &'static [Role] = &[
        Self::Admin,
        Self::User,
        Self::Navigator,
        Self::Payer,
        Self::Claims,
        Self::Chair,
        Self::Treasurer,
        Self::Disbursement,
    ];
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
