//! Application (staff claim) enumerations and input helpers.
//!
//! Every enum here is stored as TEXT; the `as_str` values must match the
//! `CHECK` constraints in `20261019000003_create_applications_table.sql`.

use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::approval::ApprovalLevel;
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

/// Prefix of every human-readable application reference.
pub const REFERENCE_PREFIX: &str = "APP";

/// Length of the random suffix appended to the submission date.
pub const REFERENCE_SUFFIX_LEN: usize = 6;

/// Maximum length of an application comment.
pub const MAX_COMMENT_LENGTH: u64 = 5_000;

// ---------------------------------------------------------------------------
// Application type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    Childbirth,
    Wedding,
    Bereavement,
    Logistics,
}

impl ApplicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Childbirth => "childbirth",
            Self::Wedding => "wedding",
            Self::Bereavement => "bereavement",
            Self::Logistics => "logistics",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "childbirth" => Some(Self::Childbirth),
            "wedding" => Some(Self::Wedding),
            "bereavement" => Some(Self::Bereavement),
            "logistics" => Some(Self::Logistics),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Application status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    NeedsInformation,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::NeedsInformation => "needs_information",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "needs_information" => Some(Self::NeedsInformation),
            _ => None,
        }
    }

    /// Whether an approver may still act on an application in this status.
    /// `needs_information` is resumable at the level where it was raised.
    pub fn accepts_decisions(&self) -> bool {
        matches!(self, Self::Pending | Self::NeedsInformation)
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Disbursement status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisbursementStatus {
    Pending,
    Processed,
    Completed,
}

impl DisbursementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processed" => Some(Self::Processed),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Receipt confirmation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptConfirmation {
    Pending,
    Received,
}

impl ReceiptConfirmation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Received => "received",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "received" => Some(Self::Received),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// Generate a human-readable application reference such as
/// `APP-20261019-K3F9QZ` (submission date plus a random suffix).
pub fn generate_reference(submitted_at: Timestamp) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(REFERENCE_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!(
        "{REFERENCE_PREFIX}-{}-{suffix}",
        submitted_at.format("%Y%m%d")
    )
}

// ---------------------------------------------------------------------------
// Amount parsing
// ---------------------------------------------------------------------------

/// Cast a loosely-typed `amount` field to a whole-currency integer.
///
/// Accepts JSON integers, floats (truncated toward zero) and numeric strings.
pub fn parse_amount(value: &serde_json::Value) -> Result<i64, CoreError> {
    let amount = match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
    .ok_or_else(|| CoreError::Validation(format!("amount '{value}' is not a number")))?;

    if amount < 0 {
        return Err(CoreError::Validation(
            "amount must not be negative".to_string(),
        ));
    }
    Ok(amount)
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// The set of applications a principal may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationScope {
    All,
    /// Approvers see the queue waiting at their own level.
    Level(ApprovalLevel),
    Owner(DbId),
}

impl ApplicationScope {
    pub fn for_principal(role: Role, user_id: DbId) -> Self {
        if role.sees_all_applications() {
            Self::All
        } else if let Some(level) = role.approval_level() {
            Self::Level(level)
        } else {
            Self::Owner(user_id)
        }
    }
}

/// Whether a principal may read a single application and its audit trail.
///
/// Approvers may read any application so that history stays visible after
/// it has moved past their level.
pub fn can_view(role: Role, actor_id: DbId, owner_id: DbId) -> bool {
    role.sees_all_applications() || role.is_approver() || actor_id == owner_id
}
