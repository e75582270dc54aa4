//! Multi-level approval chain for staff applications.
//!
//! An application walks the fixed sequence chair → treasurer → disbursement.
//! [`advance`] is the transition function: given a locked snapshot of the
//! application, the acting role and a typed decision, it returns the next
//! snapshot together with the audit entry that must be appended in the same
//! transaction.

use serde::{Deserialize, Serialize};

use crate::application::{ApplicationStatus, DisbursementStatus, ReceiptConfirmation};
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Approval level
// ---------------------------------------------------------------------------

/// A level in the approval chain. The derived ordering is the chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalLevel {
    Chair,
    Treasurer,
    Disbursement,
}

impl ApprovalLevel {
    /// Level assigned to a freshly submitted application.
    pub const fn first() -> Self {
        Self::Chair
    }

    /// The strictly next level, or `None` at the end of the chain.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Chair => Some(Self::Treasurer),
            Self::Treasurer => Some(Self::Disbursement),
            Self::Disbursement => None,
        }
    }

    pub fn is_final(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chair => "chair",
            Self::Treasurer => "treasurer",
            Self::Disbursement => "disbursement",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "chair" => Some(Self::Chair),
            "treasurer" => Some(Self::Treasurer),
            "disbursement" => Some(Self::Disbursement),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApprovalLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a sequence of levels (e.g. the `approval_level` of each audit entry
/// in creation order) never moves backward and never skips a level.
pub fn is_forward_walk(levels: &[ApprovalLevel]) -> bool {
    levels
        .windows(2)
        .all(|w| w[0] == w[1] || w[0].next() == Some(w[1]))
}

// ---------------------------------------------------------------------------
// Actions and decisions
// ---------------------------------------------------------------------------

/// Action recorded on an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Approved,
    Rejected,
    RequestedChanges,
}

impl ApprovalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::RequestedChanges => "requested_changes",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "requested_changes" => Some(Self::RequestedChanges),
            _ => None,
        }
    }
}

impl std::fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Financial details an approver may attach to an approval. Only honoured at
/// the treasurer level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinancialFields {
    pub amount: Option<i64>,
    pub cheque_number: Option<String>,
    pub disbursement_status: Option<DisbursementStatus>,
}

/// A typed approver decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approve { financials: FinancialFields },
    Reject,
    RequestChanges,
}

impl ApprovalDecision {
    pub fn action(&self) -> ApprovalAction {
        match self {
            Self::Approve { .. } => ApprovalAction::Approved,
            Self::Reject => ApprovalAction::Rejected,
            Self::RequestChanges => ApprovalAction::RequestedChanges,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot and transition
// ---------------------------------------------------------------------------

/// The mutable, rule-relevant part of an application row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationState {
    pub owner_id: DbId,
    pub status: ApplicationStatus,
    pub level: ApprovalLevel,
    pub amount: Option<i64>,
    pub cheque_number: Option<String>,
    pub disbursement_status: Option<DisbursementStatus>,
    pub disbursement_confirmed: bool,
    pub receipt_confirmation: ReceiptConfirmation,
}

impl ApplicationState {
    /// State of a freshly submitted application.
    pub fn submitted(owner_id: DbId) -> Self {
        Self {
            owner_id,
            status: ApplicationStatus::Pending,
            level: ApprovalLevel::first(),
            amount: None,
            cheque_number: None,
            disbursement_status: None,
            disbursement_confirmed: false,
            receipt_confirmation: ReceiptConfirmation::Pending,
        }
    }

    /// Diagnostic payload returned when a transition is refused.
    pub fn diagnostics(&self) -> serde_json::Value {
        serde_json::json!({
            "current_status": self.status.as_str(),
            "current_approval_level": self.level.as_str(),
            "disbursement_status": self.disbursement_status.map(|s| s.as_str()),
            "receipt_confirmation": self.receipt_confirmation.as_str(),
        })
    }
}

/// The audit entry produced by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// The level being exited (or acted on, for the disbursement sub-flow).
    pub level: ApprovalLevel,
    pub action: ApprovalAction,
    pub comments: Option<String>,
}

/// Result of a successful transition: the new snapshot plus its audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ApplicationState,
    pub log: LogEntry,
}

/// Ensure `actor` is the role empowered at the application's current level.
pub fn ensure_can_act(current: &ApplicationState, actor: Role) -> Result<(), CoreError> {
    if actor.approval_level() == Some(current.level) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "not_authorized: role '{actor}' cannot act at the '{}' approval level",
            current.level
        )))
    }
}

/// Apply an approver decision to the application.
///
/// - approve: treasurer financial fields are merged; the level moves to its
///   successor, or at the end of the chain the status becomes `approved` and
///   an unset disbursement status defaults to `pending`;
/// - reject: status `rejected`, level unchanged;
/// - request changes: status `needs_information`, level unchanged.
pub fn advance(
    current: &ApplicationState,
    actor: Role,
    decision: ApprovalDecision,
    comments: Option<String>,
) -> Result<Transition, CoreError> {
    ensure_can_act(current, actor)?;

    if !current.status.accepts_decisions() {
        return Err(CoreError::InvalidState {
            message: format!(
                "Application is already {} and accepts no further decisions",
                current.status
            ),
            details: current.diagnostics(),
        });
    }

    let exited = current.level;
    let action = decision.action();
    let mut next = current.clone();

    match decision {
        ApprovalDecision::Approve { financials } => {
            if exited == ApprovalLevel::Treasurer {
                merge_financials(&mut next, financials)?;
            }
            next.status = ApplicationStatus::Pending;
            match exited.next() {
                Some(level) => next.level = level,
                None => {
                    next.status = ApplicationStatus::Approved;
                    if next.disbursement_status.is_none() {
                        next.disbursement_status = Some(DisbursementStatus::Pending);
                    }
                }
            }
        }
        ApprovalDecision::Reject => next.status = ApplicationStatus::Rejected,
        ApprovalDecision::RequestChanges => next.status = ApplicationStatus::NeedsInformation,
    }

    Ok(Transition {
        state: next,
        log: LogEntry {
            level: exited,
            action,
            comments,
        },
    })
}

fn merge_financials(
    state: &mut ApplicationState,
    fields: FinancialFields,
) -> Result<(), CoreError> {
    if fields.disbursement_status == Some(DisbursementStatus::Completed) {
        return Err(CoreError::Validation(
            "disbursement_status 'completed' is only reachable through receipt confirmation"
                .to_string(),
        ));
    }
    if let Some(amount) = fields.amount {
        state.amount = Some(amount);
    }
    if let Some(cheque) = fields.cheque_number {
        state.cheque_number = Some(cheque);
    }
    if let Some(status) = fields.disbursement_status {
        state.disbursement_status = Some(status);
    }
    Ok(())
}
