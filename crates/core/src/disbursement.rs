//! Disbursement and receipt confirmation, the terminal stage of the chain.
//!
//! Two semi-independent sub-states sit on top of an application at the
//! disbursement level: whether the disbursement officer has released funds
//! (`disbursement_confirmed` / `disbursement_status`), and whether the
//! applicant has acknowledged receiving them (`receipt_confirmation`).
//! Repeating either confirmation is allowed and appends another audit entry.

use crate::application::{ApplicationStatus, DisbursementStatus, ReceiptConfirmation};
use crate::approval::{ApplicationState, ApprovalAction, ApprovalLevel, LogEntry, Transition};
use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// Comment recorded when the applicant confirms receipt of funds.
pub const RECEIPT_CONFIRMED_COMMENT: &str =
    "Applicant confirmed receipt of disbursed funds; application closed";

/// Comment recorded when the applicant withdraws a receipt confirmation.
pub const RECEIPT_REVERTED_COMMENT: &str =
    "Applicant reverted receipt confirmation; funds marked as not yet received";

/// Record (or retract) the release of funds by the disbursement officer.
pub fn confirm_disbursement(
    current: &ApplicationState,
    actor: Role,
    confirmed: bool,
    comment: Option<String>,
) -> Result<Transition, CoreError> {
    if actor != Role::Disbursement {
        return Err(CoreError::Forbidden(format!(
            "not_authorized: role '{actor}' cannot confirm disbursements"
        )));
    }

    if current.level != ApprovalLevel::Disbursement || current.status == ApplicationStatus::Rejected
    {
        return Err(CoreError::InvalidState {
            message: "Application has not reached an open disbursement stage".to_string(),
            details: current.diagnostics(),
        });
    }

    if current.disbursement_status == Some(DisbursementStatus::Completed) {
        return Err(CoreError::InvalidState {
            message: "Disbursement is already completed by the applicant's receipt confirmation"
                .to_string(),
            details: current.diagnostics(),
        });
    }

    let mut next = current.clone();
    next.disbursement_confirmed = confirmed;
    next.disbursement_status = Some(if confirmed {
        DisbursementStatus::Processed
    } else {
        DisbursementStatus::Pending
    });

    Ok(Transition {
        state: next,
        log: LogEntry {
            level: ApprovalLevel::Disbursement,
            action: if confirmed {
                ApprovalAction::Approved
            } else {
                ApprovalAction::Rejected
            },
            comments: comment,
        },
    })
}

/// Whether the applicant may confirm (or retract) receipt.
///
/// Ready means the application is pending at the disbursement level, or a
/// disbursement is pending/processed, or receipt was already confirmed
/// (re-confirmation). Rejected applications are never ready.
pub fn is_receipt_ready(state: &ApplicationState) -> bool {
    if state.status == ApplicationStatus::Rejected {
        return false;
    }
    let pending_at_disbursement = state.status == ApplicationStatus::Pending
        && state.level == ApprovalLevel::Disbursement;
    let disbursement_open = matches!(
        state.disbursement_status,
        Some(DisbursementStatus::Processed | DisbursementStatus::Pending)
    );
    let already_received = state.receipt_confirmation == ReceiptConfirmation::Received;

    pending_at_disbursement || disbursement_open || already_received
}

/// Record the applicant's acknowledgement (or retraction) of received funds.
pub fn confirm_receipt(
    current: &ApplicationState,
    actor_id: DbId,
    value: ReceiptConfirmation,
) -> Result<Transition, CoreError> {
    if actor_id != current.owner_id {
        return Err(CoreError::Forbidden(
            "Only the applicant can confirm receipt of funds".to_string(),
        ));
    }

    if !is_receipt_ready(current) {
        return Err(CoreError::InvalidState {
            message: "Application is not ready for receipt confirmation".to_string(),
            details: current.diagnostics(),
        });
    }

    let mut next = current.clone();
    next.receipt_confirmation = value;

    let log = match value {
        ReceiptConfirmation::Received => {
            next.disbursement_status = Some(DisbursementStatus::Completed);
            next.status = ApplicationStatus::Approved;
            LogEntry {
                level: ApprovalLevel::Disbursement,
                action: ApprovalAction::Approved,
                comments: Some(RECEIPT_CONFIRMED_COMMENT.to_string()),
            }
        }
        ReceiptConfirmation::Pending => {
            next.disbursement_status = Some(DisbursementStatus::Processed);
            LogEntry {
                level: ApprovalLevel::Disbursement,
                action: ApprovalAction::RequestedChanges,
                comments: Some(RECEIPT_REVERTED_COMMENT.to_string()),
            }
        }
    };

    Ok(Transition { state: next, log })
}
