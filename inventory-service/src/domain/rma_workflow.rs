//! RMA status workflow.
//!
//! The transition table is enforced here, server-side, rather than by
//! disabling buttons in a client. Approval is gated on warranty validity;
//! once a request leaves `Pending` it can never be rejected, and the three
//! terminal states admit no further change.

use crate::domain::DomainError;
use crate::models::{RmaRequest, RmaStatus, WarrantyStatus};
use mongodb::bson::{doc, Document};

impl RmaStatus {
    /// Legal workflow moves:
    ///
    ///   Pending     -> Approved | Rejected | In Progress
    ///   Approved    -> In Progress
    ///   In Progress -> Completed | Expired
    ///
    /// The approve/reject decision is final: once either is recorded the
    /// other is unreachable, only forward progression remains.
    pub fn can_transition(self, to: RmaStatus) -> bool {
        matches!(
            (self, to),
            (RmaStatus::Pending, RmaStatus::Approved)
                | (RmaStatus::Pending, RmaStatus::Rejected)
                | (RmaStatus::Pending, RmaStatus::InProgress)
                | (RmaStatus::Approved, RmaStatus::InProgress)
                | (RmaStatus::InProgress, RmaStatus::Completed)
                | (RmaStatus::InProgress, RmaStatus::Expired)
        )
    }
}

/// Validate a requested status change against the workflow table and the
/// warranty gate.
pub fn guard_rma_transition(rma: &RmaRequest, to: RmaStatus) -> Result<(), DomainError> {
    if !rma.status.can_transition(to) {
        return Err(DomainError::InvalidRmaTransition {
            from: rma.status,
            to,
        });
    }
    if to == RmaStatus::Approved && rma.warranty_status == WarrantyStatus::Expired {
        return Err(DomainError::WarrantyExpired {
            rma_id: rma.rma_id.clone(),
        });
    }
    Ok(())
}

/// Unit lifecycle side effect of an applied RMA transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSideEffect {
    /// Approval: the sold unit moves to `rma`.
    MoveToRma,
    /// Completion with a "Replace" resolution: the original unit settles at
    /// `replace` and a replacement unit is provisioned and sold.
    Replace,
    /// Completion with any other resolution: the unit goes back to `sold`.
    ReturnToSold,
}

pub fn unit_side_effect(to: RmaStatus, process: Option<&str>) -> Option<UnitSideEffect> {
    match to {
        RmaStatus::Approved => Some(UnitSideEffect::MoveToRma),
        RmaStatus::Completed => {
            if process.is_some_and(|p| p.eq_ignore_ascii_case("replace")) {
                Some(UnitSideEffect::Replace)
            } else {
                Some(UnitSideEffect::ReturnToSold)
            }
        }
        _ => None,
    }
}

/// Field-level diff for the audit record.
///
/// Compares `status`, `process` and `notes` independently and returns the
/// (previous, updated) documents containing only the fields that changed.
pub fn field_changes(
    rma: &RmaRequest,
    status: Option<RmaStatus>,
    process: Option<&str>,
    notes: Option<&str>,
) -> (Document, Document) {
    let mut previous = doc! {};
    let mut updated = doc! {};

    if let Some(new_status) = status {
        if new_status != rma.status {
            previous.insert("status", rma.status.as_str());
            updated.insert("status", new_status.as_str());
        }
    }
    if let Some(new_process) = process {
        if rma.process.as_deref() != Some(new_process) {
            previous.insert("process", rma.process.clone().unwrap_or_default());
            updated.insert("process", new_process);
        }
    }
    if let Some(new_notes) = notes {
        if rma.notes.as_deref() != Some(new_notes) {
            previous.insert("notes", rma.notes.clone().unwrap_or_default());
            updated.insert("notes", new_notes);
        }
    }

    (previous, updated)
}
