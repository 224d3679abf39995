//! # Status transitions
//!
//! Invoice status changes are expressed as typed commands. Each command fixes
//! exactly which fields change:
//!
//! | Command    | From                  | To          | Stamps          |
//! |------------|-----------------------|-------------|-----------------|
//! | `Submit`   | `New`                 | `Submitted` | `submitted_on`  |
//! | `MarkPaid` | `Submitted`           | `Paid`      | `paid_on`       |
//! | `Reject`   | `New` \| `Submitted`  | `Rejected`  | nothing         |
//!
//! Every other pair, including any move out of `Paid` or `Rejected`, is
//! refused with [`TransitionError`].

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{Invoice, InvoiceStatus};

/// A requested status change.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvoiceCommand {
    /// The invoice was handed to the bank.
    Submit,
    /// The bank paid the invoice out of the depot.
    MarkPaid,
    /// The bank refused the invoice.
    Reject,
}

impl InvoiceCommand {
    pub fn target(&self) -> InvoiceStatus {
        match self {
            Self::Submit => InvoiceStatus::Submitted,
            Self::MarkPaid => InvoiceStatus::Paid,
            Self::Reject => InvoiceStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invoice cannot move from `{from}` to `{to}`")]
pub struct TransitionError {
    pub from: InvoiceStatus,
    pub to: InvoiceStatus,
}

/// The full set of fields written by a status change.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatusChange {
    pub status: InvoiceStatus,
    pub submitted_on: Option<NaiveDate>,
    pub paid_on: Option<NaiveDate>,
}

impl StatusChange {
    /// Write the change into an in-memory invoice.
    pub fn apply_to(&self, invoice: &mut Invoice) {
        invoice.status = self.status;
        invoice.submitted_on = self.submitted_on;
        invoice.paid_on = self.paid_on;
    }
}

/// Whether `from → to` is an allowed transition.
pub fn can_transition(from: InvoiceStatus, to: InvoiceStatus) -> bool {
    matches!(
        (from, to),
        (InvoiceStatus::New, InvoiceStatus::Submitted)
            | (InvoiceStatus::Submitted, InvoiceStatus::Paid)
            | (InvoiceStatus::New, InvoiceStatus::Rejected)
            | (InvoiceStatus::Submitted, InvoiceStatus::Rejected)
    )
}

/// Resolve `command` against the current state of `invoice`.
///
/// `today` is the transition date; it is never backfilled from the invoice
/// date. Dates already stamped by an earlier transition are preserved.
pub fn plan(
    invoice: &Invoice,
    command: InvoiceCommand,
    today: NaiveDate,
) -> Result<StatusChange, TransitionError> {
    let from = invoice.status;
    let to = command.target();
    if !can_transition(from, to) {
        return Err(TransitionError { from, to });
    }

    let mut change = StatusChange {
        status: to,
        submitted_on: invoice.submitted_on,
        paid_on: invoice.paid_on,
    };
    match command {
        InvoiceCommand::Submit => change.submitted_on = Some(today),
        InvoiceCommand::MarkPaid => change.paid_on = Some(today),
        InvoiceCommand::Reject => {}
    }
    Ok(change)
}
