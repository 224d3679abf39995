//! # Types
//!
//! Shared data structures used across all modules of the ledger.
//!
//! ## Design decisions
//!
//! ### Money as integer cents
//!
//! Every amount is an [`Cents`] (`i64`). Sums never touch floating point; display
//! formatting (currency symbol, locale) happens outside this crate.
//!
//! ### Status as a Finite-State Machine
//!
//! [`InvoiceStatus`] follows a forward-only lifecycle:
//!
//! ```text
//! New ──► Submitted ──► Paid
//!  │          │
//!  └──────────┴──► Rejected
//! ```
//!
//! `Paid` and `Rejected` are terminal. The transition rules live in
//! [`crate::status`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Amount in euro cents.
pub type Cents = i64;

/// Database identifier of a depot or invoice.
pub type RecordId = i64;

/// Lifecycle status of an invoice.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Received from the contractor, not yet handed to the bank.
    #[serde(alias = "nieuw")]
    New,
    /// Handed to the bank; payout is being processed.
    #[serde(alias = "ingediend")]
    Submitted,
    /// Paid out from the depot.
    #[serde(alias = "uitbetaald")]
    Paid,
    /// Refused by the bank.
    #[serde(alias = "afgewezen")]
    Rejected,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 4] = [
        InvoiceStatus::New,
        InvoiceStatus::Submitted,
        InvoiceStatus::Paid,
        InvoiceStatus::Rejected,
    ];

    /// Return the identifier string used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Submitted => "submitted",
            Self::Paid => "paid",
            Self::Rejected => "rejected",
        }
    }

    /// `true` for states that accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Rejected)
    }

    /// Invoices that still need action from the depot holder or the bank.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::New | Self::Submitted)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown invoice status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for InvoiceStatus {
    type Err = UnknownStatus;

    /// Accepts the storage names as well as the Dutch labels used by
    /// earlier exports (`nieuw`, `ingediend`, `uitbetaald`, `afgewezen`),
    /// the same set serde accepts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" | "nieuw" => Ok(Self::New),
            "submitted" | "ingediend" => Ok(Self::Submitted),
            "paid" | "uitbetaald" => Ok(Self::Paid),
            "rejected" | "afgewezen" => Ok(Self::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Bank that holds the depot.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Bank {
    Ing,
    Rabobank,
    AbnAmro,
    SnsBank,
    Volksbank,
    Triodos,
    AsnBank,
    /// The generic "Andere bank" choice.
    AnotherBank,
    /// Free-text issuer not in the list above.
    Other(String),
}

impl Bank {
    /// Banks offered on the depot form, in display order.
    pub const KNOWN: [Bank; 8] = [
        Bank::Ing,
        Bank::Rabobank,
        Bank::AbnAmro,
        Bank::SnsBank,
        Bank::Volksbank,
        Bank::Triodos,
        Bank::AsnBank,
        Bank::AnotherBank,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::Ing => "ING",
            Self::Rabobank => "Rabobank",
            Self::AbnAmro => "ABN AMRO",
            Self::SnsBank => "SNS Bank",
            Self::Volksbank => "Volksbank",
            Self::Triodos => "Triodos",
            Self::AsnBank => "ASN Bank",
            Self::AnotherBank => "Andere bank",
            Self::Other(name) => name,
        }
    }

    /// Map a label back to a bank. Returns `None` for a blank label; any
    /// unrecognised text becomes [`Bank::Other`].
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        let known = Self::KNOWN
            .iter()
            .find(|b| b.label().eq_ignore_ascii_case(label))
            .cloned();
        Some(known.unwrap_or_else(|| Self::Other(label.to_string())))
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Bank {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Bank {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Bank::from_label(&label).ok_or_else(|| serde::de::Error::custom("bank label is empty"))
    }
}

/// A construction depot as owned by one user.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Depot {
    pub id: RecordId,
    /// Opaque user reference supplied by the identity provider.
    pub owner_id: String,
    pub name: String,
    pub bank: Bank,
    /// Total amount reserved in the mortgage for construction.
    pub total_cents: Cents,
    pub start_date: NaiveDate,
    /// Last day on which invoices can be paid out.
    pub expiry_date: NaiveDate,
    pub description: Option<String>,
    /// Unix epoch seconds.
    pub created_at: i64,
}

/// A payout claim against a depot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: RecordId,
    pub depot_id: RecordId,
    /// Contractor or supplier requesting payment.
    pub requester: String,
    pub amount_cents: Cents,
    pub invoice_date: NaiveDate,
    pub submitted_on: Option<NaiveDate>,
    pub paid_on: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub description: Option<String>,
    /// Link to the scanned invoice, if one was uploaded.
    pub document_url: Option<String>,
    /// Unix epoch seconds.
    pub created_at: i64,
}
