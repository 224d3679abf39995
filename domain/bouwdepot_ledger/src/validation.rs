//! # Validation
//!
//! Turns raw data-entry forms into checked records ready to be stored.
//! Amounts arrive as decimal euro strings (`"50000"`, `"1234,56"`,
//! `"1234.56"`) and leave as positive [`Cents`].

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Bank, Cents, InvoiceStatus, RecordId};

/// Default depot term when no expiry date is given.
pub const DEFAULT_TERM_MONTHS: u32 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("select a bank")]
    MissingBank,

    #[error("`{0}` is not a valid amount")]
    UnparseableAmount(String),

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("expiry date {expiry} is before start date {start}")]
    ExpiryBeforeStart { start: NaiveDate, expiry: NaiveDate },

    #[error("an invoice can only be created as `new` or `submitted`, not `{0}`")]
    InitialStatus(InvoiceStatus),
}

/// Parse a euro amount into cents.
///
/// Accepts `.` or `,` as decimal separator and an optional leading `€`.
/// Fraction digits beyond the second are rounded half-up.
pub fn parse_amount_cents(input: &str) -> Result<Cents, ValidationError> {
    let invalid = || ValidationError::UnparseableAmount(input.to_string());

    let trimmed = input.trim().trim_start_matches('€').trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    if digits.is_empty() {
        return Err(invalid());
    }

    let mut parts = digits.splitn(2, |c: char| c == '.' || c == ',');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };

    let mut frac = fraction.bytes().map(|b| (b - b'0') as i64);
    let tenths = frac.next().unwrap_or(0);
    let hundredths = frac.next().unwrap_or(0);
    let round_up = frac.next().map(|d| d >= 5).unwrap_or(false);

    let cents = whole
        .checked_mul(100)
        .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
        .ok_or_else(invalid)?;

    if negative {
        Ok(-cents)
    } else {
        Ok(cents)
    }
}

/// Parse and require a strictly positive amount.
pub fn positive_amount(input: &str) -> Result<Cents, ValidationError> {
    let cents = parse_amount_cents(input)?;
    if cents <= 0 {
        return Err(ValidationError::NonPositiveAmount);
    }
    Ok(cents)
}

/// `start` plus the default two-year term. A 29 February start lands on
/// 28 February.
pub fn default_expiry(start: NaiveDate) -> NaiveDate {
    start
        .checked_add_months(Months::new(DEFAULT_TERM_MONTHS))
        .unwrap_or(NaiveDate::MAX)
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Raw depot form as entered by the user.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct DepotForm {
    pub name: String,
    pub bank: String,
    pub amount: String,
    pub start_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// A validated depot, ready to be inserted.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NewDepot {
    pub name: String,
    pub bank: Bank,
    pub total_cents: Cents,
    pub start_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub description: Option<String>,
}

impl DepotForm {
    /// Check the form. `today` is the default start date.
    pub fn validate(self, today: NaiveDate) -> Result<NewDepot, ValidationError> {
        let bank = Bank::from_label(&self.bank).ok_or(ValidationError::MissingBank)?;
        let total_cents = positive_amount(&self.amount)?;
        let name = required(&self.name, "name")?;

        let start_date = self.start_date.unwrap_or(today);
        let expiry_date = self
            .expiry_date
            .unwrap_or_else(|| default_expiry(start_date));
        if expiry_date < start_date {
            return Err(ValidationError::ExpiryBeforeStart {
                start: start_date,
                expiry: expiry_date,
            });
        }

        Ok(NewDepot {
            name,
            bank,
            total_cents,
            start_date,
            expiry_date,
            description: optional(self.description),
        })
    }
}

/// Raw invoice form as entered by the user.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct InvoiceForm {
    pub depot_id: Option<RecordId>,
    pub requester: String,
    pub amount: String,
    pub invoice_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
    pub description: Option<String>,
    pub document_url: Option<String>,
}

/// A validated invoice, ready to be inserted.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NewInvoice {
    pub depot_id: RecordId,
    pub requester: String,
    pub amount_cents: Cents,
    pub invoice_date: NaiveDate,
    pub status: InvoiceStatus,
    pub submitted_on: Option<NaiveDate>,
    pub description: Option<String>,
    pub document_url: Option<String>,
}

impl InvoiceForm {
    /// Check the form. `today` is the default invoice date.
    ///
    /// An invoice entered as already submitted takes its invoice date as the
    /// submission date.
    pub fn validate(self, today: NaiveDate) -> Result<NewInvoice, ValidationError> {
        let depot_id = self.depot_id.ok_or(ValidationError::Missing("depot"))?;
        let amount_cents = positive_amount(&self.amount)?;
        let requester = required(&self.requester, "requester")?;
        let invoice_date = self.invoice_date.unwrap_or(today);

        let status = self.status.unwrap_or(InvoiceStatus::New);
        let submitted_on = match status {
            InvoiceStatus::New => None,
            InvoiceStatus::Submitted => Some(invoice_date),
            other => return Err(ValidationError::InitialStatus(other)),
        };

        Ok(NewInvoice {
            depot_id,
            requester,
            amount_cents,
            invoice_date,
            status,
            submitted_on,
            description: optional(self.description),
            document_url: optional(self.document_url),
        })
    }
}
