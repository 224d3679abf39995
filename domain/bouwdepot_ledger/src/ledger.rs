//! # Ledger
//!
//! Derives the financial and urgency view of a depot from its invoices.
//!
//! Everything here is a pure function of `(depot, invoices, now)`: no I/O, no
//! shared state, and no error paths. Amounts are summed with saturating
//! arithmetic.
//!
//! Two "remaining" figures are exposed:
//!
//! | Field                      | Formula                         | Used by          |
//! |----------------------------|---------------------------------|------------------|
//! | `remaining_cents`          | total − paid − submitted        | depot detail     |
//! | `remaining_after_payouts`  | total − paid                    | dashboard cards  |

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::types::{Cents, Depot, Invoice, InvoiceStatus, RecordId};

/// A depot whose expiry is at most this many days ahead is urgent.
pub const URGENCY_WINDOW_DAYS: i64 = 30;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Number of invoices in each status.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StatusCounts {
    pub new: usize,
    pub submitted: usize,
    pub paid: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: InvoiceStatus) {
        match status {
            InvoiceStatus::New => self.new += 1,
            InvoiceStatus::Submitted => self.submitted += 1,
            InvoiceStatus::Paid => self.paid += 1,
            InvoiceStatus::Rejected => self.rejected += 1,
        }
    }

    pub fn get(&self, status: InvoiceStatus) -> usize {
        match status {
            InvoiceStatus::New => self.new,
            InvoiceStatus::Submitted => self.submitted,
            InvoiceStatus::Paid => self.paid,
            InvoiceStatus::Rejected => self.rejected,
        }
    }

    pub fn total(&self) -> usize {
        self.new + self.submitted + self.paid + self.rejected
    }

    /// Invoices still awaiting submission or payout.
    pub fn open(&self) -> usize {
        self.new + self.submitted
    }
}

/// Derived budget and urgency figures for one depot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LedgerView {
    pub depot_id: RecordId,
    pub total_cents: Cents,
    pub paid_cents: Cents,
    /// In processing at the bank, not yet paid.
    pub submitted_cents: Cents,
    /// Not yet committed or paid out.
    pub remaining_cents: Cents,
    /// Ignores in-flight submissions.
    pub remaining_after_payouts: Cents,
    pub utilization_percent: u8,
    pub days_remaining: i64,
    pub is_urgent: bool,
    pub is_expired: bool,
    pub counts: StatusCounts,
}

impl LedgerView {
    /// Compute the view for `depot`.
    ///
    /// `invoices` may contain invoices of other depots; only those whose
    /// `depot_id` matches are considered.
    pub fn derive<'a>(
        depot: &Depot,
        invoices: impl IntoIterator<Item = &'a Invoice>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut paid: Cents = 0;
        let mut submitted: Cents = 0;
        let mut counts = StatusCounts::default();

        for invoice in invoices.into_iter().filter(|i| i.depot_id == depot.id) {
            counts.add(invoice.status);
            match invoice.status {
                InvoiceStatus::Paid => paid = paid.saturating_add(invoice.amount_cents),
                InvoiceStatus::Submitted => {
                    submitted = submitted.saturating_add(invoice.amount_cents)
                }
                InvoiceStatus::New | InvoiceStatus::Rejected => {}
            }
        }

        let days = days_remaining(depot.expiry_date, now);

        Self {
            depot_id: depot.id,
            total_cents: depot.total_cents,
            paid_cents: paid,
            submitted_cents: submitted,
            remaining_cents: depot.total_cents.saturating_sub(paid).saturating_sub(submitted),
            remaining_after_payouts: depot.total_cents.saturating_sub(paid),
            utilization_percent: utilization_percent(paid, depot.total_cents),
            days_remaining: days,
            is_urgent: is_urgent(days),
            is_expired: is_expired(days),
            counts,
        }
    }
}

/// `round(100 × paid / total)` clamped to `[0, 100]`. A non-positive total
/// yields `0`.
pub fn utilization_percent(paid: Cents, total: Cents) -> u8 {
    if total <= 0 || paid <= 0 {
        return 0;
    }
    let (paid, total) = (paid as i128, total as i128);
    // Half-up rounding on integers: floor((200p + t) / 2t).
    let pct = (200 * paid + total) / (2 * total);
    pct.clamp(0, 100) as u8
}

/// Whole days until the expiry date, rounded up. Expiry is taken as midnight
/// UTC at the start of `expiry`. Zero or negative once that moment has passed.
pub fn days_remaining(expiry: NaiveDate, now: DateTime<Utc>) -> i64 {
    let deadline = expiry.and_time(NaiveTime::MIN).and_utc();
    let millis = (deadline - now).num_milliseconds();
    -(-millis).div_euclid(MILLIS_PER_DAY)
}

pub fn is_urgent(days_remaining: i64) -> bool {
    days_remaining > 0 && days_remaining <= URGENCY_WINDOW_DAYS
}

pub fn is_expired(days_remaining: i64) -> bool {
    days_remaining <= 0
}

/// Dashboard card for one depot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DepotCard {
    pub depot_id: RecordId,
    pub name: String,
    pub bank: String,
    pub total_cents: Cents,
    pub paid_cents: Cents,
    pub remaining_cents: Cents,
    pub utilization_percent: u8,
    pub days_remaining: i64,
    pub is_urgent: bool,
    pub is_expired: bool,
    pub invoice_count: usize,
    pub submitted_count: usize,
    pub paid_count: usize,
}

/// Cross-depot totals for one owner.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_budget_cents: Cents,
    pub total_paid_cents: Cents,
    /// `max(0, budget − paid)`.
    pub remaining_cents: Cents,
    pub open_invoices: usize,
    pub urgent_depots: usize,
    pub depots: Vec<DepotCard>,
}

impl DashboardSummary {
    /// Summarise `depots` against the union of their invoices. Invoices of
    /// depots not in `depots` are ignored.
    pub fn derive(depots: &[Depot], invoices: &[Invoice], now: DateTime<Utc>) -> Self {
        let mut total_budget: Cents = 0;
        let mut total_paid: Cents = 0;
        let mut open_invoices = 0;
        let mut cards = Vec::with_capacity(depots.len());

        for depot in depots {
            let view = LedgerView::derive(depot, invoices, now);
            total_budget = total_budget.saturating_add(depot.total_cents);
            total_paid = total_paid.saturating_add(view.paid_cents);
            open_invoices += view.counts.open();
            cards.push(DepotCard {
                depot_id: depot.id,
                name: depot.name.clone(),
                bank: depot.bank.label().to_string(),
                total_cents: depot.total_cents,
                paid_cents: view.paid_cents,
                remaining_cents: view.remaining_after_payouts,
                utilization_percent: view.utilization_percent,
                days_remaining: view.days_remaining,
                is_urgent: view.is_urgent,
                is_expired: view.is_expired,
                invoice_count: view.counts.total(),
                submitted_count: view.counts.submitted,
                paid_count: view.counts.paid,
            });
        }

        Self {
            total_budget_cents: total_budget,
            total_paid_cents: total_paid,
            remaining_cents: total_budget.saturating_sub(total_paid).max(0),
            open_invoices,
            urgent_depots: cards.iter().filter(|c| c.is_urgent).count(),
            depots: cards,
        }
    }
}

