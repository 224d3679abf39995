//! Row types as stored in / read from the database, and their conversion
//! into ledger records.

use bouwdepot_ledger::{Bank, Depot, Invoice, InvoiceStatus, UnknownStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A `depots` row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DepotRecord {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub bank: String,
    pub total_cents: i64,
    pub start_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub description: Option<String>,
    pub created_at: i64,
}

impl From<DepotRecord> for Depot {
    fn from(row: DepotRecord) -> Self {
        Depot {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            // The insert path never writes a blank label.
            bank: Bank::from_label(&row.bank).unwrap_or(Bank::AnotherBank),
            total_cents: row.total_cents,
            start_date: row.start_date,
            expiry_date: row.expiry_date,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

/// An `invoices` row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InvoiceRecord {
    pub id: i64,
    pub depot_id: i64,
    pub requester: String,
    pub amount_cents: i64,
    pub invoice_date: NaiveDate,
    pub submitted_on: Option<NaiveDate>,
    pub paid_on: Option<NaiveDate>,
    pub status: String,
    pub description: Option<String>,
    pub document_url: Option<String>,
    pub created_at: i64,
}

impl TryFrom<InvoiceRecord> for Invoice {
    type Error = UnknownStatus;

    fn try_from(row: InvoiceRecord) -> Result<Self, Self::Error> {
        let status: InvoiceStatus = row.status.parse()?;
        Ok(Invoice {
            id: row.id,
            depot_id: row.depot_id,
            requester: row.requester,
            amount_cents: row.amount_cents,
            invoice_date: row.invoice_date,
            submitted_on: row.submitted_on,
            paid_on: row.paid_on,
            status,
            description: row.description,
            document_url: row.document_url,
            created_at: row.created_at,
        })
    }
}

/// Convert a batch of rows, failing on the first unreadable status.
pub fn into_invoices(rows: Vec<InvoiceRecord>) -> Result<Vec<Invoice>, UnknownStatus> {
    rows.into_iter().map(Invoice::try_from).collect()
}
