//! Database layer — migrations, owner-scoped queries, and single-row writes.
//!
//! Every read and write takes the caller's `owner_id`; a row belonging to
//! someone else behaves exactly like a missing row.

use std::str::FromStr;

use bouwdepot_ledger::{NewDepot, NewInvoice, StatusChange};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;

use crate::errors::Result;
use crate::models::{DepotRecord, InvoiceRecord};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    // Make sure the file is created if it doesn't exist yet; cascades need
    // foreign keys switched on per connection.
    let options = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

const DEPOT_COLUMNS: &str = "id, owner_id, name, bank, total_cents, start_date, expiry_date, \
                             description, created_at";

const INVOICE_COLUMNS: &str = "id, depot_id, requester, amount_cents, invoice_date, submitted_on, \
                               paid_on, status, description, document_url, created_at";

// ─────────────────────────────────────────────────────────
// Depots
// ─────────────────────────────────────────────────────────

pub async fn insert_depot(
    pool: &SqlitePool,
    owner_id: &str,
    depot: &NewDepot,
) -> Result<DepotRecord> {
    let row = sqlx::query_as::<_, DepotRecord>(&format!(
        r#"
        INSERT INTO depots
            (owner_id, name, bank, total_cents, start_date, expiry_date, description)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING {DEPOT_COLUMNS}
        "#
    ))
    .bind(owner_id)
    .bind(&depot.name)
    .bind(depot.bank.label())
    .bind(depot.total_cents)
    .bind(depot.start_date)
    .bind(depot.expiry_date)
    .bind(&depot.description)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// All depots of `owner_id`, newest first.
pub async fn list_depots(pool: &SqlitePool, owner_id: &str) -> Result<Vec<DepotRecord>> {
    let rows = sqlx::query_as::<_, DepotRecord>(&format!(
        r#"
        SELECT {DEPOT_COLUMNS}
        FROM   depots
        WHERE  owner_id = ?1
        ORDER  BY created_at DESC, id DESC
        "#
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_depot(
    pool: &SqlitePool,
    owner_id: &str,
    depot_id: i64,
) -> Result<Option<DepotRecord>> {
    let row = sqlx::query_as::<_, DepotRecord>(&format!(
        r#"
        SELECT {DEPOT_COLUMNS}
        FROM   depots
        WHERE  id = ?1 AND owner_id = ?2
        "#
    ))
    .bind(depot_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Delete a depot; its invoices go with it. Returns `false` when nothing matched.
pub async fn delete_depot(pool: &SqlitePool, owner_id: &str, depot_id: i64) -> Result<bool> {
    let rows_affected = sqlx::query("DELETE FROM depots WHERE id = ?1 AND owner_id = ?2")
        .bind(depot_id)
        .bind(owner_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}

// ─────────────────────────────────────────────────────────
// Invoices
// ─────────────────────────────────────────────────────────

/// Insert an invoice into one of `owner_id`'s depots.
///
/// Returns `None` when the depot does not exist or belongs to someone else;
/// the ownership check and the insert are one statement.
pub async fn insert_invoice(
    pool: &SqlitePool,
    owner_id: &str,
    invoice: &NewInvoice,
) -> Result<Option<InvoiceRecord>> {
    let row = sqlx::query_as::<_, InvoiceRecord>(&format!(
        r#"
        INSERT INTO invoices
            (depot_id, requester, amount_cents, invoice_date, submitted_on, status,
             description, document_url)
        SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
        WHERE  EXISTS (SELECT 1 FROM depots WHERE id = ?1 AND owner_id = ?9)
        RETURNING {INVOICE_COLUMNS}
        "#
    ))
    .bind(invoice.depot_id)
    .bind(&invoice.requester)
    .bind(invoice.amount_cents)
    .bind(invoice.invoice_date)
    .bind(invoice.submitted_on)
    .bind(invoice.status.as_str())
    .bind(&invoice.description)
    .bind(&invoice.document_url)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Invoices of one depot, newest first. The caller has already checked
/// ownership of the depot.
pub async fn list_invoices_for_depot(
    pool: &SqlitePool,
    depot_id: i64,
) -> Result<Vec<InvoiceRecord>> {
    let rows = sqlx::query_as::<_, InvoiceRecord>(&format!(
        r#"
        SELECT {INVOICE_COLUMNS}
        FROM   invoices
        WHERE  depot_id = ?1
        ORDER  BY created_at DESC, id DESC
        "#
    ))
    .bind(depot_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Every invoice across all of `owner_id`'s depots.
pub async fn list_invoices_for_owner(
    pool: &SqlitePool,
    owner_id: &str,
) -> Result<Vec<InvoiceRecord>> {
    let rows = sqlx::query_as::<_, InvoiceRecord>(&format!(
        r#"
        SELECT {INVOICE_COLUMNS}
        FROM   invoices
        WHERE  depot_id IN (SELECT id FROM depots WHERE owner_id = ?1)
        ORDER  BY created_at DESC, id DESC
        "#
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_invoice(
    pool: &SqlitePool,
    owner_id: &str,
    invoice_id: i64,
) -> Result<Option<InvoiceRecord>> {
    let row = sqlx::query_as::<_, InvoiceRecord>(&format!(
        r#"
        SELECT {INVOICE_COLUMNS}
        FROM   invoices
        WHERE  id = ?1
          AND  depot_id IN (SELECT id FROM depots WHERE owner_id = ?2)
        "#
    ))
    .bind(invoice_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Write a planned status change. Last write wins; there is no check that
/// the row still holds the status the change was planned against.
pub async fn update_invoice_status(
    pool: &SqlitePool,
    owner_id: &str,
    invoice_id: i64,
    change: &StatusChange,
) -> Result<bool> {
    let rows_affected = sqlx::query(
        r#"
        UPDATE invoices
        SET    status = ?1, submitted_on = ?2, paid_on = ?3
        WHERE  id = ?4
          AND  depot_id IN (SELECT id FROM depots WHERE owner_id = ?5)
        "#,
    )
    .bind(change.status.as_str())
    .bind(change.submitted_on)
    .bind(change.paid_on)
    .bind(invoice_id)
    .bind(owner_id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows_affected > 0)
}

pub async fn delete_invoice(pool: &SqlitePool, owner_id: &str, invoice_id: i64) -> Result<bool> {
    let rows_affected = sqlx::query(
        r#"
        DELETE FROM invoices
        WHERE  id = ?1
          AND  depot_id IN (SELECT id FROM depots WHERE owner_id = ?2)
        "#,
    )
    .bind(invoice_id)
    .bind(owner_id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(rows_affected > 0)
}
