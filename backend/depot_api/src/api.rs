//! Axum REST API handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use bouwdepot_ledger::{
    status, Bank, DashboardSummary, Depot, DepotForm, Invoice, InvoiceCommand, InvoiceForm,
    LedgerView,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::AuthUser;
use crate::db;
use crate::errors::{ApiError, Result};
use crate::models::into_invoices;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
    /// Returned to unauthenticated callers.
    pub login_url: String,
    /// Source of "now" for urgency and transition dates.
    pub clock: fn() -> DateTime<Utc>,
}

impl ApiState {
    pub fn new(pool: SqlitePool, login_url: String) -> Self {
        Self {
            pool,
            login_url,
            clock: Utc::now,
        }
    }
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/banks", get(list_banks))
        .route("/dashboard", get(dashboard))
        .route("/depots", get(list_depots).post(create_depot))
        .route("/depots/:id", get(get_depot).delete(delete_depot))
        .route("/invoices", post(create_invoice))
        .route("/invoices/:id", delete(delete_invoice))
        .route("/invoices/:id/submit", post(submit_invoice))
        .route("/invoices/:id/pay", post(pay_invoice))
        .route("/invoices/:id/reject", post(reject_invoice))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct BanksResponse {
    pub banks: Vec<String>,
}

#[derive(Serialize)]
pub struct DepotsResponse {
    pub count: usize,
    pub depots: Vec<Depot>,
}

#[derive(Serialize)]
pub struct DepotDetailResponse {
    pub depot: Depot,
    pub ledger: LedgerView,
    pub count: usize,
    pub invoices: Vec<Invoice>,
}

#[derive(Serialize)]
pub struct InvoiceResponse {
    pub invoice: Invoice,
    /// The owning depot's view after the change.
    pub ledger: LedgerView,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /banks`
///
/// Bank labels offered on the depot form.
pub async fn list_banks() -> impl IntoResponse {
    Json(BanksResponse {
        banks: Bank::KNOWN.iter().map(|b| b.label().to_string()).collect(),
    })
}

/// `GET /dashboard`
///
/// Totals and one card per depot for the caller.
pub async fn dashboard(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> Result<Json<DashboardSummary>> {
    let depots: Vec<Depot> = db::list_depots(&state.pool, &user.id)
        .await?
        .into_iter()
        .map(Depot::from)
        .collect();
    let invoices = into_invoices(db::list_invoices_for_owner(&state.pool, &user.id).await?)?;

    Ok(Json(DashboardSummary::derive(
        &depots,
        &invoices,
        (state.clock)(),
    )))
}

/// `GET /depots`
pub async fn list_depots(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
) -> Result<Json<DepotsResponse>> {
    let depots: Vec<Depot> = db::list_depots(&state.pool, &user.id)
        .await?
        .into_iter()
        .map(Depot::from)
        .collect();
    Ok(Json(DepotsResponse {
        count: depots.len(),
        depots,
    }))
}

/// `POST /depots`
pub async fn create_depot(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    payload: std::result::Result<Json<DepotForm>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(form) = payload?;
    let today = (state.clock)().date_naive();
    let new_depot = form.validate(today)?;
    let depot = Depot::from(db::insert_depot(&state.pool, &user.id, &new_depot).await?);
    info!(
        "Depot {} created for {} ({} cents, expires {})",
        depot.id, user.id, depot.total_cents, depot.expiry_date
    );
    Ok((StatusCode::CREATED, Json(depot)))
}

/// `GET /depots/:id`
///
/// The depot, its invoices (newest first) and the derived ledger view.
pub async fn get_depot(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(depot_id): Path<i64>,
) -> Result<Json<DepotDetailResponse>> {
    let (depot, invoices) = load_depot(&state.pool, &user, depot_id).await?;
    let ledger = LedgerView::derive(&depot, &invoices, (state.clock)());
    Ok(Json(DepotDetailResponse {
        depot,
        ledger,
        count: invoices.len(),
        invoices,
    }))
}

/// `DELETE /depots/:id`
pub async fn delete_depot(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(depot_id): Path<i64>,
) -> Result<StatusCode> {
    if !db::delete_depot(&state.pool, &user.id, depot_id).await? {
        return Err(ApiError::NotFound("depot"));
    }
    info!("Depot {depot_id} deleted by {}", user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /invoices`
pub async fn create_invoice(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    payload: std::result::Result<Json<InvoiceForm>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(form) = payload?;
    let today = (state.clock)().date_naive();
    let new_invoice = form.validate(today)?;
    let row = db::insert_invoice(&state.pool, &user.id, &new_invoice)
        .await?
        .ok_or(ApiError::NotFound("depot"))?;
    let invoice = Invoice::try_from(row)?;
    info!(
        "Invoice {} added to depot {} as {} ({} cents)",
        invoice.id, invoice.depot_id, invoice.status, invoice.amount_cents
    );

    let (depot, invoices) = load_depot(&state.pool, &user, invoice.depot_id).await?;
    let ledger = LedgerView::derive(&depot, &invoices, (state.clock)());
    Ok((StatusCode::CREATED, Json(InvoiceResponse { invoice, ledger })))
}

/// `POST /invoices/:id/submit`
pub async fn submit_invoice(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(invoice_id): Path<i64>,
) -> Result<Json<InvoiceResponse>> {
    change_status(&state, &user, invoice_id, InvoiceCommand::Submit).await
}

/// `POST /invoices/:id/pay`
pub async fn pay_invoice(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(invoice_id): Path<i64>,
) -> Result<Json<InvoiceResponse>> {
    change_status(&state, &user, invoice_id, InvoiceCommand::MarkPaid).await
}

/// `POST /invoices/:id/reject`
pub async fn reject_invoice(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(invoice_id): Path<i64>,
) -> Result<Json<InvoiceResponse>> {
    change_status(&state, &user, invoice_id, InvoiceCommand::Reject).await
}

/// `DELETE /invoices/:id`
pub async fn delete_invoice(
    State(state): State<Arc<ApiState>>,
    user: AuthUser,
    Path(invoice_id): Path<i64>,
) -> Result<StatusCode> {
    if !db::delete_invoice(&state.pool, &user.id, invoice_id).await? {
        return Err(ApiError::NotFound("invoice"));
    }
    info!("Invoice {invoice_id} deleted by {}", user.id);
    Ok(StatusCode::NO_CONTENT)
}

// ─────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────

async fn load_depot(
    pool: &SqlitePool,
    user: &AuthUser,
    depot_id: i64,
) -> Result<(Depot, Vec<Invoice>)> {
    let depot = db::get_depot(pool, &user.id, depot_id)
        .await?
        .map(Depot::from)
        .ok_or(ApiError::NotFound("depot"))?;
    let invoices = into_invoices(db::list_invoices_for_depot(pool, depot_id).await?)?;
    Ok((depot, invoices))
}

async fn change_status(
    state: &ApiState,
    user: &AuthUser,
    invoice_id: i64,
    command: InvoiceCommand,
) -> Result<Json<InvoiceResponse>> {
    let now = (state.clock)();
    let row = db::get_invoice(&state.pool, &user.id, invoice_id)
        .await?
        .ok_or(ApiError::NotFound("invoice"))?;
    let mut invoice = Invoice::try_from(row)?;

    let change = status::plan(&invoice, command, now.date_naive())?;
    if !db::update_invoice_status(&state.pool, &user.id, invoice_id, &change).await? {
        // Deleted between the read and the write.
        return Err(ApiError::NotFound("invoice"));
    }
    info!("Invoice {invoice_id}: {} -> {}", invoice.status, change.status);
    change.apply_to(&mut invoice);

    let (depot, invoices) = load_depot(&state.pool, user, invoice.depot_id).await?;
    let ledger = LedgerView::derive(&depot, &invoices, now);
    Ok(Json(InvoiceResponse { invoice, ledger }))
}
