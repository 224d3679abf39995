//! # Bouwdepot Ledger
//!
//! Budget and lifecycle model for Dutch construction depots (*bouwdepot*).
//! A depot is a ring-fenced part of a mortgage that the bank pays out against
//! contractor invoices until the depot expires.
//!
//! | Concern          | Module                 | Entry Point(s)                           |
//! |------------------|------------------------|------------------------------------------|
//! | Records          | [`types`]              | [`Depot`], [`Invoice`], [`InvoiceStatus`] |
//! | Per-depot view   | [`ledger`]             | [`LedgerView::derive`]                   |
//! | Dashboard        | [`ledger`]             | [`DashboardSummary::derive`]             |
//! | Status changes   | [`status`]             | [`status::plan`]                         |
//! | Data entry       | [`validation`]         | [`DepotForm::validate`], [`InvoiceForm::validate`] |
//!
//! Nothing in this crate performs I/O or reads the clock: callers pass `now`
//! (or `today`) explicitly, so every derivation is reproducible.

pub mod ledger;
pub mod status;
pub mod types;
pub mod validation;


pub use ledger::{DashboardSummary, DepotCard, LedgerView, StatusCounts, URGENCY_WINDOW_DAYS};
pub use status::{InvoiceCommand, StatusChange, TransitionError};
pub use types::{Bank, Cents, Depot, Invoice, InvoiceStatus, RecordId, UnknownStatus};
pub use validation::{DepotForm, InvoiceForm, NewDepot, NewInvoice, ValidationError};
