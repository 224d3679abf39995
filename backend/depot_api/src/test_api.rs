use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::api::{self, ApiState};
use crate::auth::USER_HEADER;
use crate::db;

const ALICE: &str = "user-alice";
const BOB: &str = "user-bob";

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

async fn setup() -> Router {
    // One connection: every in-memory connection is its own database.
    let pool = db::init_pool("sqlite::memory:", 1).await.unwrap();
    let state = ApiState {
        clock: fixed_now,
        ..ApiState::new(pool, "/login".to_string())
    };
    api::router(Arc::new(state))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_HEADER, user);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_depot(app: &Router, user: &str, body: Value) -> i64 {
    let (status, depot) = send(app, Method::POST, "/depots", Some(user), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{depot}");
    depot["id"].as_i64().unwrap()
}

async fn create_invoice(app: &Router, user: &str, body: Value) -> i64 {
    let (status, created) = send(app, Method::POST, "/invoices", Some(user), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created["invoice"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_needs_no_identity() {
    let app = setup().await;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_banks_lists_known_labels() {
    let app = setup().await;

    let (status, body) = send(&app, Method::GET, "/banks", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let banks = body["banks"].as_array().unwrap();
    assert_eq!(banks.len(), 8);
    assert_eq!(banks[0], "ING");
    assert_eq!(banks[7], "Andere bank");
}

#[tokio::test]
async fn test_missing_identity_points_to_login() {
    let app = setup().await;

    let (status, body) = send(&app, Method::GET, "/depots", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["login_url"], "/login");

    let (status, _) = send(&app, Method::GET, "/dashboard", Some("   "), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_depot_fills_defaults() {
    let app = setup().await;

    let (status, depot) = send(
        &app,
        Method::POST,
        "/depots",
        Some(ALICE),
        Some(json!({ "name": "Aanbouw", "bank": "ING", "amount": "50000", "description": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(depot["owner_id"], ALICE);
    assert_eq!(depot["bank"], "ING");
    assert_eq!(depot["total_cents"], 5_000_000);
    assert_eq!(depot["start_date"], "2025-06-01");
    assert_eq!(depot["expiry_date"], "2027-06-01");
    assert_eq!(depot["description"], Value::Null);

    let (status, list) = send(&app, Method::GET, "/depots", Some(ALICE), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 1);
}

#[tokio::test]
async fn test_create_depot_validation_errors() {
    let app = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/depots",
        Some(ALICE),
        Some(json!({ "name": "Keuken", "amount": "20000" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "select a bank");

    let (status, body) = send(
        &app,
        Method::POST,
        "/depots",
        Some(ALICE),
        Some(json!({ "name": "Keuken", "bank": "Rabobank", "amount": "twintig" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "`twintig` is not a valid amount");

    let (status, _) = send(
        &app,
        Method::POST,
        "/depots",
        Some(ALICE),
        Some(json!({ "name": "Keuken", "bank": "Rabobank", "amount": "0" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_invoice_lifecycle_updates_ledger() {
    let app = setup().await;
    let depot_id = create_depot(
        &app,
        ALICE,
        json!({ "name": "Verbouwing", "bank": "ABN AMRO", "amount": "50000" }),
    )
    .await;

    let first = create_invoice(
        &app,
        ALICE,
        json!({ "depot_id": depot_id, "requester": "Bouwbedrijf Jansen BV", "amount": "10000",
                "invoice_date": "2025-05-20" }),
    )
    .await;
    let (status, second) = send(
        &app,
        Method::POST,
        "/invoices",
        Some(ALICE),
        Some(json!({ "depot_id": depot_id, "requester": "Dakdekker", "amount": "5000",
                     "invoice_date": "2025-05-25", "status": "submitted" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["invoice"]["submitted_on"], "2025-05-25");
    assert_eq!(second["ledger"]["submitted_cents"], 500_000);

    let (status, submitted) = send(
        &app,
        Method::POST,
        &format!("/invoices/{first}/submit"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["invoice"]["status"], "submitted");
    assert_eq!(submitted["invoice"]["submitted_on"], "2025-06-01");
    assert_eq!(submitted["ledger"]["counts"]["new"], 0);
    assert_eq!(submitted["ledger"]["counts"]["submitted"], 2);

    let (status, paid) = send(
        &app,
        Method::POST,
        &format!("/invoices/{first}/pay"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["invoice"]["status"], "paid");
    assert_eq!(paid["invoice"]["paid_on"], "2025-06-01");
    assert_eq!(paid["invoice"]["submitted_on"], "2025-06-01");

    let (status, detail) = send(
        &app,
        Method::GET,
        &format!("/depots/{depot_id}"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["count"], 2);
    assert_eq!(detail["ledger"]["paid_cents"], 1_000_000);
    assert_eq!(detail["ledger"]["submitted_cents"], 500_000);
    assert_eq!(detail["ledger"]["remaining_cents"], 3_500_000);
    assert_eq!(detail["ledger"]["remaining_after_payouts"], 4_000_000);
    assert_eq!(detail["ledger"]["utilization_percent"], 20);
    assert_eq!(detail["ledger"]["is_urgent"], false);
    // Newest first.
    assert_eq!(detail["invoices"][0]["requester"], "Dakdekker");
}

#[tokio::test]
async fn test_invalid_transitions_conflict() {
    let app = setup().await;
    let depot_id = create_depot(
        &app,
        ALICE,
        json!({ "name": "Dak", "bank": "Triodos", "amount": "8000" }),
    )
    .await;
    let invoice = create_invoice(
        &app,
        ALICE,
        json!({ "depot_id": depot_id, "requester": "Dakdekker", "amount": "1200" }),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/invoices/{invoice}/pay"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invoice cannot move from `new` to `paid`");

    let (status, rejected) = send(
        &app,
        Method::POST,
        &format!("/invoices/{invoice}/reject"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["invoice"]["status"], "rejected");
    assert_eq!(rejected["ledger"]["counts"]["rejected"], 1);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/invoices/{invoice}/submit"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invoice_cannot_be_created_paid() {
    let app = setup().await;
    let depot_id = create_depot(
        &app,
        ALICE,
        json!({ "name": "Tuin", "bank": "ING", "amount": "3000" }),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/invoices",
        Some(ALICE),
        Some(json!({ "depot_id": depot_id, "requester": "Hovenier", "amount": "300",
                     "status": "paid" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_owners_are_isolated() {
    let app = setup().await;
    let depot_id = create_depot(
        &app,
        ALICE,
        json!({ "name": "Zolder", "bank": "Volksbank", "amount": "15000" }),
    )
    .await;
    let invoice = create_invoice(
        &app,
        ALICE,
        json!({ "depot_id": depot_id, "requester": "Timmerman", "amount": "2500" }),
    )
    .await;

    let (_, list) = send(&app, Method::GET, "/depots", Some(BOB), None).await;
    assert_eq!(list["count"], 0);

    let depot_uri = format!("/depots/{depot_id}");
    let (status, _) = send(&app, Method::GET, &depot_uri, Some(BOB), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &depot_uri, Some(BOB), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/invoices",
        Some(BOB),
        Some(json!({ "depot_id": depot_id, "requester": "Indringer", "amount": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/invoices/{invoice}/submit"),
        Some(BOB),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/invoices/{invoice}"),
        Some(BOB),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, detail) = send(&app, Method::GET, &depot_uri, Some(ALICE), None).await;
    assert_eq!(detail["count"], 1);
    assert_eq!(detail["invoices"][0]["status"], "new");
}

#[tokio::test]
async fn test_delete_invoice_and_depot() {
    let app = setup().await;
    let depot_id = create_depot(
        &app,
        ALICE,
        json!({ "name": "Badkamer", "bank": "SNS Bank", "amount": "12000" }),
    )
    .await;
    let keep = create_invoice(
        &app,
        ALICE,
        json!({ "depot_id": depot_id, "requester": "Tegelzetter", "amount": "900" }),
    )
    .await;
    let gone = create_invoice(
        &app,
        ALICE,
        json!({ "depot_id": depot_id, "requester": "Loodgieter", "amount": "1400" }),
    )
    .await;

    let gone_uri = format!("/invoices/{gone}");
    let (status, _) = send(&app, Method::DELETE, &gone_uri, Some(ALICE), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &gone_uri, Some(ALICE), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let depot_uri = format!("/depots/{depot_id}");
    let (_, detail) = send(&app, Method::GET, &depot_uri, Some(ALICE), None).await;
    assert_eq!(detail["count"], 1);

    let (status, _) = send(&app, Method::DELETE, &depot_uri, Some(ALICE), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &depot_uri, Some(ALICE), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The remaining invoice went with its depot.
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/invoices/{keep}/submit"),
        Some(ALICE),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_totals_and_urgency() {
    let app = setup().await;
    let urgent = create_depot(
        &app,
        ALICE,
        json!({ "name": "Aanbouw", "bank": "ING", "amount": "50000",
                "start_date": "2023-06-20", "expiry_date": "2025-06-20" }),
    )
    .await;
    let expired = create_depot(
        &app,
        ALICE,
        json!({ "name": "Schuur", "bank": "Florius", "amount": "10000",
                "start_date": "2023-01-01", "expiry_date": "2025-01-01" }),
    )
    .await;
    create_depot(
        &app,
        BOB,
        json!({ "name": "Elders", "bank": "ING", "amount": "99999" }),
    )
    .await;

    let paid = create_invoice(
        &app,
        ALICE,
        json!({ "depot_id": urgent, "requester": "Aannemer", "amount": "10000",
                "status": "submitted" }),
    )
    .await;
    send(
        &app,
        Method::POST,
        &format!("/invoices/{paid}/pay"),
        Some(ALICE),
        None,
    )
    .await;
    create_invoice(
        &app,
        ALICE,
        json!({ "depot_id": expired, "requester": "Schilder", "amount": "750" }),
    )
    .await;

    let (status, summary) = send(&app, Method::GET, "/dashboard", Some(ALICE), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_budget_cents"], 6_000_000);
    assert_eq!(summary["total_paid_cents"], 1_000_000);
    assert_eq!(summary["remaining_cents"], 5_000_000);
    assert_eq!(summary["open_invoices"], 1);
    assert_eq!(summary["urgent_depots"], 1);

    let cards = summary["depots"].as_array().unwrap();
    assert_eq!(cards.len(), 2);
    let urgent_card = cards.iter().find(|c| c["depot_id"] == urgent).unwrap();
    assert_eq!(urgent_card["days_remaining"], 19);
    assert_eq!(urgent_card["is_urgent"], true);
    assert_eq!(urgent_card["utilization_percent"], 20);
    assert_eq!(urgent_card["paid_count"], 1);
    let expired_card = cards.iter().find(|c| c["depot_id"] == expired).unwrap();
    assert_eq!(expired_card["is_expired"], true);
    assert_eq!(expired_card["is_urgent"], false);
    assert_eq!(expired_card["bank"], "Florius");
}

#[tokio::test]
async fn test_undecodable_bodies_use_error_shape() {
    let app = setup().await;

    // A number where the form expects a decimal string.
    let (status, body) = send(
        &app,
        Method::POST,
        "/depots",
        Some(ALICE),
        Some(json!({ "name": "Keuken", "bank": "ING", "amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string(), "{body}");

    let depot_id = create_depot(
        &app,
        ALICE,
        json!({ "name": "Keuken", "bank": "ING", "amount": "20000" }),
    )
    .await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/invoices",
        Some(ALICE),
        Some(json!({ "depot_id": depot_id, "requester": "Schilder", "amount": "100",
                     "invoice_date": "2025-02-30" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string(), "{body}");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/depots")
        .header(USER_HEADER, ALICE)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn test_invoice_accepts_dutch_status_label() {
    let app = setup().await;
    let depot_id = create_depot(
        &app,
        ALICE,
        json!({ "name": "Badkamer", "bank": "Rabobank", "amount": "15000" }),
    )
    .await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/invoices",
        Some(ALICE),
        Some(json!({ "depot_id": depot_id, "requester": "Tegelzetter", "amount": "2500",
                     "invoice_date": "2025-05-28", "status": "ingediend" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["invoice"]["status"], "submitted");
    assert_eq!(created["invoice"]["submitted_on"], "2025-05-28");
    assert_eq!(created["ledger"]["submitted_cents"], 250_000);
}
