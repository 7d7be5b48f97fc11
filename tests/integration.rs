//! Integration tests for the billing and income-tax engine.
//!
//! This test suite drives the HTTP API end to end:
//! - Tax slab creation and validation
//! - Income-tax computation over contracts
//! - Customer and bill creation
//! - Previous meter reading carry-over between posted bills
//! - Posting, payments, and reading corrections
//! - Bill history filtering
//! - Error cases

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use utility_payroll_engine::api::{AppState, create_router};
use utility_payroll_engine::config::ConfigLoader;
use utility_payroll_engine::store::MemoryStore;

// =============================================================================
// Test Helpers
// =============================================================================

fn create_test_state() -> AppState {
    let config = ConfigLoader::load("./config/default").expect("Failed to load config");
    let store = Arc::new(MemoryStore::new());
    store
        .seed_slabs(config.slabs().iter().cloned())
        .expect("Failed to seed slabs");
    AppState::from_config(store, &config)
}

fn create_router_for_test() -> Router {
    create_router(create_test_state())
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        other => Decimal::from_str(&other.to_string()).unwrap(),
    }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = body.map(|b| b.to_string()).unwrap_or_default();
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

async fn create_slab(router: &Router, bands: Value) -> u64 {
    let (status, body) = send(
        router,
        "POST",
        "/tax-slabs",
        Some(json!({"name": "Test slab", "bands": bands})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "slab creation failed: {}", body);
    body["id"].as_u64().unwrap()
}

async fn create_contract(router: &Router, name: &str, wage: &str) -> u64 {
    let (status, body) = send(
        router,
        "POST",
        "/contracts",
        Some(json!({"employee_name": name, "wage": wage})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "contract creation failed: {}", body);
    body["id"].as_u64().unwrap()
}

async fn contract_tax(router: &Router, id: u64) -> Decimal {
    let (status, body) = send(router, "GET", &format!("/contracts/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    decimal(&body["income_tax_amount"])
}

async fn create_partner(router: &Router, name: &str, meter_id: &str) -> u64 {
    let (status, body) = send(
        router,
        "POST",
        "/partners",
        Some(json!({
            "name": name,
            "meter_id": meter_id,
            "reference_no": "04 11213 7654321",
            "cnic": "35202-7654321-3"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "partner creation failed: {}", body);
    body["id"].as_u64().unwrap()
}

async fn create_bill(router: &Router, partner_id: u64, month: &str, reading: &str) -> Value {
    let (status, body) = send(
        router,
        "POST",
        "/bills",
        Some(json!({
            "partner_id": partner_id,
            "next_reading_value": reading,
            "billing_month": month,
            "issue_date": month
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "bill creation failed: {}", body);
    body
}

async fn post_bill(router: &Router, bill_id: u64) {
    let (status, body) = send(router, "POST", &format!("/bills/{}/post", bill_id), None).await;
    assert_eq!(status, StatusCode::OK, "posting failed: {}", body);
}

fn two_band_slab() -> Value {
    json!([
        {"start_limit": "0", "end_limit": "600000", "rate_percent": "0", "fixed_amount": "0"},
        {"start_limit": "600000", "end_limit": "1200000", "rate_percent": "5", "fixed_amount": "0"}
    ])
}

// =============================================================================
// Tax slabs
// =============================================================================

#[tokio::test]
async fn test_seeded_slab_is_listed_with_summary() {
    let router = create_router_for_test();

    let (status, body) = send(&router, "GET", "/tax-slabs", None).await;

    assert_eq!(status, StatusCode::OK);
    let slabs = body.as_array().unwrap();
    assert_eq!(slabs.len(), 1);
    assert_eq!(slabs[0]["name"], "FY 2025-26");
    let summary = slabs[0]["summary"].as_str().unwrap();
    assert!(summary.starts_with("0.00 - 600000.00: 0.00% (Fixed: 0.00)"));
    assert!(summary.ends_with("4100000.00 and above: 35.00% (Fixed: 616000.00)"));
}

#[tokio::test]
async fn test_slab_bands_are_stored_in_start_order() {
    let router = create_router_for_test();
    let id = create_slab(
        &router,
        json!([
            {"start_limit": "600000", "end_limit": "1200000", "rate_percent": "5", "fixed_amount": "0"},
            {"start_limit": "0", "end_limit": "600000", "rate_percent": "0", "fixed_amount": "0"}
        ]),
    )
    .await;

    let (status, body) = send(&router, "GET", &format!("/tax-slabs/{}", id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["bands"][0]["start_limit"]), Decimal::ZERO);
    assert_eq!(decimal(&body["bands"][1]["start_limit"]), Decimal::from(600_000));
}

#[tokio::test]
async fn test_rate_above_hundred_is_rejected() {
    let router = create_router_for_test();

    let (status, body) = send(
        &router,
        "POST",
        "/tax-slabs",
        Some(json!({
            "name": "Bad rate",
            "bands": [{"start_limit": "0", "end_limit": "100000", "rate_percent": "150", "fixed_amount": "0"}]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("between 0% and 100%"));
}

#[tokio::test]
async fn test_equal_limits_are_rejected() {
    let router = create_router_for_test();

    let (status, body) = send(
        &router,
        "POST",
        "/tax-slabs",
        Some(json!({
            "name": "Empty range",
            "bands": [{"start_limit": "500000", "end_limit": "500000", "rate_percent": "5", "fixed_amount": "0"}]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_deleted_slab_is_gone() {
    let router = create_router_for_test();
    let id = create_slab(&router, two_band_slab()).await;

    let (status, _) = send(&router, "DELETE", &format!("/tax-slabs/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&router, "GET", &format!("/tax-slabs/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

// =============================================================================
// Income tax
// =============================================================================

#[tokio::test]
async fn test_wage_on_band_start_uses_that_band() {
    let router = create_router_for_test();
    let slab_id = create_slab(&router, two_band_slab()).await;
    let contract_id = create_contract(&router, "Hina Baig", "50000").await;

    let (status, body) = send(
        &router,
        "POST",
        "/income-tax/compute",
        Some(json!({"slab_id": slab_id, "contract_ids": [contract_id]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let update = &body["updated"][0];
    assert_eq!(decimal(&update["income_tax_amount"]), Decimal::ZERO);
    assert_eq!(update["audit_step"]["output"]["matched_bands"][0], 1);
    assert_eq!(contract_tax(&router, contract_id).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_flat_rate_slab() {
    let router = create_router_for_test();
    let slab_id = create_slab(
        &router,
        json!([{"start_limit": "0", "rate_percent": "10", "fixed_amount": "0"}]),
    )
    .await;
    let contract_id = create_contract(&router, "Omar Farooq", "1000").await;

    let (status, _) = send(
        &router,
        "POST",
        "/income-tax/compute",
        Some(json!({"slab_id": slab_id, "contract_ids": [contract_id]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(contract_tax(&router, contract_id).await, Decimal::from(100));
}

#[tokio::test]
async fn test_seeded_schedule_for_several_contracts() {
    let router = create_router_for_test();
    let low = create_contract(&router, "Hina Baig", "45000").await;
    let mid = create_contract(&router, "Omar Farooq", "150000").await;
    let high = create_contract(&router, "Zara Sheikh", "500000").await;

    let (status, body) = send(
        &router,
        "POST",
        "/income-tax/compute",
        Some(json!({"slab_id": 1, "contract_ids": [low, mid, high]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slab_name"], "FY 2025-26");
    assert_eq!(body["updated"].as_array().unwrap().len(), 3);
    // 540_000 -> 0; 1_800_000 -> 72_000 / 12; 6_000_000 -> 1_281_000 / 12
    assert_eq!(contract_tax(&router, low).await, Decimal::ZERO);
    assert_eq!(contract_tax(&router, mid).await, Decimal::from(6000));
    assert_eq!(contract_tax(&router, high).await, Decimal::from(106_750));
}

#[tokio::test]
async fn test_missing_contract_is_reported_and_others_are_written() {
    let router = create_router_for_test();
    let contract_id = create_contract(&router, "Omar Farooq", "150000").await;

    let (status, body) = send(
        &router,
        "POST",
        "/income-tax/compute",
        Some(json!({"slab_id": 1, "contract_ids": [999, contract_id]})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["failures"][0]["contract_id"], 999);
    assert_eq!(body["updated"][0]["contract_id"], contract_id);
    assert_eq!(contract_tax(&router, contract_id).await, Decimal::from(6000));
}

#[tokio::test]
async fn test_compute_without_slab_is_user_error() {
    let router = create_router_for_test();
    let contract_id = create_contract(&router, "Omar Farooq", "150000").await;

    let (status, body) = send(
        &router,
        "POST",
        "/income-tax/compute",
        Some(json!({"contract_ids": [contract_id]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "USER_ERROR");
    assert_eq!(body["message"], "Please select a tax slab.");
}

#[tokio::test]
async fn test_compute_without_contracts_writes_nothing() {
    let router = create_router_for_test();
    let contract_id = create_contract(&router, "Omar Farooq", "150000").await;

    let (status, body) = send(
        &router,
        "POST",
        "/income-tax/compute",
        Some(json!({"slab_id": 1, "contract_ids": []})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "USER_ERROR");
    assert_eq!(contract_tax(&router, contract_id).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_compute_with_unknown_slab_is_not_found() {
    let router = create_router_for_test();
    let contract_id = create_contract(&router, "Omar Farooq", "150000").await;

    let (status, body) = send(
        &router,
        "POST",
        "/income-tax/compute",
        Some(json!({"slab_id": 77, "contract_ids": [contract_id]})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_negative_wage_contract_is_rejected() {
    let router = create_router_for_test();

    let (status, body) = send(
        &router,
        "POST",
        "/contracts",
        Some(json!({"employee_name": "Omar Farooq", "wage": "-5"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

// =============================================================================
// Bills
// =============================================================================

#[tokio::test]
async fn test_first_bill_uses_configured_layout() {
    let router = create_router_for_test();
    let partner_id = create_partner(&router, "Imran Ali", "MTR-0042").await;

    let created = create_bill(&router, partner_id, "2025-01-01", "120").await;

    assert_eq!(created["bill_name"], "BILL/2025/00001");
    assert_eq!(created["partner_name"], "Imran Ali");
    assert_eq!(created["meter_id"], "MTR-0042");
    let bill = &created["bill"];
    assert_eq!(bill["state"], "draft");
    assert_eq!(bill["lines"].as_array().unwrap().len(), 5);
    assert_eq!(bill["lines"][0]["label"], "Units");
    assert_eq!(bill["lines"][4]["account_code"], "251007");
    // 120 units * 32.50 + 35 TV fee + 25 meter rent
    assert_eq!(decimal(&bill["amount_total"]), Decimal::from(3960));
    assert_eq!(bill["complaint_mobile_number"], "03014630923");
}

#[tokio::test]
async fn test_posted_bill_reading_carries_to_next_bill() {
    let router = create_router_for_test();
    let partner_id = create_partner(&router, "Imran Ali", "MTR-0042").await;

    let first = create_bill(&router, partner_id, "2025-01-01", "1000").await;
    post_bill(&router, first["bill"]["id"].as_u64().unwrap()).await;

    let second = create_bill(&router, partner_id, "2025-02-01", "1180").await;
    let bill_id = second["bill"]["id"].as_u64().unwrap();

    let (status, details) = send(&router, "GET", &format!("/bills/{}", bill_id), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["customer_name"], "Imran Ali");
    assert_eq!(decimal(&details["consumed_units"]), Decimal::from(180));
    assert_eq!(decimal(&details["bill"]["previous_reading_unit"]), Decimal::from(1000));
    assert_eq!(details["paid"], false);

    let (_, partners) = send(&router, "GET", "/partners", None).await;
    assert_eq!(decimal(&partners[0]["previous_reading"]), Decimal::from(1180));
}

#[tokio::test]
async fn test_reading_below_previous_is_rejected() {
    let router = create_router_for_test();
    let partner_id = create_partner(&router, "Imran Ali", "MTR-0042").await;
    let first = create_bill(&router, partner_id, "2025-01-01", "1000").await;
    post_bill(&router, first["bill"]["id"].as_u64().unwrap()).await;

    let (status, body) = send(
        &router,
        "POST",
        "/bills",
        Some(json!({
            "partner_id": partner_id,
            "next_reading_value": "900",
            "billing_month": "2025-02-01"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_bill_for_unknown_customer_is_not_found() {
    let router = create_router_for_test();

    let (status, body) = send(
        &router,
        "POST",
        "/bills",
        Some(json!({"partner_id": 5, "next_reading_value": "10"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_customer_without_meter_is_rejected() {
    let router = create_router_for_test();

    let (status, body) = send(
        &router,
        "POST",
        "/partners",
        Some(json!({"name": "Imran Ali", "meter_id": "", "reference_no": "R", "cnic": "C"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"].as_str().unwrap().contains("meter_id"));
}

#[tokio::test]
async fn test_payment_flow() {
    let router = create_router_for_test();
    let partner_id = create_partner(&router, "Imran Ali", "MTR-0042").await;
    let created = create_bill(&router, partner_id, "2025-01-01", "120").await;
    let bill_id = created["bill"]["id"].as_u64().unwrap();
    let payments = format!("/bills/{}/payments", bill_id);

    // Drafts cannot be paid
    let (status, body) = send(&router, "POST", &payments, Some(json!({"amount": "100"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "USER_ERROR");

    post_bill(&router, bill_id).await;

    let (status, body) = send(&router, "POST", &payments, Some(json!({"amount": "960"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["amount_residual"]), Decimal::from(3000));

    let (status, body) = send(&router, "POST", &payments, Some(json!({"amount": "3000"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["amount_residual"]), Decimal::ZERO);

    let (_, details) = send(&router, "GET", &format!("/bills/{}", bill_id), None).await;
    assert_eq!(details["paid"], true);
}

#[tokio::test]
async fn test_reading_correction_on_draft() {
    let router = create_router_for_test();
    let partner_id = create_partner(&router, "Imran Ali", "MTR-0042").await;
    let created = create_bill(&router, partner_id, "2025-01-01", "120").await;
    let bill_id = created["bill"]["id"].as_u64().unwrap();

    let (status, bill) = send(
        &router,
        "PUT",
        &format!("/bills/{}/reading", bill_id),
        Some(json!({"next_reading_value": "100"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // 100 units * 32.50 + 60
    assert_eq!(decimal(&bill["amount_total"]), Decimal::from(3310));

    post_bill(&router, bill_id).await;
    let (status, body) = send(
        &router,
        "PUT",
        &format!("/bills/{}/reading", bill_id),
        Some(json!({"next_reading_value": "110"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "USER_ERROR");
}

#[tokio::test]
async fn test_posting_twice_is_user_error() {
    let router = create_router_for_test();
    let partner_id = create_partner(&router, "Imran Ali", "MTR-0042").await;
    let created = create_bill(&router, partner_id, "2025-01-01", "120").await;
    let bill_id = created["bill"]["id"].as_u64().unwrap();

    post_bill(&router, bill_id).await;
    let (status, body) = send(&router, "POST", &format!("/bills/{}/post", bill_id), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "USER_ERROR");
}

// =============================================================================
// Bill history
// =============================================================================

#[tokio::test]
async fn test_history_filters_by_meter_and_month() {
    let router = create_router_for_test();
    let imran = create_partner(&router, "Imran Ali", "MTR-0042").await;
    let sana = create_partner(&router, "Sana Khan", "MTR-0043").await;
    for (month, reading) in [("2025-01-01", "100"), ("2025-02-01", "180"), ("2025-03-01", "260")] {
        let created = create_bill(&router, imran, month, reading).await;
        post_bill(&router, created["bill"]["id"].as_u64().unwrap()).await;
    }
    create_bill(&router, sana, "2025-02-01", "50").await;

    let (status, body) = send(
        &router,
        "GET",
        "/bills/history?meter_id=MTR-0042&from_date=2025-02-01&to_date=2025-03-31",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["billing_month"], "2025-03-01");
    assert_eq!(entries[1]["billing_month"], "2025-02-01");
    assert_eq!(entries[0]["customer_name"], "Imran Ali");
    assert_eq!(entries[0]["invoice_date"], "2025-03-01");
    assert_eq!(entries[0]["state"], "posted");
    // 80 units * 32.50 + 60
    assert_eq!(decimal(&entries[0]["total_bill_amount"]), Decimal::from(2660));
}

#[tokio::test]
async fn test_history_ignores_unparseable_dates() {
    let router = create_router_for_test();
    let imran = create_partner(&router, "Imran Ali", "MTR-0042").await;
    create_bill(&router, imran, "2025-01-01", "100").await;

    let (status, body) = send(
        &router,
        "GET",
        "/bills/history?meter_id=MTR-0042&from_date=January",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["invoice_date"], "N/A");
}

#[tokio::test]
async fn test_history_requires_meter_id() {
    let router = create_router_for_test();

    let (status, body) = send(&router, "GET", "/bills/history", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "USER_ERROR");
    assert_eq!(body["message"], "Meter ID is required.");
}
