//! HTTP request handlers for the billing and income-tax API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{BillId, ContractId, NewBill, NewContract, NewPartner, SlabId};
use crate::service::{HistoryQuery, IncomeTaxWizard};
use crate::store::{ContractRepository, PartnerRepository, TaxSlabRepository};

use super::request::{
    ComputeIncomeTaxRequest, CreateTaxSlabRequest, RegisterPaymentRequest, SetReadingRequest,
};
use super::response::{ApiError, ApiErrorResponse, TaxSlabResponse};
use super::state::AppState;

type HandlerResult = Result<Response, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/tax-slabs",
            post(create_tax_slab_handler).get(list_tax_slabs_handler),
        )
        .route(
            "/tax-slabs/:id",
            get(get_tax_slab_handler).delete(delete_tax_slab_handler),
        )
        .route("/contracts", post(create_contract_handler))
        .route("/contracts/:id", get(get_contract_handler))
        .route("/income-tax/compute", post(compute_income_tax_handler))
        .route(
            "/partners",
            post(create_partner_handler).get(list_partners_handler),
        )
        .route("/bills", post(create_bill_handler))
        .route("/bills/history", get(bill_history_handler))
        .route("/bills/:id", get(bill_details_handler))
        .route("/bills/:id/post", post(post_bill_handler))
        .route("/bills/:id/payments", post(register_payment_handler))
        .route("/bills/:id/reading", put(set_reading_handler))
        .with_state(state)
}

/// Serializes `body` as a JSON response with an explicit content type.
fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

/// Unwraps a JSON body, turning extractor rejections into API errors.
fn parse_json<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, ApiErrorResponse> {
    let rejection = match payload {
        Ok(Json(body)) => return Ok(body),
        Err(rejection) => rejection,
    };

    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // Get the body text which contains the detailed error from serde
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };

    Err(ApiErrorResponse {
        status: StatusCode::BAD_REQUEST,
        error,
    })
}

/// Logs a failed operation and converts it for the response.
fn failure(correlation_id: Uuid, operation: &'static str, err: EngineError) -> ApiErrorResponse {
    warn!(
        correlation_id = %correlation_id,
        operation,
        error = %err,
        "Request failed"
    );
    err.into()
}

/// Handler for GET /health.
async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// Handler for POST /tax-slabs.
async fn create_tax_slab_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateTaxSlabRequest>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let request = parse_json(payload, correlation_id)?;

    let slab = request
        .into_slab()
        .and_then(|slab| state.store().create_slab(slab))
        .map_err(|err| failure(correlation_id, "create_tax_slab", err))?;

    info!(
        correlation_id = %correlation_id,
        slab_id = slab.id,
        slab = %slab.name,
        bands = slab.bands().len(),
        "Tax slab created"
    );
    if !slab.overlapping_pairs().is_empty() {
        warn!(
            correlation_id = %correlation_id,
            slab_id = slab.id,
            pairs = ?slab.overlapping_pairs(),
            "Tax slab has overlapping bands"
        );
    }

    Ok(json_response(StatusCode::CREATED, TaxSlabResponse::from(slab)))
}

/// Handler for GET /tax-slabs.
async fn list_tax_slabs_handler(State(state): State<AppState>) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let slabs = state
        .store()
        .list_slabs()
        .map_err(|err| failure(correlation_id, "list_tax_slabs", err))?;

    let body: Vec<TaxSlabResponse> = slabs.into_iter().map(TaxSlabResponse::from).collect();
    Ok(json_response(StatusCode::OK, body))
}

/// Handler for GET /tax-slabs/:id.
async fn get_tax_slab_handler(
    State(state): State<AppState>,
    Path(id): Path<SlabId>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let slab = state
        .store()
        .get_slab(id)
        .map_err(|err| failure(correlation_id, "get_tax_slab", err))?;

    Ok(json_response(StatusCode::OK, TaxSlabResponse::from(slab)))
}

/// Handler for DELETE /tax-slabs/:id.
async fn delete_tax_slab_handler(
    State(state): State<AppState>,
    Path(id): Path<SlabId>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    state
        .store()
        .delete_slab(id)
        .map_err(|err| failure(correlation_id, "delete_tax_slab", err))?;

    info!(correlation_id = %correlation_id, slab_id = id, "Tax slab deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Handler for POST /contracts.
async fn create_contract_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewContract>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let request = parse_json(payload, correlation_id)?;

    let contract = state
        .store()
        .create_contract(request)
        .map_err(|err| failure(correlation_id, "create_contract", err))?;

    info!(
        correlation_id = %correlation_id,
        contract_id = contract.id,
        "Contract created"
    );
    Ok(json_response(StatusCode::CREATED, contract))
}

/// Handler for GET /contracts/:id.
async fn get_contract_handler(
    State(state): State<AppState>,
    Path(id): Path<ContractId>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let contract = state
        .store()
        .get_contract(id)
        .map_err(|err| failure(correlation_id, "get_contract", err))?;

    Ok(json_response(StatusCode::OK, contract))
}

/// Handler for POST /income-tax/compute.
///
/// Runs the income-tax wizard over the selected contracts. Contracts that
/// fail are listed in the outcome; the request itself still succeeds.
async fn compute_income_tax_handler(
    State(state): State<AppState>,
    payload: Result<Json<ComputeIncomeTaxRequest>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing income tax request");
    let request = parse_json(payload, correlation_id)?;

    let start_time = Instant::now();
    let outcome = IncomeTaxWizard::new(request.slab_id, request.contract_ids)
        .with_rounding(state.rounding())
        .confirm(state.store())
        .map_err(|err| failure(correlation_id, "compute_income_tax", err))?;

    info!(
        correlation_id = %correlation_id,
        slab_id = outcome.slab_id,
        updated = outcome.updated.len(),
        failed = outcome.failures.len(),
        duration_us = start_time.elapsed().as_micros(),
        "Income tax computed"
    );
    Ok(json_response(StatusCode::OK, outcome))
}

/// Handler for POST /partners.
async fn create_partner_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewPartner>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let request = parse_json(payload, correlation_id)?;

    let partner = state
        .store()
        .create_partner(request)
        .map_err(|err| failure(correlation_id, "create_partner", err))?;

    info!(
        correlation_id = %correlation_id,
        partner_id = partner.id,
        meter_id = %partner.meter_id,
        "Customer created"
    );
    Ok(json_response(StatusCode::CREATED, partner))
}

/// Handler for GET /partners.
async fn list_partners_handler(State(state): State<AppState>) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let partners = state
        .store()
        .list_partners()
        .map_err(|err| failure(correlation_id, "list_partners", err))?;

    Ok(json_response(StatusCode::OK, partners))
}

/// Handler for POST /bills.
async fn create_bill_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewBill>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let request = parse_json(payload, correlation_id)?;

    let created = state
        .billing()
        .create_bill(state.store(), request)
        .map_err(|err| failure(correlation_id, "create_bill", err))?;

    info!(
        correlation_id = %correlation_id,
        bill = %created.bill_name,
        "Bill request completed"
    );
    Ok(json_response(StatusCode::CREATED, created))
}

/// Handler for GET /bills/history.
async fn bill_history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let history = state
        .billing()
        .bill_history(state.store(), &query)
        .map_err(|err| failure(correlation_id, "bill_history", err))?;

    Ok(json_response(StatusCode::OK, history))
}

/// Handler for GET /bills/:id.
async fn bill_details_handler(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let details = state
        .billing()
        .bill_details(state.store(), id)
        .map_err(|err| failure(correlation_id, "bill_details", err))?;

    Ok(json_response(StatusCode::OK, details))
}

/// Handler for POST /bills/:id/post.
async fn post_bill_handler(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let bill = state
        .billing()
        .post_bill(state.store(), id)
        .map_err(|err| failure(correlation_id, "post_bill", err))?;

    Ok(json_response(StatusCode::OK, bill))
}

/// Handler for POST /bills/:id/payments.
async fn register_payment_handler(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
    payload: Result<Json<RegisterPaymentRequest>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let request = parse_json(payload, correlation_id)?;

    let bill = state
        .billing()
        .register_payment(state.store(), id, request.amount)
        .map_err(|err| failure(correlation_id, "register_payment", err))?;

    Ok(json_response(StatusCode::OK, bill))
}

/// Handler for PUT /bills/:id/reading.
async fn set_reading_handler(
    State(state): State<AppState>,
    Path(id): Path<BillId>,
    payload: Result<Json<SetReadingRequest>, JsonRejection>,
) -> HandlerResult {
    let correlation_id = Uuid::new_v4();
    let request = parse_json(payload, correlation_id)?;

    let bill = state
        .billing()
        .set_next_reading(state.store(), id, request.next_reading_value)
        .map_err(|err| failure(correlation_id, "set_next_reading", err))?;

    Ok(json_response(StatusCode::OK, bill))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let config = ConfigLoader::load("./config/default").expect("Failed to load config");
        AppState::from_config(Arc::new(MemoryStore::new()), &config)
    }

    async fn send(router: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_health_returns_200() {
        let router = create_router(create_test_state());
        let (status, body) = send(router, "GET", "/health", "").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let router = create_router(create_test_state());
        let (status, body) = send(router, "POST", "/tax-slabs", "{invalid json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_missing_field_returns_validation_code() {
        let router = create_router(create_test_state());
        let (status, body) = send(router, "POST", "/contracts", r#"{"wage": "1000"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "VALIDATION_ERROR");
        assert!(error.message.contains("missing field"));
    }

    #[tokio::test]
    async fn test_invalid_band_returns_422() {
        let router = create_router(create_test_state());
        let body = r#"{"name": "Bad", "bands": [{"start_limit": 0, "rate_percent": 150, "fixed_amount": 0}]}"#;
        let (status, body) = send(router, "POST", "/tax-slabs", body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_compute_without_contracts_returns_400() {
        let state = create_test_state();
        let slab = state
            .store()
            .create_slab(crate::models::TaxSlab::new("Empty", vec![]).unwrap())
            .unwrap();
        let router = create_router(state);

        let body = format!(r#"{{"slab_id": {}, "contract_ids": []}}"#, slab.id);
        let (status, body) = send(router, "POST", "/income-tax/compute", &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "USER_ERROR");
        assert_eq!(error.message, "No contracts selected to compute income tax.");
    }

    #[tokio::test]
    async fn test_unknown_bill_returns_404() {
        let router = create_router(create_test_state());
        let (status, body) = send(router, "GET", "/bills/42", "").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "NOT_FOUND");
    }
}
