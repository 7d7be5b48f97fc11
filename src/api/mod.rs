//! HTTP API module for the billing and income-tax engine.
//!
//! This module provides the JSON endpoints for tax slabs, the income-tax
//! wizard, customers, and electric bills. Form rendering and PDF output
//! belong to the host platform and are not served here.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    ComputeIncomeTaxRequest, CreateTaxSlabRequest, RegisterPaymentRequest, SetReadingRequest,
};
pub use response::{ApiError, ApiErrorResponse, TaxSlabResponse};
pub use state::AppState;
