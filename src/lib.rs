//! Electric Utility Billing and Payroll Income-Tax Engine
//!
//! This crate provides the two add-ons layered on an ERP record store:
//! electric bills carrying meter readings, and monthly income-tax
//! withholding computed from progressive annual tax slabs.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
