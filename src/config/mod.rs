//! Configuration loading and management for the engine.
//!
//! This module provides functionality to load engine configuration from YAML
//! files: server settings, the withholding rounding rule, the bill layout,
//! and the tax slabs seeded into a fresh store.
//!
//! # Example
//!
//! ```no_run
//! use utility_payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Listening on {}", config.settings().server.bind);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AccountLineConfig, BillingSettings, DEFAULT_COMPLAINT_MOBILE, DEFAULT_COMPLAINT_PTCL,
    DEFAULT_PRODUCT_LABEL, EngineConfig, EngineSettings, IncomeTaxSettings, ServerSettings,
};
