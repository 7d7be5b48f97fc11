//! Error types for the billing and income-tax engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while validating records,
//! computing withholding, and talking to the record store.

use thiserror::Error;

/// The main error type for the engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use utility_payroll_engine::error::EngineError;
///
/// let error = EngineError::UserError {
///     message: "Please select a tax slab.".to_string(),
/// };
/// assert_eq!(error.to_string(), "Please select a tax slab.");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// A record failed a construction-time constraint and was rejected.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field that violated the constraint.
        field: String,
        /// A description of the violated constraint.
        message: String,
    },

    /// An operator-facing precondition failure, surfaced as-is to the caller.
    #[error("{message}")]
    UserError {
        /// The message shown to the operator.
        message: String,
    },

    /// A record was not present in the store.
    #[error("{model} record {id} not found")]
    RecordNotFound {
        /// The kind of record (e.g. "tax_slab", "bill").
        model: String,
        /// The id that was requested.
        id: u64,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The record store failed to complete an operation.
    #[error("Record store error: {message}")]
    Store {
        /// A description of the store failure.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a [`EngineError::Validation`] error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::UserError`] error.
    pub fn user(message: impl Into<String>) -> Self {
        EngineError::UserError {
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::RecordNotFound`] error.
    pub fn not_found(model: impl Into<String>, id: u64) -> Self {
        EngineError::RecordNotFound {
            model: model.into(),
            id,
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
