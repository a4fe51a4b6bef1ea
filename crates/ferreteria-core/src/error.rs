//! # Error Types
//!
//! Domain-specific error types for ferreteria-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ferreteria-core errors (this file)                                    │
//! │  ├── LedgerError      - Rejected add/remove line operations            │
//! │  ├── ValidationError  - Header form field failures                     │
//! │  └── CoreError        - Session rules (wraps the two above)            │
//! │                                                                         │
//! │  ferreteria-db errors (separate crate)                                 │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: LedgerError/ValidationError → CoreError → form message          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are fatal: every variant is a recoverable rejection that
//! the calling form shows to the user while keeping its state.

use thiserror::Error;

// =============================================================================
// Ledger Error
// =============================================================================

/// Rejections raised by [`crate::ledger::Ledger`] operations.
///
/// A rejected operation never mutates the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Quantity, price or discount is absent, non-numeric or out of range,
    /// or the product reference is empty.
    ///
    /// ## User Workflow
    /// ```text
    /// Add product (qty: 0)
    ///      │
    ///      ▼
    /// InvalidLineInput { field: "quantity", reason: "must be greater than 0" }
    ///      │
    ///      ▼
    /// UI shows: "quantity must be greater than 0", ledger unchanged
    /// ```
    #[error("{field} {reason}")]
    InvalidLineInput { field: String, reason: String },

    /// `remove_line` was called with an index past the end.
    #[error("Line {index} does not exist (ledger has {len} lines)")]
    IndexOutOfRange { index: usize, len: usize },
}

impl LedgerError {
    /// Creates an InvalidLineInput error for a field.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        LedgerError::InvalidLineInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for document header forms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., unparseable date, unknown status).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A date that must come after another one does not.
    #[error("{field} must be after {other}")]
    NotAfter { field: String, other: String },
}

// =============================================================================
// Core Error
// =============================================================================

/// Document session errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Ledger operation was rejected.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Header form failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The document's status forbids editing (voided invoice, received order).
    #[error("{kind} {number} is {status} and cannot be edited")]
    NotEditable {
        kind: String,
        number: String,
        status: String,
    },

    /// A form of one document kind was submitted to a session of another.
    #[error("Cannot submit a {submitted} form to a {expected} session")]
    KindMismatch { expected: String, submitted: String },

    /// Document requires at least one line.
    #[error("{0} must contain at least one product")]
    EmptyDocument(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
