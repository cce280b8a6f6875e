//! # Error Types
//!
//! Domain-specific error types for caja-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  caja-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  caja-db errors (separate crate)                                       │
//! │  ├── DbError          - Persistence failures (wraps sqlx)              │
//! │  └── LedgerError      - Core ∪ Db, the repository surface              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → presentation        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts)
//! 3. Errors are enum variants, never String
//! 4. Business-rule rejections are ordinary values to match on, not
//!    conditions that abort the process

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations in the sale
/// aggregate or the credit ledger. They are surfaced to the caller as
/// structured failures and never trigger a retry by themselves.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Credit plan cannot be found.
    #[error("Credit plan not found: {0}")]
    PlanNotFound(String),

    /// A credit plan already exists for this sale.
    ///
    /// ## When This Occurs
    /// A sale has at most one active plan. Creating a second one is
    /// rejected explicitly instead of silently inserting a duplicate.
    #[error("Sale {sale_id} already has a credit plan")]
    PlanAlreadyExists { sale_id: String },

    /// The plan could not be created from the given inputs.
    ///
    /// ## When This Occurs
    /// - Down payment is negative or exceeds the sale total
    /// - The sale was not made on credit terms
    #[error("Invalid plan: {reason}")]
    InvalidPlan { reason: String },

    /// The payment was rejected; the ledger is untouched.
    ///
    /// ## When This Occurs
    /// - Amount is zero or negative
    /// - Amount exceeds the current balance (the whole payment is
    ///   rejected, never clamped to the balance)
    /// - The plan is already settled
    ///
    /// ## User Workflow
    /// ```text
    /// Record payment $60.00
    ///      │
    ///      ▼
    /// Balance is $50.00
    ///      │
    ///      ▼
    /// InvalidPayment { reason: "amount $60.00 exceeds balance $50.00" }
    ///      │
    ///      ▼
    /// UI shows the message; cashier resubmits a corrected amount
    /// ```
    #[error("Invalid payment: {reason}")]
    InvalidPayment { reason: String },

    /// The sale draft failed its commit-time validation.
    ///
    /// Carries every problem found, so the caller can display the
    /// whole list at once (see [`crate::sale::SaleDraft::validate`]).
    #[error("invalid sale draft: {}", .errors.join("; "))]
    DraftInvalid { errors: Vec<String> },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidPlan error.
    pub fn invalid_plan(reason: impl Into<String>) -> Self {
        CoreError::InvalidPlan {
            reason: reason.into(),
        }
    }

    /// Creates an InvalidPayment error.
    pub fn invalid_payment(reason: impl Into<String>) -> Self {
        CoreError::InvalidPayment {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid tax id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
