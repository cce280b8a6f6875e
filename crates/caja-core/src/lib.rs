//! # caja-core: Pure Business Logic for the Caja Credit Sale Ledger
//!
//! This crate is the **heart** of Caja. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Caja Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Presentation (out of scope)                    │   │
//! │  │      Sale forms ──► Credit screen ──► Payment capture           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ caja-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   sale    │  │  credit   │  │   │
//! │  │   │   Sale    │  │   Money   │  │ SaleDraft │  │CreditPlan │  │   │
//! │  │   │ PlanStatus│  │  TaxRate  │  │  totals   │  │ payments  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    caja-db (Database Layer)                     │   │
//! │  │          SQLite queries, migrations, repositories               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, CreditPlan, PaymentRecord, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`sale`] - The in-memory sale aggregate with deferred validation
//! - [`credit`] - The credit plan state machine
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use caja_core::money::Money;
//! use caja_core::IVA_RATE;
//!
//! // Create money from cents (never from floats!)
//! let subtotal = Money::from_cents(2500); // $25.00
//!
//! // IVA is a fixed 12%
//! let tax = subtotal.calculate_tax(IVA_RATE);
//! assert_eq!(tax.cents(), 300); // $3.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod credit;
pub mod error;
pub mod money;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use caja_core::Money` instead of
// `use caja_core::money::Money`

pub use credit::PaymentDecision;
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use sale::{SaleDraft, ValidationReport};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// The fixed IVA rate applied to every sale subtotal, in basis points.
///
/// ## Why a constant?
/// The deployment jurisdiction has a single statutory rate (12%).
/// Rate configurability is out of scope; making it a constant keeps the
/// totals math reproducible everywhere the crate is used.
pub const IVA_BPS: u32 = 1200;

/// The fixed IVA rate as a [`types::TaxRate`].
pub const IVA_RATE: types::TaxRate = types::TaxRate::from_bps(IVA_BPS);

/// Maximum lines allowed in a single sale draft
///
/// ## Business Reason
/// Prevents runaway drafts and ensures reasonable transaction sizes.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single line in a sale draft
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_LINE_QUANTITY: i64 = 999;
