//! # Domain Types
//!
//! Core domain types for the credit sale ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Sale       │   │   CreditPlan    │   │  PaymentRecord  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │──►│  sale_id (FK)   │──►│  plan_id (FK)   │       │
//! │  │  comprobante    │   │  balance_cents  │   │  amount_cents   │       │
//! │  │  totals         │   │  status         │   │  paid_at        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DocumentType   │   │   PlanStatus    │   │ LegacyCredit    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │ Record          │       │
//! │  │  SaleNote (NV)  │   │  Open           │   │  ─────────────  │       │
//! │  │  Invoice  (FC)  │   │  PartiallyPaid  │   │  reduced mirror │       │
//! │  └─────────────────┘   │  Settled        │   │  of a plan      │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: the comprobante number, unique
//!   within its document series

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1200 bps = 12% (the fixed IVA rate, [`crate::IVA_RATE`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Document Type
// =============================================================================

/// The comprobante series a sale is issued under.
///
/// Each series numbers independently: `NV-000042` and `FC-000042` are
/// different documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Nota de venta: the simple sale receipt.
    SaleNote,
    /// Factura: the tax invoice, requires the customer's tax id.
    Invoice,
}

impl DocumentType {
    /// The two-letter series prefix used in comprobante numbers.
    pub const fn prefix(&self) -> &'static str {
        match self {
            DocumentType::SaleNote => "NV",
            DocumentType::Invoice => "FC",
        }
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// `Draft` only ever exists in memory (see [`crate::sale::SaleDraft`]);
/// a persisted sale is `Completed` and immutable from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale is being built (items being added).
    Draft,
    /// Sale has been validated and persisted.
    Completed,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Draft
    }
}

// =============================================================================
// Payment Terms
// =============================================================================

/// How the sale is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentTerms {
    /// Paid in full at the counter.
    Cash,
    /// Paid by installment credit: a [`CreditPlan`] is created right
    /// after the sale is persisted.
    Credit,
}

impl Default for PaymentTerms {
    fn default() -> Self {
        PaymentTerms::Cash
    }
}

// =============================================================================
// Customer Snapshot
// =============================================================================

/// Customer data frozen onto the sale at checkout time.
///
/// This is a denormalized snapshot, not a live reference: later edits
/// to the customer record never rewrite history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    /// Tax identification number. Required when the document type is
    /// [`DocumentType::Invoice`].
    pub tax_id: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerInfo {
    /// Whether a usable tax id is present (non-empty after trimming).
    pub fn has_tax_id(&self) -> bool {
        self.tax_id
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A persisted sale.
///
/// Owns its lines exclusively. Monetary totals are derived values that
/// satisfy, at all times:
///
/// ```text
/// subtotal = Σ(line.quantity × line.unit_price)
/// tax      = subtotal × 12%
/// total    = max(0, subtotal + tax − discount)
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Business number, unique within its series (e.g. `NV-000042`).
    pub comprobante_number: String,
    pub document_type: DocumentType,
    pub sale_date: NaiveDate,
    pub customer: CustomerInfo,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub status: SaleStatus,
    pub payment_terms: PaymentTerms,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    /// Whether this sale takes a credit plan.
    #[inline]
    pub fn is_credit(&self) -> bool {
        self.payment_terms == PaymentTerms::Credit
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
///
/// Lines are unique per product reference within a sale: re-adding a
/// product increments its quantity instead of duplicating the line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Quantity sold.
    pub quantity: i64,
    /// Line total (unit_price × quantity).
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Plan Status
// =============================================================================

/// State machine for a credit plan.
///
/// ```text
/// open ──► partially_paid ──► settled
///   │                           ▲
///   └───────────────────────────┘  (zero balance at creation,
///                                   or a single full payment)
/// ```
///
/// `Settled` is terminal: no further payments are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// No payment received yet; balance equals total minus down payment.
    Open,
    /// At least one payment received, balance still positive.
    PartiallyPaid,
    /// Balance is exactly zero. Terminal.
    Settled,
}

impl PlanStatus {
    /// Whether the plan can still accept payments.
    #[inline]
    pub const fn accepts_payments(&self) -> bool {
        !matches!(self, PlanStatus::Settled)
    }
}

// =============================================================================
// Credit Plan
// =============================================================================

/// The installment record derived from a finalized credit sale.
///
/// `balance_cents` is the single source of truth for the amount owed.
/// Only the payment ledger mutates it, and the invariant
///
/// ```text
/// balance + Σ(accepted payments) + down_payment == sale total
/// 0 ≤ balance ≤ total − down_payment
/// ```
///
/// holds after every accepted payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CreditPlan {
    pub id: String,
    /// References exactly one sale; a sale has at most one plan.
    pub sale_id: String,
    /// Credit term in days, counted from the sale date.
    pub term_days: i64,
    pub down_payment_cents: i64,
    pub balance_cents: i64,
    pub due_date: NaiveDate,
    pub status: PlanStatus,
    /// Optimistic-lock counter, bumped on every balance mutation.
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl CreditPlan {
    /// Returns the outstanding balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }

    /// Returns the down payment as Money.
    #[inline]
    pub fn down_payment(&self) -> Money {
        Money::from_cents(self.down_payment_cents)
    }

    /// Whether the plan is fully paid off.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.status == PlanStatus::Settled
    }
}

// =============================================================================
// Payment Record
// =============================================================================

/// A partial payment (abono) applied to a credit plan.
///
/// Append-only: records are never updated or deleted. The ledger
/// displays them newest-first; invariant checks run over insertion
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentRecord {
    pub id: String,
    pub plan_id: String,
    pub amount_cents: i64,
    pub paid_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Legacy Credit Record
// =============================================================================

/// The reduced credit record mirrored into the legacy schema.
///
/// Exists only in deployments that still carry the old `creditos`
/// table. Created alongside a plan as a best-effort mirror; payments
/// are not mirrored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LegacyCreditRecord {
    pub sale_id: String,
    pub term_days: i64,
    pub balance_cents: i64,
    /// Marks the row as written by the current system, so the old
    /// application can tell mirrored rows from its own.
    pub compat: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================
