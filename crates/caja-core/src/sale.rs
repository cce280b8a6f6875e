//! # Sale Draft Aggregate
//!
//! The in-memory draft of a sale, built interactively before commit.
//!
//! ## Two-Phase Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Build Freely, Validate Once                          │
//! │                                                                         │
//! │  Phase 1: BUILD                                                        │
//! │  ├── add_item() / remove_item() / update_quantity()                    │
//! │  ├── Mutations NEVER fail, totals recomputed as a side effect          │
//! │  └── Even a non-positive quantity is allowed to sit in the draft       │
//! │                                                                         │
//! │  Phase 2: VALIDATE + COMMIT                                            │
//! │  ├── validate() returns EVERY problem at once (no fail-fast)           │
//! │  └── The persistence layer refuses an invalid draft                    │
//! │                                                                         │
//! │  The cashier sees one complete list of problems instead of fixing      │
//! │  them one at a time.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals Invariants
//! After every mutation:
//! - `subtotal = Σ(line.quantity × line.unit_price)`
//! - `tax = subtotal × 12%`
//! - `total = max(0, subtotal + tax − discount)`

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;
use crate::types::{
    CustomerInfo, DocumentType, PaymentTerms, Sale, SaleLine, SaleStatus,
};
use crate::{IVA_RATE, MAX_LINE_QUANTITY, MAX_SALE_LINES};

// =============================================================================
// Draft Line
// =============================================================================

/// A line in a sale draft.
///
/// `id` is generated locally (UUID v4) when the line is first added,
/// so the UI can address lines before anything is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftLine {
    pub id: String,
    pub product_id: String,
    /// Product name at time of adding (frozen).
    pub name: String,
    /// Price in cents at time of adding (frozen).
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

impl DraftLine {
    fn new(product_id: &str, name: &str, unit_price: Money, quantity: i64) -> Self {
        DraftLine {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            name: name.to_string(),
            unit_price,
            quantity,
            line_total: unit_price.multiply_quantity(quantity),
        }
    }

    fn recompute(&mut self) {
        self.line_total = self.unit_price.multiply_quantity(self.quantity);
    }
}

// =============================================================================
// Validation Report
// =============================================================================

/// The structured result of [`SaleDraft::validate`].
///
/// A report instead of an error so the caller can display all problems
/// at once. `valid == errors.is_empty()` always.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }
}

// =============================================================================
// Sale Draft
// =============================================================================

/// The in-memory sale being built at the counter.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding same product increases quantity)
/// - Totals are recomputed after every mutation, so reads never see
///   stale derived values
/// - The draft is exclusively owned by the session building it; nothing
///   here touches storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDraft {
    pub document_type: DocumentType,
    pub sale_date: NaiveDate,
    pub customer: CustomerInfo,
    pub payment_terms: PaymentTerms,
    pub notes: Option<String>,
    lines: Vec<DraftLine>,
    discount: Money,
    subtotal: Money,
    tax: Money,
    total: Money,
}

impl SaleDraft {
    /// Creates a new empty draft.
    pub fn new(document_type: DocumentType, sale_date: NaiveDate) -> Self {
        SaleDraft {
            document_type,
            sale_date,
            customer: CustomerInfo::default(),
            payment_terms: PaymentTerms::Cash,
            notes: None,
            lines: Vec::new(),
            discount: Money::zero(),
            subtotal: Money::zero(),
            tax: Money::zero(),
            total: Money::zero(),
        }
    }

    // -------------------------------------------------------------------------
    // Mutations (never fail; validation happens at commit time)
    // -------------------------------------------------------------------------

    /// Adds a product to the draft, or increases quantity if already present.
    ///
    /// ## Behavior
    /// - If the product reference is already in the draft: increments
    ///   its quantity (no duplicate line)
    /// - Otherwise: appends a new line with a locally generated id
    ///
    /// ## Returns
    /// The id of the affected line.
    pub fn add_item(
        &mut self,
        product_id: &str,
        name: &str,
        unit_price: Money,
        quantity: i64,
    ) -> String {
        let line_id = if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
        {
            line.quantity += quantity;
            line.recompute();
            line.id.clone()
        } else {
            let line = DraftLine::new(product_id, name, unit_price, quantity);
            let id = line.id.clone();
            self.lines.push(line);
            id
        };

        self.recalculate_totals();
        line_id
    }

    /// Removes a line by id. No-op when the line is absent.
    pub fn remove_item(&mut self, line_id: &str) {
        self.lines.retain(|l| l.id != line_id);
        self.recalculate_totals();
    }

    /// Sets the quantity of a line. No-op when the line is absent.
    ///
    /// Deliberately accepts any quantity, including zero and negative:
    /// the draft is free-form and [`SaleDraft::validate`] is the single
    /// gate before persistence.
    pub fn update_quantity(&mut self, line_id: &str, quantity: i64) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.id == line_id) {
            line.quantity = quantity;
            line.recompute();
        }
        self.recalculate_totals();
    }

    /// Sets the whole-sale discount.
    pub fn set_discount(&mut self, discount: Money) {
        self.discount = discount;
        self.recalculate_totals();
    }

    /// Sets the customer snapshot.
    pub fn set_customer(&mut self, customer: CustomerInfo) {
        self.customer = customer;
    }

    /// Sets the payment terms.
    pub fn set_payment_terms(&mut self, terms: PaymentTerms) {
        self.payment_terms = terms;
    }

    /// Sets the free-form notes.
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    /// Recomputes subtotal, tax and total from the current lines and
    /// discount. Pure function of the draft state; called after every
    /// mutation so the invariants hold at all times.
    fn recalculate_totals(&mut self) {
        self.subtotal = self.lines.iter().map(|l| l.line_total).sum();
        self.tax = self.subtotal.calculate_tax(IVA_RATE);
        self.total = (self.subtotal + self.tax - self.discount).clamp_non_negative();
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// The current lines, in insertion order.
    pub fn lines(&self) -> &[DraftLine] {
        &self.lines
    }

    /// Number of unique lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn tax(&self) -> Money {
        self.tax
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn total(&self) -> Money {
        self.total
    }

    // -------------------------------------------------------------------------
    // Validation (the commit gate)
    // -------------------------------------------------------------------------

    /// Checks the draft against the commit rules.
    ///
    /// Collects every problem instead of failing on the first, so the
    /// cashier can fix the whole list in one pass.
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();

        if self.lines.is_empty() {
            errors.push("at least one line item required".to_string());
        }

        if self.document_type == DocumentType::Invoice && !self.customer.has_tax_id() {
            errors.push("tax id required for invoice documents".to_string());
        }

        for line in &self.lines {
            if line.quantity <= 0 {
                errors.push(format!(
                    "line '{}' has non-positive quantity {}",
                    line.name, line.quantity
                ));
            } else if line.quantity > MAX_LINE_QUANTITY {
                errors.push(format!(
                    "line '{}' exceeds maximum quantity {}",
                    line.name, MAX_LINE_QUANTITY
                ));
            }
        }

        if self.lines.len() > MAX_SALE_LINES {
            errors.push(format!(
                "sale cannot have more than {} lines",
                MAX_SALE_LINES
            ));
        }

        if self.discount.is_negative() {
            errors.push("discount cannot be negative".to_string());
        }

        ValidationReport::from_errors(errors)
    }

    // -------------------------------------------------------------------------
    // Freeze
    // -------------------------------------------------------------------------

    /// Freezes the draft into a persistable [`Sale`] plus its lines.
    ///
    /// The comprobante number is assigned by the persistence layer (an
    /// atomic per-series counter) and passed in here; after this point
    /// the sale is `Completed` and immutable.
    pub fn into_sale(
        self,
        comprobante_number: String,
        created_at: DateTime<Utc>,
    ) -> (Sale, Vec<SaleLine>) {
        let sale_id = Uuid::new_v4().to_string();

        let lines = self
            .lines
            .iter()
            .map(|l| SaleLine {
                id: l.id.clone(),
                sale_id: sale_id.clone(),
                product_id: l.product_id.clone(),
                name_snapshot: l.name.clone(),
                unit_price_cents: l.unit_price.cents(),
                quantity: l.quantity,
                line_total_cents: l.line_total.cents(),
                created_at,
            })
            .collect();

        let sale = Sale {
            id: sale_id,
            comprobante_number,
            document_type: self.document_type,
            sale_date: self.sale_date,
            customer: self.customer,
            subtotal_cents: self.subtotal.cents(),
            tax_cents: self.tax.cents(),
            discount_cents: self.discount.cents(),
            total_cents: self.total.cents(),
            status: SaleStatus::Completed,
            payment_terms: self.payment_terms,
            notes: self.notes,
            created_at,
        };

        (sale, lines)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
