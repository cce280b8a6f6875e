//! # Credit Plan State Machine
//!
//! Pure accept/reject logic for the installment ledger. The
//! persistence layer calls into this module from inside its
//! transactions, so every rule here is enforced atomically with the
//! writes it guards.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create_plan                payment                 payment            │
//! │  ───────────►  open  ─────────────────► partially ─────────────► ...   │
//! │                  │                        _paid                         │
//! │                  │                          │                           │
//! │                  │ balance starts at 0      │ balance hits exactly 0    │
//! │                  ▼                          ▼                           │
//! │               settled ◄──────────────── settled   (terminal)            │
//! │                                                                         │
//! │  A payment is accepted as a whole or rejected as a whole. Rejection    │
//! │  leaves balance and history untouched.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CreditPlan, PlanStatus, Sale};
use crate::validation::{validate_payment_amount, validate_term_days};

// =============================================================================
// Plan Creation
// =============================================================================

impl CreditPlan {
    /// Derives a credit plan from a persisted credit sale.
    ///
    /// ## Rules
    /// - The sale must carry credit payment terms
    /// - `0 ≤ down_payment ≤ sale total` (InvalidPlan otherwise)
    /// - `term_days` must be a sane credit term
    ///
    /// ## Result
    /// Initial `balance = total − down_payment` and
    /// `due_date = sale_date + term_days`. A plan whose balance starts
    /// at zero is born `Settled`; everything else starts `Open`.
    pub fn create(
        sale: &Sale,
        term_days: i64,
        down_payment: Money,
        created_at: DateTime<Utc>,
    ) -> CoreResult<CreditPlan> {
        if !sale.is_credit() {
            return Err(CoreError::invalid_plan(format!(
                "sale {} was not made on credit terms",
                sale.id
            )));
        }

        validate_term_days(term_days)?;

        if down_payment.is_negative() {
            return Err(CoreError::invalid_plan(format!(
                "down payment {} is negative",
                down_payment
            )));
        }

        let total = sale.total();
        if down_payment > total {
            return Err(CoreError::invalid_plan(format!(
                "down payment {} exceeds sale total {}",
                down_payment, total
            )));
        }

        let balance = total - down_payment;
        let status = if balance.is_zero() {
            PlanStatus::Settled
        } else {
            PlanStatus::Open
        };

        Ok(CreditPlan {
            id: Uuid::new_v4().to_string(),
            sale_id: sale.id.clone(),
            term_days,
            down_payment_cents: down_payment.cents(),
            balance_cents: balance.cents(),
            due_date: sale.sale_date + Duration::days(term_days),
            status,
            version: 0,
            created_at,
        })
    }

    /// Decides whether a payment is accepted, without mutating anything.
    ///
    /// ## Rules
    /// - Amount must be positive
    /// - A settled plan accepts nothing
    /// - Amount must not exceed the balance. The whole payment is
    ///   rejected; there is no clamping or partial application, the
    ///   caller resubmits a corrected amount.
    ///
    /// ## Result
    /// The balance and status the plan will have once the payment is
    /// applied. The caller persists both together with the payment
    /// record, as one atomic unit.
    pub fn accept_payment(&self, amount: Money) -> CoreResult<PaymentDecision> {
        validate_payment_amount(amount.cents())?;

        if !self.status.accepts_payments() {
            return Err(CoreError::invalid_payment(format!(
                "plan {} is settled",
                self.id
            )));
        }

        let balance = self.balance();
        if amount > balance {
            return Err(CoreError::invalid_payment(format!(
                "amount {} exceeds balance {}",
                amount, balance
            )));
        }

        let new_balance = balance - amount;
        let new_status = if new_balance.is_zero() {
            PlanStatus::Settled
        } else {
            PlanStatus::PartiallyPaid
        };

        Ok(PaymentDecision {
            new_balance,
            new_status,
        })
    }
}

// =============================================================================
// Payment Decision
// =============================================================================

/// The outcome of an accepted payment: what the plan becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentDecision {
    pub new_balance: Money,
    pub new_status: PlanStatus,
}

// =============================================================================
// Ledger Invariant
// =============================================================================

/// Checks the conservation rule the ledger must satisfy at all times:
///
/// ```text
/// balance + Σ(accepted payments) + down_payment == sale total
/// 0 ≤ balance ≤ total − down_payment
/// ```
///
/// Used by tests and debug assertions; a `false` here means money is
/// unaccounted for.
pub fn ledger_invariant_holds(
    sale_total: Money,
    down_payment: Money,
    accepted_payments: &[Money],
    balance: Money,
) -> bool {
    let paid: Money = accepted_payments.iter().copied().sum();
    let conserved = balance + paid + down_payment == sale_total;
    let bounded = !balance.is_negative() && balance <= sale_total - down_payment;
    conserved && bounded
}

// =============================================================================
// Unit Tests
// =============================================================================
