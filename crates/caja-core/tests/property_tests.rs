//! Property-based tests for the sale aggregate and the credit ledger.
//!
//! These tests use proptest to verify the monetary invariants across a
//! wide range of inputs, helping to catch edge cases that unit tests
//! might miss.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use caja_core::credit::ledger_invariant_holds;
use caja_core::money::Money;
use caja_core::sale::SaleDraft;
use caja_core::types::{
    CreditPlan, CustomerInfo, DocumentType, PaymentTerms, Sale, SaleStatus,
};
use caja_core::IVA_RATE;

// =============================================================================
// Strategies
// =============================================================================

/// A random mutation against a sale draft.
#[derive(Debug, Clone)]
enum DraftOp {
    /// Add a product from a small pool (so re-adds actually happen).
    Add { product: u8, price_cents: i64, quantity: i64 },
    /// Remove the nth line (modulo current length).
    Remove { nth: usize },
    /// Set the nth line's quantity, possibly to a non-positive value.
    Update { nth: usize, quantity: i64 },
    /// Set the whole-sale discount.
    Discount { cents: i64 },
}

fn draft_op_strategy() -> impl Strategy<Value = DraftOp> {
    prop_oneof![
        (0u8..5, 1i64..50_000, 1i64..20).prop_map(|(product, price_cents, quantity)| {
            DraftOp::Add { product, price_cents, quantity }
        }),
        (0usize..8).prop_map(|nth| DraftOp::Remove { nth }),
        (0usize..8, -5i64..30).prop_map(|(nth, quantity)| DraftOp::Update { nth, quantity }),
        (0i64..100_000).prop_map(|cents| DraftOp::Discount { cents }),
    ]
}

fn apply(draft: &mut SaleDraft, op: &DraftOp) {
    match op {
        DraftOp::Add { product, price_cents, quantity } => {
            let product_id = format!("prod-{}", product);
            draft.add_item(
                &product_id,
                &format!("Product {}", product),
                Money::from_cents(*price_cents),
                *quantity,
            );
        }
        DraftOp::Remove { nth } => {
            if !draft.is_empty() {
                let id = draft.lines()[nth % draft.line_count()].id.clone();
                draft.remove_item(&id);
            }
        }
        DraftOp::Update { nth, quantity } => {
            if !draft.is_empty() {
                let id = draft.lines()[nth % draft.line_count()].id.clone();
                draft.update_quantity(&id, *quantity);
            }
        }
        DraftOp::Discount { cents } => {
            draft.set_discount(Money::from_cents(*cents));
        }
    }
}

/// The totals invariants, recomputed from scratch.
fn assert_totals_consistent(draft: &SaleDraft) {
    let expected_subtotal: i64 = draft
        .lines()
        .iter()
        .map(|l| l.unit_price.cents() * l.quantity)
        .sum();
    assert_eq!(draft.subtotal().cents(), expected_subtotal);

    let expected_tax = Money::from_cents(expected_subtotal).calculate_tax(IVA_RATE);
    assert_eq!(draft.tax(), expected_tax);

    let expected_total =
        (expected_subtotal + expected_tax.cents() - draft.discount().cents()).max(0);
    assert_eq!(draft.total().cents(), expected_total);
}

// =============================================================================
// Aggregate Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// For any sequence of add/remove/update calls, the derived totals
    /// always match a from-scratch recomputation.
    #[test]
    fn draft_totals_hold_under_any_mutation_sequence(
        ops in proptest::collection::vec(draft_op_strategy(), 1..40)
    ) {
        let mut draft = SaleDraft::new(
            DocumentType::SaleNote,
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        );

        for op in &ops {
            apply(&mut draft, op);
            assert_totals_consistent(&draft);
        }
    }

    /// Lines stay unique per product reference no matter how often a
    /// product is re-added.
    #[test]
    fn draft_lines_unique_per_product(
        ops in proptest::collection::vec(draft_op_strategy(), 1..40)
    ) {
        let mut draft = SaleDraft::new(
            DocumentType::SaleNote,
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        );

        for op in &ops {
            apply(&mut draft, op);

            let mut products: Vec<&str> =
                draft.lines().iter().map(|l| l.product_id.as_str()).collect();
            products.sort_unstable();
            let before = products.len();
            products.dedup();
            prop_assert_eq!(before, products.len());
        }
    }
}

// =============================================================================
// Ledger Properties
// =============================================================================

fn credit_sale(total_cents: i64) -> Sale {
    Sale {
        id: Uuid::new_v4().to_string(),
        comprobante_number: "NV-000001".to_string(),
        document_type: DocumentType::SaleNote,
        sale_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        customer: CustomerInfo {
            name: "Maria Lopez".to_string(),
            ..Default::default()
        },
        subtotal_cents: total_cents,
        tax_cents: 0,
        discount_cents: 0,
        total_cents,
        status: SaleStatus::Completed,
        payment_terms: PaymentTerms::Credit,
        notes: None,
        created_at: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// After any sequence of attempted payments, the conservation rule
    /// holds over the accepted ones, and rejected attempts change
    /// nothing.
    #[test]
    fn ledger_conserves_money_under_any_payment_sequence(
        total_cents in 1i64..1_000_000,
        down_fraction in 0u8..=100,
        amounts in proptest::collection::vec(-1000i64..40_000, 0..30)
    ) {
        let sale = credit_sale(total_cents);
        let down = Money::from_cents(total_cents * down_fraction as i64 / 100);

        let mut plan =
            CreditPlan::create(&sale, 30, down, Utc::now()).unwrap();
        let mut accepted: Vec<Money> = Vec::new();

        for cents in amounts {
            let amount = Money::from_cents(cents);
            let before_balance = plan.balance_cents;
            let before_status = plan.status;

            match plan.accept_payment(amount) {
                Ok(decision) => {
                    plan.balance_cents = decision.new_balance.cents();
                    plan.status = decision.new_status;
                    accepted.push(amount);
                }
                Err(_) => {
                    // A rejected payment must leave the plan untouched.
                    prop_assert_eq!(plan.balance_cents, before_balance);
                    prop_assert_eq!(plan.status, before_status);
                }
            }

            prop_assert!(ledger_invariant_holds(
                sale.total(),
                down,
                &accepted,
                plan.balance()
            ));
        }
    }

    /// A settled plan never accepts another payment.
    #[test]
    fn settled_plan_is_terminal(
        total_cents in 1i64..100_000,
        extra in 1i64..10_000
    ) {
        let sale = credit_sale(total_cents);
        let mut plan =
            CreditPlan::create(&sale, 30, Money::zero(), Utc::now()).unwrap();

        // Pay it off in one payment.
        let decision = plan.accept_payment(sale.total()).unwrap();
        plan.balance_cents = decision.new_balance.cents();
        plan.status = decision.new_status;
        prop_assert!(plan.is_settled());

        prop_assert!(plan.accept_payment(Money::from_cents(extra)).is_err());
    }
}
