//! # Checkout Orchestration
//!
//! Drives a validated draft through its full commit:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      finalize_sale, one transaction                     │
//! │                                                                         │
//! │  validate draft ── invalid? ──► Err with every message, nothing open   │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │    ├── draw comprobante number from the series counter                  │
//! │    ├── INSERT sale + all lines                                          │
//! │    ├── credit terms? ──► INSERT credit plan                             │
//! │    │        └── probe legacy schema                                     │
//! │    │              ├── absent  ──► record Skipped, continue              │
//! │    │              ├── present ──► INSERT mirror row                     │
//! │    │              │      └── insert fails ──► record Failed, continue   │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  A crash anywhere before COMMIT rolls back every row: there is no      │
//! │  state where the sale exists without its plan, or the plan without     │
//! │  its sale. The mirror alone is advisory; its failure is reported in    │
//! │  the outcome, never by aborting the checkout.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use caja_core::error::CoreError;
use caja_core::money::Money;
use caja_core::sale::SaleDraft;
use caja_core::types::{CreditPlan, LegacyCreditRecord, Sale, SaleLine};

use crate::error::{DbError, LedgerResult};
use crate::pool::Database;
use crate::repository::legacy::{self, MirrorOutcome, SchemaPresence};
use crate::repository::{credit, sale};

// =============================================================================
// Inputs / Outputs
// =============================================================================

/// The installment terms for a credit checkout.
#[derive(Debug, Clone, Copy)]
pub struct CreditTerms {
    pub term_days: i64,
    pub down_payment: Money,
}

/// Everything a finished checkout produced.
///
/// Serializable so the presentation layer can hand it over as-is in
/// its `{ success, data | error }` envelope.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
    /// Present on credit sales only.
    pub plan: Option<CreditPlan>,
    /// Present on credit sales only; says what happened to the legacy
    /// mirror (mirrored, skipped, or failed).
    pub mirror: Option<MirrorOutcome>,
}

// =============================================================================
// Orchestration
// =============================================================================

/// Validates, numbers and persists a draft, together with its credit
/// plan and legacy mirror when the sale is on credit terms.
///
/// ## Failure Semantics
/// - Invalid draft: fails before any row is written
/// - Credit sale without [`CreditTerms`], or terms that break the plan
///   rules: the whole checkout fails and rolls back
/// - Legacy mirror problems never fail the checkout (see module docs)
pub async fn finalize_sale(
    db: &Database,
    draft: SaleDraft,
    credit_terms: Option<CreditTerms>,
) -> LedgerResult<CheckoutOutcome> {
    let report = draft.validate();
    if !report.valid {
        return Err(CoreError::DraftInvalid {
            errors: report.errors,
        }
        .into());
    }

    let is_credit = draft.payment_terms == caja_core::types::PaymentTerms::Credit;
    let terms = match (is_credit, credit_terms) {
        (true, None) => {
            return Err(
                CoreError::invalid_plan("credit sale finalized without credit terms").into(),
            )
        }
        (true, Some(t)) => Some(t),
        (false, _) => None,
    };

    let mut tx = db
        .pool()
        .begin()
        .await
        .map_err(|e| DbError::op("begin checkout", e))?;

    let number = sale::next_comprobante(&mut tx, draft.document_type).await?;
    let (persisted_sale, lines) = draft.into_sale(number, Utc::now());

    sale::insert_sale(&mut *tx, &persisted_sale).await?;
    for line in &lines {
        sale::insert_line(&mut *tx, line).await?;
    }

    let mut plan = None;
    let mut mirror = None;

    if let Some(terms) = terms {
        let created = CreditPlan::create(
            &persisted_sale,
            terms.term_days,
            terms.down_payment,
            Utc::now(),
        )?;
        credit::insert_plan(&mut *tx, &created).await?;

        mirror = Some(match legacy::probe_schema(&mut *tx).await? {
            SchemaPresence::Absent => {
                warn!(sale_id = %persisted_sale.id, "Legacy schema absent, mirror skipped");
                MirrorOutcome::skipped_schema_absent()
            }
            SchemaPresence::Present => {
                let record = LegacyCreditRecord {
                    sale_id: persisted_sale.id.clone(),
                    term_days: created.term_days,
                    balance_cents: created.balance_cents,
                    compat: true,
                };
                match legacy::insert_legacy(&mut *tx, &record).await {
                    Ok(()) => MirrorOutcome::Mirrored {
                        sale_id: persisted_sale.id.clone(),
                    },
                    Err(e) => {
                        // Advisory write: report it, keep the checkout.
                        error!(sale_id = %persisted_sale.id, error = %e, "Legacy mirror failed");
                        MirrorOutcome::Failed {
                            message: e.to_string(),
                        }
                    }
                }
            }
        });

        plan = Some(created);
    }

    tx.commit()
        .await
        .map_err(|e| DbError::op("commit checkout", e))?;

    info!(
        sale_id = %persisted_sale.id,
        comprobante = %persisted_sale.comprobante_number,
        total = %persisted_sale.total(),
        credit = plan.is_some(),
        "Sale finalized"
    );

    Ok(CheckoutOutcome {
        sale: persisted_sale,
        lines,
        plan,
        mirror,
    })
}
