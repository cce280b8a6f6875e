//! # Credit Ledger Repository
//!
//! Database operations for credit plans and their payment ledger.
//!
//! ## Payment Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              record_payment: one atomic read-modify-write               │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── read plan row (balance, status, version)                         │
//! │    │                                                                    │
//! │    ├── accept_payment() ── rejected? ──► ROLLBACK, nothing written      │
//! │    │                                                                    │
//! │    ├── UPDATE credit_plans SET balance, status, version = version + 1   │
//! │    │          WHERE id = ? AND version = ?  ◄── optimistic check        │
//! │    │                                                                    │
//! │    ├── 0 rows? another writer got there first ──► ROLLBACK, retry       │
//! │    │                                                                    │
//! │    ├── INSERT payment_records                                           │
//! │    │                                                                    │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Two concurrent payments against the same plan serialize on the        │
//! │  version column; the lost-update hazard cannot corrupt the balance.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use caja_core::error::CoreError;
use caja_core::money::Money;
use caja_core::types::{CreditPlan, PaymentRecord};

use crate::error::{DbError, DbResult, LedgerResult};
use crate::repository::sale::fetch_sale;

/// How many optimistic-lock conflicts a single payment will absorb
/// before giving up. Conflicts are only possible with more than one
/// writer, so in practice the first attempt wins.
const PAYMENT_RETRY_LIMIT: u32 = 3;

/// Repository for credit plan and payment ledger operations.
#[derive(Debug, Clone)]
pub struct CreditLedgerRepository {
    pool: SqlitePool,
}

impl CreditLedgerRepository {
    /// Creates a new CreditLedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CreditLedgerRepository { pool }
    }

    /// Creates the credit plan for an already-persisted sale.
    ///
    /// ## Failure Semantics
    /// - `SaleNotFound` when the sale id references nothing
    /// - `PlanAlreadyExists` when the sale already has a plan: checked
    ///   inside the transaction, and backed by the UNIQUE(sale_id)
    ///   index so a racing insert maps to the same error
    /// - `InvalidPlan` when the down payment is out of bounds
    ///
    /// The legacy mirror is NOT written here; callers that want it
    /// invoke the adapter alongside (see the checkout orchestration).
    pub async fn create_plan(
        &self,
        sale_id: &str,
        term_days: i64,
        down_payment: Money,
    ) -> LedgerResult<CreditPlan> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::op("begin create plan", e))?;

        let sale = fetch_sale(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM credit_plans WHERE sale_id = ?1")
                .bind(sale_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| DbError::op("check existing plan", e))?;

        if existing.is_some() {
            return Err(CoreError::PlanAlreadyExists {
                sale_id: sale_id.to_string(),
            }
            .into());
        }

        let plan = CreditPlan::create(&sale, term_days, down_payment, Utc::now())?;

        if let Err(e) = insert_plan(&mut *tx, &plan).await {
            // A writer that slipped past the check above hits the
            // UNIQUE(sale_id) index; report it as the same business error.
            return match e {
                DbError::UniqueViolation { ref field, .. } if field.contains("sale_id") => {
                    Err(CoreError::PlanAlreadyExists {
                        sale_id: sale_id.to_string(),
                    }
                    .into())
                }
                other => Err(other.into()),
            };
        }

        tx.commit()
            .await
            .map_err(|e| DbError::op("commit create plan", e))?;

        info!(
            plan_id = %plan.id,
            sale_id = %sale_id,
            balance = %plan.balance(),
            due_date = %plan.due_date,
            "Credit plan created"
        );

        Ok(plan)
    }

    /// Records a payment (abono) against a plan.
    ///
    /// Runs as a single atomic read-modify-write (see module docs).
    /// A rejected payment writes nothing: no balance change, no
    /// payment record.
    ///
    /// ## Returns
    /// The plan as it is after the payment, plus the appended record.
    pub async fn record_payment(
        &self,
        plan_id: &str,
        amount: Money,
        paid_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> LedgerResult<(CreditPlan, PaymentRecord)> {
        for attempt in 1..=PAYMENT_RETRY_LIMIT {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| DbError::op("begin record payment", e))?;

            let plan = fetch_plan(&mut *tx, plan_id)
                .await?
                .ok_or_else(|| CoreError::PlanNotFound(plan_id.to_string()))?;

            // Pure accept/reject; a rejection drops the transaction
            // with nothing written.
            let decision = plan.accept_payment(amount)?;

            let updated = sqlx::query(
                r#"
                UPDATE credit_plans
                SET balance_cents = ?1, status = ?2, version = version + 1
                WHERE id = ?3 AND version = ?4
                "#,
            )
            .bind(decision.new_balance.cents())
            .bind(decision.new_status)
            .bind(plan_id)
            .bind(plan.version)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::op("update plan balance", e))?;

            if updated.rows_affected() == 0 {
                // Lost the optimistic race: reread and retry.
                debug!(plan_id = %plan_id, attempt, "Plan version conflict, retrying");
                tx.rollback()
                    .await
                    .map_err(|e| DbError::op("rollback payment", e))?;
                continue;
            }

            let record = PaymentRecord {
                id: Uuid::new_v4().to_string(),
                plan_id: plan_id.to_string(),
                amount_cents: amount.cents(),
                paid_at,
                notes: notes.clone(),
                created_at: Utc::now(),
            };

            sqlx::query(
                r#"
                INSERT INTO payment_records (
                    id, plan_id, amount_cents, paid_at, notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&record.id)
            .bind(&record.plan_id)
            .bind(record.amount_cents)
            .bind(record.paid_at)
            .bind(&record.notes)
            .bind(record.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::op("insert payment record", e))?;

            tx.commit()
                .await
                .map_err(|e| DbError::op("commit payment", e))?;

            info!(
                plan_id = %plan_id,
                payment_id = %record.id,
                amount = %amount,
                new_balance = %decision.new_balance,
                status = ?decision.new_status,
                "Payment recorded"
            );

            let updated_plan = CreditPlan {
                balance_cents: decision.new_balance.cents(),
                status: decision.new_status,
                version: plan.version + 1,
                ..plan
            };

            return Ok((updated_plan, record));
        }

        Err(DbError::TransactionFailed(format!(
            "payment on plan {plan_id} exhausted {PAYMENT_RETRY_LIMIT} version-conflict retries"
        ))
        .into())
    }

    /// Produces the payment history for a plan, newest first.
    /// Read-only; never mutates state.
    pub async fn list_payments(&self, plan_id: &str) -> DbResult<Vec<PaymentRecord>> {
        let payments = sqlx::query_as::<_, PaymentRecord>(
            r#"
            SELECT id, plan_id, amount_cents, paid_at, notes, created_at
            FROM payment_records
            WHERE plan_id = ?1
            ORDER BY paid_at DESC, created_at DESC
            "#,
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DbError::op("list payments", e))?;

        Ok(payments)
    }

    /// Gets a plan by ID.
    pub async fn get_plan(&self, id: &str) -> DbResult<Option<CreditPlan>> {
        fetch_plan(&self.pool, id).await
    }

    /// Gets the plan attached to a sale, if any.
    pub async fn get_plan_by_sale(&self, sale_id: &str) -> DbResult<Option<CreditPlan>> {
        sqlx::query_as::<_, CreditPlan>(&format!("{PLAN_SELECT} WHERE sale_id = ?1"))
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DbError::op("fetch plan by sale", e))
    }
}

// =============================================================================
// Shared Statement Helpers
// =============================================================================

const PLAN_SELECT: &str = r#"
    SELECT
        id, sale_id, term_days, down_payment_cents, balance_cents,
        due_date, status, version, created_at
    FROM credit_plans
"#;

/// Fetches a plan through any executor (pool or open transaction).
pub(crate) async fn fetch_plan<'e, E>(executor: E, id: &str) -> DbResult<Option<CreditPlan>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query_as::<_, CreditPlan>(&format!("{PLAN_SELECT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| DbError::op("fetch plan", e))
}

/// Inserts a plan row.
pub(crate) async fn insert_plan<'e, E>(executor: E, plan: &CreditPlan) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    debug!(plan_id = %plan.id, sale_id = %plan.sale_id, "Inserting credit plan");

    sqlx::query(
        r#"
        INSERT INTO credit_plans (
            id, sale_id, term_days, down_payment_cents, balance_cents,
            due_date, status, version, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&plan.id)
    .bind(&plan.sale_id)
    .bind(plan.term_days)
    .bind(plan.down_payment_cents)
    .bind(plan.balance_cents)
    .bind(plan.due_date)
    .bind(plan.status)
    .bind(plan.version)
    .bind(plan.created_at)
    .execute(executor)
    .await
    .map_err(|e| DbError::op("insert credit plan", e))?;

    Ok(())
}
