//! # Legacy Credit Adapter
//!
//! Best-effort mirroring into the credit schema of the previous
//! application generation. That schema (a single `creditos` table) only
//! exists in deployments that were upgraded in place; fresh installs
//! never have it.
//!
//! ## Capability Detection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  mirror_create(sale_id, term, balance)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  probe sqlite_master for table 'creditos'                               │
//! │       │                                                                 │
//! │       ├── Absent ──► Ok(Skipped { reason }) ── expected, logged,        │
//! │       │              never an error                                     │
//! │       │                                                                 │
//! │       └── Present ──► INSERT reduced record ──► Ok(Mirrored)            │
//! │                            │                                            │
//! │                            └── insert fails ──► Err(DbError)            │
//! │                                                                         │
//! │  Callers branch on the tag, never on catching a missing-table          │
//! │  error. The mirror is advisory: the checkout flow reports a failed     │
//! │  mirror but never rolls back the credit plan because of it.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use caja_core::money::Money;
use caja_core::types::LegacyCreditRecord;

use crate::error::{DbError, DbResult};

/// Name of the old application's credit table.
const LEGACY_TABLE: &str = "creditos";

// =============================================================================
// Outcome Types
// =============================================================================

/// Whether the legacy schema exists in this deployment.
///
/// A tagged capability, checked against the storage catalog, so callers
/// match on it instead of threading a boolean through conditionals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPresence {
    Present,
    Absent,
}

/// The result of a mirror write.
///
/// `Skipped` is an expected, non-exceptional outcome: it must be
/// distinguishable from both success and failure so callers can log it
/// without alarming the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MirrorOutcome {
    /// The reduced record was written to the legacy table.
    Mirrored { sale_id: String },
    /// The legacy schema is absent in this deployment; nothing written.
    Skipped { reason: String },
    /// The schema is present but the write failed. Only produced by the
    /// checkout orchestration, which tolerates mirror failures instead
    /// of failing the primary operation.
    Failed { message: String },
}

impl MirrorOutcome {
    pub(crate) fn skipped_schema_absent() -> Self {
        MirrorOutcome::Skipped {
            reason: "legacy schema absent".to_string(),
        }
    }

    /// Whether the mirror was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, MirrorOutcome::Skipped { .. })
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// Adapter mirroring reduced credit records into the legacy schema.
#[derive(Debug, Clone)]
pub struct LegacyCreditAdapter {
    pool: SqlitePool,
}

impl LegacyCreditAdapter {
    /// Creates a new LegacyCreditAdapter.
    pub fn new(pool: SqlitePool) -> Self {
        LegacyCreditAdapter { pool }
    }

    /// Probes the storage catalog for the legacy table.
    pub async fn schema_presence(&self) -> DbResult<SchemaPresence> {
        probe_schema(&self.pool).await
    }

    /// Mirrors a newly created plan into the legacy table, if present.
    ///
    /// ## Failure Semantics
    /// - Schema absent: `Ok(Skipped)`, nothing raised
    /// - Schema present, insert fails: `Err(DbError)`; the caller
    ///   decides whether that is fatal (the checkout flow does not
    ///   treat it as such)
    pub async fn mirror_create(
        &self,
        sale_id: &str,
        term_days: i64,
        balance: Money,
    ) -> DbResult<MirrorOutcome> {
        match probe_schema(&self.pool).await? {
            SchemaPresence::Absent => {
                warn!(sale_id = %sale_id, "Legacy schema absent, mirror skipped");
                Ok(MirrorOutcome::skipped_schema_absent())
            }
            SchemaPresence::Present => {
                let record = LegacyCreditRecord {
                    sale_id: sale_id.to_string(),
                    term_days,
                    balance_cents: balance.cents(),
                    compat: true,
                };
                insert_legacy(&self.pool, &record).await?;
                debug!(sale_id = %sale_id, balance = %balance, "Mirrored plan into legacy table");
                Ok(MirrorOutcome::Mirrored {
                    sale_id: sale_id.to_string(),
                })
            }
        }
    }

    /// Lists the legacy records for a sale.
    ///
    /// Returns an empty sequence (not an error) when the legacy table
    /// is absent.
    pub async fn list_by_sale(&self, sale_id: &str) -> DbResult<Vec<LegacyCreditRecord>> {
        if probe_schema(&self.pool).await? == SchemaPresence::Absent {
            return Ok(Vec::new());
        }

        let records = sqlx::query_as::<_, LegacyCreditRecord>(
            r#"
            SELECT
                venta_id AS sale_id,
                plazo AS term_days,
                saldo AS balance_cents,
                compatible AS compat
            FROM creditos
            WHERE venta_id = ?1
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DbError::op("list legacy credits", e))?;

        Ok(records)
    }
}

// =============================================================================
// Shared Statement Helpers
// =============================================================================

/// Checks the storage catalog for the legacy table.
pub(crate) async fn probe_schema<'e, E>(executor: E) -> DbResult<SchemaPresence>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let found: Option<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
    )
    .bind(LEGACY_TABLE)
    .fetch_optional(executor)
    .await
    .map_err(|e| DbError::op("probe legacy schema", e))?;

    Ok(if found.is_some() {
        SchemaPresence::Present
    } else {
        SchemaPresence::Absent
    })
}

/// Inserts the reduced record into the legacy table.
///
/// Column names follow the old schema: venta_id, plazo (term in days),
/// saldo (balance), compatible (written-by-new-system marker).
pub(crate) async fn insert_legacy<'e, E>(executor: E, record: &LegacyCreditRecord) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO creditos (venta_id, plazo, saldo, compatible)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&record.sale_id)
    .bind(record.term_days)
    .bind(record.balance_cents)
    .bind(record.compat)
    .execute(executor)
    .await
    .map_err(|e| DbError::op("insert legacy credit", e))?;

    Ok(())
}
