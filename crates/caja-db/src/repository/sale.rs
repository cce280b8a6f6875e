//! # Sale Repository
//!
//! Database operations for sales and sale lines.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. BUILD (in memory, caja-core)                                       │
//! │     └── SaleDraft: add_item / remove_item / update_quantity            │
//! │                                                                         │
//! │  2. PERSIST (here)                                                     │
//! │     └── persist() validates the draft, assigns the comprobante         │
//! │         number from the series counter, and writes the sale plus       │
//! │         ALL of its lines in one transaction                            │
//! │                                                                         │
//! │  3. IMMUTABLE                                                          │
//! │     └── A persisted sale is never updated; the credit ledger           │
//! │         references it read-only                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use caja_core::error::CoreError;
use caja_core::sale::SaleDraft;
use caja_core::types::{
    CustomerInfo, DocumentType, PaymentTerms, Sale, SaleLine, SaleStatus,
};

use crate::error::{DbError, DbResult, LedgerResult};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Validates and persists a draft: comprobante assignment, the sale
    /// row and all line rows, in a single transaction.
    ///
    /// ## Failure Semantics
    /// - An invalid draft fails with every validation message at once,
    ///   before anything is written
    /// - A write failure rolls the whole sale back; there is no state
    ///   where the sale exists without its lines
    pub async fn persist(&self, draft: SaleDraft) -> LedgerResult<(Sale, Vec<SaleLine>)> {
        let report = draft.validate();
        if !report.valid {
            return Err(CoreError::DraftInvalid {
                errors: report.errors,
            }
            .into());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::op("begin persist sale", e))?;

        let number = next_comprobante(&mut tx, draft.document_type).await?;
        let (sale, lines) = draft.into_sale(number, Utc::now());

        insert_sale(&mut *tx, &sale).await?;
        for line in &lines {
            insert_line(&mut *tx, line).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::op("commit sale", e))?;

        info!(
            sale_id = %sale.id,
            comprobante = %sale.comprobante_number,
            total = %sale.total(),
            lines = lines.len(),
            "Sale persisted"
        );

        Ok((sale, lines))
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        fetch_sale(&self.pool, id).await
    }

    /// Gets a sale by its comprobante number.
    pub async fn get_by_comprobante(&self, number: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "{SALE_SELECT} WHERE comprobante_number = ?1"
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DbError::op("fetch sale by comprobante", e))?;

        Ok(row.map(Sale::from))
    }

    /// Gets all lines for a sale, in insertion order.
    pub async fn get_lines(&self, sale_id: &str) -> DbResult<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT
                id, sale_id, product_id, name_snapshot,
                unit_price_cents, quantity, line_total_cents, created_at
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DbError::op("fetch sale lines", e))?;

        Ok(lines)
    }

    /// Lists the most recent sales, newest first.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "{SALE_SELECT} ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DbError::op("list recent sales", e))?;

        Ok(rows.into_iter().map(Sale::from).collect())
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

const SALE_SELECT: &str = r#"
    SELECT
        id, comprobante_number, document_type, sale_date,
        customer_name, customer_tax_id, customer_phone, customer_address,
        subtotal_cents, tax_cents, discount_cents, total_cents,
        status, payment_terms, notes, created_at
    FROM sales
"#;

/// Flat row shape for the `sales` table. The customer snapshot is
/// stored as four columns and folded back into [`CustomerInfo`] here.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    comprobante_number: String,
    document_type: DocumentType,
    sale_date: NaiveDate,
    customer_name: String,
    customer_tax_id: Option<String>,
    customer_phone: Option<String>,
    customer_address: Option<String>,
    subtotal_cents: i64,
    tax_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    status: SaleStatus,
    payment_terms: PaymentTerms,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Sale {
            id: row.id,
            comprobante_number: row.comprobante_number,
            document_type: row.document_type,
            sale_date: row.sale_date,
            customer: CustomerInfo {
                name: row.customer_name,
                tax_id: row.customer_tax_id,
                phone: row.customer_phone,
                address: row.customer_address,
            },
            subtotal_cents: row.subtotal_cents,
            tax_cents: row.tax_cents,
            discount_cents: row.discount_cents,
            total_cents: row.total_cents,
            status: row.status,
            payment_terms: row.payment_terms,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Shared Statement Helpers
// =============================================================================
// pub(crate) so the checkout orchestration can compose these into one
// transaction spanning the sale, its credit plan and the legacy mirror.

/// Fetches a sale through any executor (pool or open transaction).
pub(crate) async fn fetch_sale<'e, E>(executor: E, id: &str) -> DbResult<Option<Sale>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let row = sqlx::query_as::<_, SaleRow>(&format!("{SALE_SELECT} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| DbError::op("fetch sale", e))?;

    Ok(row.map(Sale::from))
}

/// Draws the next number from the series counter.
///
/// The counter row is bumped atomically inside the caller's
/// transaction, so two checkouts can never draw the same number, no
/// matter how close together they run. Output shape: `NV-000042`.
pub(crate) async fn next_comprobante(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    document_type: DocumentType,
) -> DbResult<String> {
    let series = document_type.prefix();

    let value: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE comprobante_series
        SET next_value = next_value + 1
        WHERE series = ?1
        RETURNING next_value - 1
        "#,
    )
    .bind(series)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| DbError::op("assign comprobante number", e))?;

    let value = value.ok_or_else(|| DbError::not_found("Comprobante series", series))?;

    Ok(format!("{}-{:06}", series, value))
}

/// Inserts a sale row.
pub(crate) async fn insert_sale<'e, E>(executor: E, sale: &Sale) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    debug!(id = %sale.id, comprobante = %sale.comprobante_number, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, comprobante_number, document_type, sale_date,
            customer_name, customer_tax_id, customer_phone, customer_address,
            subtotal_cents, tax_cents, discount_cents, total_cents,
            status, payment_terms, notes, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7, ?8,
            ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.comprobante_number)
    .bind(sale.document_type)
    .bind(sale.sale_date)
    .bind(&sale.customer.name)
    .bind(&sale.customer.tax_id)
    .bind(&sale.customer.phone)
    .bind(&sale.customer.address)
    .bind(sale.subtotal_cents)
    .bind(sale.tax_cents)
    .bind(sale.discount_cents)
    .bind(sale.total_cents)
    .bind(sale.status)
    .bind(sale.payment_terms)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .execute(executor)
    .await
    .map_err(|e| DbError::op("insert sale", e))?;

    Ok(())
}

/// Inserts a sale line row.
pub(crate) async fn insert_line<'e, E>(executor: E, line: &SaleLine) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO sale_lines (
            id, sale_id, product_id, name_snapshot,
            unit_price_cents, quantity, line_total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&line.id)
    .bind(&line.sale_id)
    .bind(&line.product_id)
    .bind(&line.name_snapshot)
    .bind(line.unit_price_cents)
    .bind(line.quantity)
    .bind(line.line_total_cents)
    .bind(line.created_at)
    .execute(executor)
    .await
    .map_err(|e| DbError::op("insert sale line", e))?;

    Ok(())
}
