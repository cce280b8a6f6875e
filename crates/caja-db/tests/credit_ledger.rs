//! Integration tests for the credit sale ledger against an in-memory
//! SQLite database: sale persistence, comprobante numbering, the
//! payment ledger state machine, and the legacy schema adapter.

use chrono::{TimeZone, Utc};

use caja_core::error::CoreError;
use caja_core::money::Money;
use caja_core::sale::SaleDraft;
use caja_core::types::{CustomerInfo, DocumentType, PaymentTerms, PlanStatus};
use caja_db::checkout::{finalize_sale, CreditTerms};
use caja_db::{Database, DbConfig, LedgerError, MirrorOutcome, SchemaPresence};

// =============================================================================
// Helpers
// =============================================================================

async fn test_db() -> Database {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("caja_db=debug")
        .try_init();

    Database::new(DbConfig::in_memory()).await.unwrap()
}

fn sale_date() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
}

/// A cash sale-note draft: 2 × $10.00 + 1 × $5.00.
/// Subtotal $25.00, IVA $3.00, total $28.00.
fn cash_draft() -> SaleDraft {
    let mut draft = SaleDraft::new(DocumentType::SaleNote, sale_date());
    draft.add_item("prod-cola", "Cola 1.5L", Money::from_cents(1000), 2);
    draft.add_item("prod-pan", "Pan integral", Money::from_cents(500), 1);
    draft.set_customer(CustomerInfo {
        name: "Maria Lopez".to_string(),
        ..Default::default()
    });
    draft
}

/// A credit draft whose total lands on exactly $100.00:
/// one line of $89.29, IVA $10.71.
fn credit_draft() -> SaleDraft {
    let mut draft = SaleDraft::new(DocumentType::SaleNote, sale_date());
    draft.add_item("prod-radio", "Radio portatil", Money::from_cents(8929), 1);
    draft.set_customer(CustomerInfo {
        name: "Carlos Vera".to_string(),
        phone: Some("0991234567".to_string()),
        ..Default::default()
    });
    draft.set_payment_terms(PaymentTerms::Credit);
    draft
}

/// Creates the old application's credit table by hand, simulating an
/// in-place upgraded deployment.
async fn create_legacy_table(db: &Database) {
    sqlx::query(
        r#"
        CREATE TABLE creditos (
            venta_id   TEXT NOT NULL,
            plazo      INTEGER NOT NULL,
            saldo      INTEGER NOT NULL,
            compatible INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(db.pool())
    .await
    .unwrap();
}

// =============================================================================
// Sale Persistence
// =============================================================================

#[tokio::test]
async fn persist_and_read_round_trip() {
    let db = test_db().await;

    let (sale, lines) = db.sales().persist(cash_draft()).await.unwrap();
    assert_eq!(sale.subtotal_cents, 2500);
    assert_eq!(sale.tax_cents, 300);
    assert_eq!(sale.total_cents, 2800);
    assert_eq!(lines.len(), 2);

    let loaded = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
    assert_eq!(loaded.comprobante_number, sale.comprobante_number);
    assert_eq!(loaded.total_cents, 2800);
    assert_eq!(loaded.customer.name, "Maria Lopez");
    assert_eq!(loaded.document_type, DocumentType::SaleNote);

    let loaded_lines = db.sales().get_lines(&sale.id).await.unwrap();
    assert_eq!(loaded_lines.len(), 2);
    assert_eq!(loaded_lines[0].name_snapshot, "Cola 1.5L");
    assert_eq!(loaded_lines[0].line_total_cents, 2000);

    let by_number = db
        .sales()
        .get_by_comprobante(&sale.comprobante_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_number.id, sale.id);
}

#[tokio::test]
async fn comprobante_numbers_count_per_series() {
    let db = test_db().await;

    let (first, _) = db.sales().persist(cash_draft()).await.unwrap();
    let (second, _) = db.sales().persist(cash_draft()).await.unwrap();
    assert_eq!(first.comprobante_number, "NV-000001");
    assert_eq!(second.comprobante_number, "NV-000002");

    // The invoice series numbers independently.
    let mut invoice = SaleDraft::new(DocumentType::Invoice, sale_date());
    invoice.add_item("prod-cola", "Cola 1.5L", Money::from_cents(1000), 1);
    invoice.set_customer(CustomerInfo {
        name: "Maria Lopez".to_string(),
        tax_id: Some("0912345678001".to_string()),
        ..Default::default()
    });
    let (third, _) = db.sales().persist(invoice).await.unwrap();
    assert_eq!(third.comprobante_number, "FC-000001");
}

#[tokio::test]
async fn invalid_draft_writes_nothing() {
    let db = test_db().await;

    let empty = SaleDraft::new(DocumentType::SaleNote, sale_date());
    let err = db.sales().persist(empty).await.unwrap_err();

    match err {
        LedgerError::Core(CoreError::DraftInvalid { errors }) => {
            assert_eq!(errors, vec!["at least one line item required"]);
        }
        other => panic!("expected DraftInvalid, got {other:?}"),
    }

    assert!(db.sales().list_recent(10).await.unwrap().is_empty());
}

// =============================================================================
// Credit Plans
// =============================================================================

#[tokio::test]
async fn create_plan_computes_balance_and_due_date() {
    let db = test_db().await;
    let (sale, _) = db.sales().persist(credit_draft()).await.unwrap();

    let plan = db
        .credit()
        .create_plan(&sale.id, 30, Money::from_cents(2000))
        .await
        .unwrap();

    assert_eq!(plan.balance_cents, 8000);
    assert_eq!(plan.status, PlanStatus::Open);
    assert_eq!(
        plan.due_date,
        chrono::NaiveDate::from_ymd_opt(2026, 4, 13).unwrap()
    );

    let by_sale = db.credit().get_plan_by_sale(&sale.id).await.unwrap();
    assert_eq!(by_sale.unwrap().id, plan.id);
}

#[tokio::test]
async fn second_plan_for_same_sale_is_rejected() {
    let db = test_db().await;
    let (sale, _) = db.sales().persist(credit_draft()).await.unwrap();

    db.credit()
        .create_plan(&sale.id, 30, Money::from_cents(2000))
        .await
        .unwrap();

    let err = db
        .credit()
        .create_plan(&sale.id, 60, Money::zero())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Core(CoreError::PlanAlreadyExists { .. })
    ));
}

#[tokio::test]
async fn plan_with_excess_down_payment_is_rejected() {
    let db = test_db().await;
    let (sale, _) = db.sales().persist(credit_draft()).await.unwrap();

    let err = db
        .credit()
        .create_plan(&sale.id, 30, Money::from_cents(12000))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Core(CoreError::InvalidPlan { .. })
    ));

    // Nothing was written.
    assert!(db
        .credit()
        .get_plan_by_sale(&sale.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn plan_for_unknown_sale_is_rejected() {
    let db = test_db().await;

    let err = db
        .credit()
        .create_plan("no-such-sale", 30, Money::zero())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Core(CoreError::SaleNotFound(_))
    ));
}

// =============================================================================
// Payment Ledger
// =============================================================================

#[tokio::test]
async fn payment_flow_open_to_settled() {
    let db = test_db().await;
    let (sale, _) = db.sales().persist(credit_draft()).await.unwrap();
    assert_eq!(sale.total_cents, 10000);

    let plan = db
        .credit()
        .create_plan(&sale.id, 30, Money::from_cents(2000))
        .await
        .unwrap();
    assert_eq!(plan.balance_cents, 8000);

    let when = Utc.with_ymd_and_hms(2026, 3, 20, 10, 0, 0).unwrap();

    // $30.00 → balance $50.00, partially paid
    let (plan_after, record) = db
        .credit()
        .record_payment(&plan.id, Money::from_cents(3000), when, None)
        .await
        .unwrap();
    assert_eq!(plan_after.balance_cents, 5000);
    assert_eq!(plan_after.status, PlanStatus::PartiallyPaid);
    assert_eq!(record.amount_cents, 3000);

    // $60.00 → rejected, exceeds the $50.00 balance; state unchanged
    let err = db
        .credit()
        .record_payment(&plan.id, Money::from_cents(6000), when, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Core(CoreError::InvalidPayment { .. })
    ));

    let unchanged = db.credit().get_plan(&plan.id).await.unwrap().unwrap();
    assert_eq!(unchanged.balance_cents, 5000);
    assert_eq!(unchanged.status, PlanStatus::PartiallyPaid);
    assert_eq!(db.credit().list_payments(&plan.id).await.unwrap().len(), 1);

    // $50.00 → balance $0.00, settled
    let (settled, _) = db
        .credit()
        .record_payment(&plan.id, Money::from_cents(5000), when, None)
        .await
        .unwrap();
    assert_eq!(settled.balance_cents, 0);
    assert_eq!(settled.status, PlanStatus::Settled);

    // A settled plan accepts nothing further.
    let err = db
        .credit()
        .record_payment(&plan.id, Money::from_cents(1), when, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Core(CoreError::InvalidPayment { .. })
    ));
    assert_eq!(db.credit().list_payments(&plan.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn rejected_payment_appends_no_record() {
    let db = test_db().await;
    let (sale, _) = db.sales().persist(credit_draft()).await.unwrap();
    let plan = db
        .credit()
        .create_plan(&sale.id, 30, Money::zero())
        .await
        .unwrap();

    let when = Utc.with_ymd_and_hms(2026, 3, 20, 10, 0, 0).unwrap();

    // Exceeds the balance, zero, negative: all rejected, none recorded.
    for cents in [20000, 0, -100] {
        let result = db
            .credit()
            .record_payment(&plan.id, Money::from_cents(cents), when, None)
            .await;
        assert!(result.is_err());
    }

    assert!(db.credit().list_payments(&plan.id).await.unwrap().is_empty());
    let untouched = db.credit().get_plan(&plan.id).await.unwrap().unwrap();
    assert_eq!(untouched.balance_cents, 10000);
    assert_eq!(untouched.version, 0);
}

#[tokio::test]
async fn payments_listed_newest_first() {
    let db = test_db().await;
    let (sale, _) = db.sales().persist(credit_draft()).await.unwrap();
    let plan = db
        .credit()
        .create_plan(&sale.id, 90, Money::zero())
        .await
        .unwrap();

    let earlier = Utc.with_ymd_and_hms(2026, 3, 20, 10, 0, 0).unwrap();
    let later = Utc.with_ymd_and_hms(2026, 4, 2, 16, 30, 0).unwrap();

    db.credit()
        .record_payment(
            &plan.id,
            Money::from_cents(1000),
            earlier,
            Some("primer abono".to_string()),
        )
        .await
        .unwrap();
    db.credit()
        .record_payment(&plan.id, Money::from_cents(2000), later, None)
        .await
        .unwrap();

    let payments = db.credit().list_payments(&plan.id).await.unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0].paid_at, later);
    assert_eq!(payments[1].paid_at, earlier);
    assert_eq!(payments[1].notes.as_deref(), Some("primer abono"));
}

// =============================================================================
// Legacy Adapter
// =============================================================================

#[tokio::test]
async fn mirror_skips_when_legacy_schema_absent() {
    let db = test_db().await;

    assert_eq!(
        db.legacy().schema_presence().await.unwrap(),
        SchemaPresence::Absent
    );

    let outcome = db
        .legacy()
        .mirror_create("some-sale", 30, Money::from_cents(8000))
        .await
        .unwrap();

    assert!(outcome.is_skipped());
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        serde_json::json!({
            "outcome": "skipped",
            "reason": "legacy schema absent"
        })
    );

    // Listing is an empty sequence, not an error.
    assert!(db.legacy().list_by_sale("some-sale").await.unwrap().is_empty());
}

#[tokio::test]
async fn mirror_writes_when_legacy_schema_present() {
    let db = test_db().await;
    create_legacy_table(&db).await;

    assert_eq!(
        db.legacy().schema_presence().await.unwrap(),
        SchemaPresence::Present
    );

    let outcome = db
        .legacy()
        .mirror_create("venta-42", 60, Money::from_cents(4500))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        MirrorOutcome::Mirrored {
            sale_id: "venta-42".to_string()
        }
    );

    let records = db.legacy().list_by_sale("venta-42").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].term_days, 60);
    assert_eq!(records[0].balance_cents, 4500);
    assert!(records[0].compat);
}

// =============================================================================
// Checkout Orchestration
// =============================================================================

#[tokio::test]
async fn checkout_cash_sale_has_no_plan() {
    let db = test_db().await;

    let outcome = finalize_sale(&db, cash_draft(), None).await.unwrap();
    assert!(outcome.plan.is_none());
    assert!(outcome.mirror.is_none());
    assert_eq!(outcome.sale.total_cents, 2800);

    assert!(db
        .sales()
        .get_by_id(&outcome.sale.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn checkout_credit_sale_creates_plan_and_reports_mirror() {
    let db = test_db().await;

    let terms = CreditTerms {
        term_days: 30,
        down_payment: Money::from_cents(2000),
    };
    let outcome = finalize_sale(&db, credit_draft(), Some(terms)).await.unwrap();

    let plan = outcome.plan.expect("credit sale must produce a plan");
    assert_eq!(plan.balance_cents, 8000);
    assert_eq!(plan.status, PlanStatus::Open);

    // Fresh install: the mirror reports the expected skip.
    assert!(outcome.mirror.unwrap().is_skipped());

    let stored = db
        .credit()
        .get_plan_by_sale(&outcome.sale.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, plan.id);
}

#[tokio::test]
async fn checkout_credit_sale_mirrors_into_legacy_table() {
    let db = test_db().await;
    create_legacy_table(&db).await;

    let terms = CreditTerms {
        term_days: 45,
        down_payment: Money::zero(),
    };
    let outcome = finalize_sale(&db, credit_draft(), Some(terms)).await.unwrap();

    assert_eq!(
        outcome.mirror.unwrap(),
        MirrorOutcome::Mirrored {
            sale_id: outcome.sale.id.clone()
        }
    );

    let records = db.legacy().list_by_sale(&outcome.sale.id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].balance_cents, 10000);
}

#[tokio::test]
async fn checkout_credit_sale_without_terms_rolls_back() {
    let db = test_db().await;

    let err = finalize_sale(&db, credit_draft(), None).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Core(CoreError::InvalidPlan { .. })
    ));

    // Nothing persisted, and no comprobante number was consumed.
    assert!(db.sales().list_recent(10).await.unwrap().is_empty());
    let (sale, _) = db.sales().persist(cash_draft()).await.unwrap();
    assert_eq!(sale.comprobante_number, "NV-000001");
}

#[tokio::test]
async fn checkout_with_bad_terms_persists_no_sale() {
    let db = test_db().await;

    // Down payment exceeds the $100.00 total: the plan is invalid and
    // the whole checkout, sale included, must roll back.
    let terms = CreditTerms {
        term_days: 30,
        down_payment: Money::from_cents(99999),
    };
    let err = finalize_sale(&db, credit_draft(), Some(terms)).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Core(CoreError::InvalidPlan { .. })
    ));

    assert!(db.sales().list_recent(10).await.unwrap().is_empty());
}
