//! # Repository Module
//!
//! Database repository implementations for the credit sale ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │                                                                 │
//! │       │  db.credit().record_payment(plan_id, amount, ...)               │
//! │       ▼                                                                 │
//! │  CreditLedgerRepository                                                │
//! │  ├── create_plan(&self, sale_id, term_days, down_payment)              │
//! │  ├── record_payment(&self, plan_id, amount, paid_at, notes)            │
//! │  └── list_payments(&self, plan_id)                                     │
//! │       │                                                                 │
//! │       │  SQL inside a transaction                                       │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Each repository receives the pool at construction; no repository      │
//! │  reaches into ambient global state.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`sale::SaleRepository`] - Sale persistence and comprobante numbering
//! - [`credit::CreditLedgerRepository`] - Credit plans and the payment ledger
//! - [`legacy::LegacyCreditAdapter`] - Best-effort mirror into the old schema

pub mod credit;
pub mod legacy;
pub mod sale;
