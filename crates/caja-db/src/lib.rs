//! # caja-db: Database Layer for the Caja Credit Sale Ledger
//!
//! This crate provides database access for Caja. It uses SQLite for
//! local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Caja Data Flow                                 │
//! │                                                                         │
//! │  Checkout / payment capture (caller)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      caja-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (sale.rs)    │    │  (embedded)  │  │   │
//! │  │   │               │    │  (credit.rs)  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  (legacy.rs)  │    │ 001_init.sql │  │   │
//! │  │   │ Management    │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (plus, in old deployments, the legacy            │
//! │  `creditos` table this crate detects at runtime)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (sale, credit, legacy)
//! - [`checkout`] - The finalize-sale orchestration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use caja_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/caja.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let plan = db.credit().get_plan_by_sale(&sale_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, LedgerError};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::credit::CreditLedgerRepository;
pub use repository::legacy::{LegacyCreditAdapter, MirrorOutcome, SchemaPresence};
pub use repository::sale::SaleRepository;
