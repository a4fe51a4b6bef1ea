//! # ferreteria-db: Document Storage for Ferreteria
//!
//! Persists invoices and purchase orders submitted from a
//! [`ferreteria_core::DocumentSession`]. SQLite through sqlx for real use,
//! an in-memory store for tests and demos.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Ferreteria Data Flow                             │
//! │                                                                         │
//! │  Invoice / order form                                                   │
//! │       │  DocumentSession (ferreteria-core)                              │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 ferreteria-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ InvoiceRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo     │    │ 001_docs.sql │  │   │
//! │  │   │               │    │ MemoryRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           ▲                                                     │   │
//! │  │           │ AppConfig (TOML + FERRETERIA_* env)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/ferreteria/ferreteria.db                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Runtime configuration (file, environment, defaults)
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - [`DocumentRepository`] and its two stores
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ferreteria_core::{DocumentKind, DocumentSession};
//! use ferreteria_db::{Database, DbConfig, DocumentRepository};
//!
//! let db = Database::new(DbConfig::new("ferreteria.db")).await?;
//!
//! let mut session = DocumentSession::new(DocumentKind::Invoice);
//! session.add_line(line)?;
//! let saved = db.save(session.submit(form)?).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::AppConfig;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::{DocumentRepository, SavedDocument};

// Repository re-exports for convenience
pub use repository::invoice::InvoiceRepository;
pub use repository::memory::MemoryRepository;
pub use repository::order::OrderRepository;
