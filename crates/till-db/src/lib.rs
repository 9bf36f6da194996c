//! # till-db: Database Layer for Till POS
//!
//! SQLite persistence for the register: catalog reads, the atomic sale
//! commit, and sale history.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Data Flow                               │
//! │                                                                         │
//! │  Register command (add_to_cart, complete_sale)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     till-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo    │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo       │   │ 001_init.sql │  │   │
//! │  │   │ commit gate   │    │                │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, configuration, commit gate
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - `DbError` and `CommitError`
//! - [`repository`] - Catalog and sale repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use till_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("till.db")).await?;
//!
//! let listing = db.catalog().load_listing(product_id).await?;
//! let receipt = db.sales().commit(&draft, &session, Some("till1-0042")).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CommitError, CommitResult, DbError, DbResult};
pub use pool::{Database, DbConfig, DEFAULT_COMMIT_TIMEOUT};

pub use repository::catalog::CatalogRepository;
pub use repository::sale::{SaleRepository, SalesSummary};
