//! # Repository Module
//!
//! Database repositories for Till POS.
//!
//! ## Repositories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Register command                                                      │
//! │       │                                                                 │
//! │       ├── db.catalog().load_listing(id)     ← read-only snapshot       │
//! │       │                                                                 │
//! │       └── db.sales().commit(draft, ...)     ← the only writer of       │
//! │                                               sales, items, and stock  │
//! │                                                                         │
//! │  SQL lives here and nowhere else.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - products, variants,
//!   modifiers, bundles, stock levels
//! - [`SaleRepository`](sale::SaleRepository) - atomic commit and sale history

pub mod catalog;
pub mod sale;
