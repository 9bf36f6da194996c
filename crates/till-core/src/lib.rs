//! # till-core: Pure Business Logic for Till POS
//!
//! The transaction engine of the register: pricing, selection validation,
//! the cart, and checkout preparation. Everything here is deterministic and
//! free of I/O; persistence lives in `till-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Till POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Register (terminal front end)                   │   │
//! │  │    login ──► add / qty / rm ──► discount ──► pay               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ till-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌──────────┐ ┌────────────┐ ┌──────┐ ┌──────────┐ │   │
//! │  │  │  money  │ │ pricing  │ │ validation │ │ cart │ │ checkout │ │   │
//! │  │  │  Money  │ │ unit     │ │ selection  │ │ Cart │ │ SaleDraft│ │   │
//! │  │  │         │ │ subtotal │ │ fields     │ │ Line │ │ Receipt  │ │   │
//! │  │  └─────────┘ └──────────┘ └────────────┘ └──────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    till-db (Database Layer)                     │   │
//! │  │        catalog reads, atomic sale commit, sale history          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog and sale types (Product, Variant, Modifier, Sale)
//! - [`money`] - Money type with integer arithmetic
//! - [`pricing`] - Unit price, subtotal, cart discount
//! - [`validation`] - Selection validator and field validators
//! - [`cart`] - Cart lines, merge rules, totals
//! - [`checkout`] - Payment check, sale draft, receipt
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::cart::Cart;
//! use till_core::checkout::prepare_sale;
//! use till_core::types::{Product, ProductListing};
//! use till_core::validation::{resolve_selection, SelectionRequest};
//! use till_core::Money;
//!
//! let listing = ProductListing::simple(Product {
//!     id: 1,
//!     name: "Notebook".to_string(),
//!     price_cents: 350,
//!     current_stock: 20,
//!     is_active: true,
//! });
//!
//! let mut cart = Cart::new();
//! let item = resolve_selection(&listing, &SelectionRequest {
//!     product_id: 1,
//!     variant_id: None,
//!     option_ids: vec![],
//!     bundle_id: None,
//!     quantity: 4,
//! })
//! .unwrap();
//! cart.add_line(item).unwrap();
//!
//! let draft = prepare_sale(&cart, Money::from_cents(2000)).unwrap();
//! assert_eq!(draft.net_total.cents(), 1400);
//! assert_eq!(draft.change.cents(), 600);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals, LineId};
pub use checkout::{prepare_sale, Receipt, SaleDraft};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::DiscountRate;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines in a single cart.
///
/// Merged quantities do not count against it; only distinct configurations
/// do.
pub const MAX_CART_LINES: usize = 100;
