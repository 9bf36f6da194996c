//! # Domain Types
//!
//! Catalog and sale types used throughout Till POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  CATALOG (read-only snapshot)            SALE (written once on commit)  │
//! │                                                                         │
//! │  Product ──┬── ProductVariant (0..n)     Sale                           │
//! │            │     price, stock override     id (rowid), totals,          │
//! │            │                               cashier, idempotency key     │
//! │            ├── ModifierGroup (0..n)           │                         │
//! │            │     single | multiple            └── SaleItem (1..n)       │
//! │            │     required                          name/price snapshot  │
//! │            │     └── ModifierOption (+price)                            │
//! │            │                                                            │
//! │            └── ProductBundle (0..n)                                     │
//! │                  companion item, display only                          │
//! │                                                                         │
//! │  ProductListing = one product + everything hanging off it              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Sale items copy product name and prices at commit time, so later catalog
//! edits never alter historical sales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

pub type ProductId = i64;
pub type VariantId = i64;
pub type ModifierGroupId = i64;
pub type ModifierOptionId = i64;
pub type BundleId = i64;
pub type SaleId = i64;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: ProductId,

    /// Display name shown to the cashier and snapshotted into sale items.
    pub name: String,

    /// Base price in cents, used when no variant is selected.
    pub price_cents: i64,

    /// Stock level for sales without a variant.
    pub current_stock: i64,

    /// Inactive products stay in history but cannot be sold.
    pub is_active: bool,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Variant
// =============================================================================

/// A sellable variation of a product (e.g. "Large") with its own price and
/// its own stock column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    pub is_active: bool,
}

impl ProductVariant {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Modifiers
// =============================================================================

/// How many options of a modifier group may be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ModifierMode {
    /// At most one option (radio buttons).
    Single,
    /// Any number of options, including none (checkboxes).
    Multiple,
}

/// A named choice attached to a product, e.g. "Size" or "Extras".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ModifierGroup {
    pub id: ModifierGroupId,
    pub product_id: ProductId,
    pub name: String,
    pub mode: ModifierMode,
    /// When set, at least one option must be selected.
    pub required: bool,
    /// Loaded separately from the group row.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub options: Vec<ModifierOption>,
}

/// A selectable value of a modifier group with an additive price delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ModifierOption {
    pub id: ModifierOptionId,
    pub group_id: ModifierGroupId,
    pub name: String,
    pub price_cents: i64,
}

impl ModifierOption {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Bundle
// =============================================================================

/// Records that selling `bundle_product_id` entails a companion item.
///
/// Informational only: completing a sale does not decrement the companion's
/// stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductBundle {
    pub id: BundleId,
    pub bundle_product_id: ProductId,
    pub item_product_id: ProductId,
    pub quantity: i64,
    /// Companion product name, for display.
    pub item_name: Option<String>,
}

// =============================================================================
// Listing
// =============================================================================

/// Read-only catalog snapshot for one product: the product itself and its
/// active variants, modifier groups (with options), and bundles.
///
/// This is what the selection validator checks a configuration against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductListing {
    pub product: Product,
    pub variants: Vec<ProductVariant>,
    pub modifier_groups: Vec<ModifierGroup>,
    pub bundles: Vec<ProductBundle>,
}

impl ProductListing {
    /// A listing with no variants, modifiers, or bundles.
    pub fn simple(product: Product) -> Self {
        ProductListing {
            product,
            variants: Vec::new(),
            modifier_groups: Vec::new(),
            bundles: Vec::new(),
        }
    }

    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    pub fn variant(&self, id: VariantId) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.id == id)
    }

    pub fn bundle(&self, id: BundleId) -> Option<&ProductBundle> {
        self.bundles.iter().find(|b| b.id == id)
    }

    /// Finds an option by id together with the group it belongs to.
    pub fn option(&self, id: ModifierOptionId) -> Option<(&ModifierGroup, &ModifierOption)> {
        self.modifier_groups
            .iter()
            .find_map(|g| g.options.iter().find(|o| o.id == id).map(|o| (g, o)))
    }
}

// =============================================================================
// Stock Target
// =============================================================================

/// The stock column a cart line draws from: the variant's stock when a
/// variant is selected, otherwise the product's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StockTarget {
    Product(ProductId),
    Variant(VariantId),
}

impl StockTarget {
    pub fn for_selection(product_id: ProductId, variant_id: Option<VariantId>) -> Self {
        match variant_id {
            Some(id) => StockTarget::Variant(id),
            None => StockTarget::Product(product_id),
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// An explicit cashier session.
///
/// Passed into the sale commit instead of reading a process-wide "current
/// user"; its lifetime is one login, not the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashierSession {
    /// Cashier identity recorded on every sale (an email in practice).
    pub cashier: String,
    pub opened_at: DateTime<Utc>,
}

impl CashierSession {
    /// Opens a session after validating the cashier identity.
    pub fn open(cashier: &str) -> crate::validation::ValidationResult<Self> {
        let cashier = crate::validation::validate_cashier(cashier)?;
        Ok(CashierSession {
            cashier,
            opened_at: Utc::now(),
        })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale. Created exactly once per successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: SaleId,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    /// Sum of line subtotals before the cart discount.
    pub gross_cents: i64,
    /// Cart discount in basis points (1000 = 10%).
    pub discount_bps: u32,
    pub discount_cents: i64,
    /// Net total actually charged.
    pub total_cents: i64,
    pub tendered_cents: i64,
    pub change_cents: i64,
    /// Sum of line quantities.
    pub total_items: i64,
    pub cashier_email: String,
    pub idempotency_key: Option<String>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of a completed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: SaleId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen), modifiers included.
    pub price_cents: i64,
    /// `price_cents × quantity` (frozen).
    pub subtotal_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> ProductListing {
        ProductListing {
            product: Product {
                id: 1,
                name: "Latte".to_string(),
                price_cents: 10000,
                current_stock: 10,
                is_active: true,
            },
            variants: vec![ProductVariant {
                id: 7,
                product_id: 1,
                name: "Large".to_string(),
                price_cents: 12000,
                stock: 4,
                is_active: true,
            }],
            modifier_groups: vec![ModifierGroup {
                id: 3,
                product_id: 1,
                name: "Milk".to_string(),
                mode: ModifierMode::Single,
                required: false,
                options: vec![ModifierOption {
                    id: 30,
                    group_id: 3,
                    name: "Oat".to_string(),
                    price_cents: 1500,
                }],
            }],
            bundles: Vec::new(),
        }
    }

    #[test]
    fn test_listing_lookups() {
        let listing = listing();
        assert!(listing.has_variants());
        assert_eq!(listing.variant(7).map(|v| v.stock), Some(4));
        assert!(listing.variant(8).is_none());

        let (group, option) = listing.option(30).unwrap();
        assert_eq!(group.name, "Milk");
        assert_eq!(option.price(), Money::from_cents(1500));
        assert!(listing.option(31).is_none());
    }

    #[test]
    fn test_stock_target_follows_variant() {
        assert_eq!(StockTarget::for_selection(1, None), StockTarget::Product(1));
        assert_eq!(StockTarget::for_selection(1, Some(7)), StockTarget::Variant(7));
    }

    #[test]
    fn test_modifier_mode_serde() {
        let json = serde_json::to_string(&ModifierMode::Multiple).unwrap();
        assert_eq!(json, "\"multiple\"");
    }

    #[test]
    fn test_session_requires_cashier() {
        assert!(CashierSession::open("  ").is_err());
        let session = CashierSession::open("ana@store.test").unwrap();
        assert_eq!(session.cashier, "ana@store.test");
    }
}
