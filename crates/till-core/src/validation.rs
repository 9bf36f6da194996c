//! # Validation Module
//!
//! Selection validation (is this product configuration sellable?) and
//! field validators for cashier-supplied input.
//!
//! ## Selection Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve_selection(listing, request)                                    │
//! │       │                                                                 │
//! │       ├── product inactive?              → ProductInactive              │
//! │       ├── variant id not on product?     → UnknownVariant               │
//! │       ├── has variants but none chosen?  → VariantRequired              │
//! │       ├── bundle id not on product?      → UnknownBundle                │
//! │       ├── option id not on product?      → UnknownOption                │
//! │       ├── single group, 2+ options?      → TooManyOptions               │
//! │       ├── required group, no option?     → RequiredModifierUnsatisfied  │
//! │       ├── quantity <= 0?                 → QuantityNonPositive          │
//! │       ├── quantity > stock?              → InsufficientStock            │
//! │       │                                                                 │
//! │       └── OK → ConfiguredItem (options grouped, price resolvable)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock checked here is the raw stock of the target. The cart then
//! subtracts what its other lines already hold on the same target.
//!
//! ## Usage
//! ```rust
//! use till_core::validation::{validate_cashier, validate_idempotency_key};
//!
//! assert_eq!(validate_cashier("  ana@store.test ").unwrap(), "ana@store.test");
//! assert!(validate_idempotency_key("till-1-0042").is_ok());
//! assert!(validate_idempotency_key("no spaces").is_err());
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing;
use crate::types::{
    BundleId, ModifierGroup, ModifierGroupId, ModifierMode, ModifierOption, ModifierOptionId,
    Product, ProductBundle, ProductId, ProductListing, ProductVariant, StockTarget, VariantId,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum cashier identity length.
pub const MAX_CASHIER_LEN: usize = 255;

/// Maximum idempotency key length.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 64;

// =============================================================================
// Selection Types
// =============================================================================

/// What the cashier picked in the product dialog, by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SelectionRequest {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub option_ids: Vec<ModifierOptionId>,
    pub bundle_id: Option<BundleId>,
    pub quantity: i64,
}

/// The options chosen within one modifier group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SelectedModifier {
    pub group_id: ModifierGroupId,
    pub group_name: String,
    /// Sorted by option id.
    pub options: Vec<ModifierOption>,
}

/// A validated configuration, ready to become a cart line.
///
/// Selected options are grouped by modifier group, groups sorted by id, so
/// two identical configurations always compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredItem {
    pub product: Product,
    pub variant: Option<ProductVariant>,
    pub modifiers: Vec<SelectedModifier>,
    pub bundle: Option<ProductBundle>,
    pub quantity: i64,
    /// Stock of the target at the time the listing was read.
    pub stock: i64,
}

impl ConfiguredItem {
    pub fn stock_target(&self) -> StockTarget {
        StockTarget::for_selection(self.product.id, self.variant.as_ref().map(|v| v.id))
    }

    pub fn options(&self) -> impl Iterator<Item = &ModifierOption> {
        self.modifiers.iter().flat_map(|m| m.options.iter())
    }

    /// Sorted ids of every selected option.
    pub fn option_ids(&self) -> Vec<ModifierOptionId> {
        let mut ids: Vec<_> = self.options().map(|o| o.id).collect();
        ids.sort_unstable();
        ids
    }

    pub fn unit_price(&self) -> Money {
        pricing::unit_price(&self.product, self.variant.as_ref(), self.options())
    }
}

// =============================================================================
// Selection Validators
// =============================================================================

/// Checks a requested quantity against the stock available to it.
///
/// ```rust
/// use till_core::error::CoreError;
/// use till_core::validation::validate_quantity;
///
/// assert!(validate_quantity(3, 3).is_ok());
/// assert_eq!(validate_quantity(0, 3), Err(CoreError::QuantityNonPositive));
/// assert_eq!(
///     validate_quantity(4, 3),
///     Err(CoreError::InsufficientStock { available: 3 })
/// );
/// ```
pub fn validate_quantity(quantity: i64, available: i64) -> CoreResult<()> {
    if quantity <= 0 {
        return Err(CoreError::QuantityNonPositive);
    }
    if quantity > available {
        return Err(CoreError::InsufficientStock {
            available: available.max(0),
        });
    }
    Ok(())
}

/// Resolves the chosen variant against the listing.
///
/// A product with at least one active variant cannot be sold without one.
/// Passing a variant id for a product without variants is `UnknownVariant`.
pub fn validate_variant(
    listing: &ProductListing,
    chosen: Option<VariantId>,
) -> CoreResult<Option<&ProductVariant>> {
    let product_id = listing.product.id;
    match chosen {
        Some(variant_id) => listing
            .variant(variant_id)
            .filter(|v| v.is_active && v.product_id == product_id)
            .map(Some)
            .ok_or(CoreError::UnknownVariant {
                product_id,
                variant_id,
            }),
        None if listing.variants.iter().any(|v| v.is_active) => Err(CoreError::VariantRequired),
        None => Ok(None),
    }
}

/// Groups the chosen options by modifier group and enforces group rules.
///
/// Duplicate option ids count once. Returned groups are sorted by group id,
/// options within a group by option id; groups with nothing selected are
/// omitted.
pub fn validate_modifiers(
    product_id: ProductId,
    groups: &[ModifierGroup],
    option_ids: &[ModifierOptionId],
) -> CoreResult<Vec<SelectedModifier>> {
    let mut ids = option_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    // Every id must belong to one of this product's groups.
    for id in &ids {
        let known = groups
            .iter()
            .any(|g| g.options.iter().any(|o| o.id == *id));
        if !known {
            return Err(CoreError::UnknownOption {
                product_id,
                option_id: *id,
            });
        }
    }

    let mut sorted_groups: Vec<&ModifierGroup> = groups.iter().collect();
    sorted_groups.sort_by_key(|g| g.id);

    let mut selected = Vec::new();
    for group in sorted_groups {
        let mut options: Vec<ModifierOption> = group
            .options
            .iter()
            .filter(|o| ids.binary_search(&o.id).is_ok())
            .cloned()
            .collect();
        options.sort_by_key(|o| o.id);

        if group.mode == ModifierMode::Single && options.len() > 1 {
            return Err(CoreError::TooManyOptions {
                group: group.name.clone(),
            });
        }
        if group.required && options.is_empty() {
            return Err(CoreError::RequiredModifierUnsatisfied {
                group: group.name.clone(),
            });
        }
        if !options.is_empty() {
            selected.push(SelectedModifier {
                group_id: group.id,
                group_name: group.name.clone(),
                options,
            });
        }
    }

    Ok(selected)
}

/// Runs every selection check and builds the configured item.
///
/// ## Example
/// ```rust
/// use till_core::types::{Product, ProductListing};
/// use till_core::validation::{resolve_selection, SelectionRequest};
///
/// let listing = ProductListing::simple(Product {
///     id: 1,
///     name: "Notebook".to_string(),
///     price_cents: 350,
///     current_stock: 10,
///     is_active: true,
/// });
/// let item = resolve_selection(&listing, &SelectionRequest {
///     product_id: 1,
///     variant_id: None,
///     option_ids: vec![],
///     bundle_id: None,
///     quantity: 2,
/// })
/// .unwrap();
/// assert_eq!(item.unit_price().cents(), 350);
/// ```
pub fn resolve_selection(
    listing: &ProductListing,
    request: &SelectionRequest,
) -> CoreResult<ConfiguredItem> {
    let product = &listing.product;
    if !product.is_active || request.product_id != product.id {
        return Err(CoreError::ProductInactive(request.product_id));
    }

    let variant = validate_variant(listing, request.variant_id)?.cloned();

    let bundle = match request.bundle_id {
        Some(bundle_id) => Some(
            listing
                .bundle(bundle_id)
                .filter(|b| b.bundle_product_id == product.id)
                .cloned()
                .ok_or(CoreError::UnknownBundle {
                    product_id: product.id,
                    bundle_id,
                })?,
        ),
        None => None,
    };

    let modifiers = validate_modifiers(product.id, &listing.modifier_groups, &request.option_ids)?;

    let stock = variant
        .as_ref()
        .map_or(product.current_stock, |v| v.stock);
    validate_quantity(request.quantity, stock)?;

    Ok(ConfiguredItem {
        product: product.clone(),
        variant,
        modifiers,
        bundle,
        quantity: request.quantity,
        stock,
    })
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates the cashier identity recorded on sales.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 255 characters
///
/// ## Returns
/// The trimmed identity.
pub fn validate_cashier(cashier: &str) -> ValidationResult<String> {
    let cashier = cashier.trim();

    if cashier.is_empty() {
        return Err(ValidationError::Required {
            field: "cashier".to_string(),
        });
    }

    if cashier.chars().count() > MAX_CASHIER_LEN {
        return Err(ValidationError::TooLong {
            field: "cashier".to_string(),
            max: MAX_CASHIER_LEN,
        });
    }

    Ok(cashier.to_string())
}

/// Validates a client-supplied idempotency key.
///
/// ## Rules
/// - 1 to 64 characters
/// - Only ASCII letters, digits, hyphens, and underscores
pub fn validate_idempotency_key(key: &str) -> ValidationResult<String> {
    let key = key.trim();

    if key.is_empty() {
        return Err(ValidationError::Required {
            field: "idempotency_key".to_string(),
        });
    }

    if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(ValidationError::TooLong {
            field: "idempotency_key".to_string(),
            max: MAX_IDEMPOTENCY_KEY_LEN,
        });
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "idempotency_key".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(key.to_string())
}

/// Validates cash tendered. Zero is allowed (a fully discounted sale).
pub fn validate_tendered(tendered: Money) -> ValidationResult<Money> {
    if tendered.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "cash_tendered".to_string(),
        });
    }
    Ok(tendered)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn group(
        id: i64,
        name: &str,
        mode: ModifierMode,
        required: bool,
        opts: &[(i64, i64)],
    ) -> ModifierGroup {
        ModifierGroup {
            id,
            product_id: 1,
            name: name.to_string(),
            mode,
            required,
            options: opts
                .iter()
                .map(|(oid, price)| ModifierOption {
                    id: *oid,
                    group_id: id,
                    name: format!("opt-{}", oid),
                    price_cents: *price,
                })
                .collect(),
        }
    }

    fn listing() -> ProductListing {
        ProductListing {
            product: Product {
                id: 1,
                name: "Burger".to_string(),
                price_cents: 10000,
                current_stock: 5,
                is_active: true,
            },
            variants: Vec::new(),
            modifier_groups: vec![
                group(20, "Extras", ModifierMode::Multiple, false, &[(201, 200), (202, 300)]),
                group(10, "Size", ModifierMode::Single, true, &[(101, 0), (102, 1500)]),
            ],
            bundles: vec![ProductBundle {
                id: 9,
                bundle_product_id: 1,
                item_product_id: 2,
                quantity: 1,
                item_name: Some("Fries".to_string()),
            }],
        }
    }

    fn request(option_ids: Vec<i64>, quantity: i64) -> SelectionRequest {
        SelectionRequest {
            product_id: 1,
            variant_id: None,
            option_ids,
            bundle_id: None,
            quantity,
        }
    }

    #[test]
    fn test_resolve_groups_options_sorted() {
        let item = resolve_selection(&listing(), &request(vec![202, 102, 201], 2)).unwrap();

        let group_ids: Vec<_> = item.modifiers.iter().map(|m| m.group_id).collect();
        assert_eq!(group_ids, vec![10, 20]);
        assert_eq!(item.option_ids(), vec![102, 201, 202]);
        assert_eq!(item.unit_price(), Money::from_cents(10000 + 1500 + 200 + 300));
        assert_eq!(item.stock_target(), StockTarget::Product(1));
    }

    #[test]
    fn test_required_modifier() {
        let err = resolve_selection(&listing(), &request(vec![201], 1)).unwrap_err();
        assert_eq!(
            err,
            CoreError::RequiredModifierUnsatisfied {
                group: "Size".to_string()
            }
        );
    }

    #[test]
    fn test_single_mode_rejects_two_options() {
        let err = resolve_selection(&listing(), &request(vec![101, 102], 1)).unwrap_err();
        assert_eq!(
            err,
            CoreError::TooManyOptions {
                group: "Size".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_option_counts_once() {
        let item = resolve_selection(&listing(), &request(vec![101, 101], 1)).unwrap();
        assert_eq!(item.option_ids(), vec![101]);
    }

    #[test]
    fn test_unknown_option() {
        let err = resolve_selection(&listing(), &request(vec![101, 999], 1)).unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownOption {
                product_id: 1,
                option_id: 999
            }
        );
    }

    #[test]
    fn test_variant_required_and_unknown() {
        let mut listing = listing();
        listing.variants.push(ProductVariant {
            id: 5,
            product_id: 1,
            name: "Double".to_string(),
            price_cents: 14000,
            stock: 2,
            is_active: true,
        });

        let err = resolve_selection(&listing, &request(vec![101], 1)).unwrap_err();
        assert_eq!(err, CoreError::VariantRequired);

        let mut req = request(vec![101], 1);
        req.variant_id = Some(6);
        assert_eq!(
            resolve_selection(&listing, &req).unwrap_err(),
            CoreError::UnknownVariant {
                product_id: 1,
                variant_id: 6
            }
        );

        // Variant stock, not product stock, bounds the quantity.
        req.variant_id = Some(5);
        req.quantity = 3;
        assert_eq!(
            resolve_selection(&listing, &req).unwrap_err(),
            CoreError::InsufficientStock { available: 2 }
        );

        req.quantity = 2;
        let item = resolve_selection(&listing, &req).unwrap();
        assert_eq!(item.stock_target(), StockTarget::Variant(5));
        assert_eq!(item.unit_price(), Money::from_cents(14000));
    }

    #[test]
    fn test_bundle_must_belong_to_product() {
        let mut req = request(vec![101], 1);
        req.bundle_id = Some(9);
        let item = resolve_selection(&listing(), &req).unwrap();
        assert_eq!(item.bundle.map(|b| b.item_product_id), Some(2));

        req.bundle_id = Some(10);
        assert_eq!(
            resolve_selection(&listing(), &req).unwrap_err(),
            CoreError::UnknownBundle {
                product_id: 1,
                bundle_id: 10
            }
        );
    }

    #[test]
    fn test_quantity_checks() {
        assert_eq!(
            resolve_selection(&listing(), &request(vec![101], 0)).unwrap_err(),
            CoreError::QuantityNonPositive
        );
        assert_eq!(
            resolve_selection(&listing(), &request(vec![101], 6)).unwrap_err(),
            CoreError::InsufficientStock { available: 5 }
        );
    }

    #[test]
    fn test_inactive_product() {
        let mut listing = listing();
        listing.product.is_active = false;
        assert_eq!(
            resolve_selection(&listing, &request(vec![101], 1)).unwrap_err(),
            CoreError::ProductInactive(1)
        );
    }

    #[test]
    fn test_validate_cashier() {
        assert!(validate_cashier("").is_err());
        assert!(validate_cashier(&"a".repeat(256)).is_err());
        assert_eq!(validate_cashier(&"a".repeat(255)).unwrap().len(), 255);
    }

    #[test]
    fn test_validate_idempotency_key() {
        assert!(validate_idempotency_key("").is_err());
        assert!(validate_idempotency_key(&"k".repeat(65)).is_err());
        assert!(validate_idempotency_key("drawer#1").is_err());
        assert_eq!(validate_idempotency_key(" abc_DEF-9 ").unwrap(), "abc_DEF-9");
    }

    #[test]
    fn test_validate_tendered() {
        assert!(validate_tendered(Money::from_cents(-1)).is_err());
        assert!(validate_tendered(Money::zero()).is_ok());
    }
}
