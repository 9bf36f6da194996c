//! # Product Commands
//!
//! Catalog reads for the product picker.
//!
//! ## Selection Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list_products ──► pick a product                                       │
//! │                        │                                                │
//! │                        ▼                                                │
//! │  get_listing(id) ──► variants, modifier groups, bundles                 │
//! │                        │                                                │
//! │                        ▼                                                │
//! │  add_to_cart(SelectionRequest) (cart.rs)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::DbState;
use till_core::{Money, Product, ProductId, ProductListing};

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 200;

/// Product row for the picker.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub current_stock: i64,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            id: p.id,
            price: p.price(),
            name: p.name,
            current_stock: p.current_stock,
        }
    }
}

/// Lists active products by name.
///
/// ## Arguments
/// * `limit` - Maximum results to return (default: 50, max: 200)
pub async fn list_products(db: &DbState, limit: Option<u32>) -> Result<Vec<ProductDto>, ApiError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    debug!(limit, "list_products command");

    let products = db.inner().catalog().list_active_products(limit).await?;
    Ok(products.into_iter().map(ProductDto::from).collect())
}

/// Loads everything the selection dialog needs for one product.
pub async fn get_listing(db: &DbState, product_id: ProductId) -> Result<ProductListing, ApiError> {
    debug!(product_id, "get_listing command");

    let listing = db.inner().catalog().load_listing(product_id).await?;
    if !listing.product.is_active {
        return Err(ApiError::not_found("Product", &product_id.to_string()));
    }
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::setup;
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_list_products() {
        let (db, _, fx) = setup().await;

        let products = list_products(&db, None).await.unwrap();
        assert_eq!(products.len(), 2);

        let lamp = products.iter().find(|p| p.id == fx.lamp).unwrap();
        assert_eq!(lamp.name, "Desk Lamp");
        assert_eq!(lamp.price, Money::from_cents(10000));
        assert_eq!(lamp.current_stock, 10);
    }

    #[tokio::test]
    async fn test_get_listing() {
        let (db, _, fx) = setup().await;

        let listing = get_listing(&db, fx.latte).await.unwrap();
        assert_eq!(listing.variants.len(), 2);
        assert!(listing.has_variants());

        let lamp = get_listing(&db, fx.lamp).await.unwrap();
        assert_eq!(lamp.modifier_groups.len(), 1);
        assert_eq!(lamp.modifier_groups[0].options[0].id, fx.warm_bulb);
    }

    #[tokio::test]
    async fn test_get_listing_unknown_product() {
        let (db, _, _) = setup().await;
        let err = get_listing(&db, 999).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
