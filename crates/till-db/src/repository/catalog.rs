//! # Catalog Repository
//!
//! Read-only catalog lookups for the register, plus the stock helpers the
//! sale commit runs inside its transaction.
//!
//! ## Listing Assembly
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  load_listing(product_id)                                               │
//! │       │                                                                 │
//! │       ├── products           WHERE id = ?            (NotFound if none) │
//! │       ├── product_variants   WHERE product_id = ? AND is_active = 1     │
//! │       ├── modifier_groups    WHERE product_id = ?                       │
//! │       │     └── modifier_options JOIN groups, attached by group_id      │
//! │       └── product_bundles    LEFT JOIN products for the item name       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductListing → resolve_selection() in till-core                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every lookup is keyed by identifier and bound as a parameter.
//!
//! The `insert_*` functions exist for the seed binary and tests; catalog
//! maintenance is not part of the register.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use till_core::{
    Money, ModifierGroup, ModifierGroupId, ModifierMode, ModifierOption, ModifierOptionId,
    Product, ProductBundle, ProductId, ProductListing, ProductVariant, StockTarget, VariantId,
};

const PRODUCT_COLUMNS: &str = "id, name, price_cents, current_stock, is_active";
const VARIANT_COLUMNS: &str = "id, product_id, name, price_cents, stock, is_active";

/// Repository for catalog reads.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Gets a product by id, active or not.
    pub async fn get_product(&self, id: ProductId) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products by name.
    pub async fn list_active_products(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name, id LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    // =========================================================================
    // Variants
    // =========================================================================

    pub async fn get_variant(&self, id: VariantId) -> DbResult<Option<ProductVariant>> {
        let variant = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(variant)
    }

    /// Active variants of a product.
    pub async fn list_variants(&self, product_id: ProductId) -> DbResult<Vec<ProductVariant>> {
        let variants = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants
             WHERE product_id = ?1 AND is_active = 1
             ORDER BY id"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(variants)
    }

    // =========================================================================
    // Modifiers & Bundles
    // =========================================================================

    /// Modifier groups of a product with their options attached, both
    /// ordered by id.
    pub async fn list_modifier_groups(&self, product_id: ProductId) -> DbResult<Vec<ModifierGroup>> {
        let mut groups = sqlx::query_as::<_, ModifierGroup>(
            r#"
            SELECT id, product_id, name, mode, required
            FROM modifier_groups
            WHERE product_id = ?1
            ORDER BY id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        let options = sqlx::query_as::<_, ModifierOption>(
            r#"
            SELECT o.id, o.group_id, o.name, o.price_cents
            FROM modifier_options o
            JOIN modifier_groups g ON g.id = o.group_id
            WHERE g.product_id = ?1
            ORDER BY o.group_id, o.id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        for option in options {
            if let Some(group) = groups.iter_mut().find(|g| g.id == option.group_id) {
                group.options.push(option);
            }
        }

        Ok(groups)
    }

    /// Bundles whose parent is `bundle_product_id`, with the companion's
    /// name.
    pub async fn list_bundles(&self, bundle_product_id: ProductId) -> DbResult<Vec<ProductBundle>> {
        let bundles = sqlx::query_as::<_, ProductBundle>(
            r#"
            SELECT b.id, b.bundle_product_id, b.item_product_id, b.quantity,
                   p.name AS item_name
            FROM product_bundles b
            LEFT JOIN products p ON p.id = b.item_product_id
            WHERE b.bundle_product_id = ?1
            ORDER BY b.id
            "#,
        )
        .bind(bundle_product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bundles)
    }

    /// Everything the selection validator needs for one product.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no product with this id
    pub async fn load_listing(&self, product_id: ProductId) -> DbResult<ProductListing> {
        let product = self
            .get_product(product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

        let listing = ProductListing {
            product,
            variants: self.list_variants(product_id).await?,
            modifier_groups: self.list_modifier_groups(product_id).await?,
            bundles: self.list_bundles(product_id).await?,
        };

        debug!(
            product_id,
            variants = listing.variants.len(),
            groups = listing.modifier_groups.len(),
            bundles = listing.bundles.len(),
            "Loaded listing"
        );

        Ok(listing)
    }

    /// Current stock of a product or variant.
    pub async fn stock_level(&self, target: StockTarget) -> DbResult<i64> {
        read_stock(&self.pool, target)
            .await?
            .ok_or_else(|| not_found(target))
    }

    // =========================================================================
    // Fixtures (seed binary and tests)
    // =========================================================================

    pub async fn insert_product(&self, name: &str, price: Money, stock: i64) -> DbResult<ProductId> {
        let result = sqlx::query(
            "INSERT INTO products (name, price_cents, current_stock) VALUES (?1, ?2, ?3)",
        )
        .bind(name)
        .bind(price.cents())
        .bind(stock)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_variant(
        &self,
        product_id: ProductId,
        name: &str,
        price: Money,
        stock: i64,
    ) -> DbResult<VariantId> {
        let result = sqlx::query(
            "INSERT INTO product_variants (product_id, name, price_cents, stock)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(product_id)
        .bind(name)
        .bind(price.cents())
        .bind(stock)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_modifier_group(
        &self,
        product_id: ProductId,
        name: &str,
        mode: ModifierMode,
        required: bool,
    ) -> DbResult<ModifierGroupId> {
        let result = sqlx::query(
            "INSERT INTO modifier_groups (product_id, name, mode, required) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(product_id)
        .bind(name)
        .bind(mode)
        .bind(required)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_modifier_option(
        &self,
        group_id: ModifierGroupId,
        name: &str,
        price: Money,
    ) -> DbResult<ModifierOptionId> {
        let result = sqlx::query(
            "INSERT INTO modifier_options (group_id, name, price_cents) VALUES (?1, ?2, ?3)",
        )
        .bind(group_id)
        .bind(name)
        .bind(price.cents())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_bundle(
        &self,
        bundle_product_id: ProductId,
        item_product_id: ProductId,
        quantity: i64,
    ) -> DbResult<i64> {
        let result = sqlx::query(
            "INSERT INTO product_bundles (bundle_product_id, item_product_id, quantity)
             VALUES (?1, ?2, ?3)",
        )
        .bind(bundle_product_id)
        .bind(item_product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Counts active products (for diagnostics).
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Stock Helpers
// =============================================================================

fn not_found(target: StockTarget) -> DbError {
    match target {
        StockTarget::Product(id) => DbError::not_found("Product", id),
        StockTarget::Variant(id) => DbError::not_found("Variant", id),
    }
}

/// Reads the stock column of `target`. `None` if the row does not exist.
///
/// Generic over the executor so the sale commit can read through its
/// transaction.
pub(crate) async fn read_stock<'e, E>(executor: E, target: StockTarget) -> DbResult<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let stock = match target {
        StockTarget::Product(id) => {
            sqlx::query_scalar::<_, i64>("SELECT current_stock FROM products WHERE id = ?1")
                .bind(id)
                .fetch_optional(executor)
                .await?
        }
        StockTarget::Variant(id) => {
            sqlx::query_scalar::<_, i64>("SELECT stock FROM product_variants WHERE id = ?1")
                .bind(id)
                .fetch_optional(executor)
                .await?
        }
    };

    Ok(stock)
}

/// Decrements stock only if enough remains (compare-and-swap).
///
/// ## Returns
/// * `Ok(true)` - stock was decremented by `quantity`
/// * `Ok(false)` - fewer than `quantity` left (or no such row); nothing changed
pub(crate) async fn decrement_stock<'e, E>(
    executor: E,
    target: StockTarget,
    quantity: i64,
) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(?target, quantity, "Decrementing stock");

    let result = match target {
        StockTarget::Product(id) => {
            sqlx::query(
                r#"
                UPDATE products
                SET current_stock = current_stock - ?2
                WHERE id = ?1 AND current_stock >= ?2
                "#,
            )
            .bind(id)
            .bind(quantity)
            .execute(executor)
            .await?
        }
        StockTarget::Variant(id) => {
            sqlx::query(
                r#"
                UPDATE product_variants
                SET stock = stock - ?2
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(id)
            .bind(quantity)
            .execute(executor)
            .await?
        }
    };

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> CatalogRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog()
    }

    #[tokio::test]
    async fn test_listing_assembly() {
        let repo = setup().await;
        let burger = repo
            .insert_product("Burger", Money::from_cents(10000), 8)
            .await
            .unwrap();
        let fries = repo
            .insert_product("Fries", Money::from_cents(300), 20)
            .await
            .unwrap();
        repo.insert_variant(burger, "Double", Money::from_cents(14000), 3)
            .await
            .unwrap();
        let extras = repo
            .insert_modifier_group(burger, "Extras", ModifierMode::Multiple, false)
            .await
            .unwrap();
        let size = repo
            .insert_modifier_group(burger, "Size", ModifierMode::Single, true)
            .await
            .unwrap();
        repo.insert_modifier_option(extras, "Cheese", Money::from_cents(1500))
            .await
            .unwrap();
        repo.insert_modifier_option(size, "Regular", Money::zero())
            .await
            .unwrap();
        repo.insert_bundle(burger, fries, 1).await.unwrap();

        let listing = repo.load_listing(burger).await.unwrap();
        assert_eq!(listing.product.name, "Burger");
        assert_eq!(listing.variants.len(), 1);
        assert_eq!(listing.modifier_groups.len(), 2);
        assert_eq!(listing.modifier_groups[0].mode, ModifierMode::Multiple);
        assert_eq!(listing.modifier_groups[0].options[0].name, "Cheese");
        assert!(listing.modifier_groups[1].required);
        assert_eq!(listing.bundles[0].item_name.as_deref(), Some("Fries"));
    }

    #[tokio::test]
    async fn test_inactive_variants_hidden() {
        let repo = setup().await;
        let shirt = repo
            .insert_product("Shirt", Money::from_cents(2000), 0)
            .await
            .unwrap();
        let small = repo
            .insert_variant(shirt, "S", Money::from_cents(2000), 5)
            .await
            .unwrap();
        repo.insert_variant(shirt, "M", Money::from_cents(2000), 5)
            .await
            .unwrap();

        sqlx::query("UPDATE product_variants SET is_active = 0 WHERE id = ?1")
            .bind(small)
            .execute(&repo.pool)
            .await
            .unwrap();

        let variants = repo.list_variants(shirt).await.unwrap();
        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].name, "M");
        assert!(repo.get_variant(small).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_product() {
        let repo = setup().await;
        assert!(repo.get_product(42).await.unwrap().is_none());
        assert!(matches!(
            repo.load_listing(42).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.stock_level(StockTarget::Variant(42)).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_decrement_is_conditional() {
        let repo = setup().await;
        let id = repo
            .insert_product("Pen", Money::from_cents(150), 3)
            .await
            .unwrap();
        let target = StockTarget::Product(id);

        assert!(decrement_stock(&repo.pool, target, 2).await.unwrap());
        assert!(!decrement_stock(&repo.pool, target, 2).await.unwrap());
        assert_eq!(repo.stock_level(target).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_active_products() {
        let repo = setup().await;
        repo.insert_product("Zebra Mug", Money::from_cents(900), 1)
            .await
            .unwrap();
        repo.insert_product("Apple Mug", Money::from_cents(900), 1)
            .await
            .unwrap();

        let names: Vec<_> = repo
            .list_active_products(10)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Apple Mug", "Zebra Mug"]);
        assert_eq!(repo.count_active().await.unwrap(), 2);
    }
}
