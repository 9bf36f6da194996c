//! # Sale Repository
//!
//! The atomic sale commit and read-only sale history.
//!
//! ## Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit(draft, session, key?)       bounded by commit_timeout          │
//! │       │                                                                 │
//! │       ├── wait for commit gate (one commit per process)                │
//! │       ├── BEGIN IMMEDIATE (write lock across processes)                │
//! │       │                                                                 │
//! │       │   0. key seen before?  same totals → replay receipt, no writes │
//! │       │                        different   → IdempotencyConflict       │
//! │       │   1. demand per target ≤ stock read now?  else StockChanged    │
//! │       │   2. INSERT sales          → rowid                             │
//! │       │   3. INSERT sale_items     (one per draft line)                │
//! │       │   4. UPDATE stock − qty WHERE stock ≥ qty                      │
//! │       │        0 rows → StockChanged                                   │
//! │       │                                                                 │
//! │       └── COMMIT                   outside the timeout                  │
//! │                                                                         │
//! │  Any error or the timeout drops the transaction: sqlx rolls it back,   │
//! │  so a failed commit leaves no sale, no items, and untouched stock.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::{CommitError, CommitResult, DbError, DbResult};
use crate::repository::catalog::{decrement_stock, read_stock};
use till_core::checkout::SaleDraft;
use till_core::validation::validate_idempotency_key;
use till_core::{CashierSession, CoreError, Money, Receipt, Sale, SaleId, SaleItem, StockTarget};

const SALE_COLUMNS: &str = "id, sale_date, gross_cents, discount_bps, discount_cents, \
     total_cents, tendered_cents, change_cents, total_items, cashier_email, idempotency_key";

/// Aggregate figures for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub sale_count: i64,
    pub net_total: Money,
    pub item_count: i64,
}

/// Outcome of the bounded part of a commit.
enum Staged<'a> {
    /// The idempotency key matched an earlier sale; nothing was written.
    Replayed(Receipt),
    Pending(PendingSale<'a>),
}

/// A fully written sale whose transaction has not been committed yet.
struct PendingSale<'a> {
    _gate: MutexGuard<'a, ()>,
    tx: Transaction<'static, Sqlite>,
    sale_id: SaleId,
    sale_date: DateTime<Utc>,
}

impl PendingSale<'_> {
    /// Commits the transaction, then releases the gate.
    async fn finish(self, draft: &SaleDraft, session: &CashierSession) -> CommitResult<Receipt> {
        let PendingSale {
            _gate,
            tx,
            sale_id,
            sale_date,
        } = self;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id,
            total = %draft.net_total,
            items = draft.item_count,
            cashier = %session.cashier,
            "Sale committed"
        );

        Ok(Receipt {
            sale_id,
            sale_date,
            gross_total: draft.gross_total,
            discount: draft.discount,
            discount_amount: draft.discount_amount,
            net_total: draft.net_total,
            cash_tendered: draft.cash_tendered,
            change: draft.change,
            item_count: draft.item_count,
            replayed: false,
        })
    }
}

/// Repository for sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    commit_gate: Arc<Mutex<()>>,
    commit_timeout: Duration,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool, commit_gate: Arc<Mutex<()>>, commit_timeout: Duration) -> Self {
        SaleRepository {
            pool,
            commit_gate,
            commit_timeout,
        }
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Persists a prepared sale and decrements stock, all or nothing.
    ///
    /// ## Arguments
    /// * `draft` - frozen cart from `till_core::checkout::prepare_sale`
    /// * `session` - the cashier recorded on the sale
    /// * `idempotency_key` - optional client key; a retry with the same key
    ///   returns the original receipt instead of selling twice
    ///
    /// ## Errors
    /// * `Rejected(StockChanged)` - stock moved since the cart was built
    /// * `Rejected(InsufficientCash | EmptyCart | Validation)` - bad draft
    /// * `IdempotencyConflict` - key already used for a different sale
    /// * `TimedOut` - gate wait plus staging exceeded `commit_timeout`;
    ///   nothing was written
    /// * `Persistence` - database failure, rolled back
    ///
    /// The bound covers everything before COMMIT. COMMIT itself is not
    /// cancelled, so a `TimedOut` sale never becomes durable later.
    pub async fn commit(
        &self,
        draft: &SaleDraft,
        session: &CashierSession,
        idempotency_key: Option<&str>,
    ) -> CommitResult<Receipt> {
        let key = idempotency_key
            .map(validate_idempotency_key)
            .transpose()
            .map_err(CoreError::from)?;

        let timeout = self.commit_timeout;
        let staged =
            match tokio::time::timeout(timeout, self.stage(draft, session, key.as_deref())).await {
                Ok(staged) => staged,
                Err(_) => {
                    warn!(timeout_ms = timeout.as_millis() as u64, "Sale commit timed out");
                    return Err(CommitError::TimedOut { timeout });
                }
            };

        let outcome = match staged {
            Ok(Staged::Replayed(receipt)) => Ok(receipt),
            Ok(Staged::Pending(pending)) => pending.finish(draft, session).await,
            Err(e) => Err(e),
        };

        match (outcome, key) {
            // Another process inserted the same key between our check and
            // our insert.
            (Err(CommitError::Persistence(e)), Some(key))
                if e.is_unique_violation_on("sales.idempotency_key") =>
            {
                match self.find_by_idempotency_key(&key).await? {
                    Some(existing) => replay(existing, draft, &key),
                    None => Err(CommitError::Persistence(e)),
                }
            }
            (outcome, _) => outcome,
        }
    }

    /// Runs every step up to, but not including, COMMIT.
    ///
    /// The returned pending sale still holds the commit gate and the open
    /// write transaction.
    async fn stage(
        &self,
        draft: &SaleDraft,
        session: &CashierSession,
        key: Option<&str>,
    ) -> CommitResult<Staged<'_>> {
        if draft.lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        if draft.cash_tendered < draft.net_total {
            return Err(CoreError::InsufficientCash {
                required: draft.net_total,
                tendered: draft.cash_tendered,
            }
            .into());
        }

        let gate = self.commit_gate.lock().await;

        // IMMEDIATE takes the write lock up front, so a writer in another
        // process waits on busy_timeout and then sees its committed stock.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        // 0. Idempotent replay
        if let Some(key) = key {
            if let Some(existing) = fetch_by_key(&mut *tx, key).await? {
                return replay(existing, draft, key).map(Staged::Replayed);
            }
        }

        // 1. Re-validate against stock as it is now
        let demand = draft.demand_by_target();
        for (&target, &quantity) in &demand {
            let available = read_stock(&mut *tx, target).await?.unwrap_or(0);
            if available < quantity {
                warn!(?target, quantity, available, "Stock changed before commit");
                return Err(stock_changed(draft, target, available).into());
            }
        }

        // 2. Header
        let sale_date = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                sale_date, gross_cents, discount_bps, discount_cents,
                total_cents, tendered_cents, change_cents,
                total_items, cashier_email, idempotency_key
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(db_timestamp(sale_date))
        .bind(draft.gross_total.cents())
        .bind(draft.discount.bps())
        .bind(draft.discount_amount.cents())
        .bind(draft.net_total.cents())
        .bind(draft.cash_tendered.cents())
        .bind(draft.change.cents())
        .bind(draft.item_count)
        .bind(&session.cashier)
        .bind(key)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let sale_id = result.last_insert_rowid();
        debug!(sale_id, "Sale header inserted");

        // 3. Lines
        for line in &draft.lines {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    sale_id, product_id, variant_id, product_name,
                    quantity, price_cents, subtotal_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(sale_id)
            .bind(line.product_id)
            .bind(line.variant_id)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .bind(line.subtotal.cents())
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        }

        // 4. Stock
        for (&target, &quantity) in &demand {
            if !decrement_stock(&mut *tx, target, quantity).await? {
                let available = read_stock(&mut *tx, target).await?.unwrap_or(0);
                warn!(?target, quantity, available, "Stock decrement lost a race");
                return Err(stock_changed(draft, target, available).into());
            }
        }

        Ok(Staged::Pending(PendingSale {
            _gate: gate,
            tx,
            sale_id,
            sale_date,
        }))
    }

    // =========================================================================
    // History
    // =========================================================================

    pub async fn get_by_id(&self, id: SaleId) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Items of a sale in insertion order.
    pub async fn get_lines(&self, sale_id: SaleId) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, variant_id, product_name,
                   quantity, price_cents, subtotal_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Most recent sales first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY sale_date DESC, id DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Sales rung up by one cashier, most recent first.
    pub async fn find_by_cashier(&self, cashier: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales
             WHERE cashier_email = ?1
             ORDER BY sale_date DESC, id DESC
             LIMIT ?2"
        ))
        .bind(cashier)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Sales with `start <= sale_date < end`, oldest first.
    pub async fn find_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales
             WHERE sale_date >= ?1 AND sale_date < ?2
             ORDER BY sale_date, id"
        ))
        .bind(db_timestamp(start))
        .bind(db_timestamp(end))
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Count, net revenue, and items sold for `start <= sale_date < end`.
    pub async fn summary_for_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<SalesSummary> {
        let (sale_count, net_cents, item_count) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(total_cents), 0),
                   COALESCE(SUM(total_items), 0)
            FROM sales
            WHERE sale_date >= ?1 AND sale_date < ?2
            "#,
        )
        .bind(db_timestamp(start))
        .bind(db_timestamp(end))
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesSummary {
            sale_count,
            net_total: Money::from_cents(net_cents),
            item_count,
        })
    }

    pub async fn find_by_idempotency_key(&self, key: &str) -> DbResult<Option<Sale>> {
        fetch_by_key(&self.pool, key).await
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Timestamps are stored as fixed-width RFC 3339 so that text comparison
/// orders them correctly.
fn db_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

async fn fetch_by_key<'e, E>(executor: E, key: &str) -> DbResult<Option<Sale>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE idempotency_key = ?1"
    ))
    .bind(key)
    .fetch_optional(executor)
    .await?;

    Ok(sale)
}

/// A retry is recognised by its key plus matching net total and item count.
fn replay(existing: Sale, draft: &SaleDraft, key: &str) -> CommitResult<Receipt> {
    if existing.total_cents == draft.net_total.cents() && existing.total_items == draft.item_count
    {
        info!(sale_id = existing.id, key, "Replaying sale for idempotency key");
        Ok(Receipt::from_sale(&existing, true))
    } else {
        warn!(sale_id = existing.id, key, "Idempotency key reused for a different sale");
        Err(CommitError::IdempotencyConflict {
            key: key.to_string(),
        })
    }
}

fn stock_changed(draft: &SaleDraft, target: StockTarget, available: i64) -> CoreError {
    let line = draft.lines.iter().find(|l| l.stock_target() == target);
    let (product_id, variant_id) = match (target, line) {
        (_, Some(line)) => (line.product_id, line.variant_id),
        (StockTarget::Product(id), None) => (id, None),
        (StockTarget::Variant(id), None) => (0, Some(id)),
    };
    CoreError::StockChanged {
        product_id,
        variant_id,
        available: available.max(0),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use till_core::cart::Cart;
    use till_core::checkout::prepare_sale;
    use till_core::validation::{resolve_selection, SelectionRequest};
    use till_core::{ModifierMode, ProductId, VariantId};

    struct Fixture {
        db: Database,
        lamp: ProductId,
        led: i64,
        shirt: ProductId,
        medium: VariantId,
    }

    /// Desk lamp at 100.00 with a +15.00 option (stock 10), and a shirt
    /// whose "M" variant has stock 2.
    async fn fixture(db: Database) -> Fixture {
        let catalog = db.catalog();
        let lamp = catalog
            .insert_product("Desk Lamp", Money::from_cents(10000), 10)
            .await
            .unwrap();
        let bulb = catalog
            .insert_modifier_group(lamp, "Bulb", ModifierMode::Single, false)
            .await
            .unwrap();
        let led = catalog
            .insert_modifier_option(bulb, "LED", Money::from_cents(1500))
            .await
            .unwrap();
        let shirt = catalog
            .insert_product("Shirt", Money::from_cents(2000), 50)
            .await
            .unwrap();
        let medium = catalog
            .insert_variant(shirt, "M", Money::from_cents(2200), 2)
            .await
            .unwrap();

        Fixture {
            db,
            lamp,
            led,
            shirt,
            medium,
        }
    }

    async fn in_memory_fixture() -> Fixture {
        fixture(Database::new(DbConfig::in_memory()).await.unwrap()).await
    }

    async fn add(
        db: &Database,
        cart: &mut Cart,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        option_ids: Vec<i64>,
        quantity: i64,
    ) {
        let listing = db.catalog().load_listing(product_id).await.unwrap();
        let item = resolve_selection(
            &listing,
            &SelectionRequest {
                product_id,
                variant_id,
                option_ids,
                bundle_id: None,
                quantity,
            },
        )
        .unwrap();
        cart.add_line(item).unwrap();
    }

    fn session() -> CashierSession {
        CashierSession::open("ana@store.test").unwrap()
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_worked_example_commit() {
        let f = in_memory_fixture().await;
        let mut cart = Cart::new();
        add(&f.db, &mut cart, f.lamp, None, vec![f.led], 2).await;
        cart.set_discount_percent(10.0);

        let draft = prepare_sale(&cart, Money::from_cents(25000)).unwrap();
        let receipt = f.db.sales().commit(&draft, &session(), None).await.unwrap();

        assert_eq!(receipt.gross_total, Money::from_cents(23000));
        assert_eq!(receipt.net_total, Money::from_cents(20700));
        assert_eq!(receipt.change, Money::from_cents(4300));
        assert!(!receipt.replayed);

        let sale = f.db.sales().get_by_id(receipt.sale_id).await.unwrap().unwrap();
        assert_eq!(sale.total_cents, 20700);
        assert_eq!(sale.discount_bps, 1000);
        assert_eq!(sale.cashier_email, "ana@store.test");

        let lines = f.db.sales().get_lines(receipt.sale_id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].price_cents, 11500);
        assert_eq!(lines[0].subtotal_cents, 23000);
        assert_eq!(lines[0].product_name, "Desk Lamp");

        let stock = f
            .db
            .catalog()
            .stock_level(StockTarget::Product(f.lamp))
            .await
            .unwrap();
        assert_eq!(stock, 8);
    }

    #[tokio::test]
    async fn test_variant_sale_decrements_variant_stock() {
        let f = in_memory_fixture().await;
        let mut cart = Cart::new();
        add(&f.db, &mut cart, f.shirt, Some(f.medium), vec![], 2).await;

        let draft = prepare_sale(&cart, Money::from_cents(5000)).unwrap();
        let receipt = f.db.sales().commit(&draft, &session(), None).await.unwrap();

        let catalog = f.db.catalog();
        assert_eq!(catalog.stock_level(StockTarget::Variant(f.medium)).await.unwrap(), 0);
        assert_eq!(catalog.stock_level(StockTarget::Product(f.shirt)).await.unwrap(), 50);

        let lines = f.db.sales().get_lines(receipt.sale_id).await.unwrap();
        assert_eq!(lines[0].variant_id, Some(f.medium));
        assert_eq!(lines[0].product_name, "Shirt (M)");
    }

    #[tokio::test]
    async fn test_bundle_sale_leaves_companion_stock() {
        let f = in_memory_fixture().await;
        let catalog = f.db.catalog();
        let combo = catalog
            .insert_product("Burger Combo", Money::from_cents(900), 5)
            .await
            .unwrap();
        let fries = catalog
            .insert_product("Fries", Money::from_cents(300), 7)
            .await
            .unwrap();
        let with_fries = catalog.insert_bundle(combo, fries, 1).await.unwrap();

        let listing = catalog.load_listing(combo).await.unwrap();
        let item = resolve_selection(
            &listing,
            &SelectionRequest {
                product_id: combo,
                variant_id: None,
                option_ids: vec![],
                bundle_id: Some(with_fries),
                quantity: 2,
            },
        )
        .unwrap();
        let mut cart = Cart::new();
        cart.add_line(item).unwrap();

        let draft = prepare_sale(&cart, Money::from_cents(2000)).unwrap();
        let receipt = f.db.sales().commit(&draft, &session(), None).await.unwrap();
        assert_eq!(receipt.net_total, Money::from_cents(1800));

        assert_eq!(catalog.stock_level(StockTarget::Product(combo)).await.unwrap(), 3);
        assert_eq!(catalog.stock_level(StockTarget::Product(fries)).await.unwrap(), 7);

        let lines = f.db.sales().get_lines(receipt.sale_id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].product_id, combo);
    }

    #[tokio::test]
    async fn test_stock_changed_since_cart_built() {
        let f = in_memory_fixture().await;
        let mut cart = Cart::new();
        add(&f.db, &mut cart, f.shirt, Some(f.medium), vec![], 2).await;

        // Another till sells one in the meantime.
        sqlx::query("UPDATE product_variants SET stock = 1 WHERE id = ?1")
            .bind(f.medium)
            .execute(f.db.pool())
            .await
            .unwrap();

        let draft = prepare_sale(&cart, Money::from_cents(5000)).unwrap();
        let err = f.db.sales().commit(&draft, &session(), None).await.unwrap_err();

        assert!(matches!(
            err,
            CommitError::Rejected(CoreError::StockChanged {
                variant_id: Some(_),
                available: 1,
                ..
            })
        ));
        assert_eq!(count(&f.db, "sales").await, 0);
    }

    #[tokio::test]
    async fn test_failure_after_header_rolls_back() {
        let f = in_memory_fixture().await;
        let mut cart = Cart::new();
        add(&f.db, &mut cart, f.lamp, None, vec![], 3).await;

        // Fail the stock update, which runs after the header and items.
        sqlx::query(
            "CREATE TRIGGER fail_stock BEFORE UPDATE ON products
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END",
        )
        .execute(f.db.pool())
        .await
        .unwrap();

        let draft = prepare_sale(&cart, Money::from_cents(50000)).unwrap();
        let err = f.db.sales().commit(&draft, &session(), None).await.unwrap_err();
        assert!(matches!(err, CommitError::Persistence(_)));

        assert_eq!(count(&f.db, "sales").await, 0);
        assert_eq!(count(&f.db, "sale_items").await, 0);
        let stock = f
            .db
            .catalog()
            .stock_level(StockTarget::Product(f.lamp))
            .await
            .unwrap();
        assert_eq!(stock, 10);
    }

    #[tokio::test]
    async fn test_idempotent_retry_replays() {
        let f = in_memory_fixture().await;
        let mut cart = Cart::new();
        add(&f.db, &mut cart, f.lamp, None, vec![], 1).await;
        let draft = prepare_sale(&cart, Money::from_cents(10000)).unwrap();

        let sales = f.db.sales();
        let first = sales.commit(&draft, &session(), Some("till1-0001")).await.unwrap();
        let retry = sales.commit(&draft, &session(), Some("till1-0001")).await.unwrap();

        assert_eq!(first.sale_id, retry.sale_id);
        assert!(retry.replayed);
        assert_eq!(count(&f.db, "sales").await, 1);
        let stock = f
            .db
            .catalog()
            .stock_level(StockTarget::Product(f.lamp))
            .await
            .unwrap();
        assert_eq!(stock, 9);
    }

    #[tokio::test]
    async fn test_idempotency_conflict() {
        let f = in_memory_fixture().await;
        let sales = f.db.sales();

        let mut cart = Cart::new();
        add(&f.db, &mut cart, f.lamp, None, vec![], 1).await;
        let one = prepare_sale(&cart, Money::from_cents(50000)).unwrap();
        sales.commit(&one, &session(), Some("k-1")).await.unwrap();

        let mut cart = Cart::new();
        add(&f.db, &mut cart, f.lamp, None, vec![], 2).await;
        let two = prepare_sale(&cart, Money::from_cents(50000)).unwrap();
        let err = sales.commit(&two, &session(), Some("k-1")).await.unwrap_err();

        assert!(matches!(err, CommitError::IdempotencyConflict { .. }));
        assert_eq!(count(&f.db, "sales").await, 1);
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let f = in_memory_fixture().await;
        let mut cart = Cart::new();
        add(&f.db, &mut cart, f.lamp, None, vec![], 1).await;
        let draft = prepare_sale(&cart, Money::from_cents(10000)).unwrap();

        let err = f
            .db
            .sales()
            .commit(&draft, &session(), Some("has space"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::Rejected(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_hand_built_draft_rechecked() {
        let f = in_memory_fixture().await;
        let mut cart = Cart::new();
        add(&f.db, &mut cart, f.lamp, None, vec![], 1).await;
        let mut draft = prepare_sale(&cart, Money::from_cents(10000)).unwrap();
        draft.cash_tendered = Money::from_cents(100);

        let err = f.db.sales().commit(&draft, &session(), None).await.unwrap_err();
        assert!(matches!(
            err,
            CommitError::Rejected(CoreError::InsufficientCash { .. })
        ));

        draft.lines.clear();
        let err = f.db.sales().commit(&draft, &session(), None).await.unwrap_err();
        assert!(matches!(err, CommitError::Rejected(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_commit_times_out_waiting_for_gate() {
        let db = Database::new(DbConfig::in_memory().commit_timeout(Duration::from_millis(50)))
            .await
            .unwrap();
        let f = fixture(db).await;
        let mut cart = Cart::new();
        add(&f.db, &mut cart, f.lamp, None, vec![], 1).await;
        let draft = prepare_sale(&cart, Money::from_cents(10000)).unwrap();

        let sales = f.db.sales();
        let _held = sales.commit_gate.lock().await;
        let err = sales.commit(&draft, &session(), None).await.unwrap_err();

        assert!(matches!(err, CommitError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn test_commit_runs_after_deadline_once_staged() {
        let db = Database::new(DbConfig::in_memory().commit_timeout(Duration::from_millis(50)))
            .await
            .unwrap();
        let f = fixture(db).await;
        let mut cart = Cart::new();
        add(&f.db, &mut cart, f.lamp, None, vec![], 1).await;
        let draft = prepare_sale(&cart, Money::from_cents(10000)).unwrap();

        let sales = f.db.sales();
        let cashier = session();
        let pending = match sales.stage(&draft, &cashier, None).await.unwrap() {
            Staged::Pending(pending) => pending,
            Staged::Replayed(_) => panic!("nothing to replay without a key"),
        };

        // Past the deadline: COMMIT still goes through.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let receipt = pending.finish(&draft, &cashier).await.unwrap();

        assert!(!receipt.replayed);
        assert_eq!(count(&f.db, "sales").await, 1);
        let stock = f
            .db
            .catalog()
            .stock_level(StockTarget::Product(f.lamp))
            .await
            .unwrap();
        assert_eq!(stock, 9);
    }

    #[tokio::test]
    async fn test_two_handles_on_one_file_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("till.db");
        let f = fixture(Database::new(DbConfig::new(&path)).await.unwrap()).await;
        // Separate pool and commit gate, as a second register process has.
        let other = Database::new(DbConfig::new(&path)).await.unwrap();

        let mut a = Cart::new();
        let mut b = Cart::new();
        add(&f.db, &mut a, f.shirt, Some(f.medium), vec![], 2).await;
        add(&f.db, &mut b, f.shirt, Some(f.medium), vec![], 2).await;
        let draft_a = prepare_sale(&a, Money::from_cents(5000)).unwrap();
        let draft_b = prepare_sale(&b, Money::from_cents(5000)).unwrap();

        let (sales_a, sales_b) = (f.db.sales(), other.sales());
        let (cashier_a, cashier_b) = (session(), session());
        let (ra, rb) = tokio::join!(
            sales_a.commit(&draft_a, &cashier_a, None),
            sales_b.commit(&draft_b, &cashier_b, None),
        );

        let failed = match (ra, rb) {
            (Ok(_), Err(e)) | (Err(e), Ok(_)) => e,
            other => panic!("expected exactly one success, got {other:?}"),
        };
        assert!(matches!(
            failed,
            CommitError::Rejected(CoreError::StockChanged { available: 0, .. })
        ));
        assert_eq!(count(&f.db, "sales").await, 1);
        assert_eq!(
            f.db.catalog()
                .stock_level(StockTarget::Variant(f.medium))
                .await
                .unwrap(),
            0
        );
        other.close().await;
    }

    #[tokio::test]
    async fn test_concurrent_commits_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("till.db")))
            .await
            .unwrap();
        let f = fixture(db).await;

        // Two carts, each wanting both remaining "M" shirts.
        let mut a = Cart::new();
        let mut b = Cart::new();
        add(&f.db, &mut a, f.shirt, Some(f.medium), vec![], 2).await;
        add(&f.db, &mut b, f.shirt, Some(f.medium), vec![], 2).await;
        let draft_a = prepare_sale(&a, Money::from_cents(5000)).unwrap();
        let draft_b = prepare_sale(&b, Money::from_cents(5000)).unwrap();

        let sales = f.db.sales();
        let (cashier_a, cashier_b) = (session(), session());
        let (ra, rb) = tokio::join!(
            sales.commit(&draft_a, &cashier_a, None),
            sales.commit(&draft_b, &cashier_b, None),
        );

        let (ok, failed) = match (ra, rb) {
            (Ok(r), Err(e)) | (Err(e), Ok(r)) => (r, e),
            other => panic!("expected exactly one success, got {other:?}"),
        };
        assert_eq!(ok.item_count, 2);
        assert!(matches!(
            failed,
            CommitError::Rejected(CoreError::StockChanged { available: 0, .. })
        ));
        assert_eq!(
            f.db.catalog()
                .stock_level(StockTarget::Variant(f.medium))
                .await
                .unwrap(),
            0
        );
        assert_eq!(count(&f.db, "sales").await, 1);
    }

    #[tokio::test]
    async fn test_history_queries() {
        let f = in_memory_fixture().await;
        let sales = f.db.sales();
        let start = Utc::now() - chrono::Duration::minutes(1);

        for (cashier, qty) in [("ana@store.test", 1), ("ben@store.test", 2), ("ana@store.test", 3)] {
            let mut cart = Cart::new();
            add(&f.db, &mut cart, f.lamp, None, vec![], qty).await;
            let draft = prepare_sale(&cart, Money::from_cents(100000)).unwrap();
            sales
                .commit(&draft, &CashierSession::open(cashier).unwrap(), None)
                .await
                .unwrap();
        }
        let end = Utc::now() + chrono::Duration::minutes(1);

        let recent = sales.list_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].total_items, 3);

        let ana = sales.find_by_cashier("ana@store.test", 10).await.unwrap();
        assert_eq!(ana.len(), 2);

        let in_range = sales.find_by_date_range(start, end).await.unwrap();
        assert_eq!(in_range.len(), 3);
        assert_eq!(in_range[0].total_items, 1);

        let summary = sales.summary_for_range(start, end).await.unwrap();
        assert_eq!(summary.sale_count, 3);
        assert_eq!(summary.item_count, 6);
        assert_eq!(summary.net_total, Money::from_cents(60000));

        let empty = sales
            .summary_for_range(end, end + chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(empty.sale_count, 0);
        assert_eq!(empty.net_total, Money::zero());
    }
}
