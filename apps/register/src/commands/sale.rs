//! # Sale Commands
//!
//! Completing the sale and reading it back.
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  complete_sale(cash, key?)                                              │
//! │       │                                                                 │
//! │       ├── session open? ──────────── no ──► ValidationError             │
//! │       ▼                                                                 │
//! │  prepare_sale(cart, cash) ───────── empty / short ──► rejected          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sales().commit(draft, session, key)                                    │
//! │       │          │                                                      │
//! │       │          └── StockChanged ──► cart stock refreshed, cart kept   │
//! │       ▼                                                                 │
//! │  Receipt ──► cart cleared                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{DbState, SessionState};
use till_core::{prepare_sale, CoreError, Money, Receipt, Sale, SaleId, SaleItem, StockTarget};
use till_db::{CommitError, SalesSummary};

const DEFAULT_HISTORY_LIMIT: u32 = 20;
const MAX_HISTORY_LIMIT: u32 = 500;

/// A stored sale with its lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    pub receipt: Receipt,
    pub cashier: String,
    pub lines: Vec<SaleItem>,
}

/// Commits the session's cart as a sale.
///
/// ## Behavior
/// - The cashier comes from the open session
/// - On success (new or replayed) the cart is cleared
/// - On any error the cart is kept as it was; if stock moved, the cart's
///   stock figure for that product or variant is updated so the cashier can
///   adjust the quantity
///
/// ## Arguments
/// * `cash_tendered` - Cash received from the customer
/// * `idempotency_key` - Retry key; the same key replays the stored receipt
pub async fn complete_sale(
    db: &DbState,
    session: &SessionState,
    cash_tendered: Money,
    idempotency_key: Option<&str>,
) -> Result<Receipt, ApiError> {
    let cashier = session.current()?;
    debug!(tendered = %cash_tendered, key = ?idempotency_key, "complete_sale command");

    let draft = session
        .cart()
        .with_cart(|c| prepare_sale(c, cash_tendered))?;

    match db.inner().sales().commit(&draft, &cashier, idempotency_key).await {
        Ok(receipt) => {
            session.cart().with_cart_mut(|c| c.clear());
            info!(
                sale_id = receipt.sale_id,
                total = %receipt.net_total,
                change = %receipt.change,
                replayed = receipt.replayed,
                "Sale completed"
            );
            Ok(receipt)
        }
        Err(CommitError::Rejected(CoreError::StockChanged {
            product_id,
            variant_id,
            available,
        })) => {
            let target = StockTarget::for_selection(product_id, variant_id);
            session
                .cart()
                .with_cart_mut(|c| c.refresh_stock(target, available));
            Err(CoreError::StockChanged {
                product_id,
                variant_id,
                available,
            }
            .into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Loads a stored sale and its lines.
pub async fn get_sale(db: &DbState, sale_id: SaleId) -> Result<SaleDetail, ApiError> {
    debug!(sale_id, "get_sale command");

    let sales = db.inner().sales();
    let sale = sales
        .get_by_id(sale_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &sale_id.to_string()))?;
    let lines = sales.get_lines(sale_id).await?;

    Ok(SaleDetail {
        receipt: Receipt::from_sale(&sale, false),
        cashier: sale.cashier_email,
        lines,
    })
}

/// Most recent sales first.
pub async fn recent_sales(db: &DbState, limit: Option<u32>) -> Result<Vec<Sale>, ApiError> {
    let limit = limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    debug!(limit, "recent_sales command");

    Ok(db.inner().sales().list_recent(limit).await?)
}

/// Sales of the open session's cashier, most recent first.
pub async fn my_sales(
    db: &DbState,
    session: &SessionState,
    limit: Option<u32>,
) -> Result<Vec<Sale>, ApiError> {
    let cashier = session.current()?;
    let limit = limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    Ok(db
        .inner()
        .sales()
        .find_by_cashier(&cashier.cashier, limit)
        .await?)
}

/// Count, revenue and items for the 24 hours ending at `now`.
pub async fn daily_summary(db: &DbState, now: DateTime<Utc>) -> Result<SalesSummary, ApiError> {
    let start = now - Duration::hours(24);
    Ok(db.inner().sales().summary_for_range(start, now).await?)
}
