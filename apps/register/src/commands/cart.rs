//! # Cart Commands
//!
//! Cart manipulation for the current session.
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  login   │────►│ In Cart  │────►│  Tender  │────►│ Committed│       │
//! │  │ (empty)  │     │          │     │          │     │   Sale   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                │             │
//! │                   add_to_cart      complete_sale     cart cleared      │
//! │                   set_line_quantity  (sale.rs)                         │
//! │                   remove_line                                          │
//! │                   set_discount                                         │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   clear_cart ──────────────────────► (back to empty)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock figures come from the database; the cart lock is taken only after
//! every read has finished.

use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::{DbState, SessionState};
use till_core::validation::{resolve_selection, SelectionRequest};
use till_core::{Cart, CartLine, CartTotals, CoreError, DiscountRate, LineId, Money};

/// One cart line as shown to the cashier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDto {
    pub line_id: LineId,
    pub name: String,
    /// Selected option names, in group order.
    pub options: Vec<String>,
    pub bundle: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
    /// Highest quantity this line may be set to.
    pub available: i64,
}

impl CartLineDto {
    fn from_line(cart: &Cart, line: &CartLine) -> Self {
        CartLineDto {
            line_id: line.id,
            name: line.display_name(),
            options: line.options().map(|o| o.name.clone()).collect(),
            bundle: line
                .bundle
                .as_ref()
                .map(|b| b.item_name.clone().unwrap_or_else(|| format!("#{}", b.item_product_id))),
            quantity: line.quantity,
            unit_price: line.unit_price(),
            subtotal: line.subtotal(),
            available: cart.available_for(line),
        }
    }
}

/// Totals for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsResponse {
    pub item_count: i64,
    pub gross_total: Money,
    pub discount: DiscountRate,
    pub discount_amount: Money,
    pub net_total: Money,
}

impl From<CartTotals> for TotalsResponse {
    fn from(t: CartTotals) -> Self {
        TotalsResponse {
            item_count: t.item_count,
            gross_total: t.gross_total,
            discount: t.discount,
            discount_amount: t.discount_amount,
            net_total: t.net_total,
        }
    }
}

/// Cart response including lines and totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLineDto>,
    pub totals: TotalsResponse,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            lines: cart
                .lines()
                .iter()
                .map(|l| CartLineDto::from_line(cart, l))
                .collect(),
            totals: cart.totals().into(),
        }
    }
}

/// Gets the current cart contents.
pub fn get_cart(session: &SessionState) -> CartResponse {
    debug!("get_cart command");
    session.cart().with_cart(|c| CartResponse::from(c))
}

/// Validates a selection against the catalog and adds it to the cart.
///
/// ## Behavior
/// - Same configuration already in the cart: quantities merge into the
///   existing line, checked against stock as a whole
/// - Otherwise: a new line with a fresh id
/// - Prices are captured now; later catalog edits do not reprice the line
///
/// ## Returns
/// The id of the line that now holds the selection.
pub async fn add_to_cart(
    db: &DbState,
    session: &SessionState,
    request: SelectionRequest,
) -> Result<LineId, ApiError> {
    session.current()?;
    debug!(
        product_id = request.product_id,
        variant_id = ?request.variant_id,
        options = ?request.option_ids,
        quantity = request.quantity,
        "add_to_cart command"
    );

    let listing = db.inner().catalog().load_listing(request.product_id).await?;
    let item = resolve_selection(&listing, &request)?;

    let line_id = session.cart().with_cart_mut(|c| {
        c.refresh_stock(item.stock_target(), item.stock);
        c.add_line(item)
    })?;

    Ok(line_id)
}

/// Changes a line's quantity after re-reading its stock.
///
/// The new quantity must lie in `[1, available]`, where `available` is the
/// fresh stock minus what other lines on the same product or variant hold.
/// On error the quantity is unchanged.
pub async fn set_line_quantity(
    db: &DbState,
    session: &SessionState,
    line_id: LineId,
    quantity: i64,
) -> Result<(), ApiError> {
    debug!(%line_id, quantity, "set_line_quantity command");

    let target = session
        .cart()
        .with_cart(|c| c.line(line_id).map(CartLine::stock_target))
        .ok_or_else(|| CoreError::LineNotFound(line_id.to_string()))?;

    let stock = db.inner().catalog().stock_level(target).await?;

    session.cart().with_cart_mut(|c| {
        c.refresh_stock(target, stock);
        c.set_quantity(line_id, quantity)
    })?;

    Ok(())
}

/// Removes a line. Unknown ids are a no-op; returns whether a line went.
pub fn remove_line(session: &SessionState, line_id: LineId) -> bool {
    debug!(%line_id, "remove_line command");
    session.cart().with_cart_mut(|c| c.remove_line(line_id))
}

/// Clears all lines and the discount.
pub fn clear_cart(session: &SessionState) {
    debug!("clear_cart command");
    session.cart().with_cart_mut(Cart::clear);
}

/// Sets the cart discount as a percentage. Out-of-range values are clamped
/// to `[0, 100]`; the applied rate is returned.
pub fn set_discount(session: &SessionState, percent: f64) -> DiscountRate {
    debug!(percent, "set_discount command");
    session.cart().with_cart_mut(|c| {
        c.set_discount_percent(percent);
        c.discount()
    })
}

pub fn get_totals(session: &SessionState) -> TotalsResponse {
    session.cart().with_cart(|c| c.totals().into())
}
