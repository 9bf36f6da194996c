//! # Checkout
//!
//! The pure half of completing a sale: checks that the cart can be paid for
//! and freezes it into a [`SaleDraft`] that the database layer commits.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart ──prepare_sale(cart, tendered)──► SaleDraft ──commit──► Receipt  │
//! │          (this module, pure)                        (till-db, one tx)   │
//! │                                                                         │
//! │  prepare_sale rejects:                                                  │
//! │    • empty cart                  → EmptyCart                           │
//! │    • negative tender             → Validation                          │
//! │    • tendered < net total        → InsufficientCash{required,tendered}  │
//! │                                                                         │
//! │  The live cart is only read. It is cleared by the caller after the     │
//! │  commit succeeds.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::DiscountRate;
use crate::types::{ProductId, Sale, SaleId, StockTarget, VariantId};
use crate::validation::validate_tendered;

// =============================================================================
// Draft
// =============================================================================

/// A frozen copy of one cart line, with prices resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    /// Name as it will appear on the sale item, variant included.
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl DraftLine {
    pub fn stock_target(&self) -> StockTarget {
        StockTarget::for_selection(self.product_id, self.variant_id)
    }
}

/// Everything needed to write a sale, computed before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDraft {
    pub lines: Vec<DraftLine>,
    pub gross_total: Money,
    pub discount: DiscountRate,
    pub discount_amount: Money,
    pub net_total: Money,
    pub cash_tendered: Money,
    /// `cash_tendered − net_total`, never negative.
    pub change: Money,
    pub item_count: i64,
}

impl SaleDraft {
    /// Quantity required from each stock target, summed over lines.
    pub fn demand_by_target(&self) -> BTreeMap<StockTarget, i64> {
        let mut demand = BTreeMap::new();
        for line in &self.lines {
            *demand.entry(line.stock_target()).or_insert(0) += line.quantity;
        }
        demand
    }
}

/// Validates payment and freezes the cart.
///
/// ## Example
/// ```rust
/// use till_core::cart::Cart;
/// use till_core::checkout::prepare_sale;
/// use till_core::error::CoreError;
/// use till_core::money::Money;
///
/// let err = prepare_sale(&Cart::new(), Money::from_cents(100)).unwrap_err();
/// assert_eq!(err, CoreError::EmptyCart);
/// ```
pub fn prepare_sale(cart: &Cart, cash_tendered: Money) -> CoreResult<SaleDraft> {
    let cash_tendered = validate_tendered(cash_tendered)?;

    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let totals = cart.totals();
    if cash_tendered < totals.net_total {
        return Err(CoreError::InsufficientCash {
            required: totals.net_total,
            tendered: cash_tendered,
        });
    }

    let lines = cart
        .lines()
        .iter()
        .map(|line| DraftLine {
            product_id: line.product.id,
            variant_id: line.variant_id(),
            product_name: line.display_name(),
            quantity: line.quantity,
            unit_price: line.unit_price(),
            subtotal: line.subtotal(),
        })
        .collect();

    Ok(SaleDraft {
        lines,
        gross_total: totals.gross_total,
        discount: totals.discount,
        discount_amount: totals.discount_amount,
        net_total: totals.net_total,
        cash_tendered,
        change: cash_tendered - totals.net_total,
        item_count: totals.item_count,
    })
}

// =============================================================================
// Receipt
// =============================================================================

/// Result of a completed (or replayed) sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Receipt {
    pub sale_id: SaleId,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub gross_total: Money,
    pub discount: DiscountRate,
    pub discount_amount: Money,
    pub net_total: Money,
    pub cash_tendered: Money,
    pub change: Money,
    pub item_count: i64,
    /// Set when an idempotency key matched an earlier sale and nothing new
    /// was written.
    pub replayed: bool,
}

impl Receipt {
    pub fn from_sale(sale: &Sale, replayed: bool) -> Self {
        Receipt {
            sale_id: sale.id,
            sale_date: sale.sale_date,
            gross_total: Money::from_cents(sale.gross_cents),
            discount: DiscountRate::from_bps(sale.discount_bps),
            discount_amount: Money::from_cents(sale.discount_cents),
            net_total: Money::from_cents(sale.total_cents),
            cash_tendered: Money::from_cents(sale.tendered_cents),
            change: Money::from_cents(sale.change_cents),
            item_count: sale.total_items,
            replayed,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
