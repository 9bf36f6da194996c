//! # Cart
//!
//! The in-progress sale: an ordered list of configured lines plus a
//! cart-level discount.
//!
//! ## Line Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   absent ──add_line──► present(n) ──add_line (same config)──► n + k    │
//! │                            │                                            │
//! │                            ├── set_quantity(m) ──► present(m)          │
//! │                            │                                            │
//! │                            └── remove_line / clear ──► absent          │
//! │                                                                         │
//! │   Two lines are "the same config" when their fingerprints match:       │
//! │   (product id, variant id?, sorted option ids, bundle id?)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Shared Stock
//! Lines with different options can draw on the same stock column (two
//! burgers with different extras both consume product stock). A line may
//! only hold what its target has left after the cart's *other* lines on
//! that target:
//!
//! ```text
//!   stock(Product 1) = 5
//!   line A: Product 1 + cheese   qty 3
//!   line B: Product 1 + bacon    qty ?   → at most 5 − 3 = 2
//! ```
//!
//! Every failed mutation leaves the cart exactly as it was.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{self, DiscountRate};
use crate::types::{
    BundleId, ModifierOption, ModifierOptionId, Product, ProductBundle, ProductId,
    ProductVariant, StockTarget, VariantId,
};
use crate::validation::{validate_quantity, ConfiguredItem, SelectedModifier};
use crate::MAX_CART_LINES;

// =============================================================================
// Line Identity
// =============================================================================

/// Stable identifier of a cart line, kept across quantity edits and merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(Uuid);

impl LineId {
    pub fn new() -> Self {
        LineId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for LineId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(LineId)
            .map_err(|e| ValidationError::InvalidFormat {
                field: "line_id".to_string(),
                reason: e.to_string(),
            })
    }
}

/// What makes two lines mergeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineFingerprint {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    /// Sorted ascending.
    pub option_ids: Vec<ModifierOptionId>,
    pub bundle_id: Option<BundleId>,
}

// =============================================================================
// Cart Line
// =============================================================================

/// One configured product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: LineId,
    pub product: Product,
    pub variant: Option<ProductVariant>,
    pub modifiers: Vec<SelectedModifier>,
    pub bundle: Option<ProductBundle>,
    pub quantity: i64,
    /// Last known stock of the line's target. Refreshed by
    /// [`Cart::refresh_stock`].
    pub stock: i64,
}

impl CartLine {
    fn from_item(item: ConfiguredItem) -> Self {
        CartLine {
            id: LineId::new(),
            product: item.product,
            variant: item.variant,
            modifiers: item.modifiers,
            bundle: item.bundle,
            quantity: item.quantity,
            stock: item.stock,
        }
    }

    pub fn stock_target(&self) -> StockTarget {
        StockTarget::for_selection(self.product.id, self.variant_id())
    }

    pub fn variant_id(&self) -> Option<VariantId> {
        self.variant.as_ref().map(|v| v.id)
    }

    pub fn options(&self) -> impl Iterator<Item = &ModifierOption> {
        self.modifiers.iter().flat_map(|m| m.options.iter())
    }

    pub fn fingerprint(&self) -> LineFingerprint {
        let mut option_ids: Vec<_> = self.options().map(|o| o.id).collect();
        option_ids.sort_unstable();
        LineFingerprint {
            product_id: self.product.id,
            variant_id: self.variant_id(),
            option_ids,
            bundle_id: self.bundle.as_ref().map(|b| b.id),
        }
    }

    pub fn unit_price(&self) -> Money {
        pricing::unit_price(&self.product, self.variant.as_ref(), self.options())
    }

    pub fn subtotal(&self) -> Money {
        pricing::line_subtotal(self.unit_price(), self.quantity)
    }

    /// "Burger (Double)" when a variant is selected, else the product name.
    pub fn display_name(&self) -> String {
        match &self.variant {
            Some(v) => format!("{} ({})", self.product.name, v.name),
            None => self.product.name.clone(),
        }
    }
}

fn item_fingerprint(item: &ConfiguredItem) -> LineFingerprint {
    LineFingerprint {
        product_id: item.product.id,
        variant_id: item.variant.as_ref().map(|v| v.id),
        option_ids: item.option_ids(),
        bundle_id: item.bundle.as_ref().map(|b| b.id),
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Aggregates derived from the cart on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Sum of line quantities.
    pub item_count: i64,
    pub gross_total: Money,
    pub discount: DiscountRate,
    pub discount_amount: Money,
    pub net_total: Money,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    discount: DiscountRate,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, id: LineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn discount(&self) -> DiscountRate {
        self.discount
    }

    /// Adds a validated item, merging into an identical line if present.
    ///
    /// Returns the id of the line that now holds the item. On a merge the
    /// combined quantity is checked against stock first; if it does not fit
    /// nothing changes.
    pub fn add_line(&mut self, item: ConfiguredItem) -> CoreResult<LineId> {
        let target = item.stock_target();
        let fingerprint = item_fingerprint(&item);

        if let Some(idx) = self
            .lines
            .iter()
            .position(|l| l.fingerprint() == fingerprint)
        {
            let existing = &self.lines[idx];
            let combined = existing.quantity + item.quantity;
            let available = item.stock - self.held_by_others(target, Some(existing.id));

            if item.quantity <= 0 {
                return Err(CoreError::QuantityNonPositive);
            }
            validate_quantity(combined, available)?;

            let id = existing.id;
            self.lines[idx].quantity = combined;
            self.refresh_stock(target, item.stock);
            return Ok(id);
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        let available = item.stock - self.held_by_others(target, None);
        validate_quantity(item.quantity, available)?;

        let stock = item.stock;
        let line = CartLine::from_item(item);
        let id = line.id;
        self.lines.push(line);
        self.refresh_stock(target, stock);
        Ok(id)
    }

    /// Replaces a line's quantity after checking it against the line's
    /// current availability.
    pub fn set_quantity(&mut self, id: LineId, quantity: i64) -> CoreResult<()> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| CoreError::LineNotFound(id.to_string()))?;

        validate_quantity(quantity, self.available_for(&self.lines[idx]))?;
        self.lines[idx].quantity = quantity;
        Ok(())
    }

    /// Removes a line. Unknown ids are ignored; returns whether a line was
    /// removed.
    pub fn remove_line(&mut self, id: LineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != id);
        self.lines.len() != before
    }

    /// Empties the cart and resets the discount.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.discount = DiscountRate::zero();
    }

    pub fn set_discount(&mut self, rate: DiscountRate) {
        self.discount = rate;
    }

    /// Sets the discount from a percentage, clamped to [0, 100].
    pub fn set_discount_percent(&mut self, percent: f64) {
        self.set_discount(DiscountRate::from_percent(percent));
    }

    /// Records a fresh stock figure for every line drawing on `target`.
    ///
    /// Existing quantities are not touched; the next quantity change or the
    /// commit is what gets checked against the new figure.
    pub fn refresh_stock(&mut self, target: StockTarget, stock: i64) {
        for line in self.lines.iter_mut().filter(|l| l.stock_target() == target) {
            line.stock = stock;
        }
    }

    /// What `line` may hold: its target's stock minus the other lines on the
    /// same target.
    pub fn available_for(&self, line: &CartLine) -> i64 {
        line.stock - self.held_by_others(line.stock_target(), Some(line.id))
    }

    /// Total quantity per stock target across all lines.
    pub fn demand_by_target(&self) -> BTreeMap<StockTarget, i64> {
        let mut demand = BTreeMap::new();
        for line in &self.lines {
            *demand.entry(line.stock_target()).or_insert(0) += line.quantity;
        }
        demand
    }

    pub fn totals(&self) -> CartTotals {
        let gross_total: Money = self.lines.iter().map(CartLine::subtotal).sum();
        let discount_amount = pricing::discount_amount(gross_total, self.discount);
        CartTotals {
            item_count: self.lines.iter().map(|l| l.quantity).sum(),
            gross_total,
            discount: self.discount,
            discount_amount,
            net_total: gross_total - discount_amount,
        }
    }

    fn held_by_others(&self, target: StockTarget, except: Option<LineId>) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.stock_target() == target && Some(l.id) != except)
            .map(|l| l.quantity)
            .sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
