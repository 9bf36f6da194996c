//! # Pricing
//!
//! Pure price arithmetic shared by the cart and the sale commit.
//!
//! ## Price Composition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  unit price  = (variant price  OR  product price) + Σ option prices    │
//! │  subtotal    = unit price × quantity                                   │
//! │                                                                         │
//! │  gross       = Σ subtotal                                              │
//! │  discount    = gross × bps / 10000   (half-up, to the cent)            │
//! │  net         = gross − discount                                        │
//! │                                                                         │
//! │  Example: base 100.00, option +15.00, qty 2, 10% off                   │
//! │    unit 115.00 → subtotal 230.00 → discount 23.00 → net 207.00         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{ModifierOption, Product, ProductVariant};

// =============================================================================
// Discount Rate
// =============================================================================

/// A cart-level discount in basis points, always within 0..=10000
/// (0% to 100%).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a rate from basis points, clamping to 100%.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        if bps > Self::MAX_BPS {
            DiscountRate(Self::MAX_BPS)
        } else {
            DiscountRate(bps)
        }
    }

    /// Creates a rate from a percentage as typed by the cashier.
    ///
    /// Values outside [0, 100] are clamped and NaN becomes 0; a discount
    /// entry is never an error.
    ///
    /// ```rust
    /// use till_core::pricing::DiscountRate;
    ///
    /// assert_eq!(DiscountRate::from_percent(10.0).bps(), 1000);
    /// assert_eq!(DiscountRate::from_percent(150.0).bps(), 10000);
    /// assert_eq!(DiscountRate::from_percent(-5.0).bps(), 0);
    /// assert_eq!(DiscountRate::from_percent(f64::NAN).bps(), 0);
    /// ```
    pub fn from_percent(percent: f64) -> Self {
        if percent.is_nan() {
            return DiscountRate(0);
        }
        let clamped = percent.clamp(0.0, 100.0);
        DiscountRate((clamped * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for DiscountRate {
    /// `"10%"`, `"12.5%"`, `"0.25%"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{}%", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}%", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}

// =============================================================================
// Price Functions
// =============================================================================

/// Unit price of a configured item.
///
/// The variant price replaces the product price; every selected option adds
/// its own price on top. Never fails.
pub fn unit_price<'a, I>(product: &Product, variant: Option<&ProductVariant>, options: I) -> Money
where
    I: IntoIterator<Item = &'a ModifierOption>,
{
    let base = variant.map_or_else(|| product.price(), ProductVariant::price);
    base + options.into_iter().map(ModifierOption::price).sum::<Money>()
}

/// `unit × quantity`.
#[inline]
pub fn line_subtotal(unit: Money, quantity: i64) -> Money {
    unit.times(quantity)
}

/// Discount on a gross total, rounded half-up to the cent.
#[inline]
pub fn discount_amount(gross: Money, rate: DiscountRate) -> Money {
    gross.percentage(rate.bps())
}

/// `gross − discount`. Never negative for a non-negative gross, since the
/// rate is capped at 100%.
#[inline]
pub fn net_total(gross: Money, rate: DiscountRate) -> Money {
    gross - discount_amount(gross, rate)
}

// =============================================================================
// Unit Tests
// =============================================================================
