//! # Error Types
//!
//! Domain error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core (this file)                                                 │
//! │  ├── CoreError        - Rejected cart / checkout operations            │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  till-db                                                               │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── CommitError      - Sale commit outcome (wraps both of the above)  │
//! │                                                                         │
//! │  till-register                                                         │
//! │  └── ApiError         - What the front end sees (serialized)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` describes a rejected request. The cart or stock it
//! concerned is left exactly as it was before the call.

use thiserror::Error;

use crate::money::Money;
use crate::types::{ProductId, VariantId};

/// Business rule violations raised by selection, cart, and checkout logic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Quantity was zero or negative.
    #[error("Quantity must be greater than 0")]
    QuantityNonPositive,

    /// Requested quantity exceeds what the stock source can supply.
    ///
    /// `available` is the quantity still available to the line in question,
    /// after other lines of the same cart drawing on the same stock.
    #[error("Insufficient stock: only {available} available")]
    InsufficientStock { available: i64 },

    /// The product has variants but none was chosen.
    #[error("A variant must be selected for this product")]
    VariantRequired,

    /// A required modifier group has no selected option.
    #[error("Required modifier '{group}' has no option selected")]
    RequiredModifierUnsatisfied { group: String },

    /// A single-choice modifier group received more than one option.
    #[error("Modifier '{group}' allows only one option")]
    TooManyOptions { group: String },

    /// The variant does not exist or does not belong to the product.
    #[error("Variant {variant_id} is not available for product {product_id}")]
    UnknownVariant {
        product_id: ProductId,
        variant_id: VariantId,
    },

    /// A modifier option does not belong to any group of the product.
    #[error("Modifier option {option_id} is not available for product {product_id}")]
    UnknownOption { product_id: ProductId, option_id: i64 },

    /// The bundle does not belong to the product.
    #[error("Bundle {bundle_id} is not available for product {product_id}")]
    UnknownBundle { product_id: ProductId, bundle_id: i64 },

    /// Product was deactivated in the catalog.
    #[error("Product {0} is not available for sale")]
    ProductInactive(ProductId),

    /// Cart line id is not (or no longer) in the cart.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Cart already holds the maximum number of lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Checkout was attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cash tendered does not cover the net total.
    #[error("Insufficient cash: total is {required}, received {tendered}")]
    InsufficientCash { required: Money, tendered: Money },

    /// Stock moved between adding to the cart and committing the sale.
    #[error("Stock changed for product {product_id}: only {available} available")]
    StockChanged {
        product_id: ProductId,
        variant_id: Option<VariantId>,
        available: i64,
    },

    /// Field-level validation failure.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Input validation errors.
///
/// Raised before business logic runs: malformed amounts, missing cashier
/// identity, bad idempotency keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientCash {
            required: Money::from_cents(20700),
            tendered: Money::from_cents(20000),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient cash: total is 207.00, received 200.00"
        );

        let err = CoreError::RequiredModifierUnsatisfied {
            group: "Size".to_string(),
        };
        assert_eq!(err.to_string(), "Required modifier 'Size' has no option selected");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "cashier".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
