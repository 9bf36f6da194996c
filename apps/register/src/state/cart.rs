//! # Cart State
//!
//! The cart of the current session.
//!
//! ## Thread Safety
//! The cart is wrapped in `Arc<Mutex<T>>` because several commands touch it
//! and only one may modify it at a time. The lock is a `std::sync::Mutex`
//! and is never held across an `.await`: commands read the database first,
//! then lock, mutate and release.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Shell Input            Command                  Cart Change            │
//! │  ───────────            ───────                  ───────────            │
//! │                                                                         │
//! │  add 7 v=2 o=4 ────────► add_to_cart() ────────► add_line / merge      │
//! │                                                                         │
//! │  qty <line> 3 ─────────► set_line_quantity() ──► refresh + set qty     │
//! │                                                                         │
//! │  rm <line> ────────────► remove_line() ────────► lines.retain(..)      │
//! │                                                                         │
//! │  discount 10 ──────────► set_discount() ───────► clamped rate          │
//! │                                                                         │
//! │  pay 250 ──────────────► complete_sale() ──────► clear on success      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use till_core::Cart;

/// Shared handle to one cart.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    /// Creates a new empty cart state.
    pub fn new() -> Self {
        Self::default()
    }

    /// A panic inside a cart closure leaves the cart consistent (every cart
    /// method validates before mutating), so a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Executes a function with read access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let totals = cart_state.with_cart(|cart| cart.totals());
    /// ```
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        f(&self.lock())
    }

    /// Executes a function with write access to the cart.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let line_id = cart_state.with_cart_mut(|cart| cart.add_line(item))?;
    /// ```
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        f(&mut self.lock())
    }
}
