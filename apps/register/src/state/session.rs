//! # Session State
//!
//! Who is at the till, and their cart.
//!
//! A session starts at `login` and ends at `logout`. The cashier identity is
//! handed to the sale commit from here; nothing else in the process knows
//! who is logged in.

use std::sync::{Arc, Mutex};

use till_core::CashierSession;
use tracing::info;

use super::CartState;
use crate::error::ApiError;

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    cashier: Arc<Mutex<Option<CashierSession>>>,
    cart: CartState,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session for `cashier` with an empty cart.
    ///
    /// A previous session's cart is discarded.
    pub fn login(&self, cashier: &str) -> Result<CashierSession, ApiError> {
        let session = CashierSession::open(cashier)?;
        self.cart.with_cart_mut(|c| c.clear());
        *self.slot() = Some(session.clone());
        info!(cashier = %session.cashier, "Cashier logged in");
        Ok(session)
    }

    /// Ends the session and drops its cart. Returns the closed session, if
    /// any.
    pub fn logout(&self) -> Option<CashierSession> {
        let closed = self.slot().take();
        self.cart.with_cart_mut(|c| c.clear());
        if let Some(session) = &closed {
            info!(cashier = %session.cashier, "Cashier logged out");
        }
        closed
    }

    /// The open session, or an error if nobody is logged in.
    pub fn current(&self) -> Result<CashierSession, ApiError> {
        self.slot().clone().ok_or_else(ApiError::no_session)
    }

    pub fn is_open(&self) -> bool {
        self.slot().is_some()
    }

    /// The session's cart.
    pub fn cart(&self) -> &CartState {
        &self.cart
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<CashierSession>> {
        self.cashier.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
