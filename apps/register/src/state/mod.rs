//! # State Module
//!
//! Register state, split by concern the same way commands consume it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────────┐  ┌──────────────────┐       │
//! │  │   DbState    │  │    SessionState      │  │   ConfigState    │       │
//! │  │              │  │                      │  │                  │       │
//! │  │  Database    │  │  cashier (Option)    │  │  store_name      │       │
//! │  │  (pool +     │  │  CartState           │  │  currency_symbol │       │
//! │  │   gate)      │  │  (Arc<Mutex<Cart>>)  │  │  commit_timeout  │       │
//! │  └──────────────┘  └──────────────────────┘  └──────────────────┘       │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: pool and commit gate are internally synchronised           │
//! │  • SessionState: std Mutex, never held across .await                   │
//! │  • ConfigState: read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;
mod db;
mod session;

pub use cart::CartState;
pub use config::ConfigState;
pub use db::DbState;
pub use session::SessionState;
