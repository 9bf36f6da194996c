//! # Till Register Entry Point
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Register                                │
//! │                                                                         │
//! │  stdin ──► shell.rs ──► commands/ ──► till-core (rules)                 │
//! │                              │                                          │
//! │                              └──────► till-db ──► SQLite (WAL)          │
//! │                                                                         │
//! │  stdout ◄── rendered carts, receipts, errors                            │
//! │  stderr ◄── tracing                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load configuration from `TILL_*` variables
//! 3. Connect to database & run migrations
//! 4. Create state objects (DbState, SessionState, ConfigState)
//! 5. Read commands until `quit`

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The actual setup is in lib.rs for better testability
    till_register::run().await
}
