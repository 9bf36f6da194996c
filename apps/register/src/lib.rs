//! # Till Register Library
//!
//! The cashier-facing layer of Till POS: session state, command functions
//! and the terminal shell.
//!
//! ## Module Organization
//! ```text
//! till_register/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── cart.rs     ◄─── Cart behind a mutex
//! │   ├── session.rs  ◄─── Cashier session + its cart
//! │   └── config.rs   ◄─── Configuration state
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── product.rs  ◄─── Catalog commands
//! │   ├── cart.rs     ◄─── Cart manipulation commands
//! │   ├── sale.rs     ◄─── Sale commit and history commands
//! │   └── config.rs   ◄─── Configuration command
//! ├── shell.rs        ◄─── Terminal front end
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod shell;
pub mod state;

use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shell::Shell;
use state::{ConfigState, DbState, SessionState};
use till_db::{Database, DbConfig};

/// Runs the register on stdin/stdout.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Register Startup                                  │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter (stderr)                       │
/// │     • Default: info,till=debug,sqlx=warn; override with RUST_LOG        │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • TILL_* environment variables over defaults                        │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode                                              │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  4. Initialize State Objects ─────────────────────────────────────────► │
/// │     • DbState, SessionState (no cashier yet), ConfigState               │
/// │                                                                         │
/// │  5. Run Shell until quit or end of input                                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Till POS register");

    let config = ConfigState::from_env();
    let db_path = get_database_path(&config)?;
    info!(?db_path, "Database path determined");

    let db = Database::new(DbConfig::new(db_path).commit_timeout(config.commit_timeout)).await?;
    info!("Database connected and migrations applied");

    let shell = Shell::new(DbState::new(db.clone()), SessionState::new(), config);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    shell.run(stdin, tokio::io::stdout()).await?;

    db.close().await;
    info!("Register closed");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so they never interleave with shell output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=till=trace` - Show trace for till crates only
/// - Default: `info,till=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,till=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines the database file path.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.till.pos/till.db`
/// - **Windows**: `%APPDATA%\till\pos\data\till.db`
/// - **Linux**: `~/.local/share/pos/till.db`
///
/// ## Override
/// `TILL_DB_PATH` (already folded into `config.db_path`).
fn get_database_path(config: &ConfigState) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = &config.db_path {
        return Ok(path.clone());
    }

    let proj_dirs =
        ProjectDirs::from("com", "till", "pos").ok_or("Could not determine app data directory")?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("till.db"))
}
