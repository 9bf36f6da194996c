//! # Database State
//!
//! Wraps the `Database` handle for use in commands.
//!
//! ## Thread Safety
//! `Database` holds a `SqlitePool` and the commit gate, both shareable.
//! Catalog reads run concurrently; sale commits serialise on the gate
//! inside `till-db`, not here.

use till_db::Database;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let listing = db_state.inner().catalog().load_listing(7).await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
