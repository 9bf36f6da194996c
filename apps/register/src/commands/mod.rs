//! # Commands Module
//!
//! The register's API. Every command takes the state it needs and returns
//! `Result<T, ApiError>`; the terminal shell is one caller, a GUI front end
//! would be another.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── product.rs  ◄─── Catalog listing and product detail
//! ├── cart.rs     ◄─── Cart manipulation and totals
//! ├── sale.rs     ◄─── Sale commit and history
//! └── config.rs   ◄─── Configuration retrieval
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs database
//! async fn list_products(db: &DbState, limit: Option<u32>)
//!
//! // Only needs the session
//! fn get_totals(session: &SessionState)
//!
//! // Needs both
//! async fn add_to_cart(db: &DbState, session: &SessionState, request: SelectionRequest)
//! ```

pub mod cart;
pub mod config;
pub mod product;
pub mod sale;

#[cfg(test)]
pub(crate) mod test_support {
    use till_core::{ModifierMode, Money, ProductId};
    use till_db::{Database, DbConfig};

    use crate::state::{DbState, SessionState};

    /// Ids of the fixture catalog.
    pub struct Fixture {
        pub lamp: ProductId,
        pub warm_bulb: i64,
        pub latte: ProductId,
        pub small: i64,
        pub large: i64,
    }

    /// In-memory database with a desk lamp (100.00, stock 10, required
    /// "Bulb" group with a 15.00 option) and a latte sold by size.
    pub async fn setup() -> (DbState, SessionState, Fixture) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let lamp = catalog
            .insert_product("Desk Lamp", Money::from_cents(10000), 10)
            .await
            .unwrap();
        let bulb = catalog
            .insert_modifier_group(lamp, "Bulb", ModifierMode::Single, true)
            .await
            .unwrap();
        let warm_bulb = catalog
            .insert_modifier_option(bulb, "Warm LED", Money::from_cents(1500))
            .await
            .unwrap();

        let latte = catalog
            .insert_product("Latte", Money::from_cents(400), 0)
            .await
            .unwrap();
        let small = catalog
            .insert_variant(latte, "Small", Money::from_cents(400), 2)
            .await
            .unwrap();
        let large = catalog
            .insert_variant(latte, "Large", Money::from_cents(550), 5)
            .await
            .unwrap();

        let session = SessionState::new();
        session.login("ana@shop.test").unwrap();

        (
            DbState::new(db),
            session,
            Fixture {
                lamp,
                warm_bulb,
                latte,
                small,
                large,
            },
        )
    }
}
