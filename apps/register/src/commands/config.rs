//! # Config Commands

use tracing::debug;

use crate::state::ConfigState;

/// Gets the register configuration (read-only).
///
/// ## When Used
/// - Shell banner (store name)
/// - Currency formatting on receipts
pub fn get_config(config: &ConfigState) -> ConfigState {
    debug!("get_config command");
    config.clone()
}
