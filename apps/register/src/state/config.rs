//! # Configuration State
//!
//! Stores register configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TILL_*`)
//! 2. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use till_core::Money;
use till_db::DEFAULT_COMMIT_TIMEOUT;
use tracing::warn;

/// Register configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Store name (printed on receipts)
    pub store_name: String,

    /// Currency symbol (for display only; amounts are always cents)
    pub currency_symbol: String,

    /// Database file. `None` means the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Upper bound on one sale commit
    #[serde(skip)]
    pub commit_timeout: Duration,
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState {
            store_name: "Till POS".to_string(),
            currency_symbol: "$".to_string(),
            db_path: None,
            commit_timeout: DEFAULT_COMMIT_TIMEOUT,
        }
    }
}

impl ConfigState {
    /// Creates a ConfigState from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `TILL_DB_PATH`: Database file path
    /// - `TILL_STORE_NAME`: Store name
    /// - `TILL_CURRENCY_SYMBOL`: Currency symbol
    /// - `TILL_COMMIT_TIMEOUT_SECS`: Sale commit timeout in whole seconds
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ConfigState::default();

        if let Some(path) = lookup("TILL_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(store_name) = lookup("TILL_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Some(symbol) = lookup("TILL_CURRENCY_SYMBOL") {
            config.currency_symbol = symbol;
        }

        if let Some(raw) = lookup("TILL_COMMIT_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.commit_timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "Ignoring invalid TILL_COMMIT_TIMEOUT_SECS"),
            }
        }

        config
    }

    /// Formats an amount with the configured currency symbol.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = ConfigState::default();
    /// assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        if amount.is_negative() {
            format!("-{}{}", self.currency_symbol, Money::from_cents(-amount.cents()))
        } else {
            format!("{}{}", self.currency_symbol, amount)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_format_currency_positive() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
        assert_eq!(config.format_currency(Money::from_cents(100)), "$1.00");
        assert_eq!(config.format_currency(Money::from_cents(1)), "$0.01");
        assert_eq!(config.format_currency(Money::zero()), "$0.00");
    }

    #[test]
    fn test_format_currency_negative() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(Money::from_cents(-1234)), "-$12.34");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ConfigState::from_lookup(lookup(&[
            ("TILL_DB_PATH", "/tmp/till.db"),
            ("TILL_STORE_NAME", "Corner Shop"),
            ("TILL_CURRENCY_SYMBOL", "€"),
            ("TILL_COMMIT_TIMEOUT_SECS", "3"),
        ]));

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/till.db")));
        assert_eq!(config.store_name, "Corner Shop");
        assert_eq!(config.format_currency(Money::from_cents(500)), "€5.00");
        assert_eq!(config.commit_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_from_lookup_ignores_bad_timeout() {
        let config = ConfigState::from_lookup(lookup(&[("TILL_COMMIT_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.commit_timeout, DEFAULT_COMMIT_TIMEOUT);
        assert!(config.db_path.is_none());

        let zero = ConfigState::from_lookup(lookup(&[("TILL_COMMIT_TIMEOUT_SECS", "0")]));
        assert_eq!(zero.commit_timeout, DEFAULT_COMMIT_TIMEOUT);
    }
}
