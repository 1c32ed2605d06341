//! # Shell Configuration
//!
//! Display settings for the shell. Storage settings live in
//! `satchel_persist::PersistConfig`.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command-line flags (`--kind`)
//! 2. Environment variables (`SATCHEL_CURRENCY`, `SATCHEL_CART_KIND`)
//! 3. Defaults (this file)

use serde::{Deserialize, Serialize};

use satchel_core::{CartKind, Money};

use crate::error::{CliError, CliResult};

/// Application configuration of the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places of the minor unit
    pub currency_decimals: u8,

    /// Cart engine used when `--kind` is not given
    pub default_kind: CartKind,
}

impl Default for AppConfig {
    /// Rupiah, whole units, marketplace cart.
    fn default() -> Self {
        AppConfig {
            currency_code: "IDR".to_string(),
            currency_symbol: "Rp".to_string(),
            currency_decimals: 0,
            default_kind: CartKind::Marketplace,
        }
    }
}

impl AppConfig {
    /// Creates an AppConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `SATCHEL_CURRENCY`: currency code, e.g. `USD`
    /// - `SATCHEL_CART_KIND`: `marketplace` or `food`
    pub fn from_env() -> CliResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CliResult<Self> {
        let mut config = AppConfig::default();

        if let Some(code) = lookup("SATCHEL_CURRENCY") {
            config.set_currency(&code)?;
        }

        if let Some(kind) = lookup("SATCHEL_CART_KIND") {
            config.default_kind = kind.parse().map_err(|e| CliError::InvalidSetting {
                name: "SATCHEL_CART_KIND",
                reason: format!("{e}"),
            })?;
        }

        Ok(config)
    }

    /// Switches currency by ISO code. Known codes get their symbol and
    /// decimals; other codes print as `"XYZ "` with two decimals.
    pub fn set_currency(&mut self, code: &str) -> CliResult<()> {
        let code = code.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CliError::InvalidSetting {
                name: "SATCHEL_CURRENCY",
                reason: format!("'{code}' is not a 3-letter currency code"),
            });
        }

        let (symbol, decimals) = match code.as_str() {
            "IDR" => ("Rp".to_string(), 0),
            "USD" => ("$".to_string(), 2),
            "EUR" => ("€".to_string(), 2),
            "JPY" => ("¥".to_string(), 0),
            other => (format!("{other} "), 2),
        };

        self.currency_code = code;
        self.currency_symbol = symbol;
        self.currency_decimals = decimals;
        Ok(())
    }

    /// Formats a minor-unit amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = AppConfig::default();
    /// assert_eq!(config.format_currency(Money::from_minor(25_000)), "Rp25000");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let minor = amount.minor();
        let divisor = 10_i64.pow(self.currency_decimals as u32);
        let whole = minor / divisor;
        let frac = (minor % divisor).abs();

        format!(
            "{}{}{}",
            if minor < 0 { "-" } else { "" },
            self.currency_symbol,
            if self.currency_decimals > 0 {
                format!(
                    "{}.{:0width$}",
                    whole.abs(),
                    frac,
                    width = self.currency_decimals as usize
                )
            } else {
                whole.abs().to_string()
            }
        )
    }
}
