//! Display formatting for estimated prices

/// Default currency prefix
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Round to two decimals and prefix the currency symbol, e.g. "$482.17"
pub fn format_price(amount: f64, currency_symbol: &str) -> String {
    format!("{}{:.2}", currency_symbol, amount)
}
