//! Runtime settings shared by the controller and the vendor adapters

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::time::Duration;

pub const DEFAULT_PRICE_API_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Assets offered in the picker, sorted
pub static ASSET_UNIVERSE: Lazy<Vec<String>> = Lazy::new(|| {
    let mut assets: Vec<String> = [
        "DOW", "NVDA", "TSL", "GOOGL", "AMZN", "AI", "NIO", "LCID", "F", "LYFY", "AAPL", "MSFT",
        "BTC-USD", "ETH-USD",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assets.sort();
    assets
});

/// Default start of the date range picker
pub fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

/// Default end of the date range picker
pub fn default_end() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model: String,
    pub price_api_url: String,
    pub http_timeout: Duration,
    /// Ask the vendor for split/dividend-adjusted prices
    pub auto_adjust: bool,
    pub chart_width: u16,
    pub chart_height: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            price_api_url: DEFAULT_PRICE_API_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            auto_adjust: true,
            chart_width: 100,
            chart_height: 20,
        }
    }
}
