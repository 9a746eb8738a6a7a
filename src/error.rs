//! Error types for the dashboard core and its vendor adapters

use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while serving one dashboard request.
///
/// None of these are fatal to a session: the controller turns each one into
/// a warning or error panel and keeps accepting input.
#[derive(Error, Debug)]
pub enum Error {
    /// The price vendor returned no rows for the requested tickers/range
    #[error("No data available for {tickers:?}. Please check the ticker symbols.")]
    NoData { tickers: Vec<String> },

    /// The returned table has no usable price field
    #[error("Stock data does not contain '{field}'.")]
    MissingField { field: String },

    /// Language-model API key not configured
    #[error("OpenAI API key is missing.")]
    Credential,

    /// An action was triggered with no tickers selected
    #[error("Please select at least one stock.")]
    EmptySelection,

    /// Ask-AI was triggered with blank text
    #[error("Please enter a question before asking AI.")]
    EmptyQuery,

    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Transport failure talking to a vendor
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Vendor answered, but not with something we can use
    #[error("Error - something went wrong when requesting [CODE: {status}]: {body}")]
    Vendor { status: u16, body: String },

    #[error("LLM API error: {0}")]
    Llm(String),
}

impl Error {
    /// Whether the dashboard should present this as a warning rather than an error.
    pub fn is_user_warning(&self) -> bool {
        matches!(self, Error::EmptySelection | Error::EmptyQuery)
    }
}
