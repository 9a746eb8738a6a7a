//! # Stock AI Dashboard
//!
//! Pick tickers, chart their prices or cumulative returns, and ask a
//! language model for a performance summary, a risk/opportunity analysis or
//! an answer to a free-form question.
//!
//! The numeric core is small: [`normalize::normalize`] reduces a vendor
//! download to one close-price column per ticker, and
//! [`returns::cumulative_returns`] turns that into compounded returns.
//! Everything else is boundary: the Yahoo chart adapter, the OpenAI client,
//! prompt templates and the session controller.

pub mod command;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod frame;
pub mod llm;
pub mod normalize;
pub mod prompts;
pub mod provider;
pub mod render;
pub mod returns;
pub mod summary;

pub use config::Settings;
pub use dashboard::{ChartKind, DashboardController, Metric, Panel, SessionState};
pub use error::{Error, Result};
pub use frame::{PriceTable, RawPriceTable, ReturnTable};
pub use llm::{LlmClient, OpenAiClient};
pub use provider::{PriceProvider, PriceRequest, YahooProvider};
