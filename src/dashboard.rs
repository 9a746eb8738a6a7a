//! Session state and the controller that turns user actions into panels
//!
//! Every action runs to completion: fetch → normalize → (returns) → panels.
//! Failures never leave this module as errors; they become warning or error
//! panels and the session stays usable.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::config::{default_end, default_start, Settings, ASSET_UNIVERSE};
use crate::error::{Error, Result};
use crate::frame::{Frame, PriceTable, RawPriceTable, ReturnTable, Series};
use crate::llm::LlmClient;
use crate::normalize::{normalize, unresolved};
use crate::prompts::{performance_prompt, question_prompt, risk_prompt, SYSTEM_PROMPT};
use crate::provider::{PriceProvider, PriceRequest};
use crate::returns::cumulative_returns;
use crate::summary::{summarize, summary_text};

/// Rows shown in the download preview
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Close price as downloaded
    #[default]
    Price,
    /// Cumulative return since the first price
    RelativeReturns,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Price => write!(f, "Adj. Close"),
            Metric::RelativeReturns => write!(f, "Relative Returns"),
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "price" | "close" | "adj-close" => Ok(Metric::Price),
            "returns" | "relative" | "relative-returns" => Ok(Metric::RelativeReturns),
            other => Err(format!("unknown metric '{other}' (expected price or returns)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Area,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Line => write!(f, "Line Chart"),
            ChartKind::Area => write!(f, "Area Chart"),
        }
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" => Ok(ChartKind::Line),
            "area" => Ok(ChartKind::Area),
            other => Err(format!("unknown chart '{other}' (expected line or area)")),
        }
    }
}

/// One ask-AI round trip
#[derive(Debug, Clone, PartialEq)]
pub struct ChatExchange {
    pub query: String,
    pub response: String,
}

/// Everything the user has chosen in this session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub tickers: Vec<String>,
    pub metric: Metric,
    pub charts: Vec<ChartKind>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    chat_history: Vec<ChatExchange>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            tickers: Vec::new(),
            metric: Metric::default(),
            charts: Vec::new(),
            start: default_start(),
            end: default_end(),
            chat_history: Vec::new(),
        }
    }
}

impl SessionState {
    /// Oldest first; only ever appended to
    pub fn chat_history(&self) -> &[ChatExchange] {
        &self.chat_history
    }

    fn record(&mut self, query: String, response: String) {
        self.chat_history.push(ChatExchange { query, response });
    }
}

/// Something for the front end to show
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Info(String),
    Warning(String),
    Error(String),
    /// First rows of the raw download
    Preview { title: String, table: PriceTable },
    Chart {
        title: String,
        kind: ChartKind,
        table: PriceTable,
    },
    Insight { title: String, body: String },
}

impl From<&Error> for Panel {
    fn from(err: &Error) -> Self {
        if err.is_user_warning() {
            Panel::Warning(format!("⚠️ {err}"))
        } else {
            Panel::Error(err.to_string())
        }
    }
}

/// Returns drawn on the same axes as prices
fn plottable(returns: ReturnTable) -> PriceTable {
    Frame::new(
        returns.dates,
        returns
            .columns
            .into_iter()
            .map(|c| Series::new(c.name, c.values.into_iter().map(Some).collect()))
            .collect(),
    )
}

pub struct DashboardController {
    settings: Settings,
    session: SessionState,
    prices: Box<dyn PriceProvider>,
    llm: Box<dyn LlmClient>,
}

impl DashboardController {
    pub fn new(settings: Settings, prices: Box<dyn PriceProvider>, llm: Box<dyn LlmClient>) -> Self {
        Self::with_session(settings, SessionState::default(), prices, llm)
    }

    pub fn with_session(
        settings: Settings,
        session: SessionState,
        prices: Box<dyn PriceProvider>,
        llm: Box<dyn LlmClient>,
    ) -> Self {
        Self {
            settings,
            session,
            prices,
            llm,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ---- Widget changes ----

    /// Replace the selection. Symbols outside the asset universe are refused.
    pub fn select_tickers(&mut self, tickers: Vec<String>) -> Vec<Panel> {
        let (known, unknown): (Vec<String>, Vec<String>) =
            tickers.into_iter().partition(|t| ASSET_UNIVERSE.contains(t));

        let mut selection: Vec<String> = Vec::with_capacity(known.len());
        for ticker in known {
            if !selection.contains(&ticker) {
                selection.push(ticker);
            }
        }
        self.session.tickers = selection;

        if unknown.is_empty() {
            Vec::new()
        } else {
            vec![Panel::Warning(format!(
                "Not in the asset list, ignored: {}",
                unknown.join(", ")
            ))]
        }
    }

    pub fn add_ticker(&mut self, ticker: String) -> Vec<Panel> {
        let mut tickers = self.session.tickers.clone();
        tickers.push(ticker);
        self.select_tickers(tickers)
    }

    pub fn remove_ticker(&mut self, ticker: &str) {
        self.session.tickers.retain(|t| t != ticker);
    }

    pub fn set_metric(&mut self, metric: Metric) {
        self.session.metric = metric;
    }

    pub fn set_charts(&mut self, charts: Vec<ChartKind>) {
        let mut picked = Vec::with_capacity(charts.len());
        for kind in charts {
            if !picked.contains(&kind) {
                picked.push(kind);
            }
        }
        self.session.charts = picked;
    }

    pub fn set_start(&mut self, start: NaiveDate) {
        self.session.start = start;
    }

    pub fn set_end(&mut self, end: NaiveDate) {
        self.session.end = end;
    }

    // ---- Views ----

    fn require_selection(&self) -> Result<&[String]> {
        if self.session.tickers.is_empty() {
            return Err(Error::EmptySelection);
        }
        Ok(&self.session.tickers)
    }

    async fn download(&self) -> Result<RawPriceTable> {
        let request = PriceRequest::new(
            self.require_selection()?.to_vec(),
            self.session.start,
            self.session.end,
            self.settings.auto_adjust,
        )?;
        let raw = self.prices.download(&request).await?;
        if raw.is_empty() {
            return Err(Error::NoData {
                tickers: request.tickers,
            });
        }
        Ok(raw)
    }

    /// Main view: preview, then one chart per selected chart kind
    pub async fn render(&self) -> Vec<Panel> {
        match self.try_render().await {
            Ok(panels) => panels,
            Err(err) => {
                if !err.is_user_warning() {
                    warn!("render failed: {}", err);
                }
                vec![Panel::from(&err)]
            }
        }
    }

    async fn try_render(&self) -> Result<Vec<Panel>> {
        let raw = self.download().await?;
        let tickers = &self.session.tickers;

        let mut panels = vec![Panel::Preview {
            title: "Downloaded Data Preview:".to_string(),
            table: raw.preview(PREVIEW_ROWS),
        }];

        let prices = normalize(&raw, tickers)?;
        // an untagged flat table is named by its field, not a ticker
        let named_by_ticker = !matches!(raw, RawPriceTable::Flat { symbol: None, .. });
        let missing = unresolved(tickers, &prices);
        if named_by_ticker && !missing.is_empty() {
            panels.push(Panel::Warning(format!(
                "No data returned for: {}",
                missing.join(", ")
            )));
        }

        let table = match self.session.metric {
            Metric::Price => prices,
            Metric::RelativeReturns => plottable(cumulative_returns(&prices)),
        };

        if !self.session.charts.is_empty() {
            let title = format!(
                "Data Visualizations for {} of {:?}",
                self.session.metric, tickers
            );
            panels.push(Panel::Info(title));
            for kind in &self.session.charts {
                panels.push(Panel::Chart {
                    title: kind.to_string(),
                    kind: *kind,
                    table: table.clone(),
                });
            }
        }

        Ok(panels)
    }

    // ---- Insight actions ----

    async fn insight(&self, title: &str, prompt: Result<String>) -> Panel {
        let answer = match prompt {
            Ok(prompt) => self.llm.complete(SYSTEM_PROMPT, &prompt).await,
            Err(err) => Err(err),
        };
        match answer {
            Ok(body) => Panel::Insight {
                title: title.to_string(),
                body,
            },
            Err(err) => {
                if !err.is_user_warning() {
                    warn!("{} failed: {}", title, err);
                }
                Panel::from(&err)
            }
        }
    }

    async fn performance_prompt(&self) -> Result<String> {
        let raw = self.download().await?;
        let prices = normalize(&raw, &self.session.tickers)?;
        let summaries = summarize(&prices);
        Ok(performance_prompt(&summary_text(
            &self.session.tickers,
            &summaries,
        )))
    }

    pub async fn performance_summary(&self) -> Panel {
        info!("performance summary for {:?}", self.session.tickers);
        let prompt = self.performance_prompt().await;
        self.insight("AI Performance Summary", prompt).await
    }

    pub async fn risks_and_opportunities(&self) -> Panel {
        info!("risk analysis for {:?}", self.session.tickers);
        let prompt = self.require_selection().map(risk_prompt);
        self.insight("AI Risks & Opportunities", prompt).await
    }

    /// Free-form question about the selection; successful answers are kept
    /// in the chat history.
    pub async fn ask(&mut self, query: &str) -> Panel {
        let query = query.trim();
        let prompt = self.require_selection().and_then(|tickers| {
            if query.is_empty() {
                Err(Error::EmptyQuery)
            } else {
                Ok(question_prompt(tickers, query))
            }
        });

        let panel = self.insight("AI Response", prompt).await;
        if let Panel::Insight { body, .. } = &panel {
            self.session.record(query.to_string(), body.clone());
        }
        panel
    }
}
