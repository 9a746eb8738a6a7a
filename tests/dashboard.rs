//! End-to-end controller behaviour against in-memory vendors

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};

use stock_ai_dashboard::frame::{FieldFrame, FieldSeries, Frame, Series};
use stock_ai_dashboard::prompts::SYSTEM_PROMPT;
use stock_ai_dashboard::{
    ChartKind, DashboardController, Error, LlmClient, Metric, Panel, PriceProvider, PriceRequest,
    RawPriceTable, Result, SessionState, Settings,
};

fn ymd(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
}

/// Serves a fixed two-ticker table, restricted to whatever was requested
struct StaticPrices {
    requests: Arc<Mutex<Vec<PriceRequest>>>,
}

#[async_trait]
impl PriceProvider for StaticPrices {
    async fn download(&self, request: &PriceRequest) -> Result<RawPriceTable> {
        self.requests.lock().unwrap().push(request.clone());

        let universe = [("AAPL", [100.0, 110.0, 150.0]), ("MSFT", [200.0, 180.0, 190.0])];
        let known: Vec<_> = universe
            .iter()
            .filter(|(t, _)| request.tickers.iter().any(|r| r == t))
            .collect();
        if known.is_empty() {
            return Ok(RawPriceTable::FieldByTicker(FieldFrame::default()));
        }

        let mut columns = Vec::new();
        for field in ["Open", "Close"] {
            for (ticker, closes) in &known {
                let offset = if field == "Open" { -1.0 } else { 0.0 };
                columns.push(FieldSeries {
                    field: field.to_string(),
                    ticker: ticker.to_string(),
                    values: closes.iter().map(|c| Some(c + offset)).collect(),
                });
            }
        }
        Ok(RawPriceTable::FieldByTicker(FieldFrame {
            dates: vec![ymd(3), ymd(4), ymd(5)],
            columns,
        }))
    }
}

/// A stock next to a coin: the stock has holes on the weekend rows
struct WeekendGaps;

#[async_trait]
impl PriceProvider for WeekendGaps {
    async fn download(&self, _request: &PriceRequest) -> Result<RawPriceTable> {
        let field = |ticker: &str, values: Vec<Option<f64>>| FieldSeries {
            field: "Close".to_string(),
            ticker: ticker.to_string(),
            values,
        };
        Ok(RawPriceTable::FieldByTicker(FieldFrame {
            dates: (6..=9).map(ymd).collect(),
            columns: vec![
                field("AAPL", vec![Some(100.0), None, None, Some(120.0)]),
                field("BTC-USD", vec![Some(20.0), Some(21.0), Some(22.0), Some(23.0)]),
            ],
        }))
    }
}

/// Only ever offers a volume column
struct VolumeOnly;

#[async_trait]
impl PriceProvider for VolumeOnly {
    async fn download(&self, _request: &PriceRequest) -> Result<RawPriceTable> {
        Ok(RawPriceTable::Flat {
            symbol: None,
            frame: Frame::new(vec![ymd(3)], vec![Series::new("Volume", vec![Some(1e6)])]),
        })
    }
}

struct EchoLlm {
    prompts: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl LlmClient for EchoLlm {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        Ok(format!("answer #{}", self.prompts.lock().unwrap().len()))
    }
}

struct NoKeyLlm;

#[async_trait]
impl LlmClient for NoKeyLlm {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        Err(Error::Credential)
    }
}

struct Harness {
    controller: DashboardController,
    requests: Arc<Mutex<Vec<PriceRequest>>>,
    prompts: Arc<Mutex<Vec<(String, String)>>>,
}

fn harness() -> Harness {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let controller = DashboardController::new(
        Settings::default(),
        Box::new(StaticPrices { requests: requests.clone() }),
        Box::new(EchoLlm { prompts: prompts.clone() }),
    );
    Harness {
        controller,
        requests,
        prompts,
    }
}

fn tickers(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_render_without_selection_warns() {
    let h = harness();
    let panels = h.controller.render().await;

    assert_eq!(panels.len(), 1);
    assert!(matches!(&panels[0], Panel::Warning(msg) if msg.contains("Please select at least one stock")));
    assert!(h.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_render_price_charts() {
    let mut h = harness();
    assert!(h.controller.select_tickers(tickers(&["AAPL", "MSFT"])).is_empty());
    h.controller.set_charts(vec![ChartKind::Line, ChartKind::Area, ChartKind::Line]);
    h.controller.set_start(ymd(1));
    h.controller.set_end(ymd(10));

    let panels = h.controller.render().await;

    assert!(matches!(&panels[0], Panel::Preview { table, .. } if table.columns.len() == 4));
    assert_eq!(
        panels[1],
        Panel::Info(r#"Data Visualizations for Adj. Close of ["AAPL", "MSFT"]"#.to_string())
    );

    let charts: Vec<_> = panels
        .iter()
        .filter_map(|p| match p {
            Panel::Chart { kind, table, .. } => Some((*kind, table.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(charts.len(), 2);
    assert_eq!(charts[0].0, ChartKind::Line);
    assert_eq!(charts[1].0, ChartKind::Area);
    assert_eq!(
        charts[0].1.column("AAPL").unwrap().values,
        vec![Some(100.0), Some(110.0), Some(150.0)]
    );

    let requests = h.requests.lock().unwrap();
    assert_eq!(requests[0].start, ymd(1));
    assert_eq!(requests[0].end, ymd(10));
    assert!(requests[0].auto_adjust);
}

#[tokio::test]
async fn test_render_relative_returns() {
    let mut h = harness();
    h.controller.select_tickers(tickers(&["AAPL"]));
    h.controller.set_metric(Metric::RelativeReturns);
    h.controller.set_charts(vec![ChartKind::Line]);

    let panels = h.controller.render().await;
    let Some(Panel::Chart { table, .. }) = panels.iter().find(|p| matches!(p, Panel::Chart { .. })) else {
        panic!("no chart in {panels:?}");
    };

    let values: Vec<f64> = table.columns[0].values.iter().map(|v| v.unwrap()).collect();
    approx::assert_abs_diff_eq!(values[0], 0.0);
    approx::assert_abs_diff_eq!(values[1], 0.10, epsilon = 1e-12);
    approx::assert_abs_diff_eq!(values[2], 0.50, epsilon = 1e-12);
}

#[tokio::test]
async fn test_no_charts_selected_shows_only_preview() {
    let mut h = harness();
    h.controller.select_tickers(tickers(&["MSFT"]));

    let panels = h.controller.render().await;
    assert_eq!(panels.len(), 1);
    assert!(matches!(panels[0], Panel::Preview { .. }));
}

#[tokio::test]
async fn test_unknown_symbols_are_refused() {
    let mut h = harness();
    let panels = h.controller.select_tickers(tickers(&["AAPL", "NOPE", "AAPL"]));

    assert_eq!(h.controller.session().tickers, tickers(&["AAPL"]));
    assert!(matches!(&panels[0], Panel::Warning(msg) if msg.contains("NOPE")));
}

#[tokio::test]
async fn test_unresolved_ticker_is_reported() {
    // DOW is pickable but the static vendor does not know it
    let mut h = harness();
    h.controller.select_tickers(tickers(&["AAPL", "DOW"]));

    let panels = h.controller.render().await;
    assert!(panels
        .iter()
        .any(|p| matches!(p, Panel::Warning(msg) if msg == "No data returned for: DOW")));
}

#[tokio::test]
async fn test_vendor_with_nothing_is_no_data_error() {
    let mut h = harness();
    h.controller.select_tickers(tickers(&["NIO"]));

    let panels = h.controller.render().await;
    assert_eq!(
        panels,
        vec![Panel::Error(
            r#"No data available for ["NIO"]. Please check the ticker symbols."#.to_string()
        )]
    );
}

#[tokio::test]
async fn test_missing_close_is_error_panel() {
    let mut controller = DashboardController::new(
        Settings::default(),
        Box::new(VolumeOnly),
        Box::new(NoKeyLlm),
    );
    controller.select_tickers(tickers(&["F"]));

    let panels = controller.render().await;
    assert!(panels.contains(&Panel::Error("Stock data does not contain 'Close'.".to_string())));
}

#[tokio::test]
async fn test_inverted_range_is_reported() {
    let mut h = harness();
    h.controller.select_tickers(tickers(&["AAPL"]));
    h.controller.set_start(ymd(20));
    h.controller.set_end(ymd(2));

    let panels = h.controller.render().await;
    assert!(matches!(&panels[0], Panel::Error(msg) if msg.contains("after end date")));
    assert!(h.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_performance_summary_prompt() {
    let mut h = harness();
    h.controller.select_tickers(tickers(&["AAPL", "MSFT"]));

    let panel = h.controller.performance_summary().await;
    assert_eq!(
        panel,
        Panel::Insight {
            title: "AI Performance Summary".to_string(),
            body: "answer #1".to_string()
        }
    );

    let prompts = h.prompts.lock().unwrap();
    let (system, user) = &prompts[0];
    assert_eq!(system, SYSTEM_PROMPT);
    assert!(user.contains("Stock Performance Summary for AAPL, MSFT:"));
    assert!(user.contains("- AAPL: $150.00 (Change: 50.00%)"));
    assert!(user.contains("- MSFT: $190.00 (Change: -5.00%)"));
}

#[tokio::test]
async fn test_risks_need_selection() {
    let h = harness();
    let panel = h.controller.risks_and_opportunities().await;

    assert!(matches!(panel, Panel::Warning(_)));
    assert!(h.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_risks_prompt_lists_tickers() {
    let mut h = harness();
    h.controller.select_tickers(tickers(&["NVDA", "BTC-USD"]));

    let panel = h.controller.risks_and_opportunities().await;
    assert!(matches!(panel, Panel::Insight { ref title, .. } if title == "AI Risks & Opportunities"));
    assert!(h.prompts.lock().unwrap()[0]
        .1
        .contains("following stocks: NVDA, BTC-USD."));
}

#[tokio::test]
async fn test_ask_appends_history() {
    let mut h = harness();
    h.controller.select_tickers(tickers(&["AAPL"]));

    h.controller.ask("Is it overvalued?").await;
    h.controller.ask("  And next year?  ").await;

    let history = h.controller.session().chat_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].query, "Is it overvalued?");
    assert_eq!(history[0].response, "answer #1");
    assert_eq!(history[1].query, "And next year?");

    let prompts = h.prompts.lock().unwrap();
    assert_eq!(prompts[0].1, "Stocks: AAPL\nUser Query: Is it overvalued?");
}

#[tokio::test]
async fn test_ask_validation_order() {
    let mut h = harness();

    let no_selection = h.controller.ask("hello").await;
    assert!(matches!(no_selection, Panel::Warning(ref m) if m.contains("select at least one stock")));

    h.controller.select_tickers(tickers(&["AAPL"]));
    let blank = h.controller.ask("   ").await;
    assert!(matches!(blank, Panel::Warning(ref m) if m.contains("enter a question")));

    assert!(h.controller.session().chat_history().is_empty());
    assert!(h.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_key_keeps_session_alive() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let mut controller = DashboardController::new(
        Settings::default(),
        Box::new(StaticPrices { requests }),
        Box::new(NoKeyLlm),
    );
    controller.select_tickers(tickers(&["AAPL"]));

    let panel = controller.ask("anything").await;
    assert_eq!(panel, Panel::Error("OpenAI API key is missing.".to_string()));
    assert!(controller.session().chat_history().is_empty());

    // still usable afterwards
    controller.set_charts(vec![ChartKind::Area]);
    let panels = controller.render().await;
    assert!(panels.iter().any(|p| matches!(p, Panel::Chart { .. })));
}

#[tokio::test]
async fn test_returns_span_weekend_gaps() {
    let mut controller = DashboardController::new(
        Settings::default(),
        Box::new(WeekendGaps),
        Box::new(NoKeyLlm),
    );
    controller.select_tickers(tickers(&["AAPL", "BTC-USD"]));
    controller.set_metric(Metric::RelativeReturns);
    controller.set_charts(vec![ChartKind::Line]);

    let panels = controller.render().await;
    let Some(Panel::Chart { table, .. }) = panels.iter().find(|p| matches!(p, Panel::Chart { .. })) else {
        panic!("no chart in {panels:?}");
    };

    let aapl: Vec<f64> = table.column("AAPL").unwrap().values.iter().map(|v| v.unwrap()).collect();
    approx::assert_abs_diff_eq!(aapl[1], 0.0);
    approx::assert_abs_diff_eq!(aapl[3], 0.20, epsilon = 1e-12);
}

#[tokio::test]
async fn test_seeded_session_is_used() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let prompts = Arc::new(Mutex::new(Vec::new()));

    let mut session = SessionState::default();
    session.tickers = tickers(&["MSFT"]);
    session.metric = Metric::RelativeReturns;
    session.charts = vec![ChartKind::Area];
    session.start = ymd(2);
    session.end = ymd(9);

    let mut controller = DashboardController::with_session(
        Settings::default(),
        session,
        Box::new(StaticPrices { requests: requests.clone() }),
        Box::new(EchoLlm { prompts: prompts.clone() }),
    );

    let panels = controller.render().await;
    assert!(panels.contains(&Panel::Info(
        r#"Data Visualizations for Relative Returns of ["MSFT"]"#.to_string()
    )));
    assert!(panels
        .iter()
        .any(|p| matches!(p, Panel::Chart { kind: ChartKind::Area, .. })));
    {
        let requests = requests.lock().unwrap();
        assert_eq!(requests[0].tickers, tickers(&["MSFT"]));
        assert_eq!(requests[0].start, ymd(2));
        assert_eq!(requests[0].end, ymd(9));
    }

    controller.ask("Why the dip?").await;
    assert_eq!(prompts.lock().unwrap()[0].1, "Stocks: MSFT\nUser Query: Why the dip?");
    assert_eq!(controller.session().chat_history().len(), 1);
}
