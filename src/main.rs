use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use stock_ai_dashboard::command::{parse_tickers, Command, HELP};
use stock_ai_dashboard::config::{
    default_end, default_start, ASSET_UNIVERSE, DEFAULT_MODEL, DEFAULT_OPENAI_URL,
    DEFAULT_PRICE_API_URL, DEFAULT_TIMEOUT_SECS,
};
use stock_ai_dashboard::render::render_panel;
use stock_ai_dashboard::{
    ChartKind, DashboardController, Metric, OpenAiClient, Panel, Settings, YahooProvider,
};

#[derive(Parser)]
#[command(name = "stock_ai_dashboard")]
#[command(about = "Stock Price AI Bot: visualizations & AI insights for stocks", long_about = None)]
struct Cli {
    /// Initial selection, e.g. "AAPL,MSFT"
    #[arg(short, long, default_value = "")]
    tickers: String,

    /// price or returns
    #[arg(short, long, default_value = "price")]
    metric: Metric,

    /// Charts to draw (repeatable): line, area
    #[arg(short, long = "chart")]
    charts: Vec<ChartKind>,

    /// First day of the range
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of the range (exclusive)
    #[arg(long)]
    end: Option<NaiveDate>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_URL)]
    openai_base_url: String,

    #[arg(long, env = "PRICE_API_BASE_URL", default_value = DEFAULT_PRICE_API_URL)]
    price_api_url: String,

    /// Per-request timeout for both vendors
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Download unadjusted prices
    #[arg(long)]
    no_adjust: bool,

    #[arg(long, default_value_t = 100)]
    chart_width: u16,

    #[arg(long, default_value_t = 20)]
    chart_height: u16,

    /// Log filter used when RUST_LOG is unset
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            openai_api_key: self.openai_api_key.clone(),
            openai_base_url: self.openai_base_url.clone(),
            model: self.model.clone(),
            price_api_url: self.price_api_url.clone(),
            http_timeout: Duration::from_secs(self.timeout_secs),
            auto_adjust: !self.no_adjust,
            chart_width: self.chart_width,
            chart_height: self.chart_height,
        }
    }
}

fn show(controller: &DashboardController, panels: &[Panel]) {
    let settings = controller.settings();
    for panel in panels {
        println!(
            "{}\n",
            render_panel(panel, settings.chart_width, settings.chart_height)
        );
    }
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush().context("flushing stdout")
}

/// Apply one command. Returns false when the session should end.
async fn handle(controller: &mut DashboardController, command: Command) -> bool {
    let reruns = command.reruns();
    let mut panels = Vec::new();

    match command {
        Command::Tickers(tickers) => panels.extend(controller.select_tickers(tickers)),
        Command::Add(ticker) => panels.extend(controller.add_ticker(ticker)),
        Command::Remove(ticker) => controller.remove_ticker(&ticker),
        Command::Metric(metric) => controller.set_metric(metric),
        Command::Charts(charts) => controller.set_charts(charts),
        Command::Start(date) => controller.set_start(date),
        Command::End(date) => controller.set_end(date),
        Command::Show => {}
        Command::Assets => panels.push(Panel::Info(format!(
            "Pick Assets: {}",
            ASSET_UNIVERSE.join(", ")
        ))),
        Command::Summary => panels.push(controller.performance_summary().await),
        Command::Risks => panels.push(controller.risks_and_opportunities().await),
        Command::Ask(query) => panels.push(controller.ask(&query).await),
        Command::History => {
            let history = controller.session().chat_history();
            if history.is_empty() {
                panels.push(Panel::Info("No questions asked yet.".to_string()));
            }
            for (i, exchange) in history.iter().enumerate() {
                panels.push(Panel::Insight {
                    title: format!("[{}] {}", i + 1, exchange.query),
                    body: exchange.response.clone(),
                });
            }
        }
        Command::Help => panels.push(Panel::Info(HELP.to_string())),
        Command::Quit => return false,
    }

    if reruns {
        let session = controller.session();
        debug!(
            "rerun: tickers={:?} metric={} charts={:?} range={}..{}",
            session.tickers, session.metric, session.charts, session.start, session.end
        );
        panels.extend(controller.render().await);
    }

    show(controller, &panels);
    true
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = cli.settings();
    let prices = YahooProvider::new(&settings).context("building price client")?;
    let llm = OpenAiClient::new(&settings).context("building language-model client")?;
    let mut controller = DashboardController::new(settings, Box::new(prices), Box::new(llm));

    let mut startup = controller.select_tickers(parse_tickers(&cli.tickers));
    controller.set_metric(cli.metric);
    controller.set_charts(cli.charts.clone());
    controller.set_start(cli.start.unwrap_or_else(default_start));
    controller.set_end(cli.end.unwrap_or_else(default_end));

    println!("Stock Price AI Bot");
    println!("Visualizations & AI Insights for Stocks (type 'help')\n");

    startup.extend(controller.render().await);
    show(&controller, &startup);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await.context("reading input")? {
        match line.parse::<Command>() {
            Ok(command) => {
                if !handle(&mut controller, command).await {
                    break;
                }
            }
            Err(msg) => println!("{msg}\n"),
        }
        prompt()?;
    }

    Ok(())
}
