//! Line-oriented commands accepted by the interactive dashboard

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

use crate::dashboard::{ChartKind, Metric};

static TICKER_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,]+").expect("valid regex"));

pub const HELP: &str = "\
Commands:
  tickers <T1, T2 ...>   pick assets (replaces the selection)
  add <T> / remove <T>   change the selection by one
  assets                 list the assets you can pick
  metric price|returns   what to plot
  charts [line] [area]   which charts to draw (none to hide)
  start <YYYY-MM-DD>     first day of the range
  end <YYYY-MM-DD>       last day of the range (exclusive)
  show                   redraw the dashboard
  summary                AI performance summary
  risks                  AI risks & opportunities analysis
  ask <question>         ask AI about the selected stocks
  history                previous questions and answers
  help                   this text
  quit                   leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Tickers(Vec<String>),
    Add(String),
    Remove(String),
    Assets,
    Metric(Metric),
    Charts(Vec<ChartKind>),
    Start(NaiveDate),
    End(NaiveDate),
    Show,
    Summary,
    Risks,
    Ask(String),
    History,
    Help,
    Quit,
}

impl Command {
    /// Widget changes redraw the dashboard afterwards
    pub fn reruns(&self) -> bool {
        matches!(
            self,
            Command::Tickers(_)
                | Command::Add(_)
                | Command::Remove(_)
                | Command::Metric(_)
                | Command::Charts(_)
                | Command::Start(_)
                | Command::End(_)
                | Command::Show
        )
    }
}

/// Split a ticker list on commas and/or whitespace, upper-cased
pub fn parse_tickers(input: &str) -> Vec<String> {
    TICKER_SPLIT
        .split(input.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
        .collect()
}

fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| format!("bad date '{}': {} (expected YYYY-MM-DD)", input.trim(), e))
}

fn single_ticker(rest: &str, verb: &str) -> Result<String, String> {
    match parse_tickers(rest).as_slice() {
        [one] => Ok(one.clone()),
        _ => Err(format!("usage: {verb} <TICKER>")),
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match word.to_lowercase().as_str() {
            "tickers" | "pick" => Ok(Command::Tickers(parse_tickers(rest))),
            "add" => single_ticker(rest, "add").map(Command::Add),
            "remove" | "rm" => single_ticker(rest, "remove").map(Command::Remove),
            "assets" => Ok(Command::Assets),
            "metric" => rest.parse().map(Command::Metric),
            "charts" | "chart" => rest
                .split_whitespace()
                .filter(|w| *w != "none")
                .map(str::parse)
                .collect::<Result<Vec<ChartKind>, _>>()
                .map(Command::Charts),
            "start" => parse_date(rest).map(Command::Start),
            "end" => parse_date(rest).map(Command::End),
            "show" | "" => Ok(Command::Show),
            "summary" => Ok(Command::Summary),
            "risks" => Ok(Command::Risks),
            // blank questions are reported by the dashboard itself
            "ask" => Ok(Command::Ask(rest.to_string())),
            "history" => Ok(Command::History),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(format!("unknown command '{other}', type 'help'")),
        }
    }
}
