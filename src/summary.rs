//! Per-ticker start/latest price and percent change over the selected range

use crate::frame::PriceTable;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    pub ticker: String,
    pub start_price: f64,
    pub latest_price: f64,
    /// `((latest - start) / start) * 100`
    pub change_pct: f64,
}

impl PriceSummary {
    /// Summary line as it appears inside the performance prompt
    pub fn line(&self) -> String {
        format!(
            "- {}: ${:.2} (Change: {:.2}%)",
            self.ticker, self.latest_price, self.change_pct
        )
    }
}

/// First and last non-missing price of every column, in column order.
/// Columns with no prices at all, or whose first price is not positive, are
/// left out.
pub fn summarize(prices: &PriceTable) -> Vec<PriceSummary> {
    prices
        .columns
        .iter()
        .filter_map(|column| {
            let mut valid = column.values.iter().flatten();
            let start_price = *valid.next()?;
            if start_price <= 0.0 {
                return None;
            }
            let latest_price = valid.last().copied().unwrap_or(start_price);
            Some(PriceSummary {
                ticker: column.name.clone(),
                start_price,
                latest_price,
                change_pct: ((latest_price - start_price) / start_price) * 100.0,
            })
        })
        .collect()
}

/// Text block handed to the performance-summary prompt
pub fn summary_text(requested: &[String], summaries: &[PriceSummary]) -> String {
    let mut text = format!("Stock Performance Summary for {}:\n", requested.join(", "));
    for summary in summaries {
        text.push('\n');
        text.push_str(&summary.line());
    }
    text
}
