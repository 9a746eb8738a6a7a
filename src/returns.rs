//! Cumulative relative returns

use crate::frame::{PriceTable, ReturnTable, Series};

/// Cumulative fractional return of every column since its first price.
///
/// Per column: period-over-period change, compounded, minus one. Each change
/// is measured against the last non-missing price, so a gap in one column
/// (weekends when stocks share a table with crypto) does not lose the move
/// across it. A missing cell repeats the running value; rows before the first
/// price read 0.0. A change whose base price is zero or negative is undefined:
/// its cell reports 0.0 and it does not compound.
///
/// Filling with 0.0 hides data problems such as a zero price. Charts need
/// finite values, so this is kept as the policy.
pub fn cumulative_returns(prices: &PriceTable) -> ReturnTable {
    ReturnTable::new(
        prices.dates.clone(),
        prices
            .columns
            .iter()
            .map(|c| Series::new(c.name.clone(), cumulate(&c.values)))
            .collect(),
    )
}

fn cumulate(prices: &[Option<f64>]) -> Vec<f64> {
    let mut growth = 1.0;
    let mut last: Option<f64> = None;
    let mut out = Vec::with_capacity(prices.len());

    for price in prices {
        let Some(price) = *price else {
            out.push(finite_or_zero(growth - 1.0));
            continue;
        };
        match last.and_then(|base| pct_change(base, price)) {
            Some(change) => {
                growth *= 1.0 + change;
                out.push(finite_or_zero(growth - 1.0));
            }
            None => out.push(0.0),
        }
        last = Some(price);
    }

    out
}

fn pct_change(base: f64, current: f64) -> Option<f64> {
    if base <= 0.0 {
        return None;
    }
    let change = (current - base) / base;
    change.is_finite().then_some(change)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
