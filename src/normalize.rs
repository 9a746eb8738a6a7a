//! Reduce a raw vendor download to one price column per ticker

use crate::error::{Error, Result};
use crate::frame::{PriceTable, RawPriceTable, Series};

pub const CLOSE: &str = "Close";
pub const ADJ_CLOSE: &str = "Adj Close";

/// Fields tried in order; the first one present wins.
const PRICE_FIELDS: [&str; 2] = [CLOSE, ADJ_CLOSE];

/// Select the close price for every ticker in `raw`.
///
/// `tickers` is only used to name the failure when the download is empty.
/// Tickers the vendor did not resolve are simply absent from the result;
/// callers that care compare requested against returned columns.
pub fn normalize(raw: &RawPriceTable, tickers: &[String]) -> Result<PriceTable> {
    if raw.is_empty() {
        return Err(Error::NoData {
            tickers: tickers.to_vec(),
        });
    }

    match raw {
        RawPriceTable::FieldByTicker(frame) => PRICE_FIELDS
            .iter()
            .find_map(|field| frame.cross_section(field))
            .ok_or_else(missing_close),

        RawPriceTable::Flat { symbol, frame } => {
            let series = PRICE_FIELDS
                .iter()
                .find_map(|field| frame.column(field))
                .ok_or_else(missing_close)?;

            // Single-ticker downloads carry the field name; label the column
            // with the ticker when we know it.
            let name = symbol.clone().unwrap_or_else(|| series.name.clone());
            Ok(PriceTable::new(
                frame.dates.clone(),
                vec![Series::new(name, series.values.clone())],
            ))
        }
    }
}

/// Requested tickers that did not come back as a column
pub fn unresolved(requested: &[String], table: &PriceTable) -> Vec<String> {
    requested
        .iter()
        .filter(|t| table.column(t).is_none())
        .cloned()
        .collect()
}

fn missing_close() -> Error {
    Error::MissingField {
        field: CLOSE.to_string(),
    }
}
