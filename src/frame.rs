//! Date-indexed tables of per-ticker price and return series
//!
//! A `Frame<T>` is the one shape every stage of the dashboard passes around:
//! an ascending, unique date index plus named columns of equal length.
//! Prices may be missing (`Option<f64>`), returns never are (`f64`).

use chrono::NaiveDate;

/// One named column of a frame
#[derive(Debug, Clone, PartialEq)]
pub struct Series<T> {
    pub name: String,
    pub values: Vec<T>,
}

impl<T> Series<T> {
    pub fn new(name: impl Into<String>, values: Vec<T>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Date-indexed table with one or more named columns
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<T> {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<Series<T>>,
}

/// Flat price table: one price column per ticker, gaps as `None`
pub type PriceTable = Frame<Option<f64>>;

/// Cumulative fractional return per ticker, same shape as the prices it came from
pub type ReturnTable = Frame<f64>;

impl<T> Default for Frame<T> {
    fn default() -> Self {
        Self {
            dates: Vec::new(),
            columns: Vec::new(),
        }
    }
}

impl<T: Clone> Frame<T> {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<Series<T>>) -> Self {
        debug_assert!(columns.iter().all(|c| c.values.len() == dates.len()));
        Self { dates, columns }
    }

    /// No rows at all
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn column(&self, name: &str) -> Option<&Series<T>> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// First `n` rows, used for the data preview
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.dates.len());
        Self {
            dates: self.dates[..n].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Series::new(c.name.clone(), c.values[..n].to_vec()))
                .collect(),
        }
    }
}

/// One column of a two-level table, addressed by (price field, ticker)
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSeries {
    pub field: String,
    pub ticker: String,
    pub values: Vec<Option<f64>>,
}

/// Two-level table: outer level is the price field, inner level the ticker
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldFrame {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<FieldSeries>,
}

impl FieldFrame {
    /// Every column under `field`, outer level dropped, ticker order kept
    pub fn cross_section(&self, field: &str) -> Option<PriceTable> {
        let columns: Vec<Series<Option<f64>>> = self
            .columns
            .iter()
            .filter(|c| c.field == field)
            .map(|c| Series::new(c.ticker.clone(), c.values.clone()))
            .collect();

        if columns.is_empty() {
            return None;
        }
        Some(Frame::new(self.dates.clone(), columns))
    }

    /// The same table flattened to `"field ticker"` column names, for previews
    pub fn flattened(&self) -> PriceTable {
        Frame::new(
            self.dates.clone(),
            self.columns
                .iter()
                .map(|c| Series::new(format!("{} {}", c.field, c.ticker), c.values.clone()))
                .collect(),
        )
    }
}

/// What the price-data boundary hands back, tagged by column shape
#[derive(Debug, Clone, PartialEq)]
pub enum RawPriceTable {
    /// Single-level columns named by price field ("Open", "Close", ...).
    /// `symbol` is the ticker the download was for, when known.
    Flat {
        symbol: Option<String>,
        frame: PriceTable,
    },
    /// Two-level columns: field × ticker
    FieldByTicker(FieldFrame),
}

impl RawPriceTable {
    pub fn is_empty(&self) -> bool {
        match self {
            RawPriceTable::Flat { frame, .. } => frame.is_empty(),
            RawPriceTable::FieldByTicker(frame) => frame.dates.is_empty(),
        }
    }

    /// Single-level view of the whole download
    pub fn preview(&self, rows: usize) -> PriceTable {
        match self {
            RawPriceTable::Flat { frame, .. } => frame.head(rows),
            RawPriceTable::FieldByTicker(frame) => frame.flattened().head(rows),
        }
    }
}

/// Re-wraps an already-normalized table so that normalizing it again is a no-op.
impl From<PriceTable> for RawPriceTable {
    fn from(table: PriceTable) -> Self {
        RawPriceTable::FieldByTicker(FieldFrame {
            dates: table.dates,
            columns: table
                .columns
                .into_iter()
                .map(|c| FieldSeries {
                    field: crate::normalize::CLOSE.to_string(),
                    ticker: c.name,
                    values: c.values,
                })
                .collect(),
        })
    }
}
