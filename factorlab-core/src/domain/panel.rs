//! PricePanel: an ordered-by-date table of (date, instrument) → price.
//!
//! Missing cells are stored as `f64::NAN` and never participate in arithmetic:
//! every read goes through [`PricePanel::price`], which returns `None` for
//! missing, non-finite, or non-positive cells.

use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

/// Caller contract violations when building or slicing a panel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanelError {
    #[error("duplicate date {date} at row {index}")]
    DuplicateDate { index: usize, date: NaiveDate },

    #[error("dates not increasing at row {index}: {previous} followed by {current}")]
    NonMonotonic {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("{instruments} instruments but {columns} price columns")]
    ColumnCountMismatch { instruments: usize, columns: usize },

    #[error("column '{instrument}' has {actual} rows, expected {expected}")]
    RaggedColumn {
        instrument: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate instrument '{0}'")]
    DuplicateInstrument(String),

    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),
}

/// Column-major price table on a strictly increasing date index.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePanel {
    dates: Vec<NaiveDate>,
    instruments: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl PricePanel {
    /// Build a panel, rejecting duplicate or out-of-order dates, ragged
    /// columns, and duplicate instrument names.
    pub fn new(
        dates: Vec<NaiveDate>,
        instruments: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> Result<Self, PanelError> {
        for (index, pair) in dates.windows(2).enumerate() {
            let (previous, current) = (pair[0], pair[1]);
            if current == previous {
                return Err(PanelError::DuplicateDate {
                    index: index + 1,
                    date: current,
                });
            }
            if current < previous {
                return Err(PanelError::NonMonotonic {
                    index: index + 1,
                    previous,
                    current,
                });
            }
        }

        if instruments.len() != columns.len() {
            return Err(PanelError::ColumnCountMismatch {
                instruments: instruments.len(),
                columns: columns.len(),
            });
        }

        let mut seen = HashSet::new();
        for (name, column) in instruments.iter().zip(&columns) {
            if !seen.insert(name.as_str()) {
                return Err(PanelError::DuplicateInstrument(name.clone()));
            }
            if column.len() != dates.len() {
                return Err(PanelError::RaggedColumn {
                    instrument: name.clone(),
                    expected: dates.len(),
                    actual: column.len(),
                });
            }
        }

        Ok(Self {
            dates,
            instruments,
            columns,
        })
    }

    /// Build a panel from `(instrument, column)` pairs.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, PanelError> {
        let (instruments, columns) = columns.into_iter().unzip();
        Self::new(dates, instruments, columns)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn date(&self, row: usize) -> Option<NaiveDate> {
        self.dates.get(row).copied()
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn instrument_count(&self) -> usize {
        self.instruments.len()
    }

    pub fn column_index(&self, instrument: &str) -> Option<usize> {
        self.instruments.iter().position(|name| name == instrument)
    }

    /// Raw column, NaN marking missing cells.
    pub fn column(&self, col: usize) -> &[f64] {
        &self.columns[col]
    }

    /// Tradable price at `(row, col)`, or `None` when missing.
    pub fn price(&self, row: usize, col: usize) -> Option<f64> {
        self.columns
            .get(col)
            .and_then(|column| column.get(row))
            .copied()
            .filter(|p| p.is_finite() && *p > 0.0)
    }

    pub fn price_of(&self, row: usize, instrument: &str) -> Option<f64> {
        self.column_index(instrument)
            .and_then(|col| self.price(row, col))
    }

    /// Most recent valid price at or before `row`.
    pub fn last_valid_price(&self, row: usize, col: usize) -> Option<f64> {
        let end = row.min(self.len().checked_sub(1)?);
        (0..=end).rev().find_map(|r| self.price(r, col))
    }

    /// Exact row of `date`, if present.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Row nearest to `date` in either direction. Equidistant ties resolve to
    /// the later row.
    pub fn nearest_index(&self, date: NaiveDate) -> Option<usize> {
        crate::schedule::nearest_index(&self.dates, date)
    }

    /// Trailing view of rows `0..=end`.
    pub fn window(&self, end: usize) -> PanelWindow<'_> {
        let rows = if self.is_empty() {
            0
        } else {
            end.min(self.len() - 1) + 1
        };
        PanelWindow { panel: self, rows }
    }

    /// First `rows` rows as a new panel.
    pub fn head(&self, rows: usize) -> PricePanel {
        let rows = rows.min(self.len());
        PricePanel {
            dates: self.dates[..rows].to_vec(),
            instruments: self.instruments.clone(),
            columns: self.columns.iter().map(|c| c[..rows].to_vec()).collect(),
        }
    }

    /// Sub-panel restricted to the named instruments, in the given order.
    pub fn select(&self, instruments: &[&str]) -> Result<PricePanel, PanelError> {
        let mut names = Vec::with_capacity(instruments.len());
        let mut columns = Vec::with_capacity(instruments.len());
        for &name in instruments {
            let col = self
                .column_index(name)
                .ok_or_else(|| PanelError::UnknownInstrument(name.to_string()))?;
            names.push(name.to_string());
            columns.push(self.columns[col].clone());
        }
        PricePanel::new(self.dates.clone(), names, columns)
    }

    /// Inner join of two columns: only rows where both prices are valid.
    pub fn aligned_pair(&self, x: &str, y: &str) -> Result<AlignedPair, PanelError> {
        let xc = self
            .column_index(x)
            .ok_or_else(|| PanelError::UnknownInstrument(x.to_string()))?;
        let yc = self
            .column_index(y)
            .ok_or_else(|| PanelError::UnknownInstrument(y.to_string()))?;

        let mut pair = AlignedPair::default();
        for row in 0..self.len() {
            if let (Some(px), Some(py)) = (self.price(row, xc), self.price(row, yc)) {
                pair.dates.push(self.dates[row]);
                pair.x.push(px);
                pair.y.push(py);
            }
        }
        Ok(pair)
    }
}

/// Two price series sharing one date index, with no missing cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedPair {
    pub dates: Vec<NaiveDate>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Read-only trailing window over a panel. Factors only ever see this view,
/// so rows after the rebalance date are unreachable.
#[derive(Debug, Clone, Copy)]
pub struct PanelWindow<'a> {
    panel: &'a PricePanel,
    rows: usize,
}

impl<'a> PanelWindow<'a> {
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn instruments(&self) -> &'a [String] {
        &self.panel.instruments
    }

    /// Column restricted to the window's rows.
    pub fn column(&self, col: usize) -> &'a [f64] {
        &self.panel.columns[col][..self.rows]
    }

    pub fn price(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows {
            return None;
        }
        self.panel.price(row, col)
    }

    /// Price on the window's last row (the reference date).
    pub fn last_price(&self, col: usize) -> Option<f64> {
        self.rows.checked_sub(1).and_then(|row| self.price(row, col))
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.checked_sub(1).and_then(|row| self.panel.date(row))
    }
}
