//! Mark-to-market stepper: values fixed holdings day by day over one segment.
//!
//! Missing prices are forward-filled from earlier rows of the same segment
//! only. A held instrument with no price on any row after the segment's
//! first row is a data error, whatever the fill limit. The stepper never
//! mutates holdings.

use crate::domain::{EquityPoint, Holdings, PricePanel};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarkError {
    #[error("invalid segment rows {from}..={to} for a panel of {len} rows")]
    InvalidSegment { from: usize, to: usize, len: usize },

    #[error("held instrument '{0}' is not in the price panel")]
    UnknownInstrument(String),

    #[error("no price for held instrument '{instrument}' on {date} since the segment began")]
    SegmentGap { instrument: String, date: NaiveDate },

    #[error("held instrument '{instrument}' has no price after {from} through {to}")]
    UnpricedSegment {
        instrument: String,
        from: NaiveDate,
        to: NaiveDate,
    },

    #[error("price for '{instrument}' stale for {missing_days} days on {date}, limit {limit}")]
    StalePrice {
        instrument: String,
        date: NaiveDate,
        missing_days: usize,
        limit: usize,
    },

    #[error("every held instrument is unpriced on {0}")]
    AllHoldingsUnpriced(NaiveDate),
}

/// Per-day equity over rows `from..=to`: `cash + Σ shares × price`.
pub fn step_forward(
    holdings: &Holdings,
    cash: f64,
    panel: &PricePanel,
    from: usize,
    to: usize,
    ffill_limit: Option<usize>,
) -> Result<Vec<EquityPoint>, MarkError> {
    if from > to || to >= panel.len() {
        return Err(MarkError::InvalidSegment {
            from,
            to,
            len: panel.len(),
        });
    }

    let mut book = Vec::with_capacity(holdings.len());
    for (name, shares) in holdings.iter() {
        let col = panel
            .column_index(name)
            .ok_or_else(|| MarkError::UnknownInstrument(name.to_string()))?;
        book.push(Position {
            name,
            col,
            shares,
            carried: None,
            missing: 0,
            seen_after_start: false,
        });
    }

    let mut points = Vec::with_capacity(to - from + 1);
    for row in from..=to {
        let date = panel.dates()[row];
        let mut equity = cash;
        let mut priced_today = 0;

        for pos in &mut book {
            let price = match panel.price(row, pos.col) {
                Some(price) => {
                    pos.carried = Some(price);
                    pos.missing = 0;
                    pos.seen_after_start |= row > from;
                    priced_today += 1;
                    price
                }
                None => {
                    pos.missing += 1;
                    let Some(carried) = pos.carried else {
                        return Err(MarkError::SegmentGap {
                            instrument: pos.name.to_string(),
                            date,
                        });
                    };
                    if let Some(limit) = ffill_limit {
                        if pos.missing > limit {
                            return Err(MarkError::StalePrice {
                                instrument: pos.name.to_string(),
                                date,
                                missing_days: pos.missing,
                                limit,
                            });
                        }
                    }
                    carried
                }
            };
            equity += pos.shares * price;
        }

        if !book.is_empty() && priced_today == 0 {
            return Err(MarkError::AllHoldingsUnpriced(date));
        }
        points.push(EquityPoint { date, equity });
    }

    if to > from {
        if let Some(pos) = book.iter().find(|pos| !pos.seen_after_start) {
            return Err(MarkError::UnpricedSegment {
                instrument: pos.name.to_string(),
                from: panel.dates()[from],
                to: panel.dates()[to],
            });
        }
    }
    Ok(points)
}

struct Position<'a> {
    name: &'a str,
    col: usize,
    shares: f64,
    carried: Option<f64>,
    missing: usize,
    /// Priced on some row after `from`.
    seen_after_start: bool,
}
