//! Position sizing and trade generation at one rebalance.

use super::CostModel;
use crate::domain::{CrossSection, Holdings, PricePanel, TradeRecord};

/// Share deltas at or below this magnitude are not traded.
pub const TRADE_EPSILON: f64 = 1e-9;

/// Book sizes for one rebalance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookSpec {
    pub top_n: usize,
    pub short_fraction: f64,
}

/// Outcome of sizing one rebalance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RebalancePlan {
    /// Holdings after the rebalance; replaces the current holdings wholesale.
    pub target: Holdings,
    /// Trades in panel column order.
    pub trades: Vec<TradeRecord>,
    pub longs: Vec<String>,
    pub shorts: Vec<String>,
    /// Selected names that could not be priced on the rebalance date.
    pub rejected: Vec<String>,
}

impl RebalancePlan {
    /// Cash change from executing the trades: sale proceeds less purchases
    /// less costs.
    pub fn cash_flow(&self) -> f64 {
        self.trades.iter().map(|t| -t.notional - t.cost).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.trades.iter().map(|t| t.cost).sum()
    }
}

/// Size equal-weight books from a descending `ranking` and diff them against
/// `current`.
///
/// The long book holds the top `top_n` names with notional `capital`. When
/// `short_fraction > 0` the short book holds the bottom `top_n` names not
/// already long, with notional `capital * short_fraction`. A name without a
/// valid price at `row` is dropped from its book and the book notional is
/// spread over the rest.
///
/// Names leaving the portfolio are liquidated at their last valid price. A
/// held name with no price at all is kept as is.
pub fn size_and_trade(
    ranking: &CrossSection,
    current: &Holdings,
    panel: &PricePanel,
    row: usize,
    capital: f64,
    book: BookSpec,
    costs: &CostModel,
) -> RebalancePlan {
    let mut plan = RebalancePlan::default();
    let date = match panel.date(row) {
        Some(date) => date,
        None => {
            plan.target = current.clone();
            return plan;
        }
    };

    let long_names = ranking.head(book.top_n);
    let short_names: Vec<&str> = if book.short_fraction > 0.0 {
        let mut bottom: Vec<&str> = ranking
            .names()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .filter(|name| !long_names.contains(name))
            .take(book.top_n)
            .collect();
        bottom.reverse();
        bottom
    } else {
        Vec::new()
    };

    let priced = |names: &[&str], rejected: &mut Vec<String>| -> Vec<(String, f64)> {
        let mut out = Vec::with_capacity(names.len());
        for &name in names {
            match panel.price_of(row, name) {
                Some(price) => out.push((name.to_string(), price)),
                None => {
                    tracing::warn!(
                        %date,
                        instrument = name,
                        "no price at rebalance, excluded from book"
                    );
                    rejected.push(name.to_string());
                }
            }
        }
        out
    };

    let longs = priced(&long_names, &mut plan.rejected);
    let shorts = priced(&short_names, &mut plan.rejected);

    let mut target = Holdings::new();
    if !longs.is_empty() {
        let per_name = capital / longs.len() as f64;
        for (name, price) in &longs {
            target.insert(name.clone(), per_name / price);
        }
    }
    if !shorts.is_empty() {
        let per_name = capital * book.short_fraction / shorts.len() as f64;
        for (name, price) in &shorts {
            target.insert(name.clone(), -per_name / price);
        }
    }

    for (col, name) in panel.instruments().iter().enumerate() {
        let previous = current.shares(name);
        let wanted = target.shares(name);
        let delta = wanted - previous;
        if delta.abs() <= TRADE_EPSILON {
            target.insert(name.clone(), previous);
            continue;
        }
        let price = if wanted == 0.0 {
            panel.last_valid_price(row, col)
        } else {
            panel.price(row, col)
        };
        let Some(price) = price else {
            tracing::warn!(
                %date,
                instrument = name.as_str(),
                "cannot liquidate without any price, position kept"
            );
            target.insert(name.clone(), previous);
            continue;
        };
        let notional = delta * price;
        plan.trades.push(TradeRecord {
            date,
            instrument: name.clone(),
            shares: delta,
            price,
            notional,
            cost: costs.cost(notional),
        });
    }

    // Held names the panel does not know cannot be valued or traded.
    for (name, shares) in current.iter() {
        if panel.column_index(name).is_none() {
            tracing::warn!(
                %date,
                instrument = name,
                "held instrument missing from panel, position kept"
            );
            target.insert(name, shares);
        }
    }

    plan.longs = longs.into_iter().map(|(name, _)| name).collect();
    plan.shorts = shorts.into_iter().map(|(name, _)| name).collect();
    plan.target = target;
    plan
}
