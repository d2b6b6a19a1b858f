//! TradeRecord: one executed rebalance trade, and the append-only log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An executed share delta at a rebalance.
///
/// `shares` and `notional` are signed: positive buys, negative sells.
/// `cost` is the friction paid on this trade (commission + slippage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub instrument: String,
    pub shares: f64,
    pub price: f64,
    pub notional: f64,
    pub cost: f64,
}

impl TradeRecord {
    pub fn is_buy(&self) -> bool {
        self.shares > 0.0
    }

    pub fn abs_notional(&self) -> f64 {
        self.notional.abs()
    }
}

/// Append-only trade log. Ordering is rebalance order, then instrument order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeLog {
    records: Vec<TradeRecord>,
}

impl TradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, trades: impl IntoIterator<Item = TradeRecord>) {
        self.records.extend(trades);
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_cost(&self) -> f64 {
        self.records.iter().map(|t| t.cost).sum()
    }

    pub fn into_records(self) -> Vec<TradeRecord> {
        self.records
    }
}
