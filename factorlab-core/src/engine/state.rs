//! Mutable state owned by one rebalancing run.

use super::rebalance::{FactorRun, RebalanceRecord, SkippedRebalance};
use super::sizing::RebalancePlan;
use crate::domain::{EquityCurve, EquityPoint, Holdings, TradeLog};

/// State evolving event by event during a run. Nothing here is shared
/// between runs.
#[derive(Debug, Clone)]
pub struct RunState {
    pub initial_capital: f64,
    pub holdings: Holdings,
    pub cash: f64,
    pub trades: TradeLog,
    pub equity: EquityCurve,
    pub rebalances: Vec<RebalanceRecord>,
    pub skipped: Vec<SkippedRebalance>,
    /// Row of the last event taken off the schedule (executed or skipped).
    pub last_index: Option<usize>,
    /// Row where the current holdings were established.
    pub segment_start: Option<usize>,
}

impl RunState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            holdings: Holdings::new(),
            cash: initial_capital,
            trades: TradeLog::new(),
            equity: EquityCurve::new(),
            rebalances: Vec::new(),
            skipped: Vec::new(),
            last_index: None,
            segment_start: None,
        }
    }

    /// Append a marked segment to the equity curve and return its last value.
    pub fn record_segment(&mut self, points: Vec<EquityPoint>) -> Option<f64> {
        let last = points.last().map(|p| p.equity);
        self.equity.extend_segment(points);
        last
    }

    /// Execute a plan: cash moves by the trades, holdings are replaced
    /// wholesale, trades are appended to the log.
    pub fn apply(&mut self, plan: RebalancePlan, row: usize) {
        self.cash += plan.cash_flow();
        self.holdings = plan.target;
        self.trades.append(plan.trades);
        self.segment_start = Some(row);
    }

    pub fn into_run(self) -> FactorRun {
        FactorRun {
            initial_capital: self.initial_capital,
            equity: self.equity,
            trades: self.trades,
            rebalances: self.rebalances,
            skipped: self.skipped,
            final_holdings: self.holdings,
            final_cash: self.cash,
        }
    }
}
