//! Engine configuration, passed explicitly into the engine constructor.

use super::{CostModel, EngineError};
use crate::schedule::RebalanceFrequency;
use serde::{Deserialize, Serialize};

/// Configuration for a single rebalancing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// Size of the long book (and of the short book when one is held).
    pub top_n: usize,
    /// Short book notional as a fraction of capital. Zero disables shorting.
    pub short_fraction: f64,
    pub frequency: RebalanceFrequency,
    /// Rebalances whose trailing window has fewer rows than this are skipped.
    pub min_history: usize,
    pub costs: CostModel,
    /// Maximum consecutive missing days forward-filled inside a segment.
    /// `None` fills without limit (still never across a rebalance).
    pub ffill_limit: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capital: 1_000_000.0,
            top_n: 20,
            short_fraction: 0.0,
            frequency: RebalanceFrequency::MonthEnd,
            min_history: 30,
            costs: CostModel::frictionless(),
            ffill_limit: None,
        }
    }
}

impl EngineConfig {
    pub fn new(initial_capital: f64, top_n: usize) -> Self {
        Self {
            initial_capital,
            top_n,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(EngineError::InvalidCapital(self.initial_capital));
        }
        if self.top_n == 0 {
            return Err(EngineError::ZeroTopN);
        }
        if !self.short_fraction.is_finite() || self.short_fraction < 0.0 {
            return Err(EngineError::InvalidShortFraction(self.short_fraction));
        }
        if !self.costs.is_valid() {
            return Err(EngineError::InvalidCosts {
                commission_bps: self.costs.commission_bps,
                slippage_bps: self.costs.slippage_bps,
            });
        }
        Ok(())
    }
}
