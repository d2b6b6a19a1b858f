//! Transaction cost model: proportional commission and slippage.

use serde::{Deserialize, Serialize};

/// Costs in basis points of traded notional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Slippage in basis points of notional.
    #[serde(default)]
    pub slippage_bps: f64,
    /// Commission in basis points of notional.
    #[serde(default)]
    pub commission_bps: f64,
}

impl CostModel {
    pub fn new(slippage_bps: f64, commission_bps: f64) -> Self {
        Self {
            slippage_bps,
            commission_bps,
        }
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn total_bps(&self) -> f64 {
        self.slippage_bps + self.commission_bps
    }

    pub fn is_frictionless(&self) -> bool {
        self.total_bps() == 0.0
    }

    pub fn is_valid(&self) -> bool {
        [self.slippage_bps, self.commission_bps]
            .iter()
            .all(|bps| bps.is_finite() && *bps >= 0.0)
    }

    /// Friction paid on a trade of the given signed notional.
    ///
    /// `cost = |notional| * (commission_bps + slippage_bps) / 10_000`
    pub fn cost(&self, notional: f64) -> f64 {
        notional.abs() * self.total_bps() / 10_000.0
    }
}
