//! Periodic cross-sectional rebalancing engine.
//!
//! One run is a deterministic fold over the scheduled rebalance events:
//!
//! 1. Mark the current holdings forward to the event's row
//! 2. Score every factor on the trailing window ending at that row
//! 3. Combine the scores into a composite ranking
//! 4. Size long/short books and diff against current holdings
//! 5. Replace holdings, book the trades, and open the next segment

pub mod config;
pub mod cost_model;
pub mod mark_to_market;
pub mod rebalance;
pub mod sizing;
pub mod state;

pub use config::EngineConfig;
pub use cost_model::CostModel;
pub use mark_to_market::{step_forward, MarkError};
pub use rebalance::{
    FactorRun, RebalanceEngine, RebalanceRecord, SkipReason, SkippedRebalance, WeightedFactor,
};
pub use sizing::{size_and_trade, BookSpec, RebalancePlan, TRADE_EPSILON};
pub use state::RunState;

use crate::rank::RankError;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("initial capital must be positive and finite, got {0}")]
    InvalidCapital(f64),

    #[error("top_n must be at least 1")]
    ZeroTopN,

    #[error("short fraction must be finite and non-negative, got {0}")]
    InvalidShortFraction(f64),

    #[error(
        "transaction costs must be finite and non-negative \
         (commission {commission_bps} bps, slippage {slippage_bps} bps)"
    )]
    InvalidCosts {
        commission_bps: f64,
        slippage_bps: f64,
    },

    #[error("at least one factor is required")]
    NoFactors,

    #[error("factor '{factor}' has invalid weight {weight}")]
    InvalidWeight { factor: String, weight: f64 },

    #[error("factor '{0}' registered twice")]
    DuplicateFactor(String),

    #[error("portfolio value exhausted on {date}: {capital}")]
    CapitalExhausted { date: NaiveDate, capital: f64 },

    #[error(transparent)]
    Rank(#[from] RankError),

    #[error(transparent)]
    Mark(#[from] MarkError),
}
