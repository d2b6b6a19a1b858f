//! FactorLab Core: price panel, factors, ranking, rebalancing engine, pair
//! stat-arb, FIFO backtester.
//!
//! This crate contains the simulation core and performs no I/O:
//! - Domain types (price panel, cross-sections, holdings, trades, equity)
//! - Global and rolling z-score normalization
//! - Weighted composite ranking of factor scores
//! - Calendar rebalance scheduling resolved onto trading rows
//! - Position sizing, trade generation and mark-to-market stepping
//! - Pair spread state machine with P&L and normalized NAV
//! - Deterministic synthetic panels for tests and benchmarks

pub mod data;
pub mod domain;
pub mod engine;
pub mod factors;
pub mod fifo;
pub mod normalize;
pub mod pair;
pub mod rank;
pub mod schedule;

pub use domain::{
    CrossSection, EquityCurve, EquityPoint, EquityRow, Holdings, PanelError, PanelWindow,
    PricePanel, TradeLog, TradeRecord,
};
pub use engine::{EngineConfig, EngineError, FactorRun, RebalanceEngine, WeightedFactor};
pub use factors::{Factor, FactorSpec};
pub use pair::{run_pair, PairError, PairParams, PairRun, SpreadPosition};
pub use schedule::{RebalanceEvent, RebalanceFrequency};
