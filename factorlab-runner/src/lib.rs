//! FactorLab Runner: configuration, run wiring, metrics, pair portfolios,
//! parameter sweeps.
//!
//! This crate builds on `factorlab-core` to provide:
//! - TOML backtest configuration with a content-hash run id
//! - Performance summary (CAGR, Sharpe, drawdown, turnover and friends)
//! - Single factor and pair runs returning serializable results
//! - Multi-pair portfolios run in parallel and aggregated on one index
//! - Parallel parameter-grid sweeps ranked by Sharpe

pub mod config;
pub mod metrics;
pub mod pairs;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, FactorEntry, PairsPortfolioConfig, RunId};
pub use metrics::PerformanceSummary;
pub use pairs::{run_pairs, MultiPairResult, PairDefinition, PairLeg, SkippedPair};
pub use runner::{
    run_factor_backtest, run_pair_backtest, run_pairs_backtest, FactorBacktestResult,
    PairBacktestResult, RunError, SCHEMA_VERSION,
};
pub use sweep::{run_sweep, GridPoint, ParamGrid, SweepEntry};
