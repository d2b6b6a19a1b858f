//! Backtest runner: wires configuration, engine and metrics together.
//!
//! Entry points take a pre-loaded price panel; loading data is the caller's
//! concern.
//! - `run_factor_backtest()`: cross-sectional factor rebalancing.
//! - `run_pair_backtest()`: a single pair.
//! - `run_pairs_backtest()`: the configured multi-pair portfolio.

use factorlab_core::domain::{EquityRow, PricePanel, TradeRecord};
use factorlab_core::engine::{EngineError, RebalanceEngine, RebalanceRecord, SkippedRebalance};
use factorlab_core::pair::{run_pair, PairError, PairRun};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::metrics::PerformanceSummary;
use crate::pairs::{run_pairs, MultiPairResult, PairDefinition};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Pair(#[from] PairError),
    #[error("no pair could be run")]
    NoPairs,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a factor rebalancing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorBacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub final_cash: f64,
    pub total_cost: f64,
    pub equity: Vec<EquityRow>,
    pub trades: Vec<TradeRecord>,
    pub rebalances: Vec<RebalanceRecord>,
    pub skipped: Vec<SkippedRebalance>,
    pub summary: PerformanceSummary,
}

/// Result of a single pair run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairBacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub pair: PairDefinition,
    pub run: PairRun,
    pub summary: PerformanceSummary,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run the configured factor composite over `panel`.
pub fn run_factor_backtest(
    config: &BacktestConfig,
    panel: &PricePanel,
) -> Result<FactorBacktestResult, RunError> {
    config.validate()?;
    let run_id = config.run_id()?;
    let engine = RebalanceEngine::new(config.to_engine_config(), config.build_factors())?;
    let run = engine.run(panel)?;

    let summary = PerformanceSummary::compute(
        &run.equity,
        run.trades.records(),
        config.risk_free_rate,
    );
    let final_equity = run.final_equity();
    let total_cost = run.total_cost();

    info!(
        run_id = %run_id,
        rebalances = run.rebalances.len(),
        skipped = run.skipped.len(),
        trades = run.trades.len(),
        final_equity,
        sharpe = summary.sharpe,
        "factor backtest complete"
    );

    Ok(FactorBacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        initial_capital: run.initial_capital,
        final_equity,
        final_cash: run.final_cash,
        total_cost,
        equity: run.equity.rows(),
        trades: run.trades.into_records(),
        rebalances: run.rebalances,
        skipped: run.skipped,
        summary,
    })
}

/// Run one pair on two panel columns.
pub fn run_pair_backtest(
    panel: &PricePanel,
    pair: &PairDefinition,
    capital: f64,
    risk_free_rate: f64,
) -> Result<PairBacktestResult, RunError> {
    let run = run_pair(panel, &pair.x, &pair.y, pair.params(), capital)?;
    let summary = PerformanceSummary::compute(&run.nav_curve(), &[], risk_free_rate);

    info!(
        pair = %pair.label(),
        hedge_ratio = run.hedge_ratio,
        transitions = run.transitions(),
        final_nav = run.final_nav(),
        "pair backtest complete"
    );

    Ok(PairBacktestResult {
        schema_version: SCHEMA_VERSION,
        pair: pair.clone(),
        run,
        summary,
    })
}

/// Run the configured `[[pairs]]` as one portfolio.
pub fn run_pairs_backtest(
    config: &BacktestConfig,
    panel: &PricePanel,
) -> Result<MultiPairResult, RunError> {
    config.validate()?;
    let portfolio = config.pairs_portfolio;
    run_pairs(
        panel,
        &config.pairs,
        portfolio.capital,
        portfolio.per_pair_capital,
        config.risk_free_rate,
    )
}
