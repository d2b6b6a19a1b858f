//! Integration tests for the runner on deterministic synthetic panels.
//!
//! Tests:
//! 1. A factor run from TOML produces equity rows, trades and a summary
//! 2. Identical configs reproduce identical results and run ids
//! 3. Costs lower the final equity and raise the reported cost
//! 4. A single pair and a multi-pair portfolio aggregate consistently
//! 5. Results serialize to JSON and back

use factorlab_core::data::{cointegrated_pair, SyntheticPanel};
use factorlab_core::domain::PricePanel;
use factorlab_runner::{
    run_factor_backtest, run_pair_backtest, run_pairs_backtest, BacktestConfig,
    FactorBacktestResult, PairDefinition, RunError, SCHEMA_VERSION,
};

const FACTOR_CONFIG: &str = r#"
risk_free_rate = 0.01

[engine]
initial_capital = 100000.0
top_n = 3
short_fraction = 0.5
frequency = "M"
min_history = 30

[[factors]]
weight = 0.5
factor = { kind = "momentum", lookback = 60 }

[[factors]]
weight = 0.3
factor = { kind = "volatility", lookback = 60 }

[[factors]]
weight = 0.2
factor = { kind = "size", window = 20 }
"#;

fn synthetic(instruments: usize, days: usize) -> PricePanel {
    SyntheticPanel::new(instruments, days, 42).generate().unwrap()
}

fn pair_panel() -> PricePanel {
    let a = cointegrated_pair(400, 1.5, 0.8, 1.0, 11).unwrap();
    let b = cointegrated_pair(400, 0.7, 0.6, 0.5, 12).unwrap();
    let col = |p: &PricePanel, name: &str| p.column(p.column_index(name).unwrap()).to_vec();
    PricePanel::from_columns(
        a.dates().to_vec(),
        vec![
            ("KO".to_string(), col(&a, "X")),
            ("PEP".to_string(), col(&a, "Y")),
            ("XOM".to_string(), col(&b, "X")),
            ("CVX".to_string(), col(&b, "Y")),
        ],
    )
    .unwrap()
}

// ── 1. Factor run ────────────────────────────────────────────────────

#[test]
fn factor_run_from_toml() {
    let config = BacktestConfig::from_toml_str(FACTOR_CONFIG).unwrap();
    let panel = synthetic(12, 300);
    let result = run_factor_backtest(&config, &panel).unwrap();

    assert_eq!(result.schema_version, SCHEMA_VERSION);
    assert!(!result.rebalances.is_empty());
    assert!(!result.trades.is_empty());
    assert!(!result.equity.is_empty());
    assert_eq!(result.final_equity, result.equity.last().unwrap().equity);
    assert_eq!(result.equity[0].daily_return, 0.0);
    assert!(result.equity.iter().all(|row| row.drawdown <= 0.0));
    assert!(result.summary.max_drawdown <= 0.0);
    assert!(result.summary.turnover > 0.0);
    assert!(result.summary.sharpe.is_finite());

    // Longs and shorts at every rebalance, never the same name on both sides.
    for record in &result.rebalances {
        assert!(record.longs.len() <= 3);
        assert!(record.shorts.iter().all(|s| !record.longs.contains(s)));
    }
}

#[test]
fn pairs_only_config_cannot_run_factors() {
    let config = BacktestConfig::from_toml_str(
        r#"
[[pairs]]
x = "KO"
y = "PEP"
"#,
    )
    .unwrap();
    let err = run_factor_backtest(&config, &pair_panel()).unwrap_err();
    assert!(matches!(err, RunError::Engine(_)));
}

#[test]
fn error_chain_names_each_cause_once() {
    let mut config = BacktestConfig::from_toml_str(FACTOR_CONFIG).unwrap();
    config.engine.top_n = 0;
    let err = run_factor_backtest(&config, &synthetic(6, 200)).unwrap_err();
    assert!(matches!(err, RunError::Config(_)));

    let chain = format!("{:#}", anyhow::Error::from(err));
    assert_eq!(chain, "invalid engine settings: top_n must be at least 1");
}

// ── 2. Reproducibility ───────────────────────────────────────────────

#[test]
fn identical_configs_reproduce() {
    let config = BacktestConfig::from_toml_str(FACTOR_CONFIG).unwrap();
    let panel = synthetic(8, 250);
    let a = run_factor_backtest(&config, &panel).unwrap();
    let b = run_factor_backtest(&config.clone(), &panel).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.run_id, config.run_id().unwrap());
}

// ── 3. Costs ─────────────────────────────────────────────────────────

#[test]
fn costs_never_help() {
    let panel = synthetic(10, 300);
    let free = BacktestConfig::from_toml_str(FACTOR_CONFIG).unwrap();
    let mut costly = free.clone();
    costly.engine.costs.commission_bps = 5.0;
    costly.engine.costs.slippage_bps = 10.0;

    let a = run_factor_backtest(&free, &panel).unwrap();
    let b = run_factor_backtest(&costly, &panel).unwrap();
    assert_eq!(a.total_cost, 0.0);
    assert!(b.total_cost > 0.0);
    assert!(b.final_equity <= a.final_equity);
    assert_ne!(a.run_id, b.run_id);
}

// ── 4. Pairs ─────────────────────────────────────────────────────────

#[test]
fn single_pair_summary_matches_nav() {
    let panel = pair_panel();
    let pair = PairDefinition::new("KO", "PEP");
    let result = run_pair_backtest(&panel, &pair, 10_000.0, 0.0).unwrap();
    assert_eq!(result.run.len(), panel.len());
    let nav = result.run.final_nav();
    assert!((result.summary.total_return - (nav / 10_000.0 - 1.0)).abs() < 1e-9);
    assert_eq!(result.summary.turnover, 0.0);
}

#[test]
fn portfolio_sums_pair_navs() {
    let config = BacktestConfig::from_toml_str(
        r#"
[[pairs]]
x = "KO"
y = "PEP"
lookback = 30

[[pairs]]
x = "XOM"
y = "CVX"
lookback = 20
entry_z = 1.5

[[pairs]]
x = "KO"
y = "GONE"

[pairs_portfolio]
capital = 30000.0
"#,
    )
    .unwrap();
    let panel = pair_panel();
    let result = run_pairs_backtest(&config, &panel).unwrap();

    assert_eq!(result.legs.len(), 2);
    assert_eq!(result.skipped.len(), 1);
    assert!(result.legs.iter().all(|leg| leg.allocation == 10_000.0));
    assert_eq!(result.equity.len(), panel.len());

    let expected: f64 = result.legs.iter().map(|leg| leg.run.final_nav()).sum();
    assert!((result.final_equity().unwrap() - expected).abs() < 1e-6);
    assert_eq!(result.equity[0].equity, 20_000.0);
}

#[test]
fn per_pair_capital_overrides_split() {
    let mut config = BacktestConfig::from_toml_str(
        r#"
[[pairs]]
x = "KO"
y = "PEP"

[pairs_portfolio]
capital = 100000.0
per_pair_capital = 2500.0
"#,
    )
    .unwrap();
    let panel = pair_panel();
    let result = run_pairs_backtest(&config, &panel).unwrap();
    assert_eq!(result.legs[0].allocation, 2_500.0);

    config.pairs.clear();
    config.factors.clear();
    assert!(matches!(
        run_pairs_backtest(&config, &panel),
        Err(RunError::Config(_))
    ));
}

// ── 5. Serialization ─────────────────────────────────────────────────

#[test]
fn factor_result_json_roundtrip() {
    let config = BacktestConfig::from_toml_str(FACTOR_CONFIG).unwrap();
    let result = run_factor_backtest(&config, &synthetic(6, 200)).unwrap();
    let json = serde_json::to_string(&result).unwrap();
    let back: FactorBacktestResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.run_id, result.run_id);
    assert_eq!(back.trades.len(), result.trades.len());
    assert_eq!(back.equity.len(), result.equity.len());
}
