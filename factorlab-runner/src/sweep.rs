//! Parameter sweep over a grid of engine and factor settings.

use anyhow::{Context, Result};
use factorlab_core::domain::PricePanel;
use factorlab_core::schedule::RebalanceFrequency;
use rayon::prelude::*;
use std::cmp::Ordering;

use crate::config::{BacktestConfig, ConfigError};
use crate::metrics::PerformanceSummary;
use crate::runner::run_factor_backtest;

/// Parameter grid specification.
///
/// Every combination of the three axes is applied to a base configuration.
/// An empty axis keeps the base value.
#[derive(Debug, Clone, Default)]
pub struct ParamGrid {
    pub top_ns: Vec<usize>,
    pub momentum_lookbacks: Vec<usize>,
    pub frequencies: Vec<RebalanceFrequency>,
}

/// The settings one grid point changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub top_n: usize,
    pub momentum_lookback: Option<usize>,
    pub frequency: RebalanceFrequency,
}

impl ParamGrid {
    /// Top 10/20/50, 3/6/12 month momentum, monthly rebalancing.
    pub fn momentum_default() -> Self {
        Self {
            top_ns: vec![10, 20, 50],
            momentum_lookbacks: vec![63, 126, 252],
            frequencies: vec![RebalanceFrequency::MonthEnd],
        }
    }

    /// Total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.top_ns.len().max(1)
            * self.momentum_lookbacks.len().max(1)
            * self.frequencies.len().max(1)
    }

    /// Cartesian product of the axes applied to `base`.
    ///
    /// A momentum axis needs a base with at most one momentum factor.
    pub fn generate_configs(
        &self,
        base: &BacktestConfig,
    ) -> Result<Vec<(GridPoint, BacktestConfig)>, ConfigError> {
        let top_ns = axis(&self.top_ns, base.engine.top_n);
        let lookbacks: Vec<Option<usize>> = if self.momentum_lookbacks.is_empty() {
            vec![None]
        } else {
            self.momentum_lookbacks.iter().copied().map(Some).collect()
        };
        let frequencies = axis(&self.frequencies, base.engine.frequency);

        let mut configs = Vec::with_capacity(self.size());
        for &top_n in &top_ns {
            for &lookback in &lookbacks {
                for &frequency in &frequencies {
                    let mut config = base.clone();
                    config.engine.top_n = top_n;
                    config.engine.frequency = frequency;
                    if let Some(lookback) = lookback {
                        config.set_momentum_lookback(lookback)?;
                    }
                    let point = GridPoint {
                        top_n,
                        momentum_lookback: lookback,
                        frequency,
                    };
                    configs.push((point, config));
                }
            }
        }
        Ok(configs)
    }
}

fn axis<T: Copy>(values: &[T], base: T) -> Vec<T> {
    if values.is_empty() {
        vec![base]
    } else {
        values.to_vec()
    }
}

/// One evaluated grid point.
#[derive(Debug, Clone)]
pub struct SweepEntry {
    pub point: GridPoint,
    pub run_id: String,
    pub final_equity: f64,
    pub summary: PerformanceSummary,
}

/// Run every configuration of `grid` on `panel` in parallel and keep the
/// best `top_k`, ranked by Sharpe then CAGR, both descending.
///
/// Each configuration builds its own engine, so runs share nothing but the
/// read-only panel.
pub fn run_sweep(
    grid: &ParamGrid,
    base: &BacktestConfig,
    panel: &PricePanel,
    top_k: usize,
) -> Result<Vec<SweepEntry>> {
    let configs = grid
        .generate_configs(base)
        .context("cannot apply the sweep grid to the base config")?;

    let mut entries: Vec<SweepEntry> = configs
        .par_iter()
        .map(|(point, config)| -> Result<SweepEntry> {
            let result = run_factor_backtest(config, panel).with_context(|| {
                format!(
                    "sweep point top_n={} lookback={:?} frequency={}",
                    point.top_n, point.momentum_lookback, point.frequency
                )
            })?;
            Ok(SweepEntry {
                point: *point,
                run_id: result.run_id,
                final_equity: result.final_equity,
                summary: result.summary,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    entries.sort_by(|a, b| compare_entries(b, a));
    entries.truncate(top_k);
    tracing::info!(evaluated = configs.len(), kept = entries.len(), "sweep complete");
    Ok(entries)
}

/// Ascending order by (Sharpe, CAGR); NaN sorts lowest.
fn compare_entries(a: &SweepEntry, b: &SweepEntry) -> Ordering {
    let key = |e: &SweepEntry| {
        let clean = |v: f64| if v.is_nan() { f64::NEG_INFINITY } else { v };
        (clean(e.summary.sharpe), clean(e.summary.cagr))
    };
    let (ka, kb) = (key(a), key(b));
    ka.0.total_cmp(&kb.0).then(ka.1.total_cmp(&kb.1))
}
