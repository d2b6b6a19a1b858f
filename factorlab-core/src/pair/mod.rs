//! Pair statistical arbitrage: hedge ratio, spread z-score, hysteresis
//! position, P&L and normalized NAV.
//!
//! - β is fitted once over the whole aligned history (OLS through the origin)
//! - spread = y - β·x, z = rolling z-score of the spread over `lookback`
//! - pnl[t] = position[t-1] × -(spread[t] - spread[t-1])
//! - return[t] = pnl[t] / (|y[t-1]| + |β|·|x[t-1]|), zero when that is zero
//! - nav = capital × Π(1 + return)

pub mod state;

pub use state::SpreadPosition;

use crate::domain::{EquityCurve, EquityPoint, PanelError, PricePanel};
use crate::normalize::rolling_zscore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PairError {
    #[error(transparent)]
    Panel(#[from] PanelError),

    #[error("series lengths differ: {dates} dates, {x} x prices, {y} y prices")]
    LengthMismatch { dates: usize, x: usize, y: usize },

    #[error("need at least 2 aligned observations, got {0}")]
    InsufficientData(usize),

    #[error("hedge ratio undefined: x has no variation around zero")]
    DegenerateHedge,

    #[error("lookback must be at least 1")]
    ZeroLookback,

    #[error("thresholds must satisfy entry_z >= exit_z >= 0, got entry {entry_z}, exit {exit_z}")]
    InvalidThresholds { entry_z: f64, exit_z: f64 },

    #[error("initial capital must be positive and finite, got {0}")]
    InvalidCapital(f64),
}

/// Z-score window and hysteresis thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairParams {
    pub lookback: usize,
    pub entry_z: f64,
    pub exit_z: f64,
}

impl Default for PairParams {
    fn default() -> Self {
        Self {
            lookback: 60,
            entry_z: 2.0,
            exit_z: 0.5,
        }
    }
}

impl PairParams {
    pub fn validate(&self) -> Result<(), PairError> {
        if self.lookback == 0 {
            return Err(PairError::ZeroLookback);
        }
        let ordered = self.exit_z >= 0.0 && self.entry_z >= self.exit_z;
        if !ordered || !self.entry_z.is_finite() {
            return Err(PairError::InvalidThresholds {
                entry_z: self.entry_z,
                exit_z: self.exit_z,
            });
        }
        Ok(())
    }
}

/// OLS slope through the origin, `Σxy / Σx²`, over rows where both values
/// are finite. `None` with fewer than two such rows or when `Σx² = 0`.
pub fn hedge_ratio(x: &[f64], y: &[f64]) -> Option<f64> {
    let (mut sxy, mut sxx, mut n) = (0.0, 0.0, 0usize);
    for (&xi, &yi) in x.iter().zip(y) {
        if xi.is_finite() && yi.is_finite() {
            sxy += xi * yi;
            sxx += xi * xi;
            n += 1;
        }
    }
    if n < 2 || sxx <= 0.0 {
        return None;
    }
    let beta = sxy / sxx;
    beta.is_finite().then_some(beta)
}

/// One day of a pair run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairRow {
    pub date: NaiveDate,
    pub x: f64,
    pub y: f64,
    pub spread: f64,
    pub zscore: f64,
    pub position: SpreadPosition,
    /// P&L in spread units.
    pub pnl: f64,
    /// Cumulative P&L in spread units.
    pub equity: f64,
    pub daily_return: f64,
    pub nav: f64,
    /// Drawdown of the NAV from its running peak.
    pub drawdown: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRun {
    pub hedge_ratio: f64,
    pub params: PairParams,
    pub initial_capital: f64,
    pub rows: Vec<PairRow>,
}

impl PairRun {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn positions(&self) -> Vec<SpreadPosition> {
        self.rows.iter().map(|r| r.position).collect()
    }

    pub fn zscores(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.zscore).collect()
    }

    pub fn returns(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.daily_return).collect()
    }

    /// Normalized NAV as an equity curve.
    pub fn nav_curve(&self) -> EquityCurve {
        self.rows
            .iter()
            .map(|r| EquityPoint {
                date: r.date,
                equity: r.nav,
            })
            .collect()
    }

    pub fn final_nav(&self) -> f64 {
        self.rows.last().map(|r| r.nav).unwrap_or(self.initial_capital)
    }

    /// Number of days on which the position changed.
    pub fn transitions(&self) -> usize {
        let mut previous = SpreadPosition::Flat;
        let mut count = 0;
        for row in &self.rows {
            if row.position != previous {
                count += 1;
            }
            previous = row.position;
        }
        count
    }
}

/// Run a pair on two named panel columns, joined on rows where both have a
/// valid price.
pub fn run_pair(
    panel: &PricePanel,
    x: &str,
    y: &str,
    params: PairParams,
    capital: f64,
) -> Result<PairRun, PairError> {
    let aligned = panel.aligned_pair(x, y)?;
    run_pair_series(&aligned.dates, &aligned.x, &aligned.y, params, capital)
}

/// Run a pair on explicit series. Rows where either price is missing or
/// non-positive are dropped before fitting.
pub fn run_pair_series(
    dates: &[NaiveDate],
    x: &[f64],
    y: &[f64],
    params: PairParams,
    capital: f64,
) -> Result<PairRun, PairError> {
    params.validate()?;
    if !capital.is_finite() || capital <= 0.0 {
        return Err(PairError::InvalidCapital(capital));
    }
    if dates.len() != x.len() || dates.len() != y.len() {
        return Err(PairError::LengthMismatch {
            dates: dates.len(),
            x: x.len(),
            y: y.len(),
        });
    }

    let valid = |p: f64| p.is_finite() && p > 0.0;
    let (mut d, mut xs, mut ys) = (Vec::new(), Vec::new(), Vec::new());
    for i in 0..dates.len() {
        if valid(x[i]) && valid(y[i]) {
            d.push(dates[i]);
            xs.push(x[i]);
            ys.push(y[i]);
        }
    }
    if d.len() < 2 {
        return Err(PairError::InsufficientData(d.len()));
    }

    let beta = hedge_ratio(&xs, &ys).ok_or(PairError::DegenerateHedge)?;
    let spread: Vec<f64> = xs.iter().zip(&ys).map(|(xi, yi)| yi - beta * xi).collect();
    let z = rolling_zscore(&spread, params.lookback);

    let mut rows = Vec::with_capacity(d.len());
    let mut position = SpreadPosition::Flat;
    let mut equity = 0.0;
    let mut nav = capital;
    let mut peak = capital;

    for t in 0..d.len() {
        let (pnl, daily_return) = if t == 0 {
            (0.0, 0.0)
        } else {
            let pnl = position.as_f64() * -(spread[t] - spread[t - 1]);
            let notional = ys[t - 1].abs() + beta.abs() * xs[t - 1].abs();
            let ret = if notional > 0.0 { pnl / notional } else { 0.0 };
            (pnl, ret)
        };
        // today's position only earns from tomorrow
        position = position.next(z[t], params.entry_z, params.exit_z);
        equity += pnl;
        nav *= 1.0 + daily_return;
        peak = peak.max(nav);

        rows.push(PairRow {
            date: d[t],
            x: xs[t],
            y: ys[t],
            spread: spread[t],
            zscore: z[t],
            position,
            pnl,
            equity,
            daily_return,
            nav,
            drawdown: nav / peak - 1.0,
        });
    }

    Ok(PairRun {
        hedge_ratio: beta,
        params,
        initial_capital: capital,
        rows,
    })
}
