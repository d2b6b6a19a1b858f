//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve, returns and/or trade log in,
//! scalar out. No dependencies on the engine, so pair and factor runs share
//! one aggregator.

use chrono::NaiveDate;
use factorlab_core::domain::{EquityCurve, TradeRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trading days per year, used when the index spacing cannot be inferred and
/// to annualize turnover.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

const DAYS_PER_YEAR: f64 = 365.25;

/// Aggregate performance summary for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub cagr: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub turnover: f64,
    pub total_return: f64,
    pub sortino: f64,
    pub calmar: f64,
}

impl PerformanceSummary {
    /// Compute every metric from an equity curve and its trade log.
    pub fn compute(curve: &EquityCurve, trades: &[TradeRecord], risk_free_rate: f64) -> Self {
        let returns = curve.returns();
        let dates = curve.dates();
        Self {
            cagr: cagr(curve),
            sharpe: sharpe_ratio(&returns, &dates, risk_free_rate),
            max_drawdown: max_drawdown(curve),
            turnover: turnover(trades, curve),
            total_return: total_return(curve),
            sortino: sortino_ratio(&returns, &dates, risk_free_rate),
            calmar: calmar_ratio(curve),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: final / initial - 1.
pub fn total_return(curve: &EquityCurve) -> f64 {
    match (curve.first(), curve.last()) {
        (Some(first), Some(last)) if curve.len() >= 2 && first.equity > 0.0 => {
            last.equity / first.equity - 1.0
        }
        _ => 0.0,
    }
}

/// Compound annual growth rate over calendar time.
///
/// Years are `(last - first) days / 365.25`. Returns 0.0 for an empty curve,
/// a non-positive start or end, or a zero span.
pub fn cagr(curve: &EquityCurve) -> f64 {
    let (Some(first), Some(last)) = (curve.first(), curve.last()) else {
        return 0.0;
    };
    if first.equity <= 0.0 || last.equity <= 0.0 {
        return 0.0;
    }
    let days = (last.date - first.date).num_days();
    if days <= 0 {
        return 0.0;
    }
    let years = days as f64 / DAYS_PER_YEAR;
    (last.equity / first.equity).powf(1.0 / years) - 1.0
}

/// Observations per year implied by the median spacing of `dates`.
///
/// Falls back to 252 with fewer than two dates, a non-positive median, or a
/// result outside `1..=365`.
pub fn periods_per_year(dates: &[NaiveDate]) -> f64 {
    if dates.len() < 2 {
        return TRADING_DAYS_PER_YEAR;
    }
    let mut gaps: Vec<i64> = dates.windows(2).map(|w| (w[1] - w[0]).num_days()).collect();
    gaps.sort_unstable();
    let mid = gaps.len() / 2;
    let median = if gaps.len() % 2 == 0 {
        (gaps[mid - 1] + gaps[mid]) as f64 / 2.0
    } else {
        gaps[mid] as f64
    };
    if median <= 0.0 {
        return TRADING_DAYS_PER_YEAR;
    }
    let ppy = (DAYS_PER_YEAR / median).round();
    if (1.0..=365.0).contains(&ppy) {
        ppy
    } else {
        TRADING_DAYS_PER_YEAR
    }
}

/// Annualized Sharpe ratio.
///
/// Sharpe = mean(r - rf/ppy) / std(r - rf/ppy) * sqrt(ppy), population std,
/// with `ppy` inferred from `dates`. Returns 0.0 when std is zero or
/// non-finite or fewer than 2 returns.
pub fn sharpe_ratio(returns: &[f64], dates: &[NaiveDate], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let ppy = periods_per_year(dates);
    let excess = excess_returns(returns, risk_free_rate, ppy);
    let mean = mean_f64(&excess);
    let std = std_dev(&excess);
    if !std.is_finite() || std < 1e-15 {
        return 0.0;
    }
    (mean / std) * ppy.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
///
/// Returns 0.0 if there is no downside or fewer than 2 returns.
pub fn sortino_ratio(returns: &[f64], dates: &[NaiveDate], risk_free_rate: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let ppy = periods_per_year(dates);
    let excess = excess_returns(returns, risk_free_rate, ppy);
    let mean = mean_f64(&excess);

    let downside_sq: f64 = excess.iter().filter(|r| **r < 0.0).map(|r| r * r).sum();
    if downside_sq <= 0.0 {
        return 0.0;
    }
    let downside_std = (downside_sq / excess.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    (mean / downside_std) * ppy.sqrt()
}

/// Calmar ratio: CAGR / |max drawdown|.
///
/// Returns 0.0 if max drawdown is zero or CAGR is non-positive.
pub fn calmar_ratio(curve: &EquityCurve) -> f64 {
    let c = cagr(curve);
    let dd = max_drawdown(curve);
    if dd >= 0.0 || c <= 0.0 {
        return 0.0;
    }
    c / dd.abs()
}

/// Maximum drawdown as a negative fraction (e.g. -0.15 = 15% drawdown).
pub fn max_drawdown(curve: &EquityCurve) -> f64 {
    curve.drawdowns().into_iter().fold(0.0_f64, f64::min)
}

/// Annualized turnover.
///
/// Absolute notional is summed per trade date and divided by the equity as of
/// that date; the daily ratios are summed and scaled by
/// `252 / max(days between first and last trade date, 1)`.
pub fn turnover(trades: &[TradeRecord], curve: &EquityCurve) -> f64 {
    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for trade in trades {
        *per_day.entry(trade.date).or_default() += trade.abs_notional();
    }
    let (Some(first), Some(last)) = (per_day.keys().next(), per_day.keys().next_back()) else {
        return 0.0;
    };
    let days = (*last - *first).num_days().max(1) as f64;

    let ratio: f64 = per_day
        .iter()
        .filter_map(|(date, notional)| {
            curve
                .value_as_of(*date)
                .or_else(|| curve.first().map(|p| p.equity))
                .filter(|base| *base > 0.0)
                .map(|base| notional / base)
        })
        .sum();
    ratio * TRADING_DAYS_PER_YEAR / days
}

// ─── Helpers ────────────────────────────────────────────────────────

fn excess_returns(returns: &[f64], risk_free_rate: f64, ppy: f64) -> Vec<f64> {
    let rf = risk_free_rate / ppy;
    returns.iter().map(|r| r - rf).collect()
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
