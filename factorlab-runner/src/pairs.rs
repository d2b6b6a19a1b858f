//! Multi-pair stat-arb portfolio.
//!
//! Every pair runs independently on its own inner-joined slice of the panel,
//! in parallel. The portfolio equity on the panel's date index is the sum of
//! the per-pair NAVs: a pair contributes its allocation before its first
//! valid date and carries its last NAV over days it has no row for.

use chrono::NaiveDate;
use factorlab_core::domain::{EquityCurve, EquityPoint, EquityRow, PricePanel};
use factorlab_core::pair::{run_pair, PairError, PairParams, PairRun};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::metrics::PerformanceSummary;
use crate::runner::{RunError, SCHEMA_VERSION};

/// One pair to trade: `y` is hedged against `x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairDefinition {
    pub x: String,
    pub y: String,
    #[serde(default = "default_lookback")]
    pub lookback: usize,
    #[serde(default = "default_entry_z")]
    pub entry_z: f64,
    #[serde(default = "default_exit_z")]
    pub exit_z: f64,
}

fn default_lookback() -> usize {
    PairParams::default().lookback
}

fn default_entry_z() -> f64 {
    PairParams::default().entry_z
}

fn default_exit_z() -> f64 {
    PairParams::default().exit_z
}

impl PairDefinition {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        let params = PairParams::default();
        Self {
            x: x.into(),
            y: y.into(),
            lookback: params.lookback,
            entry_z: params.entry_z,
            exit_z: params.exit_z,
        }
    }

    pub fn with_params(mut self, params: PairParams) -> Self {
        self.lookback = params.lookback;
        self.entry_z = params.entry_z;
        self.exit_z = params.exit_z;
        self
    }

    pub fn params(&self) -> PairParams {
        PairParams {
            lookback: self.lookback,
            entry_z: self.entry_z,
            exit_z: self.exit_z,
        }
    }

    /// `"Y/X"` label used in logs and reports.
    pub fn label(&self) -> String {
        format!("{}/{}", self.y, self.x)
    }
}

/// A pair that ran, with the capital it was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairLeg {
    pub definition: PairDefinition,
    pub allocation: f64,
    pub run: PairRun,
}

/// A pair left out of the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPair {
    pub definition: PairDefinition,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPairResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub legs: Vec<PairLeg>,
    pub skipped: Vec<SkippedPair>,
    pub equity: Vec<EquityRow>,
    pub summary: PerformanceSummary,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl MultiPairResult {
    pub fn final_equity(&self) -> Option<f64> {
        self.equity.last().map(|row| row.equity)
    }

    pub fn returns(&self) -> Vec<f64> {
        self.equity.iter().map(|row| row.daily_return).collect()
    }
}

/// Run every pair and aggregate the NAVs into one portfolio equity curve.
///
/// Each pair gets `per_pair_capital` or, when unset, `capital / pairs.len()`.
/// Pairs whose instruments are missing or whose hedge cannot be fitted are
/// skipped with a warning; it is an error only when none survive.
pub fn run_pairs(
    panel: &PricePanel,
    pairs: &[PairDefinition],
    capital: f64,
    per_pair_capital: Option<f64>,
    risk_free_rate: f64,
) -> Result<MultiPairResult, RunError> {
    if pairs.is_empty() {
        return Err(RunError::NoPairs);
    }
    let allocation = per_pair_capital.unwrap_or(capital / pairs.len() as f64);
    if !allocation.is_finite() || allocation <= 0.0 {
        return Err(PairError::InvalidCapital(allocation).into());
    }

    let outcomes: Vec<(&PairDefinition, Result<PairRun, PairError>)> = pairs
        .par_iter()
        .map(|def| (def, run_pair(panel, &def.x, &def.y, def.params(), allocation)))
        .collect();

    let mut legs = Vec::new();
    let mut skipped = Vec::new();
    for (definition, outcome) in outcomes {
        match outcome {
            Ok(run) => legs.push(PairLeg {
                definition: definition.clone(),
                allocation,
                run,
            }),
            Err(e) => {
                warn!(pair = %definition.label(), error = %e, "pair skipped");
                skipped.push(SkippedPair {
                    definition: definition.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    if legs.is_empty() {
        return Err(RunError::NoPairs);
    }

    let curve = aggregate_nav(panel.dates(), &legs);
    let summary = PerformanceSummary::compute(&curve, &[], risk_free_rate);
    info!(
        pairs = legs.len(),
        skipped = skipped.len(),
        final_equity = curve.last().map(|p| p.equity).unwrap_or(0.0),
        "multi-pair run complete"
    );

    Ok(MultiPairResult {
        schema_version: SCHEMA_VERSION,
        legs,
        skipped,
        equity: curve.rows(),
        summary,
    })
}

/// Sum of per-pair NAVs on `dates`.
pub fn aggregate_nav(dates: &[NaiveDate], legs: &[PairLeg]) -> EquityCurve {
    let navs: Vec<EquityCurve> = legs.iter().map(|leg| leg.run.nav_curve()).collect();
    dates
        .iter()
        .map(|&date| {
            let equity = legs
                .iter()
                .zip(&navs)
                .map(|(leg, nav)| nav.value_as_of(date).unwrap_or(leg.allocation))
                .sum();
            EquityPoint { date, equity }
        })
        .collect()
}
