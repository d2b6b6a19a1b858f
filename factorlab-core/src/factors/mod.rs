//! Factor trait and concrete cross-sectional factor variants.
//!
//! A factor is a pure function of a trailing price window: it scores every
//! instrument at the window's last row. Instruments whose score is undefined
//! (missing prices, too little history, non-finite arithmetic) are simply
//! absent from the returned cross-section.

pub mod momentum;
pub mod quality;
pub mod size;
pub mod value;
pub mod volatility;

pub use momentum::Momentum;
pub use quality::Quality;
pub use size::Size;
pub use value::Value;
pub use volatility::LowVolatility;

use crate::domain::{CrossSection, PanelWindow};
use serde::{Deserialize, Serialize};

/// A cross-sectional scoring rule.
///
/// Implementations must only read the window they are given; the engine hands
/// them a view that ends at the rebalance date.
pub trait Factor: Send + Sync {
    /// Human-readable name, also the key used for weighting.
    fn name(&self) -> &str;

    /// Score every instrument at the last row of `window`. Higher is preferred.
    fn score(&self, window: &PanelWindow<'_>) -> CrossSection;
}

/// Serializable description of a factor, used by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactorSpec {
    Momentum {
        #[serde(default = "default_long_lookback")]
        lookback: usize,
    },
    Volatility {
        #[serde(default = "default_long_lookback")]
        lookback: usize,
    },
    Quality {
        #[serde(default = "default_quarter")]
        lookback: usize,
    },
    Size {
        #[serde(default = "default_quarter")]
        window: usize,
    },
    Value,
}

fn default_long_lookback() -> usize {
    252
}

fn default_quarter() -> usize {
    63
}

impl FactorSpec {
    pub fn build(&self) -> Box<dyn Factor> {
        match *self {
            FactorSpec::Momentum { lookback } => Box::new(Momentum::new(lookback)),
            FactorSpec::Volatility { lookback } => Box::new(LowVolatility::new(lookback)),
            FactorSpec::Quality { lookback } => Box::new(Quality::new(lookback)),
            FactorSpec::Size { window } => Box::new(Size::new(window)),
            FactorSpec::Value => Box::new(Value),
        }
    }

    /// Name of the factor this spec builds.
    pub fn name(&self) -> String {
        self.build().name().to_string()
    }
}

/// Sample standard deviation (ddof = 1) of the simple returns over the last
/// `lookback` return periods of `column`.
///
/// The lookback shrinks to `len - 2` when the column is short. Returns
/// involving a missing price are dropped. `None` when fewer than two returns
/// remain.
pub(crate) fn return_volatility(column: &[f64], lookback: usize) -> Option<f64> {
    let n = column.len();
    if n < 3 {
        return None;
    }
    let lookback = if n < lookback + 2 { n - 2 } else { lookback };
    let start = n - lookback;

    let returns: Vec<f64> = (start..n)
        .filter_map(|i| {
            let prev = column[i - 1];
            let curr = column[i];
            let valid = |p: f64| p.is_finite() && p > 0.0;
            if valid(prev) && valid(curr) {
                Some(curr / prev - 1.0)
            } else {
                None
            }
        })
        .collect();

    if returns.len() < 2 {
        return None;
    }
    let m = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / m;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (m - 1.0);
    let std = var.sqrt();
    std.is_finite().then_some(std)
}

/// Score every column of `window` with `f`, keeping finite results only.
pub(crate) fn score_columns(
    window: &PanelWindow<'_>,
    f: impl Fn(usize) -> Option<f64>,
) -> CrossSection {
    let mut out = CrossSection::with_capacity(window.instruments().len());
    for (col, name) in window.instruments().iter().enumerate() {
        if let Some(score) = f(col) {
            out.insert(name.clone(), score);
        }
    }
    out
}

#[cfg(test)]
pub(crate) fn panel_from(columns: &[(&str, &[f64])]) -> crate::domain::PricePanel {
    let n = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let dates = (0..n)
        .map(|i| base + chrono::Duration::days(i as i64))
        .collect();
    crate::domain::PricePanel::from_columns(
        dates,
        columns
            .iter()
            .map(|(name, c)| (name.to_string(), c.to_vec()))
            .collect(),
    )
    .unwrap()
}
