//! Low volatility: negative realized volatility of daily returns, so calmer
//! instruments score higher.

use super::{return_volatility, score_columns, Factor};
use crate::domain::{CrossSection, PanelWindow};

#[derive(Debug, Clone)]
pub struct LowVolatility {
    lookback: usize,
    name: String,
}

impl LowVolatility {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback,
            name: format!("low_volatility_{lookback}"),
        }
    }
}

impl Default for LowVolatility {
    fn default() -> Self {
        Self::new(252)
    }
}

impl Factor for LowVolatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, window: &PanelWindow<'_>) -> CrossSection {
        score_columns(window, |col| {
            return_volatility(window.column(col), self.lookback).map(|v| -v)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::panel_from;

    #[test]
    fn calm_beats_choppy() {
        let panel = panel_from(&[
            ("CALM", &[100.0, 100.5, 101.0, 101.4, 102.0]),
            ("CHOPPY", &[100.0, 110.0, 95.0, 112.0, 90.0]),
        ]);
        let scores = LowVolatility::new(252).score(&panel.window(4));
        assert!(scores.get("CALM").unwrap() > scores.get("CHOPPY").unwrap());
        assert!(scores.get("CHOPPY").unwrap() < 0.0);
    }
}
