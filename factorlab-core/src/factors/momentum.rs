//! Momentum: trailing price return over a lookback.
//!
//! score = price[last] / price[last - lookback] - 1
//! The lookback shrinks to `len - 1` when the window is shorter.

use super::{score_columns, Factor};
use crate::domain::{CrossSection, PanelWindow};

#[derive(Debug, Clone)]
pub struct Momentum {
    lookback: usize,
    name: String,
}

impl Momentum {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback,
            name: format!("momentum_{lookback}"),
        }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }
}

impl Default for Momentum {
    fn default() -> Self {
        Self::new(252)
    }
}

impl Factor for Momentum {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, window: &PanelWindow<'_>) -> CrossSection {
        let n = window.len();
        if n < 2 {
            return CrossSection::new();
        }
        let lookback = self.lookback.clamp(1, n - 1);
        let anchor = n - 1 - lookback;
        score_columns(window, |col| {
            let last = window.last_price(col)?;
            let first = window.price(anchor, col)?;
            let ret = last / first - 1.0;
            ret.is_finite().then_some(ret)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::panel_from;

    #[test]
    fn momentum_ranks_winners_first() {
        let panel = panel_from(&[
            ("UP", &[100.0, 105.0, 110.0, 120.0]),
            ("DOWN", &[100.0, 95.0, 90.0, 80.0]),
        ]);
        let scores = Momentum::new(3).score(&panel.window(3));
        assert!((scores.get("UP").unwrap() - 0.2).abs() < 1e-12);
        assert!((scores.get("DOWN").unwrap() + 0.2).abs() < 1e-12);
    }

    #[test]
    fn lookback_shrinks_on_short_history() {
        let panel = panel_from(&[("A", &[50.0, 100.0])]);
        let scores = Momentum::new(252).score(&panel.window(1));
        assert!((scores.get("A").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_anchor_price_is_omitted() {
        let panel = panel_from(&[("A", &[f64::NAN, 1.0, 2.0]), ("B", &[1.0, 1.0, 2.0])]);
        let scores = Momentum::new(2).score(&panel.window(2));
        assert!(!scores.contains("A"));
        assert!(scores.contains("B"));
    }

    #[test]
    fn single_row_window_scores_nothing() {
        let panel = panel_from(&[("A", &[1.0, 2.0])]);
        assert!(Momentum::new(1).score(&panel.window(0)).is_empty());
    }
}
