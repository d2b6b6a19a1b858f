//! Value proxy: inverse of the latest price.

use super::{score_columns, Factor};
use crate::domain::{CrossSection, PanelWindow};

#[derive(Debug, Clone, Copy, Default)]
pub struct Value;

impl Factor for Value {
    fn name(&self) -> &str {
        "value"
    }

    fn score(&self, window: &PanelWindow<'_>) -> CrossSection {
        score_columns(window, |col| window.last_price(col).map(|p| 1.0 / p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::panel_from;

    #[test]
    fn inverse_of_last_price() {
        let panel = panel_from(&[("A", &[1.0, 4.0]), ("B", &[1.0, 0.0]), ("C", &[1.0, f64::NAN])]);
        let scores = Value.score(&panel.window(1));
        assert_eq!(scores.get("A"), Some(0.25));
        assert!(!scores.contains("B"));
        assert!(!scores.contains("C"));
    }
}
