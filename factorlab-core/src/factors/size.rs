//! Size proxy: negative average price over a trailing window.

use super::{score_columns, Factor};
use crate::domain::{CrossSection, PanelWindow};

#[derive(Debug, Clone)]
pub struct Size {
    window: usize,
    name: String,
}

impl Size {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            name: format!("size_{window}"),
        }
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(63)
    }
}

impl Factor for Size {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, window: &PanelWindow<'_>) -> CrossSection {
        let n = window.len();
        let start = if n >= self.window { n - self.window } else { 0 };
        score_columns(window, |col| {
            let prices: Vec<f64> = (start..n).filter_map(|row| window.price(row, col)).collect();
            if prices.is_empty() {
                return None;
            }
            let mean = prices.iter().sum::<f64>() / prices.len() as f64;
            Some(-mean)
        })
    }
}
