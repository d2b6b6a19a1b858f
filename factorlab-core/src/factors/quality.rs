//! Quality proxy: stability of returns over roughly one quarter.
//!
//! Without fundamentals, quality is approximated as negative return
//! volatility over a short lookback.

use super::{return_volatility, score_columns, Factor};
use crate::domain::{CrossSection, PanelWindow};

#[derive(Debug, Clone)]
pub struct Quality {
    lookback: usize,
    name: String,
}

impl Quality {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback,
            name: format!("quality_{lookback}"),
        }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::new(63)
    }
}

impl Factor for Quality {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, window: &PanelWindow<'_>) -> CrossSection {
        score_columns(window, |col| {
            return_volatility(window.column(col), self.lookback).map(|v| -v)
        })
    }
}
