//! Seeded synthetic price panels for tests and benchmarks.

use crate::domain::{PanelError, PricePanel};
use chrono::{Datelike, Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `n` consecutive weekdays starting on or after `start`.
pub fn business_days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    let mut out = Vec::with_capacity(n);
    let mut day = start;
    while out.len() < n {
        if day.weekday().num_days_from_monday() < 5 {
            out.push(day);
        }
        day += Duration::days(1);
    }
    out
}

/// Geometric random walks on a business-day index.
///
/// Each instrument draws its own drift in `[-drift, drift]` and then uniform
/// daily shocks scaled by `volatility`. The same seed always yields the same
/// panel.
#[derive(Debug, Clone)]
pub struct SyntheticPanel {
    pub start: NaiveDate,
    pub days: usize,
    pub instruments: usize,
    pub seed: u64,
    pub start_price: f64,
    pub drift: f64,
    pub volatility: f64,
    /// Probability that any cell after the first row is missing.
    pub missing_rate: f64,
}

impl Default for SyntheticPanel {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap_or_default(),
            days: 504,
            instruments: 10,
            seed: 42,
            start_price: 100.0,
            drift: 0.0005,
            volatility: 0.02,
            missing_rate: 0.0,
        }
    }
}

impl SyntheticPanel {
    pub fn new(instruments: usize, days: usize, seed: u64) -> Self {
        Self {
            instruments,
            days,
            seed,
            ..Self::default()
        }
    }

    pub fn with_missing_rate(mut self, rate: f64) -> Self {
        self.missing_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn instrument_name(i: usize) -> String {
        format!("S{i:03}")
    }

    pub fn generate(&self) -> Result<PricePanel, PanelError> {
        let dates = business_days(self.start, self.days);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let columns = (0..self.instruments)
            .map(|i| {
                let drift = rng.gen_range(-self.drift..=self.drift);
                let mut price = self.start_price;
                let column = (0..self.days)
                    .map(|row| {
                        if row > 0 {
                            let shock: f64 = rng.gen_range(-1.0..1.0);
                            price *= (1.0 + drift + self.volatility * shock).max(0.01);
                        }
                        if row > 0 && rng.gen::<f64>() < self.missing_rate {
                            f64::NAN
                        } else {
                            price
                        }
                    })
                    .collect();
                (Self::instrument_name(i), column)
            })
            .collect();
        PricePanel::from_columns(dates, columns)
    }
}

/// Two-column panel `X`, `Y` where `Y = beta·X + mean-reverting noise`.
///
/// The noise follows `e[t] = phi·e[t-1] + shock`, so the spread reverts when
/// `|phi| < 1`.
pub fn cointegrated_pair(
    days: usize,
    beta: f64,
    phi: f64,
    noise: f64,
    seed: u64,
) -> Result<PricePanel, PanelError> {
    let start = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap_or_default();
    let dates = business_days(start, days);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = Vec::with_capacity(days);
    let mut y = Vec::with_capacity(days);
    let mut px = 50.0;
    let mut e = 0.0;
    for row in 0..days {
        if row > 0 {
            px *= 1.0 + 0.01 * rng.gen_range(-1.0..1.0);
            e = phi * e + noise * rng.gen_range(-1.0..1.0);
        }
        x.push(px);
        y.push((beta * px + e).max(0.01));
    }
    PricePanel::from_columns(dates, vec![("X".to_string(), x), ("Y".to_string(), y)])
}
