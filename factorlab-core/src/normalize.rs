//! Z-score normalization: global (cross-sectional) and rolling (time series).
//!
//! Degenerate inputs never produce NaN or ±inf:
//! - global mode: zero or non-finite dispersion maps every present entry to 0.0,
//!   missing entries stay missing
//! - rolling mode: insufficient history, zero dispersion, and missing values all
//!   map to 0.0

use crate::domain::CrossSection;

/// Dispersion below this (relative to the mean's magnitude) is treated as zero.
const ZERO_STD_TOLERANCE: f64 = 1e-12;

/// Population mean and standard deviation (ddof = 0) of the finite values.
///
/// Returns `None` when there are no finite values.
pub fn mean_std(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    let present: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    if present.is_empty() {
        return None;
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let var = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, var.sqrt()))
}

fn is_degenerate(mean: f64, std: f64) -> bool {
    !std.is_finite() || std <= ZERO_STD_TOLERANCE * (1.0 + mean.abs())
}

/// Global z-score of a cross-section.
pub fn zscore(scores: &CrossSection) -> CrossSection {
    let Some((mean, std)) = mean_std(scores.iter().map(|(_, v)| v)) else {
        return CrossSection::new();
    };
    let degenerate = is_degenerate(mean, std);
    scores
        .iter()
        .map(|(name, v)| {
            let z = if degenerate { 0.0 } else { (v - mean) / std };
            (name.to_string(), z)
        })
        .collect()
}

/// Global z-score of a series. Missing (non-finite) entries stay NaN.
pub fn zscore_series(values: &[f64]) -> Vec<f64> {
    let Some((mean, std)) = mean_std(values.iter().copied()) else {
        return vec![f64::NAN; values.len()];
    };
    let degenerate = is_degenerate(mean, std);
    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                f64::NAN
            } else if degenerate {
                0.0
            } else {
                (v - mean) / std
            }
        })
        .collect()
}

/// Rolling z-score with a trailing window of `window` samples, requiring a
/// full window.
pub fn rolling_zscore(values: &[f64], window: usize) -> Vec<f64> {
    rolling_zscore_with_min_periods(values, window, window)
}

/// Rolling z-score requiring at least `min_periods` finite samples in each
/// trailing window. Every undefined output is coerced to 0.0.
pub fn rolling_zscore_with_min_periods(
    values: &[f64],
    window: usize,
    min_periods: usize,
) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    if window == 0 {
        return out;
    }
    let min_periods = min_periods.clamp(1, window);

    for (i, slot) in out.iter_mut().enumerate() {
        let current = values[i];
        if !current.is_finite() {
            continue;
        }
        let start = (i + 1).saturating_sub(window);
        let trailing = &values[start..=i];
        let finite = trailing.iter().filter(|v| v.is_finite()).count();
        if finite < min_periods {
            continue;
        }
        let Some((mean, std)) = mean_std(trailing.iter().copied()) else {
            continue;
        };
        if is_degenerate(mean, std) {
            continue;
        }
        let z = (current - mean) / std;
        if z.is_finite() {
            *slot = z;
        }
    }
    out
}

/// Normalize a series: global mode when `window` is `None`, rolling otherwise.
pub fn normalize(values: &[f64], window: Option<usize>) -> Vec<f64> {
    match window {
        None => zscore_series(values),
        Some(k) => rolling_zscore(values, k),
    }
}
