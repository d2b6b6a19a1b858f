//! Composite ranking: weighted sum of independently normalized factor scores.

use crate::domain::CrossSection;
use crate::normalize::zscore;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RankError {
    #[error("factor weights must sum to a positive finite value, got {0}")]
    InvalidWeightSum(f64),
}

/// Combine factor cross-sections into one ranking, highest score first.
///
/// Each factor is z-scored on its own, then weighted by `weight / Σ weights`.
/// An instrument missing from a factor gets no term from it; an instrument
/// missing from every factor is not ranked. Ties keep the order in which
/// instruments first appear across the factors (in factor-name order).
pub fn composite_rank(
    factors: &BTreeMap<String, CrossSection>,
    weights: &BTreeMap<String, f64>,
) -> Result<CrossSection, RankError> {
    if factors.is_empty() {
        return Ok(CrossSection::new());
    }

    let weight_sum: f64 = weights.values().sum();
    if !weight_sum.is_finite() || weight_sum <= 0.0 {
        return Err(RankError::InvalidWeightSum(weight_sum));
    }

    let mut composite = CrossSection::new();
    let normalized: Vec<(f64, CrossSection)> = factors
        .iter()
        .map(|(name, scores)| {
            let w = weights.get(name).copied().unwrap_or(0.0) / weight_sum;
            (w, zscore(scores))
        })
        .collect();

    for (_, z) in &normalized {
        for name in z.names() {
            if composite.contains(name) {
                continue;
            }
            let score: f64 = normalized
                .iter()
                .filter_map(|(w, other)| other.get(name).map(|v| w * v))
                .sum();
            composite.insert(name, score);
        }
    }

    composite.sort_descending();
    Ok(composite)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cs(values: &[(&str, f64)]) -> CrossSection {
        values.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    fn weights(values: &[(&str, f64)]) -> BTreeMap<String, f64> {
        values.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn single_factor_preserves_order() {
        let mut factors = BTreeMap::new();
        factors.insert("momentum".to_string(), cs(&[("A", 0.1), ("B", 0.3), ("C", 0.2)]));
        let ranked = composite_rank(&factors, &weights(&[("momentum", 1.0)])).unwrap();
        assert_eq!(ranked.head(3), vec!["B", "C", "A"]);
    }

    #[test]
    fn scales_do_not_dominate_after_normalization() {
        // Same ordering on wildly different scales, opposite directions.
        let mut factors = BTreeMap::new();
        factors.insert("big".to_string(), cs(&[("A", 1000.0), ("B", 2000.0)]));
        factors.insert("small".to_string(), cs(&[("A", 0.002), ("B", 0.001)]));
        let ranked = composite_rank(&factors, &weights(&[("big", 1.0), ("small", 1.0)])).unwrap();
        assert!(ranked.get("A").unwrap().abs() < 1e-12);
        assert!(ranked.get("B").unwrap().abs() < 1e-12);
    }

    #[test]
    fn weights_are_renormalized() {
        let mut factors = BTreeMap::new();
        factors.insert("f".to_string(), cs(&[("A", 1.0), ("B", 3.0)]));
        let a = composite_rank(&factors, &weights(&[("f", 1.0)])).unwrap();
        let b = composite_rank(&factors, &weights(&[("f", 7.0)])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn partial_coverage_contributes_no_term() {
        let mut factors = BTreeMap::new();
        factors.insert("f1".to_string(), cs(&[("A", 1.0), ("B", 3.0)]));
        factors.insert("f2".to_string(), cs(&[("B", 1.0), ("C", 5.0)]));
        let ranked =
            composite_rank(&factors, &weights(&[("f1", 1.0), ("f2", 1.0)])).unwrap();
        assert_eq!(ranked.len(), 3);
        // A: only f1 term (-1 * 0.5), C: only f2 term (+1 * 0.5), B: 0.5 - 0.5
        assert!((ranked.get("A").unwrap() + 0.5).abs() < 1e-12);
        assert!((ranked.get("C").unwrap() - 0.5).abs() < 1e-12);
        assert!(ranked.get("B").unwrap().abs() < 1e-12);
        assert_eq!(ranked.head(3), vec!["C", "B", "A"]);
    }

    #[test]
    fn empty_factor_map_ranks_nothing() {
        let ranked = composite_rank(&BTreeMap::new(), &weights(&[("f", 1.0)])).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn zero_weight_sum_is_rejected() {
        let mut factors = BTreeMap::new();
        factors.insert("f".to_string(), cs(&[("A", 1.0)]));
        let err = composite_rank(&factors, &weights(&[("f", 0.0)])).unwrap_err();
        assert_eq!(err, RankError::InvalidWeightSum(0.0));
    }
}
