//! Property tests for core invariants.
//!
//! Uses proptest to verify:
//! 1. Normalization: mean 0 and population std 1, constant input maps to 0
//! 2. Composite rank: output is the union of inputs, sorted descending
//! 3. Pair state machine: |position| <= 1 and transitions only on crossings
//! 4. Sizing idempotence: same signal, same prices, no trades

use chrono::{Duration, NaiveDate};
use factorlab_core::engine::{size_and_trade, BookSpec, CostModel};
use factorlab_core::normalize::{mean_std, rolling_zscore, zscore};
use factorlab_core::pair::SpreadPosition;
use factorlab_core::rank::composite_rank;
use factorlab_core::{CrossSection, Holdings, PricePanel};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_scores() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1000.0..1000.0_f64, 2..40)
}

fn cross_section(values: &[f64], prefix: &str) -> CrossSection {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("{prefix}{i}"), *v))
        .collect()
}

// ── 1. Normalization ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn zscore_has_unit_moments(values in arb_scores()) {
        let (_, std) = mean_std(values.iter().copied()).unwrap();
        prop_assume!(std > 1.0);
        let z = zscore(&cross_section(&values, "I"));
        let (mean, std) = mean_std(z.values()).unwrap();
        prop_assert!(mean.abs() < 1e-9);
        prop_assert!((std - 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_input_normalizes_to_zero(value in -1e6..1e6_f64, n in 1usize..30) {
        let z = zscore(&cross_section(&vec![value; n], "I"));
        prop_assert!(z.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn rolling_zscore_is_always_finite(
        values in prop::collection::vec(prop_oneof![
            4 => (1.0..100.0_f64),
            1 => Just(f64::NAN),
        ], 0..80),
        window in 1usize..20,
    ) {
        let z = rolling_zscore(&values, window);
        prop_assert_eq!(z.len(), values.len());
        prop_assert!(z.iter().all(|v| v.is_finite()));
    }
}

// ── 2. Composite rank ────────────────────────────────────────────────

proptest! {
    #[test]
    fn composite_is_sorted_union(
        a in prop::collection::vec(-10.0..10.0_f64, 1..20),
        b in prop::collection::vec(-10.0..10.0_f64, 1..20),
        wa in 0.1..5.0_f64,
        wb in 0.1..5.0_f64,
    ) {
        // Overlapping name spaces: A0.. from both, plus distinct tails.
        let mut factors = BTreeMap::new();
        factors.insert("fa".to_string(), cross_section(&a, "N"));
        factors.insert("fb".to_string(), cross_section(&b, "N"));
        let weights: BTreeMap<String, f64> =
            [("fa".to_string(), wa), ("fb".to_string(), wb)].into_iter().collect();

        let ranked = composite_rank(&factors, &weights).unwrap();

        let expected: HashSet<String> =
            (0..a.len().max(b.len())).map(|i| format!("N{i}")).collect();
        let got: HashSet<String> = ranked.names().map(str::to_string).collect();
        prop_assert_eq!(got, expected);

        let values = ranked.values();
        prop_assert!(values.windows(2).all(|w| w[0] >= w[1]));
    }
}

// ── 3. Pair state machine ────────────────────────────────────────────

proptest! {
    #[test]
    fn spread_position_respects_hysteresis(
        zs in prop::collection::vec(-4.0..4.0_f64, 1..200),
        entry in 1.0..3.0_f64,
        exit_ratio in 0.0..1.0_f64,
    ) {
        let exit = entry * exit_ratio;
        let mut pos = SpreadPosition::Flat;
        for z in zs {
            let next = pos.next(z, entry, exit);
            prop_assert!(next.as_i8().abs() <= 1);
            if pos != next {
                match (pos, next) {
                    (SpreadPosition::Flat, SpreadPosition::Long) => prop_assert!(z < -entry),
                    (SpreadPosition::Flat, SpreadPosition::Short) => prop_assert!(z > entry),
                    (_, SpreadPosition::Flat) => prop_assert!(z.abs() < exit),
                    _ => prop_assert!(false, "direct flip {:?} -> {:?}", pos, next),
                }
            }
            pos = next;
        }
    }
}

// ── 4. Sizing idempotence ────────────────────────────────────────────

proptest! {
    #[test]
    fn unchanged_signal_and_prices_trade_nothing(
        prices in prop::collection::vec(1.0..500.0_f64, 2..15),
        top_n in 1usize..8,
        short_fraction in prop_oneof![Just(0.0), 0.1..1.0_f64],
        capital in 1_000.0..1_000_000.0_f64,
    ) {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let dates = vec![base, base + Duration::days(1)];
        let columns = prices
            .iter()
            .enumerate()
            .map(|(i, p)| (format!("I{i}"), vec![*p, *p]))
            .collect();
        let panel = PricePanel::from_columns(dates, columns).unwrap();

        let mut ranking: CrossSection = prices
            .iter()
            .enumerate()
            .map(|(i, p)| (format!("I{i}"), p.ln()))
            .collect();
        ranking.sort_descending();

        let book = BookSpec { top_n, short_fraction };
        let costs = CostModel::frictionless();
        let first = size_and_trade(&ranking, &Holdings::new(), &panel, 0, capital, book, &costs);
        let second = size_and_trade(&ranking, &first.target, &panel, 1, capital, book, &costs);
        prop_assert!(second.trades.is_empty());
        prop_assert_eq!(second.target, first.target);
    }
}
