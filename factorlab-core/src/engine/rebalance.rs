//! Rebalance engine: schedule → factors → composite rank → sizing → mark.

use super::mark_to_market::step_forward;
use super::sizing::{size_and_trade, BookSpec};
use super::state::RunState;
use super::{EngineConfig, EngineError};
use crate::domain::{CrossSection, EquityCurve, Holdings, PricePanel, TradeLog};
use crate::factors::Factor;
use crate::rank::{composite_rank, RankError};
use crate::schedule::{schedule, RebalanceEvent};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A factor registered with its weight in the composite.
pub struct WeightedFactor {
    pub factor: Box<dyn Factor>,
    pub weight: f64,
}

impl WeightedFactor {
    pub fn new(factor: Box<dyn Factor>, weight: f64) -> Self {
        Self { factor, weight }
    }
}

impl std::fmt::Debug for WeightedFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedFactor")
            .field("factor", &self.factor.name())
            .field("weight", &self.weight)
            .finish()
    }
}

/// Why a scheduled rebalance did not trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Resolved to a row already taken off the schedule.
    DuplicateDate,
    /// Trailing window shorter than `min_history`.
    InsufficientHistory,
    /// No factor produced a score for any instrument.
    EmptyRanking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRebalance {
    pub calendar_date: NaiveDate,
    pub date: NaiveDate,
    pub reason: SkipReason,
}

/// Summary of one executed rebalance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceRecord {
    pub calendar_date: NaiveDate,
    pub date: NaiveDate,
    /// Portfolio value the books were sized from.
    pub capital: f64,
    pub longs: Vec<String>,
    pub shorts: Vec<String>,
    pub rejected: Vec<String>,
    pub trade_count: usize,
    pub cost: f64,
}

/// Output of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorRun {
    pub initial_capital: f64,
    /// One point per trading day from the first executed rebalance onwards.
    pub equity: EquityCurve,
    pub trades: TradeLog,
    pub rebalances: Vec<RebalanceRecord>,
    pub skipped: Vec<SkippedRebalance>,
    pub final_holdings: Holdings,
    pub final_cash: f64,
}

impl FactorRun {
    /// Last equity value, or the initial capital if nothing was executed.
    pub fn final_equity(&self) -> f64 {
        self.equity
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }

    pub fn total_cost(&self) -> f64 {
        self.trades.total_cost()
    }
}

/// Periodic cross-sectional rebalancer.
///
/// Immutable once built; each call to [`RebalanceEngine::run`] owns its own
/// state, so one engine can serve many panels.
#[derive(Debug)]
pub struct RebalanceEngine {
    config: EngineConfig,
    factors: Vec<WeightedFactor>,
    weights: BTreeMap<String, f64>,
}

impl RebalanceEngine {
    pub fn new(config: EngineConfig, factors: Vec<WeightedFactor>) -> Result<Self, EngineError> {
        config.validate()?;
        if factors.is_empty() {
            return Err(EngineError::NoFactors);
        }
        let mut weights = BTreeMap::new();
        for wf in &factors {
            let name = wf.factor.name().to_string();
            if !wf.weight.is_finite() || wf.weight < 0.0 {
                return Err(EngineError::InvalidWeight {
                    factor: name,
                    weight: wf.weight,
                });
            }
            if weights.insert(name.clone(), wf.weight).is_some() {
                return Err(EngineError::DuplicateFactor(name));
            }
        }
        let total: f64 = weights.values().sum();
        if total <= 0.0 {
            return Err(RankError::InvalidWeightSum(total).into());
        }
        Ok(Self {
            config,
            factors,
            weights,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run(&self, panel: &PricePanel) -> Result<FactorRun, EngineError> {
        let mut state = RunState::new(self.config.initial_capital);
        let book = BookSpec {
            top_n: self.config.top_n,
            short_fraction: self.config.short_fraction,
        };

        for event in schedule(panel.dates(), self.config.frequency) {
            if state.last_index.is_some_and(|last| event.index <= last) {
                tracing::warn!(
                    calendar_date = %event.calendar_date,
                    date = %event.date,
                    "rebalance resolves to an already processed date, skipped"
                );
                skip(&mut state, &event, SkipReason::DuplicateDate);
                continue;
            }
            state.last_index = Some(event.index);

            if event.index + 1 < self.config.min_history {
                tracing::warn!(
                    date = %event.date,
                    rows = event.index + 1,
                    "insufficient history, rebalance skipped"
                );
                skip(&mut state, &event, SkipReason::InsufficientHistory);
                continue;
            }

            let ranking = self.rank(panel, event.index)?;
            if ranking.is_empty() {
                tracing::warn!(date = %event.date, "empty composite ranking, rebalance skipped");
                skip(&mut state, &event, SkipReason::EmptyRanking);
                continue;
            }

            let capital = match state.segment_start {
                Some(start) => {
                    let points = step_forward(
                        &state.holdings,
                        state.cash,
                        panel,
                        start,
                        event.index,
                        self.config.ffill_limit,
                    )?;
                    state.record_segment(points).unwrap_or(state.cash)
                }
                None => state.cash,
            };
            if !capital.is_finite() || capital <= 0.0 {
                return Err(EngineError::CapitalExhausted {
                    date: event.date,
                    capital,
                });
            }

            let plan = size_and_trade(
                &ranking,
                &state.holdings,
                panel,
                event.index,
                capital,
                book,
                &self.config.costs,
            );
            tracing::debug!(
                date = %event.date,
                capital,
                longs = plan.longs.len(),
                shorts = plan.shorts.len(),
                trades = plan.trades.len(),
                "rebalance"
            );
            state.rebalances.push(RebalanceRecord {
                calendar_date: event.calendar_date,
                date: event.date,
                capital,
                longs: plan.longs.clone(),
                shorts: plan.shorts.clone(),
                rejected: plan.rejected.clone(),
                trade_count: plan.trades.len(),
                cost: plan.total_cost(),
            });
            state.apply(plan, event.index);
        }

        if let Some(start) = state.segment_start {
            let points = step_forward(
                &state.holdings,
                state.cash,
                panel,
                start,
                panel.len() - 1,
                self.config.ffill_limit,
            )?;
            state.record_segment(points);
        }

        Ok(state.into_run())
    }

    /// Composite ranking from the trailing window ending at `row`.
    fn rank(&self, panel: &PricePanel, row: usize) -> Result<CrossSection, EngineError> {
        let window = panel.window(row);
        let scores: BTreeMap<String, CrossSection> = self
            .factors
            .iter()
            .map(|wf| (wf.factor.name().to_string(), wf.factor.score(&window)))
            .filter(|(_, scores)| !scores.is_empty())
            .collect();
        if scores.is_empty() {
            return Ok(CrossSection::new());
        }
        Ok(composite_rank(&scores, &self.weights)?)
    }

    /// Names of the registered factors, in registration order.
    pub fn factor_names(&self) -> Vec<&str> {
        self.factors.iter().map(|wf| wf.factor.name()).collect()
    }
}

fn skip(state: &mut RunState, event: &RebalanceEvent, reason: SkipReason) {
    state.skipped.push(SkippedRebalance {
        calendar_date: event.calendar_date,
        date: event.date,
        reason,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::{Momentum, Value};
    use chrono::Duration;

    fn rising_panel(days: usize) -> PricePanel {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..days).map(|i| base + Duration::days(i as i64)).collect();
        let a = (0..days).map(|i| 100.0 + i as f64).collect();
        let b = (0..days).map(|i| 50.0 + 0.2 * i as f64).collect();
        PricePanel::from_columns(dates, vec![("A".into(), a), ("B".into(), b)]).unwrap()
    }

    fn momentum_engine(config: EngineConfig) -> RebalanceEngine {
        RebalanceEngine::new(config, vec![WeightedFactor::new(Box::new(Momentum::new(20)), 1.0)])
            .unwrap()
    }

    #[test]
    fn rejects_empty_factor_list() {
        let err = RebalanceEngine::new(EngineConfig::default(), Vec::new()).unwrap_err();
        assert_eq!(err, EngineError::NoFactors);
    }

    #[test]
    fn rejects_duplicate_and_negative_weights() {
        let dup = vec![
            WeightedFactor::new(Box::new(Value), 1.0),
            WeightedFactor::new(Box::new(Value), 1.0),
        ];
        assert_eq!(
            RebalanceEngine::new(EngineConfig::default(), dup).unwrap_err(),
            EngineError::DuplicateFactor("value".into())
        );
        let neg = vec![WeightedFactor::new(Box::new(Value), -1.0)];
        assert!(matches!(
            RebalanceEngine::new(EngineConfig::default(), neg),
            Err(EngineError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn equity_starts_at_first_rebalance_and_runs_to_end() {
        let panel = rising_panel(120);
        let run = momentum_engine(EngineConfig::new(10_000.0, 1)).run(&panel).unwrap();
        let first = &run.rebalances[0];
        assert_eq!(run.equity.first().unwrap().date, first.date);
        assert_eq!(run.equity.last().unwrap().date, *panel.dates().last().unwrap());
        assert!((run.equity.first().unwrap().equity - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn short_history_rebalances_are_skipped() {
        let panel = rising_panel(120);
        let run = momentum_engine(EngineConfig::new(10_000.0, 1)).run(&panel).unwrap();
        // January month end is row 30: 31 rows of history, executed.
        assert_eq!(run.rebalances[0].date, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        let config = EngineConfig {
            min_history: 40,
            ..EngineConfig::new(10_000.0, 1)
        };
        let run = momentum_engine(config).run(&panel).unwrap();
        assert_eq!(run.skipped[0].reason, SkipReason::InsufficientHistory);
        assert_eq!(run.rebalances[0].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn too_short_panel_executes_nothing() {
        let panel = rising_panel(10);
        let run = momentum_engine(EngineConfig::new(10_000.0, 1)).run(&panel).unwrap();
        assert!(run.rebalances.is_empty());
        assert!(run.equity.is_empty());
        assert!(run.trades.is_empty());
        assert_eq!(run.final_equity(), 10_000.0);
    }

    #[test]
    fn winner_is_selected() {
        let panel = rising_panel(120);
        let run = momentum_engine(EngineConfig::new(10_000.0, 1)).run(&panel).unwrap();
        assert!(run.rebalances.iter().all(|r| r.longs == vec!["A".to_string()]));
        assert_eq!(run.final_holdings.len(), 1);
        assert!(run.final_holdings.contains("A"));
    }

    #[test]
    fn compounding_uses_marked_capital() {
        let panel = rising_panel(120);
        let run = momentum_engine(EngineConfig::new(10_000.0, 1)).run(&panel).unwrap();
        for record in &run.rebalances[1..] {
            let marked = run.equity.value_as_of(record.date).unwrap();
            assert!((record.capital - marked).abs() < 1e-6);
        }
        assert!(run.rebalances[1].capital > 10_000.0);
    }
}
