//! Single-instrument FIFO backtester.
//!
//! Buy signals deploy a fraction of free cash into a new lot; sell signals
//! close the oldest open lot. Equity is marked after every step.

use crate::engine::CostModel;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FifoError {
    #[error("{prices} prices but {signals} signals")]
    LengthMismatch { prices: usize, signals: usize },

    #[error("price at step {index} must be positive and finite, got {price}")]
    InvalidPrice { index: usize, price: f64 },

    #[error("trade fraction must be in (0, 1], got {0}")]
    InvalidFraction(f64),

    #[error("initial cash must be positive and finite, got {0}")]
    InvalidCash(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Integer signal convention: `-1` buys, `1` sells, anything else holds.
    pub fn from_code(code: i8) -> Self {
        match code {
            -1 => Signal::Buy,
            1 => Signal::Sell,
            _ => Signal::Hold,
        }
    }
}

/// An open purchase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub entry_price: f64,
    pub size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FifoBacktester {
    pub initial_cash: f64,
    /// Fraction of free cash deployed per buy.
    pub trade_fraction: f64,
    /// Buys are ignored unless cash exceeds this.
    pub min_cash: f64,
    pub costs: CostModel,
}

impl Default for FifoBacktester {
    fn default() -> Self {
        Self {
            initial_cash: 100.0,
            trade_fraction: 0.25,
            min_cash: 10.0,
            costs: CostModel::frictionless(),
        }
    }
}

/// Result of a FIFO run.
#[derive(Debug, Clone, PartialEq)]
pub struct FifoRun {
    /// Mark-to-market equity after each step.
    pub equity: Vec<f64>,
    pub cash: f64,
    pub open_lots: Vec<Lot>,
    pub cost_paid: f64,
    pub buys: usize,
    pub sells: usize,
}

impl FifoRun {
    pub fn final_equity(&self) -> Option<f64> {
        self.equity.last().copied()
    }
}

struct Book {
    cash: f64,
    lots: VecDeque<Lot>,
    cost_paid: f64,
    buys: usize,
    sells: usize,
}

impl Book {
    fn mark(&self, price: f64) -> f64 {
        self.cash + self.lots.iter().map(|lot| lot.size).sum::<f64>() * price
    }
}

impl FifoBacktester {
    pub fn new(initial_cash: f64, trade_fraction: f64, min_cash: f64) -> Self {
        Self {
            initial_cash,
            trade_fraction,
            min_cash,
            costs: CostModel::frictionless(),
        }
    }

    pub fn with_costs(mut self, costs: CostModel) -> Self {
        self.costs = costs;
        self
    }

    pub fn validate(&self) -> Result<(), FifoError> {
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return Err(FifoError::InvalidCash(self.initial_cash));
        }
        if !(self.trade_fraction > 0.0 && self.trade_fraction <= 1.0) {
            return Err(FifoError::InvalidFraction(self.trade_fraction));
        }
        Ok(())
    }

    pub fn run(&self, prices: &[f64], signals: &[Signal]) -> Result<FifoRun, FifoError> {
        self.validate()?;
        if prices.len() != signals.len() {
            return Err(FifoError::LengthMismatch {
                prices: prices.len(),
                signals: signals.len(),
            });
        }

        let mut book = Book {
            cash: self.initial_cash,
            lots: VecDeque::new(),
            cost_paid: 0.0,
            buys: 0,
            sells: 0,
        };
        let mut equity = Vec::with_capacity(prices.len());

        for (index, (&price, &signal)) in prices.iter().zip(signals).enumerate() {
            if !price.is_finite() || price <= 0.0 {
                return Err(FifoError::InvalidPrice { index, price });
            }
            match signal {
                Signal::Buy if book.cash > self.min_cash => {
                    let notional = book.cash * self.trade_fraction;
                    let cost = self.costs.cost(notional);
                    book.cash -= notional + cost;
                    book.cost_paid += cost;
                    book.lots.push_back(Lot {
                        entry_price: price,
                        size: notional / price,
                    });
                    book.buys += 1;
                }
                Signal::Sell => {
                    if let Some(lot) = book.lots.pop_front() {
                        let proceeds = lot.size * price;
                        let cost = self.costs.cost(proceeds);
                        book.cash += proceeds - cost;
                        book.cost_paid += cost;
                        book.sells += 1;
                    }
                }
                Signal::Buy | Signal::Hold => {}
            }
            equity.push(book.mark(price));
        }

        Ok(FifoRun {
            equity,
            cash: book.cash,
            open_lots: book.lots.into_iter().collect(),
            cost_paid: book.cost_paid,
            buys: book.buys,
            sells: book.sells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_codes() {
        assert_eq!(Signal::from_code(-1), Signal::Buy);
        assert_eq!(Signal::from_code(1), Signal::Sell);
        assert_eq!(Signal::from_code(0), Signal::Hold);
        assert_eq!(Signal::from_code(7), Signal::Hold);
    }

    #[test]
    fn sell_closes_oldest_lot() {
        let bt = FifoBacktester::new(100.0, 0.5, 1.0);
        let run = bt
            .run(&[10.0, 20.0, 20.0], &[Signal::Buy, Signal::Buy, Signal::Sell])
            .unwrap();
        // lot 1: 5 @ 10, lot 2: 1.25 @ 20; selling lot 1 at 20 returns 100
        assert_eq!(run.open_lots.len(), 1);
        assert_eq!(run.open_lots[0].entry_price, 20.0);
        assert!((run.cash - 125.0).abs() < 1e-12);
        assert!((run.final_equity().unwrap() - 150.0).abs() < 1e-12);
    }

    #[test]
    fn buy_below_min_cash_is_ignored() {
        let bt = FifoBacktester::new(10.0, 0.5, 10.0);
        let run = bt.run(&[10.0], &[Signal::Buy]).unwrap();
        assert_eq!(run.buys, 0);
        assert_eq!(run.cash, 10.0);
    }

    #[test]
    fn sell_without_lots_does_nothing() {
        let bt = FifoBacktester::new(50.0, 0.5, 1.0);
        let run = bt.run(&[10.0], &[Signal::Sell]).unwrap();
        assert_eq!(run.sells, 0);
        assert_eq!(run.equity, vec![50.0]);
    }

    #[test]
    fn rejects_bad_inputs() {
        let bt = FifoBacktester::new(100.0, 0.5, 1.0);
        assert!(matches!(
            bt.run(&[1.0, 2.0], &[Signal::Buy]),
            Err(FifoError::LengthMismatch { .. })
        ));
        assert_eq!(
            bt.run(&[1.0, 0.0], &[Signal::Hold, Signal::Hold]),
            Err(FifoError::InvalidPrice { index: 1, price: 0.0 })
        );
        assert!(FifoBacktester::new(100.0, 1.5, 1.0).validate().is_err());
        assert!(FifoBacktester::new(-1.0, 0.5, 1.0).validate().is_err());
    }
}
