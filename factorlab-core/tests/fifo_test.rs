//! Integration tests for the single-instrument FIFO backtester.

use factorlab_core::engine::CostModel;
use factorlab_core::fifo::{FifoBacktester, Signal};

fn signals(codes: &[i8]) -> Vec<Signal> {
    codes.iter().map(|&c| Signal::from_code(c)).collect()
}

#[test]
fn buy_only_rising_prices_hand_computed() {
    let prices = [10.0, 11.0, 12.0, 13.0];
    let bt = FifoBacktester::new(100.0, 0.5, 1.0);
    let run = bt.run(&prices, &signals(&[-1, -1, -1, -1])).unwrap();

    assert_eq!(run.equity.len(), 4);
    assert!(run.equity.windows(2).all(|w| w[1] > w[0]));

    // Deploys 50, 25, 12.5, 6.25 at 10, 11, 12, 13; 6.25 stays in cash.
    let units = 50.0 / 10.0 + 25.0 / 11.0 + 12.5 / 12.0 + 6.25 / 13.0;
    let expected = 6.25 + units * 13.0;
    assert!((run.cash - 6.25).abs() < 1e-12);
    assert!((run.final_equity().unwrap() - expected).abs() < 1e-9);
    assert!(run.final_equity().unwrap() > 100.0);

    assert!((run.equity[0] - 100.0).abs() < 1e-12);
    assert!((run.equity[1] - 105.0).abs() < 1e-12);
}

#[test]
fn transaction_costs_reduce_equity() {
    let prices = [10.0, 11.0, 12.0, 13.0, 14.0];
    let codes = signals(&[-1, 0, -1, 0, 1]);

    let free = FifoBacktester::new(1000.0, 0.5, 1.0).run(&prices, &codes).unwrap();
    let paid = FifoBacktester::new(1000.0, 0.5, 1.0)
        .with_costs(CostModel::new(10.0, 25.0))
        .run(&prices, &codes)
        .unwrap();

    assert!(paid.final_equity().unwrap() <= free.final_equity().unwrap());
    assert!(paid.cost_paid > 0.0);
    assert!(free.cost_paid.abs() < 1e-9);
    assert_eq!(paid.buys, 2);
    assert_eq!(paid.sells, 1);
}

#[test]
fn sells_realize_oldest_lot_first() {
    let prices = [10.0, 20.0, 30.0, 30.0];
    let run = FifoBacktester::new(100.0, 0.5, 1.0)
        .run(&prices, &signals(&[-1, -1, 1, 1]))
        .unwrap();
    assert!(run.open_lots.is_empty());
    // 5 units + 1.25 units sold at 30 on top of 25 cash
    assert!((run.cash - (25.0 + 150.0 + 37.5)).abs() < 1e-12);
}
