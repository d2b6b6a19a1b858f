//! In-memory price data helpers. Fetching and caching real data live outside
//! this crate; everything here is deterministic.

pub mod synthetic;

pub use synthetic::{business_days, cointegrated_pair, SyntheticPanel};
