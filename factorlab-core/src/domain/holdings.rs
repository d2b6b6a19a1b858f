//! Holdings: signed share quantities per instrument.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value-type holdings map. The rebalance engine replaces it wholesale at each
/// rebalance; the mark-to-market stepper only reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    shares: BTreeMap<String, f64>,
}

impl Holdings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the position in `instrument`. Zero quantities are not stored.
    pub fn insert(&mut self, instrument: impl Into<String>, shares: f64) {
        let instrument = instrument.into();
        if shares == 0.0 {
            self.shares.remove(&instrument);
        } else {
            self.shares.insert(instrument, shares);
        }
    }

    /// Signed shares held, zero when flat.
    pub fn shares(&self, instrument: &str) -> f64 {
        self.shares.get(instrument).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, instrument: &str) -> bool {
        self.shares.contains_key(instrument)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.shares.iter().map(|(name, qty)| (name.as_str(), *qty))
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn long_count(&self) -> usize {
        self.shares.values().filter(|q| **q > 0.0).count()
    }

    pub fn short_count(&self) -> usize {
        self.shares.values().filter(|q| **q < 0.0).count()
    }
}

impl FromIterator<(String, f64)> for Holdings {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut holdings = Holdings::new();
        for (name, qty) in iter {
            holdings.insert(name, qty);
        }
        holdings
    }
}
