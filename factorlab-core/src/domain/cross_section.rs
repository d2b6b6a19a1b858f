//! CrossSection: per-instrument scores valid at a single reference date.

use serde::{Deserialize, Serialize};

/// Instrument → score map that remembers insertion order.
///
/// Non-finite scores are never stored: a factor that cannot score an
/// instrument simply omits it. Insertion order is the tie-breaker for
/// [`CrossSection::sort_descending`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    entries: Vec<(String, f64)>,
}

impl CrossSection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace a score. Returns `false` (and stores nothing) for
    /// non-finite scores.
    pub fn insert(&mut self, instrument: impl Into<String>, score: f64) -> bool {
        if !score.is_finite() {
            return false;
        }
        let instrument = instrument.into();
        match self.entries.iter_mut().find(|(name, _)| *name == instrument) {
            Some(entry) => entry.1 = score,
            None => self.entries.push((instrument, score)),
        }
        true
    }

    pub fn get(&self, instrument: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == instrument)
            .map(|(_, score)| *score)
    }

    pub fn contains(&self, instrument: &str) -> bool {
        self.get(instrument).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(name, score)| (name.as_str(), *score))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, score)| *score).collect()
    }

    /// Stable sort, highest score first. Equal scores keep insertion order.
    pub fn sort_descending(&mut self) {
        self.entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    }

    /// First `n` instruments in current order.
    pub fn head(&self, n: usize) -> Vec<&str> {
        self.names().take(n).collect()
    }
}

impl FromIterator<(String, f64)> for CrossSection {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut cs = CrossSection::new();
        for (name, score) in iter {
            cs.insert(name, score);
        }
        cs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_scores_are_omitted() {
        let mut cs = CrossSection::new();
        assert!(!cs.insert("A", f64::NAN));
        assert!(!cs.insert("B", f64::INFINITY));
        assert!(cs.insert("C", 1.0));
        assert_eq!(cs.len(), 1);
        assert!(!cs.contains("A"));
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut cs = CrossSection::new();
        cs.insert("A", 1.0);
        cs.insert("B", 2.0);
        cs.insert("A", 3.0);
        assert_eq!(cs.head(2), vec!["A", "B"]);
        assert_eq!(cs.get("A"), Some(3.0));
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let mut cs: CrossSection = vec![
            ("A".to_string(), 1.0),
            ("B".to_string(), 2.0),
            ("C".to_string(), 1.0),
            ("D".to_string(), 2.0),
        ]
        .into_iter()
        .collect();
        cs.sort_descending();
        assert_eq!(cs.head(4), vec!["B", "D", "A", "C"]);
    }
}
