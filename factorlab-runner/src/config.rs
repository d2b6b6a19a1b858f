//! Serializable backtest configuration.
//!
//! A TOML document with an `[engine]` table, weighted `[[factors]]`, and
//! optional `[[pairs]]` with a `[pairs_portfolio]` table:
//!
//! ```toml
//! risk_free_rate = 0.02
//!
//! [engine]
//! initial_capital = 1000000.0
//! top_n = 20
//! frequency = "M"
//!
//! [[factors]]
//! weight = 0.6
//! factor = { kind = "momentum", lookback = 126 }
//!
//! [[factors]]
//! weight = 0.4
//! factor = { kind = "value" }
//!
//! [[pairs]]
//! x = "KO"
//! y = "PEP"
//! lookback = 60
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use factorlab_core::engine::{EngineConfig, EngineError, WeightedFactor};
use factorlab_core::factors::FactorSpec;
use factorlab_core::pair::PairError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pairs::PairDefinition;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config")]
    Serialize(#[from] serde_json::Error),
    #[error("config defines neither factors nor pairs")]
    Empty,
    #[error("invalid engine settings")]
    Engine(#[from] EngineError),
    #[error("factor weights must sum to a positive value, got {0}")]
    WeightSum(f64),
    #[error("invalid pair {pair}")]
    Pair {
        pair: String,
        #[source]
        source: PairError,
    },
    #[error("pairs_portfolio.{field} must be positive and finite, got {value}")]
    PairCapital { field: &'static str, value: f64 },
    #[error("risk_free_rate must be finite, got {0}")]
    RiskFreeRate(f64),
    #[error("cannot override the lookback of {0} momentum factors, at most one is allowed")]
    AmbiguousMomentum(usize),
}

/// A factor and its weight in the composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorEntry {
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub factor: FactorSpec,
}

fn default_weight() -> f64 {
    1.0
}

impl FactorEntry {
    pub fn new(factor: FactorSpec, weight: f64) -> Self {
        Self { weight, factor }
    }
}

/// Capital settings for the multi-pair portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairsPortfolioConfig {
    pub capital: f64,
    /// Fixed capital per pair. When unset, `capital` is split evenly.
    pub per_pair_capital: Option<f64>,
}

impl Default for PairsPortfolioConfig {
    fn default() -> Self {
        Self {
            capital: 1_000_000.0,
            per_pair_capital: None,
        }
    }
}

/// Everything needed to reproduce a run on a given price panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub factors: Vec<FactorEntry>,
    #[serde(default)]
    pub pairs: Vec<PairDefinition>,
    #[serde(default)]
    pub pairs_portfolio: PairsPortfolioConfig,
    /// Annual risk-free rate used by the Sharpe and Sortino ratios.
    #[serde(default)]
    pub risk_free_rate: f64,
}

impl BacktestConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.factors.is_empty() && self.pairs.is_empty() {
            return Err(ConfigError::Empty);
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::RiskFreeRate(self.risk_free_rate));
        }

        if !self.factors.is_empty() {
            self.engine.validate()?;
            let mut names = BTreeSet::new();
            for entry in &self.factors {
                let name = entry.factor.name();
                if !entry.weight.is_finite() || entry.weight < 0.0 {
                    return Err(EngineError::InvalidWeight {
                        factor: name,
                        weight: entry.weight,
                    }
                    .into());
                }
                if !names.insert(name.clone()) {
                    return Err(EngineError::DuplicateFactor(name).into());
                }
            }
            let total: f64 = self.factors.iter().map(|f| f.weight).sum();
            if total <= 0.0 {
                return Err(ConfigError::WeightSum(total));
            }
        }

        if !self.pairs.is_empty() {
            let portfolio = &self.pairs_portfolio;
            if !portfolio.capital.is_finite() || portfolio.capital <= 0.0 {
                return Err(ConfigError::PairCapital {
                    field: "capital",
                    value: portfolio.capital,
                });
            }
            if let Some(per_pair) = portfolio.per_pair_capital {
                if !per_pair.is_finite() || per_pair <= 0.0 {
                    return Err(ConfigError::PairCapital {
                        field: "per_pair_capital",
                        value: per_pair,
                    });
                }
            }
            for pair in &self.pairs {
                pair.params()
                    .validate()
                    .map_err(|source| ConfigError::Pair {
                        pair: pair.label(),
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        self.engine.clone()
    }

    /// Fresh factor instances, one per entry, in config order.
    pub fn build_factors(&self) -> Vec<WeightedFactor> {
        self.factors
            .iter()
            .map(|entry| WeightedFactor::new(entry.factor.build(), entry.weight))
            .collect()
    }

    /// Replace the lookback of the momentum factor, adding one with weight 1
    /// if the config has none.
    ///
    /// Two momentum factors would collapse into duplicates, so a config with
    /// more than one is rejected and left unchanged.
    pub fn set_momentum_lookback(&mut self, lookback: usize) -> Result<(), ConfigError> {
        let count = self
            .factors
            .iter()
            .filter(|entry| matches!(entry.factor, FactorSpec::Momentum { .. }))
            .count();
        if count > 1 {
            return Err(ConfigError::AmbiguousMomentum(count));
        }
        let existing = self.factors.iter_mut().find_map(|entry| match &mut entry.factor {
            FactorSpec::Momentum { lookback } => Some(lookback),
            _ => None,
        });
        if let Some(current) = existing {
            *current = lookback;
        } else {
            self.factors
                .push(FactorEntry::new(FactorSpec::Momentum { lookback }, 1.0));
        }
        Ok(())
    }
}
