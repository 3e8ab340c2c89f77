//! Scripted scenarios for `perpflow simulate`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use perpflow_oracle::{load_toml, ConfigError, OracleConfig};
use perpflow_protocol::AcceptancePolicy;

/// A scenario file: who trades, what the oracles know, what the exchange
/// accepts, and the steps to run in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_taker")]
    pub taker: String,
    #[serde(default = "default_exchange")]
    pub exchange: String,
    /// Seed for deterministic party keys.
    #[serde(default)]
    pub seed: u64,
    /// Evaluation time for every oracle query. Defaults to now.
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub policy: AcceptancePolicy,
    pub steps: Vec<Step>,
}

fn default_taker() -> String {
    "Taker".into()
}

fn default_exchange() -> String {
    "Exchange".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Open {
        ticker: String,
        size: f64,
        collateral: f64,
    },
    PartialClose {
        ticker: String,
        amount: f64,
    },
    Close {
        ticker: String,
    },
}

impl Step {
    pub fn ticker(&self) -> &str {
        match self {
            Step::Open { ticker, .. } | Step::PartialClose { ticker, .. } | Step::Close { ticker } => ticker,
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Step::Open { ticker, size, collateral } => {
                format!("open {size} {ticker} on {collateral} collateral")
            }
            Step::PartialClose { ticker, amount } => format!("partial close {amount} {ticker}"),
            Step::Close { ticker } => format!("close {ticker}"),
        };
        // Honours width and alignment flags.
        f.pad(&text)
    }
}

impl Scenario {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let scenario: Self = toml::from_str(content)?;
        scenario.oracle.validate()?;
        scenario.policy.validate()?;
        Ok(scenario)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        load_toml(path, Self::from_toml)
    }
}
