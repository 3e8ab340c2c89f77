//! Exchange-side acceptance policy, checked on top of the contract rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use perpflow_core::{Command, Position, Proposal, PublicKey, MAX_LEVERAGE};
use perpflow_oracle::config::{load_toml, ConfigError};

/// Limits an exchange applies before countersigning.
///
/// ```toml
/// max_notional = 1000000.0
/// max_leverage = 5.0
/// allowed_tickers = ["BTC", "ETH"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptancePolicy {
    /// Exposure at open price must stay strictly below this.
    pub max_notional: f64,
    /// Leverage must stay strictly below this.
    pub max_leverage: f64,
    /// `None` accepts any ticker.
    pub allowed_tickers: Option<BTreeSet<String>>,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            max_notional: 1_000_000.0,
            max_leverage: MAX_LEVERAGE,
            allowed_tickers: None,
        }
    }
}

impl AcceptancePolicy {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let policy: Self = toml::from_str(content)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_notional > 0.0 && self.max_leverage > 0.0) {
            return Err(ConfigError::Invalid(
                "max_notional and max_leverage must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        load_toml(path, Self::from_toml)
    }

    pub fn with_allowed_tickers<S: Into<String>>(mut self, tickers: impl IntoIterator<Item = S>) -> Self {
        self.allowed_tickers = Some(tickers.into_iter().map(Into::into).collect());
        self
    }

    /// Check `proposal` from the point of view of the exchange holding `me`.
    /// Returns a human-readable reason on refusal.
    pub fn check(&self, proposal: &Proposal, me: &PublicKey) -> Result<(), String> {
        let position = subject(proposal).ok_or("proposal carries no position")?;
        let command = &proposal.command;

        if position.exchange.key != *me {
            return Err(format!("{} is not the exchange of this position", me.short()));
        }
        if command.ticker() != position.ticker {
            return Err(format!(
                "command ticker {} does not match position ticker {}",
                command.ticker(),
                position.ticker
            ));
        }
        if let Command::Open { price, .. } = command {
            if *price != position.initial_price {
                return Err(format!(
                    "attested price {price} does not match opening price {}",
                    position.initial_price
                ));
            }
        }
        if let Some(allowed) = &self.allowed_tickers {
            if !allowed.contains(&position.ticker) {
                return Err(format!("ticker {} is not traded here", position.ticker));
            }
        }

        // Closing never adds exposure.
        if matches!(command, Command::Close { .. }) {
            return Ok(());
        }
        let notional = position.notional();
        if !(notional < self.max_notional) {
            return Err(format!(
                "notional {notional} exceeds limit {}",
                self.max_notional
            ));
        }
        let leverage = position.leverage();
        if !(leverage < self.max_leverage) {
            return Err(format!(
                "leverage {leverage:.2} exceeds limit {}",
                self.max_leverage
            ));
        }
        Ok(())
    }
}

/// The position a proposal is about: the output when there is one, else the input.
fn subject(proposal: &Proposal) -> Option<&Position> {
    proposal
        .outputs
        .first()
        .or_else(|| proposal.inputs.first().map(|i| &i.position))
}
