use serde::{Deserialize, Serialize};

use super::party::{Party, PublicKey};

/// One open (or formerly open) leveraged contract between a taker and an exchange.
///
/// `ticker`, `initial_price`, `taker` and `exchange` are fixed at open time and
/// carried unchanged through every partial close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub current_price: f64,
    pub initial_price: f64,
    pub position_size: f64,
    pub collateral: f64,
    pub taker: Party,
    pub exchange: Party,
}

impl Position {
    /// A freshly opened position: current and initial price coincide.
    pub fn open(
        ticker: impl Into<String>,
        price: f64,
        position_size: f64,
        collateral: f64,
        taker: Party,
        exchange: Party,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            current_price: price,
            initial_price: price,
            position_size,
            collateral,
            taker,
            exchange,
        }
    }

    /// `(position_size × initial_price) / collateral`
    pub fn leverage(&self) -> f64 {
        self.notional() / self.collateral
    }

    /// Exposure at the opening price.
    pub fn notional(&self) -> f64 {
        self.position_size * self.initial_price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.position_size * (price - self.initial_price)
    }

    pub fn participants(&self) -> [&Party; 2] {
        [&self.taker, &self.exchange]
    }

    pub fn participant_keys(&self) -> [PublicKey; 2] {
        [self.taker.key, self.exchange.key]
    }

    /// Successor produced by a partial close: smaller size, re-marked price,
    /// everything else frozen.
    pub fn successor(&self, position_size: f64, current_price: f64) -> Self {
        Self {
            position_size,
            current_price,
            ..self.clone()
        }
    }
}
