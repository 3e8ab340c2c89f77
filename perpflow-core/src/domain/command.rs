use serde::{Deserialize, Serialize};
use std::fmt;

/// Intent of a proposal, carrying the oracle-attested figures.
///
/// Serialized with a `type` tag so the boundary shape is
/// `{ "type": "Open", "ticker": "BTC", "price": 35000.0, "funding_rate": 0.8 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    Open {
        ticker: String,
        price: f64,
        funding_rate: f64,
    },
    Close {
        ticker: String,
        price: f64,
    },
    PartialClose {
        ticker: String,
        price: f64,
    },
}

/// Command discriminant without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    Open,
    Close,
    PartialClose,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Open { .. } => CommandKind::Open,
            Command::Close { .. } => CommandKind::Close,
            Command::PartialClose { .. } => CommandKind::PartialClose,
        }
    }

    pub fn ticker(&self) -> &str {
        match self {
            Command::Open { ticker, .. }
            | Command::Close { ticker, .. }
            | Command::PartialClose { ticker, .. } => ticker,
        }
    }

    pub fn price(&self) -> f64 {
        match self {
            Command::Open { price, .. }
            | Command::Close { price, .. }
            | Command::PartialClose { price, .. } => *price,
        }
    }

    /// Only `Open` carries a funding rate.
    pub fn funding_rate(&self) -> Option<f64> {
        match self {
            Command::Open { funding_rate, .. } => Some(*funding_rate),
            Command::Close { .. } | Command::PartialClose { .. } => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Open => write!(f, "Open"),
            CommandKind::Close => write!(f, "Close"),
            CommandKind::PartialClose => write!(f, "PartialClose"),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Open {
                ticker,
                price,
                funding_rate,
            } => write!(f, "Open {ticker} @ {price} (funding {funding_rate})"),
            Command::Close { ticker, price } => write!(f, "Close {ticker} @ {price}"),
            Command::PartialClose { ticker, price } => {
                write!(f, "PartialClose {ticker} @ {price}")
            }
        }
    }
}
