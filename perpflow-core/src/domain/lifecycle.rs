//! Position lifecycle: `Open --PartialClose--> Open`, `Open --Close--> Closed`.
//!
//! `Closed` is terminal. The only way into `Open` is the `Open` command.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::command::CommandKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("a position can only be created by an Open command, not {0}")]
    NotACreation(CommandKind),

    #[error("position is already open; {0} cannot re-open it")]
    AlreadyOpen(CommandKind),

    #[error("position is closed; no transition out of Closed ({0} attempted)")]
    Terminal(CommandKind),
}

impl Lifecycle {
    /// State produced when a command creates a position from nothing.
    pub fn create(kind: CommandKind) -> Result<Self, LifecycleError> {
        match kind {
            CommandKind::Open => Ok(Lifecycle::Open),
            other => Err(LifecycleError::NotACreation(other)),
        }
    }

    /// Apply a command to an existing position.
    pub fn apply(self, kind: CommandKind) -> Result<Self, LifecycleError> {
        match (self, kind) {
            (Lifecycle::Open, CommandKind::PartialClose) => Ok(Lifecycle::Open),
            (Lifecycle::Open, CommandKind::Close) => Ok(Lifecycle::Closed),
            (Lifecycle::Open, CommandKind::Open) => Err(LifecycleError::AlreadyOpen(kind)),
            (Lifecycle::Closed, _) => Err(LifecycleError::Terminal(kind)),
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Lifecycle::Closed
    }
}
