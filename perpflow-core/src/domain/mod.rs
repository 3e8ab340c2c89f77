//! Domain types for PerpFlow

pub mod command;
pub mod lifecycle;
pub mod party;
pub mod position;
pub mod proposal;

pub use command::{Command, CommandKind};
pub use lifecycle::{Lifecycle, LifecycleError};
pub use party::{Party, PublicKey};
pub use position::Position;
pub use proposal::{Proposal, ProposalBuilder, StateAndRef, StateRef};

/// Asset symbol type alias
pub type Ticker = String;
