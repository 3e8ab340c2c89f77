//! PerpFlow Protocol — assembling fully signed position transactions.
//!
//! This crate builds on `perpflow-core` and `perpflow-oracle` to provide:
//! - Drafts for open, partial close and close
//! - The initiator state machine and a session that drives it
//! - Concurrent oracle attestation
//! - The exchange-side acceptor and its acceptance policy
//! - Collaborator traits (lookup, finalizer, oracle client, counterparty)
//! - An in-memory ledger implementing lookup and finalization

pub mod acceptor;
pub mod error;
pub mod flows;
pub mod ledger;
pub mod machine;
pub mod policy;
pub mod ports;
pub mod session;
pub mod signed;

pub use acceptor::Acceptor;
pub use error::{FinalizationError, LookupError, ProtocolError, Rejection, SignatureError};
pub use flows::Roles;
pub use ledger::InMemoryLedger;
pub use machine::{step, AttestationRequest, Inbound, Outbound, Stage, State};
pub use policy::AcceptancePolicy;
pub use ports::{Counterparty, Finalizer, OracleClient, PositionLookup, Receipt};
pub use session::{Initiator, Services};
pub use signed::{FullySignedProposal, SignedProposal};
