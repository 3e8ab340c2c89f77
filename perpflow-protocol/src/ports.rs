//! Collaborators the protocol calls out to.
//!
//! Transport, consensus and storage live behind these traits. In-process
//! implementations: [`AttestationAuthority`] for [`OracleClient`],
//! [`crate::Acceptor`] for [`Counterparty`], [`crate::InMemoryLedger`] for
//! [`PositionLookup`] and [`Finalizer`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use perpflow_core::{Digest, Party, PartialView, PartySignature, PublicKey, StateAndRef, StateRef};
use perpflow_oracle::{Attestation, AttestationAuthority, Feed, OracleError};

use crate::error::{FinalizationError, LookupError, Rejection};
use crate::signed::{FullySignedProposal, SignedProposal};

/// Finds the current (unconsumed) position for a `(ticker, taker)` pair.
pub trait PositionLookup: Send + Sync {
    fn find_unconsumed(&self, ticker: &str, taker: &PublicKey) -> Result<StateAndRef, LookupError>;
}

/// What a finalizer reports after committing a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: Digest,
    pub consumed: Vec<StateRef>,
    pub created: Vec<StateRef>,
}

/// Commits fully signed proposals, enforcing single consumption of inputs.
pub trait Finalizer: Send + Sync {
    fn submit(&self, proposal: FullySignedProposal) -> Result<Receipt, FinalizationError>;
}

/// Access to one attestation authority.
pub trait OracleClient: Send + Sync {
    fn feed(&self) -> Feed;

    fn public_key(&self) -> PublicKey;

    fn query(&self, ticker: &str, as_of: DateTime<Utc>) -> Result<f64, OracleError>;

    fn request_signature(&self, view: &PartialView, as_of: DateTime<Utc>) -> Result<Attestation, OracleError>;
}

impl OracleClient for AttestationAuthority {
    fn feed(&self) -> Feed {
        AttestationAuthority::feed(self)
    }

    fn public_key(&self) -> PublicKey {
        AttestationAuthority::public_key(self)
    }

    fn query(&self, ticker: &str, as_of: DateTime<Utc>) -> Result<f64, OracleError> {
        AttestationAuthority::query(self, ticker, as_of)
    }

    fn request_signature(&self, view: &PartialView, as_of: DateTime<Utc>) -> Result<Attestation, OracleError> {
        self.sign(view, as_of)
    }
}

/// The other side of a trade. Blocks until it signs or rejects.
pub trait Counterparty: Send + Sync {
    fn party(&self) -> &Party;

    fn countersign(&self, proposal: &SignedProposal) -> Result<PartySignature, Rejection>;
}
