use perpflow_core::{Digest, LifecycleError, PublicKey, StateRef, ValidationError};
use perpflow_oracle::OracleError;
use thiserror::Error;

/// Problems with the signatures attached to a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature by {by} does not verify against the proposal root")]
    Invalid { by: PublicKey },

    #[error("{by} signed but is not a required signer")]
    NotRequired { by: PublicKey },

    #[error("missing signatures from {} required signer(s)", .0.len())]
    Missing(Vec<PublicKey>),
}

/// Why a counterparty refused to countersign.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("contract check failed: {0}")]
    Contract(#[from] ValidationError),

    #[error("signature check failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("acceptance policy: {0}")]
    Policy(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no unconsumed {ticker} position for taker {taker}")]
    NotFound { ticker: String, taker: PublicKey },
}

/// Reported by a finalizer that refused to commit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FinalizationError {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Contract(#[from] ValidationError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("proposal {0} was already committed")]
    AlreadyCommitted(Digest),

    #[error("input {0} is not a known position")]
    UnknownInput(StateRef),

    #[error("input {0} was already consumed")]
    DoubleSpend(StateRef),

    #[error("input {0} does not match the committed position")]
    InputMismatch(StateRef),

    #[error("taker {taker} already holds an open {ticker} position")]
    DuplicatePosition { ticker: String, taker: PublicKey },
}

/// Any failure that aborts a proposal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    #[error("local verification failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("attestation failed: {0}")]
    Attestation(#[from] OracleError),

    #[error("counterparty rejected: {0}")]
    CounterpartyRejected(#[from] Rejection),

    #[error("finalization failed: {0}")]
    Finalization(#[from] FinalizationError),

    #[error("position lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("signature collection failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("invalid transition: {inbound} while {stage}")]
    InvalidTransition {
        stage: &'static str,
        inbound: &'static str,
    },
}
