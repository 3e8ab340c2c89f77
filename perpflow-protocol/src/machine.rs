//! Initiator state machine.
//!
//! ```text
//! Drafted → LocallyVerified → SelfSigned → AttestationsCollected → CounterpartyCountersigned → Finalizable → Finalized
//!     └──────────────┴──────────────┴──────────────────┴─────────────────────────┴──────────────────┴──→ Aborted
//! ```
//!
//! [`step`] is pure: it consumes the current state and one inbound message and
//! returns the next state plus, optionally, a request for the outside world.
//! The caller performs the request and feeds the answer back in. A `None`
//! outbound means "step again with [`Inbound::Continue`]".

use std::fmt;

use perpflow_core::{verify, Digest, Disclosure, PartialView, PartySignature, Proposal};
use perpflow_oracle::{Attestation, Feed, OracleError};

use crate::error::{FinalizationError, ProtocolError, Rejection};
use crate::ports::Receipt;
use crate::signed::{FullySignedProposal, SignedProposal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Drafted,
    LocallyVerified,
    SelfSigned,
    AttestationsCollected,
    CounterpartyCountersigned,
    Finalizable,
    Finalized,
    Aborted,
}

impl Stage {
    pub const fn name(self) -> &'static str {
        match self {
            Stage::Drafted => "Drafted",
            Stage::LocallyVerified => "LocallyVerified",
            Stage::SelfSigned => "SelfSigned",
            Stage::AttestationsCollected => "AttestationsCollected",
            Stage::CounterpartyCountersigned => "CounterpartyCountersigned",
            Stage::Finalizable => "Finalizable",
            Stage::Finalized => "Finalized",
            Stage::Aborted => "Aborted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Finalized | Stage::Aborted)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub enum State {
    Drafted(Proposal),
    /// Contract rules passed; waiting for the initiator's own signature.
    LocallyVerified(SignedProposal),
    /// Initiator has signed; waiting for oracle attestations.
    SelfSigned(SignedProposal),
    AttestationsCollected(SignedProposal),
    CounterpartyCountersigned(SignedProposal),
    Finalizable(Digest),
    Finalized(Receipt),
    Aborted(ProtocolError),
}

impl State {
    pub fn stage(&self) -> Stage {
        match self {
            State::Drafted(_) => Stage::Drafted,
            State::LocallyVerified(_) => Stage::LocallyVerified,
            State::SelfSigned(_) => Stage::SelfSigned,
            State::AttestationsCollected(_) => Stage::AttestationsCollected,
            State::CounterpartyCountersigned(_) => Stage::CounterpartyCountersigned,
            State::Finalizable(_) => Stage::Finalizable,
            State::Finalized(_) => Stage::Finalized,
            State::Aborted(_) => Stage::Aborted,
        }
    }
}

/// Answers from the outside world.
#[derive(Debug)]
pub enum Inbound {
    Continue,
    SelfSigned(PartySignature),
    Attestations(Result<Vec<Attestation>, OracleError>),
    Countersigned(Result<PartySignature, Rejection>),
    Finalized(Result<Receipt, FinalizationError>),
}

impl Inbound {
    fn name(&self) -> &'static str {
        match self {
            Inbound::Continue => "Continue",
            Inbound::SelfSigned(_) => "SelfSigned",
            Inbound::Attestations(_) => "Attestations",
            Inbound::Countersigned(_) => "Countersigned",
            Inbound::Finalized(_) => "Finalized",
        }
    }
}

/// One oracle signature request: the feed and the view it may see.
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationRequest {
    pub feed: Feed,
    pub view: PartialView,
}

/// Requests to the outside world.
#[derive(Debug)]
pub enum Outbound {
    SelfSign(Digest),
    RequestAttestations(Vec<AttestationRequest>),
    RequestCountersignature(SignedProposal),
    Submit(FullySignedProposal),
}

fn abort(error: impl Into<ProtocolError>) -> (State, Option<Outbound>) {
    (State::Aborted(error.into()), None)
}

pub fn step(state: State, inbound: Inbound) -> (State, Option<Outbound>) {
    match (state, inbound) {
        // Terminal states absorb everything.
        (done @ (State::Finalized(_) | State::Aborted(_)), _) => (done, None),

        (State::Drafted(proposal), Inbound::Continue) => match verify(&proposal) {
            Ok(()) => {
                let signed = SignedProposal::new(proposal);
                let root = signed.id();
                (State::LocallyVerified(signed), Some(Outbound::SelfSign(root)))
            }
            Err(e) => abort(e),
        },

        (State::LocallyVerified(mut signed), Inbound::SelfSigned(sig)) => {
            if let Err(e) = signed.add(sig) {
                return abort(e);
            }
            let requests = attestation_requests(signed.proposal());
            (
                State::SelfSigned(signed),
                Some(Outbound::RequestAttestations(requests)),
            )
        }

        (State::SelfSigned(mut signed), Inbound::Attestations(result)) => {
            let attestations = match result {
                Ok(a) => a,
                Err(e) => return abort(e),
            };
            let required = Feed::required_for(&signed.proposal().command);
            if !required.iter().all(|f| attestations.iter().any(|a| a.feed == *f)) {
                return abort(ProtocolError::InvalidTransition {
                    stage: Stage::SelfSigned.name(),
                    inbound: "incomplete Attestations",
                });
            }
            for attestation in attestations {
                if let Err(e) = signed.add(attestation.signature) {
                    return abort(e);
                }
            }
            let outbound = Outbound::RequestCountersignature(signed.clone());
            (State::AttestationsCollected(signed), Some(outbound))
        }

        (State::AttestationsCollected(mut signed), Inbound::Countersigned(result)) => {
            let sig = match result {
                Ok(sig) => sig,
                Err(rejection) => return abort(rejection),
            };
            match signed.add(sig) {
                Ok(()) => (State::CounterpartyCountersigned(signed), None),
                Err(e) => abort(e),
            }
        }

        (State::CounterpartyCountersigned(signed), Inbound::Continue) => match signed.finish() {
            Ok(full) => (State::Finalizable(full.id()), Some(Outbound::Submit(full))),
            Err(e) => abort(e),
        },

        (State::Finalizable(_), Inbound::Finalized(result)) => match result {
            Ok(receipt) => (State::Finalized(receipt), None),
            Err(e) => abort(e),
        },

        (state, inbound) => abort(ProtocolError::InvalidTransition {
            stage: state.stage().name(),
            inbound: inbound.name(),
        }),
    }
}

/// One view per feed the command needs, each disclosing command and signers only.
pub fn attestation_requests(proposal: &Proposal) -> Vec<AttestationRequest> {
    let disclosure = Disclosure::oracle();
    Feed::required_for(&proposal.command)
        .into_iter()
        .map(|feed| AttestationRequest {
            feed,
            view: proposal.partial_view(&disclosure),
        })
        .collect()
}
