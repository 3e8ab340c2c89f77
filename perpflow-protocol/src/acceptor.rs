//! Counterparty side: re-check a proposal and countersign it.

use tracing::{info, warn};

use perpflow_core::{verify, Identity, Party, PartySignature, PublicKey, Signer};

use crate::error::{Rejection, SignatureError};
use crate::policy::AcceptancePolicy;
use crate::ports::Counterparty;
use crate::signed::SignedProposal;

/// An exchange that countersigns proposals passing its checks.
///
/// Checks run in order: signatures already present, every other required
/// signer (initiator and oracles) has signed, contract rules, then the
/// acceptance policy. Nothing is signed on any failure.
#[derive(Debug)]
pub struct Acceptor {
    identity: Identity,
    policy: AcceptancePolicy,
}

impl Acceptor {
    pub fn new(identity: Identity, policy: AcceptancePolicy) -> Self {
        Self { identity, policy }
    }

    pub fn policy(&self) -> &AcceptancePolicy {
        &self.policy
    }

    fn review(&self, proposal: &SignedProposal) -> Result<(), Rejection> {
        proposal.verify_signatures()?;
        let me = self.identity.public_key();
        let others: Vec<PublicKey> = proposal.missing().into_iter().filter(|key| *key != me).collect();
        if !others.is_empty() {
            return Err(SignatureError::Missing(others).into());
        }
        verify(proposal.proposal())?;
        self.policy
            .check(proposal.proposal(), &self.identity.public_key())
            .map_err(Rejection::Policy)
    }
}

impl Counterparty for Acceptor {
    fn party(&self) -> &Party {
        self.identity.party()
    }

    fn countersign(&self, proposal: &SignedProposal) -> Result<PartySignature, Rejection> {
        let id = proposal.id();
        match self.review(proposal) {
            Ok(()) => {
                info!(
                    exchange = self.identity.name(),
                    proposal = %id.short(),
                    command = %proposal.proposal().command,
                    "countersigned"
                );
                Ok(self.identity.sign_root(&id))
            }
            Err(rejection) => {
                warn!(
                    exchange = self.identity.name(),
                    proposal = %id.short(),
                    reason = %rejection,
                    "countersignature refused"
                );
                Err(rejection)
            }
        }
    }
}
