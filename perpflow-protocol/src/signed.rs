//! Proposals with the signatures collected so far.

use std::collections::BTreeMap;

use perpflow_core::{Digest, PartySignature, Proposal, PublicKey};

use crate::error::SignatureError;

/// A proposal plus signatures over its root, keyed by signer.
///
/// Every signature held here has been checked: it verifies against the root
/// and comes from a required signer.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedProposal {
    proposal: Proposal,
    id: Digest,
    signatures: BTreeMap<PublicKey, PartySignature>,
}

impl SignedProposal {
    pub fn new(proposal: Proposal) -> Self {
        let id = proposal.id();
        Self {
            proposal,
            id,
            signatures: BTreeMap::new(),
        }
    }

    pub fn proposal(&self) -> &Proposal {
        &self.proposal
    }

    pub fn id(&self) -> Digest {
        self.id
    }

    pub fn signatures(&self) -> impl Iterator<Item = &PartySignature> {
        self.signatures.values()
    }

    pub fn is_signed_by(&self, key: &PublicKey) -> bool {
        self.signatures.contains_key(key)
    }

    /// Attach a signature after checking it. Re-adding a signer replaces its entry.
    pub fn add(&mut self, signature: PartySignature) -> Result<(), SignatureError> {
        check(&self.proposal, &self.id, &signature)?;
        self.signatures.insert(signature.by, signature);
        Ok(())
    }

    /// Required signers that have not signed yet.
    pub fn missing(&self) -> Vec<PublicKey> {
        self.proposal
            .signers
            .iter()
            .filter(|key| !self.signatures.contains_key(key))
            .copied()
            .collect()
    }

    /// Re-check every held signature. Used by parties receiving a bundle
    /// they did not assemble.
    pub fn verify_signatures(&self) -> Result<(), SignatureError> {
        self.signatures
            .values()
            .try_for_each(|sig| check(&self.proposal, &self.id, sig))
    }

    /// Seal once every required signer is present.
    pub fn finish(self) -> Result<FullySignedProposal, SignatureError> {
        self.verify_signatures()?;
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(SignatureError::Missing(missing));
        }
        Ok(FullySignedProposal(self))
    }
}

fn check(proposal: &Proposal, root: &Digest, signature: &PartySignature) -> Result<(), SignatureError> {
    if !proposal.requires(&signature.by) {
        return Err(SignatureError::NotRequired { by: signature.by });
    }
    if !signature.verify(root) {
        return Err(SignatureError::Invalid { by: signature.by });
    }
    Ok(())
}

/// A proposal carrying a valid signature from every required signer.
///
/// Only obtainable through [`SignedProposal::finish`].
#[derive(Debug, Clone, PartialEq)]
pub struct FullySignedProposal(SignedProposal);

impl FullySignedProposal {
    pub fn proposal(&self) -> &Proposal {
        self.0.proposal()
    }

    pub fn id(&self) -> Digest {
        self.0.id()
    }

    pub fn signatures(&self) -> impl Iterator<Item = &PartySignature> {
        self.0.signatures()
    }

    /// Full re-check for receivers that trust nothing: signatures valid and complete.
    pub fn verify(&self) -> Result<(), SignatureError> {
        self.0.verify_signatures()?;
        let missing = self.0.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SignatureError::Missing(missing))
        }
    }
}
