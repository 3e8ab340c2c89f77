//! Transaction proposal: an in-flight, not-yet-committed state transition.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::command::Command;
use super::party::PublicKey;
use super::position::Position;
use crate::commitment::{Digest, Disclosure, MerkleTree, PartialView};

/// Pointer to a committed output: the id of the proposal that produced it
/// and the output index inside that proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateRef {
    pub proposal_id: Digest,
    pub index: u32,
}

impl StateRef {
    pub fn new(proposal_id: Digest, index: u32) -> Self {
        Self { proposal_id, index }
    }
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.proposal_id.short(), self.index)
    }
}

/// A committed position together with the reference it was committed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateAndRef {
    pub reference: StateRef,
    pub position: Position,
}

/// Inputs to consume, outputs to create, one command, and the keys that must sign.
///
/// The salt seeds per-leaf nonces so leaves hidden from a partial view cannot
/// be recovered by guessing their content. The proposal id is the Merkle root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub inputs: Vec<StateAndRef>,
    pub outputs: Vec<Position>,
    pub command: Command,
    pub signers: BTreeSet<PublicKey>,
    pub salt: Digest,
}

impl Proposal {
    pub fn builder(command: Command) -> ProposalBuilder {
        ProposalBuilder::new(command)
    }

    /// Merkle root over every component of the proposal.
    pub fn id(&self) -> Digest {
        self.tree().root()
    }

    pub fn tree(&self) -> MerkleTree {
        MerkleTree::build(&crate::commitment::leaf_hashes(self))
    }

    /// Partial view disclosing only the components selected by `disclosure`.
    pub fn partial_view(&self, disclosure: &Disclosure) -> PartialView {
        PartialView::build(self, disclosure)
    }

    /// The single input, if exactly one is present.
    pub fn input(&self) -> Option<&StateAndRef> {
        match self.inputs.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// The single output, if exactly one is present.
    pub fn output(&self) -> Option<&Position> {
        match self.outputs.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn requires(&self, key: &PublicKey) -> bool {
        self.signers.contains(key)
    }
}

/// Incremental builder for [`Proposal`].
#[derive(Debug, Clone)]
pub struct ProposalBuilder {
    inputs: Vec<StateAndRef>,
    outputs: Vec<Position>,
    command: Command,
    signers: BTreeSet<PublicKey>,
    salt: Option<Digest>,
}

impl ProposalBuilder {
    pub fn new(command: Command) -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            command,
            signers: BTreeSet::new(),
            salt: None,
        }
    }

    pub fn input(mut self, input: StateAndRef) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn output(mut self, output: Position) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn signer(mut self, key: PublicKey) -> Self {
        self.signers.insert(key);
        self
    }

    pub fn signers(mut self, keys: impl IntoIterator<Item = PublicKey>) -> Self {
        self.signers.extend(keys);
        self
    }

    /// Fix the salt (tests and reproducible fixtures). A random salt is drawn otherwise.
    pub fn salt(mut self, salt: Digest) -> Self {
        self.salt = Some(salt);
        self
    }

    pub fn build(self) -> Proposal {
        let salt = self
            .salt
            .unwrap_or_else(|| Digest(rand::thread_rng().gen::<[u8; 32]>()));
        Proposal {
            inputs: self.inputs,
            outputs: self.outputs,
            command: self.command,
            signers: self.signers,
            salt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Party;

    fn open_proposal(salt: Digest) -> Proposal {
        let taker = Party::new("George", PublicKey([1; 32]));
        let exchange = Party::new("Binance", PublicKey([2; 32]));
        Proposal::builder(Command::Open {
            ticker: "BTC".into(),
            price: 35_000.0,
            funding_rate: 0.8,
        })
        .output(Position::open("BTC", 35_000.0, 0.01, 1_000.0, taker.clone(), exchange.clone()))
        .signers([taker.key, exchange.key])
        .salt(salt)
        .build()
    }

    #[test]
    fn id_is_deterministic_for_fixed_salt() {
        let a = open_proposal(Digest([7; 32]));
        let b = open_proposal(Digest([7; 32]));
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn salt_changes_id() {
        let a = open_proposal(Digest([7; 32]));
        let b = open_proposal(Digest([8; 32]));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn any_field_change_changes_id() {
        let a = open_proposal(Digest([7; 32]));
        let mut b = a.clone();
        b.outputs[0].collateral = 1_001.0;
        assert_ne!(a.id(), b.id());

        let mut c = a.clone();
        c.signers.insert(PublicKey([9; 32]));
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn single_accessors_reject_multiples() {
        let mut p = open_proposal(Digest([7; 32]));
        assert!(p.output().is_some());
        assert!(p.input().is_none());
        let dup = p.outputs[0].clone();
        p.outputs.push(dup);
        assert!(p.output().is_none());
    }

    #[test]
    fn builder_draws_random_salt() {
        let cmd = Command::Close {
            ticker: "BTC".into(),
            price: 1.0,
        };
        let a = Proposal::builder(cmd.clone()).build();
        let b = Proposal::builder(cmd).build();
        assert_ne!(a.salt, b.salt);
    }
}
