//! Selective disclosure: a partial view of a proposal plus the proof that the
//! disclosed leaves belong to the proposal's root.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::digest::Digest;
use super::leaf::{self, Component, LeafTag};
use super::tree::PartialTree;
use super::CommitmentError;
use crate::domain::{Command, Proposal, PublicKey};

/// Which leaves to disclose, chosen by tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosure {
    tags: BTreeSet<LeafTag>,
}

impl Disclosure {
    pub fn of(tags: impl IntoIterator<Item = LeafTag>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
        }
    }

    /// What an attestation authority is shown: the command and who must sign.
    pub fn oracle() -> Self {
        Self::of([LeafTag::Command, LeafTag::Signers])
    }

    pub fn includes(&self, tag: LeafTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// A disclosed leaf: its nonce and content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisclosedLeaf {
    pub nonce: Digest,
    pub component: Component,
}

impl DisclosedLeaf {
    pub fn leaf_hash(&self) -> Digest {
        self.component.leaf_hash(&self.nonce)
    }
}

/// Disclosed leaves, the pruned tree, and the claimed root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialView {
    pub root: Digest,
    pub tree: PartialTree,
    pub leaves: Vec<DisclosedLeaf>,
}

impl PartialView {
    pub fn build(proposal: &Proposal, disclosure: &Disclosure) -> Self {
        let components = leaf::components(proposal);
        let hashes = leaf::leaf_hashes(proposal);
        let tree = super::MerkleTree::build(&hashes);

        let mut include = BTreeSet::new();
        let mut leaves = Vec::new();
        for (index, component) in components.into_iter().enumerate() {
            if disclosure.includes(component.tag()) {
                include.insert(index);
                leaves.push(DisclosedLeaf {
                    nonce: leaf::nonce(&proposal.salt, component.tag(), index),
                    component,
                });
            }
        }

        Self {
            root: tree.root(),
            tree: tree.prune(&include),
            leaves,
        }
    }

    /// Recompute the root from the pruned tree and check every disclosed leaf
    /// hashes to the matching included slot.
    pub fn verify(&self) -> Result<(), CommitmentError> {
        let computed = self.tree.root();
        if computed != self.root {
            return Err(CommitmentError::RootMismatch {
                claimed: self.root,
                computed,
            });
        }

        let included = self.tree.included();
        if included.len() != self.leaves.len() {
            return Err(CommitmentError::LeafCountMismatch {
                included: included.len(),
                disclosed: self.leaves.len(),
            });
        }

        for (position, (leaf, expected)) in self.leaves.iter().zip(&included).enumerate() {
            if leaf.leaf_hash() != *expected {
                return Err(CommitmentError::LeafMismatch {
                    position,
                    tag: leaf.component.tag(),
                });
            }
        }
        Ok(())
    }

    pub fn tags(&self) -> BTreeSet<LeafTag> {
        self.leaves.iter().map(|l| l.component.tag()).collect()
    }

    /// True if every disclosed component satisfies `check`.
    pub fn all(&self, check: impl Fn(&Component) -> bool) -> bool {
        self.leaves.iter().all(|l| check(&l.component))
    }

    /// Disclosed commands. A well-formed proposal has exactly one.
    pub fn commands(&self) -> Vec<&Command> {
        self.leaves
            .iter()
            .filter_map(|l| match &l.component {
                Component::Command(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn signers(&self) -> Option<&BTreeSet<PublicKey>> {
        self.leaves.iter().find_map(|l| match &l.component {
            Component::Signers(keys) => Some(keys),
            _ => None,
        })
    }
}
