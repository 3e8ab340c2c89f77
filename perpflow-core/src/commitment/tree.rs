//! Binary BLAKE3 Merkle tree and its pruned (partial) form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::digest::Digest;

const NODE_DOMAIN: &[u8] = b"perpflow/node/v1";

pub fn node_hash(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(NODE_DOMAIN);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hasher.finalize().into()
}

/// Full tree over leaf hashes, padded with [`Digest::ZERO`] to a power of two.
#[derive(Debug, Clone, PartialEq)]
pub enum MerkleTree {
    Leaf(Digest),
    Node {
        hash: Digest,
        left: Box<MerkleTree>,
        right: Box<MerkleTree>,
    },
}

impl MerkleTree {
    /// An empty leaf list yields a single zero leaf.
    pub fn build(leaves: &[Digest]) -> Self {
        let width = leaves.len().max(1).next_power_of_two();
        let mut level: Vec<MerkleTree> = leaves
            .iter()
            .copied()
            .chain(std::iter::repeat(Digest::ZERO))
            .take(width)
            .map(MerkleTree::Leaf)
            .collect();

        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len() / 2);
            let mut iter = level.into_iter();
            while let (Some(left), Some(right)) = (iter.next(), iter.next()) {
                next.push(MerkleTree::Node {
                    hash: node_hash(&left.root(), &right.root()),
                    left: Box::new(left),
                    right: Box::new(right),
                });
            }
            level = next;
        }

        level.pop().unwrap_or(MerkleTree::Leaf(Digest::ZERO))
    }

    pub fn root(&self) -> Digest {
        match self {
            MerkleTree::Leaf(hash) | MerkleTree::Node { hash, .. } => *hash,
        }
    }

    /// Number of leaf slots, padding included.
    pub fn width(&self) -> usize {
        match self {
            MerkleTree::Leaf(_) => 1,
            MerkleTree::Node { left, .. } => 2 * left.width(),
        }
    }

    /// Collapse every subtree containing none of `include` into its hash.
    pub fn prune(&self, include: &BTreeSet<usize>) -> PartialTree {
        self.prune_from(0, include)
    }

    fn prune_from(&self, offset: usize, include: &BTreeSet<usize>) -> PartialTree {
        let width = self.width();
        if include.range(offset..offset + width).next().is_none() {
            return PartialTree::Pruned(self.root());
        }
        match self {
            MerkleTree::Leaf(hash) => PartialTree::Included(*hash),
            MerkleTree::Node { left, right, .. } => {
                let half = width / 2;
                PartialTree::Node(
                    Box::new(left.prune_from(offset, include)),
                    Box::new(right.prune_from(offset + half, include)),
                )
            }
        }
    }
}

/// Pruned tree: enough structure to recompute the root from disclosed leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PartialTree {
    /// A disclosed leaf hash.
    Included(Digest),
    /// A hidden subtree, represented by its hash.
    Pruned(Digest),
    Node(Box<PartialTree>, Box<PartialTree>),
}

impl PartialTree {
    pub fn root(&self) -> Digest {
        match self {
            PartialTree::Included(hash) | PartialTree::Pruned(hash) => *hash,
            PartialTree::Node(left, right) => node_hash(&left.root(), &right.root()),
        }
    }

    /// Included leaf hashes, left to right.
    pub fn included(&self) -> Vec<Digest> {
        let mut out = Vec::new();
        self.collect_included(&mut out);
        out
    }

    fn collect_included(&self, out: &mut Vec<Digest>) {
        match self {
            PartialTree::Included(hash) => out.push(*hash),
            PartialTree::Pruned(_) => {}
            PartialTree::Node(left, right) => {
                left.collect_included(out);
                right.collect_included(out);
            }
        }
    }
}
