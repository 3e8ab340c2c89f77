//! Merkle commitment over a proposal and partial views for selective disclosure.
//!
//! - `Digest`: 32-byte BLAKE3 output.
//! - `leaf`: tagged components and canonical leaf hashing.
//! - `MerkleTree` / `PartialTree`: full and pruned binary trees.
//! - `PartialView`: disclosed leaves + pruned tree, verifiable against a root.

pub mod digest;
pub mod leaf;
pub mod tree;
pub mod view;

pub use digest::Digest;
pub use leaf::{components, leaf_hashes, Component, LeafTag};
pub use tree::{node_hash, MerkleTree, PartialTree};
pub use view::{DisclosedLeaf, Disclosure, PartialView};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitmentError {
    #[error("partial tree recomputes to {computed}, view claims {claimed}")]
    RootMismatch { claimed: Digest, computed: Digest },

    #[error("partial tree includes {included} leaves but {disclosed} were disclosed")]
    LeafCountMismatch { included: usize, disclosed: usize },

    #[error("disclosed {tag} leaf at position {position} does not match its included hash")]
    LeafMismatch { position: usize, tag: LeafTag },
}
