//! PerpFlow Core — positions, commands, proposals, commitments, contract verifier.
//!
//! This crate holds everything both sides of a trade must agree on:
//! - Domain types (positions, parties, commands, proposals, lifecycle)
//! - Merkle commitment over a proposal and partial views for selective disclosure
//! - Ed25519 identities and root signatures
//! - The contract verifier with named rules
//!
//! No I/O and no async: every function here is deterministic given its inputs
//! (random salts and key generation excepted).

pub mod commitment;
pub mod contract;
pub mod crypto;
pub mod domain;

pub use commitment::{CommitmentError, Digest, Disclosure, LeafTag, PartialView};
pub use contract::{verify, Rule, ValidationError, MAX_LEVERAGE};
pub use crypto::{Identity, KeyPair, PartySignature, Signature, Signer};
pub use domain::{
    Command, CommandKind, Lifecycle, LifecycleError, Party, Position, Proposal, PublicKey,
    StateAndRef, StateRef, Ticker,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types that cross thread boundaries during
    /// concurrent attestation are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Position>();
        require_sync::<Position>();
        require_send::<Proposal>();
        require_sync::<Proposal>();
        require_send::<Command>();
        require_sync::<Command>();
        require_send::<PartialView>();
        require_sync::<PartialView>();
        require_send::<PartySignature>();
        require_sync::<PartySignature>();
        require_send::<Identity>();
        require_sync::<Identity>();
        require_send::<ValidationError>();
        require_sync::<ValidationError>();
    }

    /// Compile-time check: the verifier takes only the proposal. No ledger,
    /// no clock, no oracle.
    #[allow(dead_code)]
    const VERIFIER_TAKES_ONLY_PROPOSAL: fn(&Proposal) -> Result<(), ValidationError> = contract::verify;
}
