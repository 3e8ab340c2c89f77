//! Identities and Ed25519 signatures over proposal roots.
//!
//! Every party (taker, exchange, oracle) signs the same payload: a domain tag
//! followed by the proposal's Merkle root. An oracle that only saw a partial
//! view therefore produces a signature anyone can check against the root they
//! compute from the full proposal.

use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

use crate::commitment::Digest;
use crate::domain::{Party, PublicKey};

const SIGNING_DOMAIN: &[u8] = b"perpflow/proposal/v1";

/// Raw 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.0[..6].iter().map(|b| format!("{b:02x}")).collect();
        write!(f, "Signature({head}…)")
    }
}

/// Bytes every party signs for a given proposal root.
pub fn signing_payload(root: &Digest) -> Vec<u8> {
    let mut payload = Vec::with_capacity(SIGNING_DOMAIN.len() + 32);
    payload.extend_from_slice(SIGNING_DOMAIN);
    payload.extend_from_slice(root.as_bytes());
    payload
}

/// Check `signature` over `message` against `key`. Malformed keys verify as false.
pub fn verify_signature(message: &[u8], signature: &Signature, key: &PublicKey) -> bool {
    let Ok(verifying) = VerifyingKey::from_bytes(key.as_bytes()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying.verify(message, &sig).is_ok()
}

/// Anything that can sign with a single identity key.
pub trait Signer: Send + Sync {
    fn public_key(&self) -> PublicKey;

    fn sign(&self, message: &[u8]) -> Signature;

    fn sign_root(&self, root: &Digest) -> PartySignature {
        PartySignature {
            by: self.public_key(),
            signature: self.sign(&signing_payload(root)),
        }
    }
}

/// Signature over a proposal root, tagged with the signer's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartySignature {
    pub by: PublicKey,
    pub signature: Signature,
}

impl PartySignature {
    pub fn verify(&self, root: &Digest) -> bool {
        verify_signature(&signing_payload(root), &self.signature, &self.by)
    }
}

/// Ed25519 key pair.
pub struct KeyPair {
    signing: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self::from_secret(rand::thread_rng().gen())
    }

    /// Deterministic key pair from a seed (fixtures, demo scenarios).
    pub fn from_seed(seed: u64) -> Self {
        Self::from_secret(StdRng::seed_from_u64(seed).gen())
    }

    pub fn from_secret(secret: [u8; 32]) -> Self {
        Self {
            signing: SigningKey::from_bytes(&secret),
        }
    }
}

impl Signer for KeyPair {
    fn public_key(&self) -> PublicKey {
        PublicKey(self.signing.verifying_key().to_bytes())
    }

    fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing.sign(message).to_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_key().short())
            .finish_non_exhaustive()
    }
}

/// A named party and its signing keys.
#[derive(Debug)]
pub struct Identity {
    party: Party,
    keys: KeyPair,
}

impl Identity {
    pub fn new(name: impl Into<String>, keys: KeyPair) -> Self {
        let party = Party::new(name, keys.public_key());
        Self { party, keys }
    }

    pub fn generate(name: impl Into<String>) -> Self {
        Self::new(name, KeyPair::generate())
    }

    pub fn from_seed(name: impl Into<String>, seed: u64) -> Self {
        Self::new(name, KeyPair::from_seed(seed))
    }

    pub fn party(&self) -> &Party {
        &self.party
    }

    pub fn name(&self) -> &str {
        &self.party.name
    }
}

impl Signer for Identity {
    fn public_key(&self) -> PublicKey {
        self.party.key
    }

    fn sign(&self, message: &[u8]) -> Signature {
        self.keys.sign(message)
    }
}
