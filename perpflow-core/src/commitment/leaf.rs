//! Leaf components and their canonical hashing.
//!
//! Every semantic component of a proposal becomes one leaf, tagged by kind.
//! Leaf hash = BLAKE3("perpflow/leaf/v1" ‖ nonce ‖ tag ‖ canonical content).
//! The nonce is derived from the proposal salt, the tag and the leaf index, and
//! travels with the leaf when it is disclosed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::digest::Digest;
use crate::domain::{Command, Party, Position, Proposal, PublicKey, StateAndRef};

const LEAF_DOMAIN: &[u8] = b"perpflow/leaf/v1";
const NONCE_DOMAIN: &[u8] = b"perpflow/nonce/v1";

/// Kind of a committed leaf. Disclosure predicates select leaves by tag only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LeafTag {
    Input,
    Output,
    Command,
    Signers,
}

impl LeafTag {
    fn code(self) -> u8 {
        match self {
            LeafTag::Input => 1,
            LeafTag::Output => 2,
            LeafTag::Command => 3,
            LeafTag::Signers => 4,
        }
    }
}

impl fmt::Display for LeafTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LeafTag::Input => "input",
            LeafTag::Output => "output",
            LeafTag::Command => "command",
            LeafTag::Signers => "signers",
        };
        f.write_str(name)
    }
}

/// One semantic component of a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    Input(StateAndRef),
    Output(Position),
    Command(Command),
    Signers(BTreeSet<PublicKey>),
}

impl Component {
    pub fn tag(&self) -> LeafTag {
        match self {
            Component::Input(_) => LeafTag::Input,
            Component::Output(_) => LeafTag::Output,
            Component::Command(_) => LeafTag::Command,
            Component::Signers(_) => LeafTag::Signers,
        }
    }

    pub fn leaf_hash(&self, nonce: &Digest) -> Digest {
        let mut enc = Encoder::new(LEAF_DOMAIN);
        enc.bytes(nonce.as_bytes());
        enc.u8(self.tag().code());
        match self {
            Component::Input(input) => {
                enc.bytes(input.reference.proposal_id.as_bytes());
                enc.u32(input.reference.index);
                enc.position(&input.position);
            }
            Component::Output(position) => enc.position(position),
            Component::Command(command) => enc.command(command),
            Component::Signers(keys) => {
                enc.u32(keys.len() as u32);
                for key in keys {
                    enc.bytes(key.as_bytes());
                }
            }
        }
        enc.finish()
    }
}

/// Components in canonical leaf order: inputs, outputs, command, signers.
pub fn components(proposal: &Proposal) -> Vec<Component> {
    let mut out = Vec::with_capacity(proposal.inputs.len() + proposal.outputs.len() + 2);
    out.extend(proposal.inputs.iter().cloned().map(Component::Input));
    out.extend(proposal.outputs.iter().cloned().map(Component::Output));
    out.push(Component::Command(proposal.command.clone()));
    out.push(Component::Signers(proposal.signers.clone()));
    out
}

/// Per-leaf nonce derived from the proposal salt.
pub fn nonce(salt: &Digest, tag: LeafTag, index: usize) -> Digest {
    let mut enc = Encoder::new(NONCE_DOMAIN);
    enc.bytes(salt.as_bytes());
    enc.u8(tag.code());
    enc.u32(index as u32);
    enc.finish()
}

/// Leaf hashes of a proposal, in canonical order.
pub fn leaf_hashes(proposal: &Proposal) -> Vec<Digest> {
    components(proposal)
        .iter()
        .enumerate()
        .map(|(i, c)| c.leaf_hash(&nonce(&proposal.salt, c.tag(), i)))
        .collect()
}

/// Length-prefixed field encoder feeding a BLAKE3 hasher.
struct Encoder(blake3::Hasher);

impl Encoder {
    fn new(domain: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain);
        Self(hasher)
    }

    fn u8(&mut self, v: u8) {
        self.0.update(&[v]);
    }

    fn u32(&mut self, v: u32) {
        self.0.update(&v.to_le_bytes());
    }

    // Bit pattern, so -0.0 and 0.0 commit differently and NaN payloads are kept.
    fn f64(&mut self, v: f64) {
        self.0.update(&v.to_bits().to_le_bytes());
    }

    fn bytes(&mut self, b: &[u8]) {
        self.0.update(b);
    }

    fn str(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.0.update(s.as_bytes());
    }

    fn party(&mut self, p: &Party) {
        self.str(&p.name);
        self.bytes(p.key.as_bytes());
    }

    fn position(&mut self, p: &Position) {
        self.str(&p.ticker);
        self.f64(p.current_price);
        self.f64(p.initial_price);
        self.f64(p.position_size);
        self.f64(p.collateral);
        self.party(&p.taker);
        self.party(&p.exchange);
    }

    fn command(&mut self, c: &Command) {
        match c {
            Command::Open {
                ticker,
                price,
                funding_rate,
            } => {
                self.u8(1);
                self.str(ticker);
                self.f64(*price);
                self.f64(*funding_rate);
            }
            Command::Close { ticker, price } => {
                self.u8(2);
                self.str(ticker);
                self.f64(*price);
            }
            Command::PartialClose { ticker, price } => {
                self.u8(3);
                self.str(ticker);
                self.f64(*price);
            }
        }
    }

    fn finish(self) -> Digest {
        self.0.finalize().into()
    }
}
