//! Attestation authority: answers queries and signs partial views whose
//! embedded figure it can reproduce.
//!
//! The authority only ever sees a [`PartialView`] exposing the command and the
//! required-signer set. Before signing it:
//! 1. checks the view's proof recomputes the claimed root and that nothing
//!    beyond command and signers is disclosed;
//! 2. finds its own key among the required signers;
//! 3. re-queries its source and demands exact equality with the embedded value.
//!
//! The signature covers the root, so it verifies against the id anyone
//! computes over the full proposal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use perpflow_core::commitment::Component;
use perpflow_core::{Command, Digest, Identity, LeafTag, Party, PartialView, PartySignature, PublicKey, Signer};

use crate::error::OracleError;
use crate::source::RateSource;

/// The kind of figure an authority attests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    Price,
    FundingRate,
}

impl Feed {
    /// The value a command claims for this feed.
    pub fn embedded(self, command: &Command) -> Option<f64> {
        match self {
            Feed::Price => Some(command.price()),
            Feed::FundingRate => command.funding_rate(),
        }
    }

    /// Feeds a command must be attested by. Only `Open` carries a funding rate.
    pub fn required_for(command: &Command) -> Vec<Feed> {
        match command {
            Command::Open { .. } => vec![Feed::Price, Feed::FundingRate],
            Command::Close { .. } | Command::PartialClose { .. } => vec![Feed::Price],
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::Price => write!(f, "price"),
            Feed::FundingRate => write!(f, "funding-rate"),
        }
    }
}

/// A successful attestation: the feed, the value checked, and the signature
/// over the proposal root.
#[derive(Debug, Clone, PartialEq)]
pub struct Attestation {
    pub feed: Feed,
    pub root: Digest,
    pub value: f64,
    pub signature: PartySignature,
}

impl Attestation {
    pub fn verify(&self) -> bool {
        self.signature.verify(&self.root)
    }
}

/// One authority per feed. Holds no mutable state beyond what its source
/// keeps internally.
pub struct AttestationAuthority {
    feed: Feed,
    identity: Identity,
    source: Box<dyn RateSource>,
}

impl fmt::Debug for AttestationAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttestationAuthority")
            .field("feed", &self.feed)
            .field("party", self.identity.party())
            .finish_non_exhaustive()
    }
}

impl AttestationAuthority {
    pub fn new(feed: Feed, identity: Identity, source: impl RateSource + 'static) -> Self {
        Self {
            feed,
            identity,
            source: Box::new(source),
        }
    }

    pub fn feed(&self) -> Feed {
        self.feed
    }

    pub fn party(&self) -> &Party {
        self.identity.party()
    }

    pub fn public_key(&self) -> PublicKey {
        self.identity.public_key()
    }

    pub fn supported_tickers(&self) -> Vec<String> {
        self.source.tickers()
    }

    /// Deterministic in `(ticker, as_of)`.
    pub fn query(&self, ticker: &str, as_of: DateTime<Utc>) -> Result<f64, OracleError> {
        self.source
            .rate(ticker, as_of)
            .ok_or_else(|| OracleError::unsupported(ticker))
    }

    pub fn sign(&self, view: &PartialView, as_of: DateTime<Utc>) -> Result<Attestation, OracleError> {
        let result = self.check_and_sign(view, as_of);
        match &result {
            Ok(att) => info!(
                feed = %self.feed,
                root = %att.root.short(),
                value = att.value,
                "attestation signed"
            ),
            Err(e) => warn!(feed = %self.feed, root = %view.root.short(), error = %e, "attestation refused"),
        }
        result
    }

    fn check_and_sign(&self, view: &PartialView, as_of: DateTime<Utc>) -> Result<Attestation, OracleError> {
        let command = check_scope(view)?;

        let me = self.public_key();
        let required = view.signers().is_some_and(|keys| keys.contains(&me));
        if !required {
            return Err(OracleError::NotARequiredSigner { oracle: me });
        }

        let observed = self.query(command.ticker(), as_of)?;
        let embedded = self.feed.embedded(command);
        if embedded != Some(observed) {
            return Err(OracleError::AttestationMismatch {
                feed: self.feed,
                ticker: command.ticker().to_string(),
                embedded,
                observed,
            });
        }

        Ok(Attestation {
            feed: self.feed,
            root: view.root,
            value: observed,
            signature: self.identity.sign_root(&view.root),
        })
    }
}

/// Proof must hold, only command and signer leaves may be disclosed, and
/// exactly one command must be among them.
fn check_scope(view: &PartialView) -> Result<&Command, OracleError> {
    view.verify()
        .map_err(|e| OracleError::SignatureScopeViolation(e.to_string()))?;

    let outside = view
        .tags()
        .into_iter()
        .find(|tag| !matches!(tag, LeafTag::Command | LeafTag::Signers));
    if let Some(tag) = outside {
        return Err(OracleError::SignatureScopeViolation(format!(
            "{tag} leaf disclosed beyond oracle scope"
        )));
    }

    let mut commands = view.leaves.iter().filter_map(|leaf| match &leaf.component {
        Component::Command(c) => Some(c),
        _ => None,
    });
    match (commands.next(), commands.next()) {
        (Some(command), None) => Ok(command),
        (None, _) => Err(OracleError::SignatureScopeViolation(
            "no command disclosed".into(),
        )),
        (Some(_), Some(_)) => Err(OracleError::SignatureScopeViolation(
            "more than one command disclosed".into(),
        )),
    }
}
