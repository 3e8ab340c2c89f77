//! Initiator session: drives the state machine against real collaborators.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use perpflow_core::{Identity, Proposal, Signer};
use perpflow_oracle::{Attestation, Feed, OracleError};

use crate::error::ProtocolError;
use crate::flows::{self, Roles};
use crate::machine::{step, AttestationRequest, Inbound, Outbound, State};
use crate::ports::{Counterparty, Finalizer, OracleClient, PositionLookup, Receipt};

/// Everything an initiator talks to.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub counterparty: &'a dyn Counterparty,
    pub price_oracle: &'a dyn OracleClient,
    pub funding_oracle: &'a dyn OracleClient,
    pub lookup: &'a dyn PositionLookup,
    pub finalizer: &'a dyn Finalizer,
}

/// The taker's side of every flow. One proposal at a time per call; the
/// struct itself holds no per-proposal state.
pub struct Initiator<'a> {
    identity: &'a Identity,
    services: Services<'a>,
}

impl<'a> Initiator<'a> {
    pub fn new(identity: &'a Identity, services: Services<'a>) -> Self {
        Self { identity, services }
    }

    pub fn roles(&self) -> Roles {
        Roles {
            taker: self.identity.party().clone(),
            exchange: self.services.counterparty.party().clone(),
            price_oracle: self.services.price_oracle.public_key(),
            funding_oracle: self.services.funding_oracle.public_key(),
        }
    }

    /// Query price and funding rate, then open `size` posting `collateral`.
    pub fn open(
        &self,
        ticker: &str,
        size: f64,
        collateral: f64,
        as_of: DateTime<Utc>,
    ) -> Result<Receipt, ProtocolError> {
        let (price, funding_rate) = rayon::join(
            || self.services.price_oracle.query(ticker, as_of),
            || self.services.funding_oracle.query(ticker, as_of),
        );
        let proposal = flows::draft_open(&self.roles(), ticker, price?, funding_rate?, size, collateral);
        self.run(proposal, as_of)
    }

    /// Reduce the current `ticker` position by `amount` at the oracle price.
    pub fn partial_close(
        &self,
        ticker: &str,
        amount: f64,
        as_of: DateTime<Utc>,
    ) -> Result<Receipt, ProtocolError> {
        let held = self
            .services
            .lookup
            .find_unconsumed(ticker, &self.identity.public_key())?;
        let price = self.services.price_oracle.query(ticker, as_of)?;
        let proposal = flows::draft_partial_close(&self.roles(), held, amount, price);
        self.run(proposal, as_of)
    }

    /// Close the current `ticker` position at the oracle price.
    pub fn close(&self, ticker: &str, as_of: DateTime<Utc>) -> Result<Receipt, ProtocolError> {
        let held = self
            .services
            .lookup
            .find_unconsumed(ticker, &self.identity.public_key())?;
        let price = self.services.price_oracle.query(ticker, as_of)?;
        let proposal = flows::draft_close(&self.roles(), held, price);
        self.run(proposal, as_of)
    }

    /// Drive a drafted proposal to a terminal state.
    pub fn run(&self, proposal: Proposal, as_of: DateTime<Utc>) -> Result<Receipt, ProtocolError> {
        let id = proposal.id();
        let command = proposal.command.kind();
        info!(proposal = %id.short(), %command, "proposal drafted");

        let mut state = State::Drafted(proposal);
        let mut inbound = Inbound::Continue;
        loop {
            let from = state.stage();
            let (next, outbound) = step(state, inbound);
            if next.stage() != from {
                debug!(proposal = %id.short(), from = %from, to = %next.stage(), "stage change");
            }

            state = match next {
                State::Finalized(receipt) => {
                    info!(proposal = %id.short(), created = receipt.created.len(), "proposal finalized");
                    return Ok(receipt);
                }
                State::Aborted(error) => {
                    warn!(proposal = %id.short(), stage = %from, %error, "proposal aborted");
                    return Err(error);
                }
                other => other,
            };

            inbound = match outbound {
                None => Inbound::Continue,
                Some(Outbound::SelfSign(root)) => Inbound::SelfSigned(self.identity.sign_root(&root)),
                Some(Outbound::RequestAttestations(requests)) => {
                    Inbound::Attestations(self.collect_attestations(&requests, as_of))
                }
                Some(Outbound::RequestCountersignature(signed)) => {
                    Inbound::Countersigned(self.services.counterparty.countersign(&signed))
                }
                Some(Outbound::Submit(full)) => Inbound::Finalized(self.services.finalizer.submit(full)),
            };
        }
    }

    fn oracle(&self, feed: Feed) -> &'a dyn OracleClient {
        match feed {
            Feed::Price => self.services.price_oracle,
            Feed::FundingRate => self.services.funding_oracle,
        }
    }

    /// Fan out to every oracle concurrently; all must succeed.
    fn collect_attestations(
        &self,
        requests: &[AttestationRequest],
        as_of: DateTime<Utc>,
    ) -> Result<Vec<Attestation>, OracleError> {
        requests
            .par_iter()
            .map(|r| self.oracle(r.feed).request_signature(&r.view, as_of))
            .collect()
    }
}
