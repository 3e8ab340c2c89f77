//! Proposal drafts for each command, given figures already fetched from
//! the oracles and the position already looked up.

use perpflow_core::{Command, Party, Position, Proposal, PublicKey, StateAndRef};
use perpflow_oracle::Feed;

/// Who takes part in a proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct Roles {
    pub taker: Party,
    pub exchange: Party,
    pub price_oracle: PublicKey,
    pub funding_oracle: PublicKey,
}

impl Roles {
    pub fn oracle(&self, feed: Feed) -> PublicKey {
        match feed {
            Feed::Price => self.price_oracle,
            Feed::FundingRate => self.funding_oracle,
        }
    }

    /// Taker, exchange, and the oracle of every feed the command needs.
    pub fn signers(&self, command: &Command) -> Vec<PublicKey> {
        let mut keys = vec![self.taker.key, self.exchange.key];
        keys.extend(Feed::required_for(command).into_iter().map(|f| self.oracle(f)));
        keys
    }
}

/// Open `size` at the oracle `price`, posting `collateral`.
pub fn draft_open(
    roles: &Roles,
    ticker: &str,
    price: f64,
    funding_rate: f64,
    size: f64,
    collateral: f64,
) -> Proposal {
    let command = Command::Open {
        ticker: ticker.to_string(),
        price,
        funding_rate,
    };
    let signers = roles.signers(&command);
    Proposal::builder(command)
        .output(Position::open(
            ticker,
            price,
            size,
            collateral,
            roles.taker.clone(),
            roles.exchange.clone(),
        ))
        .signers(signers)
        .build()
}

/// Reduce `held` by `amount` at the oracle `price`. Collateral is unchanged.
pub fn draft_partial_close(roles: &Roles, held: StateAndRef, amount: f64, price: f64) -> Proposal {
    let command = Command::PartialClose {
        ticker: held.position.ticker.clone(),
        price,
    };
    let signers = roles.signers(&command);
    let output = held
        .position
        .successor(held.position.position_size - amount, price);
    Proposal::builder(command)
        .input(held)
        .output(output)
        .signers(signers)
        .build()
}

/// Consume `held` entirely at the oracle `price`.
pub fn draft_close(roles: &Roles, held: StateAndRef, price: f64) -> Proposal {
    let command = Command::Close {
        ticker: held.position.ticker.clone(),
        price,
    };
    let signers = roles.signers(&command);
    Proposal::builder(command).input(held).signers(signers).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use perpflow_core::{verify, Digest, StateRef};

    fn roles() -> Roles {
        Roles {
            taker: Party::new("George", PublicKey([1; 32])),
            exchange: Party::new("Binance", PublicKey([2; 32])),
            price_oracle: PublicKey([3; 32]),
            funding_oracle: PublicKey([4; 32]),
        }
    }

    fn held(size: f64) -> StateAndRef {
        let r = roles();
        StateAndRef {
            reference: StateRef::new(Digest([9; 32]), 0),
            position: Position::open("BTC", 35_000.0, size, 1_000.0, r.taker, r.exchange),
        }
    }

    #[test]
    fn open_requires_both_oracles() {
        let p = draft_open(&roles(), "BTC", 35_000.0, 0.8, 0.01, 1_000.0);
        assert_eq!(p.signers.len(), 4);
        assert!(p.requires(&PublicKey([4; 32])));
        assert_eq!(verify(&p), Ok(()));
    }

    #[test]
    fn partial_close_subtracts_amount_and_remarks_price() {
        let p = draft_partial_close(&roles(), held(0.02), 0.005, 36_000.0);
        let out = p.output().unwrap();
        assert!((out.position_size - 0.015).abs() < 1e-12);
        assert_eq!(out.current_price, 36_000.0);
        assert_eq!(out.initial_price, 35_000.0);
        assert_eq!(out.collateral, 1_000.0);
        assert!(!p.requires(&PublicKey([4; 32])));
        assert_eq!(verify(&p), Ok(()));
    }

    #[test]
    fn close_has_no_output() {
        let p = draft_close(&roles(), held(0.02), 36_000.0);
        assert!(p.outputs.is_empty());
        assert_eq!(p.command.kind(), perpflow_core::CommandKind::Close);
        assert_eq!(verify(&p), Ok(()));
    }
}
