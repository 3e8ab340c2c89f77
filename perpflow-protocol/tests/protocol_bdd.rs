//! BDD tests for transaction assembly and signature collection.
//!
//! These tests run the full initiator flow against in-process collaborators:
//! - Open → partial close → close end to end
//! - Oracle failure, local rejection and counterparty rejection leave the ledger untouched
//! - Concurrent closes of one position commit exactly once
//! - Partial-close amounts map onto the contract rules

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use perpflow_core::{Identity, Lifecycle, Rule, Signer};
use perpflow_oracle::{AttestationAuthority, Feed, OracleConfig, OracleError};
use perpflow_protocol::{
    AcceptancePolicy, Acceptor, Counterparty, FinalizationError, InMemoryLedger, Initiator, LookupError,
    PositionLookup, ProtocolError, Rejection, Services,
};

// ── Harness ──────────────────────────────────────────────────────────

struct Market {
    taker: Identity,
    exchange: Acceptor,
    price: AttestationAuthority,
    funding: AttestationAuthority,
    ledger: InMemoryLedger,
}

impl Market {
    fn new() -> Self {
        Self::with_policy(AcceptancePolicy::default())
    }

    fn with_policy(policy: AcceptancePolicy) -> Self {
        let oracles = OracleConfig::default();
        Self {
            taker: Identity::from_seed("George", 1),
            exchange: Acceptor::new(Identity::from_seed("Binance", 2), policy),
            price: oracles.authority(Feed::Price, Identity::from_seed("PriceOracle", 3)),
            funding: oracles.authority(Feed::FundingRate, Identity::from_seed("FundingOracle", 4)),
            ledger: InMemoryLedger::new(),
        }
    }

    fn initiator(&self) -> Initiator<'_> {
        Initiator::new(
            &self.taker,
            Services {
                counterparty: &self.exchange,
                price_oracle: &self.price,
                funding_oracle: &self.funding,
                lookup: &self.ledger,
                finalizer: &self.ledger,
            },
        )
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn bdd_scenario_open_partial_close_close() {
    // GIVEN a market with demo oracles and an empty ledger
    let market = Market::new();
    let me = market.taker.public_key();

    // WHEN the taker opens 0.02 BTC on 1000 collateral
    let opened = market.initiator().open("BTC", 0.02, 1_000.0, now()).unwrap();

    // THEN one position is created at the oracle price
    let held = market.ledger.find_unconsumed("BTC", &me).unwrap();
    assert_eq!(opened.created, vec![held.reference]);
    assert_eq!(held.position.initial_price, 35_000.0);
    assert_eq!(held.position.exchange, *market.exchange.party());

    // WHEN the taker reduces by 0.01
    let reduced = market.initiator().partial_close("BTC", 0.01, now()).unwrap();

    // THEN the old state is consumed and the successor holds 0.01
    assert_eq!(reduced.consumed, vec![held.reference]);
    let successor = market.ledger.find_unconsumed("BTC", &me).unwrap();
    assert!((successor.position.position_size - 0.01).abs() < 1e-12);
    assert_eq!(successor.position.initial_price, 35_000.0);

    // WHEN the taker closes what is left
    let closed = market.initiator().close("BTC", now()).unwrap();

    // THEN nothing remains open and the lineage is terminal
    assert_eq!(closed.consumed, vec![successor.reference]);
    assert!(closed.created.is_empty());
    assert_eq!(market.ledger.lifecycle(&successor.reference), Some(Lifecycle::Closed));
    assert!(matches!(
        market.ledger.find_unconsumed("BTC", &me),
        Err(LookupError::NotFound { .. })
    ));
    assert_eq!(market.ledger.committed_count(), 3);
}

#[test]
fn bdd_scenario_unsupported_ticker_never_reaches_ledger() {
    // GIVEN a market with demo oracles
    let market = Market::new();

    // WHEN the taker tries to open DOGE
    let err = market.initiator().open("DOGE", 1.0, 1_000.0, now()).unwrap_err();

    // THEN the oracle's UnsupportedTicker surfaces and nothing is committed
    assert_eq!(
        err,
        ProtocolError::Attestation(OracleError::UnsupportedTicker { ticker: "DOGE".into() })
    );
    assert_eq!(market.ledger.committed_count(), 0);
}

#[test]
fn bdd_scenario_excess_leverage_aborts_locally() {
    // GIVEN a market
    let market = Market::new();

    // WHEN the taker opens 1 BTC on 1000 collateral (leverage 35)
    let err = market.initiator().open("BTC", 1.0, 1_000.0, now()).unwrap_err();

    // THEN the contract rule is named and nothing is committed
    assert!(matches!(err, ProtocolError::Validation(e) if e.rule == Rule::LeverageCap));
    assert_eq!(market.ledger.committed_count(), 0);
}

#[test]
fn bdd_scenario_counterparty_policy_rejects() {
    // GIVEN an exchange that only trades ETH
    let market = Market::with_policy(AcceptancePolicy::default().with_allowed_tickers(["ETH"]));

    // WHEN the taker opens BTC
    let err = market.initiator().open("BTC", 0.01, 1_000.0, now()).unwrap_err();

    // THEN the rejection carries the policy reason and the ledger is untouched
    assert!(matches!(
        err,
        ProtocolError::CounterpartyRejected(Rejection::Policy(ref reason)) if reason.contains("BTC")
    ));
    assert!(market.ledger.unconsumed().is_empty());

    // AND ETH goes through
    assert!(market.initiator().open("ETH", 0.1, 1_000.0, now()).is_ok());
}

#[test]
fn bdd_scenario_close_without_position_fails_lookup() {
    // GIVEN an empty ledger
    let market = Market::new();

    // WHEN the taker closes BTC
    let err = market.initiator().close("BTC", now()).unwrap_err();

    // THEN the lookup failure is reported
    assert!(matches!(err, ProtocolError::Lookup(LookupError::NotFound { .. })));
}

#[test]
fn bdd_scenario_second_open_on_same_pair_is_refused_by_ledger() {
    // GIVEN an open BTC position
    let market = Market::new();
    market.initiator().open("BTC", 0.01, 1_000.0, now()).unwrap();

    // WHEN the taker opens BTC again
    let err = market.initiator().open("BTC", 0.01, 1_000.0, now()).unwrap_err();

    // THEN the finalizer refuses and the first position survives
    assert!(matches!(
        err,
        ProtocolError::Finalization(FinalizationError::DuplicatePosition { .. })
    ));
    assert_eq!(market.ledger.unconsumed().len(), 1);
}

#[test]
fn bdd_scenario_concurrent_closes_commit_once() {
    // GIVEN an open BTC position
    let market = Market::new();
    market.initiator().open("BTC", 0.02, 1_000.0, now()).unwrap();

    // WHEN two closes race from separate threads
    let shared = &market;
    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| s.spawn(move || shared.initiator().close("BTC", now())))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // THEN exactly one commits; the other either lost the lookup race or was
    // refused as a double spend
    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            matches!(
                err,
                ProtocolError::Finalization(FinalizationError::DoubleSpend(_))
                    | ProtocolError::Lookup(_)
            ),
            "{err}"
        );
    }
    assert!(market.ledger.unconsumed().is_empty());
}

// ── Properties ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn partial_close_amounts_follow_contract(amount in prop_oneof![
        (0.0001..0.0199_f64),
        (0.02..0.05_f64),
        (-0.01..0.0_f64),
    ]) {
        let market = Market::new();
        market.initiator().open("BTC", 0.02, 1_000.0, now()).unwrap();

        let result = market.initiator().partial_close("BTC", amount, now());
        let remaining = 0.02 - amount;

        if amount <= 0.0 {
            let is_size_rule = matches!(
                result,
                Err(ProtocolError::Validation(e)) if e.rule == Rule::SizeMustDecrease
            );
            prop_assert!(is_size_rule);
        } else if remaining <= 0.0 {
            let is_positive_rule = matches!(
                result,
                Err(ProtocolError::Validation(e)) if e.rule == Rule::PositionSizePositive
            );
            prop_assert!(is_positive_rule);
        } else {
            prop_assert!(result.is_ok());
            let held = market.ledger.find_unconsumed("BTC", &market.taker.public_key()).unwrap();
            prop_assert!((held.position.position_size - remaining).abs() < 1e-12);
        }
    }
}
