//! Criterion benchmarks for PerpFlow hot paths.
//!
//! Benchmarks:
//! 1. Proposal root computation (leaf hashing + tree build)
//! 2. Partial view construction for the oracle disclosure
//! 3. Partial view verification
//! 4. Contract verification per command kind
//! 5. Root signing and signature checking

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use perpflow_core::crypto::verify_signature;
use perpflow_core::domain::{Command, Position, Proposal, StateAndRef, StateRef};
use perpflow_core::{verify, Digest, Disclosure, Identity, Signer};

// ── Helpers ──────────────────────────────────────────────────────────

fn parties() -> (Identity, Identity) {
    (
        Identity::from_seed("George", 1),
        Identity::from_seed("Binance", 2),
    )
}

fn open_proposal() -> Proposal {
    let (taker, exchange) = parties();
    let output = Position::open(
        "BTC",
        35_000.0,
        0.01,
        1_000.0,
        taker.party().clone(),
        exchange.party().clone(),
    );
    Proposal::builder(Command::Open {
        ticker: "BTC".into(),
        price: 35_000.0,
        funding_rate: 0.8,
    })
    .output(output)
    .signers([taker.party().key, exchange.party().key])
    .salt(Digest([7; 32]))
    .build()
}

fn partial_close_proposal() -> Proposal {
    let (taker, exchange) = parties();
    let input = Position::open(
        "BTC",
        35_000.0,
        0.02,
        1_000.0,
        taker.party().clone(),
        exchange.party().clone(),
    );
    let output = input.successor(0.01, 36_000.0);
    Proposal::builder(Command::PartialClose {
        ticker: "BTC".into(),
        price: 36_000.0,
    })
    .input(StateAndRef {
        reference: StateRef::new(Digest([1; 32]), 0),
        position: input,
    })
    .output(output)
    .signers([taker.party().key, exchange.party().key])
    .salt(Digest([8; 32]))
    .build()
}

fn close_proposal() -> Proposal {
    let (taker, exchange) = parties();
    let input = Position::open(
        "BTC",
        35_000.0,
        0.01,
        1_000.0,
        taker.party().clone(),
        exchange.party().clone(),
    );
    Proposal::builder(Command::Close {
        ticker: "BTC".into(),
        price: 36_000.0,
    })
    .input(StateAndRef {
        reference: StateRef::new(Digest([2; 32]), 0),
        position: input,
    })
    .signers([taker.party().key, exchange.party().key])
    .salt(Digest([9; 32]))
    .build()
}

// ── 1. Root ──────────────────────────────────────────────────────────

fn bench_root(c: &mut Criterion) {
    let proposal = partial_close_proposal();
    c.bench_function("proposal_root", |b| b.iter(|| black_box(&proposal).id()));
}

// ── 2–3. Partial views ───────────────────────────────────────────────

fn bench_partial_view(c: &mut Criterion) {
    let proposal = partial_close_proposal();
    let disclosure = Disclosure::oracle();

    c.bench_function("partial_view_build", |b| {
        b.iter(|| black_box(&proposal).partial_view(black_box(&disclosure)))
    });

    let view = proposal.partial_view(&disclosure);
    c.bench_function("partial_view_verify", |b| {
        b.iter(|| black_box(&view).verify())
    });
}

// ── 4. Contract ──────────────────────────────────────────────────────

fn bench_contract(c: &mut Criterion) {
    let mut group = c.benchmark_group("contract_verify");
    let cases = [
        ("open", open_proposal()),
        ("partial_close", partial_close_proposal()),
        ("close", close_proposal()),
    ];
    for (name, proposal) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), proposal, |b, p| {
            b.iter(|| verify(black_box(p)))
        });
    }
    group.finish();
}

// ── 5. Signatures ────────────────────────────────────────────────────

fn bench_signatures(c: &mut Criterion) {
    let (taker, _) = parties();
    let root = open_proposal().id();

    c.bench_function("sign_root", |b| b.iter(|| taker.sign_root(black_box(&root))));

    let signed = taker.sign_root(&root);
    let payload = perpflow_core::crypto::signing_payload(&root);
    c.bench_function("verify_root_signature", |b| {
        b.iter(|| verify_signature(black_box(&payload), &signed.signature, &signed.by))
    });
}

criterion_group!(
    benches,
    bench_root,
    bench_partial_view,
    bench_contract,
    bench_signatures
);
criterion_main!(benches);
