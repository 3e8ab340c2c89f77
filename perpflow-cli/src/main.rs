//! PerpFlow CLI — quote oracle values and simulate position scenarios.
//!
//! Commands:
//! - `quote`: ask a demo (or configured) oracle for a price or funding rate
//! - `simulate`: run a scripted scenario against the in-memory ledger

mod scenario;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use perpflow_core::{Identity, StateAndRef};
use perpflow_oracle::{Feed, OracleConfig};
use perpflow_protocol::{Acceptor, InMemoryLedger, Initiator, Receipt, Services};

use scenario::{Scenario, Step};

#[derive(Parser)]
#[command(
    name = "perpflow",
    about = "PerpFlow CLI — oracle-attested perpetual futures positions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query an oracle for a ticker.
    Quote {
        /// Ticker to quote (e.g., BTC).
        ticker: String,

        /// Which feed to ask.
        #[arg(long, value_enum, default_value_t = FeedArg::Price)]
        feed: FeedArg,

        /// Oracle TOML config. Defaults to the demo tables.
        #[arg(long)]
        oracle_config: Option<PathBuf>,

        /// Evaluation time (RFC 3339). Defaults to now.
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Run a scenario file step by step.
    Simulate {
        /// Path to a scenario TOML file.
        #[arg(long)]
        config: PathBuf,

        /// Print the final report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Stop at the first failing step.
        #[arg(long, default_value_t = false)]
        stop_on_error: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FeedArg {
    Price,
    FundingRate,
}

impl From<FeedArg> for Feed {
    fn from(arg: FeedArg) -> Self {
        match arg {
            FeedArg::Price => Feed::Price,
            FeedArg::FundingRate => Feed::FundingRate,
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Quote {
            ticker,
            feed,
            oracle_config,
            at,
        } => run_quote(&ticker, feed.into(), oracle_config, at),
        Commands::Simulate {
            config,
            json,
            stop_on_error,
        } => run_simulate(config, json, stop_on_error),
    }
}

fn run_quote(
    ticker: &str,
    feed: Feed,
    oracle_config: Option<PathBuf>,
    at: Option<DateTime<Utc>>,
) -> Result<()> {
    let config = match oracle_config {
        Some(path) => OracleConfig::from_file(&path)?,
        None => OracleConfig::default(),
    };
    let oracle = config.authority(feed, Identity::generate(format!("{feed} oracle")));
    let as_of = at.unwrap_or_else(Utc::now);

    let value = oracle
        .query(ticker, as_of)
        .with_context(|| format!("quoting {ticker}"))?;
    println!("{ticker} {feed} @ {}: {value}", as_of.to_rfc3339());
    Ok(())
}

// ── Simulate ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct StepReport {
    step: String,
    outcome: Outcome,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Outcome {
    Committed { receipt: Receipt },
    Failed { error: String },
}

#[derive(Serialize)]
struct Report {
    as_of: DateTime<Utc>,
    steps: Vec<StepReport>,
    open_positions: Vec<StateAndRef>,
}

fn run_simulate(config: PathBuf, json: bool, stop_on_error: bool) -> Result<()> {
    let scenario = Scenario::from_file(&config)?;
    let as_of = scenario.as_of.unwrap_or_else(Utc::now);

    let seed = scenario.seed;
    info!(scenario = %config.display(), steps = scenario.steps.len(), "running scenario");
    let taker = Identity::from_seed(scenario.taker.as_str(), seed);
    let exchange = Acceptor::new(
        Identity::from_seed(scenario.exchange.as_str(), seed.wrapping_add(1)),
        scenario.policy.clone(),
    );
    let price = scenario
        .oracle
        .authority(Feed::Price, Identity::from_seed("Price Oracle", seed.wrapping_add(2)));
    let funding = scenario
        .oracle
        .authority(Feed::FundingRate, Identity::from_seed("Funding Rate Oracle", seed.wrapping_add(3)));
    let ledger = InMemoryLedger::new();

    let initiator = Initiator::new(
        &taker,
        Services {
            counterparty: &exchange,
            price_oracle: &price,
            funding_oracle: &funding,
            lookup: &ledger,
            finalizer: &ledger,
        },
    );

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for step in &scenario.steps {
        let result = match step {
            Step::Open {
                ticker,
                size,
                collateral,
            } => initiator.open(ticker, *size, *collateral, as_of),
            Step::PartialClose { ticker, amount } => initiator.partial_close(ticker, *amount, as_of),
            Step::Close { ticker } => initiator.close(ticker, as_of),
        };

        let failed = result.is_err();
        if let Err(e) = &result {
            warn!(ticker = step.ticker(), error = %e, "step failed");
        }
        let outcome = match result {
            Ok(receipt) => Outcome::Committed { receipt },
            Err(e) => Outcome::Failed {
                error: e.to_string(),
            },
        };
        if !json {
            print_step(step, &outcome);
        }
        steps.push(StepReport {
            step: step.to_string(),
            outcome,
        });
        if failed && stop_on_error {
            break;
        }
    }

    let report = Report {
        as_of,
        steps,
        open_positions: ledger.unconsumed(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_positions(&report.open_positions);
    }
    Ok(())
}

fn print_step(step: &Step, outcome: &Outcome) {
    match outcome {
        Outcome::Committed { receipt } => println!(
            "  ok    {step:<40} {} (+{} / -{})",
            receipt.id.short(),
            receipt.created.len(),
            receipt.consumed.len()
        ),
        Outcome::Failed { error } => println!("  FAIL  {step:<40} {error}"),
    }
}

fn print_positions(positions: &[StateAndRef]) {
    println!();
    if positions.is_empty() {
        println!("No open positions.");
        return;
    }
    println!(
        "{:<14} {:<6} {:>10} {:>12} {:>12} {:>8}",
        "Ref", "Ticker", "Size", "Entry", "Collateral", "Lev"
    );
    for held in positions {
        let p = &held.position;
        println!(
            "{:<14} {:<6} {:>10.4} {:>12.2} {:>12.2} {:>7.2}x",
            held.reference.to_string(),
            p.ticker,
            p.position_size,
            p.initial_price,
            p.collateral,
            p.leverage()
        );
    }
}
