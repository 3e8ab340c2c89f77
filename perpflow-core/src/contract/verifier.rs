//! Contract verifier: pure predicate over a proposal.
//!
//! Dispatches on the command and checks rules in a fixed order, reporting the
//! first violation. No I/O and no hidden state: the same proposal always
//! yields the same verdict.

use std::collections::BTreeSet;

use super::rules::{Rule, ValidationError, MAX_LEVERAGE};
use crate::domain::{Command, Position, Proposal, PublicKey};

pub fn verify(proposal: &Proposal) -> Result<(), ValidationError> {
    match &proposal.command {
        Command::Open { .. } => verify_open(proposal),
        Command::Close { .. } => verify_close(proposal),
        Command::PartialClose { .. } => verify_partial_close(proposal),
    }
}

fn require(condition: bool, rule: Rule) -> Result<(), ValidationError> {
    if condition {
        Ok(())
    } else {
        Err(ValidationError { rule })
    }
}

fn participants_sign(position: &Position, signers: &BTreeSet<PublicKey>) -> bool {
    position
        .participant_keys()
        .iter()
        .all(|key| signers.contains(key))
}

fn verify_open(p: &Proposal) -> Result<(), ValidationError> {
    require(p.inputs.is_empty(), Rule::NoInputsOnOpen)?;
    let output = p.output().ok_or(ValidationError {
        rule: Rule::SingleOutput,
    })?;

    require(output.taker != output.exchange, Rule::DistinctParties)?;
    require(participants_sign(output, &p.signers), Rule::ParticipantsMustSign)?;
    require(output.initial_price > 0.0, Rule::InitialPricePositive)?;
    require(output.position_size > 0.0, Rule::PositionSizePositive)?;
    require(output.collateral > 0.0, Rule::CollateralPositive)?;
    require(output.leverage() < MAX_LEVERAGE, Rule::LeverageCap)
}

// No zero-residual precondition: Close consumes whatever size remains.
fn verify_close(p: &Proposal) -> Result<(), ValidationError> {
    let input = p.input().ok_or(ValidationError {
        rule: Rule::SingleInput,
    })?;
    require(p.outputs.is_empty(), Rule::NoOutputsOnClose)?;
    require(
        participants_sign(&input.position, &p.signers),
        Rule::ParticipantsMustSign,
    )
}

fn verify_partial_close(p: &Proposal) -> Result<(), ValidationError> {
    let input = &p
        .input()
        .ok_or(ValidationError {
            rule: Rule::SingleInput,
        })?
        .position;
    let output = p.output().ok_or(ValidationError {
        rule: Rule::SingleOutput,
    })?;

    require(output.position_size < input.position_size, Rule::SizeMustDecrease)?;
    // Reaching zero is Close's job.
    require(output.position_size > 0.0, Rule::PositionSizePositive)?;
    require(output.collateral > 0.0, Rule::CollateralPositive)?;
    require(output.ticker == input.ticker, Rule::TickerFrozen)?;
    require(output.taker == input.taker, Rule::TakerFrozen)?;
    require(output.exchange == input.exchange, Rule::ExchangeFrozen)?;
    require(
        output.initial_price == input.initial_price,
        Rule::InitialPriceFrozen,
    )?;
    require(participants_sign(output, &p.signers), Rule::ParticipantsMustSign)
}
