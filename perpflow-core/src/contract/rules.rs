use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Leverage must stay strictly below this multiple of collateral.
pub const MAX_LEVERAGE: f64 = 5.0;

/// A named contract rule. `id()` is the stable machine-readable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    NoInputsOnOpen,
    SingleInput,
    SingleOutput,
    NoOutputsOnClose,
    DistinctParties,
    ParticipantsMustSign,
    InitialPricePositive,
    PositionSizePositive,
    CollateralPositive,
    LeverageCap,
    SizeMustDecrease,
    TickerFrozen,
    TakerFrozen,
    ExchangeFrozen,
    InitialPriceFrozen,
}

impl Rule {
    pub const ALL: [Rule; 15] = [
        Rule::NoInputsOnOpen,
        Rule::SingleInput,
        Rule::SingleOutput,
        Rule::NoOutputsOnClose,
        Rule::DistinctParties,
        Rule::ParticipantsMustSign,
        Rule::InitialPricePositive,
        Rule::PositionSizePositive,
        Rule::CollateralPositive,
        Rule::LeverageCap,
        Rule::SizeMustDecrease,
        Rule::TickerFrozen,
        Rule::TakerFrozen,
        Rule::ExchangeFrozen,
        Rule::InitialPriceFrozen,
    ];

    pub const fn id(self) -> &'static str {
        match self {
            Rule::NoInputsOnOpen => "no-inputs-on-open",
            Rule::SingleInput => "single-input",
            Rule::SingleOutput => "single-output",
            Rule::NoOutputsOnClose => "no-outputs-on-close",
            Rule::DistinctParties => "distinct-parties",
            Rule::ParticipantsMustSign => "participants-must-sign",
            Rule::InitialPricePositive => "initial-price-positive",
            Rule::PositionSizePositive => "position-size-positive",
            Rule::CollateralPositive => "collateral-positive",
            Rule::LeverageCap => "leverage-cap",
            Rule::SizeMustDecrease => "size-must-decrease",
            Rule::TickerFrozen => "ticker-frozen",
            Rule::TakerFrozen => "taker-frozen",
            Rule::ExchangeFrozen => "exchange-frozen",
            Rule::InitialPriceFrozen => "initial-price-frozen",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Rule::NoInputsOnOpen => "no inputs should be consumed when opening",
            Rule::SingleInput => "there should be exactly one input position",
            Rule::SingleOutput => "there should be exactly one output position",
            Rule::NoOutputsOnClose => "closing must not create an output position",
            Rule::DistinctParties => "taker and exchange must be different parties",
            Rule::ParticipantsMustSign => "all participants must be required signers",
            Rule::InitialPricePositive => "initial price must be greater than 0",
            Rule::PositionSizePositive => "position size must be greater than 0",
            Rule::CollateralPositive => "collateral must be greater than 0",
            Rule::LeverageCap => "leverage must be below 5x",
            Rule::SizeMustDecrease => "position size must decrease",
            Rule::TickerFrozen => "ticker cannot change",
            Rule::TakerFrozen => "taker cannot change",
            Rule::ExchangeFrozen => "exchange cannot change",
            Rule::InitialPriceFrozen => "initial price cannot change",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A violated contract rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("contract rule '{}' violated: {}", .rule.id(), .rule.description())]
pub struct ValidationError {
    pub rule: Rule,
}

impl From<Rule> for ValidationError {
    fn from(rule: Rule) -> Self {
        Self { rule }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_kebab_case() {
        let ids: HashSet<&str> = Rule::ALL.iter().map(|r| r.id()).collect();
        assert_eq!(ids.len(), Rule::ALL.len());
        for id in ids {
            assert!(id.chars().all(|c| c.is_ascii_lowercase() || c == '-'), "{id}");
        }
    }

    #[test]
    fn error_message_names_rule() {
        let err = ValidationError::from(Rule::LeverageCap);
        assert_eq!(
            err.to_string(),
            "contract rule 'leverage-cap' violated: leverage must be below 5x"
        );
    }
}
