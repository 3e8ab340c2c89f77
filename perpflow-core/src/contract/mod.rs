//! Position contract: named rules and the verifier that enforces them.

pub mod rules;
pub mod verifier;

pub use rules::{Rule, ValidationError, MAX_LEVERAGE};
pub use verifier::verify;
