use perpflow_core::PublicKey;
use thiserror::Error;

use crate::authority::Feed;

/// Failures of an attestation authority. None of them ever yields a partial
/// signature.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error("unsupported ticker: {ticker}")]
    UnsupportedTicker { ticker: String },

    #[error("signature scope violation: {0}")]
    SignatureScopeViolation(String),

    #[error("oracle {oracle} is not a required signer of this proposal")]
    NotARequiredSigner { oracle: PublicKey },

    #[error("{feed} attestation mismatch for {ticker}: embedded {embedded:?}, observed {observed}")]
    AttestationMismatch {
        feed: Feed,
        ticker: String,
        embedded: Option<f64>,
        observed: f64,
    },
}

impl OracleError {
    pub(crate) fn unsupported(ticker: &str) -> Self {
        Self::UnsupportedTicker {
            ticker: ticker.to_string(),
        }
    }
}
