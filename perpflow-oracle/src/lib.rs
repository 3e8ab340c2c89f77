//! PerpFlow Oracle — attestation authorities for price and funding-rate feeds.
//!
//! This crate builds on `perpflow-core` to provide:
//! - Pluggable rate sources (fixed and time-scheduled tables)
//! - A bounded LRU cache in front of any source
//! - The attestation authority: `query` plus selective-disclosure `sign`
//! - TOML configuration for the demo tables

pub mod authority;
pub mod cache;
pub mod config;
pub mod error;
pub mod source;

pub use authority::{Attestation, AttestationAuthority, Feed};
pub use cache::CachedSource;
pub use config::{load_toml, ConfigError, OracleConfig};
pub use error::OracleError;
pub use source::{FixedTable, RateSource, ScheduledTable};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn authority_is_send_sync() {
        assert_send::<AttestationAuthority>();
        assert_sync::<AttestationAuthority>();
    }

    #[test]
    fn sources_are_send_sync() {
        assert_send::<CachedSource<FixedTable>>();
        assert_sync::<CachedSource<FixedTable>>();
        assert_send::<ScheduledTable>();
        assert_sync::<ScheduledTable>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<OracleError>();
        assert_sync::<OracleError>();
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
    }
}
