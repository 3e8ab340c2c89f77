use serde::{Deserialize, Serialize};
use std::fmt;

/// Ed25519 verification key identifying a signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First eight hex characters, for log lines.
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// A named participant (taker, exchange, or oracle).
///
/// Identity is the key: two parties with the same key are the same signer
/// regardless of display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub key: PublicKey,
}

impl Party {
    pub fn new(name: impl Into<String>, key: PublicKey) -> Self {
        Self { name: name.into(), key }
    }
}

impl PartialEq for Party {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Party {}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.key.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parties_compare_by_key() {
        let a = Party::new("Binance", PublicKey([1; 32]));
        let b = Party::new("Binance NY", PublicKey([1; 32]));
        let c = Party::new("Binance", PublicKey([2; 32]));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn short_key_is_eight_hex_chars() {
        let key = PublicKey([0xab; 32]);
        assert_eq!(key.short(), "abababab");
        assert_eq!(key.to_string().len(), 64);
    }
}
