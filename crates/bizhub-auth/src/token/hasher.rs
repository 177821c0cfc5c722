//! One-way digests of raw tokens.

use std::fmt;

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of a raw token.
///
/// Raw tokens are never stored; sessions and revocations are keyed by this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenDigest(String);

impl TokenDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TokenDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TokenDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Computes [`TokenDigest`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenHasher;

impl TokenHasher {
    /// Digest a raw token.
    pub fn digest(raw: &str) -> TokenDigest {
        TokenDigest(format!("{:x}", Sha256::digest(raw.as_bytes())))
    }
}
