//! HS256 token issuing and verification.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, dangerous, decode, encode};
use uuid::Uuid;

use bizhub_core::traits::Clock;

use super::claims::{Claims, ExpiryOnly, TokenSubject, UnverifiedClaims};
use crate::error::TokenError;

/// A freshly signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The compact serialized token handed to the client.
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies signed bearer tokens.
///
/// Expiry is judged against the injected [`Clock`], never against the
/// library's own notion of "now".
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Signature-checking validation; expiry is checked separately.
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .finish()
    }
}

impl TokenCodec {
    /// Creates a codec signing with `secret`.
    pub fn new(secret: &str, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            clock,
        }
    }

    /// Signs a token for `subject` valid for `ttl` from now.
    pub fn issue(&self, subject: &TokenSubject, ttl: Duration) -> Result<IssuedToken, TokenError> {
        if ttl < Duration::seconds(1) {
            return Err(TokenError::Encoding(
                "token lifetime must be at least one second".into(),
            ));
        }

        let now = self.clock.now();
        let claims = Claims {
            account_id: subject.account_id,
            business_id: subject.business_id,
            email: subject.email.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedToken {
            token,
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
        })
    }

    /// Verifies a raw token.
    ///
    /// Checks:
    /// 1. Structure and signature
    /// 2. Expiration (`now >= exp` is expired)
    pub fn verify(&self, raw: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(raw, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }

    /// Reads the expiry of a token without checking its signature.
    ///
    /// Returns `None` for anything that is not structurally a token. Never
    /// feeds an authorization decision; only [`remaining_lifetime`] uses it.
    ///
    /// [`remaining_lifetime`]: Self::remaining_lifetime
    pub fn decode_unchecked(&self, raw: &str) -> Option<UnverifiedClaims> {
        dangerous::insecure_decode::<ExpiryOnly>(raw)
            .ok()
            .map(|data| UnverifiedClaims::new(data.claims.exp))
    }

    /// Time left before the token expires, never negative.
    pub fn remaining_lifetime(&self, raw: &str) -> Duration {
        match self.decode_unchecked(raw) {
            Some(claims) => (claims.expires_at() - self.clock.now()).max(Duration::zero()),
            None => Duration::zero(),
        }
    }
}
