//! Signed bearer tokens and their storage digests.

pub mod claims;
pub mod codec;
pub mod hasher;

pub use claims::{Claims, TokenSubject, UnverifiedClaims};
pub use codec::{IssuedToken, TokenCodec};
pub use hasher::{TokenDigest, TokenHasher};
