//! Access token generation
//!
//! The token is the only access control on the share URL, so it is drawn
//! straight from the operating system RNG.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use std::fmt;
use thiserror::Error;

/// Number of random bytes behind every token (256 bits)
pub const TOKEN_BYTES: usize = 32;

/// Length of the encoded token: 32 bytes in unpadded base64
pub const TOKEN_LEN: usize = 43;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("secure random source unavailable: {0}")]
    Entropy(String),
}

/// Unguessable path segment forming the secret part of the share URL
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Keep the secret out of `{:?}` output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({}…)", &self.0[..4.min(self.0.len())])
    }
}

/// Generate a fresh access token (256 bits, URL-safe base64, no padding)
pub fn generate_access_token() -> Result<AccessToken, TokenError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| TokenError::Entropy(e.to_string()))?;
    Ok(AccessToken(URL_SAFE_NO_PAD.encode(bytes)))
}

#[cfg(test)]
impl AccessToken {
    pub(crate) fn from_static(token: &str) -> Self {
        Self(token.to_string())
    }
}
