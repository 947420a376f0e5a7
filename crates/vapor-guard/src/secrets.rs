use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFormatError {
    InvalidBase64(base64::DecodeError),
}

impl std::fmt::Display for KeyFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBase64(err) => write!(f, "secret is not valid base64: {err}"),
        }
    }
}

impl std::error::Error for KeyFormatError {}

/// Key for time-based guard codes. Validated at construction, before any
/// derivation or network call sees it.
#[derive(Clone, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(try_from = "String")]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    pub fn from_base64(encoded: &str) -> Result<Self, KeyFormatError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(KeyFormatError::InvalidBase64)?;
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<String> for SharedSecret {
    type Error = KeyFormatError;

    fn try_from(encoded: String) -> Result<Self, Self::Error> {
        Self::from_base64(&encoded)
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret(REDACTED)")
    }
}

/// Key for per-request confirmation signatures.
#[derive(Clone, Zeroize, ZeroizeOnDrop, Deserialize)]
#[serde(try_from = "String")]
pub struct IdentitySecret(Vec<u8>);

impl IdentitySecret {
    pub fn from_base64(encoded: &str) -> Result<Self, KeyFormatError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(KeyFormatError::InvalidBase64)?;
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<String> for IdentitySecret {
    type Error = KeyFormatError;

    fn try_from(encoded: String) -> Result<Self, Self::Error> {
        Self::from_base64(&encoded)
    }
}

impl std::fmt::Debug for IdentitySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentitySecret(REDACTED)")
    }
}
