use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reasons a string is not a principal.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParsePrincipalError {
    #[error("principal must start with 'c'")]
    MissingPrefix,
    #[error("principal payload must be {expected} hex characters, got {actual}")]
    BadLength { expected: usize, actual: usize },
    #[error("principal payload is not valid hexadecimal: {0}")]
    BadHex(#[from] hex::FromHexError),
}

/// Number of raw bytes contained in a principal.
pub const PRINCIPAL_BYTES: usize = 32;

/// An account on the underlying chain: a participant, the city wallet or the
/// stacking pool.
///
/// Serialised as its encoded string so configuration files can carry it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(pub [u8; PRINCIPAL_BYTES]);

impl Principal {
    pub const fn new(bytes: [u8; PRINCIPAL_BYTES]) -> Self {
        Self(bytes)
    }

    /// Deterministically derive a principal from a label (handy for wallets
    /// named in configuration and for tests).
    pub fn from_label(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; PRINCIPAL_BYTES] {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable.
        write!(f, "Principal(c{}…)", hex::encode(&self.0[..4]))
    }
}

/// Parses the `c`-prefixed hex form written by `Display`.
impl FromStr for Principal {
    type Err = ParsePrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let payload = s.strip_prefix('c').ok_or(ParsePrincipalError::MissingPrefix)?;
        if payload.len() != PRINCIPAL_BYTES * 2 {
            return Err(ParsePrincipalError::BadLength {
                expected: PRINCIPAL_BYTES * 2,
                actual: payload.len(),
            });
        }
        let mut bytes = [0u8; PRINCIPAL_BYTES];
        hex::decode_to_slice(payload, &mut bytes)?;
        Ok(Principal(bytes))
    }
}

impl From<[u8; PRINCIPAL_BYTES]> for Principal {
    fn from(value: [u8; PRINCIPAL_BYTES]) -> Self {
        Principal(value)
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Principal {
    type Error = ParsePrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
