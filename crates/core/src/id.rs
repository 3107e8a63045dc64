//! File identifier generation and parsing.

use crate::FILE_ID_BYTES;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A short, URL-safe file identifier.
///
/// Encodes a fixed block of cryptographically random bytes in Base58
/// (no ambiguous characters, no separators). Identifiers are generated
/// server-side only; the metadata primary key is what detects the rare
/// collision.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Generate a new random file id.
    pub fn generate() -> Self {
        let mut raw = [0u8; FILE_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut raw);
        Self(bs58::encode(raw).into_string())
    }

    /// Parse an id received from a client.
    ///
    /// Accepts exactly the strings that decode to [`FILE_ID_BYTES`] Base58
    /// bytes. The Base58 alphabet contains no path separators, so a parsed
    /// id can never name anything outside the storage root.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let decoded = bs58::decode(s)
            .into_vec()
            .map_err(|e| crate::Error::InvalidFileId(format!("{s:?}: {e}")))?;
        if decoded.len() != FILE_ID_BYTES {
            return Err(crate::Error::InvalidFileId(format!(
                "{s:?}: decodes to {} bytes, expected {}",
                decoded.len(),
                FILE_ID_BYTES
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the encoded id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
