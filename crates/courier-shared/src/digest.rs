//! Content-identity digests.
//!
//! A [`ContentDigest`] is a 32-byte BLAKE3 hash.  The same type is used for
//! the plaintext content-identity digest (deduplication key) and for the
//! ciphertext digest that guards encrypted files against corruption.

use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::constants::DIGEST_SIZE;

/// A fixed-size BLAKE3 digest, stored as hex at the SQL boundary.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest([u8; DIGEST_SIZE]);

impl ContentDigest {
    pub fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let arr: [u8; DIGEST_SIZE] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl From<blake3::Hash> for ContentDigest {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

/// Incremental digest computation over a byte stream.
pub struct Digester {
    hasher: blake3::Hasher,
}

impl Digester {
    pub fn new() -> Self {
        Self {
            hasher: blake3::Hasher::new(),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    pub fn finish(self) -> ContentDigest {
        self.hasher.finalize().into()
    }
}

impl Default for Digester {
    fn default() -> Self {
        Self::new()
    }
}

/// Digest a complete in-memory buffer.
pub fn digest_bytes(bytes: &[u8]) -> ContentDigest {
    blake3::hash(bytes).into()
}

/// Digest everything a reader yields.
pub fn digest_reader<R: Read>(mut reader: R) -> std::io::Result<ContentDigest> {
    let mut digester = Digester::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        digester.update(&buf[..n]);
    }
    Ok(digester.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let digest = digest_bytes(b"attachment content");
        let parsed = ContentDigest::from_hex(&digest.to_hex()).unwrap();
        assert_eq!(digest, parsed);
    }

    #[test]
    fn test_bad_hex_length_rejected() {
        assert!(ContentDigest::from_hex("abcd").is_err());
    }

    #[test]
    fn test_streaming_matches_oneshot() {
        let data = vec![0x5Au8; 100_000];

        let mut digester = Digester::new();
        for chunk in data.chunks(7777) {
            digester.update(chunk);
        }

        assert_eq!(digester.finish(), digest_bytes(&data));
    }

    #[test]
    fn test_reader_matches_oneshot() {
        let data = b"some longer content that spans a few internal reads";
        let from_reader = digest_reader(&data[..]).unwrap();
        assert_eq!(from_reader, digest_bytes(data));
    }
}
