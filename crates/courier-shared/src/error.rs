use thiserror::Error;

use crate::digest::ContentDigest;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: invalid ciphertext or wrong key")]
    DecryptionFailed,

    #[error("Ciphertext digest mismatch: expected {expected}, got {actual}")]
    CiphertextDigestMismatch {
        expected: ContentDigest,
        actual: ContentDigest,
    },

    #[error("Declared plaintext length {declared} exceeds actual stream length {actual}")]
    PlaintextTooShort { declared: u64, actual: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
