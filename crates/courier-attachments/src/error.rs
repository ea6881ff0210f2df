use std::path::PathBuf;

use thiserror::Error;

use courier_shared::CryptoError;
use courier_store::StoreError;

/// Fatal pipeline errors.
///
/// Classification degradation is deliberately absent: unsupported or corrupt
/// content yields an `Invalid`-tagged [`ContentType`](crate::ContentType),
/// never an error.  The `Io` / `Integrity` split keeps ordinary read/write
/// failures distinguishable from tampering and corruption.
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cryptographic verification failed: AEAD rejection, ciphertext digest
    /// mismatch, or a declared plaintext length overrunning the stream.
    #[error("Integrity error: {0}")]
    Integrity(#[source] CryptoError),

    #[error("Orphan registry error: {0}")]
    Store(#[from] StoreError),

    #[error("Attachment too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    /// Quoted-reply thumbnails exist only for image and video attachments.
    #[error("Cannot thumbnail {kind} attachment")]
    ThumbnailIneligible { kind: &'static str },

    /// A visual stream handed to the thumbnail generator failed to decode.
    #[error("Thumbnail source failed to decode: {0}")]
    Image(#[from] image::ImageError),

    /// Encrypted containers can only be adopted in place when they already
    /// live under the managed storage root.
    #[error("Encrypted source '{}' is outside the managed storage root", .0.display())]
    SourceOutsideRoot(PathBuf),
}

impl From<CryptoError> for AttachmentError {
    fn from(e: CryptoError) -> Self {
        // I/O failures inside a crypto stream are ordinary I/O errors, not
        // integrity violations.
        match e {
            CryptoError::Io(io) => AttachmentError::Io(io),
            other => AttachmentError::Integrity(other),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AttachmentError>;
