//! The validated-but-not-yet-persisted attachment descriptor.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use courier_shared::{ContentDigest, SymmetricKey};

use crate::classify::ContentType;
use crate::encrypt::EncryptedFileInfo;

/// Opaque presentation hint, passed through unchanged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RenderingFlag {
    #[default]
    Default,
    VoiceMessage,
    Borderless,
    LegacyTranscript,
}

/// Immutable result of a successful validation, ready for the persistence
/// layer to insert.
///
/// The content-identity digest is always computed over the plaintext,
/// whichever input path produced the descriptor.  `orphan_id` is `None` only
/// when an existing encrypted container was adopted without creating a new
/// file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingAttachment {
    /// Compact visual summary, present only for raster images.
    pub blurhash: Option<String>,
    /// BLAKE3 over the plaintext content; deduplication key.
    pub content_digest: ContentDigest,
    /// Total encrypted container length in bytes, nonce prefix included.
    pub encrypted_byte_count: u64,
    /// Logical plaintext length in bytes.
    pub unencrypted_byte_count: u64,
    /// Caller-asserted MIME type, recorded as-is.
    pub mime_type: String,
    /// Symmetric key the container is encrypted under.
    pub encryption_key: SymmetricKey,
    /// BLAKE3 over the encrypted container file.
    pub ciphertext_digest: ContentDigest,
    /// Container path relative to the managed storage root.
    pub local_relative_path: String,
    /// Presentation hint, opaque to the pipeline.
    pub rendering_flag: RenderingFlag,
    /// Original filename, when the caller had one.
    pub source_filename: Option<String>,
    /// Classification derived from the actual bytes.
    pub content_type: ContentType,
    /// Orphan-ledger identifier tracking the container file until commit.
    pub orphan_id: Option<Uuid>,
}

impl PendingAttachment {
    /// Merge the classifier, digest, and encryption outputs with the
    /// caller-supplied pass-through metadata.  Only called once every
    /// upstream stage has succeeded, so no field is ever partial.
    pub(crate) fn assemble(
        content_type: ContentType,
        encrypted: EncryptedFileInfo,
        mime_type: String,
        rendering_flag: RenderingFlag,
        source_filename: Option<String>,
    ) -> Self {
        let blurhash = match &content_type {
            ContentType::Image { blurhash } => blurhash.clone(),
            _ => None,
        };

        Self {
            blurhash,
            content_digest: encrypted.content_digest,
            encrypted_byte_count: encrypted.encrypted_byte_count,
            unencrypted_byte_count: encrypted.unencrypted_byte_count,
            mime_type,
            encryption_key: encrypted.key,
            ciphertext_digest: encrypted.ciphertext_digest,
            local_relative_path: encrypted.relative_path,
            rendering_flag,
            source_filename,
            content_type,
            orphan_id: encrypted.orphan_id,
        }
    }
}

/// Adapter between validation results and the assembler/persistence
/// boundary.  Today the only inhabitant is an already-validated pending
/// attachment; a plain mapping keeps the conversion free of hidden state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttachmentDataSource {
    PendingAttachment(PendingAttachment),
}

impl From<PendingAttachment> for AttachmentDataSource {
    fn from(pending: PendingAttachment) -> Self {
        AttachmentDataSource::PendingAttachment(pending)
    }
}
