//! Encryption stage: materializes plaintext streams as encrypted files under
//! the managed storage root, and verifies existing encrypted containers.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;
use uuid::Uuid;

use courier_shared::crypto::{self, StreamStats, SymmetricKey};
use courier_shared::{ContentDigest, CryptoError};
use courier_store::OrphanLedger;

use crate::error::Result;
use crate::source::HeadCapture;

/// Output of the encryption stage: everything the assembler needs about the
/// at-rest representation.
#[derive(Debug, Clone)]
pub(crate) struct EncryptedFileInfo {
    pub key: SymmetricKey,
    /// BLAKE3 over the plaintext content.
    pub content_digest: ContentDigest,
    /// BLAKE3 over the whole container file.
    pub ciphertext_digest: ContentDigest,
    pub unencrypted_byte_count: u64,
    pub encrypted_byte_count: u64,
    /// Container path relative to the managed storage root.
    pub relative_path: String,
    /// `None` when an existing container was adopted without creating a file.
    pub orphan_id: Option<Uuid>,
}

/// Stream-encrypt `reader` under a fresh key into a new file under `root`.
///
/// The orphan registration happens between creating the file and streaming
/// into it, so a crash mid-write always leaves a sweepable record.  Returns
/// the file info plus the captured plaintext head for the classifier.
pub(crate) fn encrypt_to_new_file<R: Read>(
    root: &Path,
    orphans: &OrphanLedger,
    reader: R,
) -> Result<(EncryptedFileInfo, Vec<u8>)> {
    let relative_path = Uuid::new_v4().to_string();
    let dest = root.join(&relative_path);

    let file = File::create(&dest)?;
    let orphan_id = orphans.register(&relative_path)?;

    let key = crypto::generate_symmetric_key();
    let mut capture = HeadCapture::new(reader);
    let stats = crypto::encrypt_stream(&key, &mut capture, BufWriter::new(file))?;

    debug!(
        path = %relative_path,
        orphan_id = %orphan_id,
        plaintext = stats.unencrypted_len,
        ciphertext = stats.encrypted_len,
        "encrypted attachment file written"
    );

    Ok((
        EncryptedFileInfo {
            key,
            content_digest: stats.plaintext_digest,
            ciphertext_digest: stats.ciphertext_digest,
            unencrypted_byte_count: stats.unencrypted_len,
            encrypted_byte_count: stats.encrypted_len,
            relative_path,
            orphan_id: Some(orphan_id),
        },
        capture.into_head(),
    ))
}

/// Stream-decrypt `container` into `writer`, verifying the recomputed
/// ciphertext digest against the caller's expectation.
pub(crate) fn decrypt_verified<W: Write>(
    container: &Path,
    key: &SymmetricKey,
    expected_ciphertext_digest: &ContentDigest,
    plaintext_limit: Option<u64>,
    writer: W,
) -> Result<StreamStats> {
    let file = File::open(container)?;
    let stats = crypto::decrypt_stream(key, BufReader::new(file), writer, plaintext_limit)?;

    if stats.ciphertext_digest != *expected_ciphertext_digest {
        return Err(CryptoError::CiphertextDigestMismatch {
            expected: *expected_ciphertext_digest,
            actual: stats.ciphertext_digest,
        }
        .into());
    }

    Ok(stats)
}

/// Decrypt one of our own freshly written containers back into memory.
///
/// Used when image classification needs the full plaintext; bounded by the
/// pipeline's maximum attachment size.
pub(crate) fn read_back_plaintext(root: &Path, info: &EncryptedFileInfo) -> Result<Vec<u8>> {
    let file = File::open(root.join(&info.relative_path))?;
    let mut plaintext = Vec::with_capacity(info.unencrypted_byte_count as usize);
    crypto::decrypt_stream(&info.key, BufReader::new(file), &mut plaintext, None)?;
    Ok(plaintext)
}
