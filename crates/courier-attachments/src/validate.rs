//! The validation entry point, composing source reading, classification,
//! digesting, encryption, and orphan registration.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use courier_shared::constants::MAX_ATTACHMENT_SIZE;
use courier_shared::{ContentDigest, SymmetricKey};
use courier_store::OrphanLedger;

use crate::classify::{self, ContentType, SniffedKind};
use crate::encrypt::{self, EncryptedFileInfo};
use crate::error::{AttachmentError, Result};
use crate::pending::{PendingAttachment, RenderingFlag};
use crate::source::{AttachmentSource, HeadSink};

/// Validates untrusted attachment content into [`PendingAttachment`]s.
///
/// Owns the managed storage root where encrypted files are written, and a
/// handle to the orphan ledger that tracks every file it creates.  Safe to
/// share across threads; concurrent validations only contend on the ledger.
pub struct AttachmentValidator {
    root: PathBuf,
    orphans: Arc<OrphanLedger>,
}

impl AttachmentValidator {
    /// Create a validator over `root`, creating the directory if needed.
    pub fn new(root: PathBuf, orphans: Arc<OrphanLedger>) -> Result<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, orphans })
    }

    /// The managed storage root every descriptor path is relative to.
    pub fn storage_root(&self) -> &Path {
        &self.root
    }

    /// Validate one attachment source into a pending attachment.
    ///
    /// `mime_type` is recorded as asserted but never trusted for
    /// classification.  Read and cryptographic failures are hard errors;
    /// unrecognized or corrupt content degrades to an `Invalid`
    /// classification instead.
    pub fn validate(
        &self,
        source: AttachmentSource,
        mime_type: &str,
        rendering_flag: RenderingFlag,
        source_filename: Option<String>,
    ) -> Result<PendingAttachment> {
        match source {
            AttachmentSource::File {
                path,
                should_consume,
            } => {
                let result =
                    self.validate_file(&path, mime_type, rendering_flag, source_filename);

                // The consume contract holds on success and failure equally.
                if should_consume {
                    match std::fs::remove_file(&path) {
                        Ok(()) => debug!(path = %path.display(), "consumed source file"),
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "failed to consume source file");
                        }
                    }
                }

                result
            }

            AttachmentSource::Bytes(data) => {
                if data.len() as u64 > MAX_ATTACHMENT_SIZE {
                    return Err(AttachmentError::TooLarge {
                        size: data.len() as u64,
                        max: MAX_ATTACHMENT_SIZE,
                    });
                }
                self.validate_plaintext(data.as_ref(), mime_type, rendering_flag, source_filename)
            }

            AttachmentSource::EncryptedFile {
                path,
                key,
                ciphertext_digest,
                plaintext_length,
            } => match plaintext_length {
                None => self.adopt_encrypted_container(
                    &path,
                    key,
                    ciphertext_digest,
                    mime_type,
                    rendering_flag,
                    source_filename,
                ),
                Some(length) => self.reencrypt_truncated(
                    &path,
                    key,
                    ciphertext_digest,
                    length,
                    mime_type,
                    rendering_flag,
                    source_filename,
                ),
            },
        }
    }

    fn validate_file(
        &self,
        path: &Path,
        mime_type: &str,
        rendering_flag: RenderingFlag,
        source_filename: Option<String>,
    ) -> Result<PendingAttachment> {
        let metadata = std::fs::metadata(path)?;
        if metadata.len() > MAX_ATTACHMENT_SIZE {
            return Err(AttachmentError::TooLarge {
                size: metadata.len(),
                max: MAX_ATTACHMENT_SIZE,
            });
        }

        let file = File::open(path)?;
        self.validate_plaintext(
            BufReader::new(file),
            mime_type,
            rendering_flag,
            source_filename,
        )
    }

    /// The common plaintext path: encrypt to a new file (registering the
    /// orphan), classify from the captured head, assemble.
    fn validate_plaintext<R: Read>(
        &self,
        reader: R,
        mime_type: &str,
        rendering_flag: RenderingFlag,
        source_filename: Option<String>,
    ) -> Result<PendingAttachment> {
        let (encrypted, head) = encrypt::encrypt_to_new_file(&self.root, &self.orphans, reader)?;
        let content_type = self.resolve_content_type(&encrypted, &head, mime_type)?;

        info!(
            content_digest = %encrypted.content_digest,
            content_type = content_type.kind(),
            unencrypted = encrypted.unencrypted_byte_count,
            "attachment validated"
        );

        Ok(PendingAttachment::assemble(
            content_type,
            encrypted,
            mime_type.to_string(),
            rendering_flag,
            source_filename,
        ))
    }

    /// Encrypted container with no declared plaintext length: verify and
    /// adopt it in place.  No file is created, so no orphan is registered.
    fn adopt_encrypted_container(
        &self,
        path: &Path,
        key: SymmetricKey,
        ciphertext_digest: ContentDigest,
        mime_type: &str,
        rendering_flag: RenderingFlag,
        source_filename: Option<String>,
    ) -> Result<PendingAttachment> {
        let relative_path = path
            .strip_prefix(&self.root)
            .map_err(|_| AttachmentError::SourceOutsideRoot(path.to_path_buf()))?
            .to_string_lossy()
            .into_owned();

        let mut sink = HeadSink::new();
        let stats = encrypt::decrypt_verified(path, &key, &ciphertext_digest, None, &mut sink)?;

        // The size gate applies to every input shape; an adopted container
        // is also what image classification reads back into memory.
        if stats.unencrypted_len > MAX_ATTACHMENT_SIZE {
            return Err(AttachmentError::TooLarge {
                size: stats.unencrypted_len,
                max: MAX_ATTACHMENT_SIZE,
            });
        }

        let encrypted = EncryptedFileInfo {
            key,
            content_digest: stats.plaintext_digest,
            ciphertext_digest: stats.ciphertext_digest,
            unencrypted_byte_count: stats.unencrypted_len,
            encrypted_byte_count: stats.encrypted_len,
            relative_path,
            orphan_id: None,
        };

        let head = sink.into_head();
        let content_type = self.resolve_content_type(&encrypted, &head, mime_type)?;

        info!(
            content_digest = %encrypted.content_digest,
            content_type = content_type.kind(),
            "encrypted container adopted in place"
        );

        Ok(PendingAttachment::assemble(
            content_type,
            encrypted,
            mime_type.to_string(),
            rendering_flag,
            source_filename,
        ))
    }

    /// Encrypted container with a declared plaintext length: decrypt and
    /// truncate to a temp file, then re-run the plaintext path consuming it.
    /// Produces a fresh key, file, and orphan registration.
    ///
    /// The temp plaintext is itself ledger-tracked for its whole lifetime,
    /// so a crash between decryption and consumption leaves a sweepable
    /// record rather than a stranded file.
    fn reencrypt_truncated(
        &self,
        path: &Path,
        key: SymmetricKey,
        ciphertext_digest: ContentDigest,
        plaintext_length: u64,
        mime_type: &str,
        rendering_flag: RenderingFlag,
        source_filename: Option<String>,
    ) -> Result<PendingAttachment> {
        if plaintext_length > MAX_ATTACHMENT_SIZE {
            return Err(AttachmentError::TooLarge {
                size: plaintext_length,
                max: MAX_ATTACHMENT_SIZE,
            });
        }

        let tmp_relative = format!("{}.plaintext.tmp", Uuid::new_v4());
        let tmp = self.root.join(&tmp_relative);

        let file = File::create(&tmp)?;
        let tmp_orphan = match self.orphans.register(&tmp_relative) {
            Ok(id) => id,
            Err(e) => {
                if let Err(cleanup) = std::fs::remove_file(&tmp) {
                    warn!(path = %tmp.display(), error = %cleanup, "failed to remove temp plaintext");
                }
                return Err(e.into());
            }
        };

        let decrypted = encrypt::decrypt_verified(
            path,
            &key,
            &ciphertext_digest,
            Some(plaintext_length),
            BufWriter::new(file),
        );

        let result = match decrypted {
            Ok(_) => self.validate(
                AttachmentSource::File {
                    path: tmp.clone(),
                    should_consume: true,
                },
                mime_type,
                rendering_flag,
                source_filename,
            ),
            Err(e) => {
                if let Err(cleanup) = std::fs::remove_file(&tmp) {
                    warn!(path = %tmp.display(), error = %cleanup, "failed to remove temp plaintext");
                }
                Err(e)
            }
        };

        // The temp file is gone either way; release its ledger row.
        if let Err(e) = self.orphans.deregister(tmp_orphan) {
            warn!(id = %tmp_orphan, error = %e, "failed to release temp plaintext record");
        }

        result
    }

    /// Classify from the sniffed head; image candidates are decrypted back
    /// out of the freshly written container for full decoding.
    fn resolve_content_type(
        &self,
        encrypted: &EncryptedFileInfo,
        head: &[u8],
        mime_type: &str,
    ) -> Result<ContentType> {
        Ok(match classify::sniff(head) {
            SniffedKind::Image => {
                let plaintext = encrypt::read_back_plaintext(&self.root, encrypted)?;
                classify::classify_image(&plaintext)
            }
            SniffedKind::Video => ContentType::Video,
            SniffedKind::Audio => ContentType::Audio,
            SniffedKind::Other => classify::classify_non_visual(mime_type),
        })
    }
}
