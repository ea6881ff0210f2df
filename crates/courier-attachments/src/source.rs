//! Input shapes accepted by the validation pipeline, plus the head-capture
//! adapters that let the classifier sniff a stream's leading bytes without a
//! second read pass.

use std::io::{Read, Write};
use std::path::PathBuf;

use bytes::Bytes;

use courier_shared::constants::SNIFF_LEN;
use courier_shared::{ContentDigest, SymmetricKey};

/// Untrusted content handed to [`AttachmentValidator::validate`](crate::AttachmentValidator::validate).
#[derive(Debug, Clone)]
pub enum AttachmentSource {
    /// Plaintext file on disk.  With `should_consume` the file is deleted
    /// once validation finishes, on success and failure equally.
    File {
        path: PathBuf,
        should_consume: bool,
    },

    /// Plaintext bytes already in memory.
    Bytes(Bytes),

    /// An existing encrypted container, e.g. a completed download.
    EncryptedFile {
        path: PathBuf,
        key: SymmetricKey,
        /// Expected digest over the whole container; a mismatch is a hard
        /// integrity error.
        ciphertext_digest: ContentDigest,
        /// Declared logical plaintext length.  When set, application-level
        /// padding past this length is stripped and the content is
        /// re-encrypted to a fresh file; when absent the container is
        /// adopted unchanged.
        plaintext_length: Option<u64>,
    },
}

impl AttachmentSource {
    pub fn from_file(path: impl Into<PathBuf>, should_consume: bool) -> Self {
        Self::File {
            path: path.into(),
            should_consume,
        }
    }

    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Bytes(data.into())
    }

    pub fn from_encrypted_file(
        path: impl Into<PathBuf>,
        key: SymmetricKey,
        ciphertext_digest: ContentDigest,
        plaintext_length: Option<u64>,
    ) -> Self {
        Self::EncryptedFile {
            path: path.into(),
            key,
            ciphertext_digest,
            plaintext_length,
        }
    }
}

/// Reader adapter that records the first [`SNIFF_LEN`] bytes passing through.
pub(crate) struct HeadCapture<R> {
    inner: R,
    head: Vec<u8>,
}

impl<R> HeadCapture<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            head: Vec::with_capacity(SNIFF_LEN.min(4096)),
        }
    }

    pub(crate) fn into_head(self) -> Vec<u8> {
        self.head
    }
}

impl<R: Read> Read for HeadCapture<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if self.head.len() < SNIFF_LEN {
            let take = (SNIFF_LEN - self.head.len()).min(n);
            self.head.extend_from_slice(&buf[..take]);
        }
        Ok(n)
    }
}

/// Writer sink that keeps the first [`SNIFF_LEN`] bytes and discards the
/// rest.  Used to sniff decrypted containers without materializing them.
pub(crate) struct HeadSink {
    head: Vec<u8>,
}

impl HeadSink {
    pub(crate) fn new() -> Self {
        Self {
            head: Vec::with_capacity(SNIFF_LEN.min(4096)),
        }
    }

    pub(crate) fn into_head(self) -> Vec<u8> {
        self.head
    }
}

impl Write for HeadSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.head.len() < SNIFF_LEN {
            let take = (SNIFF_LEN - self.head.len()).min(buf.len());
            self.head.extend_from_slice(&buf[..take]);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_capture_stops_at_sniff_len() {
        let data = vec![0xABu8; SNIFF_LEN + 1000];
        let mut reader = HeadCapture::new(data.as_slice());

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out.len(), data.len());
        assert_eq!(reader.into_head().len(), SNIFF_LEN);
    }

    #[test]
    fn test_head_capture_short_stream() {
        let mut reader = HeadCapture::new(&b"tiny"[..]);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(reader.into_head(), b"tiny");
    }

    #[test]
    fn test_head_sink_discards_tail() {
        let mut sink = HeadSink::new();
        sink.write_all(&vec![0x11u8; SNIFF_LEN]).unwrap();
        sink.write_all(&vec![0x22u8; 500]).unwrap();

        let head = sink.into_head();
        assert_eq!(head.len(), SNIFF_LEN);
        assert!(head.iter().all(|&b| b == 0x11));
    }
}
