/// Symmetric key size in bytes (XChaCha20-Poly1305).
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// STREAM (BE32) nonce prefix size in bytes: the 24-byte XChaCha nonce minus
/// the 4-byte counter and 1-byte last-block flag managed by the construction.
pub const STREAM_NONCE_SIZE: usize = 19;

/// Poly1305 authentication tag size in bytes, appended to every chunk.
pub const TAG_SIZE: usize = 16;

/// Plaintext bytes per encrypted chunk.  Every chunk except the last is
/// exactly this long, which makes the framing self-delimiting on decrypt.
pub const ENCRYPTION_CHUNK_SIZE: usize = 64 * 1024;

/// BLAKE3 digest size in bytes.
pub const DIGEST_SIZE: usize = 32;

/// Maximum attachment plaintext size in bytes (100 MiB).
pub const MAX_ATTACHMENT_SIZE: u64 = 100 * 1024 * 1024;

/// Message bodies longer than this many UTF-8 bytes are spilled into an
/// oversize-text attachment.
pub const INLINE_TEXT_LIMIT: usize = 2048;

/// How many leading plaintext bytes the classifier sniffs for magic numbers.
pub const SNIFF_LEN: usize = 8192;

/// Longest edge of a quoted-reply thumbnail, in pixels.
pub const THUMBNAIL_MAX_EDGE: u32 = 512;

/// Longest edge of the downscaled frame fed to the blurhash encoder.
pub const BLURHASH_MAX_EDGE: u32 = 32;

/// Blurhash component counts (x, y).
pub const BLURHASH_COMPONENTS_X: u32 = 4;
pub const BLURHASH_COMPONENTS_Y: u32 = 3;

/// MIME type recorded for spilled oversize-text attachments.
pub const MIME_OVERSIZE_TEXT: &str = "text/plain";

/// MIME type of generated quoted-reply thumbnails.
pub const MIME_THUMBNAIL: &str = "image/png";
