//! Streaming authenticated encryption for attachment content.
//!
//! Files at rest are XChaCha20-Poly1305 STREAM (BE32 counter) containers:
//! a 19-byte nonce prefix followed by chunks of
//! [`ENCRYPTION_CHUNK_SIZE`](crate::constants::ENCRYPTION_CHUNK_SIZE)
//! plaintext bytes, each carrying a 16-byte tag.  The final chunk is always
//! shorter than a full chunk (possibly tag-only), so the framing needs no
//! explicit length header.
//!
//! Both directions compute the plaintext and ciphertext digests and byte
//! counts in the same pass, over the exact bytes read and written.

use std::io::{Read, Write};

use chacha20poly1305::{
    aead::generic_array::GenericArray,
    aead::stream::{DecryptorBE32, EncryptorBE32},
    aead::KeyInit,
    XChaCha20Poly1305,
};
use rand::RngCore;

use crate::constants::{ENCRYPTION_CHUNK_SIZE, STREAM_NONCE_SIZE, SYMMETRIC_KEY_SIZE, TAG_SIZE};
use crate::digest::{ContentDigest, Digester};
use crate::error::CryptoError;

pub type SymmetricKey = [u8; SYMMETRIC_KEY_SIZE];

pub fn generate_symmetric_key() -> SymmetricKey {
    let mut key = [0u8; SYMMETRIC_KEY_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
}

/// Byte counts and digests gathered while streaming one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    /// Logical plaintext length.  On decrypt with a length limit this is the
    /// truncated length, not the full decrypted length.
    pub unencrypted_len: u64,
    /// Total container length, nonce prefix included.
    pub encrypted_len: u64,
    /// BLAKE3 over the plaintext bytes counted in `unencrypted_len`.
    pub plaintext_digest: ContentDigest,
    /// BLAKE3 over every container byte, nonce prefix included.
    pub ciphertext_digest: ContentDigest,
}

/// Encrypt everything `reader` yields into `writer` under `key`.
///
/// Writes the nonce prefix first, then full-size chunks, then a final short
/// chunk (tag-only when the plaintext length is a multiple of the chunk
/// size, and for empty plaintext).
pub fn encrypt_stream<R: Read, W: Write>(
    key: &SymmetricKey,
    mut reader: R,
    mut writer: W,
) -> Result<StreamStats, CryptoError> {
    let mut nonce = [0u8; STREAM_NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let cipher = XChaCha20Poly1305::new(key.into());
    let mut encryptor = EncryptorBE32::from_aead(cipher, GenericArray::from_slice(&nonce));

    let mut pt_digester = Digester::new();
    let mut ct_digester = Digester::new();
    let mut unencrypted_len: u64 = 0;
    let mut encrypted_len: u64 = nonce.len() as u64;

    writer.write_all(&nonce)?;
    ct_digester.update(&nonce);

    let mut buf = vec![0u8; ENCRYPTION_CHUNK_SIZE];
    loop {
        let n = read_fill(&mut reader, &mut buf)?;
        pt_digester.update(&buf[..n]);
        unencrypted_len += n as u64;

        if n < ENCRYPTION_CHUNK_SIZE {
            let chunk = encryptor
                .encrypt_last(&buf[..n])
                .map_err(|_| CryptoError::EncryptionFailed)?;
            writer.write_all(&chunk)?;
            ct_digester.update(&chunk);
            encrypted_len += chunk.len() as u64;
            break;
        }

        let chunk = encryptor
            .encrypt_next(&buf[..n])
            .map_err(|_| CryptoError::EncryptionFailed)?;
        writer.write_all(&chunk)?;
        ct_digester.update(&chunk);
        encrypted_len += chunk.len() as u64;
    }

    writer.flush()?;

    Ok(StreamStats {
        unencrypted_len,
        encrypted_len,
        plaintext_digest: pt_digester.finish(),
        ciphertext_digest: ct_digester.finish(),
    })
}

/// Decrypt a container from `reader` into `writer` under `key`.
///
/// When `plaintext_limit` is set, `writer` and the plaintext digest see
/// exactly the first `plaintext_limit` bytes; the remaining chunks are still
/// read and authenticated so the ciphertext digest covers the whole file.
/// A limit longer than the actual stream is an error.
pub fn decrypt_stream<R: Read, W: Write>(
    key: &SymmetricKey,
    mut reader: R,
    mut writer: W,
    plaintext_limit: Option<u64>,
) -> Result<StreamStats, CryptoError> {
    let mut nonce = [0u8; STREAM_NONCE_SIZE];
    if read_fill(&mut reader, &mut nonce)? < STREAM_NONCE_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }

    let cipher = XChaCha20Poly1305::new(key.into());
    let mut decryptor = DecryptorBE32::from_aead(cipher, GenericArray::from_slice(&nonce));

    let mut pt_digester = Digester::new();
    let mut ct_digester = Digester::new();
    ct_digester.update(&nonce);

    let mut decrypted_total: u64 = 0;
    let mut written: u64 = 0;
    let mut encrypted_len: u64 = nonce.len() as u64;

    const CIPHER_CHUNK: usize = ENCRYPTION_CHUNK_SIZE + TAG_SIZE;
    let mut buf = vec![0u8; CIPHER_CHUNK];
    loop {
        let n = read_fill(&mut reader, &mut buf)?;
        ct_digester.update(&buf[..n]);
        encrypted_len += n as u64;

        if n < CIPHER_CHUNK {
            let plaintext = decryptor
                .decrypt_last(&buf[..n])
                .map_err(|_| CryptoError::DecryptionFailed)?;
            decrypted_total += plaintext.len() as u64;
            written += write_kept(&mut writer, &mut pt_digester, &plaintext, plaintext_limit, written)?;
            break;
        }

        let plaintext = decryptor
            .decrypt_next(&buf[..n])
            .map_err(|_| CryptoError::DecryptionFailed)?;
        decrypted_total += plaintext.len() as u64;
        written += write_kept(&mut writer, &mut pt_digester, &plaintext, plaintext_limit, written)?;
    }

    if let Some(limit) = plaintext_limit {
        if decrypted_total < limit {
            return Err(CryptoError::PlaintextTooShort {
                declared: limit,
                actual: decrypted_total,
            });
        }
    }

    writer.flush()?;

    Ok(StreamStats {
        unencrypted_len: written,
        encrypted_len,
        plaintext_digest: pt_digester.finish(),
        ciphertext_digest: ct_digester.finish(),
    })
}

/// Forward the portion of a decrypted chunk that falls inside the optional
/// plaintext limit; returns how many bytes were kept.
fn write_kept<W: Write>(
    writer: &mut W,
    digester: &mut Digester,
    plaintext: &[u8],
    limit: Option<u64>,
    written: u64,
) -> std::io::Result<u64> {
    let keep = match limit {
        Some(l) => plaintext.len().min(l.saturating_sub(written) as usize),
        None => plaintext.len(),
    };
    if keep > 0 {
        writer.write_all(&plaintext[..keep])?;
        digester.update(&plaintext[..keep]);
    }
    Ok(keep as u64)
}

/// Read until `buf` is full or the stream ends; returns the filled length.
fn read_fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::digest_bytes;
    use std::io::Cursor;

    fn encrypt_to_vec(key: &SymmetricKey, plaintext: &[u8]) -> (Vec<u8>, StreamStats) {
        let mut out = Vec::new();
        let stats = encrypt_stream(key, plaintext, &mut out).unwrap();
        (out, stats)
    }

    #[test]
    fn test_round_trip() {
        let key = generate_symmetric_key();
        let plaintext = b"Courier attachment plaintext";

        let (ciphertext, enc_stats) = encrypt_to_vec(&key, plaintext);
        assert_eq!(enc_stats.unencrypted_len, plaintext.len() as u64);
        assert_eq!(enc_stats.encrypted_len, ciphertext.len() as u64);
        assert_eq!(enc_stats.plaintext_digest, digest_bytes(plaintext));
        assert_eq!(enc_stats.ciphertext_digest, digest_bytes(&ciphertext));

        let mut decrypted = Vec::new();
        let dec_stats = decrypt_stream(&key, Cursor::new(&ciphertext), &mut decrypted, None).unwrap();
        assert_eq!(decrypted, plaintext);
        assert_eq!(dec_stats.plaintext_digest, enc_stats.plaintext_digest);
        assert_eq!(dec_stats.ciphertext_digest, enc_stats.ciphertext_digest);
        assert_eq!(dec_stats.unencrypted_len, plaintext.len() as u64);
    }

    #[test]
    fn test_multi_chunk_round_trip() {
        let key = generate_symmetric_key();
        // Three full chunks plus a remainder.
        let plaintext: Vec<u8> = (0..(3 * ENCRYPTION_CHUNK_SIZE + 12345))
            .map(|i| (i % 251) as u8)
            .collect();

        let (ciphertext, _) = encrypt_to_vec(&key, plaintext.as_slice());
        let mut decrypted = Vec::new();
        decrypt_stream(&key, Cursor::new(&ciphertext), &mut decrypted, None).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_chunk_aligned_round_trip() {
        let key = generate_symmetric_key();
        let plaintext = vec![0xC4u8; 2 * ENCRYPTION_CHUNK_SIZE];

        let (ciphertext, stats) = encrypt_to_vec(&key, plaintext.as_slice());
        // Two full cipher chunks plus the tag-only final chunk.
        assert_eq!(
            stats.encrypted_len,
            (STREAM_NONCE_SIZE + 2 * (ENCRYPTION_CHUNK_SIZE + TAG_SIZE) + TAG_SIZE) as u64
        );

        let mut decrypted = Vec::new();
        decrypt_stream(&key, Cursor::new(&ciphertext), &mut decrypted, None).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_empty_plaintext_round_trip() {
        let key = generate_symmetric_key();
        let (ciphertext, stats) = encrypt_to_vec(&key, b"");
        assert_eq!(stats.unencrypted_len, 0);
        assert_eq!(stats.encrypted_len, (STREAM_NONCE_SIZE + TAG_SIZE) as u64);

        let mut decrypted = Vec::new();
        decrypt_stream(&key, Cursor::new(&ciphertext), &mut decrypted, None).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_wrong_key_fails() {
        let (ciphertext, _) = encrypt_to_vec(&generate_symmetric_key(), b"secret");
        let other = generate_symmetric_key();
        let result = decrypt_stream(&other, Cursor::new(&ciphertext), std::io::sink(), None);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = generate_symmetric_key();
        let (mut ciphertext, _) = encrypt_to_vec(&key, b"important data");
        let len = ciphertext.len();
        ciphertext[len - 1] ^= 0xFF;

        let result = decrypt_stream(&key, Cursor::new(&ciphertext), std::io::sink(), None);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let key = generate_symmetric_key();
        let (mut ciphertext, _) = encrypt_to_vec(&key, b"important data");
        ciphertext[0] ^= 0x01;

        let result = decrypt_stream(&key, Cursor::new(&ciphertext), std::io::sink(), None);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn test_truncated_container_fails() {
        let key = generate_symmetric_key();
        assert!(matches!(
            decrypt_stream(&key, Cursor::new(&[0u8; 4]), std::io::sink(), None),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_plaintext_limit_truncates() {
        let key = generate_symmetric_key();
        let plaintext = b"padded-content-with-trailing-junk";
        let (ciphertext, _) = encrypt_to_vec(&key, plaintext.as_slice());

        let mut decrypted = Vec::new();
        let stats =
            decrypt_stream(&key, Cursor::new(&ciphertext), &mut decrypted, Some(14)).unwrap();

        assert_eq!(decrypted, b"padded-content");
        assert_eq!(stats.unencrypted_len, 14);
        assert_eq!(stats.plaintext_digest, digest_bytes(b"padded-content"));
        assert_eq!(stats.encrypted_len, ciphertext.len() as u64);
    }

    #[test]
    fn test_plaintext_limit_beyond_stream_fails() {
        let key = generate_symmetric_key();
        let (ciphertext, _) = encrypt_to_vec(&key, b"short");

        let result = decrypt_stream(&key, Cursor::new(&ciphertext), std::io::sink(), Some(100));
        assert!(matches!(
            result,
            Err(CryptoError::PlaintextTooShort {
                declared: 100,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_nonce_makes_ciphertext_unique() {
        let key = generate_symmetric_key();
        let (a, _) = encrypt_to_vec(&key, b"same plaintext");
        let (b, _) = encrypt_to_vec(&key, b"same plaintext");
        assert_ne!(a, b);
    }
}
