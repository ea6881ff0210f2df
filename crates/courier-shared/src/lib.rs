//! # courier-shared
//!
//! Primitives shared across the Courier attachment subsystem: content
//! digests, streaming authenticated encryption, and the constants that pin
//! down the at-rest file format.

pub mod constants;
pub mod crypto;
pub mod digest;

mod error;

pub use crypto::{StreamStats, SymmetricKey};
pub use digest::ContentDigest;
pub use error::CryptoError;
