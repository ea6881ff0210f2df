//! # courier-attachments
//!
//! Validation and preparation pipeline for untrusted attachment content.
//!
//! Given bytes from a file, an in-memory buffer, or an already-encrypted
//! container, the pipeline sniffs the true content classification, computes
//! content-identity digests, produces an encrypted at-rest file under a
//! managed storage root, registers the file with the orphan ledger, and
//! returns a fully populated [`PendingAttachment`] ready for the persistence
//! layer to commit.
//!
//! Two derived workflows reuse the same machinery: spilling oversize message
//! bodies into text attachments, and generating quoted-reply thumbnails from
//! existing visual attachments.
//!
//! Every entry operation is a synchronous, potentially long-running blocking
//! call (file I/O, streaming cryptography, image decoding); invoke it from a
//! context where blocking is acceptable.

pub mod classify;
pub mod oversize;
pub mod pending;
pub mod source;
pub mod thumbnail;
pub mod validate;

mod encrypt;
mod error;

pub use classify::ContentType;
pub use error::{AttachmentError, Result};
pub use oversize::ValidatedMessageBody;
pub use pending::{AttachmentDataSource, PendingAttachment, RenderingFlag};
pub use source::AttachmentSource;
pub use thumbnail::{AttachmentReference, AttachmentStream, QuotedReplyDataSource};
pub use validate::AttachmentValidator;
