//! Oversize message body handling.
//!
//! Message bodies past the inline limit are spilled into a full-size text
//! attachment, keeping only a truncated preview inline.  Truncation counts
//! bytes but never splits a UTF-8 code point.

use bytes::Bytes;
use tracing::debug;

use courier_shared::constants::{INLINE_TEXT_LIMIT, MIME_OVERSIZE_TEXT};

use crate::error::Result;
use crate::pending::{PendingAttachment, RenderingFlag};
use crate::source::AttachmentSource;
use crate::validate::AttachmentValidator;

/// A message body checked against the inline limit.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedMessageBody {
    /// Fits inline; carried unchanged.
    Inline(String),
    /// Past the limit: a byte-bounded preview plus the full body as a
    /// validated text attachment.
    Oversize {
        truncated: String,
        fullsize: PendingAttachment,
    },
}

impl AttachmentValidator {
    /// Check `body` against the inline limit, spilling to an attachment
    /// when it is too long.
    pub fn validate_message_body(&self, body: &str) -> Result<ValidatedMessageBody> {
        if body.len() <= INLINE_TEXT_LIMIT {
            return Ok(ValidatedMessageBody::Inline(body.to_string()));
        }

        debug!(bytes = body.len(), "message body exceeds inline limit");

        let truncated = truncate_to_boundary(body, INLINE_TEXT_LIMIT).to_string();
        let fullsize = self.validate(
            AttachmentSource::from_bytes(Bytes::copy_from_slice(body.as_bytes())),
            MIME_OVERSIZE_TEXT,
            RenderingFlag::Default,
            None,
        )?;

        Ok(ValidatedMessageBody::Oversize {
            truncated,
            fullsize,
        })
    }

    /// Convenience form for callers that only act when spilling happened.
    pub fn prepare_oversize_text_if_needed(
        &self,
        body: &str,
    ) -> Result<Option<ValidatedMessageBody>> {
        if body.len() <= INLINE_TEXT_LIMIT {
            return Ok(None);
        }
        self.validate_message_body(body).map(Some)
    }
}

/// Longest prefix of `body` that is at most `limit` bytes and ends on a
/// UTF-8 character boundary.
fn truncate_to_boundary(body: &str, limit: usize) -> &str {
    if body.len() <= limit {
        return body;
    }
    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
