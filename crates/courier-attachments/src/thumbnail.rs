//! Quoted-reply thumbnails.
//!
//! A reply quoting a visual attachment carries a small thumbnail rendered
//! from the original's decoded frame.  Non-visual originals are a hard
//! error here, unlike the fail-open classification path: the caller asked
//! for a thumbnail that cannot exist.

use std::io::Cursor;

use bytes::Bytes;
use tracing::debug;
use uuid::Uuid;

use courier_shared::constants::{MIME_THUMBNAIL, THUMBNAIL_MAX_EDGE};

use crate::classify::ContentType;
use crate::error::{AttachmentError, Result};
use crate::pending::{PendingAttachment, RenderingFlag};
use crate::source::AttachmentSource;
use crate::validate::AttachmentValidator;

/// Decoded-and-classified attachment content, as handed to the thumbnail
/// workflow.  For videos the data is a caller-extracted still frame.
#[derive(Debug, Clone)]
pub struct AttachmentStream {
    pub content_type: ContentType,
    pub mime_type: String,
    pub data: Bytes,
}

/// Identity of the attachment a reply is quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentReference {
    pub attachment_id: Uuid,
    pub source_filename: Option<String>,
}

/// Thumbnail bytes paired with the quoted original's identity, ready to be
/// embedded in an outgoing reply.
#[derive(Debug, Clone)]
pub struct QuotedReplyDataSource {
    pub data: Bytes,
    pub mime_type: String,
    pub reference: AttachmentReference,
}

impl AttachmentValidator {
    /// Render a thumbnail of `stream` for embedding in an outgoing quoted
    /// reply.  No file is written and nothing touches the orphan ledger.
    pub fn prepare_quoted_reply_thumbnail(
        &self,
        stream: &AttachmentStream,
        reference: AttachmentReference,
    ) -> Result<QuotedReplyDataSource> {
        let data = render_thumbnail(stream)?;
        Ok(QuotedReplyDataSource {
            data: Bytes::from(data),
            mime_type: MIME_THUMBNAIL.to_string(),
            reference,
        })
    }

    /// Render a thumbnail of `stream` and run it through the full
    /// validation pipeline, producing a pending attachment of its own.
    pub fn validate_quoted_reply_thumbnail(
        &self,
        stream: &AttachmentStream,
    ) -> Result<PendingAttachment> {
        let data = render_thumbnail(stream)?;
        self.validate(
            AttachmentSource::from_bytes(data),
            MIME_THUMBNAIL,
            RenderingFlag::Default,
            None,
        )
    }
}

/// Decode, downscale, and re-encode as PNG.  Only visual content is
/// eligible; everything else is a [`AttachmentError::ThumbnailIneligible`].
fn render_thumbnail(stream: &AttachmentStream) -> Result<Vec<u8>> {
    if !stream.content_type.is_visual() {
        return Err(AttachmentError::ThumbnailIneligible {
            kind: stream.content_type.kind(),
        });
    }

    let img = image::load_from_memory(&stream.data)?;
    let thumb = img.thumbnail(THUMBNAIL_MAX_EDGE, THUMBNAIL_MAX_EDGE);

    debug!(
        source_mime = %stream.mime_type,
        width = thumb.width(),
        height = thumb.height(),
        "rendered quoted-reply thumbnail"
    );

    let mut out = Vec::new();
    thumb.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)?;
    Ok(out)
}
