//! Upload payloads and the naming convention shared by upload and delete.
//!
//! The store returns a URL on upload; deletion takes the namespace plus the
//! bare filename, recovered from that URL with [`filename_from_url`].

use bytes::Bytes;
use mime::Mime;

/// Namespace for images attached to comments.
pub const COMMENT_IMAGES: &str = "comments";
/// Namespace for user profile pictures.
pub const PROFILE_IMAGES: &str = "profiles";

#[derive(Debug, Clone, PartialEq)]
pub struct MediaUpload {
    pub bytes: Bytes,
    /// Declared by the client; the store still sniffs the payload
    pub content_type: Option<Mime>,
}

impl MediaUpload {
    pub fn new(bytes: impl Into<Bytes>, content_type: Option<Mime>) -> Self {
        Self { bytes: bytes.into(), content_type }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Strips the path prefix and the extension: `/static/uploads/comments/ab12.webp` → `ab12`.
pub fn filename_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next()?;
    let stem = match last.rfind('.') {
        Some(0) | None => last,
        Some(dot) => &last[..dot],
    };
    (!stem.is_empty()).then_some(stem)
}
