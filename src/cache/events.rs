//! Invalidation requests.
//!
//! Defines the requests a host submits during a unit of work.

use std::fmt;

use super::resolver::ContentId;

/// A single invalidation intent. Consumed exactly once by a `FlushQueue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationRequest {
    /// Evict everything the page cache holds.
    FlushAll,
    /// Evict one whole cache group.
    FlushGroup(String),
    /// Evict every stored variant of one URL. An explicit group skips
    /// classification.
    FlushUrl { url: String, group: Option<String> },
    /// Evict every page rendering one content item.
    FlushContent { content_id: ContentId, force: bool },
}

impl InvalidationRequest {
    pub fn group(group: impl Into<String>) -> Self {
        Self::FlushGroup(group.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self::FlushUrl {
            url: url.into(),
            group: None,
        }
    }

    pub fn content(content_id: impl Into<ContentId>) -> Self {
        Self::FlushContent {
            content_id: content_id.into(),
            force: false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InvalidationRequest::FlushAll => "flush_all",
            InvalidationRequest::FlushGroup(_) => "flush_group",
            InvalidationRequest::FlushUrl { .. } => "flush_url",
            InvalidationRequest::FlushContent { .. } => "flush_content",
        }
    }
}

impl fmt::Display for InvalidationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidationRequest::FlushAll => f.write_str("flush_all"),
            InvalidationRequest::FlushGroup(group) => write!(f, "flush_group({group})"),
            InvalidationRequest::FlushUrl { url, group: None } => write!(f, "flush_url({url})"),
            InvalidationRequest::FlushUrl {
                url,
                group: Some(group),
            } => write!(f, "flush_url({url}, {group})"),
            InvalidationRequest::FlushContent { content_id, force } => {
                write!(f, "flush_content({content_id}, force={force})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        assert_eq!(
            InvalidationRequest::url("/a/"),
            InvalidationRequest::FlushUrl {
                url: "/a/".to_string(),
                group: None
            }
        );
        assert_eq!(
            InvalidationRequest::content(ContentId(42)),
            InvalidationRequest::FlushContent {
                content_id: ContentId(42),
                force: false
            }
        );
    }

    #[test]
    fn display_format() {
        assert_eq!(InvalidationRequest::FlushAll.to_string(), "flush_all");
        assert_eq!(InvalidationRequest::group("rest").to_string(), "flush_group(rest)");
        assert_eq!(
            InvalidationRequest::FlushContent {
                content_id: ContentId(7),
                force: true
            }
            .to_string(),
            "flush_content(7, force=true)"
        );
    }

    #[test]
    fn kind_names() {
        assert_eq!(InvalidationRequest::url("/").kind(), "flush_url");
        assert_eq!(InvalidationRequest::content(ContentId(1)).kind(), "flush_content");
    }
}
