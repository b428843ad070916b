//! Extension points around the flush pipeline.

use super::resolver::ContentId;

/// Host-supplied adjustments to what a flush touches. All methods default to
/// leaving their input unchanged.
pub trait FlushHooks: Send + Sync {
    /// Groups flushed by a full flush, after the built-in ones.
    fn flush_all_groups(&self, _groups: &mut Vec<String>) {}

    /// URLs derived for a content flush, before they are queued.
    fn content_urls(&self, _id: ContentId, _urls: &mut Vec<String>) {}

    /// Returning true drops `url` from the drain entirely.
    fn skip_url(&self, _url: &str) -> bool {
        false
    }

    /// Physical keys deleted for one variant of `url`.
    fn url_keys(&self, _url: &str, _keys: &mut Vec<String>) {}
}

/// The default: no adjustments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl FlushHooks for NoHooks {}
