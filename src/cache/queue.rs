//! Flush queue.
//!
//! Accumulates invalidation intent for one unit of work without touching any
//! backend. Deduplicates by URL, group and content id.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::mem;

use tracing::debug;

use super::classifier::GroupClassifier;
use super::keys::{GroupScope, request_uri};
use super::resolver::ContentId;

/// Everything queued so far, moved out of the queue by `FlushQueue::take`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingFlush {
    pub flush_all: bool,
    pub groups: BTreeSet<String>,
    pub urls: BTreeMap<String, GroupScope>,
}

impl PendingFlush {
    pub fn is_empty(&self) -> bool {
        !self.flush_all && self.groups.is_empty() && self.urls.is_empty()
    }
}

/// Per-unit-of-work accumulator.
///
/// Lifecycle: created empty, filled by `request_*` calls, emptied by `take`.
#[derive(Debug, Default)]
pub struct FlushQueue {
    queued_urls: BTreeMap<String, GroupScope>,
    queued_groups: BTreeSet<String>,
    queued_content_ids: HashSet<ContentId>,
    flush_all_requested: bool,
}

impl FlushQueue {
    /// Create a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a full flush. Queued groups and URLs are ignored at drain time.
    pub fn request_flush_all(&mut self) {
        self.flush_all_requested = true;
    }

    /// Request a whole-group flush. Idempotent per group.
    pub fn request_flush_group(&mut self, group: impl Into<String>) {
        self.queued_groups.insert(group.into());
    }

    /// Queue `url`, scoped to the group the classifier assigns it.
    pub fn request_flush_url(&mut self, url: &str, classifier: &dyn GroupClassifier) -> GroupScope {
        let uri = request_uri(url);
        let scope = GroupScope::from_group(classifier.group_for_uri(&uri));
        self.queue_url(url, scope)
    }

    /// Queue `url` with an explicit scope and return the scope now in effect.
    ///
    /// A later write replaces an earlier one, except that `Any` is never
    /// narrowed back to a single group.
    pub fn queue_url(&mut self, url: &str, scope: GroupScope) -> GroupScope {
        let effective = match self.queued_urls.get(url) {
            Some(GroupScope::Any) => GroupScope::Any,
            _ => scope,
        };
        debug!(url, group = %effective, "URL queued for flush");
        self.queued_urls.insert(url.to_string(), effective.clone());
        effective
    }

    /// Record that `id` has been resolved. Returns false if it already was.
    pub fn mark_content(&mut self, id: ContentId) -> bool {
        self.queued_content_ids.insert(id)
    }

    pub fn is_flush_all_requested(&self) -> bool {
        self.flush_all_requested
    }

    pub fn scope_of(&self, url: &str) -> Option<&GroupScope> {
        self.queued_urls.get(url)
    }

    pub fn contains_group(&self, group: &str) -> bool {
        self.queued_groups.contains(group)
    }

    /// Get the number of queued URLs.
    pub fn url_count(&self) -> usize {
        self.queued_urls.len()
    }

    /// Get the number of queued groups.
    pub fn group_count(&self) -> usize {
        self.queued_groups.len()
    }

    /// Check if nothing is queued.
    pub fn is_empty(&self) -> bool {
        !self.flush_all_requested
            && self.queued_urls.is_empty()
            && self.queued_groups.is_empty()
            && self.queued_content_ids.is_empty()
    }

    /// Move all queued work out, leaving the queue empty.
    pub fn take(&mut self) -> PendingFlush {
        self.queued_content_ids.clear();
        PendingFlush {
            flush_all: mem::take(&mut self.flush_all_requested),
            groups: mem::take(&mut self.queued_groups),
            urls: mem::take(&mut self.queued_urls),
        }
    }
}
