//! Flush engine.
//!
//! `FlushEngine` holds the collaborators wired at startup; `FlushSession`
//! is one unit of work against it: enqueue, then drain once.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::classifier::{GroupClassifier, RouteGroupClassifier};
use super::config::FlushConfig;
use super::error::{FlushError, StoreError};
use super::events::InvalidationRequest;
use super::executor::{DrainReport, FlushExecutor};
use super::hooks::{FlushHooks, NoHooks};
use super::keys::{GroupScope, HashedKeyBuilder, KeyBuilder};
use super::planner::ContentFlushPlan;
use super::queue::FlushQueue;
use super::registry::StoreRegistry;
use super::resolver::{ContentId, ContentResolver};

/// Shared, immutable wiring of the invalidation engine.
///
/// Cheap to clone. Each unit of work calls [`FlushEngine::begin`] to get its
/// own queue.
#[derive(Clone)]
pub struct FlushEngine {
    config: Arc<FlushConfig>,
    registry: Arc<StoreRegistry>,
    resolver: Option<Arc<dyn ContentResolver>>,
    classifier: Arc<dyn GroupClassifier>,
    key_builder: Arc<dyn KeyBuilder>,
    hooks: Arc<dyn FlushHooks>,
}

impl FlushEngine {
    /// Create an engine with the configured route classifier, hashed keys
    /// and no hooks. Content flushes need a resolver; see `with_resolver`.
    pub fn new(config: FlushConfig, registry: StoreRegistry) -> Self {
        let classifier = Arc::new(RouteGroupClassifier::from_config(&config));
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            resolver: None,
            classifier,
            key_builder: Arc::new(HashedKeyBuilder),
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ContentResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn GroupClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_key_builder(mut self, key_builder: Arc<dyn KeyBuilder>) -> Self {
        self.key_builder = key_builder;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn FlushHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Start a unit of work with an empty queue.
    pub fn begin(&self) -> FlushSession {
        FlushSession {
            engine: self.clone(),
            queue: FlushQueue::new(),
        }
    }

    /// Ask the store serving `group` for an ahead-generation extension.
    pub fn get_ahead_generation_extension(&self, group: &str) -> Result<Option<String>, StoreError> {
        self.registry.store_for(group).ahead_generation_extension(group)
    }

    /// Let the store serving `group` drop what the ahead-generation pass
    /// `extension` superseded.
    pub fn flush_group_after_ahead_generation(
        &self,
        group: &str,
        extension: &str,
    ) -> Result<(), StoreError> {
        debug!(group, extension, "Flushing group after ahead generation");
        self.registry
            .store_for(group)
            .flush_group_after_ahead_generation(group, extension)
    }

    pub fn config(&self) -> &FlushConfig {
        &self.config
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    fn executor(&self) -> FlushExecutor {
        FlushExecutor::new(
            self.config.clone(),
            self.registry.clone(),
            self.key_builder.clone(),
            self.hooks.clone(),
        )
    }
}

/// One unit of work.
///
/// State: empty, accumulating after `enqueue_*`, empty again after `drain`.
/// Dropping a session with queued work loses it; that is logged.
pub struct FlushSession {
    engine: FlushEngine,
    queue: FlushQueue,
}

impl FlushSession {
    /// Request a flush of the whole page cache.
    pub fn enqueue_flush_all(&mut self) {
        debug!("Full flush queued");
        self.queue.request_flush_all();
    }

    pub fn enqueue_flush_group(&mut self, group: impl Into<String>) {
        let group = group.into();
        debug!(group = %group, "Group queued for flush");
        self.queue.request_flush_group(group);
    }

    /// Queue `url` under the group the classifier assigns it. Returns the
    /// scope now in effect for `url`.
    pub fn enqueue_flush_url(&mut self, url: &str) -> GroupScope {
        let scope = self
            .queue
            .request_flush_url(url, self.engine.classifier.as_ref());
        if self.engine.config.debug_purge {
            info!(url, group = %scope, "Purge URL classified");
        }
        scope
    }

    /// Queue `url` under an explicit group, skipping classification.
    pub fn enqueue_flush_url_in_group(&mut self, url: &str, group: Option<String>) -> GroupScope {
        self.queue.queue_url(url, GroupScope::from_group(group))
    }

    /// Queue every URL a change to `content_id` invalidates.
    ///
    /// Fails only when the resolver is missing or routing is not ready.
    /// Unknown content and lookup failures queue nothing.
    pub fn enqueue_flush_content(
        &mut self,
        content_id: impl Into<ContentId>,
        force: bool,
    ) -> Result<(), FlushError> {
        let content_id = content_id.into();
        let Some(resolver) = self.engine.resolver.clone() else {
            return Err(FlushError::precondition(
                "content resolver",
                "no resolver registered",
            ));
        };
        if !resolver.routing_ready() {
            return Err(FlushError::precondition(
                "url routing",
                "routing context is not initialized",
            ));
        }

        if !self.queue.mark_content(content_id) {
            debug!(content_id = %content_id, "Content already queued for flush");
            return Ok(());
        }

        let content = match resolver.content(content_id) {
            Ok(Some(content)) => content,
            Ok(None) => {
                debug!(content_id = %content_id, "Content not found, nothing to flush");
                return Ok(());
            }
            Err(error) => {
                warn!(content_id = %content_id, error = %error, "Content lookup failed, nothing flushed");
                return Ok(());
            }
        };

        let ContentFlushPlan { mut urls, groups, .. } =
            ContentFlushPlan::build(&self.engine.config, resolver.as_ref(), &content, force);
        self.engine.hooks.content_urls(content_id, &mut urls);

        if self.engine.config.debug_purge {
            info!(content_id = %content_id, force, urls = ?urls, groups = ?groups, "Purge content URLs");
        } else {
            debug!(content_id = %content_id, force, urls = urls.len(), groups = groups.len(), "Content queued for flush");
        }

        for url in &urls {
            self.queue.queue_url(url, GroupScope::Any);
        }
        for group in groups {
            self.queue.request_flush_group(group);
        }
        Ok(())
    }

    /// Route a tagged request to the matching `enqueue_*` call.
    pub fn submit(&mut self, request: InvalidationRequest) -> Result<(), FlushError> {
        debug!(request = %request, kind = request.kind(), "Invalidation request submitted");
        match request {
            InvalidationRequest::FlushAll => self.enqueue_flush_all(),
            InvalidationRequest::FlushGroup(group) => self.enqueue_flush_group(group),
            InvalidationRequest::FlushUrl { url, group: None } => {
                self.enqueue_flush_url(&url);
            }
            InvalidationRequest::FlushUrl { url, group } => {
                self.enqueue_flush_url_in_group(&url, group);
            }
            InvalidationRequest::FlushContent { content_id, force } => {
                self.enqueue_flush_content(content_id, force)?;
            }
        }
        Ok(())
    }

    /// Execute everything queued and empty the session.
    pub fn drain(&mut self) -> DrainReport {
        let pending = self.queue.take();
        if pending.is_empty() {
            debug!("Nothing queued, drain skipped");
            return DrainReport::default();
        }
        self.engine.executor().execute(pending)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue(&self) -> &FlushQueue {
        &self.queue
    }

    pub fn engine(&self) -> &FlushEngine {
        &self.engine
    }
}

impl Drop for FlushSession {
    fn drop(&mut self) {
        if self.queue.is_flush_all_requested()
            || self.queue.url_count() > 0
            || self.queue.group_count() > 0
        {
            warn!(
                flush_all = self.queue.is_flush_all_requested(),
                urls = self.queue.url_count(),
                groups = self.queue.group_count(),
                "Flush session dropped without draining, pending invalidations lost"
            );
        }
    }
}
