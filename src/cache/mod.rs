//! Page cache invalidation engine.
//!
//! A unit of work (one content mutation, one job run, one CLI call) opens a
//! [`FlushSession`], queues what went stale, and drains once at the end:
//!
//! - **Queue**: URLs, groups and content ids, deduplicated, no I/O
//! - **Planner**: content id → affected URLs under the enabled rules
//! - **Executor**: queued work → `flush`/`delete` calls per variant
//!
//! ## Configuration
//!
//! Rules and variant dimensions come from the `[flush]` table of
//! `pagepurge.toml`:
//!
//! ```toml
//! [flush]
//! purge_home = true
//! purge_terms = true
//! device_groups = ["mobile"]
//! compressions = ["gzip"]
//! # ... see config.rs for all options
//! ```

mod classifier;
mod config;
mod engine;
mod error;
mod events;
mod executor;
mod hooks;
mod keys;
mod lock;
mod planner;
mod queue;
mod registry;
mod resolver;
mod store;
mod variants;

pub use classifier::{GroupClassifier, GroupRoute, RouteGroupClassifier};
pub use config::{
    DimensionConfig, FlushConfig, FlushRule, FrontPage, REST_GROUP, SITEMAP_GROUP,
};
pub use engine::{FlushEngine, FlushSession};
pub use error::{BackendError, BackendOperation, FlushError, ResolutionError, StoreError};
pub use events::InvalidationRequest;
pub use executor::{DrainReport, FULL_FLUSH_COUNT, FlushExecutor};
pub use hooks::{FlushHooks, NoHooks};
pub use keys::{GroupScope, HashedKeyBuilder, KeyBuilder, WILDCARD, request_uri};
pub use planner::ContentFlushPlan;
pub use queue::{FlushQueue, PendingFlush};
pub use registry::StoreRegistry;
pub use resolver::{
    ContentId, ContentRecord, ContentResolver, DateGranularity, MAX_TERM_DEPTH, Term,
};
pub use store::{CacheStore, CachedPage, MemoryStore};
pub use variants::{Dimension, Variant, VariantDimension, VariantExpander};

pub(crate) use executor::{
    METRIC_BACKEND_ERROR_TOTAL, METRIC_DRAIN_MS, METRIC_GROUP_FLUSH_TOTAL,
    METRIC_KEY_DELETE_TOTAL,
};
