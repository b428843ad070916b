//! Flush executor.
//!
//! Turns a drained `PendingFlush` into concrete `flush`/`delete` calls against
//! the registered stores.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{info, warn};

use super::config::{FlushConfig, REST_GROUP, SITEMAP_GROUP};
use super::error::{BackendError, BackendOperation, StoreError};
use super::hooks::FlushHooks;
use super::keys::{GroupScope, KeyBuilder};
use super::queue::PendingFlush;
use super::registry::StoreRegistry;
use super::store::CacheStore;
use super::variants::VariantExpander;

pub(crate) const METRIC_DRAIN_MS: &str = "pagepurge_drain_ms";
pub(crate) const METRIC_KEY_DELETE_TOTAL: &str = "pagepurge_key_delete_total";
pub(crate) const METRIC_GROUP_FLUSH_TOTAL: &str = "pagepurge_group_flush_total";
pub(crate) const METRIC_BACKEND_ERROR_TOTAL: &str = "pagepurge_backend_error_total";

/// Reported count of a full flush, which cannot be counted entry by entry.
pub const FULL_FLUSH_COUNT: usize = 999;

/// Outcome of one drain.
#[derive(Debug, Default, Clone)]
pub struct DrainReport {
    /// Pages invalidated: processed URLs plus flushed groups, or
    /// `FULL_FLUSH_COUNT` for a full flush.
    pub count: usize,
    /// At least one backend call failed.
    pub partial_failure: bool,
    /// Every failed backend call, in execution order.
    pub failures: Vec<BackendError>,
    /// Physical delete calls issued.
    pub keys_deleted: usize,
    /// Whole-group flush calls issued.
    pub groups_flushed: usize,
}

impl DrainReport {
    fn record(&mut self, error: BackendError) {
        warn!(
            operation = %error.operation,
            group = %error.group,
            key = error.key.as_deref().unwrap_or(""),
            error = %error.source,
            "Cache backend call failed"
        );
        counter!(METRIC_BACKEND_ERROR_TOTAL, "operation" => error.operation.to_string())
            .increment(1);
        self.partial_failure = true;
        self.failures.push(error);
    }
}

/// Executes drained flush work against the store registry.
#[derive(Clone)]
pub struct FlushExecutor {
    config: Arc<FlushConfig>,
    registry: Arc<StoreRegistry>,
    key_builder: Arc<dyn KeyBuilder>,
    hooks: Arc<dyn FlushHooks>,
}

impl FlushExecutor {
    pub fn new(
        config: Arc<FlushConfig>,
        registry: Arc<StoreRegistry>,
        key_builder: Arc<dyn KeyBuilder>,
        hooks: Arc<dyn FlushHooks>,
    ) -> Self {
        Self {
            config,
            registry,
            key_builder,
            hooks,
        }
    }

    /// Execute `pending`. Backend failures never abort remaining work.
    pub fn execute(&self, pending: PendingFlush) -> DrainReport {
        let started_at = Instant::now();
        let mode = if pending.flush_all { "full" } else { "selective" };

        info!(
            mode,
            groups = pending.groups.len(),
            urls = pending.urls.len(),
            "Cache drain starting"
        );

        let report = if pending.flush_all {
            self.flush_all()
        } else {
            self.flush_selective(pending)
        };

        info!(
            mode,
            count = report.count,
            keys_deleted = report.keys_deleted,
            groups_flushed = report.groups_flushed,
            partial_failure = report.partial_failure,
            "Cache drain complete"
        );

        histogram!(METRIC_DRAIN_MS, "mode" => mode)
            .record(started_at.elapsed().as_secs_f64() * 1000.0);

        report
    }

    /// Groups a full flush covers: the wildcard group first.
    pub fn flush_all_groups(&self) -> Vec<String> {
        let mut groups = vec![String::new()];
        if self.config.cache_rest {
            groups.push(REST_GROUP.to_string());
        }
        groups.extend(self.config.flush_all_groups.iter().cloned());
        self.hooks.flush_all_groups(&mut groups);

        let mut unique = Vec::with_capacity(groups.len());
        for group in groups {
            if !unique.contains(&group) {
                unique.push(group);
            }
        }
        unique
    }

    fn flush_all(&self) -> DrainReport {
        let mut report = DrainReport::default();
        for group in self.flush_all_groups() {
            self.flush_group(&group, &mut report);
        }
        report.count = FULL_FLUSH_COUNT;
        report
    }

    fn flush_selective(&self, pending: PendingFlush) -> DrainReport {
        let mut report = DrainReport::default();

        for group in &pending.groups {
            self.flush_group(group, &mut report);
            report.count += 1;
        }

        if pending.urls.is_empty() {
            return report;
        }

        let variants = VariantExpander::from_config(&*self.config).expand();
        let mut stores: HashMap<GroupScope, Arc<dyn CacheStore>> = HashMap::new();

        for (url, scope) in &pending.urls {
            if self.hooks.skip_url(url) {
                continue;
            }
            report.count += 1;

            let store = stores
                .entry(scope.clone())
                .or_insert_with(|| self.registry.store_for(scope.store_group()));
            let group = scope.store_group();

            for variant in &variants {
                let mut keys = vec![self.key_builder.page_key(url, variant, group)];
                self.hooks.url_keys(url, &mut keys);

                for key in keys {
                    report.keys_deleted += 1;
                    counter!(METRIC_KEY_DELETE_TOTAL).increment(1);
                    if let Err(source) = store.delete(&key, group) {
                        report.record(backend_error(BackendOperation::Delete, group, Some(key), source));
                    }
                }
            }
        }

        if self.config.sitemap_regex.is_some() {
            self.flush_group(SITEMAP_GROUP, &mut report);
            report.count += 1;
        }

        report
    }

    fn flush_group(&self, group: &str, report: &mut DrainReport) {
        report.groups_flushed += 1;
        counter!(METRIC_GROUP_FLUSH_TOTAL).increment(1);
        if let Err(source) = self.registry.store_for(group).flush(group) {
            report.record(backend_error(BackendOperation::Flush, group, None, source));
        }
    }
}

fn backend_error(
    operation: BackendOperation,
    group: &str,
    key: Option<String>,
    source: StoreError,
) -> BackendError {
    BackendError {
        operation,
        group: group.to_string(),
        key,
        source,
    }
}
