//! Group classification for explicit URL flushes.

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use super::config::{FlushConfig, REST_GROUP, SITEMAP_GROUP};

/// Maps a request URI (path plus query) to the cache group holding it.
pub trait GroupClassifier: Send + Sync {
    /// `None` means the URI may live in any group.
    fn group_for_uri(&self, uri: &str) -> Option<String>;
}

/// A URI prefix routed to a dedicated group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupRoute {
    pub prefix: String,
    pub group: String,
}

impl GroupRoute {
    pub fn new(prefix: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            group: group.into(),
        }
    }
}

/// Prefix-based classifier. The first matching route wins.
#[derive(Debug, Clone, Default)]
pub struct RouteGroupClassifier {
    routes: Vec<GroupRoute>,
    sitemap: Option<Regex>,
}

impl RouteGroupClassifier {
    pub fn new(routes: Vec<GroupRoute>) -> Self {
        Self {
            routes,
            sitemap: None,
        }
    }

    /// Classifier matching the groups the configuration separates out.
    pub fn from_config(config: &FlushConfig) -> Self {
        let mut routes = config.group_routes.clone();
        if config.cache_rest {
            routes.push(GroupRoute::new(config.rest_route_prefix.clone(), REST_GROUP));
        }
        let sitemap = config.sitemap_pattern().unwrap_or_else(|error| {
            warn!(error = %error, "Invalid sitemap pattern, sitemap routing disabled");
            None
        });
        Self { routes, sitemap }
    }
}

impl GroupClassifier for RouteGroupClassifier {
    fn group_for_uri(&self, uri: &str) -> Option<String> {
        if let Some(route) = self.routes.iter().find(|r| uri.starts_with(&r.prefix)) {
            return Some(route.group.clone());
        }

        self.sitemap
            .as_ref()
            .filter(|pattern| pattern.is_match(uri))
            .map(|_| SITEMAP_GROUP.to_string())
    }
}
