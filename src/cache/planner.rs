//! Content flush planning.
//!
//! Evaluates the enabled URL-derivation rules for one content item and
//! merges their results into a single deduplicated plan.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use tracing::warn;

use super::config::{DimensionConfig, FlushConfig, FlushRule, FrontPage, REST_GROUP};
use super::resolver::{ContentRecord, ContentResolver, DateGranularity, Term};

/// URLs and groups a content change invalidates.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContentFlushPlan {
    /// URLs to flush, first-seen order, no duplicates.
    pub urls: Vec<String>,
    /// Whole groups to flush.
    pub groups: BTreeSet<String>,
    /// Terms considered, ancestors included.
    pub terms: Vec<Term>,
}

impl fmt::Display for ContentFlushPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ContentFlushPlan {{ urls: {}, groups: {}, terms: {} }}",
            self.urls.len(),
            self.groups.len(),
            self.terms.len(),
        )
    }
}

impl ContentFlushPlan {
    /// Build the plan for `content` under the rules enabled in `config`.
    ///
    /// `force` adds the canonical URL whatever its toggle says. A failed term
    /// lookup leaves the term rules empty; every other rule still runs.
    pub fn build(
        config: &FlushConfig,
        resolver: &dyn ContentResolver,
        content: &ContentRecord,
        force: bool,
    ) -> Self {
        let rules = config.rules_enabled();
        let enabled = |rule: FlushRule| rules.contains(&rule);
        let limit = config.postpages_limit_non_zero().get();
        let feeds = &config.feed_types;
        let id = content.id;

        let mut plan = Self::default();
        let mut seen = HashSet::new();
        let mut add = |plan: &mut Self, urls: Vec<String>| {
            for url in urls {
                if seen.insert(url.clone()) {
                    plan.urls.push(url);
                }
            }
        };

        if config.cache_rest {
            plan.groups.insert(REST_GROUP.to_string());
        }

        if enabled(FlushRule::Terms) || enabled(FlushRule::FeedTerms) {
            match resolver.content_terms(id) {
                Ok(direct) => plan.terms = resolver.ancestor_terms(&direct),
                Err(error) => {
                    warn!(content_id = %id, error = %error, "Term lookup failed, term URLs skipped");
                }
            }
        }

        let home = enabled(FlushRule::Home);
        if (home && config.front_page == FrontPage::Posts) || enabled(FlushRule::FrontPage) {
            add(&mut plan, resolver.home_urls(limit));
        }
        if home && config.front_page != FrontPage::Posts && !content.custom_type {
            add(&mut plan, resolver.posts_page_urls(limit));
        }
        if home && content.custom_type {
            add(&mut plan, resolver.post_type_archive_urls(id, limit));
        }

        if enabled(FlushRule::PostUrl) || force {
            add(&mut plan, resolver.post_urls(id));
        }
        if enabled(FlushRule::Comments) {
            add(&mut plan, resolver.comment_urls(id));
        }
        if enabled(FlushRule::Author) {
            add(&mut plan, resolver.author_urls(content.author_id, limit));
        }
        if enabled(FlushRule::Terms) {
            let urls = resolver.term_urls(&plan.terms, limit);
            add(&mut plan, urls);
        }

        for (rule, granularity) in [
            (FlushRule::ArchiveDaily, DateGranularity::Day),
            (FlushRule::ArchiveMonthly, DateGranularity::Month),
            (FlushRule::ArchiveYearly, DateGranularity::Year),
        ] {
            if enabled(rule) {
                add(&mut plan, resolver.date_archive_urls(id, granularity));
            }
        }

        if enabled(FlushRule::FeedBlog) {
            let content_type = content.custom_type.then_some(content.post_type.as_str());
            add(&mut plan, resolver.feed_urls(feeds, content_type));
        }
        if enabled(FlushRule::FeedComments) {
            add(&mut plan, resolver.comment_feed_urls(id, feeds));
        }
        if enabled(FlushRule::FeedAuthor) {
            add(&mut plan, resolver.author_feed_urls(content.author_id, feeds));
        }
        if enabled(FlushRule::FeedTerms) {
            let urls = resolver.term_feed_urls(&plan.terms, feeds);
            add(&mut plan, urls);
        }

        if !config.purge_pages.is_empty() {
            add(&mut plan, resolver.page_urls(&config.purge_pages));
        }

        let mirrors = resolver.mirror_urls(&plan.urls);
        add(&mut plan, mirrors);

        plan
    }

    /// Check if the plan invalidates nothing.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.groups.is_empty()
    }
}
