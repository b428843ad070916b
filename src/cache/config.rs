//! Flush configuration.
//!
//! Controls which URL-derivation rules run for a content flush and which
//! variant dimensions are active, via the `[flush]` table of `pagepurge.toml`.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use regex::Regex;
use serde::Deserialize;

use super::classifier::GroupRoute;
use super::variants::Dimension;

// Default values for flush configuration
const DEFAULT_POSTPAGES_LIMIT: usize = 10;
const DEFAULT_FEED_TYPE: &str = "rss2";
const DEFAULT_HOME_URL: &str = "http://localhost/";
const DEFAULT_MEMORY_STORE_LIMIT: usize = 10_000;
const DEFAULT_REST_ROUTE_PREFIX: &str = "/wp-json/";

/// Group holding cached REST responses when `cache_rest` is on.
pub const REST_GROUP: &str = "rest";
/// Group holding cached sitemaps.
pub const SITEMAP_GROUP: &str = "sitemaps";

/// Independently togglable URL-derivation rules for a content flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlushRule {
    Home,
    FrontPage,
    PostUrl,
    Comments,
    Author,
    Terms,
    ArchiveDaily,
    ArchiveMonthly,
    ArchiveYearly,
    FeedBlog,
    FeedComments,
    FeedAuthor,
    FeedTerms,
}

/// What the site's front page shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontPage {
    /// The latest posts list.
    #[default]
    Posts,
    /// A static page; posts live on a separate posts page.
    Page,
}

/// Installation-wide data the engine reads but never computes.
pub trait DimensionConfig: Send + Sync {
    /// Active values for `dimension`, the empty default tag first.
    fn active_values(&self, dimension: Dimension) -> Vec<String>;

    /// Rules enabled for content flushes.
    fn rules_enabled(&self) -> BTreeSet<FlushRule>;
}

/// Flush configuration from `pagepurge.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlushConfig {
    /// Purge the home / posts page / post-type archive.
    pub purge_home: bool,
    /// Purge the front page even when it is a static page.
    pub purge_front_page: bool,
    /// Purge the content's canonical URL.
    pub purge_post: bool,
    /// Purge the content's paginated comment pages.
    pub purge_comments: bool,
    /// Purge the author archive.
    pub purge_author: bool,
    /// Purge term archives, ancestors included.
    pub purge_terms: bool,
    /// Purge the day archive the content was published in.
    pub purge_archive_daily: bool,
    /// Purge the month archive the content was published in.
    pub purge_archive_monthly: bool,
    /// Purge the year archive the content was published in.
    pub purge_archive_yearly: bool,
    /// Purge the blog (or post-type) feeds.
    pub purge_feed_blog: bool,
    /// Purge the content's comment feeds.
    pub purge_feed_comments: bool,
    /// Purge the author feeds.
    pub purge_feed_author: bool,
    /// Purge term feeds, ancestors included.
    pub purge_feed_terms: bool,
    /// Feed flavours to purge (`rss2`, `atom`, ...).
    pub feed_types: Vec<String>,
    /// Number of paginated list pages purged per archive.
    pub postpages_limit: usize,
    /// Paths always purged with any content flush.
    pub purge_pages: Vec<String>,
    /// Request URIs matching this pattern live in the sitemap group. When
    /// set, every URL drain also flushes that group.
    pub sitemap_regex: Option<String>,
    /// What the front page shows.
    pub front_page: FrontPage,
    /// REST responses are cached in their own group.
    pub cache_rest: bool,
    /// URI prefix of REST routes.
    pub rest_route_prefix: String,
    /// Extra URI prefixes routed to dedicated groups.
    pub group_routes: Vec<GroupRoute>,
    /// Extra groups flushed together with a full flush.
    pub flush_all_groups: Vec<String>,
    /// Device-class groups with separately cached variants.
    pub device_groups: Vec<String>,
    /// Referrer groups with separately cached variants.
    pub referrer_groups: Vec<String>,
    /// Cookie segmentation is active.
    pub cookie_groups_enabled: bool,
    /// Cookie segments with separately cached variants.
    pub cookie_groups: Vec<String>,
    /// Site home URL; an `https` scheme implies encrypted variants.
    pub home_url: String,
    /// Encrypted requests are cached too.
    pub cache_ssl: bool,
    /// Compression encodings stored alongside the plain body.
    pub compressions: Vec<String>,
    /// Log purge decisions at info level.
    pub debug_purge: bool,
    /// Capacity of the bundled in-memory store.
    pub memory_store_limit: usize,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            purge_home: true,
            purge_front_page: false,
            purge_post: true,
            purge_comments: false,
            purge_author: false,
            purge_terms: false,
            purge_archive_daily: false,
            purge_archive_monthly: false,
            purge_archive_yearly: false,
            purge_feed_blog: true,
            purge_feed_comments: false,
            purge_feed_author: false,
            purge_feed_terms: false,
            feed_types: vec![DEFAULT_FEED_TYPE.to_string()],
            postpages_limit: DEFAULT_POSTPAGES_LIMIT,
            purge_pages: Vec::new(),
            sitemap_regex: None,
            front_page: FrontPage::Posts,
            cache_rest: false,
            rest_route_prefix: DEFAULT_REST_ROUTE_PREFIX.to_string(),
            group_routes: Vec::new(),
            flush_all_groups: Vec::new(),
            device_groups: Vec::new(),
            referrer_groups: Vec::new(),
            cookie_groups_enabled: false,
            cookie_groups: Vec::new(),
            home_url: DEFAULT_HOME_URL.to_string(),
            cache_ssl: false,
            compressions: Vec::new(),
            debug_purge: false,
            memory_store_limit: DEFAULT_MEMORY_STORE_LIMIT,
        }
    }
}

impl FlushConfig {
    /// Config with every content rule switched off.
    pub fn without_rules() -> Self {
        Self {
            purge_home: false,
            purge_post: false,
            purge_feed_blog: false,
            ..Default::default()
        }
    }

    /// Toggle a single rule.
    pub fn set_rule(&mut self, rule: FlushRule, enabled: bool) {
        let flag = match rule {
            FlushRule::Home => &mut self.purge_home,
            FlushRule::FrontPage => &mut self.purge_front_page,
            FlushRule::PostUrl => &mut self.purge_post,
            FlushRule::Comments => &mut self.purge_comments,
            FlushRule::Author => &mut self.purge_author,
            FlushRule::Terms => &mut self.purge_terms,
            FlushRule::ArchiveDaily => &mut self.purge_archive_daily,
            FlushRule::ArchiveMonthly => &mut self.purge_archive_monthly,
            FlushRule::ArchiveYearly => &mut self.purge_archive_yearly,
            FlushRule::FeedBlog => &mut self.purge_feed_blog,
            FlushRule::FeedComments => &mut self.purge_feed_comments,
            FlushRule::FeedAuthor => &mut self.purge_feed_author,
            FlushRule::FeedTerms => &mut self.purge_feed_terms,
        };
        *flag = enabled;
    }

    /// Returns true if the home URL is served over TLS.
    pub fn is_https(&self) -> bool {
        self.home_url
            .get(..6)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("https:"))
    }

    /// Returns the archive page limit, clamping to 1 if zero.
    pub fn postpages_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.postpages_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Compile `sitemap_regex`, if set.
    pub fn sitemap_pattern(&self) -> Result<Option<Regex>, regex::Error> {
        self.sitemap_regex.as_deref().map(Regex::new).transpose()
    }

    /// Returns the memory store limit, clamping to 1 if zero.
    pub fn memory_store_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_store_limit).unwrap_or(NonZeroUsize::MIN)
    }

    fn encryptions(&self) -> Vec<&str> {
        if self.is_https() || self.cache_ssl {
            vec!["ssl"]
        } else {
            Vec::new()
        }
    }
}

impl DimensionConfig for FlushConfig {
    fn active_values(&self, dimension: Dimension) -> Vec<String> {
        let configured: Vec<&str> = match dimension {
            Dimension::Device => self.device_groups.iter().map(String::as_str).collect(),
            Dimension::Referrer => self.referrer_groups.iter().map(String::as_str).collect(),
            Dimension::Cookie if self.cookie_groups_enabled => {
                self.cookie_groups.iter().map(String::as_str).collect()
            }
            Dimension::Cookie => Vec::new(),
            Dimension::Encryption => self.encryptions(),
            Dimension::Compression => self.compressions.iter().map(String::as_str).collect(),
        };

        let mut values = vec![String::new()];
        for value in configured {
            if !value.is_empty() && !values.iter().any(|v| v == value) {
                values.push(value.to_string());
            }
        }
        values
    }

    fn rules_enabled(&self) -> BTreeSet<FlushRule> {
        [
            (FlushRule::Home, self.purge_home),
            (FlushRule::FrontPage, self.purge_front_page),
            (FlushRule::PostUrl, self.purge_post),
            (FlushRule::Comments, self.purge_comments),
            (FlushRule::Author, self.purge_author),
            (FlushRule::Terms, self.purge_terms),
            (FlushRule::ArchiveDaily, self.purge_archive_daily),
            (FlushRule::ArchiveMonthly, self.purge_archive_monthly),
            (FlushRule::ArchiveYearly, self.purge_archive_yearly),
            (FlushRule::FeedBlog, self.purge_feed_blog),
            (FlushRule::FeedComments, self.purge_feed_comments),
            (FlushRule::FeedAuthor, self.purge_feed_author),
            (FlushRule::FeedTerms, self.purge_feed_terms),
        ]
        .into_iter()
        .filter_map(|(rule, enabled)| enabled.then_some(rule))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = FlushConfig::default();
        assert!(config.purge_home);
        assert!(config.purge_post);
        assert!(config.purge_feed_blog);
        assert!(!config.purge_terms);
        assert_eq!(config.feed_types, vec!["rss2".to_string()]);
        assert_eq!(config.postpages_limit, 10);
        assert!(config.sitemap_regex.is_none());
        assert_eq!(config.front_page, FrontPage::Posts);
    }

    #[test]
    fn default_tag_is_always_first() {
        let config = FlushConfig {
            device_groups: vec!["mobile".to_string(), "tablet".to_string()],
            ..Default::default()
        };
        assert_eq!(
            config.active_values(Dimension::Device),
            vec!["".to_string(), "mobile".to_string(), "tablet".to_string()]
        );
        assert_eq!(config.active_values(Dimension::Referrer), vec![String::new()]);
    }

    #[test]
    fn configured_values_are_deduplicated() {
        let config = FlushConfig {
            compressions: vec![
                "gzip".to_string(),
                "".to_string(),
                "gzip".to_string(),
                "br".to_string(),
            ],
            ..Default::default()
        };
        assert_eq!(
            config.active_values(Dimension::Compression),
            vec!["".to_string(), "gzip".to_string(), "br".to_string()]
        );
    }

    #[test]
    fn cookie_groups_need_the_toggle() {
        let mut config = FlushConfig {
            cookie_groups: vec!["members".to_string()],
            ..Default::default()
        };
        assert_eq!(config.active_values(Dimension::Cookie).len(), 1);

        config.cookie_groups_enabled = true;
        assert_eq!(config.active_values(Dimension::Cookie).len(), 2);
    }

    #[test]
    fn encryption_follows_home_scheme_and_ssl_caching() {
        let plain = FlushConfig::default();
        assert_eq!(plain.active_values(Dimension::Encryption), vec![String::new()]);

        let https = FlushConfig {
            home_url: "HTTPS://example.com/".to_string(),
            ..Default::default()
        };
        assert!(https.is_https());
        assert_eq!(https.active_values(Dimension::Encryption).len(), 2);

        let ssl_cached = FlushConfig {
            cache_ssl: true,
            ..Default::default()
        };
        assert_eq!(
            ssl_cached.active_values(Dimension::Encryption),
            vec!["".to_string(), "ssl".to_string()]
        );
    }

    #[test]
    fn rules_enabled_reflects_toggles() {
        let mut config = FlushConfig::without_rules();
        assert!(config.rules_enabled().is_empty());

        config.set_rule(FlushRule::Terms, true);
        config.set_rule(FlushRule::PostUrl, true);
        let rules = config.rules_enabled();
        assert_eq!(rules.len(), 2);
        assert!(rules.contains(&FlushRule::Terms));
        assert!(rules.contains(&FlushRule::PostUrl));
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = FlushConfig {
            postpages_limit: 0,
            memory_store_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.postpages_limit_non_zero().get(), 1);
        assert_eq!(config.memory_store_limit_non_zero().get(), 1);
    }
}
