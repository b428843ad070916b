//! Content resolver interface.
//!
//! The host's content store is consumed read-only through `ContentResolver`,
//! which turns a content identifier into the canonical URLs that render it.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use tracing::warn;

use super::error::ResolutionError;

/// Upper bound on ancestor-walk rounds. Real taxonomies are far shallower.
pub const MAX_TERM_DEPTH: usize = 64;

/// Identifier of a post, page or custom-type item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentId(pub u64);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ContentId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A taxonomy term attached to content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    pub id: u64,
    /// `None` for root terms.
    pub parent_id: Option<u64>,
    pub taxonomy: String,
}

impl Term {
    /// Build a term; a parent of `0` marks a root term.
    pub fn new(id: u64, parent_id: u64, taxonomy: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: (parent_id != 0).then_some(parent_id),
            taxonomy: taxonomy.into(),
        }
    }
}

/// The facts about a content item that URL derivation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub id: ContentId,
    pub author_id: u64,
    pub post_type: String,
    /// Registered by an extension rather than built in.
    pub custom_type: bool,
}

/// Granularity of a date archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateGranularity {
    Day,
    Month,
    Year,
}

/// Read-only view of the host's content store.
pub trait ContentResolver: Send + Sync {
    /// Whether URL routing is initialised. Content flushes fail before then.
    fn routing_ready(&self) -> bool {
        true
    }

    fn content(&self, id: ContentId) -> Result<Option<ContentRecord>, ResolutionError>;

    /// Terms directly attached to `id`.
    fn content_terms(&self, id: ContentId) -> Result<Vec<Term>, ResolutionError>;

    /// Look up terms by id, restricted to `taxonomies`.
    fn terms_by_ids(&self, ids: &[u64], taxonomies: &[String]) -> Vec<Term>;

    /// Front page plus its paginated pages.
    fn home_urls(&self, limit: usize) -> Vec<String>;

    /// Posts page when the front page is static.
    fn posts_page_urls(&self, _limit: usize) -> Vec<String> {
        Vec::new()
    }

    /// Archive of a custom post type.
    fn post_type_archive_urls(&self, _id: ContentId, _limit: usize) -> Vec<String> {
        Vec::new()
    }

    fn post_urls(&self, id: ContentId) -> Vec<String>;

    fn comment_urls(&self, id: ContentId) -> Vec<String>;

    fn author_urls(&self, author_id: u64, limit: usize) -> Vec<String>;

    fn term_urls(&self, terms: &[Term], limit: usize) -> Vec<String>;

    fn date_archive_urls(&self, id: ContentId, granularity: DateGranularity) -> Vec<String>;

    /// Blog feeds, or the feeds of `content_type` when given.
    fn feed_urls(&self, feed_types: &[String], content_type: Option<&str>) -> Vec<String>;

    fn comment_feed_urls(&self, _id: ContentId, _feed_types: &[String]) -> Vec<String> {
        Vec::new()
    }

    fn author_feed_urls(&self, _author_id: u64, _feed_types: &[String]) -> Vec<String> {
        Vec::new()
    }

    fn term_feed_urls(&self, _terms: &[Term], _feed_types: &[String]) -> Vec<String> {
        Vec::new()
    }

    /// Absolute URLs of configured always-purge pages.
    fn page_urls(&self, pages: &[String]) -> Vec<String> {
        pages.to_vec()
    }

    /// Mirror-domain copies of `urls`; only the additions are returned.
    fn mirror_urls(&self, _urls: &[String]) -> Vec<String> {
        Vec::new()
    }

    /// `terms` plus every ancestor, walked breadth-first.
    ///
    /// Each parent id is looked up at most once, so the walk terminates even
    /// if the parent relation contains a cycle; it also stops after
    /// `MAX_TERM_DEPTH` rounds.
    fn ancestor_terms(&self, terms: &[Term]) -> Vec<Term> {
        let mut closure: Vec<Term> = terms.to_vec();
        let mut visited: HashSet<u64> = terms.iter().map(|t| t.id).collect();
        let mut frontier: Vec<Term> = terms.to_vec();

        for _ in 0..MAX_TERM_DEPTH {
            let mut parent_ids = BTreeSet::new();
            let mut taxonomies = BTreeSet::new();
            for term in &frontier {
                if let Some(parent) = term.parent_id
                    && !visited.contains(&parent)
                {
                    parent_ids.insert(parent);
                    taxonomies.insert(term.taxonomy.clone());
                }
            }

            if parent_ids.is_empty() {
                return closure;
            }

            let ids: Vec<u64> = parent_ids.into_iter().collect();
            let taxonomies: Vec<String> = taxonomies.into_iter().collect();
            visited.extend(ids.iter().copied());

            frontier = self
                .terms_by_ids(&ids, &taxonomies)
                .into_iter()
                .filter(|term| ids.contains(&term.id))
                .collect();
            closure.extend(frontier.iter().cloned());
        }

        warn!(
            max_depth = MAX_TERM_DEPTH,
            terms = closure.len(),
            "Ancestor term walk hit depth bound"
        );
        closure
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct TermTable {
        terms: HashMap<u64, Term>,
        lookups: AtomicUsize,
    }

    impl TermTable {
        fn new(terms: Vec<Term>) -> Self {
            Self {
                terms: terms.into_iter().map(|t| (t.id, t)).collect(),
                lookups: AtomicUsize::new(0),
            }
        }
    }

    impl ContentResolver for TermTable {
        fn content(&self, _id: ContentId) -> Result<Option<ContentRecord>, ResolutionError> {
            Ok(None)
        }

        fn content_terms(&self, _id: ContentId) -> Result<Vec<Term>, ResolutionError> {
            Ok(Vec::new())
        }

        fn terms_by_ids(&self, ids: &[u64], _taxonomies: &[String]) -> Vec<Term> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            ids.iter().filter_map(|id| self.terms.get(id).cloned()).collect()
        }

        fn home_urls(&self, _limit: usize) -> Vec<String> {
            Vec::new()
        }

        fn post_urls(&self, _id: ContentId) -> Vec<String> {
            Vec::new()
        }

        fn comment_urls(&self, _id: ContentId) -> Vec<String> {
            Vec::new()
        }

        fn author_urls(&self, _author_id: u64, _limit: usize) -> Vec<String> {
            Vec::new()
        }

        fn term_urls(&self, _terms: &[Term], _limit: usize) -> Vec<String> {
            Vec::new()
        }

        fn date_archive_urls(&self, _id: ContentId, _granularity: DateGranularity) -> Vec<String> {
            Vec::new()
        }

        fn feed_urls(&self, _feed_types: &[String], _content_type: Option<&str>) -> Vec<String> {
            Vec::new()
        }
    }

    fn ids(terms: &[Term]) -> BTreeSet<u64> {
        terms.iter().map(|t| t.id).collect()
    }

    #[test]
    fn root_parent_zero_is_none() {
        assert_eq!(Term::new(1, 0, "category").parent_id, None);
        assert_eq!(Term::new(5, 3, "category").parent_id, Some(3));
    }

    #[test]
    fn ancestors_are_walked_to_the_root() {
        let table = TermTable::new(vec![
            Term::new(5, 3, "category"),
            Term::new(3, 1, "category"),
            Term::new(1, 0, "category"),
        ]);

        let closure = table.ancestor_terms(&[Term::new(5, 3, "category")]);
        assert_eq!(ids(&closure), BTreeSet::from([5, 3, 1]));
        assert_eq!(table.lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn root_terms_need_no_lookup() {
        let table = TermTable::new(Vec::new());
        let closure = table.ancestor_terms(&[Term::new(9, 0, "post_tag")]);
        assert_eq!(ids(&closure), BTreeSet::from([9]));
        assert_eq!(table.lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cycles_terminate() {
        let table = TermTable::new(vec![
            Term::new(1, 2, "category"),
            Term::new(2, 3, "category"),
            Term::new(3, 1, "category"),
        ]);

        let closure = table.ancestor_terms(&[Term::new(1, 2, "category")]);
        assert_eq!(ids(&closure), BTreeSet::from([1, 2, 3]));
        assert_eq!(closure.len(), 3);
    }

    #[test]
    fn shared_parents_are_fetched_once() {
        let table = TermTable::new(vec![Term::new(1, 0, "category")]);
        let closure = table.ancestor_terms(&[
            Term::new(4, 1, "category"),
            Term::new(6, 1, "category"),
        ]);
        assert_eq!(ids(&closure), BTreeSet::from([1, 4, 6]));
        assert_eq!(closure.len(), 3);
        assert_eq!(table.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_parent_ends_the_walk() {
        let table = TermTable::new(Vec::new());
        let closure = table.ancestor_terms(&[Term::new(7, 42, "category")]);
        assert_eq!(ids(&closure), BTreeSet::from([7]));
    }
}
