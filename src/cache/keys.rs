//! Cache key definitions.
//!
//! Defines `GroupScope` for queued URLs and the `KeyBuilder` contract that
//! maps a (url, variant, group) triple onto a physical cache key.

use std::fmt;

use sha2::{Digest, Sha256};
use url::Url;

use super::variants::{Dimension, Variant};

/// Wire form of the wildcard scope.
pub const WILDCARD: &str = "*";

/// Group scope of a queued URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupScope {
    /// Any group; keys are built with the empty group.
    Any,
    /// A single named group.
    Group(String),
}

impl GroupScope {
    /// Scope for an optional classifier result. Empty names widen to `Any`.
    pub fn from_group(group: Option<String>) -> Self {
        match group {
            Some(name) if !name.is_empty() && name != WILDCARD => GroupScope::Group(name),
            _ => GroupScope::Any,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, GroupScope::Any)
    }

    /// Group name passed to the store (`""` for `Any`).
    pub fn store_group(&self) -> &str {
        match self {
            GroupScope::Any => "",
            GroupScope::Group(name) => name,
        }
    }
}

impl fmt::Display for GroupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupScope::Any => f.write_str(WILDCARD),
            GroupScope::Group(name) => f.write_str(name),
        }
    }
}

/// Builds the physical key for one stored variant of a URL.
///
/// The read path must build keys with the same function, otherwise deletes
/// miss the entries they target.
pub trait KeyBuilder: Send + Sync {
    fn page_key(&self, url: &str, variant: &Variant, group: &str) -> String;
}

/// Default key builder: `"{group}:{sha256}"` over length-prefixed components.
///
/// Components are length-prefixed so that no two distinct inputs hash the
/// same byte stream.
#[derive(Debug, Clone, Default)]
pub struct HashedKeyBuilder;

impl KeyBuilder for HashedKeyBuilder {
    fn page_key(&self, url: &str, variant: &Variant, group: &str) -> String {
        let mut hasher = Sha256::new();
        update_component(&mut hasher, url);
        for dimension in Dimension::ALL {
            update_component(&mut hasher, variant.get(dimension));
        }
        update_component(&mut hasher, group);

        let namespace = if group.is_empty() { "page" } else { group };
        format!("{namespace}:{}", hex::encode(hasher.finalize()))
    }
}

fn update_component(hasher: &mut Sha256, component: &str) {
    hasher.update((component.len() as u64).to_be_bytes());
    hasher.update(component.as_bytes());
}

/// Path plus query of a URL, as seen by the group classifier.
///
/// Relative inputs (`/post-7/?p=1#c`) are accepted as-is minus the fragment.
pub fn request_uri(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        Err(_) => url.split('#').next().unwrap_or_default().to_string(),
    }
}
