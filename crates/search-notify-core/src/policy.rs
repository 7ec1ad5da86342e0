//! Header allow policy
//!
//! Decides which request headers are eligible for indexing. A header is
//! retained iff its name matches an exact entry or starts with a
//! configured prefix; everything else is dropped. The default is
//! fail-safe: an empty policy admits nothing.
//!
//! ## Example
//!
//! ```rust,ignore
//! let policy = AllowPolicy::exact(["x-user"]).with_prefix("x-object-meta-");
//! let filtered = policy.filter([("X-User", "alice"), ("X-Other", "drop")]);
//! ```

use crate::error::ConfigError;
use std::collections::{BTreeMap, HashSet};

/// Headers admitted by an [`AllowPolicy`], keyed by their original name.
///
/// Ordered so serialized envelopes are stable and diffable.
pub type FilteredHeaders = BTreeMap<String, String>;

/// Which header names are eligible for indexing.
///
/// Immutable after construction. All entries are normalized to lowercase;
/// matching against request headers is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct AllowPolicy {
    names: HashSet<String>,
    prefixes: Vec<String>,
}

impl AllowPolicy {
    /// Empty policy. Admits nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy admitting the given exact header names
    pub fn exact(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names
                .into_iter()
                .map(|n| n.into().to_ascii_lowercase())
                .collect(),
            prefixes: Vec::new(),
        }
    }

    /// Add a name prefix to admit
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into().to_ascii_lowercase());
        self
    }

    /// Parse the whitespace-separated configuration lists.
    ///
    /// `names` entries are exact header names and must not carry a
    /// wildcard; `prefixes` entries must each be terminated with the `*`
    /// marker, which is stripped. Malformed entries fail construction.
    pub fn from_lists(names: &str, prefixes: &str) -> Result<Self, ConfigError> {
        let mut policy = Self::new();

        for entry in names.split_whitespace() {
            if entry.contains('*') {
                return Err(ConfigError::WildcardInName(entry.to_string()));
            }
            policy.names.insert(entry.to_ascii_lowercase());
        }

        for entry in prefixes.split_whitespace() {
            match entry.strip_suffix('*') {
                Some(prefix) if !prefix.contains('*') => {
                    policy.prefixes.push(prefix.to_ascii_lowercase());
                }
                _ => return Err(ConfigError::PrefixMarker(entry.to_string())),
            }
        }

        Ok(policy)
    }

    /// Check whether the policy admits any header at all
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.prefixes.is_empty()
    }

    /// Check a single header name against the policy
    pub fn admits(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.names.contains(&name) || self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    /// Filter a raw header set down to the admitted entries.
    ///
    /// Pure: builds a fresh map rather than mutating the input. Keys keep
    /// their original case; only the comparison is case-insensitive.
    pub fn filter<'a, I>(&self, headers: I) -> FilteredHeaders
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        headers
            .into_iter()
            .filter(|(name, _)| self.admits(name))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }
}
