//! Entry names hidden from listings and searches.

use std::collections::BTreeSet;
use std::sync::Arc;

/// Immutable set of excluded entry names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet(Arc<BTreeSet<String>>);

impl ExclusionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Arc::new(names.into_iter().map(Into::into).collect()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Visibility test applied before an entry is considered at all.
///
/// Excluded directories are never descended into because traversal asks
/// this filter first.
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    set: ExclusionSet,
}

impl ExclusionFilter {
    pub fn new(set: ExclusionSet) -> Self {
        Self { set }
    }

    /// Exact, case-sensitive membership test.
    pub fn is_visible(&self, name: &str) -> bool {
        !self.set.contains(name)
    }
}
