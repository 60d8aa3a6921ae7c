//! Route lookup.
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks); reloads build a new table
//! - Longest matching prefix wins; ties go to the entry declared first
//! - Explicit no-match rather than silent default

use crate::config::RouteConfig;
use crate::routing::matcher::PathPrefixMatcher;

/// One prefix → service mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub name: String,
    pub matcher: PathPrefixMatcher,
    /// Logical backend service name.
    pub backend: String,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    /// Sorted by specificity, most specific first.
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn from_config(routes: &[RouteConfig]) -> Self {
        let mut entries: Vec<RouteEntry> = routes
            .iter()
            .map(|r| RouteEntry {
                name: r.name.clone(),
                matcher: PathPrefixMatcher::new(r.path_prefix.clone()),
                backend: r.backend.clone(),
            })
            .collect();
        // Stable sort keeps declaration order among equal prefixes.
        entries.sort_by(|a, b| b.matcher.specificity().cmp(&a.matcher.specificity()));
        Self { entries }
    }

    /// Find the route for an inbound path.
    pub fn resolve(&self, path: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| e.matcher.matches(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
