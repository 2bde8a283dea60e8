//! Navigation audit log
//!
//! Every accepted `navigate` appends one [`HistoryEntry`]. Entries are never
//! removed or reordered; back/forward movement is the location provider's
//! business (see [`MemoryLocation`](crate::location::MemoryLocation)).

use crate::params::QueryParams;

/// One accepted navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Canonical query that was pushed to the location
    pub query: QueryParams,
}

impl HistoryEntry {
    pub fn new(query: QueryParams) -> Self {
        Self { query }
    }

    /// Route name carried under `route_key`
    pub fn route<'a>(&'a self, route_key: &str) -> Option<&'a str> {
        self.query.get(route_key)
    }
}

/// Append-only navigation log
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, query: QueryParams) {
        self.entries.push(HistoryEntry::new(query));
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
