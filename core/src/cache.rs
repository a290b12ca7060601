//! Client-side query cache keyed by query parameters.
//!
//! # Design
//! A key is an ordered list of segments, so invalidation can target every
//! key under a prefix (e.g. all `users` queries at once). Invalidated
//! entries are kept but flagged stale: readers may still show them while a
//! refetch is in flight. Writes always replace, so the last write wins.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(root: &str) -> Self {
        Self(vec![root.to_string()])
    }

    pub fn segment(mut self, segment: impl fmt::Display) -> Self {
        self.0.push(segment.to_string());
        self
    }

    pub fn with(self, name: &str, value: impl fmt::Display) -> Self {
        self.segment(format!("{name}={value}"))
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<'a, V> {
    Fresh(&'a V),
    Stale(&'a V),
    Missing,
}

impl<'a, V> Lookup<'a, V> {
    pub fn value(&self) -> Option<&'a V> {
        match *self {
            Lookup::Fresh(v) | Lookup::Stale(v) => Some(v),
            Lookup::Missing => None,
        }
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    stale: bool,
}

#[derive(Debug)]
pub struct QueryCache<V> {
    entries: HashMap<QueryKey, Entry<V>>,
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> QueryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, key: &QueryKey) -> Lookup<'_, V> {
        match self.entries.get(key) {
            Some(entry) if entry.stale => Lookup::Stale(&entry.value),
            Some(entry) => Lookup::Fresh(&entry.value),
            None => Lookup::Missing,
        }
    }

    pub fn insert(&mut self, key: QueryKey, value: V) {
        self.entries.insert(key, Entry { value, stale: false });
    }

    /// Mark every entry under `prefix` stale. Returns the number of entries
    /// touched.
    pub fn invalidate(&mut self, prefix: &QueryKey) -> usize {
        let mut touched = 0;
        for (key, entry) in self.entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                touched += 1;
            }
        }
        tracing::debug!(prefix = %prefix, touched, "invalidated cached queries");
        touched
    }

}
