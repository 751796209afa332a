//! Per-layer route lookup structures.
//!
//! A [`RouteIndex`] maps `(method, canonical path)` to every record observed
//! for that route — a list, since multiple call sites can hit one route.
//! Normalization is applied uniformly here, so no caller ever compares raw
//! paths. Indexes are read-only after construction.

use crate::normalize::{normalize, CanonicalPath};
use crate::record::{Layer, RouteRecord};
use http::Method;
use std::collections::HashMap;
use tracing::info;

/// Identity key for route matching
pub type RouteKey = (Method, CanonicalPath);

/// `(method, canonical path) → records` for one layer
#[derive(Debug, Clone)]
pub struct RouteIndex {
    layer: Layer,
    entries: HashMap<RouteKey, Vec<RouteRecord>>,
}

impl RouteIndex {
    /// Build the index for one layer, canonicalizing every record's path.
    ///
    /// Records under one key are ordered by (file, line) so downstream
    /// iteration is deterministic regardless of scan order.
    #[must_use]
    pub fn build(layer: Layer, records: Vec<RouteRecord>) -> Self {
        let mut entries: HashMap<RouteKey, Vec<RouteRecord>> = HashMap::new();
        for record in records {
            let key = (record.method.clone(), normalize(&record.raw_path));
            entries.entry(key).or_default().push(record);
        }
        for records in entries.values_mut() {
            records.sort_by(|a, b| {
                (&a.source_file, a.source_line).cmp(&(&b.source_file, b.source_line))
            });
        }

        info!(
            layer = %layer,
            routes = entries.len(),
            records = entries.values().map(Vec::len).sum::<usize>(),
            "Route index built"
        );

        RouteIndex { layer, entries }
    }

    /// Which layer this index describes
    #[must_use]
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Records for an exact `(method, canonical path)` key
    #[must_use]
    pub fn get(&self, method: &Method, path: &CanonicalPath) -> Option<&[RouteRecord]> {
        self.entries
            .get(&(method.clone(), path.clone()))
            .map(Vec::as_slice)
    }

    /// True when the exact key is present
    #[must_use]
    pub fn contains(&self, method: &Method, path: &CanonicalPath) -> bool {
        self.entries.contains_key(&(method.clone(), path.clone()))
    }

    /// Methods declared for a canonical path, ignoring the method part of the
    /// key. Sorted and deduplicated; used for the method-mismatch tie-break.
    #[must_use]
    pub fn methods_for_path(&self, path: &CanonicalPath) -> Vec<Method> {
        let mut methods: Vec<Method> = self
            .entries
            .keys()
            .filter(|(_, p)| p == path)
            .map(|(m, _)| m.clone())
            .collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods.dedup();
        methods
    }

    /// Keys in deterministic (path, method) order
    #[must_use]
    pub fn keys_sorted(&self) -> Vec<&RouteKey> {
        let mut keys: Vec<&RouteKey> = self.entries.keys().collect();
        keys.sort_by(|(ma, pa), (mb, pb)| pa.cmp(pb).then_with(|| ma.as_str().cmp(mb.as_str())));
        keys
    }

    /// Iterate `(key, records)` in deterministic order
    pub fn iter_sorted(&self) -> impl Iterator<Item = (&RouteKey, &[RouteRecord])> {
        self.keys_sorted().into_iter().map(move |k| {
            // Key came from the map, lookup cannot miss.
            let records = self.entries.get(k).map(Vec::as_slice).unwrap_or(&[]);
            (k, records)
        })
    }

    /// Number of distinct routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the layer produced no routes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
