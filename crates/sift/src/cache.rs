//! Compiled-query cache.
//!
//! Keys are `(query, root type)` with the query compared by alpha
//! equivalence, so `o => o.num > 2` and `x => x.num > 2` share an entry.
//! When the cache is full it is flushed.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use sift_codegen::CompiledQuery;
use sift_parser::Node;
use sift_typeck::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct QueryCache {
    capacity: usize,
    entries: RwLock<FxHashMap<(Node, Type), CompiledQuery>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        QueryCache {
            capacity: capacity.max(1),
            entries: RwLock::new(FxHashMap::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, node: &Node, root: &Type) -> Option<CompiledQuery> {
        let key = (node.clone(), root.clone());
        let found = self.entries.read().get(&key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(query = %node, hit = found.is_some(), "query cache lookup");
        found
    }

    pub fn insert(&self, node: Node, root: Type, query: CompiledQuery) {
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            tracing::debug!(entries = entries.len(), "query cache full, flushing");
            entries.clear();
        }
        entries.insert((node, root), query);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.read().len(),
        }
    }
}
