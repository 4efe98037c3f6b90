//! Insertion-ordered, GC-traceable map/set storage for `Map`/`Set`
//! (spec.md builtins). A thin wrapper around `indexmap` with a
//! hand-written `Trace` impl, since
//! `indexmap`'s types don't implement it themselves.

use gc::{custom_trace, Finalize, Trace};
use indexmap::{IndexMap, IndexSet};
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct GcOrderedMap<K: Hash + Eq, V>(IndexMap<K, V>);

impl<K: Hash + Eq + Trace, V: Trace> Finalize for GcOrderedMap<K, V> {}
unsafe impl<K: Hash + Eq + Trace, V: Trace> Trace for GcOrderedMap<K, V> {
    custom_trace!(this, {
        for (k, v) in this.0.iter() {
            mark(k);
            mark(v);
        }
    });
}

impl<K: Hash + Eq, V> Default for GcOrderedMap<K, V> {
    fn default() -> Self {
        Self(IndexMap::new())
    }
}

impl<K: Hash + Eq, V> GcOrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn get(&self, key: &K) -> Option<&V> {
        self.0.get(key)
    }
    pub fn contains_key(&self, key: &K) -> bool {
        self.0.contains_key(key)
    }
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.0.insert(key, value)
    }
    pub fn shift_remove(&mut self, key: &K) -> Option<V> {
        self.0.shift_remove(key)
    }
    pub fn clear(&mut self) {
        self.0.clear();
    }
    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.0.iter()
    }
}

#[derive(Debug, Clone)]
pub struct GcOrderedSet<T: Hash + Eq>(IndexSet<T>);

impl<T: Hash + Eq + Trace> Finalize for GcOrderedSet<T> {}
unsafe impl<T: Hash + Eq + Trace> Trace for GcOrderedSet<T> {
    custom_trace!(this, {
        for v in this.0.iter() {
            mark(v);
        }
    });
}

impl<T: Hash + Eq> Default for GcOrderedSet<T> {
    fn default() -> Self {
        Self(IndexSet::new())
    }
}

impl<T: Hash + Eq> GcOrderedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn contains(&self, value: &T) -> bool {
        self.0.contains(value)
    }
    pub fn insert(&mut self, value: T) -> bool {
        self.0.insert(value)
    }
    pub fn shift_remove(&mut self, value: &T) -> bool {
        self.0.shift_remove(value)
    }
    pub fn clear(&mut self) {
        self.0.clear();
    }
    pub fn iter(&self) -> indexmap::set::Iter<'_, T> {
        self.0.iter()
    }
}
