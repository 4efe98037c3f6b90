//! Ordered storage for an object's own properties.
//!
//! `OwnPropertyKeys` (spec.md §4.2) requires integer-index keys first in
//! ascending numeric order, then string keys in insertion order, then
//! symbol keys in insertion order. `indexmap::IndexMap` gives us
//! insertion order for free; we keep indices in a separate sorted map so
//! we never have to re-sort the whole table on enumeration.

use crate::property::{PropertyDescriptor, PropertyKey};
use gc::{custom_trace, Finalize, Trace};
use indexmap::IndexMap;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct PropertyMap {
    indexed: BTreeMap<u32, PropertyDescriptor>,
    strings: IndexMap<crate::string::JsString, PropertyDescriptor>,
    symbols: IndexMap<crate::symbol::JsSymbol, PropertyDescriptor>,
}

impl Finalize for PropertyMap {}
unsafe impl Trace for PropertyMap {
    custom_trace!(this, {
        for v in this.indexed.values() {
            mark(v);
        }
        for (k, v) in this.strings.iter() {
            mark(k);
            mark(v);
        }
        for (k, v) in this.symbols.iter() {
            mark(k);
            mark(v);
        }
    });
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        match key {
            PropertyKey::String(s) => match s.as_array_index_str() {
                Some(i) => self.indexed.get(&i),
                None => self.strings.get(s),
            },
            PropertyKey::Symbol(s) => self.symbols.get(s),
        }
    }

    pub fn contains_key(&self, key: &PropertyKey) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&mut self, key: PropertyKey, desc: PropertyDescriptor) {
        match key {
            PropertyKey::String(s) => match s.as_array_index_str() {
                Some(i) => {
                    self.indexed.insert(i, desc);
                }
                None => {
                    self.strings.insert(s, desc);
                }
            },
            PropertyKey::Symbol(s) => {
                self.symbols.insert(s, desc);
            }
        }
    }

    pub fn remove(&mut self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        match key {
            PropertyKey::String(s) => match s.as_array_index_str() {
                Some(i) => self.indexed.remove(&i),
                None => self.strings.shift_remove(s),
            },
            PropertyKey::Symbol(s) => self.symbols.shift_remove(s),
        }
    }

    /// `OwnPropertyKeys` ordering: indices ascending, then strings, then
    /// symbols, each in insertion order.
    pub fn keys(&self) -> Vec<PropertyKey> {
        let mut out = Vec::with_capacity(self.indexed.len() + self.strings.len() + self.symbols.len());
        out.extend(self.indexed.keys().map(|i| PropertyKey::from(*i)));
        out.extend(self.strings.keys().cloned().map(PropertyKey::String));
        out.extend(self.symbols.keys().cloned().map(PropertyKey::Symbol));
        out
    }

    pub fn string_keys(&self) -> impl Iterator<Item = &crate::string::JsString> {
        self.strings.keys()
    }

    pub fn index_keys(&self) -> impl Iterator<Item = u32> + '_ {
        self.indexed.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.indexed.len() + self.strings.len() + self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
