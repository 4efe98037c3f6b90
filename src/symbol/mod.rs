//! The `Symbol` primitive type and the realm's well-known symbols. See
//! spec.md §3 ("Property Key") and §4.3 (`Symbol` builtin).
//!
//! Every symbol is unique by identity, not by description; two symbols
//! with the same `description` are still distinct property keys. We give
//! each symbol a realm-scoped incrementing hash rather than comparing by
//! pointer, since that also gives us a cheap
//! `Hash`/`Eq` impl for use as an `IndexMap` key.

use crate::string::JsString;
use gc::{Finalize, Trace};
use std::{
    hash::{Hash, Hasher},
    rc::Rc,
};

#[derive(Debug, Trace, Finalize)]
struct SymbolData {
    id: u64,
    description: Option<JsString>,
}

/// A reference-counted JS `Symbol`. Cloning a `JsSymbol` yields another
/// handle to the *same* symbol (`Rc` identity), matching the spec's "every
/// symbol value is unique" invariant: only the original `Symbol(...)` call
/// (or a well-known symbol lookup) produces a fresh one.
#[derive(Debug, Clone, Trace, Finalize)]
pub struct JsSymbol(Rc<SymbolData>);

impl JsSymbol {
    pub(crate) fn new(id: u64, description: Option<JsString>) -> Self {
        Self(Rc::new(SymbolData { id, description }))
    }

    pub fn description(&self) -> Option<&JsString> {
        self.0.description.as_ref()
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for JsSymbol {}

impl Hash for JsSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

/// The symbols every realm must expose as `Symbol.iterator` etc. (spec.md
/// §4.3), cached once at realm construction.
#[derive(Debug, Clone)]
pub struct WellKnownSymbols {
    pub async_iterator: JsSymbol,
    pub has_instance: JsSymbol,
    pub is_concat_spreadable: JsSymbol,
    pub iterator: JsSymbol,
    pub match_: JsSymbol,
    pub match_all: JsSymbol,
    pub replace: JsSymbol,
    pub search: JsSymbol,
    pub species: JsSymbol,
    pub split: JsSymbol,
    pub to_primitive: JsSymbol,
    pub to_string_tag: JsSymbol,
    pub unscopables: JsSymbol,
}

impl WellKnownSymbols {
    /// Builds the table, returning the next free symbol-hash counter value
    /// so the owning realm can keep allocating unique ids afterward.
    pub(crate) fn new() -> (Self, u64) {
        let mut next = 0u64;
        let mut make = |desc: &str| {
            let sym = JsSymbol::new(next, Some(JsString::from(desc)));
            next += 1;
            sym
        };
        let table = Self {
            async_iterator: make("Symbol.asyncIterator"),
            has_instance: make("Symbol.hasInstance"),
            is_concat_spreadable: make("Symbol.isConcatSpreadable"),
            iterator: make("Symbol.iterator"),
            match_: make("Symbol.match"),
            match_all: make("Symbol.matchAll"),
            replace: make("Symbol.replace"),
            search: make("Symbol.search"),
            species: make("Symbol.species"),
            split: make("Symbol.split"),
            to_primitive: make("Symbol.toPrimitive"),
            to_string_tag: make("Symbol.toStringTag"),
            unscopables: make("Symbol.unscopables"),
        };
        (table, next)
    }
}
