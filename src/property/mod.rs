//! Property keys and property descriptors. See spec.md §3 ("Property
//! Key", "Property Descriptor").

mod attribute;
pub use attribute::Attribute;

use crate::{object::JsObject, string::JsString, symbol::JsSymbol, value::JsValue};
use gc::{Finalize, Trace};
use std::fmt;

/// A property key: either a string or a symbol. Array-index keys are
/// strings whose normalized form is a non-negative integer below
/// `2^32 - 1`; `as_array_index` recognizes that subset.
#[derive(Debug, Clone, Trace, Finalize, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(JsString),
    Symbol(JsSymbol),
}

impl PropertyKey {
    /// Returns the numeric array index this key denotes, if it is a
    /// canonical one (no leading zeros other than bare `"0"`, no sign, in
    /// range). Used to order indexed keys ahead of string keys in
    /// `OwnPropertyKeys` (spec.md §3, §4.2).
    pub fn as_array_index(&self) -> Option<u32> {
        match self {
            Self::String(s) => s.as_array_index_str(),
            Self::Symbol(_) => None,
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{}", s),
            Self::Symbol(s) => write!(
                f,
                "Symbol({})",
                s.description().map(ToString::to_string).unwrap_or_default()
            ),
        }
    }
}

impl From<JsString> for PropertyKey {
    fn from(s: JsString) -> Self {
        Self::String(s)
    }
}
impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::String(JsString::from(s))
    }
}
impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self::String(JsString::from(s))
    }
}
impl From<JsSymbol> for PropertyKey {
    fn from(s: JsSymbol) -> Self {
        Self::Symbol(s)
    }
}
impl From<u32> for PropertyKey {
    fn from(n: u32) -> Self {
        Self::String(JsString::from(n.to_string()))
    }
}

/// A data descriptor: `{ value, writable, enumerable, configurable }`.
#[derive(Debug, Clone, Trace, Finalize)]
pub struct DataDescriptor {
    pub value: JsValue,
    pub attributes: Attribute,
}

/// An accessor descriptor: `{ get, set, enumerable, configurable }`.
/// `writable` has no meaning here (spec.md §3).
#[derive(Debug, Clone, Trace, Finalize)]
pub struct AccessorDescriptor {
    pub get: Option<JsObject>,
    pub set: Option<JsObject>,
    pub enumerable: bool,
    pub configurable: bool,
}

/// A property descriptor as stored on an object: one of the two concrete
/// shapes. Reconfiguration between them is only legal while the existing
/// descriptor is `configurable` (spec.md §3 invariant).
#[derive(Debug, Clone, Trace, Finalize)]
pub enum PropertyDescriptor {
    Data(DataDescriptor),
    Accessor(AccessorDescriptor),
}

impl PropertyDescriptor {
    pub fn data(value: impl Into<JsValue>, attributes: Attribute) -> Self {
        Self::Data(DataDescriptor {
            value: value.into(),
            attributes,
        })
    }

    pub fn accessor(
        get: Option<JsObject>,
        set: Option<JsObject>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self::Accessor(AccessorDescriptor {
            get,
            set,
            enumerable,
            configurable,
        })
    }

    pub fn is_data_descriptor(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        matches!(self, Self::Accessor(_))
    }

    pub fn enumerable(&self) -> bool {
        match self {
            Self::Data(d) => d.attributes.enumerable(),
            Self::Accessor(a) => a.enumerable,
        }
    }

    pub fn set_enumerable(&mut self, value: bool) {
        match self {
            Self::Data(d) => d.attributes.set_enumerable(value),
            Self::Accessor(a) => a.enumerable = value,
        }
    }

    pub fn configurable(&self) -> bool {
        match self {
            Self::Data(d) => d.attributes.configurable(),
            Self::Accessor(a) => a.configurable,
        }
    }

    pub fn set_configurable(&mut self, value: bool) {
        match self {
            Self::Data(d) => d.attributes.set_configurable(value),
            Self::Accessor(a) => a.configurable = value,
        }
    }

    pub fn writable(&self) -> Option<bool> {
        match self {
            Self::Data(d) => Some(d.attributes.writable()),
            Self::Accessor(_) => None,
        }
    }

    pub fn value(&self) -> Option<&JsValue> {
        match self {
            Self::Data(d) => Some(&d.value),
            Self::Accessor(_) => None,
        }
    }

    pub fn getter(&self) -> Option<&JsObject> {
        match self {
            Self::Accessor(a) => a.get.as_ref(),
            Self::Data(_) => None,
        }
    }

    pub fn setter(&self) -> Option<&JsObject> {
        match self {
            Self::Accessor(a) => a.set.as_ref(),
            Self::Data(_) => None,
        }
    }
}

/// A partial descriptor as supplied to `Object.defineProperty`: every
/// field may be present or absent (spec.md §3). Absent fields default per
/// the `[[DefineOwnProperty]]` algorithm in spec.md §4.2.
#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptorBuilder {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    pub get: Option<Option<JsObject>>,
    pub set: Option<Option<JsObject>>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptorBuilder {
    pub fn is_accessor_request(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_data_request(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn is_generic_request(&self) -> bool {
        !self.is_accessor_request() && !self.is_data_request()
    }
}
