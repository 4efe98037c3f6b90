//! A `Hash + Eq` wrapper around [`JsValue`] keyed by `SameValueZero`
//! (spec.md §4.1), the comparison `Map`/`Set` use for their keys. Plain
//! `JsValue` can't implement `Hash` itself (`f64`/`Gc` don't), so
//! `Map`/`Set` storage wraps keys in this newtype instead.

use super::{same_value_zero, JsValue};
use gc::{Finalize, Trace};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Trace, Finalize)]
pub struct HashableValue(pub JsValue);

impl PartialEq for HashableValue {
    fn eq(&self, other: &Self) -> bool {
        same_value_zero(&self.0, &other.0)
    }
}
impl Eq for HashableValue {}

impl Hash for HashableValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            JsValue::Undefined => state.write_u8(0),
            JsValue::Null => state.write_u8(1),
            JsValue::Boolean(b) => {
                state.write_u8(2);
                b.hash(state);
            }
            JsValue::Number(n) => {
                state.write_u8(3);
                // Canonicalize NaN and -0 so SameValueZero-equal numbers
                // hash equal.
                if n.is_nan() {
                    state.write_u64(u64::MAX);
                } else if *n == 0.0 {
                    0.0f64.to_bits().hash(state);
                } else {
                    n.to_bits().hash(state);
                }
            }
            JsValue::BigInt(b) => {
                state.write_u8(4);
                b.as_inner().hash(state);
            }
            JsValue::String(s) => {
                state.write_u8(5);
                s.hash(state);
            }
            JsValue::Symbol(s) => {
                state.write_u8(6);
                s.id().hash(state);
            }
            JsValue::Object(o) => {
                state.write_u8(7);
                (o.as_ptr() as usize).hash(state);
            }
        }
    }
}

impl From<JsValue> for HashableValue {
    fn from(v: JsValue) -> Self {
        Self(v)
    }
}
