//! The three equality algorithms spec.md §4.1 and §8 property 5 require:
//! `SameValue`, `SameValueZero`, and strict equality (`===`). Loose
//! equality (`==`) lives in `exec::expression` since it can invoke
//! `ToPrimitive`/`ToNumber` and therefore needs a `&mut Context`.

use super::JsValue;

/// `SameValue` (used by e.g. `Object.is`): like strict equality but
/// `NaN` equals `NaN` and `+0` is distinct from `-0`.
pub fn same_value(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) => {
            if x.is_nan() && y.is_nan() {
                true
            } else if *x == 0.0 && *y == 0.0 {
                x.is_sign_positive() == y.is_sign_positive()
            } else {
                x == y
            }
        }
        _ => strict_equals(a, b),
    }
}

/// `SameValueZero` (used by `Array.prototype.includes`, `Map`/`Set` key
/// comparison): like `SameValue` but `+0` and `-0` are equal.
pub fn same_value_zero(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) => {
            if x.is_nan() && y.is_nan() {
                true
            } else {
                x == y
            }
        }
        _ => strict_equals(a, b),
    }
}

/// `===`: same type, then same value, with the JS rule that `NaN !== NaN`
/// and `+0 === -0` (spec.md §8 property 5).
pub fn strict_equals(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(x), JsValue::Boolean(y)) => x == y,
        (JsValue::Number(x), JsValue::Number(y)) => x == y,
        (JsValue::BigInt(x), JsValue::BigInt(y)) => x == y,
        (JsValue::String(x), JsValue::String(y)) => x == y,
        (JsValue::Symbol(x), JsValue::Symbol(y)) => x == y,
        (JsValue::Object(x), JsValue::Object(y)) => x.ptr_eq(y),
        _ => false,
    }
}
