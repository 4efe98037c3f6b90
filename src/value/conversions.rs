//! Abstract conversion operations: `ToBoolean`, `ToNumber`, `ToString`,
//! `ToObject`, `ToPropertyKey`, and the integer conversions (`ToInt32`,
//! `ToUint32`, `ToInteger`) from spec.md §4.1.

use super::JsValue;
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::JsObject,
    property::PropertyKey,
    string::JsString,
};

/// Which method `OrdinaryToPrimitive` tries first: `valueOf` then
/// `toString`, or the reverse (spec.md §4.3, `ToPrimitive`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
    String,
}

pub trait ToPropertyKeyExt {
    fn to_property_key(&self, context: &mut Context) -> JsResult<PropertyKey>;
}

impl JsValue {
    /// `ToBoolean`: never fails, never calls user code.
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::BigInt(b) => b.as_inner() != &num_bigint::BigInt::from(0),
            Self::String(s) => !s.is_empty(),
            Self::Symbol(_) | Self::Object(_) => true,
        }
    }

    /// `ToPrimitive` (spec.md §4.3): for objects, asks `Symbol.toPrimitive`
    /// first, then falls back to the ordinary `valueOf`/`toString` order
    /// selected by `hint`.
    pub fn to_primitive(&self, context: &mut Context, hint: PreferredType) -> JsResult<JsValue> {
        let Self::Object(obj) = self else {
            return Ok(self.clone());
        };

        let exotic = obj.get(
            context.well_known_symbols().to_primitive.clone().into(),
            context,
        )?;
        if let Some(f) = exotic.as_object().filter(|o| o.is_callable()) {
            let hint_str = match hint {
                PreferredType::Default => "default",
                PreferredType::Number => "number",
                PreferredType::String => "string",
            };
            let result = f.call(self, &[JsValue::string(hint_str)], context)?;
            if !result.is_object() {
                return Ok(result);
            }
            return Err(JsNativeError::typ()
                .with_message("Symbol.toPrimitive returned an object")
                .into());
        }

        let hint = if hint == PreferredType::Default {
            PreferredType::Number
        } else {
            hint
        };
        context.ordinary_to_primitive(obj, hint)
    }

    /// `ToNumber` (spec.md §4.1).
    pub fn to_number(&self, context: &mut Context) -> JsResult<f64> {
        match self {
            Self::Undefined => Ok(f64::NAN),
            Self::Null => Ok(0.0),
            Self::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Self::Number(n) => Ok(*n),
            Self::String(s) => Ok(string_to_number(&s.to_string_lossy())),
            Self::BigInt(_) => Err(JsNativeError::typ()
                .with_message("Cannot convert a BigInt value to a number")
                .into()),
            Self::Symbol(_) => Err(JsNativeError::typ()
                .with_message("Cannot convert a Symbol value to a number")
                .into()),
            Self::Object(_) => {
                let prim = self.to_primitive(context, PreferredType::Number)?;
                prim.to_number(context)
            }
        }
    }

    pub fn to_int32(&self, context: &mut Context) -> JsResult<i32> {
        Ok(f64_to_int32(self.to_number(context)?))
    }

    pub fn to_uint32(&self, context: &mut Context) -> JsResult<u32> {
        Ok(f64_to_uint32(self.to_number(context)?))
    }

    /// `ToIntegerOrInfinity`: truncates toward zero after `ToNumber`;
    /// `NaN` becomes `0`.
    pub fn to_integer_or_infinity(&self, context: &mut Context) -> JsResult<f64> {
        let n = self.to_number(context)?;
        if n.is_nan() {
            Ok(0.0)
        } else if n.is_infinite() {
            Ok(n)
        } else {
            Ok(n.trunc())
        }
    }

    pub fn to_length(&self, context: &mut Context) -> JsResult<usize> {
        let n = self.to_integer_or_infinity(context)?;
        Ok(n.clamp(0.0, (2f64.powi(53)) - 1.0) as usize)
    }

    /// `ToString` (spec.md §4.1); throws for symbols (use
    /// `String(symbol)` or `.description` explicitly in JS for that).
    pub fn to_js_string(&self, context: &mut Context) -> JsResult<JsString> {
        match self {
            Self::Undefined => Ok(JsString::from("undefined")),
            Self::Null => Ok(JsString::from("null")),
            Self::Boolean(b) => Ok(JsString::from(if *b { "true" } else { "false" })),
            Self::Number(n) => Ok(JsString::from(number_to_js_string(*n))),
            Self::BigInt(b) => Ok(JsString::from(b.to_js_string())),
            Self::String(s) => Ok(s.clone()),
            Self::Symbol(_) => Err(JsNativeError::typ()
                .with_message("Cannot convert a Symbol value to a string")
                .into()),
            Self::Object(_) => {
                let prim = self.to_primitive(context, PreferredType::String)?;
                prim.to_js_string(context)
            }
        }
    }

    /// `ToObject` (spec.md §4.1): wraps primitives, throws for
    /// `null`/`undefined`.
    pub fn to_object(&self, context: &mut Context) -> JsResult<JsObject> {
        match self {
            Self::Undefined | Self::Null => Err(JsNativeError::typ()
                .with_message("Cannot convert undefined or null to object")
                .into()),
            Self::Object(o) => Ok(o.clone()),
            Self::Boolean(b) => Ok(context.new_boolean_object(*b)),
            Self::Number(n) => Ok(context.new_number_object(*n)),
            Self::String(s) => Ok(context.new_string_object(s.clone())),
            Self::Symbol(s) => Ok(context.new_symbol_object(s.clone())),
            Self::BigInt(b) => Ok(context.new_bigint_object(b.clone())),
        }
    }
}

impl ToPropertyKeyExt for JsValue {
    /// `ToPropertyKey` (spec.md §3): symbols pass through; everything else
    /// goes through `ToString`.
    fn to_property_key(&self, context: &mut Context) -> JsResult<PropertyKey> {
        match self {
            Self::Symbol(s) => Ok(PropertyKey::Symbol(s.clone())),
            other => Ok(PropertyKey::String(other.to_js_string(context)?)),
        }
    }
}

/// `ToInt32` (spec.md §4.1): wraps via `ToUint32` then reinterprets the
/// top bit, matching the two's-complement truncation the spec describes.
pub fn f64_to_int32(n: f64) -> i32 {
    f64_to_uint32(n) as i32
}

/// `ToUint32`.
pub fn f64_to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let n = n.trunc();
    let modulo = n.rem_euclid(2f64.powi(32));
    modulo as u32
}

/// Hand-rolled `StringToNumber` (spec.md's `ToNumber` applied to a
/// string): trims JS whitespace, recognizes `Infinity`/`-Infinity`, hex
/// (`0x`)/octal (`0o`)/binary (`0b`) integer literals, and otherwise
/// delegates to `fast_float` for the decimal grammar.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c: char| c.is_whitespace());
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(rest) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return i64::from_str_radix(rest, 16).map_or(f64::NAN, |v| v as f64);
    }
    if let Some(rest) = trimmed
        .strip_prefix("0o")
        .or_else(|| trimmed.strip_prefix("0O"))
    {
        return i64::from_str_radix(rest, 8).map_or(f64::NAN, |v| v as f64);
    }
    if let Some(rest) = trimmed
        .strip_prefix("0b")
        .or_else(|| trimmed.strip_prefix("0B"))
    {
        return i64::from_str_radix(rest, 2).map_or(f64::NAN, |v| v as f64);
    }
    fast_float::parse(trimmed).unwrap_or(f64::NAN)
}

/// `Number::toString` for the default radix: shortest round-tripping
/// representation via `ryu_js`, with the spec's special cases for
/// `NaN`/`Infinity`/`-0`.
pub fn number_to_js_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    ryu_js::Buffer::new().format(n).to_string()
}
