//! Abstract arithmetic and bitwise operators (spec.md §4.1, `+ - * / % **
//! & | ^ << >> >>>` and their unary counterparts). Pulled out of
//! `exec::expression` because both the interpreter and built-ins
//! (`Number`, `Math`) need the same semantics.

use super::{conversions::PreferredType, JsBigInt, JsValue};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
};

/// `+` (spec.md §4.1): the one operator where `ToPrimitive` decides
/// between numeric addition and string concatenation.
pub fn add(a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    let pa = a.to_primitive(context, PreferredType::Default)?;
    let pb = b.to_primitive(context, PreferredType::Default)?;

    if pa.is_string() || pb.is_string() {
        let sa = pa.to_js_string(context)?;
        let sb = pb.to_js_string(context)?;
        return Ok(JsValue::string(sa.concat(&sb)));
    }

    if let (JsValue::BigInt(x), JsValue::BigInt(y)) = (&pa, &pb) {
        return Ok(JsValue::BigInt(x + y));
    }
    if pa.is_bigint() || pb.is_bigint() {
        return Err(mixed_bigint_error());
    }

    Ok(JsValue::Number(pa.to_number(context)? + pb.to_number(context)?))
}

macro_rules! numeric_binop {
    ($name:ident, $bigint_op:expr, $num_op:expr) => {
        pub fn $name(a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<JsValue> {
            let pa = a.to_primitive(context, PreferredType::Number)?;
            let pb = b.to_primitive(context, PreferredType::Number)?;
            if let (JsValue::BigInt(x), JsValue::BigInt(y)) = (&pa, &pb) {
                return Ok(JsValue::BigInt($bigint_op(x, y)));
            }
            if pa.is_bigint() || pb.is_bigint() {
                return Err(mixed_bigint_error());
            }
            let x = pa.to_number(context)?;
            let y = pb.to_number(context)?;
            Ok(JsValue::Number($num_op(x, y)))
        }
    };
}

numeric_binop!(sub, |x: &JsBigInt, y: &JsBigInt| x - y, |x: f64, y: f64| x - y);
numeric_binop!(mul, |x: &JsBigInt, y: &JsBigInt| x * y, |x: f64, y: f64| x * y);

/// `/`: split out from the `numeric_binop!` family because BigInt
/// division by zero throws `RangeError` instead of producing `Infinity`.
pub fn divide(a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    let pa = a.to_primitive(context, PreferredType::Number)?;
    let pb = b.to_primitive(context, PreferredType::Number)?;
    if let (JsValue::BigInt(x), JsValue::BigInt(y)) = (&pa, &pb) {
        if y.as_inner() == &num_bigint::BigInt::from(0) {
            return Err(JsNativeError::range()
                .with_message("Division by zero")
                .into());
        }
        return Ok(JsValue::BigInt(JsBigInt::new(x.as_inner() / y.as_inner())));
    }
    if pa.is_bigint() || pb.is_bigint() {
        return Err(mixed_bigint_error());
    }
    Ok(JsValue::Number(pa.to_number(context)? / pb.to_number(context)?))
}

/// `%`: JS remainder follows the sign of the dividend, matching Rust's
/// `%` for `f64` directly.
pub fn modulo(a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    let pa = a.to_primitive(context, PreferredType::Number)?;
    let pb = b.to_primitive(context, PreferredType::Number)?;
    if let (JsValue::BigInt(x), JsValue::BigInt(y)) = (&pa, &pb) {
        if y.as_inner() == &num_bigint::BigInt::from(0) {
            return Err(JsNativeError::range()
                .with_message("Division by zero")
                .into());
        }
        return Ok(JsValue::BigInt(JsBigInt::new(x.as_inner() % y.as_inner())));
    }
    if pa.is_bigint() || pb.is_bigint() {
        return Err(mixed_bigint_error());
    }
    Ok(JsValue::Number(pa.to_number(context)? % pb.to_number(context)?))
}

/// `**`.
pub fn exponentiate(a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    let pa = a.to_primitive(context, PreferredType::Number)?;
    let pb = b.to_primitive(context, PreferredType::Number)?;
    if pa.is_bigint() || pb.is_bigint() {
        return Err(mixed_bigint_error());
    }
    Ok(JsValue::Number(
        pa.to_number(context)?.powf(pb.to_number(context)?),
    ))
}

macro_rules! int32_binop {
    ($name:ident, $op:expr) => {
        pub fn $name(a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<JsValue> {
            let x = a.to_int32(context)?;
            let y = b.to_int32(context)?;
            Ok(JsValue::Number($op(x, y) as f64))
        }
    };
}

int32_binop!(bitwise_and, |x: i32, y: i32| x & y);
int32_binop!(bitwise_or, |x: i32, y: i32| x | y);
int32_binop!(bitwise_xor, |x: i32, y: i32| x ^ y);

/// `<<`.
pub fn shift_left(a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    let x = a.to_int32(context)?;
    let shift = (b.to_uint32(context)?) & 0x1f;
    Ok(JsValue::Number((x << shift) as f64))
}

/// `>>`.
pub fn shift_right(a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    let x = a.to_int32(context)?;
    let shift = (b.to_uint32(context)?) & 0x1f;
    Ok(JsValue::Number((x >> shift) as f64))
}

/// `>>>`.
pub fn unsigned_shift_right(a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    let x = a.to_uint32(context)?;
    let shift = (b.to_uint32(context)?) & 0x1f;
    Ok(JsValue::Number((x >> shift) as f64))
}

/// Unary `-`.
pub fn negate(a: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    let p = a.to_primitive(context, PreferredType::Number)?;
    if let JsValue::BigInt(b) = &p {
        return Ok(JsValue::BigInt(JsBigInt::new(-b.as_inner())));
    }
    Ok(JsValue::Number(-p.to_number(context)?))
}

/// Unary `~`.
pub fn bitwise_not(a: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::Number(!a.to_int32(context)? as f64))
}

fn mixed_bigint_error() -> crate::error::JsError {
    JsNativeError::typ()
        .with_message("Cannot mix BigInt and other types, use explicit conversions")
        .into()
}
