//! `Number` (spec.md §4.3): the constructor, the IEEE-754 double wrapper
//! object, and `Number.prototype`/`Number.*` static helpers.

use super::{install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{JsObject, ObjectData},
    value::JsValue,
};

pub fn init(context: &mut Context) {
    let prototype = context.intrinsics().number_prototype();

    prototype.create_method("toString", 1, to_string, context);
    prototype.create_method("valueOf", 0, value_of, context);
    prototype.create_method("toFixed", 1, to_fixed, context);

    let ctor = native_constructor("Number", 1, construct, context);
    link_constructor(&ctor, &prototype);
    ctor.create_data_property("MAX_SAFE_INTEGER", 2f64.powi(53) - 1.0, crate::property::Attribute::default());
    ctor.create_data_property("MIN_SAFE_INTEGER", -(2f64.powi(53) - 1.0), crate::property::Attribute::default());
    ctor.create_data_property("MAX_VALUE", f64::MAX, crate::property::Attribute::default());
    ctor.create_data_property("MIN_VALUE", f64::MIN_POSITIVE, crate::property::Attribute::default());
    ctor.create_data_property("EPSILON", f64::EPSILON, crate::property::Attribute::default());
    ctor.create_data_property("POSITIVE_INFINITY", f64::INFINITY, crate::property::Attribute::default());
    ctor.create_data_property("NEGATIVE_INFINITY", f64::NEG_INFINITY, crate::property::Attribute::default());
    ctor.create_data_property("NaN", f64::NAN, crate::property::Attribute::default());
    ctor.create_method("isInteger", 1, is_integer, context);
    ctor.create_method("isFinite", 1, is_finite, context);
    ctor.create_method("isNaN", 1, is_nan, context);
    ctor.create_method("isSafeInteger", 1, is_safe_integer, context);
    ctor.create_method("parseFloat", 1, parse_float, context);
    ctor.create_method("parseInt", 2, parse_int, context);
    install_global("Number", ctor, context);
}

fn construct(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let n = match args.first() {
        Some(v) => v.to_number(context)?,
        None => 0.0,
    };
    Ok(JsValue::object(JsObject::from_data(ObjectData::Number(n), Some(context.intrinsics().number_prototype()))))
}

fn this_number(this: &JsValue, context: &mut Context) -> JsResult<f64> {
    match this {
        JsValue::Number(n) => Ok(*n),
        JsValue::Object(o) => match o.borrow().data {
            ObjectData::Number(n) => Ok(n),
            _ => Err(JsNativeError::typ().with_message("Number.prototype method called on incompatible receiver").into()),
        },
        _ => {
            let _ = context;
            Err(JsNativeError::typ().with_message("Number.prototype method called on incompatible receiver").into())
        }
    }
}

fn to_string(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let n = this_number(this, context)?;
    let radix = match args.first() {
        Some(v) if !v.is_undefined() => v.to_integer_or_infinity(context)? as u32,
        _ => 10,
    };
    if radix == 10 {
        return Ok(JsValue::string(crate::value::number_to_js_string(n)));
    }
    if !(2..=36).contains(&radix) {
        return Err(JsNativeError::range().with_message("toString() radix must be between 2 and 36").into());
    }
    Ok(JsValue::string(radix_string(n, radix)))
}

fn radix_string(n: f64, radix: u32) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let negative = n < 0.0;
    let mut int_part = n.abs().trunc() as u64;
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut digits = Vec::new();
    if int_part == 0 {
        digits.push(b'0');
    }
    while int_part > 0 {
        digits.push(DIGITS[(int_part % radix as u64) as usize]);
        int_part /= radix as u64;
    }
    digits.reverse();
    let mut out = String::from_utf8(digits).unwrap();
    if negative {
        out.insert(0, '-');
    }
    out
}

fn value_of(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(this_number(this, context)?))
}

fn to_fixed(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let n = this_number(this, context)?;
    let digits = match args.first() {
        Some(v) => v.to_integer_or_infinity(context)? as usize,
        None => 0,
    };
    Ok(JsValue::string(format!("{:.*}", digits, n)))
}

fn is_integer(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(matches!(args.first(), Some(JsValue::Number(n)) if n.is_finite() && n.fract() == 0.0)))
}

fn is_finite(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(matches!(args.first(), Some(JsValue::Number(n)) if n.is_finite())))
}

fn is_nan(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(matches!(args.first(), Some(JsValue::Number(n)) if n.is_nan())))
}

fn is_safe_integer(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(
        matches!(args.first(), Some(JsValue::Number(n)) if n.is_finite() && n.fract() == 0.0 && n.abs() <= 2f64.powi(53) - 1.0),
    ))
}

pub(crate) fn parse_float(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    let trimmed = s.trim_start();
    if trimmed.starts_with("Infinity") || trimmed.starts_with("+Infinity") {
        return Ok(JsValue::from(f64::INFINITY));
    }
    if trimmed.starts_with("-Infinity") {
        return Ok(JsValue::from(f64::NEG_INFINITY));
    }
    match fast_float::parse_partial::<f64, _>(trimmed) {
        Ok((n, consumed)) if consumed > 0 => Ok(JsValue::from(n)),
        _ => Ok(JsValue::nan()),
    }
}

pub(crate) fn parse_int(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    let mut trimmed = s.trim_start();
    let mut negative = false;
    if let Some(rest) = trimmed.strip_prefix('-') {
        negative = true;
        trimmed = rest;
    } else if let Some(rest) = trimmed.strip_prefix('+') {
        trimmed = rest;
    }
    let mut radix = match args.get(1) {
        Some(v) if !v.is_undefined() => v.to_int32(context)? as u32,
        _ => 0,
    };
    if radix == 0 {
        if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            radix = 16;
            trimmed = &trimmed[2..];
        } else {
            radix = 10;
        }
    } else if radix == 16 && (trimmed.starts_with("0x") || trimmed.starts_with("0X")) {
        trimmed = &trimmed[2..];
    }
    if !(2..=36).contains(&radix) {
        return Ok(JsValue::nan());
    }
    let end = trimmed.find(|c: char| !c.is_digit(radix)).unwrap_or(trimmed.len());
    if end == 0 {
        return Ok(JsValue::nan());
    }
    match i64::from_str_radix(&trimmed[..end], radix) {
        Ok(n) => Ok(JsValue::from(if negative { -(n as f64) } else { n as f64 })),
        Err(_) => Ok(JsValue::nan()),
    }
}
