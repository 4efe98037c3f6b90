//! `String` (spec.md §4.3): the UTF-16 code-unit string methods, wrapping
//! `JsString`'s native operations (`string.rs`) for the JS-facing surface.

use super::{install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{JsObject, ObjectData},
    string::JsString,
    value::JsValue,
};

pub fn init(context: &mut Context) {
    let prototype = context.intrinsics().string_prototype();

    prototype.create_method("charAt", 1, char_at, context);
    prototype.create_method("charCodeAt", 1, char_code_at, context);
    prototype.create_method("codePointAt", 1, char_code_at, context);
    prototype.create_method("indexOf", 1, index_of, context);
    prototype.create_method("lastIndexOf", 1, last_index_of, context);
    prototype.create_method("includes", 1, includes, context);
    prototype.create_method("startsWith", 1, starts_with, context);
    prototype.create_method("endsWith", 1, ends_with, context);
    prototype.create_method("slice", 2, slice, context);
    prototype.create_method("substring", 2, substring, context);
    prototype.create_method("toUpperCase", 0, to_upper_case, context);
    prototype.create_method("toLowerCase", 0, to_lower_case, context);
    prototype.create_method("trim", 0, trim, context);
    prototype.create_method("trimStart", 0, trim_start, context);
    prototype.create_method("trimEnd", 0, trim_end, context);
    prototype.create_method("split", 2, split, context);
    prototype.create_method("repeat", 1, repeat, context);
    prototype.create_method("concat", 1, concat, context);
    prototype.create_method("padStart", 2, pad_start, context);
    prototype.create_method("padEnd", 2, pad_end, context);
    prototype.create_method("replace", 2, replace, context);
    prototype.create_method("replaceAll", 2, replace_all, context);
    prototype.create_method("toString", 0, to_string, context);
    prototype.create_method("valueOf", 0, to_string, context);

    let ctor = native_constructor("String", 1, construct, context);
    link_constructor(&ctor, &prototype);
    ctor.create_method("fromCharCode", 1, from_char_code, context);
    install_global("String", ctor, context);
}

fn this_string(this: &JsValue, context: &mut Context) -> JsResult<JsString> {
    this.to_js_string(context)
}

fn construct(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let value = match args.first() {
        Some(v) => v.to_js_string(context)?,
        None => JsString::default(),
    };
    let proto = context.intrinsics().string_prototype();
    let len = value.len();
    let obj = JsObject::from_data(ObjectData::String(value), Some(proto));
    let mut attrs = crate::property::Attribute::default();
    attrs.set_writable(false);
    obj.create_data_property("length", len as u32, attrs);
    Ok(JsValue::object(obj))
}

fn from_char_code(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let mut units = Vec::with_capacity(args.len());
    for arg in args {
        units.push(arg.to_uint32(context)? as u16);
    }
    Ok(JsValue::string(JsString::from_utf16(units)))
}

fn char_at(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?;
    let index = args.first().map(|v| v.to_integer_or_infinity(context)).transpose()?.unwrap_or(0.0);
    if index < 0.0 {
        return Ok(JsValue::string(""));
    }
    match s.code_unit_at(index as usize) {
        Some(unit) => Ok(JsValue::string(JsString::from_utf16(vec![unit]))),
        None => Ok(JsValue::string("")),
    }
}

fn char_code_at(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?;
    let index = args.first().map(|v| v.to_integer_or_infinity(context)).transpose()?.unwrap_or(0.0);
    if index < 0.0 {
        return Ok(JsValue::nan());
    }
    match s.code_unit_at(index as usize) {
        Some(unit) => Ok(JsValue::from(unit as u32)),
        None => Ok(JsValue::nan()),
    }
}

fn index_of(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?.to_string_lossy();
    let needle = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    match s.find(&needle) {
        Some(byte_idx) => Ok(JsValue::from(s[..byte_idx].encode_utf16().count() as u32)),
        None => Ok(JsValue::from(-1i32)),
    }
}

fn last_index_of(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?.to_string_lossy();
    let needle = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    match s.rfind(&needle) {
        Some(byte_idx) => Ok(JsValue::from(s[..byte_idx].encode_utf16().count() as u32)),
        None => Ok(JsValue::from(-1i32)),
    }
}

fn includes(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?.to_string_lossy();
    let needle = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    Ok(JsValue::from(s.contains(&needle)))
}

fn starts_with(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?.to_string_lossy();
    let needle = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    Ok(JsValue::from(s.starts_with(&needle)))
}

fn ends_with(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?.to_string_lossy();
    let needle = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    Ok(JsValue::from(s.ends_with(&needle)))
}

fn unit_range(s: &JsString, start: f64, end: f64) -> (usize, usize) {
    let len = s.len();
    let clamp = |n: f64| n.max(0.0).min(len as f64) as usize;
    (clamp(start), clamp(end))
}

fn slice(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?;
    let len = s.len() as f64;
    let start = match args.first() {
        Some(v) => {
            let n = v.to_integer_or_infinity(context)?;
            if n < 0.0 { (len + n).max(0.0) } else { n }
        }
        None => 0.0,
    };
    let end = match args.get(1) {
        Some(v) if !v.is_undefined() => {
            let n = v.to_integer_or_infinity(context)?;
            if n < 0.0 { (len + n).max(0.0) } else { n }
        }
        _ => len,
    };
    let (start, end) = unit_range(&s, start, end);
    if start >= end {
        return Ok(JsValue::string(""));
    }
    let units = s.as_slice()[start..end].to_vec();
    Ok(JsValue::string(JsString::from_utf16(units)))
}

fn substring(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?;
    let len = s.len() as f64;
    let a = match args.first() {
        Some(v) => v.to_integer_or_infinity(context)?,
        None => 0.0,
    };
    let b = match args.get(1) {
        Some(v) if !v.is_undefined() => v.to_integer_or_infinity(context)?,
        _ => len,
    };
    let (mut start, mut end) = unit_range(&s, a, b);
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }
    let units = s.as_slice()[start..end].to_vec();
    Ok(JsValue::string(JsString::from_utf16(units)))
}

fn to_upper_case(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::string(this_string(this, context)?.to_string_lossy().to_uppercase()))
}

fn to_lower_case(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::string(this_string(this, context)?.to_string_lossy().to_lowercase()))
}

fn trim(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::string(this_string(this, context)?.to_string_lossy().trim().to_string()))
}

fn trim_start(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::string(this_string(this, context)?.to_string_lossy().trim_start().to_string()))
}

fn trim_end(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::string(this_string(this, context)?.to_string_lossy().trim_end().to_string()))
}

fn split(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?.to_string_lossy();
    let parts: Vec<JsValue> = match args.first() {
        None | Some(JsValue::Undefined) => vec![JsValue::string(s)],
        Some(v) => {
            let sep = v.to_js_string(context)?.to_string_lossy();
            if sep.is_empty() {
                s.chars().map(|c| JsValue::string(c.to_string())).collect()
            } else {
                s.split(&sep).map(|p| JsValue::string(p.to_string())).collect()
            }
        }
    };
    Ok(JsValue::object(context.new_array(parts)))
}

fn repeat(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?;
    let count = args.first().map(|v| v.to_integer_or_infinity(context)).transpose()?.unwrap_or(0.0);
    if count < 0.0 || count.is_infinite() {
        return Err(JsNativeError::range().with_message("Invalid count value").into());
    }
    Ok(JsValue::string(s.repeat(count as usize)))
}

fn concat(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let mut s = this_string(this, context)?;
    for arg in args {
        s = s.concat(&arg.to_js_string(context)?);
    }
    Ok(JsValue::string(s))
}

fn pad_start(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    pad(this, args, context, true)
}

fn pad_end(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    pad(this, args, context, false)
}

fn pad(this: &JsValue, args: &[JsValue], context: &mut Context, at_start: bool) -> JsResult<JsValue> {
    let s = this_string(this, context)?.to_string_lossy();
    let target_len = args.first().map(|v| v.to_length(context)).transpose()?.unwrap_or(0);
    let current_len = s.encode_utf16().count();
    if target_len <= current_len {
        return Ok(JsValue::string(s));
    }
    let filler = match args.get(1) {
        Some(v) if !v.is_undefined() => v.to_js_string(context)?.to_string_lossy(),
        _ => " ".to_string(),
    };
    if filler.is_empty() {
        return Ok(JsValue::string(s));
    }
    let filler_units: Vec<char> = filler.chars().collect();
    let mut pad = String::new();
    let mut units = 0;
    let needed = target_len - current_len;
    'outer: loop {
        for c in &filler_units {
            if units >= needed {
                break 'outer;
            }
            pad.push(*c);
            units += c.len_utf16();
        }
    }
    let result = if at_start { format!("{}{}", pad, s) } else { format!("{}{}", s, pad) };
    Ok(JsValue::string(result))
}

fn replace(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?.to_string_lossy();
    let pattern = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    let replacement = replacement_string(args.get(1), context)?;
    Ok(JsValue::string(s.replacen(&pattern, &replacement, 1)))
}

fn replace_all(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let s = this_string(this, context)?.to_string_lossy();
    let pattern = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    let replacement = replacement_string(args.get(1), context)?;
    Ok(JsValue::string(s.replace(&pattern, &replacement)))
}

fn replacement_string(arg: Option<&JsValue>, context: &mut Context) -> JsResult<String> {
    match arg {
        Some(v) => Ok(v.to_js_string(context)?.to_string_lossy()),
        None => Ok("undefined".to_string()),
    }
}

fn to_string(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::string(this_string(this, context)?))
}
