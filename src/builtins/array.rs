//! `Array` (spec.md §4.3): the constructor, the exotic `length`-tracking
//! behavior lives in `object::internal_methods`; this module is the
//! `Array.prototype` method surface plus the `Array.*` statics.

use super::{install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{JsObject, ObjectData},
    property::Attribute,
    value::{self, JsValue},
};

pub fn init(context: &mut Context) {
    let prototype = context.intrinsics().array_prototype();

    prototype.create_method("push", 1, push, context);
    prototype.create_method("pop", 0, pop, context);
    prototype.create_method("shift", 0, shift, context);
    prototype.create_method("unshift", 1, unshift, context);
    prototype.create_method("slice", 2, slice, context);
    prototype.create_method("splice", 2, splice, context);
    prototype.create_method("concat", 1, concat, context);
    prototype.create_method("join", 1, join, context);
    prototype.create_method("reverse", 0, reverse, context);
    prototype.create_method("indexOf", 1, index_of, context);
    prototype.create_method("lastIndexOf", 1, last_index_of, context);
    prototype.create_method("includes", 1, includes, context);
    prototype.create_method("find", 1, find, context);
    prototype.create_method("findIndex", 1, find_index, context);
    prototype.create_method("filter", 1, filter, context);
    prototype.create_method("map", 1, map, context);
    prototype.create_method("forEach", 1, for_each, context);
    prototype.create_method("reduce", 1, reduce, context);
    prototype.create_method("reduceRight", 1, reduce_right, context);
    prototype.create_method("some", 1, some, context);
    prototype.create_method("every", 1, every, context);
    prototype.create_method("sort", 1, sort, context);
    prototype.create_method("flat", 0, flat, context);
    prototype.create_method("fill", 1, fill, context);
    prototype.create_method("toString", 0, to_string, context);
    prototype.create_method("keys", 0, keys, context);
    prototype.create_method("values", 0, values, context);

    let iterator_key = context.well_known_symbols().iterator.clone();
    prototype.create_data_property(iterator_key, prototype.get("values", context).unwrap(), Attribute::builtin());

    let ctor = native_constructor("Array", 1, construct, context);
    link_constructor(&ctor, &prototype);
    ctor.create_method("isArray", 1, is_array, context);
    ctor.create_method("of", 0, of, context);
    ctor.create_method("from", 1, from, context);
    install_global("Array", ctor, context);
}

fn construct(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    if args.len() == 1 {
        if let JsValue::Number(n) = args[0] {
            if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
                return Err(JsNativeError::range().with_message("Invalid array length").into());
            }
            let array = JsObject::from_data(ObjectData::Array, Some(context.intrinsics().array_prototype()));
            set_length(&array, n as u32);
            return Ok(JsValue::object(array));
        }
    }
    Ok(JsValue::object(context.new_array(args.to_vec())))
}

fn set_length(array: &JsObject, len: u32) {
    let mut attrs = Attribute::default();
    attrs.set_writable(true);
    array.create_data_property("length", len, attrs);
}

fn length_of(obj: &JsObject, context: &mut Context) -> JsResult<usize> {
    obj.get("length", context)?.to_length(context)
}

fn is_array(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(args.first().and_then(JsValue::as_object).map(JsObject::is_array).unwrap_or(false)))
}

fn of(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::object(context.new_array(args.to_vec())))
}

fn from(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(source) = args.first() else {
        return Ok(JsValue::object(context.new_array(Vec::new())));
    };
    let mapper = args.get(1).and_then(JsValue::as_object).filter(|o| o.is_callable()).cloned();
    let mut items = Vec::new();
    let has_iterator = !source.is_null_or_undefined()
        && source
            .to_object(context)?
            .get(context.well_known_symbols().iterator.clone(), context)?
            .is_callable();
    if has_iterator {
        let mut iter = crate::exec::iterator::JsIterator::from_value(source, context)?;
        while let Some(v) = iter.next(context)? {
            items.push(v);
        }
    } else {
        let obj = source.to_object(context)?;
        let len = length_of(&obj, context)?;
        for i in 0..len {
            items.push(obj.get(i as u32, context)?);
        }
    }
    if let Some(f) = mapper {
        let mut mapped = Vec::with_capacity(items.len());
        for (i, v) in items.into_iter().enumerate() {
            mapped.push(f.call(&JsValue::undefined(), &[v, JsValue::from(i as u32)], context)?);
        }
        items = mapped;
    }
    Ok(JsValue::object(context.new_array(items)))
}

fn push(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let mut len = length_of(&obj, context)?;
    for arg in args {
        obj.set(len as u32, arg.clone(), true, context)?;
        len += 1;
    }
    obj.set("length", len as u32, true, context)?;
    Ok(JsValue::from(len as u32))
}

fn pop(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    if len == 0 {
        obj.set("length", 0u32, true, context)?;
        return Ok(JsValue::undefined());
    }
    let last = len - 1;
    let value = obj.get(last as u32, context)?;
    obj.delete(&(last as u32).into(), context)?;
    obj.set("length", last as u32, true, context)?;
    Ok(value)
}

fn shift(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    if len == 0 {
        return Ok(JsValue::undefined());
    }
    let first = obj.get(0u32, context)?;
    for i in 1..len {
        let v = obj.get(i as u32, context)?;
        obj.set((i - 1) as u32, v, true, context)?;
    }
    obj.delete(&((len - 1) as u32).into(), context)?;
    obj.set("length", (len - 1) as u32, true, context)?;
    Ok(first)
}

fn unshift(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let shift_by = args.len();
    for i in (0..len).rev() {
        let v = obj.get(i as u32, context)?;
        obj.set((i + shift_by) as u32, v, true, context)?;
    }
    for (i, arg) in args.iter().enumerate() {
        obj.set(i as u32, arg.clone(), true, context)?;
    }
    let new_len = (len + shift_by) as u32;
    obj.set("length", new_len, true, context)?;
    Ok(JsValue::from(new_len))
}

fn normalize_index(index: f64, len: usize) -> usize {
    if index < 0.0 {
        (len as f64 + index).max(0.0) as usize
    } else {
        (index as usize).min(len)
    }
}

fn slice(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let start = match args.first() {
        Some(v) => normalize_index(v.to_integer_or_infinity(context)?, len),
        None => 0,
    };
    let end = match args.get(1) {
        Some(v) if !v.is_undefined() => normalize_index(v.to_integer_or_infinity(context)?, len),
        _ => len,
    };
    let mut out = Vec::new();
    for i in start..end.max(start) {
        out.push(obj.get(i as u32, context)?);
    }
    Ok(JsValue::object(context.new_array(out)))
}

fn splice(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let start = match args.first() {
        Some(v) => normalize_index(v.to_integer_or_infinity(context)?, len),
        None => 0,
    };
    let delete_count = match args.get(1) {
        Some(v) => (v.to_integer_or_infinity(context)?.max(0.0) as usize).min(len - start),
        None => len - start,
    };
    let mut removed = Vec::with_capacity(delete_count);
    for i in start..start + delete_count {
        removed.push(obj.get(i as u32, context)?);
    }
    let items: Vec<JsValue> = args.get(2..).map(<[JsValue]>::to_vec).unwrap_or_default();
    let mut rest = Vec::new();
    for i in start + delete_count..len {
        rest.push(obj.get(i as u32, context)?);
    }
    let mut index = start;
    for item in items.iter().chain(rest.iter()) {
        obj.set(index as u32, item.clone(), true, context)?;
        index += 1;
    }
    for i in index..len {
        obj.delete(&(i as u32).into(), context)?;
    }
    obj.set("length", index as u32, true, context)?;
    Ok(JsValue::object(context.new_array(removed)))
}

fn concat(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let mut out = Vec::new();
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    for i in 0..len {
        out.push(obj.get(i as u32, context)?);
    }
    for arg in args {
        if let Some(o) = arg.as_object().filter(|o| o.is_array()) {
            let alen = length_of(o, context)?;
            for i in 0..alen {
                out.push(o.get(i as u32, context)?);
            }
        } else {
            out.push(arg.clone());
        }
    }
    Ok(JsValue::object(context.new_array(out)))
}

fn join(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let sep = match args.first() {
        Some(v) if !v.is_undefined() => v.to_js_string(context)?.to_string_lossy(),
        _ => ",".to_string(),
    };
    let mut parts = Vec::with_capacity(len);
    for i in 0..len {
        let v = obj.get(i as u32, context)?;
        parts.push(if v.is_null_or_undefined() { String::new() } else { v.to_js_string(context)?.to_string_lossy() });
    }
    Ok(JsValue::string(parts.join(&sep)))
}

fn to_string(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    join(this, args, context)
}

fn reverse(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    for i in 0..len / 2 {
        let a = obj.get(i as u32, context)?;
        let b = obj.get((len - 1 - i) as u32, context)?;
        obj.set(i as u32, b, true, context)?;
        obj.set((len - 1 - i) as u32, a, true, context)?;
    }
    Ok(this.clone())
}

fn index_of(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let target = args.first().cloned().unwrap_or_else(JsValue::undefined);
    for i in 0..len {
        if value::strict_equals(&obj.get(i as u32, context)?, &target) {
            return Ok(JsValue::from(i as u32));
        }
    }
    Ok(JsValue::from(-1i32))
}

fn last_index_of(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let target = args.first().cloned().unwrap_or_else(JsValue::undefined);
    for i in (0..len).rev() {
        if value::strict_equals(&obj.get(i as u32, context)?, &target) {
            return Ok(JsValue::from(i as u32));
        }
    }
    Ok(JsValue::from(-1i32))
}

fn includes(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let target = args.first().cloned().unwrap_or_else(JsValue::undefined);
    for i in 0..len {
        if value::same_value_zero(&obj.get(i as u32, context)?, &target) {
            return Ok(JsValue::from(true));
        }
    }
    Ok(JsValue::from(false))
}

fn callback_arg(args: &[JsValue]) -> JsResult<&JsObject> {
    args.first()
        .and_then(JsValue::as_object)
        .filter(|o| o.is_callable())
        .ok_or_else(|| JsNativeError::typ().with_message("callback is not a function").into())
}

fn find(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let f = callback_arg(args)?;
    let this_arg = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    for i in 0..len {
        let v = obj.get(i as u32, context)?;
        let keep = f.call(&this_arg, &[v.clone(), JsValue::from(i as u32), this.clone()], context)?;
        if keep.to_boolean() {
            return Ok(v);
        }
    }
    Ok(JsValue::undefined())
}

fn find_index(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let f = callback_arg(args)?;
    let this_arg = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    for i in 0..len {
        let v = obj.get(i as u32, context)?;
        let keep = f.call(&this_arg, &[v, JsValue::from(i as u32), this.clone()], context)?;
        if keep.to_boolean() {
            return Ok(JsValue::from(i as u32));
        }
    }
    Ok(JsValue::from(-1i32))
}

fn filter(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let f = callback_arg(args)?;
    let this_arg = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    let mut out = Vec::new();
    for i in 0..len {
        let v = obj.get(i as u32, context)?;
        let keep = f.call(&this_arg, &[v.clone(), JsValue::from(i as u32), this.clone()], context)?;
        if keep.to_boolean() {
            out.push(v);
        }
    }
    Ok(JsValue::object(context.new_array(out)))
}

fn map(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let f = callback_arg(args)?;
    let this_arg = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let v = obj.get(i as u32, context)?;
        out.push(f.call(&this_arg, &[v, JsValue::from(i as u32), this.clone()], context)?);
    }
    Ok(JsValue::object(context.new_array(out)))
}

fn for_each(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let f = callback_arg(args)?;
    let this_arg = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    for i in 0..len {
        let v = obj.get(i as u32, context)?;
        f.call(&this_arg, &[v, JsValue::from(i as u32), this.clone()], context)?;
    }
    Ok(JsValue::undefined())
}

fn reduce(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let f = callback_arg(args)?;
    let mut i = 0;
    let mut acc = match args.get(1) {
        Some(v) => v.clone(),
        None => {
            if len == 0 {
                return Err(JsNativeError::typ().with_message("Reduce of empty array with no initial value").into());
            }
            i = 1;
            obj.get(0u32, context)?
        }
    };
    while i < len {
        let v = obj.get(i as u32, context)?;
        acc = f.call(&JsValue::undefined(), &[acc, v, JsValue::from(i as u32), this.clone()], context)?;
        i += 1;
    }
    Ok(acc)
}

fn reduce_right(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let f = callback_arg(args)?;
    if len == 0 && args.len() < 2 {
        return Err(JsNativeError::typ().with_message("Reduce of empty array with no initial value").into());
    }
    let mut i = len;
    let mut acc = match args.get(1) {
        Some(v) => v.clone(),
        None => {
            i -= 1;
            obj.get(i as u32, context)?
        }
    };
    while i > 0 {
        i -= 1;
        let v = obj.get(i as u32, context)?;
        acc = f.call(&JsValue::undefined(), &[acc, v, JsValue::from(i as u32), this.clone()], context)?;
    }
    Ok(acc)
}

fn some(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let f = callback_arg(args)?;
    let this_arg = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    for i in 0..len {
        let v = obj.get(i as u32, context)?;
        if f.call(&this_arg, &[v, JsValue::from(i as u32), this.clone()], context)?.to_boolean() {
            return Ok(JsValue::from(true));
        }
    }
    Ok(JsValue::from(false))
}

fn every(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let f = callback_arg(args)?;
    let this_arg = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    for i in 0..len {
        let v = obj.get(i as u32, context)?;
        if !f.call(&this_arg, &[v, JsValue::from(i as u32), this.clone()], context)?.to_boolean() {
            return Ok(JsValue::from(false));
        }
    }
    Ok(JsValue::from(true))
}

fn sort(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let comparator = args.first().and_then(JsValue::as_object).filter(|o| o.is_callable()).cloned();
    let mut items = Vec::with_capacity(len);
    for i in 0..len {
        items.push(obj.get(i as u32, context)?);
    }
    // insertion sort: the comparator may run arbitrary JS and error out mid-sort.
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 {
            let ordering = match &comparator {
                Some(f) => f.call(&JsValue::undefined(), &[items[j - 1].clone(), items[j].clone()], context)?.to_number(context)?,
                None => {
                    let a = items[j - 1].to_js_string(context)?.to_string_lossy();
                    let b = items[j].to_js_string(context)?.to_string_lossy();
                    if a > b { 1.0 } else if a < b { -1.0 } else { 0.0 }
                }
            };
            if ordering > 0.0 {
                items.swap(j - 1, j);
                j -= 1;
            } else {
                break;
            }
        }
    }
    for (i, v) in items.into_iter().enumerate() {
        obj.set(i as u32, v, true, context)?;
    }
    Ok(this.clone())
}

fn flat(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let depth = match args.first() {
        Some(v) => v.to_integer_or_infinity(context)?,
        None => 1.0,
    };
    let mut out = Vec::new();
    flatten_into(&obj, depth, &mut out, context)?;
    Ok(JsValue::object(context.new_array(out)))
}

fn flatten_into(obj: &JsObject, depth: f64, out: &mut Vec<JsValue>, context: &mut Context) -> JsResult<()> {
    let len = length_of(obj, context)?;
    for i in 0..len {
        let v = obj.get(i as u32, context)?;
        if depth > 0.0 {
            if let Some(inner) = v.as_object().filter(|o| o.is_array()) {
                flatten_into(inner, depth - 1.0, out, context)?;
                continue;
            }
        }
        out.push(v);
    }
    Ok(())
}

fn fill(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let value = args.first().cloned().unwrap_or_else(JsValue::undefined);
    let start = match args.get(1) {
        Some(v) if !v.is_undefined() => normalize_index(v.to_integer_or_infinity(context)?, len),
        _ => 0,
    };
    let end = match args.get(2) {
        Some(v) if !v.is_undefined() => normalize_index(v.to_integer_or_infinity(context)?, len),
        _ => len,
    };
    for i in start..end.max(start) {
        obj.set(i as u32, value.clone(), true, context)?;
    }
    Ok(this.clone())
}

fn keys(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let items = (0..len as u32).map(JsValue::from).collect();
    Ok(JsValue::object(context.new_array(items)))
}

fn values(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let len = length_of(&obj, context)?;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        out.push(obj.get(i as u32, context)?);
    }
    let array = context.new_array(out);
    make_array_like_iterator(array, context)
}

/// `values()`/`Symbol.iterator` return a live iterator object, not the
/// bare array; wraps a snapshot array with a one-shot `next` that walks
/// it in order (simplified: does not observe post-creation mutation).
pub(crate) fn make_array_like_iterator(array: JsObject, context: &mut Context) -> JsResult<JsValue> {
    let iterator = JsObject::ordinary(Some(context.intrinsics().iterator_prototype()));
    iterator.create_data_property("__snapshot", array, Attribute::default());
    iterator.create_data_property("__index", 0u32, Attribute::default());
    iterator.create_method("next", 0, array_iterator_next, context);
    Ok(JsValue::object(iterator))
}

fn array_iterator_next(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("not an array iterator").into());
    };
    let snapshot = obj.get("__snapshot", context)?.to_object(context)?;
    let index = obj.get("__index", context)?.to_length(context)?;
    let len = length_of(&snapshot, context)?;
    let result = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    if index >= len {
        result.create_data_property("done", true, Attribute::all());
        result.create_data_property("value", JsValue::undefined(), Attribute::all());
    } else {
        obj.set("__index", (index + 1) as u32, true, context)?;
        result.create_data_property("done", false, Attribute::all());
        result.create_data_property("value", snapshot.get(index as u32, context)?, Attribute::all());
    }
    Ok(JsValue::object(result))
}
