//! `Map` (spec.md §4.3): an insertion-ordered key/value collection keyed
//! by `SameValueZero`, backed by `ObjectData::Map`'s `GcOrderedMap`.

use super::{array::make_array_like_iterator, install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{GcOrderedMap, JsObject, ObjectData},
    property::Attribute,
    value::{HashableValue, JsValue},
};

pub fn init(context: &mut Context) {
    let prototype = JsObject::ordinary(Some(context.intrinsics().object_prototype()));

    prototype.create_method("get", 1, get, context);
    prototype.create_method("set", 2, set, context);
    prototype.create_method("has", 1, has, context);
    prototype.create_method("delete", 1, delete, context);
    prototype.create_method("clear", 0, clear, context);
    prototype.create_method("forEach", 1, for_each, context);
    prototype.create_method("keys", 0, keys, context);
    prototype.create_method("values", 0, values, context);
    prototype.create_method("entries", 0, entries, context);
    define_size_getter(&prototype, context);

    let iterator_key = context.well_known_symbols().iterator.clone();
    prototype.create_data_property(iterator_key, prototype.get("entries", context).unwrap(), Attribute::builtin());

    let ctor = native_constructor("Map", 0, construct, context);
    link_constructor(&ctor, &prototype);
    context.intrinsics_mut().insert("%Map.prototype%", prototype);
    install_global("Map", ctor, context);
}

fn define_size_getter(prototype: &JsObject, context: &Context) {
    let getter = JsObject::native_function(Some("size".into()), 0, get_size, context);
    let desc = crate::property::PropertyDescriptor::accessor(Some(getter), None, false, true);
    prototype.borrow_mut().properties_mut().insert("size".into(), desc);
}

fn construct(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Map constructor called on non-object").into());
    };
    obj.borrow_mut().data = ObjectData::Map(GcOrderedMap::new());
    if let Some(iterable) = args.first().filter(|v| !v.is_null_or_undefined()) {
        let mut iter = crate::exec::iterator::JsIterator::from_value(iterable, context)?;
        while let Some(entry) = iter.next(context)? {
            let entry_obj = entry.to_object(context)?;
            let key = entry_obj.get(0u32, context)?;
            let value = entry_obj.get(1u32, context)?;
            let mut borrowed = obj.borrow_mut();
            let ObjectData::Map(map) = &mut borrowed.data else { unreachable!() };
            map.insert(HashableValue(key), value);
        }
    }
    Ok(this.clone())
}

fn this_map<R>(this: &JsValue, f: impl FnOnce(&GcOrderedMap<HashableValue, JsValue>) -> R) -> JsResult<R> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Map method called on incompatible receiver").into());
    };
    let borrowed = obj.borrow();
    match &borrowed.data {
        ObjectData::Map(map) => Ok(f(map)),
        _ => Err(JsNativeError::typ().with_message("Map method called on incompatible receiver").into()),
    }
}

fn get(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let key = args.first().cloned().unwrap_or_else(JsValue::undefined);
    this_map(this, |map| map.get(&HashableValue(key)).cloned().unwrap_or_else(JsValue::undefined))
}

fn set(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Map.prototype.set called on non-object").into());
    };
    let key = args.first().cloned().unwrap_or_else(JsValue::undefined);
    let value = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    let mut borrowed = obj.borrow_mut();
    let ObjectData::Map(map) = &mut borrowed.data else {
        return Err(JsNativeError::typ().with_message("Map.prototype.set called on incompatible receiver").into());
    };
    map.insert(HashableValue(key), value);
    Ok(this.clone())
}

fn has(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let key = args.first().cloned().unwrap_or_else(JsValue::undefined);
    this_map(this, |map| JsValue::from(map.contains_key(&HashableValue(key))))
}

fn delete(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Map.prototype.delete called on non-object").into());
    };
    let key = HashableValue(args.first().cloned().unwrap_or_else(JsValue::undefined));
    let mut borrowed = obj.borrow_mut();
    let ObjectData::Map(map) = &mut borrowed.data else {
        return Err(JsNativeError::typ().with_message("Map.prototype.delete called on incompatible receiver").into());
    };
    Ok(JsValue::from(map.shift_remove(&key).is_some()))
}

fn clear(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Map.prototype.clear called on non-object").into());
    };
    let mut borrowed = obj.borrow_mut();
    let ObjectData::Map(map) = &mut borrowed.data else {
        return Err(JsNativeError::typ().with_message("Map.prototype.clear called on incompatible receiver").into());
    };
    map.clear();
    Ok(JsValue::undefined())
}

fn get_size(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    this_map(this, |map| JsValue::from(map.len() as u32))
}

fn for_each(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let f = args.first().and_then(JsValue::as_object).filter(|o| o.is_callable()).cloned().ok_or_else(|| {
        JsNativeError::typ().with_message("callback is not a function").into()
    })?;
    let this_arg = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    let entries: Vec<(JsValue, JsValue)> = this_map(this, |map| map.iter().map(|(k, v)| (k.0.clone(), v.clone())).collect())?;
    for (k, v) in entries {
        f.call(&this_arg, &[v, k, this.clone()], context)?;
    }
    Ok(JsValue::undefined())
}

fn keys(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let items: Vec<JsValue> = this_map(this, |map| map.iter().map(|(k, _)| k.0.clone()).collect())?;
    make_array_like_iterator(context.new_array(items), context)
}

fn values(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let items: Vec<JsValue> = this_map(this, |map| map.iter().map(|(_, v)| v.clone()).collect())?;
    make_array_like_iterator(context.new_array(items), context)
}

fn entries(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let pairs: Vec<(JsValue, JsValue)> = this_map(this, |map| map.iter().map(|(k, v)| (k.0.clone(), v.clone())).collect())?;
    let items = pairs.into_iter().map(|(k, v)| JsValue::object(context.new_array(vec![k, v]))).collect();
    make_array_like_iterator(context.new_array(items), context)
}
