//! `Set` (spec.md §4.3): an insertion-ordered value collection keyed by
//! `SameValueZero`, backed by `ObjectData::Set`'s `GcOrderedSet`.

use super::{array::make_array_like_iterator, install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{GcOrderedSet, JsObject, ObjectData},
    property::Attribute,
    value::{HashableValue, JsValue},
};

pub fn init(context: &mut Context) {
    let prototype = JsObject::ordinary(Some(context.intrinsics().object_prototype()));

    prototype.create_method("add", 1, add, context);
    prototype.create_method("has", 1, has, context);
    prototype.create_method("delete", 1, delete, context);
    prototype.create_method("clear", 0, clear, context);
    prototype.create_method("forEach", 1, for_each, context);
    prototype.create_method("values", 0, values, context);
    prototype.create_method("keys", 0, values, context);
    prototype.create_method("entries", 0, entries, context);
    define_size_getter(&prototype, context);

    let iterator_key = context.well_known_symbols().iterator.clone();
    prototype.create_data_property(iterator_key, prototype.get("values", context).unwrap(), Attribute::builtin());

    let ctor = native_constructor("Set", 0, construct, context);
    link_constructor(&ctor, &prototype);
    context.intrinsics_mut().insert("%Set.prototype%", prototype);
    install_global("Set", ctor, context);
}

fn define_size_getter(prototype: &JsObject, context: &Context) {
    let getter = JsObject::native_function(Some("size".into()), 0, get_size, context);
    let desc = crate::property::PropertyDescriptor::accessor(Some(getter), None, false, true);
    prototype.borrow_mut().properties_mut().insert("size".into(), desc);
}

fn construct(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Set constructor called on non-object").into());
    };
    obj.borrow_mut().data = ObjectData::Set(GcOrderedSet::new());
    if let Some(iterable) = args.first().filter(|v| !v.is_null_or_undefined()) {
        let mut iter = crate::exec::iterator::JsIterator::from_value(iterable, context)?;
        while let Some(value) = iter.next(context)? {
            let mut borrowed = obj.borrow_mut();
            let ObjectData::Set(set) = &mut borrowed.data else { unreachable!() };
            set.insert(HashableValue(value));
        }
    }
    Ok(this.clone())
}

fn this_set<R>(this: &JsValue, f: impl FnOnce(&GcOrderedSet<HashableValue>) -> R) -> JsResult<R> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Set method called on incompatible receiver").into());
    };
    let borrowed = obj.borrow();
    match &borrowed.data {
        ObjectData::Set(set) => Ok(f(set)),
        _ => Err(JsNativeError::typ().with_message("Set method called on incompatible receiver").into()),
    }
}

fn add(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Set.prototype.add called on non-object").into());
    };
    let value = args.first().cloned().unwrap_or_else(JsValue::undefined);
    let mut borrowed = obj.borrow_mut();
    let ObjectData::Set(set) = &mut borrowed.data else {
        return Err(JsNativeError::typ().with_message("Set.prototype.add called on incompatible receiver").into());
    };
    set.insert(HashableValue(value));
    Ok(this.clone())
}

fn has(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let value = args.first().cloned().unwrap_or_else(JsValue::undefined);
    this_set(this, |set| JsValue::from(set.contains(&HashableValue(value))))
}

fn delete(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Set.prototype.delete called on non-object").into());
    };
    let value = HashableValue(args.first().cloned().unwrap_or_else(JsValue::undefined));
    let mut borrowed = obj.borrow_mut();
    let ObjectData::Set(set) = &mut borrowed.data else {
        return Err(JsNativeError::typ().with_message("Set.prototype.delete called on incompatible receiver").into());
    };
    Ok(JsValue::from(set.shift_remove(&value)))
}

fn clear(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Set.prototype.clear called on non-object").into());
    };
    let mut borrowed = obj.borrow_mut();
    let ObjectData::Set(set) = &mut borrowed.data else {
        return Err(JsNativeError::typ().with_message("Set.prototype.clear called on incompatible receiver").into());
    };
    set.clear();
    Ok(JsValue::undefined())
}

fn get_size(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    this_set(this, |set| JsValue::from(set.len() as u32))
}

fn for_each(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let f = args.first().and_then(JsValue::as_object).filter(|o| o.is_callable()).cloned().ok_or_else(|| {
        JsNativeError::typ().with_message("callback is not a function").into()
    })?;
    let this_arg = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    let items: Vec<JsValue> = this_set(this, |set| set.iter().map(|v| v.0.clone()).collect())?;
    for v in items {
        f.call(&this_arg, &[v.clone(), v, this.clone()], context)?;
    }
    Ok(JsValue::undefined())
}

fn values(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let items: Vec<JsValue> = this_set(this, |set| set.iter().map(|v| v.0.clone()).collect())?;
    make_array_like_iterator(context.new_array(items), context)
}

fn entries(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let items: Vec<JsValue> = this_set(this, |set| set.iter().map(|v| v.0.clone()).collect())?;
    let pairs = items.into_iter().map(|v| JsValue::object(context.new_array(vec![v.clone(), v]))).collect();
    make_array_like_iterator(context.new_array(pairs), context)
}
