//! `Object` (spec.md §4.3): the constructor and its prototype methods,
//! plus the static `Object.*` reflection helpers used throughout the rest
//! of the builtins.

use super::{install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{JsObject, ObjectData},
    property::{Attribute, PropertyDescriptorBuilder, PropertyKey},
    string::JsString,
    value::{JsValue, ToPropertyKeyExt},
};

pub fn init(context: &mut Context) {
    let prototype = context.intrinsics().object_prototype();

    prototype.create_method("hasOwnProperty", 1, has_own_property, context);
    prototype.create_method("isPrototypeOf", 1, is_prototype_of, context);
    prototype.create_method("propertyIsEnumerable", 1, property_is_enumerable, context);
    prototype.create_method("toString", 0, to_string, context);
    prototype.create_method("toLocaleString", 0, to_string, context);
    prototype.create_method("valueOf", 0, value_of, context);

    let ctor = native_constructor("Object", 1, construct, context);
    link_constructor(&ctor, &prototype);
    ctor.create_method("keys", 1, keys, context);
    ctor.create_method("values", 1, values, context);
    ctor.create_method("entries", 1, entries, context);
    ctor.create_method("assign", 2, assign, context);
    ctor.create_method("freeze", 1, freeze, context);
    ctor.create_method("isFrozen", 1, is_frozen, context);
    ctor.create_method("seal", 1, seal, context);
    ctor.create_method("isSealed", 1, is_sealed, context);
    ctor.create_method("preventExtensions", 1, prevent_extensions, context);
    ctor.create_method("isExtensible", 1, is_extensible, context);
    ctor.create_method("getPrototypeOf", 1, get_prototype_of, context);
    ctor.create_method("setPrototypeOf", 2, set_prototype_of, context);
    ctor.create_method("create", 2, create, context);
    ctor.create_method("defineProperty", 3, define_property, context);
    ctor.create_method("defineProperties", 2, define_properties, context);
    ctor.create_method("getOwnPropertyNames", 1, get_own_property_names, context);
    ctor.create_method("getOwnPropertyDescriptor", 2, get_own_property_descriptor, context);
    ctor.create_method("fromEntries", 1, from_entries, context);
    install_global("Object", ctor, context);
}

fn construct(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    match args.first() {
        Some(v) if v.is_object() => Ok(v.clone()),
        Some(v) if !v.is_null_or_undefined() => Ok(JsValue::object(v.to_object(context)?)),
        _ => Ok(JsValue::object(JsObject::ordinary(Some(context.intrinsics().object_prototype())))),
    }
}

fn has_own_property(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let key = args.first().cloned().unwrap_or_else(JsValue::undefined).to_property_key(context)?;
    Ok(JsValue::from(obj.get_own_property(&key).is_some()))
}

fn is_prototype_of(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(candidate) = args.first().and_then(JsValue::as_object) else {
        return Ok(JsValue::from(false));
    };
    let obj = this.to_object(context)?;
    let mut proto = candidate.get_prototype_of();
    while let Some(p) = proto {
        if p.ptr_eq(&obj) {
            return Ok(JsValue::from(true));
        }
        proto = p.get_prototype_of();
    }
    Ok(JsValue::from(false))
}

fn property_is_enumerable(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = this.to_object(context)?;
    let key = args.first().cloned().unwrap_or_else(JsValue::undefined).to_property_key(context)?;
    Ok(JsValue::from(obj.get_own_property(&key).map(|d| d.enumerable()).unwrap_or(false)))
}

fn to_string(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let tag = match this {
        JsValue::Undefined => "Undefined",
        JsValue::Null => "Null",
        JsValue::Object(o) => match &o.borrow().data {
            ObjectData::Array => "Array",
            ObjectData::Function(_) => "Function",
            ObjectData::Error => "Error",
            ObjectData::Boolean(_) => "Boolean",
            ObjectData::Number(_) => "Number",
            ObjectData::String(_) => "String",
            ObjectData::Date(_) => "Date",
            ObjectData::RegExp(_) => "RegExp",
            _ => "Object",
        },
        _ => "Object",
    };
    Ok(JsValue::string(format!("[object {}]", tag)))
}

fn value_of(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::object(this.to_object(context)?))
}

/// Own, enumerable, string-keyed properties in `OwnPropertyKeys` order
/// (spec.md §3 "array index" ordering, then insertion order).
fn enumerable_string_keys(obj: &JsObject) -> Vec<JsString> {
    obj.own_property_keys()
        .into_iter()
        .filter_map(|k| match k {
            PropertyKey::String(s) => Some(s),
            PropertyKey::Symbol(_) => None,
        })
        .filter(|s| {
            obj.get_own_property(&PropertyKey::String(s.clone()))
                .map(|d| d.enumerable())
                .unwrap_or(false)
        })
        .collect()
}

fn keys(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = args.first().cloned().unwrap_or_else(JsValue::undefined).to_object(context)?;
    let items = enumerable_string_keys(&obj).into_iter().map(JsValue::string).collect();
    Ok(JsValue::object(context.new_array(items)))
}

fn values(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = args.first().cloned().unwrap_or_else(JsValue::undefined).to_object(context)?;
    let mut items = Vec::new();
    for key in enumerable_string_keys(&obj) {
        items.push(obj.get(key, context)?);
    }
    Ok(JsValue::object(context.new_array(items)))
}

fn entries(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = args.first().cloned().unwrap_or_else(JsValue::undefined).to_object(context)?;
    let mut items = Vec::new();
    for key in enumerable_string_keys(&obj) {
        let value = obj.get(key.clone(), context)?;
        items.push(JsValue::object(context.new_array(vec![JsValue::string(key), value])));
    }
    Ok(JsValue::object(context.new_array(items)))
}

fn assign(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(target) = args.first() else {
        return Err(JsNativeError::typ().with_message("Object.assign target is undefined").into());
    };
    let target = target.to_object(context)?;
    for source in &args[1..] {
        if source.is_null_or_undefined() {
            continue;
        }
        let source_obj = source.to_object(context)?;
        for key in source_obj.own_property_keys() {
            if source_obj.get_own_property(&key).map(|d| d.enumerable()).unwrap_or(false) {
                let value = source_obj.get(key.clone(), context)?;
                target.set(key, value, true, context)?;
            }
        }
    }
    Ok(JsValue::object(target))
}

fn freeze(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    if let Some(obj) = args.first().and_then(JsValue::as_object) {
        obj.prevent_extensions();
        for key in obj.own_property_keys() {
            let mut builder = PropertyDescriptorBuilder {
                configurable: Some(false),
                ..Default::default()
            };
            if obj.get_own_property(&key).map(|d| d.is_data_descriptor()).unwrap_or(false) {
                builder.writable = Some(false);
            }
            obj.define_own_property(key, builder, context)?;
        }
    }
    Ok(args.first().cloned().unwrap_or_else(JsValue::undefined))
}

fn is_frozen(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = args.first().and_then(JsValue::as_object) else {
        return Ok(JsValue::from(true));
    };
    if obj.is_extensible() {
        return Ok(JsValue::from(false));
    }
    let frozen = obj.own_property_keys().into_iter().all(|k| {
        obj.get_own_property(&k).map(|d| !d.configurable() && d.writable() != Some(true)).unwrap_or(true)
    });
    Ok(JsValue::from(frozen))
}

fn seal(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    if let Some(obj) = args.first().and_then(JsValue::as_object) {
        obj.prevent_extensions();
        for key in obj.own_property_keys() {
            let builder = PropertyDescriptorBuilder {
                configurable: Some(false),
                ..Default::default()
            };
            obj.define_own_property(key, builder, context)?;
        }
    }
    Ok(args.first().cloned().unwrap_or_else(JsValue::undefined))
}

fn is_sealed(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = args.first().and_then(JsValue::as_object) else {
        return Ok(JsValue::from(true));
    };
    if obj.is_extensible() {
        return Ok(JsValue::from(false));
    }
    let sealed = obj.own_property_keys().into_iter().all(|k| obj.get_own_property(&k).map(|d| !d.configurable()).unwrap_or(true));
    Ok(JsValue::from(sealed))
}

fn prevent_extensions(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    if let Some(obj) = args.first().and_then(JsValue::as_object) {
        obj.prevent_extensions();
    }
    Ok(args.first().cloned().unwrap_or_else(JsValue::undefined))
}

fn is_extensible(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(args.first().and_then(JsValue::as_object).map(JsObject::is_extensible).unwrap_or(false)))
}

fn get_prototype_of(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = args.first().cloned().unwrap_or_else(JsValue::undefined).to_object(context)?;
    Ok(obj.get_prototype_of().map(JsValue::object).unwrap_or_else(JsValue::null))
}

fn set_prototype_of(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let target = args.first().cloned().unwrap_or_else(JsValue::undefined);
    let Some(obj) = target.as_object() else {
        return Ok(target);
    };
    let proto = match args.get(1) {
        Some(JsValue::Object(o)) => Some(o.clone()),
        Some(JsValue::Null) | None => None,
        _ => return Err(JsNativeError::typ().with_message("Object prototype may only be an Object or null").into()),
    };
    if !obj.set_prototype_of(proto) {
        return Err(JsNativeError::typ().with_message("cyclic __proto__ value").into());
    }
    let _ = context;
    Ok(target)
}

fn create(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let proto = match args.first() {
        Some(JsValue::Object(o)) => Some(o.clone()),
        Some(JsValue::Null) | None => None,
        _ => return Err(JsNativeError::typ().with_message("Object prototype may only be an Object or null").into()),
    };
    let obj = JsObject::ordinary(proto);
    if let Some(props) = args.get(1) {
        if !props.is_undefined() {
            apply_property_descriptors(&obj, props, context)?;
        }
    }
    Ok(JsValue::object(obj))
}

fn define_property(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = args.first().and_then(JsValue::as_object).cloned() else {
        return Err(JsNativeError::typ().with_message("Object.defineProperty called on non-object").into());
    };
    let key = args.get(1).cloned().unwrap_or_else(JsValue::undefined).to_property_key(context)?;
    let desc = args.get(2).cloned().unwrap_or_else(JsValue::undefined);
    let builder = to_property_descriptor(&desc, context)?;
    if !obj.define_own_property(key, builder, context)? {
        return Err(JsNativeError::typ().with_message("Cannot redefine property").into());
    }
    Ok(JsValue::object(obj))
}

fn define_properties(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = args.first().and_then(JsValue::as_object).cloned() else {
        return Err(JsNativeError::typ().with_message("Object.defineProperties called on non-object").into());
    };
    let props = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    apply_property_descriptors(&obj, &props, context)?;
    Ok(JsValue::object(obj))
}

fn apply_property_descriptors(obj: &JsObject, props: &JsValue, context: &mut Context) -> JsResult<()> {
    let props_obj = props.to_object(context)?;
    for key in enumerable_string_keys(&props_obj) {
        let desc = props_obj.get(key.clone(), context)?;
        let builder = to_property_descriptor(&desc, context)?;
        obj.define_own_property(PropertyKey::String(key), builder, context)?;
    }
    Ok(())
}

pub(crate) fn to_property_descriptor(desc: &JsValue, context: &mut Context) -> JsResult<PropertyDescriptorBuilder> {
    let Some(desc_obj) = desc.as_object() else {
        return Err(JsNativeError::typ().with_message("Property description must be an object").into());
    };
    let mut builder = PropertyDescriptorBuilder::default();
    if desc_obj.has_property(&PropertyKey::from("value"), context)? {
        builder.value = Some(desc_obj.get("value", context)?);
    }
    if desc_obj.has_property(&PropertyKey::from("writable"), context)? {
        builder.writable = Some(desc_obj.get("writable", context)?.to_boolean());
    }
    if desc_obj.has_property(&PropertyKey::from("enumerable"), context)? {
        builder.enumerable = Some(desc_obj.get("enumerable", context)?.to_boolean());
    }
    if desc_obj.has_property(&PropertyKey::from("configurable"), context)? {
        builder.configurable = Some(desc_obj.get("configurable", context)?.to_boolean());
    }
    if desc_obj.has_property(&PropertyKey::from("get"), context)? {
        let get = desc_obj.get("get", context)?;
        builder.get = Some(get.as_object().cloned());
    }
    if desc_obj.has_property(&PropertyKey::from("set"), context)? {
        let set = desc_obj.get("set", context)?;
        builder.set = Some(set.as_object().cloned());
    }
    Ok(builder)
}

fn get_own_property_names(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = args.first().cloned().unwrap_or_else(JsValue::undefined).to_object(context)?;
    let items = obj
        .own_property_keys()
        .into_iter()
        .filter_map(|k| match k {
            PropertyKey::String(s) => Some(JsValue::string(s)),
            PropertyKey::Symbol(_) => None,
        })
        .collect();
    Ok(JsValue::object(context.new_array(items)))
}

fn get_own_property_descriptor(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let obj = args.first().cloned().unwrap_or_else(JsValue::undefined).to_object(context)?;
    let key = args.get(1).cloned().unwrap_or_else(JsValue::undefined).to_property_key(context)?;
    match obj.get_own_property(&key) {
        Some(desc) => Ok(JsValue::object(descriptor_to_object(&desc, context))),
        None => Ok(JsValue::undefined()),
    }
}

/// `FromPropertyDescriptor` (spec.md §3): the inverse of
/// `to_property_descriptor`, used by both `Object.getOwnPropertyDescriptor`
/// and `Reflect.getOwnPropertyDescriptor`.
pub(crate) fn descriptor_to_object(desc: &crate::property::PropertyDescriptor, context: &mut Context) -> JsObject {
    let result = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    match desc {
        crate::property::PropertyDescriptor::Data(d) => {
            result.create_data_property("value", d.value.clone(), Attribute::all());
            result.create_data_property("writable", d.attributes.writable(), Attribute::all());
        }
        crate::property::PropertyDescriptor::Accessor(a) => {
            result.create_data_property("get", a.get.clone().map(JsValue::object).unwrap_or_else(JsValue::undefined), Attribute::all());
            result.create_data_property("set", a.set.clone().map(JsValue::object).unwrap_or_else(JsValue::undefined), Attribute::all());
        }
    }
    result.create_data_property("enumerable", desc.enumerable(), Attribute::all());
    result.create_data_property("configurable", desc.configurable(), Attribute::all());
    result
}

fn from_entries(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let iterable = args.first().cloned().unwrap_or_else(JsValue::undefined);
    let result = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    let mut iter = crate::exec::iterator::JsIterator::from_value(&iterable, context)?;
    while let Some(entry) = iter.next(context)? {
        let entry_obj = entry.to_object(context)?;
        let key = entry_obj.get(0u32, context)?.to_property_key(context)?;
        let value = entry_obj.get(1u32, context)?;
        result.create_data_property(key, value, Attribute::all());
    }
    Ok(JsValue::object(result))
}
