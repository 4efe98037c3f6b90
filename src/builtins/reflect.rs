//! `Reflect` (spec.md §4.3): method-ified versions of the object internal
//! methods, grounded the same way `Object`'s static methods are, reusing
//! `object::to_property_descriptor`/`descriptor_to_object` for the
//! descriptor-shaped methods.

use super::{install_global, object::{descriptor_to_object, to_property_descriptor}};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::JsObject,
    property::PropertyKey,
    value::JsValue,
};

pub fn init(context: &mut Context) {
    let reflect = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    reflect.create_method("apply", 3, apply, context);
    reflect.create_method("construct", 2, construct, context);
    reflect.create_method("defineProperty", 3, define_property, context);
    reflect.create_method("deleteProperty", 2, delete_property, context);
    reflect.create_method("get", 2, get, context);
    reflect.create_method("getOwnPropertyDescriptor", 2, get_own_property_descriptor, context);
    reflect.create_method("getPrototypeOf", 1, get_prototype_of, context);
    reflect.create_method("has", 2, has, context);
    reflect.create_method("isExtensible", 1, is_extensible, context);
    reflect.create_method("ownKeys", 1, own_keys, context);
    reflect.create_method("preventExtensions", 1, prevent_extensions, context);
    reflect.create_method("set", 3, set, context);
    reflect.create_method("setPrototypeOf", 2, set_prototype_of, context);
    install_global("Reflect", reflect, context);
}

fn require_object(args: &[JsValue], index: usize, who: &str) -> JsResult<JsObject> {
    args.get(index)
        .and_then(JsValue::as_object)
        .cloned()
        .ok_or_else(|| JsNativeError::typ().with_message(format!("Reflect.{who} called on non-object target")).into())
}

fn array_like_to_list(value: &JsValue, context: &mut Context) -> JsResult<Vec<JsValue>> {
    let Some(obj) = value.as_object() else {
        return Err(JsNativeError::typ().with_message("CreateListFromArrayLike called on non-object").into());
    };
    let len = obj.get("length", context)?.to_length(context)?;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        out.push(obj.get(i as u32, context)?);
    }
    Ok(out)
}

fn apply(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "apply")?;
    if !target.is_callable() {
        return Err(JsNativeError::typ().with_message("Reflect.apply target must be callable").into());
    }
    let this_arg = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    let call_args = match args.get(2) {
        Some(v) if !v.is_null_or_undefined() => array_like_to_list(v, context)?,
        _ => Vec::new(),
    };
    target.call(&this_arg, &call_args, context)
}

fn construct(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "construct")?;
    if !target.is_constructor() {
        return Err(JsNativeError::typ().with_message("Reflect.construct target must be a constructor").into());
    }
    let call_args = match args.get(1) {
        Some(v) if !v.is_null_or_undefined() => array_like_to_list(v, context)?,
        _ => Vec::new(),
    };
    let new_target = match args.get(2) {
        Some(v) if !v.is_undefined() => {
            let Some(nt) = v.as_object().filter(|o| o.is_constructor()) else {
                return Err(JsNativeError::typ().with_message("Reflect.construct newTarget must be a constructor").into());
            };
            nt.clone()
        }
        _ => target.clone(),
    };
    target.construct(&call_args, &new_target, context)
}

fn define_property(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "defineProperty")?;
    let key = args.get(1).cloned().unwrap_or_else(JsValue::undefined).to_property_key(context)?;
    let desc = args.get(2).cloned().unwrap_or_else(JsValue::undefined);
    let builder = to_property_descriptor(&desc, context)?;
    Ok(JsValue::from(target.define_own_property(key, builder, context)?))
}

fn delete_property(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "deleteProperty")?;
    let key = args.get(1).cloned().unwrap_or_else(JsValue::undefined).to_property_key(context)?;
    match target.get_own_property(&key) {
        Some(desc) if !desc.configurable() => Ok(JsValue::from(false)),
        _ => Ok(JsValue::from(target.delete(&key, context)?)),
    }
}

fn get(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "get")?;
    let key = args.get(1).cloned().unwrap_or_else(JsValue::undefined).to_property_key(context)?;
    let receiver = args.get(2).cloned().unwrap_or_else(|| JsValue::object(target.clone()));
    target.get_with_receiver(&key, &receiver, context)
}

fn get_own_property_descriptor(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "getOwnPropertyDescriptor")?;
    let key = args.get(1).cloned().unwrap_or_else(JsValue::undefined).to_property_key(context)?;
    match target.get_own_property(&key) {
        Some(desc) => Ok(JsValue::object(descriptor_to_object(&desc, context))),
        None => Ok(JsValue::undefined()),
    }
}

fn get_prototype_of(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "getPrototypeOf")?;
    Ok(target.get_prototype_of().map(JsValue::object).unwrap_or_else(JsValue::null))
}

fn has(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "has")?;
    let key = args.get(1).cloned().unwrap_or_else(JsValue::undefined).to_property_key(context)?;
    Ok(JsValue::from(target.has_property(&key, context)?))
}

fn is_extensible(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "isExtensible")?;
    Ok(JsValue::from(target.is_extensible()))
}

fn own_keys(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "ownKeys")?;
    let items = target
        .own_property_keys()
        .into_iter()
        .map(|k| match k {
            PropertyKey::String(s) => JsValue::string(s),
            PropertyKey::Symbol(s) => JsValue::Symbol(s),
        })
        .collect();
    Ok(JsValue::object(context.new_array(items)))
}

fn prevent_extensions(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "preventExtensions")?;
    Ok(JsValue::from(target.prevent_extensions()))
}

fn set(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "set")?;
    let key = args.get(1).cloned().unwrap_or_else(JsValue::undefined).to_property_key(context)?;
    let value = args.get(2).cloned().unwrap_or_else(JsValue::undefined);
    let receiver = args.get(3).cloned().unwrap_or_else(|| JsValue::object(target.clone()));
    if receiver.as_object().is_none() {
        return Err(JsNativeError::typ().with_message("Reflect.set receiver must be an object").into());
    }
    Ok(JsValue::from(target.set_with_receiver(&key, value, &receiver, false, context)?))
}

fn set_prototype_of(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "setPrototypeOf")?;
    let proto = match args.get(1) {
        Some(JsValue::Object(o)) => Some(o.clone()),
        Some(JsValue::Null) | None => None,
        _ => return Err(JsNativeError::typ().with_message("Reflect.setPrototypeOf prototype must be an object or null").into()),
    };
    Ok(JsValue::from(target.set_prototype_of(proto)))
}
