//! The ordinary object internal methods (spec.md §4.2): `[[GetPrototypeOf]]`,
//! `[[SetPrototypeOf]]`, `[[GetOwnProperty]]`, `[[DefineOwnProperty]]`,
//! `[[HasProperty]]`, `[[Get]]`, `[[Set]]`, `[[Delete]]`.
//!
//! Exotic objects (`Array`, `String`, `Arguments`, `Proxy`, ...) override a
//! subset of these. `Array`'s `length` invariant is enforced in
//! `define_own_property`; `Proxy` forwards `[[Get]]`/`[[Set]]`/
//! `[[HasProperty]]`/`[[Delete]]`/`[[DefineOwnProperty]]` to its handler
//! traps (`proxy::trap_get` et al. in this module), falling back to the
//! target's own algorithm when a trap is absent. Every other kind uses the
//! ordinary algorithm verbatim.

use super::{JsObject, ObjectData};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    property::{Attribute, DataDescriptor, PropertyDescriptor, PropertyDescriptorBuilder, PropertyKey},
    value::JsValue,
};

fn require_live_proxy(object: &JsObject, trap: &str) -> JsResult<Option<(JsObject, JsObject)>> {
    match &object.borrow().data {
        ObjectData::Proxy { revoked: true, .. } => {
            Err(JsNativeError::typ().with_message(format!("cannot perform '{trap}' on a proxy that has been revoked")).into())
        }
        ObjectData::Proxy { target, handler, .. } => Ok(Some((target.clone(), handler.clone()))),
        _ => Ok(None),
    }
}

pub(super) fn key_to_value(key: &PropertyKey) -> JsValue {
    match key {
        PropertyKey::String(s) => JsValue::String(s.clone()),
        PropertyKey::Symbol(s) => JsValue::Symbol(s.clone()),
    }
}

fn trap(handler: &JsObject, name: &str, context: &mut Context) -> JsResult<Option<JsObject>> {
    let value = handler.get(name, context)?;
    Ok(value.as_object().filter(|o| o.is_callable()).cloned())
}

/// `[[Call]]` forwarding for a Proxy whose target is callable: the `apply`
/// trap, falling back to invoking the target directly.
pub(super) fn proxy_call(object: &JsObject, this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some((target, handler)) = require_live_proxy(object, "apply")? else {
        return Err(JsNativeError::typ().with_message("not a proxy").into());
    };
    match trap(&handler, "apply", context)? {
        Some(f) => {
            let arg_array = context.new_array(args.to_vec());
            f.call(&JsValue::object(handler), &[JsValue::object(target), this.clone(), JsValue::object(arg_array)], context)
        }
        None => target.call(this, args, context),
    }
}

/// `[[Construct]]` forwarding for a Proxy whose target is a constructor:
/// the `construct` trap, falling back to constructing the target directly.
pub(super) fn proxy_construct(
    object: &JsObject,
    args: &[JsValue],
    new_target: &JsObject,
    context: &mut Context,
) -> JsResult<JsValue> {
    let Some((target, handler)) = require_live_proxy(object, "construct")? else {
        return Err(JsNativeError::typ().with_message("not a proxy").into());
    };
    match trap(&handler, "construct", context)? {
        Some(f) => {
            let arg_array = context.new_array(args.to_vec());
            let result = f.call(
                &JsValue::object(handler),
                &[JsValue::object(target), JsValue::object(arg_array), JsValue::object(new_target.clone())],
                context,
            )?;
            if result.as_object().is_none() {
                return Err(JsNativeError::typ().with_message("proxy construct trap must return an object").into());
            }
            Ok(result)
        }
        None => target.construct(args, new_target, context),
    }
}

pub fn ordinary_get_prototype_of(object: &JsObject) -> Option<JsObject> {
    object.borrow().prototype().cloned()
}

pub fn ordinary_set_prototype_of(object: &JsObject, proto: Option<JsObject>) -> bool {
    let current = object.borrow().prototype().cloned();
    match (&current, &proto) {
        (Some(a), Some(b)) if a.ptr_eq(b) => return true,
        (None, None) => return true,
        _ => {}
    }

    if !object.borrow().extensible() {
        return false;
    }

    let mut p = proto.clone();
    while let Some(candidate) = p {
        if candidate.ptr_eq(object) {
            return false;
        }
        p = candidate.get_prototype_of();
    }

    object.borrow_mut().set_prototype(proto);
    true
}

pub fn ordinary_get_own_property(object: &JsObject, key: &PropertyKey) -> Option<PropertyDescriptor> {
    if let ObjectData::String(s) = &object.borrow().data {
        if let Some(index) = key.as_array_index() {
            if let Some(unit) = s.code_unit_at(index as usize) {
                let mut attrs = Attribute::default();
                attrs.set_enumerable(true);
                return Some(PropertyDescriptor::data(
                    crate::string::JsString::from_utf16(vec![unit]),
                    attrs,
                ));
            }
        }
    }
    object.borrow().properties().get(key).cloned()
}

pub fn ordinary_has_property(
    object: &JsObject,
    key: &PropertyKey,
    context: &mut Context,
) -> JsResult<bool> {
    if let Some((target, handler)) = require_live_proxy(object, "has")? {
        return match trap(&handler, "has", context)? {
            Some(f) => Ok(f.call(&JsValue::object(handler), &[JsValue::object(target), key_to_value(key)], context)?.to_boolean()),
            None => target.has_property(key, context),
        };
    }
    if ordinary_get_own_property(object, key).is_some() {
        return Ok(true);
    }
    match object.get_prototype_of() {
        Some(parent) => parent.has_property(key, context),
        None => Ok(false),
    }
}

pub fn ordinary_get(
    object: &JsObject,
    key: &PropertyKey,
    receiver: &JsValue,
    context: &mut Context,
) -> JsResult<JsValue> {
    if let Some((target, handler)) = require_live_proxy(object, "get")? {
        return match trap(&handler, "get", context)? {
            Some(f) => f.call(&JsValue::object(handler), &[JsValue::object(target), key_to_value(key), receiver.clone()], context),
            None => target.get_with_receiver(key, receiver, context),
        };
    }
    match ordinary_get_own_property(object, key) {
        Some(PropertyDescriptor::Data(d)) => Ok(d.value),
        Some(PropertyDescriptor::Accessor(a)) => match a.get {
            Some(getter) => getter.call(receiver, &[], context),
            None => Ok(JsValue::undefined()),
        },
        None => match object.get_prototype_of() {
            Some(parent) => parent.get_with_receiver(key, receiver, context),
            None => Ok(JsValue::undefined()),
        },
    }
}

pub fn ordinary_set(
    object: &JsObject,
    key: PropertyKey,
    value: JsValue,
    receiver: &JsValue,
    throw: bool,
    context: &mut Context,
) -> JsResult<bool> {
    if let Some((target, handler)) = require_live_proxy(object, "set")? {
        return match trap(&handler, "set", context)? {
            Some(f) => Ok(f
                .call(&JsValue::object(handler), &[JsValue::object(target), key_to_value(&key), value, receiver.clone()], context)?
                .to_boolean()),
            None => target.set_with_receiver(&key, value, receiver, throw, context),
        };
    }
    let own_desc = ordinary_get_own_property(object, &key);

    let own_desc = match own_desc {
        Some(d) => d,
        None => match object.get_prototype_of() {
            Some(parent) => return parent.set(key, value, throw, context),
            None => PropertyDescriptor::data(JsValue::undefined(), Attribute::all()),
        },
    };

    match own_desc {
        PropertyDescriptor::Data(d) => {
            if !d.attributes.writable() {
                return reject(throw, "Cannot assign to read only property");
            }
            let Some(receiver_obj) = receiver.as_object() else {
                return reject(throw, "Cannot create property on primitive receiver");
            };
            match ordinary_get_own_property(receiver_obj, &key) {
                Some(PropertyDescriptor::Accessor(_)) => reject(throw, "Cannot set over an accessor property"),
                Some(PropertyDescriptor::Data(existing)) => {
                    if !existing.attributes.writable() {
                        return reject(throw, "Cannot assign to read only property");
                    }
                    let builder = PropertyDescriptorBuilder {
                        value: Some(value),
                        ..Default::default()
                    };
                    ordinary_define_own_property(receiver_obj, key, builder, context)
                }
                None => {
                    if receiver_obj.ptr_eq(object) {
                        let builder = PropertyDescriptorBuilder {
                            value: Some(value),
                            writable: Some(true),
                            enumerable: Some(true),
                            configurable: Some(true),
                        };
                        ordinary_define_own_property(receiver_obj, key, builder, context)
                    } else {
                        receiver_obj.create_data_property(key, value, Attribute::all());
                        Ok(true)
                    }
                }
            }
        }
        PropertyDescriptor::Accessor(a) => match a.set {
            Some(setter) => {
                setter.call(receiver, &[value], context)?;
                Ok(true)
            }
            None => reject(throw, "Cannot set property which has only a getter"),
        },
    }
}

fn reject(throw: bool, message: &str) -> JsResult<bool> {
    if throw {
        Err(JsNativeError::typ().with_message(message).into())
    } else {
        Ok(false)
    }
}

/// `ValidateAndApplyPropertyDescriptor` + `[[DefineOwnProperty]]` (spec.md
/// §4.2): merges a partial descriptor request against the existing one (if
/// any), honoring the `configurable`/`writable` reconfiguration rules.
fn descriptor_builder_to_object(desc: &PropertyDescriptorBuilder, context: &mut Context) -> JsObject {
    let result = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    if desc.is_accessor_request() {
        if let Some(get) = &desc.get {
            result.create_data_property(
                "get",
                get.clone().map(JsValue::object).unwrap_or_else(JsValue::undefined),
                Attribute::all(),
            );
        }
        if let Some(set) = &desc.set {
            result.create_data_property(
                "set",
                set.clone().map(JsValue::object).unwrap_or_else(JsValue::undefined),
                Attribute::all(),
            );
        }
    } else {
        if let Some(value) = &desc.value {
            result.create_data_property("value", value.clone(), Attribute::all());
        }
        if let Some(writable) = desc.writable {
            result.create_data_property("writable", writable, Attribute::all());
        }
    }
    if let Some(enumerable) = desc.enumerable {
        result.create_data_property("enumerable", enumerable, Attribute::all());
    }
    if let Some(configurable) = desc.configurable {
        result.create_data_property("configurable", configurable, Attribute::all());
    }
    result
}

pub fn ordinary_define_own_property(
    object: &JsObject,
    key: PropertyKey,
    desc: PropertyDescriptorBuilder,
    context: &mut Context,
) -> JsResult<bool> {
    if let Some((target, handler)) = require_live_proxy(object, "defineProperty")? {
        return match trap(&handler, "defineProperty", context)? {
            Some(f) => {
                let desc_obj = descriptor_builder_to_object(&desc, context);
                Ok(f.call(
                    &JsValue::object(handler),
                    &[JsValue::object(target), key_to_value(&key), JsValue::object(desc_obj)],
                    context,
                )?
                .to_boolean())
            }
            None => target.define_own_property(key, desc, context),
        };
    }
    let current = ordinary_get_own_property(object, &key);
    let extensible = object.borrow().extensible();

    let Some(current) = current else {
        if !extensible {
            return Ok(false);
        }
        let merged = if desc.is_accessor_request() {
            PropertyDescriptor::accessor(
                desc.get.flatten(),
                desc.set.flatten(),
                desc.enumerable.unwrap_or(false),
                desc.configurable.unwrap_or(false),
            )
        } else {
            let mut attrs = Attribute::default();
            attrs.set_writable(desc.writable.unwrap_or(false));
            attrs.set_enumerable(desc.enumerable.unwrap_or(false));
            attrs.set_configurable(desc.configurable.unwrap_or(false));
            PropertyDescriptor::data(desc.value.unwrap_or(JsValue::undefined()), attrs)
        };
        finish_define(object, key, merged, context)?;
        return Ok(true);
    };

    if desc.is_generic_request()
        && desc.enumerable.is_none()
        && desc.configurable.is_none()
    {
        return Ok(true);
    }

    if !current.configurable() {
        if desc.configurable == Some(true) {
            return Ok(false);
        }
        if let Some(enumerable) = desc.enumerable {
            if enumerable != current.enumerable() {
                return Ok(false);
            }
        }
        if !desc.is_generic_request() && desc.is_accessor_request() != current.is_accessor_descriptor() {
            return Ok(false);
        }
        if let PropertyDescriptor::Data(d) = &current {
            if !d.attributes.writable() {
                if desc.writable == Some(true) {
                    return Ok(false);
                }
                if let Some(v) = &desc.value {
                    if !crate::value::same_value(v, &d.value) {
                        return Ok(false);
                    }
                }
            }
        }
    }

    let merged = merge_descriptor(current, desc);
    finish_define(object, key, merged, context)
}

fn merge_descriptor(current: PropertyDescriptor, desc: PropertyDescriptorBuilder) -> PropertyDescriptor {
    if desc.is_accessor_request() {
        let (get, set, enumerable, configurable) = match &current {
            PropertyDescriptor::Accessor(a) => (a.get.clone(), a.set.clone(), a.enumerable, a.configurable),
            PropertyDescriptor::Data(d) => (None, None, d.attributes.enumerable(), d.attributes.configurable()),
        };
        PropertyDescriptor::accessor(
            desc.get.unwrap_or(get),
            desc.set.unwrap_or(set),
            desc.enumerable.unwrap_or(enumerable),
            desc.configurable.unwrap_or(configurable),
        )
    } else {
        let (value, writable, enumerable, configurable) = match &current {
            PropertyDescriptor::Data(d) => (
                d.value.clone(),
                d.attributes.writable(),
                d.attributes.enumerable(),
                d.attributes.configurable(),
            ),
            PropertyDescriptor::Accessor(a) => (JsValue::undefined(), false, a.enumerable, a.configurable),
        };
        let mut attrs = Attribute::default();
        attrs.set_writable(desc.writable.unwrap_or(writable));
        attrs.set_enumerable(desc.enumerable.unwrap_or(enumerable));
        attrs.set_configurable(desc.configurable.unwrap_or(configurable));
        PropertyDescriptor::Data(DataDescriptor {
            value: desc.value.unwrap_or(value),
            attributes: attrs,
        })
    }
}

fn finish_define(
    object: &JsObject,
    key: PropertyKey,
    descriptor: PropertyDescriptor,
    _context: &mut Context,
) -> JsResult<bool> {
    if object.is_array() {
        array_define_own_property(object, &key, &descriptor)?;
    }
    object.borrow_mut().properties_mut().insert(key, descriptor);
    Ok(true)
}

/// Array's one exotic behavior (spec.md §4.2): writing past the current
/// `length`, or writing `length` itself, must keep the invariant that
/// `length` is always one greater than the highest existing index.
fn array_define_own_property(
    object: &JsObject,
    key: &PropertyKey,
    descriptor: &PropertyDescriptor,
) -> JsResult<()> {
    if let Some(index) = key.as_array_index() {
        let current_len = array_length(object);
        if index >= current_len {
            set_array_length(object, index + 1);
        }
        return Ok(());
    }
    if let PropertyKey::String(s) = key {
        if s.to_string_lossy() == "length" {
            if let Some(value) = descriptor.value() {
                if let Some(n) = value.as_number() {
                    let new_len = n as u32;
                    let old_len = array_length(object);
                    if new_len < old_len {
                        let mut inner = object.borrow_mut();
                        let indices: Vec<u32> = inner
                            .properties()
                            .index_keys()
                            .filter(|i| *i >= new_len)
                            .collect();
                        for i in indices {
                            inner.properties_mut().remove(&PropertyKey::from(i));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn length_key() -> PropertyKey {
    PropertyKey::from(crate::string::JsString::from("length"))
}

fn array_length(object: &JsObject) -> u32 {
    match object.borrow().properties().get(&length_key()) {
        Some(PropertyDescriptor::Data(d)) => d.value.as_number().unwrap_or(0.0) as u32,
        _ => 0,
    }
}

fn set_array_length(object: &JsObject, len: u32) {
    let mut attrs = Attribute::default();
    attrs.set_writable(true);
    object
        .borrow_mut()
        .properties_mut()
        .insert(length_key(), PropertyDescriptor::data(JsValue::from(len), attrs));
}

pub fn ordinary_delete(object: &JsObject, key: &PropertyKey, context: &mut Context) -> JsResult<bool> {
    if let Some((target, handler)) = require_live_proxy(object, "deleteProperty")? {
        return match trap(&handler, "deleteProperty", context)? {
            Some(f) => Ok(f
                .call(&JsValue::object(handler), &[JsValue::object(target), key_to_value(key)], context)?
                .to_boolean()),
            None => Ok(target.delete(key, context)?),
        };
    }
    Ok(match ordinary_get_own_property(object, key) {
        None => true,
        Some(desc) => {
            if !desc.configurable() {
                false
            } else {
                object.borrow_mut().properties_mut().remove(key);
                true
            }
        }
    })
}
