//! `WeakMap`/`WeakSet`/`WeakRef`/`FinalizationRegistry` (spec.md §4.3):
//! membership/reference keyed on object identity. Backed by plain strong
//! references since there is no GC finalization hook to drop entries or
//! clear a `WeakRef`'s target when it would otherwise become unreachable;
//! `ObjectData::WeakMap`/`WeakSet`/`WeakRef`/`FinalizationRegistry` all
//! model that as a liveness approximation rather than a true weak
//! reference. `FinalizationRegistry`'s callback is consequently never
//! invoked — there is nothing that would ever call it.

use super::{install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{FinalizationEntry, FinalizationRegistryData, JsObject, ObjectData},
    value::JsValue,
};

pub fn init(context: &mut Context) {
    init_weak_map(context);
    init_weak_set(context);
    init_weak_ref(context);
    init_finalization_registry(context);
}

fn init_weak_map(context: &mut Context) {
    let prototype = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    prototype.create_method("get", 1, map_get, context);
    prototype.create_method("set", 2, map_set, context);
    prototype.create_method("has", 1, map_has, context);
    prototype.create_method("delete", 1, map_delete, context);

    let ctor = native_constructor("WeakMap", 0, map_construct, context);
    link_constructor(&ctor, &prototype);
    context.intrinsics_mut().insert("%WeakMap.prototype%", prototype);
    install_global("WeakMap", ctor, context);
}

fn init_weak_set(context: &mut Context) {
    let prototype = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    prototype.create_method("add", 1, set_add, context);
    prototype.create_method("has", 1, set_has, context);
    prototype.create_method("delete", 1, set_delete, context);

    let ctor = native_constructor("WeakSet", 0, set_construct, context);
    link_constructor(&ctor, &prototype);
    context.intrinsics_mut().insert("%WeakSet.prototype%", prototype);
    install_global("WeakSet", ctor, context);
}

fn require_object_key(value: &JsValue, who: &str) -> JsResult<JsObject> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| JsNativeError::typ().with_message(format!("{who}: key must be an object")).into())
}

fn map_construct(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("WeakMap constructor called on non-object").into());
    };
    obj.borrow_mut().data = ObjectData::WeakMap(Vec::new());
    if let Some(iterable) = args.first().filter(|v| !v.is_null_or_undefined()) {
        let mut iter = crate::exec::iterator::JsIterator::from_value(iterable, context)?;
        while let Some(entry) = iter.next(context)? {
            let entry_obj = entry.to_object(context)?;
            let key = require_object_key(&entry_obj.get(0u32, context)?, "WeakMap")?;
            let value = entry_obj.get(1u32, context)?;
            let mut borrowed = obj.borrow_mut();
            let ObjectData::WeakMap(entries) = &mut borrowed.data else { unreachable!() };
            entries.retain(|(k, _)| !k.ptr_eq(&key));
            entries.push((key, value));
        }
    }
    Ok(this.clone())
}

fn map_get(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("WeakMap.prototype.get called on incompatible receiver").into());
    };
    let Some(key) = args.first().and_then(JsValue::as_object) else {
        return Ok(JsValue::undefined());
    };
    let borrowed = obj.borrow();
    let ObjectData::WeakMap(entries) = &borrowed.data else {
        return Err(JsNativeError::typ().with_message("WeakMap.prototype.get called on incompatible receiver").into());
    };
    Ok(entries.iter().find(|(k, _)| k.ptr_eq(key)).map(|(_, v)| v.clone()).unwrap_or_else(JsValue::undefined))
}

fn map_set(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("WeakMap.prototype.set called on non-object").into());
    };
    let key = require_object_key(&args.first().cloned().unwrap_or_else(JsValue::undefined), "WeakMap.prototype.set")?;
    let value = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    let mut borrowed = obj.borrow_mut();
    let ObjectData::WeakMap(entries) = &mut borrowed.data else {
        return Err(JsNativeError::typ().with_message("WeakMap.prototype.set called on incompatible receiver").into());
    };
    entries.retain(|(k, _)| !k.ptr_eq(&key));
    entries.push((key, value));
    drop(borrowed);
    Ok(this.clone())
}

fn map_has(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("WeakMap.prototype.has called on incompatible receiver").into());
    };
    let Some(key) = args.first().and_then(JsValue::as_object) else {
        return Ok(JsValue::from(false));
    };
    let borrowed = obj.borrow();
    let ObjectData::WeakMap(entries) = &borrowed.data else {
        return Err(JsNativeError::typ().with_message("WeakMap.prototype.has called on incompatible receiver").into());
    };
    Ok(JsValue::from(entries.iter().any(|(k, _)| k.ptr_eq(key))))
}

fn map_delete(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("WeakMap.prototype.delete called on non-object").into());
    };
    let Some(key) = args.first().and_then(JsValue::as_object) else {
        return Ok(JsValue::from(false));
    };
    let mut borrowed = obj.borrow_mut();
    let ObjectData::WeakMap(entries) = &mut borrowed.data else {
        return Err(JsNativeError::typ().with_message("WeakMap.prototype.delete called on incompatible receiver").into());
    };
    let len_before = entries.len();
    entries.retain(|(k, _)| !k.ptr_eq(key));
    Ok(JsValue::from(entries.len() != len_before))
}

fn set_construct(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("WeakSet constructor called on non-object").into());
    };
    obj.borrow_mut().data = ObjectData::WeakSet(Vec::new());
    if let Some(iterable) = args.first().filter(|v| !v.is_null_or_undefined()) {
        let mut iter = crate::exec::iterator::JsIterator::from_value(iterable, context)?;
        while let Some(value) = iter.next(context)? {
            let value = require_object_key(&value, "WeakSet")?;
            let mut borrowed = obj.borrow_mut();
            let ObjectData::WeakSet(entries) = &mut borrowed.data else { unreachable!() };
            if !entries.iter().any(|k| k.ptr_eq(&value)) {
                entries.push(value);
            }
        }
    }
    Ok(this.clone())
}

fn set_add(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("WeakSet.prototype.add called on non-object").into());
    };
    let value = require_object_key(&args.first().cloned().unwrap_or_else(JsValue::undefined), "WeakSet.prototype.add")?;
    let mut borrowed = obj.borrow_mut();
    let ObjectData::WeakSet(entries) = &mut borrowed.data else {
        return Err(JsNativeError::typ().with_message("WeakSet.prototype.add called on incompatible receiver").into());
    };
    if !entries.iter().any(|k| k.ptr_eq(&value)) {
        entries.push(value);
    }
    drop(borrowed);
    Ok(this.clone())
}

fn set_has(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("WeakSet.prototype.has called on incompatible receiver").into());
    };
    let Some(key) = args.first().and_then(JsValue::as_object) else {
        return Ok(JsValue::from(false));
    };
    let borrowed = obj.borrow();
    let ObjectData::WeakSet(entries) = &borrowed.data else {
        return Err(JsNativeError::typ().with_message("WeakSet.prototype.has called on incompatible receiver").into());
    };
    Ok(JsValue::from(entries.iter().any(|k| k.ptr_eq(key))))
}

fn set_delete(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("WeakSet.prototype.delete called on non-object").into());
    };
    let Some(key) = args.first().and_then(JsValue::as_object) else {
        return Ok(JsValue::from(false));
    };
    let mut borrowed = obj.borrow_mut();
    let ObjectData::WeakSet(entries) = &mut borrowed.data else {
        return Err(JsNativeError::typ().with_message("WeakSet.prototype.delete called on incompatible receiver").into());
    };
    let len_before = entries.len();
    entries.retain(|k| !k.ptr_eq(key));
    Ok(JsValue::from(entries.len() != len_before))
}

fn init_weak_ref(context: &mut Context) {
    let prototype = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    prototype.create_method("deref", 0, weak_ref_deref, context);

    let ctor = native_constructor("WeakRef", 1, weak_ref_construct, context);
    link_constructor(&ctor, &prototype);
    context.intrinsics_mut().insert("%WeakRef.prototype%", prototype);
    install_global("WeakRef", ctor, context);
}

fn weak_ref_construct(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("WeakRef constructor called on non-object").into());
    };
    let target = require_object_key(&args.first().cloned().unwrap_or_else(JsValue::undefined), "WeakRef")?;
    obj.borrow_mut().data = ObjectData::WeakRef(target);
    Ok(this.clone())
}

fn weak_ref_deref(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("WeakRef.prototype.deref called on incompatible receiver").into());
    };
    let borrowed = obj.borrow();
    let ObjectData::WeakRef(target) = &borrowed.data else {
        return Err(JsNativeError::typ().with_message("WeakRef.prototype.deref called on incompatible receiver").into());
    };
    Ok(JsValue::object(target.clone()))
}

fn init_finalization_registry(context: &mut Context) {
    let prototype = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    prototype.create_method("register", 2, registry_register, context);
    prototype.create_method("unregister", 1, registry_unregister, context);

    let ctor = native_constructor("FinalizationRegistry", 1, registry_construct, context);
    link_constructor(&ctor, &prototype);
    context.intrinsics_mut().insert("%FinalizationRegistry.prototype%", prototype);
    install_global("FinalizationRegistry", ctor, context);
}

fn registry_construct(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("FinalizationRegistry constructor called on non-object").into());
    };
    let Some(callback) = args.first().and_then(JsValue::as_object).cloned() else {
        return Err(JsNativeError::typ().with_message("FinalizationRegistry: callback must be a function").into());
    };
    if !callback.is_callable() {
        return Err(JsNativeError::typ().with_message("FinalizationRegistry: callback must be a function").into());
    }
    obj.borrow_mut().data = ObjectData::FinalizationRegistry(FinalizationRegistryData {
        callback,
        entries: Vec::new(),
    });
    Ok(this.clone())
}

fn registry_register(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("FinalizationRegistry.prototype.register called on non-object").into());
    };
    let target = require_object_key(
        &args.first().cloned().unwrap_or_else(JsValue::undefined),
        "FinalizationRegistry.prototype.register",
    )?;
    let held_value = args.get(1).cloned().unwrap_or_else(JsValue::undefined);
    let unregister_token = args.get(2).and_then(JsValue::as_object).cloned();
    if let Some(token) = &unregister_token {
        if token.ptr_eq(&target) {
            return Err(JsNativeError::typ()
                .with_message("FinalizationRegistry.prototype.register: target and unregister token must differ")
                .into());
        }
    }
    let mut borrowed = obj.borrow_mut();
    let ObjectData::FinalizationRegistry(registry) = &mut borrowed.data else {
        return Err(JsNativeError::typ()
            .with_message("FinalizationRegistry.prototype.register called on incompatible receiver")
            .into());
    };
    registry.entries.push(FinalizationEntry {
        target,
        held_value,
        unregister_token,
    });
    Ok(JsValue::undefined())
}

fn registry_unregister(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("FinalizationRegistry.prototype.unregister called on non-object").into());
    };
    let Some(token) = args.first().and_then(JsValue::as_object) else {
        return Ok(JsValue::from(false));
    };
    let mut borrowed = obj.borrow_mut();
    let ObjectData::FinalizationRegistry(registry) = &mut borrowed.data else {
        return Err(JsNativeError::typ()
            .with_message("FinalizationRegistry.prototype.unregister called on incompatible receiver")
            .into());
    };
    let len_before = registry.entries.len();
    registry.entries.retain(|e| !e.unregister_token.as_ref().is_some_and(|t| t.ptr_eq(token)));
    Ok(JsValue::from(registry.entries.len() != len_before))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_instance(context: &mut Context, proto_key: &str) -> JsValue {
        JsValue::object(JsObject::ordinary(context.intrinsics().get(proto_key)))
    }

    #[test]
    fn weak_ref_deref_returns_the_target() {
        let mut context = Context::default();
        let target = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
        let this = new_instance(&mut context, "%WeakRef.prototype%");
        weak_ref_construct(&this, &[JsValue::object(target.clone())], &mut context).unwrap();
        let derefed = weak_ref_deref(&this, &[], &mut context).unwrap();
        assert!(derefed.as_object().unwrap().ptr_eq(&target));
    }

    #[test]
    fn weak_ref_construct_rejects_a_non_object_target() {
        let mut context = Context::default();
        let this = new_instance(&mut context, "%WeakRef.prototype%");
        assert!(weak_ref_construct(&this, &[JsValue::from(1.0)], &mut context).is_err());
    }

    #[test]
    fn finalization_registry_register_and_unregister() {
        let mut context = Context::default();
        let callback = JsObject::native_function(None, 1, |_this, _args, _context| Ok(JsValue::undefined()), &context);
        let this = new_instance(&mut context, "%FinalizationRegistry.prototype%");
        registry_construct(&this, &[JsValue::object(callback)], &mut context).unwrap();

        let target = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
        let token = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
        registry_register(
            &this,
            &[JsValue::object(target.clone()), JsValue::from(1.0), JsValue::object(token.clone())],
            &mut context,
        )
        .unwrap();

        let removed = registry_unregister(&this, &[JsValue::object(token.clone())], &mut context).unwrap();
        assert!(removed.to_boolean());
        let removed_again = registry_unregister(&this, &[JsValue::object(token)], &mut context).unwrap();
        assert!(!removed_again.to_boolean());
    }

    #[test]
    fn finalization_registry_rejects_a_non_callable_callback() {
        let mut context = Context::default();
        let this = new_instance(&mut context, "%FinalizationRegistry.prototype%");
        assert!(registry_construct(&this, &[JsValue::undefined()], &mut context).is_err());
    }
}
