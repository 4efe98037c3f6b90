//! `Proxy` (spec.md §4.3): builds `ObjectData::Proxy { target, handler,
//! revoked }`; trap dispatch itself lives in
//! `object::internal_methods` (`get`/`set`/`has`/`delete`/`defineProperty`
//! plus `[[Call]]`/`[[Construct]]` for a callable target). `revocable`'s
//! revoker needs to close over a specific proxy, which `NativeFunction`
//! can't do on its own (it's a bare `fn` pointer); it's built the same way
//! `promise.rs`'s reactions are, wrapping a native function in a
//! `FunctionObject::Bound` whose `bound_this` is the proxy to revoke.

use super::{install_global, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{FunctionObject, JsObject, NativeFunction, ObjectData},
    property::Attribute,
    value::JsValue,
};

pub fn init(context: &mut Context) {
    let ctor = native_constructor("Proxy", 2, construct, context);
    ctor.create_method("revocable", 2, revocable, context);
    install_global("Proxy", ctor, context);
}

fn require_object(args: &[JsValue], index: usize, who: &str) -> JsResult<JsObject> {
    args.get(index)
        .and_then(JsValue::as_object)
        .cloned()
        .ok_or_else(|| JsNativeError::typ().with_message(format!("Proxy {who} must be an object")).into())
}

fn construct(this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "target")?;
    let handler = require_object(args, 1, "handler")?;
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Proxy constructor called on non-object").into());
    };
    obj.borrow_mut().data = ObjectData::Proxy { target, handler, revoked: false };
    Ok(this.clone())
}

fn revocable(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let target = require_object(args, 0, "target")?;
    let handler = require_object(args, 1, "handler")?;
    let object_proto = context.intrinsics().object_prototype();
    let p = JsObject::from_data(
        ObjectData::Proxy { target, handler, revoked: false },
        Some(object_proto.clone()),
    );

    let revoker = bound_native(revoke_impl, JsValue::object(p.clone()), context);

    let result = JsObject::ordinary(Some(object_proto));
    result.create_data_property("proxy", p, Attribute::all());
    result.create_data_property("revoke", revoker, Attribute::all());
    Ok(JsValue::object(result))
}

fn bound_native(native: NativeFunction, bound_this: JsValue, context: &Context) -> JsObject {
    let target = JsObject::native_function(None, 0, native, context);
    JsObject::from_data(
        ObjectData::Function(FunctionObject::Bound {
            target,
            bound_this,
            bound_args: Vec::new(),
        }),
        Some(context.intrinsics().function_prototype()),
    )
}

fn revoke_impl(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    if let Some(p) = this.as_object() {
        if let ObjectData::Proxy { revoked, .. } = &mut p.borrow_mut().data {
            *revoked = true;
        }
    }
    Ok(JsValue::undefined())
}
