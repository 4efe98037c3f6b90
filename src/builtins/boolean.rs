//! `Boolean` (spec.md §4.3): a thin wrapper object around the primitive.

use super::{install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{JsObject, ObjectData},
    value::JsValue,
};

pub fn init(context: &mut Context) {
    let prototype = context.intrinsics().boolean_prototype();
    prototype.create_method("toString", 0, to_string, context);
    prototype.create_method("valueOf", 0, value_of, context);

    let ctor = native_constructor("Boolean", 1, construct, context);
    link_constructor(&ctor, &prototype);
    install_global("Boolean", ctor, context);
}

fn construct(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let value = args.first().map(JsValue::to_boolean).unwrap_or(false);
    Ok(JsValue::object(JsObject::from_data(ObjectData::Boolean(value), Some(context.intrinsics().boolean_prototype()))))
}

fn this_boolean(this: &JsValue) -> JsResult<bool> {
    match this {
        JsValue::Boolean(b) => Ok(*b),
        JsValue::Object(o) => match o.borrow().data {
            ObjectData::Boolean(b) => Ok(b),
            _ => Err(JsNativeError::typ().with_message("Boolean.prototype method called on incompatible receiver").into()),
        },
        _ => Err(JsNativeError::typ().with_message("Boolean.prototype method called on incompatible receiver").into()),
    }
}

fn to_string(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::string(if this_boolean(this)? { "true" } else { "false" }))
}

fn value_of(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(this_boolean(this)?))
}
