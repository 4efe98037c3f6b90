//! The `Error` hierarchy (spec.md §4.3, §7): the base `Error` constructor
//! plus the native subclasses (`TypeError`, `RangeError`, ...), each with
//! its own prototype chaining to `%Error.prototype%`.

use super::{install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{JsObject, ObjectData},
    property::Attribute,
    value::JsValue,
};

const SUBCLASSES: &[&str] = &["TypeError", "RangeError", "ReferenceError", "SyntaxError", "URIError", "EvalError"];

pub fn init(context: &mut Context) {
    let prototype = context.intrinsics().error_prototype();
    prototype.create_data_property("name", "Error", Attribute::builtin());
    prototype.create_data_property("message", "", Attribute::builtin());
    prototype.create_method("toString", 0, to_string, context);

    let ctor = native_constructor("Error", 1, construct_base, context);
    link_constructor(&ctor, &prototype);
    install_global("Error", ctor.clone(), context);

    for &name in SUBCLASSES {
        let sub_prototype = JsObject::ordinary(Some(prototype.clone()));
        sub_prototype.create_data_property("name", name, Attribute::builtin());
        sub_prototype.create_data_property("message", "", Attribute::builtin());
        let sub_ctor = native_constructor(name, 1, construct_subclass, context);
        sub_ctor.set_prototype_of(Some(ctor.clone()));
        link_constructor(&sub_ctor, &sub_prototype);
        context.intrinsics_mut().insert(format!("%{}.prototype%", name), sub_prototype);
        install_global(name, sub_ctor, context);
    }
}

fn construct_base(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    construct_subclass(this, args, context)
}

fn construct_subclass(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    // the native-constructor path hands us a pre-built ordinary `this`
    // whose prototype already resolved through `new_target.prototype`
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Error constructor called on non-object").into());
    };
    if let Some(m) = args.first() {
        if !m.is_undefined() {
            let message_str = m.to_js_string(context)?;
            obj.create_data_property("message", message_str, Attribute::builtin());
        }
    }
    obj.borrow_mut().data = ObjectData::Error;
    Ok(this.clone())
}

fn to_string(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Error.prototype.toString called on non-object").into());
    };
    let name = obj.get("name", context)?;
    let name = if name.is_undefined() { "Error".to_string() } else { name.to_js_string(context)?.to_string_lossy() };
    let message = obj.get("message", context)?;
    let message = if message.is_undefined() { String::new() } else { message.to_js_string(context)?.to_string_lossy() };
    if message.is_empty() {
        Ok(JsValue::string(name))
    } else if name.is_empty() {
        Ok(JsValue::string(message))
    } else {
        Ok(JsValue::string(format!("{}: {}", name, message)))
    }
}
