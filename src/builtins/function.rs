//! `Function` (spec.md §4.4, §4.3): `Function.prototype.call/apply/bind`
//! and the shared `[[Call]]`/`[[Construct]]` entry points used by every
//! other constructor. The `Function` constructor itself only supports the
//! trivial zero-body form, since compiling dynamic source is out of scope
//! (spec.md's explicit Non-goal on parsing).

use super::{install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{FunctionObject, JsObject, ObjectData},
    property::Attribute,
    value::JsValue,
};

pub fn init(context: &mut Context) {
    let prototype = context.intrinsics().function_prototype();

    prototype.create_method("call", 1, call, context);
    prototype.create_method("apply", 2, apply, context);
    prototype.create_method("bind", 1, bind, context);
    prototype.create_method("toString", 0, to_string, context);

    let ctor = native_constructor("Function", 1, construct, context);
    link_constructor(&ctor, &prototype);
    install_global("Function", ctor, context);
}

fn construct(_this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Err(JsNativeError::eval()
        .with_message("dynamic Function construction from source text is not supported")
        .into())
}

fn call(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(target) = this.as_object().filter(|o| o.is_callable()) else {
        return Err(JsNativeError::typ().with_message("Function.prototype.call called on non-callable").into());
    };
    let call_this = args.first().cloned().unwrap_or_else(JsValue::undefined);
    let rest = if args.is_empty() { &[][..] } else { &args[1..] };
    target.call(&call_this, rest, context)
}

fn apply(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(target) = this.as_object().filter(|o| o.is_callable()) else {
        return Err(JsNativeError::typ().with_message("Function.prototype.apply called on non-callable").into());
    };
    let call_this = args.first().cloned().unwrap_or_else(JsValue::undefined);
    let call_args = match args.get(1) {
        None | Some(JsValue::Undefined) | Some(JsValue::Null) => Vec::new(),
        Some(array_like) => array_from_array_like(array_like, context)?,
    };
    target.call(&call_this, &call_args, context)
}

fn array_from_array_like(value: &JsValue, context: &mut Context) -> JsResult<Vec<JsValue>> {
    let obj = value.to_object(context)?;
    let len = obj.get("length", context)?.to_length(context)?;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        out.push(obj.get(i as u32, context)?);
    }
    Ok(out)
}

fn bind(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(target) = this.as_object().filter(|o| o.is_callable()) else {
        return Err(JsNativeError::typ().with_message("Function.prototype.bind called on non-callable").into());
    };
    let bound_this = args.first().cloned().unwrap_or_else(JsValue::undefined);
    let bound_args = if args.is_empty() { Vec::new() } else { args[1..].to_vec() };

    let name = target.get("name", context)?.to_js_string(context).unwrap_or_default();
    let length = target
        .get("length", context)?
        .as_number()
        .map(|n| (n - bound_args.len() as f64).max(0.0) as usize)
        .unwrap_or(0);

    let bound = JsObject::from_data(
        ObjectData::Function(FunctionObject::Bound {
            target: target.clone(),
            bound_this,
            bound_args,
        }),
        Some(context.intrinsics().function_prototype()),
    );
    bound.create_data_property("length", length as u32, Attribute::builtin());
    bound.create_data_property("name", crate::string::JsString::from(format!("bound {}", name)), Attribute::builtin());
    Ok(JsValue::object(bound))
}

fn to_string(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Function.prototype.toString called on non-object").into());
    };
    let name = obj.get("name", context)?.to_js_string(context).unwrap_or_default();
    let body = if obj.is_callable() {
        format!("function {}() {{ [native code] }}", name)
    } else {
        return Err(JsNativeError::typ().with_message("not a function").into());
    };
    Ok(JsValue::string(body))
}
