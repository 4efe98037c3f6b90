//! `JSON` (spec.md §4.3, §8): `parse`/`stringify` glue between
//! `crate::json`'s standalone parser/serializer and the `JsValue` graph.

use super::install_global;
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    json::{self, JsonValue},
    object::JsObject,
    property::Attribute,
    value::JsValue,
};

pub fn init(context: &mut Context) {
    let json_obj = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    json_obj.create_method("parse", 2, parse, context);
    json_obj.create_method("stringify", 3, stringify, context);
    install_global("JSON", json_obj, context);
}

fn parse(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let text = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    let value = json::parse(&text).map_err(|e| JsNativeError::syntax().with_message(e.message))?;
    let reviver = args.get(1).and_then(JsValue::as_object).filter(|o| o.is_callable()).cloned();
    let result = from_json_value(&value, context);
    match reviver {
        Some(f) => apply_reviver(&f, &JsValue::string(""), result, context),
        None => Ok(result),
    }
}

fn apply_reviver(reviver: &JsObject, key: &JsValue, value: JsValue, context: &mut Context) -> JsResult<JsValue> {
    if let Some(obj) = value.as_object() {
        if obj.is_array() {
            let len = obj.get("length", context)?.to_length(context)?;
            for i in 0..len {
                let element = obj.get(i as u32, context)?;
                let revived = apply_reviver(reviver, &JsValue::from(i as u32), element, context)?;
                if revived.is_undefined() {
                    obj.delete(&(i as u32).into(), context)?;
                } else {
                    obj.set(i as u32, revived, true, context)?;
                }
            }
        } else {
            for key in obj.own_property_keys() {
                let element = obj.get(key.clone(), context)?;
                let key_value = match &key {
                    crate::property::PropertyKey::String(s) => JsValue::String(s.clone()),
                    crate::property::PropertyKey::Symbol(s) => JsValue::Symbol(s.clone()),
                };
                let revived = apply_reviver(reviver, &key_value, element, context)?;
                if revived.is_undefined() {
                    obj.delete(&key, context)?;
                } else {
                    obj.set(key, revived, true, context)?;
                }
            }
        }
    }
    reviver.call(&JsValue::undefined(), &[key.clone(), value], context)
}

fn from_json_value(value: &JsonValue, context: &mut Context) -> JsValue {
    match value {
        JsonValue::Null => JsValue::null(),
        JsonValue::Bool(b) => JsValue::from(*b),
        JsonValue::Number(n) => JsValue::from(*n),
        JsonValue::String(s) => JsValue::string(s.as_str()),
        JsonValue::Array(items) => {
            let items = items.iter().map(|v| from_json_value(v, context)).collect();
            JsValue::object(context.new_array(items))
        }
        JsonValue::Object(entries) => {
            let obj = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
            for (key, value) in entries {
                let value = from_json_value(value, context);
                obj.create_data_property(key.as_str(), value, Attribute::all());
            }
            JsValue::object(obj)
        }
    }
}

fn stringify(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let value = args.first().cloned().unwrap_or_else(JsValue::undefined);
    let indent = match args.get(2) {
        Some(JsValue::Number(n)) => (*n as usize).min(10),
        Some(v) if v.is_string() => v.to_js_string(context)?.len().min(10),
        _ => 0,
    };
    match to_json_value(&value, context)? {
        Some(json) => Ok(JsValue::string(json::stringify(&json, indent))),
        None => Ok(JsValue::undefined()),
    }
}

/// `SerializeJSONProperty` (spec.md §8): honors a `toJSON` method if
/// present, then maps the result to a `JsonValue`, or `None` for values
/// `JSON.stringify` simply omits (`undefined`, functions, symbols).
fn to_json_value(value: &JsValue, context: &mut Context) -> JsResult<Option<JsonValue>> {
    let value = if let Some(obj) = value.as_object() {
        let to_json = obj.get("toJSON", context)?;
        if let Some(f) = to_json.as_object().filter(|o| o.is_callable()) {
            f.call(value, &[], context)?
        } else {
            value.clone()
        }
    } else {
        value.clone()
    };

    Ok(match &value {
        JsValue::Undefined | JsValue::Symbol(_) => None,
        JsValue::Null => Some(JsonValue::Null),
        JsValue::Boolean(b) => Some(JsonValue::Bool(*b)),
        JsValue::Number(n) => Some(JsonValue::Number(*n)),
        JsValue::String(s) => Some(JsonValue::String(s.to_string_lossy())),
        JsValue::BigInt(_) => return Err(JsNativeError::typ().with_message("Do not know how to serialize a BigInt").into()),
        JsValue::Object(obj) if obj.is_callable() => None,
        JsValue::Object(obj) if obj.is_array() => {
            let len = obj.get("length", context)?.to_length(context)?;
            let mut items = Vec::with_capacity(len);
            for i in 0..len {
                let element = obj.get(i as u32, context)?;
                items.push(to_json_value(&element, context)?.unwrap_or(JsonValue::Null));
            }
            Some(JsonValue::Array(items))
        }
        JsValue::Object(obj) => match &obj.borrow().data {
            crate::object::ObjectData::Number(n) => Some(JsonValue::Number(*n)),
            crate::object::ObjectData::String(s) => Some(JsonValue::String(s.to_string_lossy())),
            crate::object::ObjectData::Boolean(b) => Some(JsonValue::Bool(*b)),
            _ => {
                let mut entries = Vec::new();
                for key in obj.own_property_keys() {
                    let crate::property::PropertyKey::String(key_str) = &key else {
                        continue;
                    };
                    let Some(desc) = obj.get_own_property(&key) else { continue };
                    if !desc.enumerable() {
                        continue;
                    }
                    let property_value = obj.get(key.clone(), context)?;
                    if let Some(json) = to_json_value(&property_value, context)? {
                        entries.push((key_str.to_string_lossy(), json));
                    }
                }
                Some(JsonValue::Object(entries))
            }
        },
    })
}
