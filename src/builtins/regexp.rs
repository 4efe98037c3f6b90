//! `RegExp` (spec.md §4.3): wraps `regress::Regex` the same way the
//! literal-expression path does (`exec::expression::evaluate_regexp`) so
//! both the `/pattern/flags` literal syntax and `new RegExp(...)` produce
//! the same `ObjectData::RegExp` shape.

use super::{install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{JsObject, ObjectData, RegExpData},
    property::Attribute,
    string::JsString,
    value::JsValue,
};
use std::rc::Rc;

pub fn init(context: &mut Context) {
    let prototype = JsObject::ordinary(Some(context.intrinsics().object_prototype()));

    prototype.create_method("exec", 1, exec, context);
    prototype.create_method("test", 1, test, context);
    prototype.create_method("toString", 0, to_string, context);
    define_getter(&prototype, "source", get_source, context);
    define_getter(&prototype, "flags", get_flags, context);
    define_getter(&prototype, "global", get_global, context);
    define_getter(&prototype, "ignoreCase", get_ignore_case, context);
    define_getter(&prototype, "multiline", get_multiline, context);
    define_getter(&prototype, "sticky", get_sticky, context);
    define_getter(&prototype, "unicode", get_unicode, context);

    let ctor = native_constructor("RegExp", 2, construct, context);
    link_constructor(&ctor, &prototype);
    context.intrinsics_mut().insert("RegExp.prototype", prototype);
    install_global("RegExp", ctor, context);
}

fn define_getter(obj: &JsObject, name: &str, native: crate::object::NativeFunction, context: &Context) {
    let getter = JsObject::native_function(Some(JsString::from(name)), 0, native, context);
    let desc = crate::property::PropertyDescriptor::accessor(Some(getter), None, false, true);
    obj.borrow_mut().properties_mut().insert(name.into(), desc);
}

fn construct(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("RegExp constructor called on non-object").into());
    };
    let (pattern, flags) = match args.first() {
        Some(JsValue::Object(o)) if matches!(o.borrow().data, ObjectData::RegExp(_)) => {
            let ObjectData::RegExp(data) = &o.borrow().data else { unreachable!() };
            let source = data.source.to_string_lossy();
            let flags = match args.get(1) {
                Some(v) if !v.is_undefined() => v.to_js_string(context)?.to_string_lossy(),
                _ => data.flags.to_string_lossy(),
            };
            (source, flags)
        }
        Some(v) if !v.is_undefined() => {
            let pattern = v.to_js_string(context)?.to_string_lossy();
            let flags = match args.get(1) {
                Some(v) if !v.is_undefined() => v.to_js_string(context)?.to_string_lossy(),
                _ => String::new(),
            };
            (pattern, flags)
        }
        _ => (String::new(), String::new()),
    };
    let matcher = regress::Regex::with_flags(&pattern, flags.as_str()).map_err(|e| JsNativeError::syntax().with_message(e.to_string()))?;
    let data = RegExpData {
        source: JsString::from(pattern),
        flags: JsString::from(flags),
        matcher: Some(Rc::new(matcher)),
        last_index: 0,
    };
    obj.borrow_mut().data = ObjectData::RegExp(Box::new(data));
    obj.create_data_property("lastIndex", 0u32, Attribute::default());
    Ok(this.clone())
}

fn this_regexp_data<R>(this: &JsValue, f: impl FnOnce(&RegExpData) -> JsResult<R>) -> JsResult<R> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("RegExp.prototype method called on non-object").into());
    };
    let borrowed = obj.borrow();
    match &borrowed.data {
        ObjectData::RegExp(data) => f(data),
        _ => Err(JsNativeError::typ().with_message("RegExp.prototype method called on incompatible receiver").into()),
    }
}

fn get_source(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    this_regexp_data(this, |d| Ok(JsValue::String(d.source.clone())))
}

fn get_flags(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    this_regexp_data(this, |d| Ok(JsValue::String(d.flags.clone())))
}

fn has_flag(this: &JsValue, flag: char) -> JsResult<bool> {
    this_regexp_data(this, |d| Ok(d.flags.to_string_lossy().contains(flag)))
}

fn get_global(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(has_flag(this, 'g')?))
}
fn get_ignore_case(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(has_flag(this, 'i')?))
}
fn get_multiline(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(has_flag(this, 'm')?))
}
fn get_sticky(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(has_flag(this, 'y')?))
}
fn get_unicode(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(has_flag(this, 'u')?))
}

fn to_string(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    this_regexp_data(this, |d| Ok(JsValue::string(format!("/{}/{}", d.source, d.flags))))
}

/// `RegExpBuiltinExec` (spec.md's RegExp literal match), simplified: no
/// named capture groups.
fn exec(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("RegExp.prototype.exec called on non-object").into());
    };
    let input = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();

    let (matcher, global, sticky) = {
        let borrowed = obj.borrow();
        let ObjectData::RegExp(data) = &borrowed.data else {
            return Err(JsNativeError::typ().with_message("RegExp.prototype.exec called on incompatible receiver").into());
        };
        let flags = data.flags.to_string_lossy();
        (data.matcher.clone(), flags.contains('g'), flags.contains('y'))
    };
    let Some(matcher) = matcher else {
        return Ok(JsValue::null());
    };

    let last_index = if global || sticky { obj.get("lastIndex", context)?.to_length(context)? } else { 0 };
    if last_index > input.len() {
        if global || sticky {
            obj.set("lastIndex", 0u32, true, context)?;
        }
        return Ok(JsValue::null());
    }

    let found = matcher.find_from(&input, last_index).next();
    let Some(m) = found.filter(|m| !sticky || m.start() == last_index) else {
        if global || sticky {
            obj.set("lastIndex", 0u32, true, context)?;
        }
        return Ok(JsValue::null());
    };

    if global || sticky {
        obj.set("lastIndex", m.end() as u32, true, context)?;
    }

    let n = m.captures.len();
    let mut items = Vec::with_capacity(n + 1);
    items.push(JsValue::string(&input[m.start()..m.end()]));
    for i in 0..n {
        items.push(match m.group(i + 1) {
            Some(range) => JsValue::string(&input[range]),
            None => JsValue::undefined(),
        });
    }
    let result = context.new_array(items);
    result.create_data_property("index", m.start() as u32, Attribute::all());
    result.create_data_property("input", input.as_str(), Attribute::all());
    result.create_data_property("groups", JsValue::undefined(), Attribute::all());
    Ok(JsValue::object(result))
}

fn test(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("RegExp.prototype.test called on incompatible receiver").into());
    };
    let exec_method = obj.get("exec", context)?;
    let Some(f) = exec_method.as_object().filter(|o| o.is_callable()) else {
        return Err(JsNativeError::typ().with_message("RegExp.prototype.test called on incompatible receiver").into());
    };
    let result = f.call(this, args, context)?;
    Ok(JsValue::from(!result.is_null()))
}
