//! Expression evaluation (spec.md §4.1, §4.3, §5). One function per AST
//! shape rather than one giant `match` arm body, so each operator's
//! abstract-operation grounding (ToPrimitive, GetValue, ...) stays
//! legible on its own.

use super::{declaration, function, iterator::JsIterator};
use crate::{
    ast::{
        expression::{
            Argument, AssignOp, AssignmentTarget, BinaryOp, Expression, Literal, LogicalOp, ObjectProperty, UnaryOp,
            UpdateOp,
        },
        BindingPattern, Class, MethodKind, PropertyKeyExpr,
    },
    context::Context,
    environment::Environment,
    error::{JsNativeError, JsResult},
    object::{FunctionObject, JsObject, ObjectData, PromiseState, RegExpData},
    property::{Attribute, PropertyDescriptor, PropertyDescriptorBuilder, PropertyKey},
    string::JsString,
    value::{self, JsBigInt, JsValue, PreferredType, ToPropertyKeyExt},
};
use num_traits::FromPrimitive;
use std::rc::Rc;

pub fn evaluate_expression(expr: &Expression, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    match expr {
        Expression::Literal(lit, _) => Ok(literal_value(lit)),
        Expression::StringLiteral(s, _) => Ok(JsValue::string(s.as_ref())),
        Expression::BigIntLiteral(s, _) => Ok(JsValue::BigInt(JsBigInt::new(parse_bigint_literal(s)?))),
        Expression::Identifier(id) => get_identifier(&id.name, env, context),
        Expression::ThisExpression(_) => env.get_this_binding(context),
        Expression::SuperProperty { key, .. } => evaluate_super_property(key, env, context),
        Expression::SuperCall { arguments, .. } => evaluate_super_call(arguments, env, context),
        Expression::NewTarget(_) => Ok(env.new_target()),
        Expression::ArrayLiteral(elements, _) => evaluate_array_literal(elements, env, context),
        Expression::ObjectLiteral(props, _) => evaluate_object_literal(props, env, context),
        Expression::TemplateLiteral {
            quasis, expressions, ..
        } => evaluate_template(quasis, expressions, env, context),
        Expression::TaggedTemplate {
            tag,
            quasis,
            expressions,
            ..
        } => evaluate_tagged_template(tag, quasis, expressions, env, context),
        Expression::RegExpLiteral { pattern, flags, .. } => evaluate_regexp(pattern, flags, context),
        Expression::FunctionExpression(f) => Ok(JsValue::object(function::create_function_expression(f, env, context)?)),
        Expression::ArrowFunction(f) => Ok(JsValue::object(function::instantiate_function_object(f, env.clone(), context))),
        Expression::ClassExpression(c) => Ok(JsValue::object(evaluate_class(c, env, context)?)),
        Expression::Unary { op, argument, .. } => evaluate_unary(*op, argument, env, context),
        Expression::Update { op, argument, prefix, .. } => evaluate_update(*op, argument, *prefix, env, context),
        Expression::Binary { op, left, right, .. } => evaluate_binary(*op, left, right, env, context),
        Expression::Logical { op, left, right, .. } => evaluate_logical(*op, left, right, env, context),
        Expression::Assignment { op, target, value, .. } => evaluate_assignment(*op, target, value, env, context),
        Expression::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => {
            if evaluate_expression(test, env, context)?.to_boolean() {
                evaluate_expression(consequent, env, context)
            } else {
                evaluate_expression(alternate, env, context)
            }
        }
        Expression::Call { .. } | Expression::Member { .. } => {
            Ok(eval_member_chain(expr, env, context)?.unwrap_or_else(JsValue::undefined))
        }
        Expression::New { callee, arguments, .. } => evaluate_new(callee, arguments, env, context),
        Expression::Sequence(exprs, _) => {
            let mut result = JsValue::undefined();
            for e in exprs {
                result = evaluate_expression(e, env, context)?;
            }
            Ok(result)
        }
        Expression::Yield { argument, .. } => match argument {
            Some(e) => evaluate_expression(e, env, context),
            None => Ok(JsValue::undefined()),
        },
        Expression::Await { argument, .. } => {
            let value = evaluate_expression(argument, env, context)?;
            await_value(value, context)
        }
    }
}

fn literal_value(lit: &Literal) -> JsValue {
    match lit {
        Literal::Null => JsValue::null(),
        Literal::Undefined => JsValue::undefined(),
        Literal::Boolean(b) => JsValue::Boolean(*b),
        Literal::Number(n) => JsValue::Number(*n),
    }
}

fn parse_bigint_literal(s: &str) -> JsResult<num_bigint::BigInt> {
    let s = s.trim_end_matches('n');
    let (radix, digits) = if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, rest)
    } else if let Some(rest) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        (8, rest)
    } else if let Some(rest) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (2, rest)
    } else {
        (10, s)
    };
    num_bigint::BigInt::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| JsNativeError::syntax().with_message("Invalid BigInt literal").into())
}

// -- reference resolution (spec.md §4.4 `ResolveBinding`/`GetValue`/`PutValue`) --

pub(crate) fn resolve_environment(name: &str, env: &Environment, context: &mut Context) -> JsResult<Option<Environment>> {
    let mut current = Some(env.clone());
    while let Some(e) = current {
        if e.has_binding(name, context)? {
            return Ok(Some(e));
        }
        current = e.outer();
    }
    Ok(None)
}

pub(crate) fn get_identifier(name: &str, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    match resolve_environment(name, env, context)? {
        Some(e) => e.get_binding_value(name, false, context),
        None => Err(not_defined(name)),
    }
}

fn set_identifier(name: &str, value: JsValue, env: &Environment, strict: bool, context: &mut Context) -> JsResult<()> {
    match resolve_environment(name, env, context)? {
        Some(e) => e.set_mutable_binding(name, value, strict, context),
        None => {
            if strict {
                return Err(not_defined(name));
            }
            context.global_object().set(name, value, false, context)?;
            Ok(())
        }
    }
}

fn not_defined(name: &str) -> crate::error::JsError {
    JsNativeError::reference()
        .with_message(format!("{} is not defined", name))
        .into()
}

pub(crate) fn eval_property_key(key: &PropertyKeyExpr, env: &Environment, context: &mut Context) -> JsResult<PropertyKey> {
    match key {
        PropertyKeyExpr::Identifier(name) => Ok(PropertyKey::from(name.as_ref())),
        PropertyKeyExpr::StringLiteral(s) => Ok(PropertyKey::from(s.as_ref())),
        PropertyKeyExpr::NumberLiteral(n) => Ok(PropertyKey::from(value::number_to_js_string(*n).as_str())),
        // Private fields/methods have no real privacy in this engine's property
        // model; the leading `#` just keeps them out of ordinary enumeration by
        // convention rather than by a distinct internal slot kind.
        PropertyKeyExpr::PrivateIdentifier(name) => Ok(PropertyKey::from(format!("#{}", name))),
        PropertyKeyExpr::Computed(expr) => {
            let value = evaluate_expression(expr, env, context)?;
            value.to_property_key(context)
        }
    }
}

fn get_property(base: &JsValue, key: &PropertyKey, context: &mut Context) -> JsResult<JsValue> {
    match base {
        JsValue::Object(o) => o.get(key.clone(), context),
        JsValue::Undefined | JsValue::Null => Err(JsNativeError::typ()
            .with_message(format!("Cannot read properties of {} (reading '{}')", base, key))
            .into()),
        _ => {
            let obj = base.to_object(context)?;
            obj.get_with_receiver(key, base, context)
        }
    }
}

fn get_reference(expr: &Expression, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    evaluate_expression(expr, env, context)
}

fn put_reference(expr: &Expression, value: JsValue, env: &Environment, context: &mut Context) -> JsResult<()> {
    match expr {
        Expression::Identifier(id) => {
            let strict = context.options().strict;
            set_identifier(&id.name, value, env, strict, context)
        }
        Expression::Member { object, property, .. } => {
            let base = evaluate_expression(object, env, context)?;
            let key = eval_property_key(property, env, context)?;
            let strict = context.options().strict;
            let obj = base.to_object(context)?;
            obj.set(key, value, strict, context)?;
            Ok(())
        }
        _ => Err(JsNativeError::syntax()
            .with_message("Invalid left-hand side in assignment")
            .into()),
    }
}

// -- member/call chains, with short-circuiting optional-chaining --------

fn eval_member_chain(expr: &Expression, env: &Environment, context: &mut Context) -> JsResult<Option<JsValue>> {
    match expr {
        Expression::Member {
            object,
            property,
            optional,
            ..
        } => {
            let Some(base) = eval_member_chain(object, env, context)? else {
                return Ok(None);
            };
            if *optional && base.is_null_or_undefined() {
                return Ok(None);
            }
            let key = eval_property_key(property, env, context)?;
            Ok(Some(get_property(&base, &key, context)?))
        }
        Expression::Call {
            callee,
            arguments,
            optional,
            ..
        } => {
            let Some((this_value, func)) = eval_callee_chain(callee, env, context)? else {
                return Ok(None);
            };
            if *optional && func.is_null_or_undefined() {
                return Ok(None);
            }
            let args = eval_arguments(arguments, env, context)?;
            let f = func
                .as_object()
                .filter(|o| o.is_callable())
                .ok_or_else(|| JsNativeError::typ().with_message("value is not a function").into())?;
            Ok(Some(f.call(&this_value, &args, context)?))
        }
        _ => Ok(Some(evaluate_expression(expr, env, context)?)),
    }
}

fn eval_callee_chain(
    callee: &Expression,
    env: &Environment,
    context: &mut Context,
) -> JsResult<Option<(JsValue, JsValue)>> {
    match callee {
        Expression::Member {
            object,
            property,
            optional,
            ..
        } => {
            let Some(base) = eval_member_chain(object, env, context)? else {
                return Ok(None);
            };
            if *optional && base.is_null_or_undefined() {
                return Ok(None);
            }
            let key = eval_property_key(property, env, context)?;
            let func = get_property(&base, &key, context)?;
            Ok(Some((base, func)))
        }
        _ => {
            let Some(func) = eval_member_chain(callee, env, context)? else {
                return Ok(None);
            };
            Ok(Some((JsValue::undefined(), func)))
        }
    }
}

fn eval_arguments(args: &[Argument], env: &Environment, context: &mut Context) -> JsResult<Vec<JsValue>> {
    let mut out = Vec::new();
    for arg in args {
        match arg {
            Argument::Expression(e) => out.push(evaluate_expression(e, env, context)?),
            Argument::Spread(e) => {
                let value = evaluate_expression(e, env, context)?;
                let mut iter = JsIterator::from_value(&value, context)?;
                while let Some(v) = iter.next(context)? {
                    out.push(v);
                }
            }
        }
    }
    Ok(out)
}

fn evaluate_new(callee: &Expression, arguments: &[Argument], env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let func = evaluate_expression(callee, env, context)?;
    let Some(f) = func.as_object().filter(|o| o.is_constructor()) else {
        return Err(JsNativeError::typ().with_message("not a constructor").into());
    };
    let args = eval_arguments(arguments, env, context)?;
    f.construct(&args, f, context)
}

// -- super ----------------------------------------------------------------

fn evaluate_super_property(key: &PropertyKeyExpr, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let home = env.nearest_home_object().ok_or_else(|| {
        JsNativeError::syntax()
            .with_message("'super' keyword is only valid inside a method")
            .into()
    })?;
    let k = eval_property_key(key, env, context)?;
    let this_value = env.get_this_binding(context)?;
    match home.get_prototype_of() {
        Some(proto) => proto.get_with_receiver(&k, &this_value, context),
        None => Ok(JsValue::undefined()),
    }
}

/// `super(...)`: this engine does not re-parent `this` the way a real
/// derived-constructor `[[Construct]]` does (see `object::function`'s
/// lack of an "uninitialized this" construction path); instead it invokes
/// the parent constructor's `[[Call]]` against the already-allocated
/// instance, which runs the same field-initializer and body logic against
/// the same object. Observable except for `new.target`/prototype-identity
/// edge cases around manual `Reflect.construct` tricks.
fn evaluate_super_call(arguments: &[Argument], env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let this_value = env.get_this_binding(context)?;
    let function_object = env.nearest_function_object().ok_or_else(|| {
        JsNativeError::syntax()
            .with_message("'super' keyword is only valid inside a derived constructor")
            .into()
    })?;
    let super_ctor = function_object
        .get_prototype_of()
        .filter(JsObject::is_constructor)
        .ok_or_else(|| JsNativeError::typ().with_message("Super constructor is not a constructor").into())?;
    let args = eval_arguments(arguments, env, context)?;
    super_ctor.call(&this_value, &args, context)?;
    Ok(this_value)
}

// -- literals ---------------------------------------------------------------

fn evaluate_array_literal(
    elements: &[Option<Argument>],
    env: &Environment,
    context: &mut Context,
) -> JsResult<JsValue> {
    let mut items = Vec::new();
    for el in elements {
        match el {
            // Elisions (`[, ,]`) are treated as `undefined` holes rather than
            // true sparse-array absence; nothing downstream distinguishes them.
            None => items.push(JsValue::undefined()),
            Some(Argument::Expression(e)) => items.push(evaluate_expression(e, env, context)?),
            Some(Argument::Spread(e)) => {
                let value = evaluate_expression(e, env, context)?;
                let mut iter = JsIterator::from_value(&value, context)?;
                while let Some(v) = iter.next(context)? {
                    items.push(v);
                }
            }
        }
    }
    Ok(JsValue::object(context.new_array(items)))
}

fn evaluate_object_literal(props: &[ObjectProperty], env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let proto = context.intrinsics().object_prototype();
    let obj = JsObject::ordinary(Some(proto));
    for prop in props {
        match prop {
            ObjectProperty::KeyValue { key, value } => {
                let k = eval_property_key(key, env, context)?;
                let v = evaluate_expression(value, env, context)?;
                obj.create_data_property(k, v, Attribute::all());
            }
            ObjectProperty::Shorthand(id) => {
                let v = get_identifier(&id.name, env, context)?;
                obj.create_data_property(id.name.as_ref(), v, Attribute::all());
            }
            ObjectProperty::Method { key, function: f, kind } => {
                let k = eval_property_key(key, env, context)?;
                let func = function::create_function_expression(f, env, context)?;
                set_home_object(&func, &obj);
                install_method(&obj, k, func, *kind, true, context)?;
            }
            ObjectProperty::Spread(e) => {
                let value = evaluate_expression(e, env, context)?;
                if let Some(src) = value.as_object() {
                    for key in src.own_property_keys() {
                        if let Some(desc) = src.get_own_property(&key) {
                            if desc.enumerable() {
                                let v = src.get(key.clone(), context)?;
                                obj.create_data_property(key, v, Attribute::all());
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(JsValue::object(obj))
}

fn install_method(
    target: &JsObject,
    key: PropertyKey,
    func: JsObject,
    kind: MethodKind,
    enumerable: bool,
    context: &mut Context,
) -> JsResult<()> {
    match kind {
        MethodKind::Getter => {
            let existing = target.get_own_property(&key);
            let setter = existing.as_ref().and_then(PropertyDescriptor::setter).cloned();
            target.define_own_property(
                key,
                PropertyDescriptorBuilder {
                    get: Some(Some(func)),
                    set: Some(setter),
                    enumerable: Some(enumerable),
                    configurable: Some(true),
                    ..Default::default()
                },
                context,
            )?;
        }
        MethodKind::Setter => {
            let existing = target.get_own_property(&key);
            let getter = existing.as_ref().and_then(PropertyDescriptor::getter).cloned();
            target.define_own_property(
                key,
                PropertyDescriptorBuilder {
                    get: Some(getter),
                    set: Some(Some(func)),
                    enumerable: Some(enumerable),
                    configurable: Some(true),
                    ..Default::default()
                },
                context,
            )?;
        }
        _ => {
            let mut attrs = Attribute::builtin();
            attrs.set_enumerable(enumerable);
            target.create_data_property(key, func, attrs);
        }
    }
    Ok(())
}

fn set_home_object(func: &JsObject, home: &JsObject) {
    let mut inner = func.borrow_mut();
    if let ObjectData::Function(FunctionObject::Ordinary(f)) = &mut inner.data {
        f.home_object = Some(home.clone());
    }
}

fn evaluate_template(quasis: &[Box<str>], expressions: &[Expression], env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let mut result = JsString::from(quasis.first().map(Box::as_ref).unwrap_or(""));
    for (i, expr) in expressions.iter().enumerate() {
        let v = evaluate_expression(expr, env, context)?;
        let s = v.to_js_string(context)?;
        result = result.concat(&s);
        if let Some(q) = quasis.get(i + 1) {
            result = result.concat(&JsString::from(q.as_ref()));
        }
    }
    Ok(JsValue::string(result))
}

fn evaluate_tagged_template(
    tag: &Expression,
    quasis: &[Box<str>],
    expressions: &[Expression],
    env: &Environment,
    context: &mut Context,
) -> JsResult<JsValue> {
    let Some((this_value, func)) = eval_callee_chain(tag, env, context)? else {
        return Ok(JsValue::undefined());
    };
    let f = func
        .as_object()
        .filter(|o| o.is_callable())
        .ok_or_else(|| JsNativeError::typ().with_message("Tagged template tag is not a function").into())?;
    let strings: Vec<JsValue> = quasis.iter().map(|q| JsValue::string(q.as_ref())).collect();
    let raw_array = context.new_array(strings.clone());
    let strings_array = context.new_array(strings);
    strings_array.create_data_property("raw", raw_array, Attribute::default());
    let mut args = vec![JsValue::object(strings_array)];
    for e in expressions {
        args.push(evaluate_expression(e, env, context)?);
    }
    f.call(&this_value, &args, context)
}

fn evaluate_regexp(pattern: &str, flags: &str, context: &mut Context) -> JsResult<JsValue> {
    let matcher = regress::Regex::with_flags(pattern, flags).ok().map(Rc::new);
    let data = RegExpData {
        source: JsString::from(pattern),
        flags: JsString::from(flags),
        matcher,
        last_index: 0,
    };
    let proto = context
        .intrinsics()
        .get("RegExp.prototype")
        .unwrap_or_else(|| context.intrinsics().object_prototype());
    Ok(JsValue::object(JsObject::from_data(ObjectData::RegExp(Box::new(data)), Some(proto))))
}

// -- classes ----------------------------------------------------------------

pub(crate) fn evaluate_class(class: &Class, env: &Environment, context: &mut Context) -> JsResult<JsObject> {
    let super_object = match &class.super_class {
        Some(expr) => {
            let value = evaluate_expression(expr, env, context)?;
            if value.is_null() {
                None
            } else {
                Some(value.as_object().cloned().filter(JsObject::is_constructor).ok_or_else(|| {
                    JsNativeError::typ().with_message("Class extends value is not a constructor").into()
                })?)
            }
        }
        None => None,
    };

    let proto_parent = if class.super_class.is_some() {
        match &super_object {
            Some(sup) => sup.get(JsString::from("prototype"), context)?.as_object().cloned(),
            None => None, // `extends null`
        }
    } else {
        Some(context.intrinsics().object_prototype())
    };
    let prototype_obj = JsObject::ordinary(proto_parent);

    let class_scope = Environment::new_declarative(Some(env.clone()));
    if let Some(name) = &class.name {
        class_scope.create_immutable_binding(&name.name, true)?;
    }

    let constructor_method = class
        .methods
        .iter()
        .find(|m| !m.is_static && matches!(&m.key, PropertyKeyExpr::Identifier(n) if &**n == "constructor"));

    let ctor_source = match constructor_method {
        Some(m) => m.function.clone(),
        None => default_constructor(),
    };

    let ctor_object = function::instantiate_function_object(&ctor_source, class_scope.clone(), context);
    let mut proto_attrs = Attribute::default();
    proto_attrs.set_writable(false);
    ctor_object.create_data_property(JsString::from("prototype"), prototype_obj.clone(), proto_attrs);
    prototype_obj.create_data_property(JsString::from("constructor"), ctor_object.clone(), Attribute::builtin());
    set_home_object(&ctor_object, &prototype_obj);
    if let Some(sup) = &super_object {
        ctor_object.set_prototype_of(Some(sup.clone()));
    }

    if let Some(name) = &class.name {
        class_scope.initialize_binding(&name.name, JsValue::object(ctor_object.clone()), context)?;
    }

    for method in &class.methods {
        if method.is_private {
            continue;
        }
        if !method.is_static && matches!(&method.key, PropertyKeyExpr::Identifier(n) if &**n == "constructor") {
            continue;
        }
        let target = if method.is_static { &ctor_object } else { &prototype_obj };
        let key = eval_property_key(&method.key, &class_scope, context)?;
        let func = function::instantiate_function_object(&method.function, class_scope.clone(), context);
        set_home_object(&func, target);
        install_method(target, key, func, method.kind, false, context)?;
    }

    let mut instance_fields = Vec::new();
    for field in &class.fields {
        if field.is_private {
            continue;
        }
        let key = eval_property_key(&field.key, &class_scope, context)?;
        if field.is_static {
            let value = match &field.init {
                Some(expr) => evaluate_expression(expr, &class_scope, context)?,
                None => JsValue::undefined(),
            };
            ctor_object.create_data_property(key, value, Attribute::all());
        } else {
            instance_fields.push((key, field.init.clone()));
        }
    }
    if !instance_fields.is_empty() {
        let mut inner = ctor_object.borrow_mut();
        if let ObjectData::Function(FunctionObject::Ordinary(f)) = &mut inner.data {
            f.fields = instance_fields;
        }
    }

    Ok(ctor_object)
}

/// The implicit constructor ES2015+ gives a class with no `constructor`
/// method of its own: an empty body (argument forwarding to a real
/// superclass constructor happens through [`evaluate_super_call`]'s
/// simplified semantics only when the user writes an explicit `super(...)`
/// call, which this engine does not synthesize automatically).
fn default_constructor() -> crate::ast::Function {
    crate::ast::Function {
        name: None,
        params: Vec::new(),
        body: Vec::new(),
        kind: crate::ast::FunctionKind::Ordinary,
        strict: true,
        span: crate::ast::Span::default(),
    }
}

// -- unary / update -----------------------------------------------------

fn evaluate_unary(op: UnaryOp, argument: &Expression, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    match op {
        UnaryOp::TypeOf => {
            if let Expression::Identifier(id) = argument {
                if resolve_environment(&id.name, env, context)?.is_none() {
                    return Ok(JsValue::string("undefined"));
                }
            }
            let value = evaluate_expression(argument, env, context)?;
            Ok(JsValue::string(type_of_string(&value)))
        }
        UnaryOp::Delete => evaluate_delete(argument, env, context),
        UnaryOp::Void => {
            evaluate_expression(argument, env, context)?;
            Ok(JsValue::undefined())
        }
        UnaryOp::Minus => {
            let v = evaluate_expression(argument, env, context)?;
            value::negate(&v, context)
        }
        UnaryOp::Plus => {
            let v = evaluate_expression(argument, env, context)?;
            Ok(JsValue::Number(v.to_number(context)?))
        }
        UnaryOp::Not => {
            let v = evaluate_expression(argument, env, context)?;
            Ok(JsValue::Boolean(!v.to_boolean()))
        }
        UnaryOp::BitNot => {
            let v = evaluate_expression(argument, env, context)?;
            value::bitwise_not(&v, context)
        }
    }
}

fn type_of_string(value: &JsValue) -> &'static str {
    match value {
        JsValue::Undefined => "undefined",
        JsValue::Null => "object",
        JsValue::Boolean(_) => "boolean",
        JsValue::Number(_) => "number",
        JsValue::BigInt(_) => "bigint",
        JsValue::String(_) => "string",
        JsValue::Symbol(_) => "symbol",
        JsValue::Object(o) => {
            if o.is_callable() {
                "function"
            } else {
                "object"
            }
        }
    }
}

fn evaluate_delete(argument: &Expression, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    match argument {
        Expression::Member {
            object,
            property,
            optional,
            ..
        } => {
            let base = evaluate_expression(object, env, context)?;
            if *optional && base.is_null_or_undefined() {
                return Ok(JsValue::Boolean(true));
            }
            let key = eval_property_key(property, env, context)?;
            match base.as_object() {
                Some(o) => Ok(JsValue::Boolean(o.delete(&key, context)?)),
                None => Ok(JsValue::Boolean(true)),
            }
        }
        _ => {
            evaluate_expression(argument, env, context)?;
            Ok(JsValue::Boolean(true))
        }
    }
}

fn evaluate_update(op: UpdateOp, argument: &Expression, prefix: bool, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let old = evaluate_expression(argument, env, context)?;
    let (old_value, new_value) = if let JsValue::BigInt(b) = &old {
        let delta = if op == UpdateOp::Increment { 1 } else { -1 };
        let new_big = JsBigInt::new(b.as_inner() + num_bigint::BigInt::from(delta));
        (JsValue::BigInt(b.clone()), JsValue::BigInt(new_big))
    } else {
        let old_num = old.to_number(context)?;
        let delta = if op == UpdateOp::Increment { 1.0 } else { -1.0 };
        (JsValue::Number(old_num), JsValue::Number(old_num + delta))
    };
    put_reference(argument, new_value.clone(), env, context)?;
    Ok(if prefix { new_value } else { old_value })
}

// -- binary / logical / comparisons --------------------------------------

fn evaluate_binary(op: BinaryOp, left: &Expression, right: &Expression, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let l = evaluate_expression(left, env, context)?;
    let r = evaluate_expression(right, env, context)?;
    match op {
        BinaryOp::Add => value::add(&l, &r, context),
        BinaryOp::Sub => value::sub(&l, &r, context),
        BinaryOp::Mul => value::mul(&l, &r, context),
        BinaryOp::Div => value::divide(&l, &r, context),
        BinaryOp::Mod => value::modulo(&l, &r, context),
        BinaryOp::Exp => value::exponentiate(&l, &r, context),
        BinaryOp::Equal => Ok(JsValue::Boolean(loose_equals(&l, &r, context)?)),
        BinaryOp::NotEqual => Ok(JsValue::Boolean(!loose_equals(&l, &r, context)?)),
        BinaryOp::StrictEqual => Ok(JsValue::Boolean(value::strict_equals(&l, &r))),
        BinaryOp::StrictNotEqual => Ok(JsValue::Boolean(!value::strict_equals(&l, &r))),
        BinaryOp::LessThan => compare(&l, &r, context, |o| o == Some(std::cmp::Ordering::Less)),
        BinaryOp::LessThanOrEqual => compare(&l, &r, context, |o| {
            matches!(o, Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal))
        }),
        BinaryOp::GreaterThan => compare(&l, &r, context, |o| o == Some(std::cmp::Ordering::Greater)),
        BinaryOp::GreaterThanOrEqual => compare(&l, &r, context, |o| {
            matches!(o, Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal))
        }),
        BinaryOp::BitAnd => value::bitwise_and(&l, &r, context),
        BinaryOp::BitOr => value::bitwise_or(&l, &r, context),
        BinaryOp::BitXor => value::bitwise_xor(&l, &r, context),
        BinaryOp::ShiftLeft => value::shift_left(&l, &r, context),
        BinaryOp::ShiftRight => value::shift_right(&l, &r, context),
        BinaryOp::UnsignedShiftRight => value::unsigned_shift_right(&l, &r, context),
        BinaryOp::In => {
            let obj = r
                .as_object()
                .ok_or_else(|| JsNativeError::typ().with_message("Cannot use 'in' operator on a non-object").into())?;
            let key = l.to_property_key(context)?;
            Ok(JsValue::Boolean(obj.has_property(&key, context)?))
        }
        BinaryOp::InstanceOf => instance_of(&l, &r, context),
    }
}

fn compare(l: &JsValue, r: &JsValue, context: &mut Context, pred: impl Fn(Option<std::cmp::Ordering>) -> bool) -> JsResult<JsValue> {
    let pl = l.to_primitive(context, PreferredType::Number)?;
    let pr = r.to_primitive(context, PreferredType::Number)?;
    if let (JsValue::String(a), JsValue::String(b)) = (&pl, &pr) {
        return Ok(JsValue::Boolean(pred(Some(a.as_slice().cmp(b.as_slice())))));
    }
    if let (JsValue::BigInt(a), JsValue::BigInt(b)) = (&pl, &pr) {
        return Ok(JsValue::Boolean(pred(Some(a.as_inner().cmp(b.as_inner())))));
    }
    let a = pl.to_number(context)?;
    let b = pr.to_number(context)?;
    let ordering = if a.is_nan() || b.is_nan() { None } else { a.partial_cmp(&b) };
    Ok(JsValue::Boolean(pred(ordering)))
}

fn instance_of(value: &JsValue, constructor: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    let ctor = constructor
        .as_object()
        .ok_or_else(|| JsNativeError::typ().with_message("Right-hand side of 'instanceof' is not an object").into())?;

    let has_instance = ctor.get(context.well_known_symbols().has_instance.clone(), context)?;
    if let Some(f) = has_instance.as_object().filter(|o| o.is_callable()) {
        let result = f.call(constructor, &[value.clone()], context)?;
        return Ok(JsValue::Boolean(result.to_boolean()));
    }
    if !ctor.is_callable() {
        return Err(JsNativeError::typ()
            .with_message("Right-hand side of 'instanceof' is not callable")
            .into());
    }
    let Some(obj) = value.as_object() else {
        return Ok(JsValue::Boolean(false));
    };
    let proto = ctor.get(JsString::from("prototype"), context)?;
    let proto = proto
        .as_object()
        .ok_or_else(|| JsNativeError::typ().with_message("Function has non-object prototype in instanceof check").into())?;
    let mut current = obj.get_prototype_of();
    while let Some(p) = current {
        if p.ptr_eq(proto) {
            return Ok(JsValue::Boolean(true));
        }
        current = p.get_prototype_of();
    }
    Ok(JsValue::Boolean(false))
}

/// Abstract equality comparison (spec.md §4.1 `IsLooselyEqual`).
fn loose_equals(a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<bool> {
    use JsValue::*;
    match (a, b) {
        (Undefined | Null, Undefined | Null) => Ok(true),
        (Number(_), Number(_))
        | (String(_), String(_))
        | (Boolean(_), Boolean(_))
        | (Symbol(_), Symbol(_))
        | (BigInt(_), BigInt(_))
        | (Object(_), Object(_)) => Ok(value::strict_equals(a, b)),
        (Number(x), String(_)) => Ok(*x == b.to_number(context)?),
        (String(_), Number(y)) => Ok(a.to_number(context)? == *y),
        (BigInt(x), String(s)) => Ok(s
            .to_string_lossy()
            .trim()
            .parse::<num_bigint::BigInt>()
            .map(|v| &v == x.as_inner())
            .unwrap_or(false)),
        (String(s), BigInt(y)) => Ok(s
            .to_string_lossy()
            .trim()
            .parse::<num_bigint::BigInt>()
            .map(|v| &v == y.as_inner())
            .unwrap_or(false)),
        (Number(x), BigInt(y)) => Ok(number_bigint_equal(*x, y.as_inner())),
        (BigInt(x), Number(y)) => Ok(number_bigint_equal(*y, x.as_inner())),
        (Boolean(_), _) => {
            let num = JsValue::Number(a.to_number(context)?);
            loose_equals(&num, b, context)
        }
        (_, Boolean(_)) => {
            let num = JsValue::Number(b.to_number(context)?);
            loose_equals(a, &num, context)
        }
        (Number(_) | String(_) | BigInt(_) | Symbol(_), Object(_)) => {
            let prim = b.to_primitive(context, PreferredType::Default)?;
            loose_equals(a, &prim, context)
        }
        (Object(_), Number(_) | String(_) | BigInt(_) | Symbol(_)) => {
            let prim = a.to_primitive(context, PreferredType::Default)?;
            loose_equals(&prim, b, context)
        }
        _ => Ok(false),
    }
}

fn number_bigint_equal(n: f64, b: &num_bigint::BigInt) -> bool {
    if !n.is_finite() {
        return false;
    }
    num_bigint::BigInt::from_f64(n).map(|v| v == *b).unwrap_or(false)
}

fn evaluate_logical(op: LogicalOp, left: &Expression, right: &Expression, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    let l = evaluate_expression(left, env, context)?;
    match op {
        LogicalOp::And => {
            if l.to_boolean() {
                evaluate_expression(right, env, context)
            } else {
                Ok(l)
            }
        }
        LogicalOp::Or => {
            if l.to_boolean() {
                Ok(l)
            } else {
                evaluate_expression(right, env, context)
            }
        }
        LogicalOp::NullishCoalescing => {
            if l.is_null_or_undefined() {
                evaluate_expression(right, env, context)
            } else {
                Ok(l)
            }
        }
    }
}

// -- assignment -----------------------------------------------------------

fn evaluate_assignment(
    op: AssignOp,
    target: &AssignmentTarget,
    value_expr: &Expression,
    env: &Environment,
    context: &mut Context,
) -> JsResult<JsValue> {
    if op == AssignOp::Assign {
        let value = evaluate_expression(value_expr, env, context)?;
        match target {
            AssignmentTarget::Pattern(pattern) => {
                assign_pattern(pattern, value.clone(), env, context)?;
                Ok(value)
            }
            AssignmentTarget::Expression(expr) => {
                put_reference(expr, value.clone(), env, context)?;
                Ok(value)
            }
        }
    } else {
        let AssignmentTarget::Expression(target_expr) = target else {
            return Err(JsNativeError::syntax()
                .with_message("Invalid destructuring assignment target")
                .into());
        };
        match op {
            AssignOp::LogicalAnd | AssignOp::LogicalOr | AssignOp::NullishCoalescing => {
                let current = get_reference(target_expr, env, context)?;
                let should_assign = match op {
                    AssignOp::LogicalAnd => current.to_boolean(),
                    AssignOp::LogicalOr => !current.to_boolean(),
                    AssignOp::NullishCoalescing => current.is_null_or_undefined(),
                    _ => unreachable!(),
                };
                if !should_assign {
                    return Ok(current);
                }
                let value = evaluate_expression(value_expr, env, context)?;
                put_reference(target_expr, value.clone(), env, context)?;
                Ok(value)
            }
            _ => {
                let current = get_reference(target_expr, env, context)?;
                let rhs = evaluate_expression(value_expr, env, context)?;
                let result = apply_compound(op, &current, &rhs, context)?;
                put_reference(target_expr, result.clone(), env, context)?;
                Ok(result)
            }
        }
    }
}

fn apply_compound(op: AssignOp, a: &JsValue, b: &JsValue, context: &mut Context) -> JsResult<JsValue> {
    match op {
        AssignOp::Add => value::add(a, b, context),
        AssignOp::Sub => value::sub(a, b, context),
        AssignOp::Mul => value::mul(a, b, context),
        AssignOp::Div => value::divide(a, b, context),
        AssignOp::Mod => value::modulo(a, b, context),
        AssignOp::Exp => value::exponentiate(a, b, context),
        AssignOp::BitAnd => value::bitwise_and(a, b, context),
        AssignOp::BitOr => value::bitwise_or(a, b, context),
        AssignOp::BitXor => value::bitwise_xor(a, b, context),
        AssignOp::ShiftLeft => value::shift_left(a, b, context),
        AssignOp::ShiftRight => value::shift_right(a, b, context),
        AssignOp::UnsignedShiftRight => value::unsigned_shift_right(a, b, context),
        AssignOp::Assign | AssignOp::LogicalAnd | AssignOp::LogicalOr | AssignOp::NullishCoalescing => unreachable!(),
    }
}

pub(crate) fn assign_pattern(pattern: &BindingPattern, value: JsValue, env: &Environment, context: &mut Context) -> JsResult<()> {
    let strict = context.options().strict;
    declaration::destructure(pattern, value, env, context, &mut |id, v, env, context| {
        set_identifier(&id.name, v, env, strict, context)
    })
}

// -- await ------------------------------------------------------------------

/// Approximates `await` without real coroutine suspension: drains the
/// microtask queue once, then reads the promise's settled state directly.
/// A still-`Pending` promise (one nothing in the queue could settle)
/// resolves to `undefined` rather than truly suspending the calling
/// function, since this tree-walker has no continuation to suspend.
fn await_value(value: JsValue, context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = value.as_object().cloned() else {
        return Ok(value);
    };
    context.run_jobs();
    let state = {
        let borrowed = obj.borrow();
        match &borrowed.data {
            ObjectData::Promise(p) => Some((p.state.clone(), p.result.clone())),
            _ => None,
        }
    };
    match state {
        Some((PromiseState::Fulfilled, result)) => Ok(result),
        Some((PromiseState::Rejected, reason)) => Err(crate::error::JsError::from_value(reason)),
        Some((PromiseState::Pending, _)) => Ok(JsValue::undefined()),
        None => Ok(value),
    }
}
