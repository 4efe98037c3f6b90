//! `[[Call]]`/`[[Construct]]` for ordinary (tree-walked) functions
//! (spec.md §4.2, §5.4), and the shared machinery for turning an
//! `ast::Function` plus a closure environment into a callable object.

use super::{completion::Completion, declaration, expression, statement};
use crate::{
    ast::{Expression, Function as AstFunction, FunctionKind},
    context::Context,
    environment::{Environment, ThisBindingStatus},
    error::{JsNativeError, JsResult},
    object::{FunctionObject, JsObject, ObjectData, OrdinaryFunction, ThisMode},
    property::{Attribute, PropertyKey},
    string::JsString,
    value::JsValue,
};
use std::rc::Rc;

/// Builds a function object from an already-parsed `ast::Function`,
/// closing over `closure`. Used for function declarations/expressions
/// (hoisting installs these directly) and does not handle a named
/// function expression's self-reference binding; see
/// [`create_function_expression`] for that.
pub fn instantiate_function_object(source: &AstFunction, closure: Environment, context: &mut Context) -> JsObject {
    let this_mode = if source.kind == FunctionKind::Arrow {
        ThisMode::Lexical
    } else if source.strict {
        ThisMode::Strict
    } else {
        ThisMode::Global
    };
    let length = source
        .params
        .iter()
        .take_while(|p| p.default.is_none() && !p.rest)
        .count();
    let name = source
        .name
        .as_ref()
        .map(|id| JsString::from(id.name.as_ref()))
        .unwrap_or_default();

    let ordinary = OrdinaryFunction {
        source: Rc::new(source.clone()),
        closure,
        this_mode,
        home_object: None,
        fields: Vec::new(),
    };
    let proto = context.intrinsics().function_prototype();
    let object = JsObject::from_data(ObjectData::Function(FunctionObject::Ordinary(ordinary)), Some(proto));
    object.create_data_property(JsString::from("length"), length as u32, Attribute::builtin());
    object.create_data_property(JsString::from("name"), name, Attribute::builtin());

    if matches!(
        source.kind,
        FunctionKind::Ordinary | FunctionKind::Generator | FunctionKind::AsyncGenerator
    ) {
        let proto_parent = if source.kind == FunctionKind::Generator {
            context.intrinsics().generator_prototype()
        } else if source.kind == FunctionKind::AsyncGenerator {
            context.intrinsics().async_generator_prototype()
        } else {
            context.intrinsics().object_prototype()
        };
        let prototype_obj = JsObject::ordinary(Some(proto_parent));
        if source.kind == FunctionKind::Ordinary {
            let mut attrs = Attribute::default();
            attrs.set_writable(true);
            prototype_obj.create_data_property(JsString::from("constructor"), object.clone(), attrs);
        }
        let mut attrs = Attribute::default();
        attrs.set_writable(true);
        object.create_data_property(JsString::from("prototype"), prototype_obj, attrs);
    }

    object
}

/// `InstantiateOrdinaryFunctionExpression` (spec.md §5.4): a *named*
/// function expression can refer to itself, so it gets an extra
/// declarative scope between its closure and the surrounding one holding
/// just its own name, immutably bound to the function object.
pub fn create_function_expression(source: &AstFunction, outer_env: &Environment, context: &mut Context) -> JsResult<JsObject> {
    let Some(name) = &source.name else {
        return Ok(instantiate_function_object(source, outer_env.clone(), context));
    };
    let scope = Environment::new_declarative(Some(outer_env.clone()));
    scope.create_immutable_binding(&name.name, false)?;
    let func_obj = instantiate_function_object(source, scope.clone(), context);
    scope.initialize_binding(&name.name, JsValue::object(func_obj.clone()), context)?;
    Ok(func_obj)
}

fn run_function_body(source: &AstFunction, env: &Environment, context: &mut Context) -> JsResult<JsValue> {
    match statement::execute_statements(&source.body, env, context)? {
        Completion::Return(v) => Ok(v),
        _ => Ok(JsValue::undefined()),
    }
}

type OrdinaryParts = (
    Rc<AstFunction>,
    Environment,
    ThisMode,
    Option<JsObject>,
    Vec<(PropertyKey, Option<Expression>)>,
);

fn ordinary_parts(function: &JsObject) -> JsResult<OrdinaryParts> {
    let borrowed = function.borrow();
    let Some(FunctionObject::Ordinary(f)) = borrowed.as_function() else {
        return Err(JsNativeError::typ()
            .with_message("not an ordinary function")
            .into());
    };
    Ok((
        f.source.clone(),
        f.closure.clone(),
        f.this_mode,
        f.home_object.clone(),
        f.fields.clone(),
    ))
}

/// Runs a class constructor's instance field initializers (spec.md's
/// `InitializeInstanceElements`) against an already-allocated `this`,
/// evaluated in `env` (which has `this` bound).
fn apply_fields(
    this_value: &JsValue,
    fields: &[(PropertyKey, Option<Expression>)],
    env: &Environment,
    context: &mut Context,
) -> JsResult<()> {
    let Some(this_obj) = this_value.as_object() else {
        return Ok(());
    };
    for (key, init) in fields {
        let value = match init {
            Some(expr) => expression::evaluate_expression(expr, env, context)?,
            None => JsValue::undefined(),
        };
        this_obj.create_data_property(key.clone(), value, Attribute::all());
    }
    Ok(())
}

/// `[[Call]]` for an ordinary function (spec.md §4.2's
/// `OrdinaryCallEvaluateBody` + `PrepareForOrdinaryCall`). Tracks recursion
/// depth across the whole body regardless of how it returns (spec.md §4.5
/// "Quotas"), since `?` inside [`call_ordinary_body`] can unwind early.
pub fn call_ordinary(function: &JsObject, this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    context.quota().enter_call()?;
    let result = call_ordinary_body(function, this, args, context);
    context.quota().exit_call();
    result
}

fn call_ordinary_body(function: &JsObject, this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let (source, closure, this_mode, home_object, fields) = ordinary_parts(function)?;

    if source.kind == FunctionKind::Arrow {
        let env = Environment::new_declarative(Some(closure));
        declaration::function_declaration_instantiation(&source, &env, args, context)?;
        return run_function_body(&source, &env, context);
    }

    let this_value = match this_mode {
        ThisMode::Strict => this.clone(),
        _ if this.is_null_or_undefined() => JsValue::object(context.global_object()),
        _ if !this.is_object() => JsValue::object(this.to_object(context)?),
        _ => this.clone(),
    };

    let function_env = Environment::new_function(
        function.clone(),
        Some(this_value.clone()),
        ThisBindingStatus::Initialized,
        JsValue::undefined(),
        home_object,
        Some(closure),
    );
    declaration::function_declaration_instantiation(&source, &function_env, args, context)?;
    if !fields.is_empty() {
        apply_fields(&this_value, &fields, &function_env, context)?;
    }

    match source.kind {
        FunctionKind::Generator | FunctionKind::AsyncGenerator => {
            super::generator::create_generator_object(function, &source, &function_env, context)
        }
        FunctionKind::Async => {
            let outcome = run_function_body(&source, &function_env, context);
            Ok(JsValue::object(crate::builtins::promise::settle_async_call(outcome, context)))
        }
        FunctionKind::Ordinary | FunctionKind::Arrow => run_function_body(&source, &function_env, context),
    }
}

/// `[[Construct]]` for an ordinary function.
pub fn construct_ordinary(
    function: &JsObject,
    args: &[JsValue],
    new_target: &JsObject,
    context: &mut Context,
) -> JsResult<JsValue> {
    context.quota().enter_call()?;
    let result = construct_ordinary_body(function, args, new_target, context);
    context.quota().exit_call();
    result
}

fn construct_ordinary_body(
    function: &JsObject,
    args: &[JsValue],
    new_target: &JsObject,
    context: &mut Context,
) -> JsResult<JsValue> {
    let (source, closure, _, home_object, fields) = ordinary_parts(function)?;

    let this_object = if source.kind != FunctionKind::Arrow {
        let proto = context.get_prototype_from_constructor(new_target, |i| i.object_prototype())?;
        Some(JsObject::ordinary(Some(proto)))
    } else {
        None
    };

    let function_env = Environment::new_function(
        function.clone(),
        this_object.clone().map(JsValue::object),
        ThisBindingStatus::Initialized,
        JsValue::object(new_target.clone()),
        home_object,
        Some(closure),
    );
    declaration::function_declaration_instantiation(&source, &function_env, args, context)?;
    if !fields.is_empty() {
        if let Some(this_obj) = &this_object {
            apply_fields(&JsValue::object(this_obj.clone()), &fields, &function_env, context)?;
        }
    }
    let result = run_function_body(&source, &function_env, context)?;
    if result.is_object() {
        Ok(result)
    } else {
        Ok(JsValue::object(
            this_object.expect("non-arrow construct always creates a `this` object"),
        ))
    }
}
