//! Hoisting and binding instantiation (spec.md §4.5, §4.6).
//!
//! `GlobalDeclarationInstantiation` and `FunctionDeclarationInstantiation`
//! both reduce to the same two passes over a statement list: find every
//! `var`/function/lexical name it declares (without descending into
//! nested function bodies), then create the bindings before a single
//! statement runs. `destructure` is the other half of binding: walking a
//! `BindingPattern` against a value, shared by parameter binding,
//! `let`/`const`/`var` declarators, `catch` clauses and destructuring
//! assignment.

use crate::{
    ast::{
        pattern::{ArrayPattern, ObjectPattern},
        BindingPattern, DeclarationKind, ForHead, ForInit, Function, Identifier, Script, Statement,
    },
    context::Context,
    environment::{already_declared, Environment},
    error::{JsNativeError, JsResult},
    object::JsObject,
    property::{Attribute, PropertyKey},
    value::JsValue,
};

use super::{expression, function, iterator::JsIterator};

pub(crate) fn collect_pattern_names(pattern: &BindingPattern, out: &mut Vec<Box<str>>) {
    match pattern {
        BindingPattern::Identifier(id) => out.push(id.name.clone()),
        BindingPattern::Array(arr) => {
            for el in &arr.elements {
                if let Some(p) = el {
                    collect_pattern_names(p, out);
                }
            }
            if let Some(rest) = &arr.rest {
                collect_pattern_names(rest, out);
            }
        }
        BindingPattern::Object(obj) => {
            for p in &obj.properties {
                collect_pattern_names(&p.value, out);
            }
            if let Some(rest) = &obj.rest {
                collect_pattern_names(rest, out);
            }
        }
        BindingPattern::Assignment { target, .. } => collect_pattern_names(target, out),
    }
}

/// `VarDeclaredNames`: every `var` and function-declaration name a
/// statement list introduces, descending into nested statements but not
/// into nested function bodies.
pub fn var_declared_names(stmts: &[Statement]) -> Vec<Box<str>> {
    let mut out = Vec::new();
    for s in stmts {
        collect_var_names(s, &mut out);
    }
    out
}

fn collect_var_names(stmt: &Statement, out: &mut Vec<Box<str>>) {
    match stmt {
        Statement::VariableDeclaration(decl) if decl.kind == DeclarationKind::Var => {
            for d in &decl.declarations {
                collect_pattern_names(&d.pattern, out);
            }
        }
        Statement::FunctionDeclaration(f) => {
            if let Some(name) = &f.name {
                out.push(name.name.clone());
            }
        }
        Statement::Block(stmts, _) => {
            for s in stmts {
                collect_var_names(s, out);
            }
        }
        Statement::If {
            consequent,
            alternate,
            ..
        } => {
            collect_var_names(consequent, out);
            if let Some(a) = alternate {
                collect_var_names(a, out);
            }
        }
        Statement::For { init, body, .. } => {
            if let Some(init) = init {
                if let ForInit::VariableDeclaration(decl) = init.as_ref() {
                    if decl.kind == DeclarationKind::Var {
                        for d in &decl.declarations {
                            collect_pattern_names(&d.pattern, out);
                        }
                    }
                }
            }
            collect_var_names(body, out);
        }
        Statement::ForIn { left, body, .. } | Statement::ForOf { left, body, .. } => {
            if let ForHead::VariableDeclaration {
                kind: DeclarationKind::Var,
                pattern,
            } = left
            {
                collect_pattern_names(pattern, out);
            }
            collect_var_names(body, out);
        }
        Statement::While { body, .. } | Statement::DoWhile { body, .. } => collect_var_names(body, out),
        Statement::Try {
            block,
            handler,
            finalizer,
            ..
        } => {
            for s in block {
                collect_var_names(s, out);
            }
            if let Some(h) = handler {
                for s in &h.body {
                    collect_var_names(s, out);
                }
            }
            if let Some(f) = finalizer {
                for s in f {
                    collect_var_names(s, out);
                }
            }
        }
        Statement::Switch { cases, .. } => {
            for case in cases {
                for s in &case.consequent {
                    collect_var_names(s, out);
                }
            }
        }
        Statement::Labeled { body, .. } => collect_var_names(body, out),
        Statement::With { body, .. } => collect_var_names(body, out),
        _ => {}
    }
}

/// `LexicallyDeclaredNames` at the top of a statement list (`let`/`const`
/// declarators and class names); does not descend into nested blocks.
pub fn lexical_declarations(stmts: &[Statement]) -> Vec<(Box<str>, bool)> {
    let mut out = Vec::new();
    for s in stmts {
        match s {
            Statement::VariableDeclaration(decl) if decl.kind != DeclarationKind::Var => {
                let is_const = decl.kind == DeclarationKind::Const;
                for d in &decl.declarations {
                    let mut names = Vec::new();
                    collect_pattern_names(&d.pattern, &mut names);
                    for n in names {
                        out.push((n, is_const));
                    }
                }
            }
            Statement::ClassDeclaration(c) => {
                if let Some(name) = &c.name {
                    out.push((name.name.clone(), false));
                }
            }
            _ => {}
        }
    }
    out
}

/// `FunctionDeclaration`s at the top of a statement list (hoisted to the
/// enclosing function/global scope rather than left as block-scoped).
pub fn top_level_functions(stmts: &[Statement]) -> Vec<&Function> {
    stmts
        .iter()
        .filter_map(|s| match s {
            Statement::FunctionDeclaration(f) => Some(f.as_ref()),
            _ => None,
        })
        .collect()
}

/// `GlobalDeclarationInstantiation` (spec.md §4.6): installs every
/// top-level `var`/function/lexical name a script declares into the
/// global environment before the first statement runs.
pub fn global_declaration_instantiation(script: &Script, env: &Environment, context: &mut Context) -> JsResult<()> {
    let var_names = var_declared_names(&script.statements);
    let lexical_names = lexical_declarations(&script.statements);
    let functions = top_level_functions(&script.statements);

    for (name, _) in &lexical_names {
        if env.has_restricted_global_property(name) {
            return Err(already_declared(name));
        }
    }
    for name in &var_names {
        if lexical_names.iter().any(|(n, _)| n == name) {
            return Err(already_declared(name));
        }
    }

    let mut declared_function_names: Vec<Box<str>> = Vec::new();
    for f in functions.iter().rev() {
        if let Some(name) = &f.name {
            if !declared_function_names.contains(&name.name) {
                if !env.can_declare_global_function(&name.name) {
                    return Err(cannot_declare_global(&name.name));
                }
                declared_function_names.push(name.name.clone());
            }
        }
    }
    for name in &var_names {
        if declared_function_names.iter().any(|n| n == name) {
            continue;
        }
        if !env.can_declare_global_var(name, context)? {
            return Err(cannot_declare_global(name));
        }
    }

    for (name, is_const) in &lexical_names {
        if *is_const {
            env.create_immutable_binding(name, true)?;
        } else {
            env.create_mutable_binding(name, false)?;
        }
    }

    for f in &functions {
        if let Some(name) = &f.name {
            let func_obj = function::instantiate_function_object(f, env.clone(), context);
            env.create_global_function_binding(&name.name, JsValue::object(func_obj), false, context)?;
        }
    }

    for name in &var_names {
        if declared_function_names.iter().any(|n| n == name) {
            continue;
        }
        env.create_global_var_binding(name, false, context)?;
    }

    Ok(())
}

/// `FunctionDeclarationInstantiation` (spec.md §4.6): binds parameters,
/// creates the `arguments` object, and hoists the function body's own
/// `var`/function/lexical declarations, all directly into `env`.
pub fn function_declaration_instantiation(
    source: &Function,
    env: &Environment,
    args: &[JsValue],
    context: &mut Context,
) -> JsResult<()> {
    let mut param_names: Vec<Box<str>> = Vec::new();
    for p in &source.params {
        collect_pattern_names(&p.pattern, &mut param_names);
    }

    let mut i = 0usize;
    for param in &source.params {
        if param.rest {
            let rest_values: Vec<JsValue> = args.get(i..).map(<[JsValue]>::to_vec).unwrap_or_default();
            let array = context.new_array(rest_values);
            bind_pattern_declare(&param.pattern, JsValue::object(array), env, true, context)?;
            break;
        }
        let mut value = args.get(i).cloned().unwrap_or_else(JsValue::undefined);
        if value.is_undefined() {
            if let Some(default) = &param.default {
                value = expression::evaluate_expression(default, env, context)?;
            }
        }
        bind_pattern_declare(&param.pattern, value, env, true, context)?;
        i += 1;
    }

    use crate::ast::FunctionKind;
    if !matches!(source.kind, FunctionKind::Arrow) && !param_names.iter().any(|n| &**n == "arguments") {
        let arguments = build_arguments_object(args, context);
        env.create_mutable_binding("arguments", false)?;
        env.initialize_binding("arguments", JsValue::object(arguments), context)?;
    }

    let var_names = var_declared_names(&source.body);
    for name in &var_names {
        if env.has_binding(name, context)? {
            continue;
        }
        env.create_mutable_binding(name, false)?;
        env.initialize_binding(name, JsValue::undefined(), context)?;
    }

    for f in top_level_functions(&source.body) {
        if let Some(name) = &f.name {
            let func_obj = function::instantiate_function_object(f, env.clone(), context);
            if !env.has_binding(&name.name, context)? {
                env.create_mutable_binding(&name.name, false)?;
            }
            env.initialize_binding(&name.name, JsValue::object(func_obj), context)?;
        }
    }

    for (name, is_const) in lexical_declarations(&source.body) {
        if is_const {
            env.create_immutable_binding(&name, true)?;
        } else {
            env.create_mutable_binding(&name, false)?;
        }
    }

    Ok(())
}

/// `BlockDeclarationInstantiation` (spec.md §4.6): installs a nested
/// block's own lexical/function names into a freshly-created child
/// environment. Called whenever a new lexical scope is entered (block
/// statements, `catch` bodies, `switch` bodies, loop bodies that declare
/// their own block scope).
pub fn block_declaration_instantiation(stmts: &[Statement], env: &Environment, context: &mut Context) -> JsResult<()> {
    for (name, is_const) in lexical_declarations(stmts) {
        if is_const {
            env.create_immutable_binding(&name, true)?;
        } else {
            env.create_mutable_binding(&name, false)?;
        }
    }
    for f in top_level_functions(stmts) {
        if let Some(name) = &f.name {
            let func_obj = function::instantiate_function_object(f, env.clone(), context);
            env.create_mutable_binding(&name.name, false)?;
            env.initialize_binding(&name.name, JsValue::object(func_obj), context)?;
        }
    }
    Ok(())
}

/// Binds a destructuring pattern against a freshly-produced value,
/// creating bindings as it goes (`create = true` for parameters and
/// `catch` clauses, which always introduce new bindings) or initializing
/// ones that hoisting already created (`let`/`const`/`var` declarators).
pub fn bind_pattern_declare(
    pattern: &BindingPattern,
    value: JsValue,
    env: &Environment,
    create: bool,
    context: &mut Context,
) -> JsResult<()> {
    destructure(pattern, value, env, context, &mut |id, value, env, context| {
        if create {
            env.create_mutable_binding(&id.name, false)?;
        }
        env.initialize_binding(&id.name, value, context)
    })
}

/// The shape-walking half of destructuring, parameterized over what
/// happens at each leaf identifier so declaration-binding and
/// assignment-target destructuring (spec.md's `BindingInitialization` vs
/// `DestructuringAssignmentEvaluation`) can share the array/object/default
/// traversal.
pub fn destructure<F>(
    pattern: &BindingPattern,
    value: JsValue,
    env: &Environment,
    context: &mut Context,
    leaf: &mut F,
) -> JsResult<()>
where
    F: FnMut(&Identifier, JsValue, &Environment, &mut Context) -> JsResult<()>,
{
    match pattern {
        BindingPattern::Identifier(id) => leaf(id, value, env, context),
        BindingPattern::Assignment { target, default } => {
            let value = if value.is_undefined() {
                expression::evaluate_expression(default, env, context)?
            } else {
                value
            };
            destructure(target, value, env, context, leaf)
        }
        BindingPattern::Array(arr) => destructure_array(arr, value, env, context, leaf),
        BindingPattern::Object(obj) => destructure_object(obj, value, env, context, leaf),
    }
}

fn destructure_array<F>(
    arr: &ArrayPattern,
    value: JsValue,
    env: &Environment,
    context: &mut Context,
    leaf: &mut F,
) -> JsResult<()>
where
    F: FnMut(&Identifier, JsValue, &Environment, &mut Context) -> JsResult<()>,
{
    let mut iter = JsIterator::from_value(&value, context)?;
    for el in &arr.elements {
        let item = iter.next(context)?.unwrap_or_else(JsValue::undefined);
        if let Some(p) = el {
            destructure(p, item, env, context, leaf)?;
        }
    }
    if let Some(rest) = &arr.rest {
        let mut remaining = Vec::new();
        while let Some(v) = iter.next(context)? {
            remaining.push(v);
        }
        let array = context.new_array(remaining);
        destructure(rest, JsValue::object(array), env, context, leaf)?;
    } else {
        iter.close(context);
    }
    Ok(())
}

fn destructure_object<F>(
    obj: &ObjectPattern,
    value: JsValue,
    env: &Environment,
    context: &mut Context,
    leaf: &mut F,
) -> JsResult<()>
where
    F: FnMut(&Identifier, JsValue, &Environment, &mut Context) -> JsResult<()>,
{
    if value.is_null_or_undefined() {
        return Err(JsNativeError::typ()
            .with_message("Cannot destructure 'null' or 'undefined'")
            .into());
    }
    let mut used_keys: Vec<PropertyKey> = Vec::new();
    for prop in &obj.properties {
        let key = expression::eval_property_key(&prop.key, env, context)?;
        used_keys.push(key.clone());
        let item = if let Some(o) = value.as_object() {
            o.get(key, context)?
        } else {
            value.to_object(context)?.get(key, context)?
        };
        destructure(&prop.value, item, env, context, leaf)?;
    }
    if let Some(rest) = &obj.rest {
        let rest_obj = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
        if let Some(o) = value.as_object() {
            for key in o.own_property_keys() {
                if used_keys.contains(&key) {
                    continue;
                }
                if let Some(desc) = o.get_own_property(&key) {
                    if desc.enumerable() {
                        let v = o.get(key.clone(), context)?;
                        rest_obj.create_data_property(key, v, Attribute::all());
                    }
                }
            }
        }
        destructure(rest, JsValue::object(rest_obj), env, context, leaf)?;
    }
    Ok(())
}

/// Builds the (unmapped) `arguments` object: an ordinary object with
/// indexed data properties, `length`, and `Symbol.iterator` borrowed from
/// `Array.prototype` (spec.md's `CreateUnmappedArgumentsObject`;
/// parameter-mapped `arguments` for non-strict sloppy functions is not
/// implemented, since nothing else in this engine observes the
/// difference without a live binding back to reassigned parameters).
fn build_arguments_object(args: &[JsValue], context: &mut Context) -> JsObject {
    let proto = context.intrinsics().object_prototype();
    let object = JsObject::from_data(crate::object::ObjectData::Arguments { mapped: false }, Some(proto));
    for (i, arg) in args.iter().enumerate() {
        object.create_data_property(i as u32, arg.clone(), Attribute::all());
    }
    let mut len_attrs = Attribute::default();
    len_attrs.set_writable(true);
    len_attrs.set_configurable(true);
    object.create_data_property("length", args.len() as u32, len_attrs);
    object
}

fn cannot_declare_global(name: &str) -> crate::error::JsError {
    JsNativeError::typ()
        .with_message(format!("Cannot declare global binding '{}'", name))
        .into()
}
