//! Statement execution (spec.md §4.5). Every statement evaluates to a
//! [`Completion`]; loops and labeled statements interpret `Break`/
//! `Continue` themselves rather than letting them escape as Rust errors.

pub use super::declaration::global_declaration_instantiation;

use super::{
    completion::{self, Completion, ExecResult},
    declaration, expression, function,
    iterator::JsIterator,
};
use crate::{
    ast::{CatchClause, DeclarationKind, ForHead, ForInit, Statement, SwitchCase},
    context::Context,
    environment::Environment,
    error::JsError,
    property::PropertyKey,
    value::{self, JsValue},
};

pub fn execute_statements(stmts: &[Statement], env: &Environment, context: &mut Context) -> ExecResult {
    let mut result = Completion::Normal(JsValue::undefined());
    for stmt in stmts {
        context.quota().tick_statement()?;
        let completion = execute_statement(stmt, env, context)?;
        if completion.is_abrupt() {
            return Ok(completion);
        }
        result = completion;
    }
    Ok(result)
}

pub fn execute_statement(stmt: &Statement, env: &Environment, context: &mut Context) -> ExecResult {
    match stmt {
        Statement::Expression(expr) => Ok(Completion::Normal(expression::evaluate_expression(expr, env, context)?)),
        Statement::Block(stmts, _) => {
            let block_env = Environment::new_declarative(Some(env.clone()));
            declaration::block_declaration_instantiation(stmts, &block_env, context)?;
            execute_statements(stmts, &block_env, context)
        }
        Statement::VariableDeclaration(decl) => {
            for d in &decl.declarations {
                let value = match &d.init {
                    Some(expr) => expression::evaluate_expression(expr, env, context)?,
                    None => JsValue::undefined(),
                };
                if decl.kind == DeclarationKind::Var {
                    if d.init.is_some() {
                        expression::assign_pattern(&d.pattern, value, env, context)?;
                    }
                } else {
                    declaration::bind_pattern_declare(&d.pattern, value, env, false, context)?;
                }
            }
            Ok(Completion::Normal(JsValue::undefined()))
        }
        // Function declarations are installed by hoisting before the first
        // statement of their scope runs; nothing to do here.
        Statement::FunctionDeclaration(_) => Ok(Completion::Normal(JsValue::undefined())),
        Statement::ClassDeclaration(class) => {
            let ctor = expression::evaluate_class(class, env, context)?;
            if let Some(name) = &class.name {
                env.initialize_binding(&name.name, JsValue::object(ctor), context)?;
            }
            Ok(Completion::Normal(JsValue::undefined()))
        }
        Statement::Empty | Statement::Debugger => Ok(Completion::Normal(JsValue::undefined())),
        Statement::If {
            test,
            consequent,
            alternate,
            ..
        } => {
            if expression::evaluate_expression(test, env, context)?.to_boolean() {
                execute_statement(consequent, env, context)
            } else if let Some(alt) = alternate {
                execute_statement(alt, env, context)
            } else {
                Ok(Completion::Normal(JsValue::undefined()))
            }
        }
        Statement::For {
            init,
            test,
            update,
            body,
            ..
        } => execute_for(init, test, update, body, None, env, context),
        Statement::ForIn { left, right, body, .. } => execute_for_in(left, right, body, None, env, context),
        Statement::ForOf { left, right, body, .. } => execute_for_of(left, right, body, None, env, context),
        Statement::While { test, body, .. } => execute_while(test, body, None, env, context),
        Statement::DoWhile { test, body, .. } => execute_do_while(test, body, None, env, context),
        Statement::Return { argument, .. } => {
            let value = match argument {
                Some(e) => expression::evaluate_expression(e, env, context)?,
                None => JsValue::undefined(),
            };
            Ok(Completion::Return(value))
        }
        Statement::Break { label, .. } => Ok(Completion::Break(completion::label_name(label))),
        Statement::Continue { label, .. } => Ok(Completion::Continue(completion::label_name(label))),
        Statement::Throw { argument, .. } => {
            let value = expression::evaluate_expression(argument, env, context)?;
            Err(JsError::from_value(value))
        }
        Statement::Try {
            block,
            handler,
            finalizer,
            ..
        } => execute_try(block, handler, finalizer, env, context),
        Statement::Switch {
            discriminant, cases, ..
        } => execute_switch(discriminant, cases, env, context),
        Statement::Labeled { label, body } => execute_labeled(&label.name, body, env, context),
        Statement::With { object, body, .. } => {
            let obj_value = expression::evaluate_expression(object, env, context)?;
            let obj = obj_value.to_object(context)?;
            let with_env = Environment::new_object(obj, true, Some(env.clone()));
            execute_statement(body, &with_env, context)
        }
    }
}

// -- labels and loops -----------------------------------------------------

fn execute_labeled(label: &str, body: &Statement, env: &Environment, context: &mut Context) -> ExecResult {
    let completion = match body {
        Statement::For {
            init,
            test,
            update,
            body: b,
            ..
        } => execute_for(init, test, update, b, Some(label), env, context)?,
        Statement::ForIn { left, right, body: b, .. } => execute_for_in(left, right, b, Some(label), env, context)?,
        Statement::ForOf { left, right, body: b, .. } => execute_for_of(left, right, b, Some(label), env, context)?,
        Statement::While { test, body: b, .. } => execute_while(test, b, Some(label), env, context)?,
        Statement::DoWhile { test, body: b, .. } => execute_do_while(test, b, Some(label), env, context)?,
        Statement::Labeled {
            label: inner_label,
            body: inner_body,
        } => execute_labeled(&inner_label.name, inner_body, env, context)?,
        other => execute_statement(other, env, context)?,
    };
    match completion {
        Completion::Break(Some(ref l)) if l.as_ref() == label => Ok(Completion::Normal(JsValue::undefined())),
        other => Ok(other),
    }
}

enum LoopSignal {
    Break,
    Continue,
    Return(JsValue),
    PropagateBreak(Option<Box<str>>),
    PropagateContinue(Option<Box<str>>),
}

fn loop_signal(completion: Completion, label: Option<&str>) -> LoopSignal {
    match completion {
        Completion::Break(None) => LoopSignal::Break,
        Completion::Break(Some(l)) if label == Some(l.as_ref()) => LoopSignal::Break,
        Completion::Break(l) => LoopSignal::PropagateBreak(l),
        Completion::Continue(None) => LoopSignal::Continue,
        Completion::Continue(Some(l)) if label == Some(l.as_ref()) => LoopSignal::Continue,
        Completion::Continue(l) => LoopSignal::PropagateContinue(l),
        Completion::Return(v) => LoopSignal::Return(v),
        Completion::Normal(_) => LoopSignal::Continue,
    }
}

fn execute_while(test: &crate::ast::Expression, body: &Statement, label: Option<&str>, env: &Environment, context: &mut Context) -> ExecResult {
    loop {
        context.quota().tick_loop_iteration()?;
        if !expression::evaluate_expression(test, env, context)?.to_boolean() {
            break;
        }
        let completion = execute_statement(body, env, context)?;
        match loop_signal(completion, label) {
            LoopSignal::Break => break,
            LoopSignal::Continue => {}
            LoopSignal::Return(v) => return Ok(Completion::Return(v)),
            LoopSignal::PropagateBreak(l) => return Ok(Completion::Break(l)),
            LoopSignal::PropagateContinue(l) => return Ok(Completion::Continue(l)),
        }
    }
    Ok(Completion::Normal(JsValue::undefined()))
}

fn execute_do_while(test: &crate::ast::Expression, body: &Statement, label: Option<&str>, env: &Environment, context: &mut Context) -> ExecResult {
    loop {
        context.quota().tick_loop_iteration()?;
        let completion = execute_statement(body, env, context)?;
        match loop_signal(completion, label) {
            LoopSignal::Break => break,
            LoopSignal::Continue => {}
            LoopSignal::Return(v) => return Ok(Completion::Return(v)),
            LoopSignal::PropagateBreak(l) => return Ok(Completion::Break(l)),
            LoopSignal::PropagateContinue(l) => return Ok(Completion::Continue(l)),
        }
        if !expression::evaluate_expression(test, env, context)?.to_boolean() {
            break;
        }
    }
    Ok(Completion::Normal(JsValue::undefined()))
}

fn execute_for(
    init: &Option<Box<ForInit>>,
    test: &Option<crate::ast::Expression>,
    update: &Option<crate::ast::Expression>,
    body: &Statement,
    label: Option<&str>,
    env: &Environment,
    context: &mut Context,
) -> ExecResult {
    let mut loop_env = Environment::new_declarative(Some(env.clone()));
    let mut per_iteration_names: Vec<Box<str>> = Vec::new();

    if let Some(init) = init {
        match init.as_ref() {
            ForInit::VariableDeclaration(decl) if decl.kind != DeclarationKind::Var => {
                for d in &decl.declarations {
                    declaration::collect_pattern_names(&d.pattern, &mut per_iteration_names);
                }
                for n in &per_iteration_names {
                    if decl.kind == DeclarationKind::Const {
                        loop_env.create_immutable_binding(n, true)?;
                    } else {
                        loop_env.create_mutable_binding(n, false)?;
                    }
                }
                for d in &decl.declarations {
                    let value = match &d.init {
                        Some(expr) => expression::evaluate_expression(expr, &loop_env, context)?,
                        None => JsValue::undefined(),
                    };
                    declaration::bind_pattern_declare(&d.pattern, value, &loop_env, false, context)?;
                }
            }
            ForInit::VariableDeclaration(decl) => {
                for d in &decl.declarations {
                    if let Some(expr) = &d.init {
                        let value = expression::evaluate_expression(expr, &loop_env, context)?;
                        expression::assign_pattern(&d.pattern, value, &loop_env, context)?;
                    }
                }
            }
            ForInit::Expression(expr) => {
                expression::evaluate_expression(expr, &loop_env, context)?;
            }
        }
    }

    loop {
        context.quota().tick_loop_iteration()?;
        if !per_iteration_names.is_empty() {
            loop_env = copy_per_iteration_environment(&loop_env, &per_iteration_names, env, context)?;
        }
        if let Some(test) = test {
            if !expression::evaluate_expression(test, &loop_env, context)?.to_boolean() {
                break;
            }
        }
        let completion = execute_statement(body, &loop_env, context)?;
        match loop_signal(completion, label) {
            LoopSignal::Break => break,
            LoopSignal::Continue => {}
            LoopSignal::Return(v) => return Ok(Completion::Return(v)),
            LoopSignal::PropagateBreak(l) => return Ok(Completion::Break(l)),
            LoopSignal::PropagateContinue(l) => return Ok(Completion::Continue(l)),
        }
        if let Some(update) = update {
            expression::evaluate_expression(update, &loop_env, context)?;
        }
    }
    Ok(Completion::Normal(JsValue::undefined()))
}

/// `CreatePerIterationEnvironment` (spec.md §4.5): a `for (let ...)` loop
/// gives each iteration its own copy of the loop variables, so closures
/// created in different iterations close over distinct bindings.
fn copy_per_iteration_environment(
    current: &Environment,
    names: &[Box<str>],
    outer: &Environment,
    context: &mut Context,
) -> crate::error::JsResult<Environment> {
    let fresh = Environment::new_declarative(Some(outer.clone()));
    for name in names {
        let value = current.get_binding_value(name, false, context)?;
        fresh.create_mutable_binding(name, false)?;
        fresh.initialize_binding(name, value, context)?;
    }
    Ok(fresh)
}

fn bind_for_head(left: &ForHead, value: JsValue, loop_env: &Environment, context: &mut Context) -> crate::error::JsResult<()> {
    match left {
        ForHead::VariableDeclaration { kind, pattern } => match kind {
            DeclarationKind::Var => expression::assign_pattern(pattern, value, loop_env, context),
            DeclarationKind::Const => {
                let mut names = Vec::new();
                declaration::collect_pattern_names(pattern, &mut names);
                for n in &names {
                    loop_env.create_immutable_binding(n, true)?;
                }
                declaration::bind_pattern_declare(pattern, value, loop_env, false, context)
            }
            DeclarationKind::Let => {
                let mut names = Vec::new();
                declaration::collect_pattern_names(pattern, &mut names);
                for n in &names {
                    loop_env.create_mutable_binding(n, false)?;
                }
                declaration::bind_pattern_declare(pattern, value, loop_env, false, context)
            }
        },
        ForHead::Pattern(pattern) => expression::assign_pattern(pattern, value, loop_env, context),
    }
}

fn execute_for_in(
    left: &ForHead,
    right: &crate::ast::Expression,
    body: &Statement,
    label: Option<&str>,
    env: &Environment,
    context: &mut Context,
) -> ExecResult {
    let rhs = expression::evaluate_expression(right, env, context)?;
    if rhs.is_null_or_undefined() {
        return Ok(Completion::Normal(JsValue::undefined()));
    }
    let obj = rhs.to_object(context)?;

    let mut seen = std::collections::HashSet::new();
    let mut keys = Vec::new();
    let mut current = Some(obj);
    while let Some(o) = current {
        for key in o.own_property_keys() {
            if key.is_symbol() || seen.contains(&key) {
                continue;
            }
            seen.insert(key.clone());
            if let Some(desc) = o.get_own_property(&key) {
                if desc.enumerable() {
                    keys.push(key);
                }
            }
        }
        current = o.get_prototype_of();
    }

    for key in keys {
        context.quota().tick_loop_iteration()?;
        let PropertyKey::String(s) = key else { continue };
        let loop_env = Environment::new_declarative(Some(env.clone()));
        bind_for_head(left, JsValue::string(s), &loop_env, context)?;
        let completion = execute_statement(body, &loop_env, context)?;
        match loop_signal(completion, label) {
            LoopSignal::Break => break,
            LoopSignal::Continue => {}
            LoopSignal::Return(v) => return Ok(Completion::Return(v)),
            LoopSignal::PropagateBreak(l) => return Ok(Completion::Break(l)),
            LoopSignal::PropagateContinue(l) => return Ok(Completion::Continue(l)),
        }
    }
    Ok(Completion::Normal(JsValue::undefined()))
}

fn execute_for_of(
    left: &ForHead,
    right: &crate::ast::Expression,
    body: &Statement,
    label: Option<&str>,
    env: &Environment,
    context: &mut Context,
) -> ExecResult {
    let rhs = expression::evaluate_expression(right, env, context)?;
    let mut iter = JsIterator::from_value(&rhs, context)?;
    loop {
        if let Err(e) = context.quota().tick_loop_iteration() {
            iter.close(context);
            return Err(e.into());
        }
        let Some(value) = iter.next(context)? else { break };
        let loop_env = Environment::new_declarative(Some(env.clone()));
        bind_for_head(left, value, &loop_env, context)?;
        let completion = match execute_statement(body, &loop_env, context) {
            Ok(c) => c,
            Err(e) => {
                iter.close(context);
                return Err(e);
            }
        };
        match loop_signal(completion, label) {
            LoopSignal::Break => {
                iter.close(context);
                break;
            }
            LoopSignal::Continue => {}
            LoopSignal::Return(v) => {
                iter.close(context);
                return Ok(Completion::Return(v));
            }
            LoopSignal::PropagateBreak(l) => {
                iter.close(context);
                return Ok(Completion::Break(l));
            }
            LoopSignal::PropagateContinue(l) => {
                iter.close(context);
                return Ok(Completion::Continue(l));
            }
        }
    }
    Ok(Completion::Normal(JsValue::undefined()))
}

// -- try/catch/finally ------------------------------------------------------

fn execute_try(
    block: &[Statement],
    handler: &Option<CatchClause>,
    finalizer: &Option<Vec<Statement>>,
    env: &Environment,
    context: &mut Context,
) -> ExecResult {
    let block_env = Environment::new_declarative(Some(env.clone()));
    declaration::block_declaration_instantiation(block, &block_env, context)?;
    let result = execute_statements(block, &block_env, context);

    let result = match result {
        Err(err) => match handler {
            // A quota trip is host-fatal (spec.md §5, §7): it must unwind
            // past `catch` untouched, running only `finally` below.
            Some(_) if context.quota().has_fault() => Err(err),
            Some(h) => {
                let catch_env = Environment::new_declarative(Some(env.clone()));
                if let Some(param) = &h.param {
                    let mut names = Vec::new();
                    declaration::collect_pattern_names(param, &mut names);
                    for n in &names {
                        catch_env.create_mutable_binding(n, false)?;
                    }
                    let error_value = context.realm_error(err);
                    declaration::bind_pattern_declare(param, error_value, &catch_env, false, context)?;
                }
                declaration::block_declaration_instantiation(&h.body, &catch_env, context)?;
                execute_statements(&h.body, &catch_env, context)
            }
            None => Err(err),
        },
        ok => ok,
    };

    if let Some(fin) = finalizer {
        let fin_env = Environment::new_declarative(Some(env.clone()));
        declaration::block_declaration_instantiation(fin, &fin_env, context)?;
        let fin_result = execute_statements(fin, &fin_env, context)?;
        if fin_result.is_abrupt() {
            return Ok(fin_result);
        }
    }

    result
}

// -- switch -------------------------------------------------------------

fn execute_switch(
    discriminant: &crate::ast::Expression,
    cases: &[SwitchCase],
    env: &Environment,
    context: &mut Context,
) -> ExecResult {
    let value = expression::evaluate_expression(discriminant, env, context)?;
    let switch_env = Environment::new_declarative(Some(env.clone()));

    let mut lexical = Vec::new();
    let mut functions = Vec::new();
    for case in cases {
        lexical.extend(declaration::lexical_declarations(&case.consequent));
        functions.extend(declaration::top_level_functions(&case.consequent));
    }
    for (name, is_const) in &lexical {
        if *is_const {
            switch_env.create_immutable_binding(name, true)?;
        } else {
            switch_env.create_mutable_binding(name, false)?;
        }
    }
    for f in &functions {
        if let Some(name) = &f.name {
            let func_obj = function::instantiate_function_object(f, switch_env.clone(), context);
            switch_env.create_mutable_binding(&name.name, false)?;
            switch_env.initialize_binding(&name.name, JsValue::object(func_obj), context)?;
        }
    }

    let mut matched_index = None;
    for (i, case) in cases.iter().enumerate() {
        if let Some(test) = &case.test {
            let test_value = expression::evaluate_expression(test, &switch_env, context)?;
            if value::strict_equals(&value, &test_value) {
                matched_index = Some(i);
                break;
            }
        }
    }
    let start = match matched_index {
        Some(i) => i,
        None => match cases.iter().position(|c| c.test.is_none()) {
            Some(i) => i,
            None => return Ok(Completion::Normal(JsValue::undefined())),
        },
    };

    for case in &cases[start..] {
        let completion = execute_statements(&case.consequent, &switch_env, context)?;
        match completion {
            Completion::Break(None) => return Ok(Completion::Normal(JsValue::undefined())),
            Completion::Normal(_) => continue,
            other => return Ok(other),
        }
    }
    Ok(Completion::Normal(JsValue::undefined()))
}
