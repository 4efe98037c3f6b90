//! `function*`/`async function*` bodies (spec.md §4.5): a resumable
//! [`GeneratorState`] that suspends at `yield` and picks back up where it
//! left off on the next `next`/`return`/`throw` call, instead of running
//! the whole body to completion in one synchronous call.
//!
//! Full coroutine suspension would need either OS threads (ruled out: a
//! `Gc`-backed [`JsValue`]/[`Environment`] is not `Send`) or rewriting the
//! whole tree-walker in continuation-passing style. Instead this models
//! only `yield` appearing directly in a function body's own top-level
//! statement list, as one of three shapes:
//!
//!   - `yield expr;` (an expression statement)
//!   - `let v = yield expr;` / `const v = yield expr;` (single declarator)
//!   - `return yield expr;`
//!
//! and remembers where it stopped as a plain statement index plus a
//! [`YieldLeaf`] describing what to do with the value the caller resumes
//! with. A `yield` anywhere else — nested inside an `if`/loop body, inside
//! `try`/`switch`, as a sub-expression of something larger — still
//! evaluates (see `exec::expression`'s `Expression::Yield` arm) but cannot
//! suspend there; the statement containing it runs to completion in one
//! shot the first time the walker reaches it. `yield*` delegates eagerly:
//! the whole delegated iterable is drained up front into a queue and its
//! values are handed out one per subsequent call, so the delegate's own
//! suspension points (if it's another generator) are not interleaved with
//! the delegating generator's own resumption, and the expression's result
//! value (normally the delegate's `return` value) is always `undefined`.

use super::{
    completion::Completion,
    expression,
    iterator::JsIterator,
    statement::execute_statement,
};
use crate::{
    ast::{BindingPattern, DeclarationKind, Expression, Function as AstFunction, FunctionKind, Statement},
    context::Context,
    environment::Environment,
    error::{JsError, JsNativeError, JsResult},
    object::{JsObject, ObjectData},
    property::Attribute,
    string::JsString,
    value::JsValue,
};
use gc::{custom_trace, Finalize, Trace};
use std::{collections::VecDeque, rc::Rc};

#[derive(Clone)]
enum YieldLeaf {
    Discard,
    Bind(Box<str>),
    Return,
}

enum PendingYield {
    None,
    Single(YieldLeaf),
    Delegated { remaining: VecDeque<JsValue>, leaf: YieldLeaf },
}

/// The suspended state of one `function*`/`async function*` call.
/// `source`/`env` are the same pieces an ordinary call already builds
/// (see `exec::function::call_ordinary_body`); a generator just keeps
/// them alive across calls instead of handing them to `run_function_body`
/// once.
pub struct GeneratorState {
    source: Rc<AstFunction>,
    env: Environment,
    cursor: usize,
    pending: PendingYield,
    done: bool,
}

impl Finalize for GeneratorState {}
unsafe impl Trace for GeneratorState {
    custom_trace!(this, {
        mark(&this.env);
        if let PendingYield::Delegated { remaining, .. } = &this.pending {
            for v in remaining {
                mark(v);
            }
        }
    });
}

/// Recognizes the three statement shapes a resumable `yield` can occupy.
fn yield_shape(stmt: &Statement) -> Option<(&Option<Box<Expression>>, bool, YieldLeaf)> {
    match stmt {
        Statement::Expression(Expression::Yield { argument, delegate, .. }) => {
            Some((argument, *delegate, YieldLeaf::Discard))
        }
        Statement::Return {
            argument: Some(Expression::Yield { argument, delegate, .. }),
            ..
        } => Some((argument, *delegate, YieldLeaf::Return)),
        Statement::VariableDeclaration(decl) if decl.kind != DeclarationKind::Var && decl.declarations.len() == 1 => {
            let d = &decl.declarations[0];
            match (&d.pattern, &d.init) {
                (BindingPattern::Identifier(id), Some(Expression::Yield { argument, delegate, .. })) => {
                    Some((argument, *delegate, YieldLeaf::Bind(id.name.clone())))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

impl GeneratorState {
    fn apply_leaf(&mut self, leaf: YieldLeaf, incoming: JsValue, context: &mut Context) -> JsResult<Option<(JsValue, bool)>> {
        match leaf {
            YieldLeaf::Return => {
                self.done = true;
                Ok(Some((incoming, true)))
            }
            YieldLeaf::Discard => Ok(None),
            YieldLeaf::Bind(name) => {
                self.env.initialize_binding(&name, incoming, context)?;
                Ok(None)
            }
        }
    }

    /// Advances the generator by one `next`/`return`-with-value step,
    /// returning the yielded (or final) value and whether it's done.
    fn resume(&mut self, incoming: JsValue, context: &mut Context) -> JsResult<(JsValue, bool)> {
        if self.done {
            return Ok((JsValue::undefined(), true));
        }

        if let PendingYield::Delegated { remaining, .. } = &mut self.pending {
            if let Some(v) = remaining.pop_front() {
                let done_draining = remaining.is_empty();
                if done_draining {
                    let PendingYield::Delegated { leaf, .. } = std::mem::replace(&mut self.pending, PendingYield::None) else {
                        unreachable!()
                    };
                    self.pending = PendingYield::Single(leaf);
                }
                return Ok((v, false));
            }
        }

        if let PendingYield::Single(_) = self.pending {
            let PendingYield::Single(leaf) = std::mem::replace(&mut self.pending, PendingYield::None) else {
                unreachable!()
            };
            if let Some(result) = self.apply_leaf(leaf, incoming, context)? {
                return Ok(result);
            }
        }

        let source = self.source.clone();
        let body = &source.body;
        let mut i = self.cursor;
        while i < body.len() {
            if let Some((argument, delegate, leaf)) = yield_shape(&body[i]) {
                let value = match argument {
                    Some(e) => expression::evaluate_expression(e, &self.env, context)?,
                    None => JsValue::undefined(),
                };
                self.cursor = i + 1;
                if !delegate {
                    self.pending = PendingYield::Single(leaf);
                    return Ok((value, false));
                }
                let mut iter = JsIterator::from_value(&value, context)?;
                let mut queue = VecDeque::new();
                while let Some(v) = iter.next(context)? {
                    queue.push_back(v);
                }
                if let Some(first) = queue.pop_front() {
                    self.pending = if queue.is_empty() {
                        PendingYield::Single(leaf)
                    } else {
                        PendingYield::Delegated { remaining: queue, leaf }
                    };
                    return Ok((first, false));
                }
                if let Some(result) = self.apply_leaf(leaf, JsValue::undefined(), context)? {
                    return Ok(result);
                }
                i += 1;
                continue;
            }

            if let Completion::Return(v) = execute_statement(&body[i], &self.env, context)? {
                self.done = true;
                return Ok((v, true));
            }
            i += 1;
        }
        self.cursor = body.len();
        self.done = true;
        Ok((JsValue::undefined(), true))
    }
}

/// `[[Call]]`'s generator branch (spec.md §4.5): builds the generator
/// object instead of running the body. The body doesn't execute at all
/// until the first `next()` call, matching `function*`'s lazy-start
/// semantics.
pub fn create_generator_object(
    function: &JsObject,
    source: &Rc<AstFunction>,
    env: &Environment,
    context: &mut Context,
) -> JsResult<JsValue> {
    let fallback = if source.kind == FunctionKind::AsyncGenerator {
        context.intrinsics().async_generator_prototype()
    } else {
        context.intrinsics().generator_prototype()
    };
    let proto = function
        .get(JsString::from("prototype"), context)?
        .as_object()
        .cloned()
        .unwrap_or(fallback);

    let state = GeneratorState {
        source: source.clone(),
        env: env.clone(),
        cursor: 0,
        pending: PendingYield::None,
        done: false,
    };
    Ok(JsValue::object(JsObject::from_data(ObjectData::Generator(state), Some(proto))))
}

fn make_iter_result(value: JsValue, done: bool, context: &mut Context) -> JsValue {
    let result = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    result.create_data_property("value", value, Attribute::all());
    result.create_data_property("done", done, Attribute::all());
    JsValue::object(result)
}

enum ResumeKind {
    Next,
    Return,
    Throw,
}

fn generator_resume(this: &JsValue, arg: JsValue, kind: ResumeKind, context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object().cloned() else {
        return Err(JsNativeError::typ().with_message("not a generator").into());
    };
    let is_async = {
        let borrowed = obj.borrow();
        match &borrowed.data {
            ObjectData::Generator(state) => state.source.kind == FunctionKind::AsyncGenerator,
            _ => return Err(JsNativeError::typ().with_message("not a generator").into()),
        }
    };

    let outcome: JsResult<(JsValue, bool)> = match kind {
        ResumeKind::Next => {
            let mut borrowed = obj.borrow_mut();
            let ObjectData::Generator(state) = &mut borrowed.data else {
                unreachable!()
            };
            state.resume(arg, context)
        }
        // `.return(v)` (spec.md §4.5): completes the generator immediately
        // as `{value: v, done: true}` rather than resuming to the next
        // yield — this scoped model has no notion of a `finally` wrapping
        // a resumable yield point to run on the way out.
        ResumeKind::Return => {
            let mut borrowed = obj.borrow_mut();
            let ObjectData::Generator(state) = &mut borrowed.data else {
                unreachable!()
            };
            state.done = true;
            Ok((arg, true))
        }
        // `.throw(v)` (spec.md §4.5): same limitation in reverse — the
        // injected exception can't be delivered to a `catch` inside the
        // body, so it just aborts the generator and escapes as a throw.
        ResumeKind::Throw => {
            let mut borrowed = obj.borrow_mut();
            let ObjectData::Generator(state) = &mut borrowed.data else {
                unreachable!()
            };
            state.done = true;
            Err(JsError::from_value(arg))
        }
    };

    if is_async {
        let settled = match outcome {
            Ok((value, done)) => {
                let result = make_iter_result(value, done, context);
                crate::builtins::promise::settle_async_call(Ok(result), context)
            }
            Err(err) => crate::builtins::promise::settle_async_call(Err(err), context),
        };
        return Ok(JsValue::object(settled));
    }

    let (value, done) = outcome?;
    Ok(make_iter_result(value, done, context))
}

fn call_next(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    generator_resume(this, args.first().cloned().unwrap_or_else(JsValue::undefined), ResumeKind::Next, context)
}

fn call_return(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    generator_resume(this, args.first().cloned().unwrap_or_else(JsValue::undefined), ResumeKind::Return, context)
}

fn call_throw(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    generator_resume(this, args.first().cloned().unwrap_or_else(JsValue::undefined), ResumeKind::Throw, context)
}

fn self_iterator(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(this.clone())
}

/// Installs `next`/`return`/`throw` on both `%GeneratorPrototype%` and
/// `%AsyncGeneratorPrototype%` (spec.md §4.5): the same Rust functions
/// serve both, branching on the stored function's kind to decide whether
/// results need wrapping in a Promise.
pub fn init(context: &mut Context) {
    let gen_proto = context.intrinsics().generator_prototype();
    gen_proto.create_method("next", 1, call_next, context);
    gen_proto.create_method("return", 1, call_return, context);
    gen_proto.create_method("throw", 1, call_throw, context);
    let iterator_key = context.well_known_symbols().iterator.clone();
    gen_proto.create_data_property(iterator_key, JsObject::native_function(Some("[Symbol.iterator]".into()), 0, self_iterator, context), Attribute::builtin());

    let async_gen_proto = context.intrinsics().async_generator_prototype();
    async_gen_proto.create_method("next", 1, call_next, context);
    async_gen_proto.create_method("return", 1, call_return, context);
    async_gen_proto.create_method("throw", 1, call_throw, context);
    let async_iterator_key = context.well_known_symbols().async_iterator.clone();
    async_gen_proto.create_data_property(
        async_iterator_key,
        JsObject::native_function(Some("[Symbol.asyncIterator]".into()), 0, self_iterator, context),
        Attribute::builtin(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Function, Identifier, Span};

    fn make_generator_function(body: Vec<Statement>, kind: FunctionKind, context: &mut Context) -> JsObject {
        let source = Function {
            name: Some(Identifier::new("g", Span::default())),
            params: Vec::new(),
            body,
            kind,
            strict: false,
            span: Span::default(),
        };
        let env = context.global_environment();
        super::super::function::instantiate_function_object(&source, env, context)
    }

    fn yield_stmt(n: f64) -> Statement {
        Statement::Expression(Expression::Yield {
            argument: Some(Box::new(Expression::Literal(crate::ast::Literal::Number(n), Span::default()))),
            delegate: false,
            span: Span::default(),
        })
    }

    #[test]
    fn sequential_yields_resume_in_order() {
        let mut context = Context::default();
        let body = vec![yield_stmt(1.0), yield_stmt(2.0)];
        let func = make_generator_function(body, FunctionKind::Generator, &mut context);
        let gen = func.call(&JsValue::undefined(), &[], &mut context).unwrap();
        let gen_obj = gen.as_object().unwrap();

        let next = gen_obj.get("next", &mut context).unwrap();
        let next = next.as_object().unwrap();

        let first = next.call(&gen, &[], &mut context).unwrap();
        let first_obj = first.as_object().unwrap();
        assert_eq!(first_obj.get("value", &mut context).unwrap().to_number(&mut context).unwrap(), 1.0);
        assert!(!first_obj.get("done", &mut context).unwrap().to_boolean());

        let second = next.call(&gen, &[], &mut context).unwrap();
        let second_obj = second.as_object().unwrap();
        assert_eq!(second_obj.get("value", &mut context).unwrap().to_number(&mut context).unwrap(), 2.0);
        assert!(!second_obj.get("done", &mut context).unwrap().to_boolean());

        let third = next.call(&gen, &[], &mut context).unwrap();
        let third_obj = third.as_object().unwrap();
        assert!(third_obj.get("done", &mut context).unwrap().to_boolean());
    }

    #[test]
    fn bound_yield_receives_the_value_passed_to_next() {
        use crate::ast::{BindingPattern, DeclarationKind, VariableDeclaration, VariableDeclarator};

        let bind_yield = Statement::VariableDeclaration(VariableDeclaration {
            kind: DeclarationKind::Let,
            span: Span::default(),
            declarations: vec![VariableDeclarator {
                pattern: BindingPattern::Identifier(Identifier::new("v", Span::default())),
                init: Some(Expression::Yield {
                    argument: Some(Box::new(Expression::Literal(crate::ast::Literal::Number(0.0), Span::default()))),
                    delegate: false,
                    span: Span::default(),
                }),
            }],
        });
        let return_v = Statement::Return {
            argument: Some(Expression::Identifier(Identifier::new("v", Span::default()))),
            span: Span::default(),
        };

        let mut context = Context::default();
        let func = make_generator_function(vec![bind_yield, return_v], FunctionKind::Generator, &mut context);
        let gen = func.call(&JsValue::undefined(), &[], &mut context).unwrap();
        let gen_obj = gen.as_object().unwrap();
        let next = gen_obj.get("next", &mut context).unwrap();
        let next = next.as_object().unwrap();

        let first = next.call(&gen, &[], &mut context).unwrap();
        assert!(!first.as_object().unwrap().get("done", &mut context).unwrap().to_boolean());

        let second = next.call(&gen, &[JsValue::from(9.0)], &mut context).unwrap();
        let second_obj = second.as_object().unwrap();
        assert_eq!(second_obj.get("value", &mut context).unwrap().to_number(&mut context).unwrap(), 9.0);
        assert!(second_obj.get("done", &mut context).unwrap().to_boolean());
    }

    #[test]
    fn yield_star_delegates_every_element_of_an_array() {
        let delegate = Statement::Expression(Expression::Yield {
            argument: Some(Box::new(Expression::ArrayLiteral(
                vec![
                    Some(crate::ast::Argument::Expression(Expression::Literal(
                        crate::ast::Literal::Number(10.0),
                        Span::default(),
                    ))),
                    Some(crate::ast::Argument::Expression(Expression::Literal(
                        crate::ast::Literal::Number(20.0),
                        Span::default(),
                    ))),
                ],
                Span::default(),
            ))),
            delegate: true,
            span: Span::default(),
        });

        let mut context = Context::default();
        let func = make_generator_function(vec![delegate], FunctionKind::Generator, &mut context);
        let gen = func.call(&JsValue::undefined(), &[], &mut context).unwrap();
        let gen_obj = gen.as_object().unwrap();
        let next = gen_obj.get("next", &mut context).unwrap();
        let next = next.as_object().unwrap();

        let first = next.call(&gen, &[], &mut context).unwrap();
        let first_obj = first.as_object().unwrap();
        assert_eq!(first_obj.get("value", &mut context).unwrap().to_number(&mut context).unwrap(), 10.0);
        assert!(!first_obj.get("done", &mut context).unwrap().to_boolean());

        let second = next.call(&gen, &[], &mut context).unwrap();
        let second_obj = second.as_object().unwrap();
        assert_eq!(second_obj.get("value", &mut context).unwrap().to_number(&mut context).unwrap(), 20.0);
        assert!(!second_obj.get("done", &mut context).unwrap().to_boolean());

        let third = next.call(&gen, &[], &mut context).unwrap();
        assert!(third.as_object().unwrap().get("done", &mut context).unwrap().to_boolean());
    }

    #[test]
    fn return_call_ends_the_generator_immediately() {
        let mut context = Context::default();
        let body = vec![yield_stmt(1.0), yield_stmt(2.0)];
        let func = make_generator_function(body, FunctionKind::Generator, &mut context);
        let gen = func.call(&JsValue::undefined(), &[], &mut context).unwrap();
        let gen_obj = gen.as_object().unwrap();
        let ret = gen_obj.get("return", &mut context).unwrap();
        let ret = ret.as_object().unwrap();

        let result = ret.call(&gen, &[JsValue::from(42.0)], &mut context).unwrap();
        let result_obj = result.as_object().unwrap();
        assert_eq!(result_obj.get("value", &mut context).unwrap().to_number(&mut context).unwrap(), 42.0);
        assert!(result_obj.get("done", &mut context).unwrap().to_boolean());

        let next = gen_obj.get("next", &mut context).unwrap();
        let next = next.as_object().unwrap();
        let after = next.call(&gen, &[], &mut context).unwrap();
        assert!(after.as_object().unwrap().get("done", &mut context).unwrap().to_boolean());
    }
}
