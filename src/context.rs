//! The embedding-facing facade (spec.md §4.9 L9): owns a realm, drives
//! script/module evaluation, and exposes the value/object construction
//! helpers every other layer needs a `&mut Context` for.

use crate::{
    ast::Program,
    environment::Environment,
    error::{EngineOutcome, JsError, JsNativeError, JsResult},
    exec,
    object::{JsObject, ObjectData},
    property::PropertyKey,
    quota::{QuotaLimits, QuotaTracker},
    realm::{Intrinsics, Realm},
    string::JsString,
    symbol::{JsSymbol, WellKnownSymbols},
    value::{JsBigInt, JsValue, PreferredType},
};
use std::collections::VecDeque;

/// Embedding-tunable knobs (spec.md §4.9's "Options"): every field has a
/// permissive default so `Options::default()` behaves like a context
/// constructed with no special configuration.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub quota: QuotaLimits,
    pub strict: bool,
    /// Mirrors Jint's `AllowClr`/interop switches (spec.md §6): off by
    /// default, since granting host reflection access is a capability
    /// decision the embedder must opt into explicitly.
    pub allow_host_reflection: bool,
    /// `interop.allowGetType`/`interop.allowSystemReflection` (spec.md §4.9).
    pub interop: crate::interop::InteropOptions,
}

#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quota(mut self, quota: QuotaLimits) -> Self {
        self.options.quota = quota;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn allow_host_reflection(mut self, allow: bool) -> Self {
        self.options.allow_host_reflection = allow;
        self
    }

    pub fn interop(mut self, interop: crate::interop::InteropOptions) -> Self {
        self.options.interop = interop;
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

/// A pending microtask: a promise reaction job or module evaluation
/// continuation (spec.md's Job Queue, simplified to FIFO since this
/// engine is single-threaded and synchronous between `run_jobs` calls).
pub struct Job(pub Box<dyn FnOnce(&mut Context)>);

/// Per-label counters/timers backing `console.count`/`console.time`
/// (spec.md §4.3's `console` supplement). Kept on `Context` rather than
/// attached to the console object itself, since this engine has no
/// `InternalState`-style slot for arbitrary native object state.
#[cfg(feature = "console")]
#[derive(Debug, Default)]
pub struct ConsoleState {
    pub(crate) count_map: std::collections::HashMap<String, u32>,
    pub(crate) timer_map: std::collections::HashMap<String, u128>,
}

pub struct Context {
    realm: Realm,
    well_known_symbols: WellKnownSymbols,
    symbol_count: u64,
    options: Options,
    quota: QuotaTracker,
    jobs: VecDeque<Job>,
    modules: crate::module::ModuleRegistry,
    #[cfg(feature = "console")]
    console: ConsoleState,
}

impl Default for Context {
    fn default() -> Self {
        Self::with_options(Options::default())
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        let realm = Realm::create();
        let (well_known_symbols, symbol_count) = WellKnownSymbols::new();
        let quota = QuotaTracker::new(options.quota.clone());
        let mut context = Self {
            realm,
            well_known_symbols,
            symbol_count,
            options,
            quota,
            jobs: VecDeque::new(),
            modules: crate::module::ModuleRegistry::default(),
            #[cfg(feature = "console")]
            console: ConsoleState::default(),
        };
        crate::builtins::initialize(&mut context);
        context
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    pub fn realm_mut(&mut self) -> &mut Realm {
        &mut self.realm
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.realm.intrinsics
    }

    pub fn intrinsics_mut(&mut self) -> &mut Intrinsics {
        &mut self.realm.intrinsics
    }

    pub fn global_object(&self) -> JsObject {
        self.realm.global_object.clone()
    }

    pub fn global_environment(&self) -> Environment {
        self.realm.global_env.clone()
    }

    pub fn well_known_symbols(&self) -> &WellKnownSymbols {
        &self.well_known_symbols
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Registers the embedder's module resolver/loader (spec.md §4.6); no
    /// `import` statement resolves until one is set.
    pub fn set_module_loader(&mut self, loader: impl crate::module::ModuleLoader + 'static) {
        self.modules.set_loader(loader);
    }

    pub(crate) fn modules_mut(&mut self) -> &mut crate::module::ModuleRegistry {
        &mut self.modules
    }

    #[cfg(feature = "console")]
    pub(crate) fn console_mut(&mut self) -> &mut ConsoleState {
        &mut self.console
    }

    pub fn quota(&mut self) -> &mut QuotaTracker {
        &mut self.quota
    }

    pub fn new_symbol(&mut self, description: Option<JsString>) -> JsSymbol {
        let id = self.symbol_count;
        self.symbol_count += 1;
        JsSymbol::new(id, description)
    }

    pub fn enqueue_job(&mut self, job: impl FnOnce(&mut Context) + 'static) {
        self.jobs.push_back(Job(Box::new(job)));
    }

    /// Drains the microtask queue (spec.md's `RunJobs`): every job may
    /// itself enqueue more jobs (a `.then` chain), so this loops until
    /// empty rather than taking one pass.
    pub fn run_jobs(&mut self) {
        while let Some(job) = self.jobs.pop_front() {
            (job.0)(self);
        }
    }

    // -- primitive object wrappers (ToObject, spec.md §4.1) --------------

    pub fn new_boolean_object(&self, value: bool) -> JsObject {
        JsObject::from_data(ObjectData::Boolean(value), Some(self.intrinsics().boolean_prototype()))
    }
    pub fn new_number_object(&self, value: f64) -> JsObject {
        JsObject::from_data(ObjectData::Number(value), Some(self.intrinsics().number_prototype()))
    }
    pub fn new_string_object(&self, value: JsString) -> JsObject {
        let len = value.len();
        let obj = JsObject::from_data(ObjectData::String(value), Some(self.intrinsics().string_prototype()));
        let mut attrs = crate::property::Attribute::default();
        attrs.set_writable(false);
        obj.create_data_property(PropertyKey::from(JsString::from("length")), len as u32, attrs);
        obj
    }
    pub fn new_symbol_object(&self, value: JsSymbol) -> JsObject {
        JsObject::from_data(ObjectData::Symbol(value), Some(self.intrinsics().symbol_prototype()))
    }
    pub fn new_bigint_object(&self, value: JsBigInt) -> JsObject {
        JsObject::from_data(ObjectData::BigInt(value), Some(self.intrinsics().bigint_prototype()))
    }

    pub fn new_array(&self, items: Vec<JsValue>) -> JsObject {
        let array = JsObject::from_data(ObjectData::Array, Some(self.intrinsics().array_prototype()));
        for (i, item) in items.into_iter().enumerate() {
            array.create_data_property(i as u32, item, crate::property::Attribute::all());
        }
        let mut len_attrs = crate::property::Attribute::default();
        len_attrs.set_writable(true);
        array.create_data_property(
            PropertyKey::from(JsString::from("length")),
            array.own_property_keys().iter().filter_map(PropertyKey::as_array_index).count() as u32,
            len_attrs,
        );
        array
    }

    /// `OrdinaryCreateFromConstructor` (spec.md §4.2): reads `.prototype`
    /// off `constructor`, falling back to the supplied intrinsic if it
    /// isn't an object.
    pub fn get_prototype_from_constructor(
        &mut self,
        constructor: &JsObject,
        default: impl FnOnce(&Intrinsics) -> JsObject,
    ) -> JsResult<JsObject> {
        let proto = constructor.get(JsString::from("prototype"), self)?;
        Ok(proto.as_object().cloned().unwrap_or_else(|| default(self.intrinsics())))
    }

    /// `OrdinaryToPrimitive` (spec.md §4.3): tries `valueOf`/`toString` (or
    /// the reverse order) and returns the first primitive result.
    pub fn ordinary_to_primitive(&mut self, object: &JsObject, hint: PreferredType) -> JsResult<JsValue> {
        let methods: [&str; 2] = match hint {
            PreferredType::String => ["toString", "valueOf"],
            _ => ["valueOf", "toString"],
        };
        for name in methods {
            let method = object.get(JsString::from(name), self)?;
            if let Some(f) = method.as_object().filter(|o| o.is_callable()) {
                let result = f.call(&JsValue::object(object.clone()), &[], self)?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(JsNativeError::typ()
            .with_message("Cannot convert object to primitive value")
            .into())
    }

    pub fn call_ordinary_function(&mut self, function: &JsObject, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        exec::function::call_ordinary(function, this, args, self)
    }

    pub fn construct_ordinary_function(
        &mut self,
        function: &JsObject,
        args: &[JsValue],
        new_target: &JsObject,
    ) -> JsResult<JsValue> {
        exec::function::construct_ordinary(function, args, new_target, self)
    }

    /// Converts a `JsResult` error into the right `EngineOutcome` variant,
    /// telling a quota trip apart from an ordinary `throw` by checking
    /// whether the tracker recorded a fault while producing it (spec.md §5,
    /// §7 "Propagation policy"). Every top-level facade entry point
    /// (`eval_script`/`evaluate`/`invoke`) funnels its error through this
    /// after calling `quota().begin()`, so `QuotaExceeded` always surfaces
    /// as `Fatal` regardless of which abstract operation tripped it.
    fn finish<T>(&mut self, result: JsResult<T>) -> Result<T, EngineOutcome> {
        result.map_err(|err| match self.quota.take_fault() {
            Some(fault) => EngineOutcome::Fatal(fault.into()),
            None => EngineOutcome::Thrown(err),
        })
    }

    /// Parses nothing (surface syntax is out of scope, spec.md §1): runs
    /// an already-parsed [`Program`] as a classic script.
    pub fn eval_script(&mut self, program: &crate::ast::Script) -> Result<JsValue, EngineOutcome> {
        self.quota.begin();
        let env = self.global_environment();
        let outcome = exec::declaration::global_declaration_instantiation(program, &env, self)
            .and_then(|()| exec::statement::execute_statements(&program.statements, &env, self));
        let result = self.finish(outcome)?;
        self.run_jobs();
        Ok(result.value().unwrap_or_else(JsValue::undefined))
    }

    pub fn evaluate(&mut self, program: &Program) -> Result<JsValue, EngineOutcome> {
        match program {
            Program::Script(script) => self.eval_script(script),
            Program::Module(module) => {
                self.quota.begin();
                let outcome = crate::module::evaluate_root_module(module, self);
                let ns = self.finish(outcome)?;
                self.run_jobs();
                Ok(JsValue::object(ns))
            }
        }
    }

    /// `importModule` (spec.md §4.9): resolves `specifier` through the
    /// configured `ModuleLoader` and returns its namespace object, the same
    /// result shape `import *` produces, without the host having to drive a
    /// `Program::Module` through `evaluate`.
    pub fn import_module(&mut self, specifier: &str) -> Result<JsObject, EngineOutcome> {
        self.quota.begin();
        let outcome = crate::module::import_module(specifier, self);
        let ns = self.finish(outcome)?;
        self.run_jobs();
        Ok(ns)
    }

    /// `setValue`/`getValue` (spec.md §4.9): a host-facing global binding
    /// API, independent of running any script text. Creates a mutable
    /// global binding if `name` isn't already bound.
    pub fn set_value(&mut self, name: &str, value: JsValue) -> JsResult<()> {
        let env = self.global_environment();
        if env.has_binding(name, self)? {
            env.set_mutable_binding(name, value, false, self)
        } else {
            env.create_mutable_binding(name, true)?;
            env.initialize_binding(name, value, self)
        }
    }

    pub fn get_value(&mut self, name: &str) -> JsResult<JsValue> {
        let env = self.global_environment();
        env.get_binding_value(name, false, self)
    }

    /// `invoke` (spec.md §4.9): calls an already-held `JsValue` (a callback,
    /// an export) as its own quota-bounded top-level entry, the same way
    /// `eval_script`/`evaluate` are, for a host that isn't driving source
    /// text. `callable.call` already routes ordinary functions through
    /// `call_ordinary`'s own `enter_call`/`exit_call` pair, so this only
    /// needs the begin/fault-check wrapper, not its own depth bookkeeping.
    pub fn invoke(&mut self, callable: &JsValue, this_arg: &JsValue, args: &[JsValue]) -> Result<JsValue, EngineOutcome> {
        self.quota.begin();
        let Some(function) = callable.as_object().filter(|o| o.is_callable()).cloned() else {
            return self.finish(Err(JsNativeError::typ().with_message("value is not callable").into()));
        };
        let outcome = function.call(this_arg, args, self);
        let result = self.finish(outcome)?;
        self.run_jobs();
        Ok(result)
    }

    /// Attaches the realm's `%Error.prototype%` to a bare native error
    /// object built without a `Context` (see `JsNativeError::to_opaque_value`),
    /// so values that reach a JS `catch` binding support `instanceof Error`
    /// and `.toString()`. A no-op for anything that isn't one of these.
    pub fn realm_error(&self, err: JsError) -> JsValue {
        let value = err.into_value();
        if let Some(obj) = value.as_object() {
            if matches!(obj.borrow().data, ObjectData::Error) && obj.get_prototype_of().is_none() {
                obj.set_prototype_of(Some(self.intrinsics().error_prototype()));
            }
        }
        value
    }

    pub fn throw_type_error(&self, message: impl Into<String>) -> JsError {
        JsNativeError::typ().with_message(message).into()
    }

    pub fn throw_range_error(&self, message: impl Into<String>) -> JsError {
        JsNativeError::range().with_message(message).into()
    }

    pub fn throw_reference_error(&self, message: impl Into<String>) -> JsError {
        JsNativeError::reference().with_message(message).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{
            BindingPattern, DeclarationKind, Expression, Function as AstFunction, FunctionKind, Identifier, Literal,
            Span, Statement, VariableDeclaration, VariableDeclarator,
        },
        object::PromiseState,
        quota::QuotaLimits,
    };

    fn ident(name: &str) -> Identifier {
        Identifier::new(name, Span::default())
    }

    fn let_decl(name: &str) -> Statement {
        Statement::VariableDeclaration(VariableDeclaration {
            kind: DeclarationKind::Let,
            span: Span::default(),
            declarations: vec![VariableDeclarator {
                pattern: BindingPattern::Identifier(ident(name)),
                init: None,
            }],
        })
    }

    fn let_decl_with_init(name: &str, value: f64) -> Statement {
        Statement::VariableDeclaration(VariableDeclaration {
            kind: DeclarationKind::Let,
            span: Span::default(),
            declarations: vec![VariableDeclarator {
                pattern: BindingPattern::Identifier(ident(name)),
                init: Some(Expression::Literal(Literal::Number(value), Span::default())),
            }],
        })
    }

    #[test]
    fn set_value_and_get_value_round_trip_a_global_binding() {
        let mut context = Context::default();
        context.set_value("answer", JsValue::from(42.0)).unwrap();
        let value = context.get_value("answer").unwrap();
        assert_eq!(value.to_number(&mut context).unwrap(), 42.0);

        context.set_value("answer", JsValue::from(43.0)).unwrap();
        let value = context.get_value("answer").unwrap();
        assert_eq!(value.to_number(&mut context).unwrap(), 43.0);
    }

    #[test]
    fn invoke_calls_a_held_function_value() {
        let mut context = Context::default();
        let source = AstFunction {
            name: Some(ident("double")),
            params: Vec::new(),
            body: vec![Statement::Return {
                argument: Some(Expression::Literal(Literal::Number(7.0), Span::default())),
                span: Span::default(),
            }],
            kind: FunctionKind::Ordinary,
            strict: false,
            span: Span::default(),
        };
        let env = context.global_environment();
        let function = exec::function::instantiate_function_object(&source, env, &mut context);
        let result = context.invoke(&JsValue::object(function), &JsValue::undefined(), &[]).unwrap();
        assert_eq!(result.to_number(&mut context).unwrap(), 7.0);
    }

    #[test]
    fn invoke_rejects_a_non_callable_value() {
        let mut context = Context::default();
        let outcome = context.invoke(&JsValue::from(1.0), &JsValue::undefined(), &[]);
        assert!(matches!(outcome, Err(EngineOutcome::Thrown(_))));
    }

    #[test]
    fn duplicate_let_binding_throws_a_type_error_with_the_exact_message() {
        let mut context = Context::default();
        let script = crate::ast::Script {
            statements: vec![let_decl("x"), let_decl("x")],
            strict: false,
        };
        let Err(EngineOutcome::Thrown(err)) = context.eval_script(&script) else {
            panic!("expected a thrown error");
        };
        let obj = err.as_value().as_object().unwrap();
        let name = obj.get("name", &mut context).unwrap().to_js_string(&mut context).unwrap();
        let message = obj.get("message", &mut context).unwrap().to_js_string(&mut context).unwrap();
        assert_eq!(name.to_string_lossy(), "TypeError");
        assert_eq!(message.to_string_lossy(), "x has already been declared");
    }

    #[test]
    fn async_function_call_settles_a_promise_instead_of_returning_a_raw_value() {
        let mut context = Context::default();
        let source = AstFunction {
            name: Some(ident("f")),
            params: Vec::new(),
            body: vec![Statement::Return {
                argument: Some(Expression::Binary {
                    op: crate::ast::BinaryOp::Add,
                    left: Box::new(Expression::Literal(Literal::Number(1.0), Span::default())),
                    right: Box::new(Expression::Await {
                        argument: Box::new(Expression::Literal(Literal::Number(2.0), Span::default())),
                        span: Span::default(),
                    }),
                    span: Span::default(),
                }),
                span: Span::default(),
            }],
            kind: FunctionKind::Async,
            strict: false,
            span: Span::default(),
        };
        let env = context.global_environment();
        let function = exec::function::instantiate_function_object(&source, env, &mut context);
        let result = context.invoke(&JsValue::object(function), &JsValue::undefined(), &[]).unwrap();
        let promise = result.as_object().expect("async call returns a promise object");
        let borrowed = promise.borrow();
        let ObjectData::Promise(data) = &borrowed.data else {
            panic!("expected ObjectData::Promise");
        };
        assert_eq!(data.state, PromiseState::Fulfilled);
        drop(borrowed);
        let value = match &promise.borrow().data {
            ObjectData::Promise(data) => data.result.clone(),
            _ => unreachable!(),
        };
        assert_eq!(value.to_number(&mut context).unwrap(), 3.0);
    }

    #[test]
    fn quota_trip_surfaces_as_a_fatal_outcome() {
        // `QuotaTracker::tick_statement` only polls every `POLL_INTERVAL`
        // (256) statements, so the script needs to clear that many before a
        // low `max_statements` can actually be observed as exceeded.
        let options = Options {
            quota: QuotaLimits {
                max_statements: Some(10),
                ..QuotaLimits::default()
            },
            ..Options::default()
        };
        let mut context = Context::with_options(options);
        let noop = || Statement::Expression(Expression::Literal(Literal::Number(0.0), Span::default()));
        let script = crate::ast::Script {
            statements: (0..300).map(|_| noop()).collect(),
            strict: false,
        };
        let outcome = context.eval_script(&script);
        assert!(matches!(outcome, Err(EngineOutcome::Fatal(EngineError::QuotaExceeded(_)))));
    }

    #[test]
    fn quota_trip_skips_catch_but_still_runs_finally() {
        let assign = |name: &str| {
            Statement::Expression(Expression::Assignment {
                op: crate::ast::AssignOp::Assign,
                target: crate::ast::AssignmentTarget::Expression(Box::new(Expression::Identifier(ident(name)))),
                value: Box::new(Expression::Literal(Literal::Number(1.0), Span::default())),
                span: Span::default(),
            })
        };
        let noop = || Statement::Expression(Expression::Literal(Literal::Number(0.0), Span::default()));

        let options = Options {
            quota: QuotaLimits {
                max_statements: Some(10),
                ..QuotaLimits::default()
            },
            ..Options::default()
        };
        let mut context = Context::with_options(options);
        let script = crate::ast::Script {
            statements: vec![
                let_decl_with_init("caught", 0.0),
                let_decl_with_init("ranFinally", 0.0),
                Statement::Try {
                    block: (0..300).map(|_| noop()).collect(),
                    handler: Some(crate::ast::CatchClause { param: None, body: vec![assign("caught")] }),
                    finalizer: Some(vec![assign("ranFinally")]),
                    span: Span::default(),
                },
            ],
            strict: false,
        };
        let outcome = context.eval_script(&script);
        assert!(matches!(outcome, Err(EngineOutcome::Fatal(EngineError::QuotaExceeded(_)))));
        assert_eq!(context.get_value("caught").unwrap().to_number(&mut context).unwrap(), 0.0);
        assert_eq!(context.get_value("ranFinally").unwrap().to_number(&mut context).unwrap(), 1.0);
    }
}
