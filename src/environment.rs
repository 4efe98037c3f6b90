//! Environment records and the lexical environment chain (spec.md §4.4).
//!
//! Every kind from the spec is represented as one variant of
//! [`EnvironmentRecord`], reached through the cheap-to-clone [`Environment`]
//! handle. Unlike the historical implementation this is adapted from, a
//! binding error (double declaration, use of an uninitialized binding,
//! assignment to a missing/immutable binding) is a `JsResult` `TypeError`/
//! `ReferenceError`, never a panic.

use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::JsObject,
    value::JsValue,
};
use gc::{Finalize, Gc, GcCell, Trace};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Trace, Finalize)]
struct Binding {
    value: Option<JsValue>,
    mutable: bool,
    deletable: bool,
    strict: bool,
}

/// A declarative Environment Record: the scope introduced by a block,
/// function body, `catch` clause, or the top of a script/module.
#[derive(Debug, Trace, Finalize, Default)]
pub struct DeclarativeRecord {
    bindings: FxHashMap<Box<str>, Binding>,
}

/// An object Environment Record: wraps an object (the global object for
/// `with`, or the global object itself) so property lookups double as
/// binding lookups (spec.md §4.4).
#[derive(Trace, Finalize)]
pub struct ObjectRecord {
    pub bindings_object: JsObject,
    pub with_environment: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Trace, Finalize)]
pub enum ThisBindingStatus {
    Lexical,
    Initialized,
    Uninitialized,
}

/// A function Environment Record: a declarative record plus the
/// function's own `this`/`new.target`/`super` bindings (spec.md §4.4).
#[derive(Trace, Finalize)]
pub struct FunctionRecord {
    pub declarative: DeclarativeRecord,
    pub this_value: Option<JsValue>,
    pub this_status: ThisBindingStatus,
    pub function_object: JsObject,
    pub new_target: JsValue,
    pub home_object: Option<JsObject>,
}

/// The global Environment Record: a declarative record for `let`/`const`/
/// class at top level, plus an object record wrapping `globalThis` for
/// `var`/function declarations (spec.md §4.4).
#[derive(Trace, Finalize)]
pub struct GlobalRecord {
    pub object_record: ObjectRecord,
    pub declarative_record: DeclarativeRecord,
    pub var_names: Vec<Box<str>>,
}

#[derive(Trace, Finalize)]
pub enum EnvironmentRecord {
    Declarative(DeclarativeRecord),
    Object(ObjectRecord),
    Function(FunctionRecord),
    Global(GlobalRecord),
    /// A module's top-level environment: declarative, plus the set of
    /// names this module imports (resolved indirectly through the module
    /// namespace rather than a local binding).
    Module(DeclarativeRecord),
}

/// A handle into the environment chain. Cloning is a refcount bump.
#[derive(Clone, Trace, Finalize)]
pub struct Environment(Gc<GcCell<EnvironmentInnerTraced>>);

#[derive(Trace, Finalize)]
struct EnvironmentInnerTraced {
    record: EnvironmentRecord,
    outer: Option<Environment>,
}

pub(crate) fn already_declared(name: &str) -> crate::error::JsError {
    JsNativeError::typ()
        .with_message(format!("{} has already been declared", name))
        .into()
}

fn not_defined(name: &str) -> crate::error::JsError {
    JsNativeError::reference()
        .with_message(format!("{} is not defined", name))
        .into()
}

fn assign_to_const(name: &str) -> crate::error::JsError {
    JsNativeError::typ()
        .with_message(format!("Assignment to constant variable '{}'", name))
        .into()
}

impl Environment {
    fn new(record: EnvironmentRecord, outer: Option<Environment>) -> Self {
        Self(Gc::new(GcCell::new(EnvironmentInnerTraced { record, outer })))
    }

    pub fn new_declarative(outer: Option<Environment>) -> Self {
        Self::new(EnvironmentRecord::Declarative(DeclarativeRecord::default()), outer)
    }

    pub fn new_module(outer: Option<Environment>) -> Self {
        Self::new(EnvironmentRecord::Module(DeclarativeRecord::default()), outer)
    }

    pub fn new_object(bindings_object: JsObject, with_environment: bool, outer: Option<Environment>) -> Self {
        Self::new(
            EnvironmentRecord::Object(ObjectRecord {
                bindings_object,
                with_environment,
            }),
            outer,
        )
    }

    pub fn new_function(
        function_object: JsObject,
        this_value: Option<JsValue>,
        this_status: ThisBindingStatus,
        new_target: JsValue,
        home_object: Option<JsObject>,
        outer: Option<Environment>,
    ) -> Self {
        Self::new(
            EnvironmentRecord::Function(FunctionRecord {
                declarative: DeclarativeRecord::default(),
                this_value,
                this_status,
                function_object,
                new_target,
                home_object,
            }),
            outer,
        )
    }

    pub fn new_global(global_object: JsObject) -> Self {
        Self::new(
            EnvironmentRecord::Global(GlobalRecord {
                object_record: ObjectRecord {
                    bindings_object: global_object,
                    with_environment: false,
                },
                declarative_record: DeclarativeRecord::default(),
                var_names: Vec::new(),
            }),
            None,
        )
    }

    pub fn outer(&self) -> Option<Environment> {
        self.0.borrow().outer.clone()
    }

    pub fn has_binding(&self, name: &str, context: &mut Context) -> JsResult<bool> {
        let inner = self.0.borrow();
        match &inner.record {
            EnvironmentRecord::Declarative(d) | EnvironmentRecord::Module(d) => Ok(d.bindings.contains_key(name)),
            EnvironmentRecord::Function(f) => Ok(f.declarative.bindings.contains_key(name)),
            EnvironmentRecord::Object(o) => o.bindings_object.has_property(&name.into(), context),
            EnvironmentRecord::Global(g) => {
                if g.declarative_record.bindings.contains_key(name) {
                    return Ok(true);
                }
                g.object_record.bindings_object.has_property(&name.into(), context)
            }
        }
    }

    pub fn create_mutable_binding(&self, name: &str, deletable: bool) -> JsResult<()> {
        let mut inner = self.0.borrow_mut();
        let record = declarative_mut(&mut inner.record);
        if let Some(d) = record {
            if d.bindings.contains_key(name) {
                return Err(already_declared(name));
            }
            d.bindings.insert(
                name.into(),
                Binding {
                    value: None,
                    mutable: true,
                    deletable,
                    strict: false,
                },
            );
            return Ok(());
        }
        drop(inner);
        self.create_global_var_like(name, deletable)
    }

    pub fn create_immutable_binding(&self, name: &str, strict: bool) -> JsResult<()> {
        let mut inner = self.0.borrow_mut();
        let record = declarative_mut(&mut inner.record).ok_or_else(|| already_declared(name))?;
        if record.bindings.contains_key(name) {
            return Err(already_declared(name));
        }
        record.bindings.insert(
            name.into(),
            Binding {
                value: None,
                mutable: false,
                deletable: false,
                strict,
            },
        );
        Ok(())
    }

    fn create_global_var_like(&self, name: &str, _deletable: bool) -> JsResult<()> {
        let inner = self.0.borrow();
        if let EnvironmentRecord::Global(g) = &inner.record {
            let obj = g.object_record.bindings_object.clone();
            drop(inner);
            if obj.get_own_property(&name.into()).is_none() {
                obj.create_data_property(name, JsValue::undefined(), crate::property::Attribute::all());
            }
            return Ok(());
        }
        Ok(())
    }

    pub fn initialize_binding(&self, name: &str, value: JsValue, context: &mut Context) -> JsResult<()> {
        let mut inner = self.0.borrow_mut();
        if let Some(d) = declarative_mut(&mut inner.record) {
            if let Some(binding) = d.bindings.get_mut(name) {
                binding.value = Some(value);
                return Ok(());
            }
        }
        if let EnvironmentRecord::Object(o) | EnvironmentRecord::Global(GlobalRecord { object_record: o, .. }) = &inner.record {
            let obj = o.bindings_object.clone();
            drop(inner);
            obj.set(name, value, true, context)?;
            return Ok(());
        }
        Ok(())
    }

    pub fn set_mutable_binding(&self, name: &str, value: JsValue, strict: bool, context: &mut Context) -> JsResult<()> {
        {
            let mut inner = self.0.borrow_mut();
            if let Some(d) = declarative_mut(&mut inner.record) {
                match d.bindings.get_mut(name) {
                    Some(binding) => {
                        let effective_strict = strict || binding.strict;
                        if binding.value.is_none() {
                            return Err(not_defined(name));
                        }
                        if binding.mutable {
                            binding.value = Some(value);
                        } else if effective_strict {
                            return Err(assign_to_const(name));
                        }
                        return Ok(());
                    }
                    None => {
                        if !matches!(inner.record, EnvironmentRecord::Global(_)) {
                            if strict {
                                return Err(not_defined(name));
                            }
                        }
                    }
                }
            }
        }

        let obj = {
            let inner = self.0.borrow();
            match &inner.record {
                EnvironmentRecord::Object(o) => Some(o.bindings_object.clone()),
                EnvironmentRecord::Global(g) => Some(g.object_record.bindings_object.clone()),
                _ => None,
            }
        };
        if let Some(obj) = obj {
            if !obj.has_property(&name.into(), context)? {
                if strict {
                    return Err(not_defined(name));
                }
                obj.set(name, value, false, context)?;
                return Ok(());
            }
            obj.set(name, value, strict, context)?;
            return Ok(());
        }
        if strict {
            return Err(not_defined(name));
        }
        Ok(())
    }

    pub fn get_binding_value(&self, name: &str, strict: bool, context: &mut Context) -> JsResult<JsValue> {
        let inner = self.0.borrow();
        if let EnvironmentRecord::Declarative(d) | EnvironmentRecord::Module(d) = &inner.record {
            return lookup_declarative(d, name);
        }
        if let EnvironmentRecord::Function(f) = &inner.record {
            return lookup_declarative(&f.declarative, name);
        }
        match &inner.record {
            EnvironmentRecord::Object(o) => {
                let obj = o.bindings_object.clone();
                drop(inner);
                if !obj.has_property(&name.into(), context)? {
                    if strict {
                        return Err(not_defined(name));
                    }
                    return Ok(JsValue::undefined());
                }
                obj.get(name, context)
            }
            EnvironmentRecord::Global(g) => {
                if let Some(binding) = g.declarative_record.bindings.get(name) {
                    return binding.value.clone().ok_or_else(|| not_defined(name));
                }
                let obj = g.object_record.bindings_object.clone();
                drop(inner);
                if !obj.has_property(&name.into(), context)? {
                    return Err(not_defined(name));
                }
                obj.get(name, context)
            }
            _ => unreachable!(),
        }
    }

    pub fn delete_binding(&self, name: &str) -> bool {
        let mut inner = self.0.borrow_mut();
        if let Some(d) = declarative_mut(&mut inner.record) {
            match d.bindings.get(name) {
                Some(b) if b.deletable => {
                    d.bindings.remove(name);
                    true
                }
                Some(_) => false,
                None => true,
            }
        } else {
            false
        }
    }

    pub fn has_this_binding(&self) -> bool {
        match &self.0.borrow().record {
            EnvironmentRecord::Function(f) => !matches!(f.this_status, ThisBindingStatus::Lexical),
            EnvironmentRecord::Global(_) => true,
            _ => false,
        }
    }

    /// `GetThisEnvironment` + `ResolveThisBinding` combined: walks outward
    /// until a `this`-binding environment is found (spec.md §4.4).
    pub fn get_this_binding(&self, _context: &mut Context) -> JsResult<JsValue> {
        let mut env = self.clone();
        loop {
            if env.has_this_binding() {
                let inner = env.0.borrow();
                return match &inner.record {
                    EnvironmentRecord::Function(f) => f.this_value.clone().ok_or_else(|| {
                        JsNativeError::reference()
                            .with_message("must call super before accessing 'this'")
                            .into()
                    }),
                    EnvironmentRecord::Global(g) => Ok(JsValue::object(g.object_record.bindings_object.clone())),
                    _ => unreachable!(),
                };
            }
            let outer = env.outer();
            drop(env);
            match outer {
                Some(o) => env = o,
                None => return Ok(JsValue::undefined()),
            }
        }
    }

    /// Walks outward for the nearest function Environment Record's
    /// `new.target`, stopping at the first one found (arrows have none of
    /// their own, so `new.target` inside an arrow reads the enclosing
    /// function's).
    pub fn new_target(&self) -> JsValue {
        let mut env = self.clone();
        loop {
            if let EnvironmentRecord::Function(f) = &env.0.borrow().record {
                return f.new_target.clone();
            }
            let outer = env.outer();
            match outer {
                Some(o) => env = o,
                None => return JsValue::undefined(),
            }
        }
    }

    /// Walks outward for the nearest function Environment Record's
    /// `[[FunctionObject]]`; used by `super(...)` to find the constructor
    /// whose `[[Prototype]]` is the superclass constructor.
    pub fn nearest_function_object(&self) -> Option<JsObject> {
        let mut env = self.clone();
        loop {
            if let EnvironmentRecord::Function(f) = &env.0.borrow().record {
                return Some(f.function_object.clone());
            }
            let outer = env.outer();
            match outer {
                Some(o) => env = o,
                None => return None,
            }
        }
    }

    /// Walks outward for the nearest function Environment Record's
    /// `[[HomeObject]]`; used by `super.prop` property lookups.
    pub fn nearest_home_object(&self) -> Option<JsObject> {
        let mut env = self.clone();
        loop {
            if let EnvironmentRecord::Function(f) = &env.0.borrow().record {
                return f.home_object.clone();
            }
            let outer = env.outer();
            match outer {
                Some(o) => env = o,
                None => return None,
            }
        }
    }

    pub fn can_declare_global_var(&self, name: &str, context: &mut Context) -> JsResult<bool> {
        let inner = self.0.borrow();
        let EnvironmentRecord::Global(g) = &inner.record else {
            return Ok(true);
        };
        let obj = g.object_record.bindings_object.clone();
        drop(inner);
        if obj.has_property(&name.into(), context)? {
            return Ok(true);
        }
        Ok(obj.is_extensible())
    }

    pub fn can_declare_global_function(&self, name: &str) -> bool {
        let inner = self.0.borrow();
        let EnvironmentRecord::Global(g) = &inner.record else {
            return true;
        };
        match g.object_record.bindings_object.get_own_property(&name.into()) {
            None => g.object_record.bindings_object.is_extensible(),
            Some(desc) => desc.configurable() || (desc.enumerable() && desc.writable().unwrap_or(false)),
        }
    }

    pub fn has_restricted_global_property(&self, name: &str) -> bool {
        let inner = self.0.borrow();
        let EnvironmentRecord::Global(g) = &inner.record else {
            return false;
        };
        match g.object_record.bindings_object.get_own_property(&name.into()) {
            Some(desc) => !desc.configurable(),
            None => false,
        }
    }

    pub fn create_global_var_binding(&self, name: &str, deletable: bool, context: &mut Context) -> JsResult<()> {
        let inner = self.0.borrow();
        let EnvironmentRecord::Global(g) = &inner.record else {
            drop(inner);
            return self.create_mutable_binding(name, deletable);
        };
        let obj = g.object_record.bindings_object.clone();
        drop(inner);
        let has_property = obj.has_property(&name.into(), context)?;
        let extensible = obj.is_extensible();
        if !has_property && extensible {
            obj.create_data_property(name, JsValue::undefined(), crate::property::Attribute::all());
        }
        Ok(())
    }

    pub fn create_global_function_binding(
        &self,
        name: &str,
        value: JsValue,
        deletable: bool,
        context: &mut Context,
    ) -> JsResult<()> {
        let inner = self.0.borrow();
        let EnvironmentRecord::Global(g) = &inner.record else {
            drop(inner);
            self.create_mutable_binding(name, deletable)?;
            return self.initialize_binding(name, value, context);
        };
        let obj = g.object_record.bindings_object.clone();
        drop(inner);
        let mut attrs = crate::property::Attribute::default();
        attrs.set_writable(true);
        attrs.set_enumerable(true);
        attrs.set_configurable(deletable);
        obj.create_data_property(name, value, attrs);
        Ok(())
    }
}

fn declarative_mut(record: &mut EnvironmentRecord) -> Option<&mut DeclarativeRecord> {
    match record {
        EnvironmentRecord::Declarative(d) | EnvironmentRecord::Module(d) => Some(d),
        EnvironmentRecord::Function(f) => Some(&mut f.declarative),
        _ => None,
    }
}

fn lookup_declarative(d: &DeclarativeRecord, name: &str) -> JsResult<JsValue> {
    match d.bindings.get(name) {
        Some(binding) => binding.value.clone().ok_or_else(|| {
            JsNativeError::reference()
                .with_message(format!("Cannot access '{}' before initialization", name))
                .into()
        }),
        None => Err(not_defined(name)),
    }
}
