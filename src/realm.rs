//! A realm: the global object, the global environment, and the set of
//! intrinsic objects every other object in the realm ultimately chains up
//! to (spec.md §4.9 "Realm").

use crate::{
    environment::Environment,
    object::{JsObject, ObjectData},
};
use gc::{Finalize, Trace};
use rustc_hash::FxHashMap;

/// The fixed set of built-in prototypes and constructors a realm creates
/// up front (spec.md's "well-known intrinsic objects", `%Object.prototype%`
/// and friends). Named accessors cover the handful every internal
/// algorithm needs by name; everything else (one prototype per error
/// subtype, per-iterable-kind iterator prototypes, ...) lives in the
/// `extra` table, keyed by the same `%Name%` spelling the spec uses.
#[derive(Trace, Finalize)]
pub struct Intrinsics {
    object_prototype: JsObject,
    function_prototype: JsObject,
    array_prototype: JsObject,
    string_prototype: JsObject,
    number_prototype: JsObject,
    boolean_prototype: JsObject,
    symbol_prototype: JsObject,
    bigint_prototype: JsObject,
    error_prototype: JsObject,
    generator_prototype: JsObject,
    async_generator_prototype: JsObject,
    iterator_prototype: JsObject,
    extra: FxHashMap<Box<str>, JsObject>,
}

impl Intrinsics {
    /// Bootstraps the prototype chain's root: `%Object.prototype%` has no
    /// prototype, and every other intrinsic prototype chains to it
    /// (directly, for most; `%Function.prototype%` too, since a function
    /// is also an object).
    fn new() -> Self {
        let object_prototype = JsObject::from_data(ObjectData::Ordinary, None);
        let mk = || JsObject::from_data(ObjectData::Ordinary, Some(object_prototype.clone()));
        Self {
            function_prototype: mk(),
            array_prototype: mk(),
            string_prototype: mk(),
            number_prototype: mk(),
            boolean_prototype: mk(),
            symbol_prototype: mk(),
            bigint_prototype: mk(),
            error_prototype: mk(),
            generator_prototype: mk(),
            async_generator_prototype: mk(),
            iterator_prototype: mk(),
            object_prototype,
            extra: FxHashMap::default(),
        }
    }

    pub fn object_prototype(&self) -> JsObject {
        self.object_prototype.clone()
    }
    pub fn function_prototype(&self) -> JsObject {
        self.function_prototype.clone()
    }
    pub fn array_prototype(&self) -> JsObject {
        self.array_prototype.clone()
    }
    pub fn string_prototype(&self) -> JsObject {
        self.string_prototype.clone()
    }
    pub fn number_prototype(&self) -> JsObject {
        self.number_prototype.clone()
    }
    pub fn boolean_prototype(&self) -> JsObject {
        self.boolean_prototype.clone()
    }
    pub fn symbol_prototype(&self) -> JsObject {
        self.symbol_prototype.clone()
    }
    pub fn bigint_prototype(&self) -> JsObject {
        self.bigint_prototype.clone()
    }
    pub fn error_prototype(&self) -> JsObject {
        self.error_prototype.clone()
    }
    pub fn generator_prototype(&self) -> JsObject {
        self.generator_prototype.clone()
    }
    pub fn async_generator_prototype(&self) -> JsObject {
        self.async_generator_prototype.clone()
    }
    pub fn iterator_prototype(&self) -> JsObject {
        self.iterator_prototype.clone()
    }

    pub fn get(&self, name: &str) -> Option<JsObject> {
        self.extra.get(name).cloned()
    }

    pub fn insert(&mut self, name: impl Into<Box<str>>, object: JsObject) {
        self.extra.insert(name.into(), object);
    }
}

/// A Realm Record (spec.md §4.9): the global object, the global lexical
/// environment wrapping it, and the realm's intrinsics.
#[derive(Trace, Finalize)]
pub struct Realm {
    pub global_object: JsObject,
    pub global_env: Environment,
    pub intrinsics: Intrinsics,
}

impl Realm {
    pub fn create() -> Self {
        let intrinsics = Intrinsics::new();
        let global_object = JsObject::from_data(ObjectData::Global, Some(intrinsics.object_prototype()));
        let global_env = Environment::new_global(global_object.clone());
        Self {
            global_object,
            global_env,
            intrinsics,
        }
    }
}
