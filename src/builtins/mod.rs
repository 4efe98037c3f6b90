//! Realm-scoped built-ins (spec.md §4.3 L3): `Object`, `Function`, `Array`,
//! `String`, `Number`, `Boolean`, `Math`, `Date`, `RegExp`, `JSON`, the
//! `Error` hierarchy, `Map`/`Set`/`WeakMap`/`WeakSet`, `Promise`, `Proxy`,
//! `Reflect`, `Symbol`, iterators, plus the non-standard `globalThis`
//! utilities (`console`, URI encode/decode, `parseInt`/`parseFloat`).
//!
//! Each submodule exposes an `init(context: &mut Context)` that builds its
//! constructor/prototype pair and installs the constructor as a global
//! property; [`initialize`] runs them all in dependency order (prototypes
//! before the constructors that reference them via `.prototype`).

pub mod array;
pub mod boolean;
pub mod date;
pub mod error;
pub mod function;
pub mod global;
pub mod json;
pub mod map;
pub mod math;
pub mod number;
pub mod object;
pub mod promise;
pub mod proxy;
pub mod reflect;
pub mod regexp;
pub mod set;
pub mod string;
pub mod symbol;
pub mod uri;
pub mod weak;

use crate::{
    context::Context,
    object::{FunctionObject, JsObject, NativeFunction, ObjectData},
    property::Attribute,
    string::JsString,
};

/// Builds a native function object flagged as a constructor (spec.md §4.3:
/// "a `[[Construct]]` iff applicable"), distinct from
/// `JsObject::native_function`, which never is one.
pub(crate) fn native_constructor(
    name: &str,
    length: usize,
    native: NativeFunction,
    context: &Context,
) -> JsObject {
    let proto = context.intrinsics().function_prototype();
    let object = JsObject::from_data(
        ObjectData::Function(FunctionObject::Native {
            function: native,
            constructor: true,
        }),
        Some(proto),
    );
    object.create_data_property(JsString::from("length"), length as u32, Attribute::builtin());
    object.create_data_property(JsString::from("name"), JsString::from(name), Attribute::builtin());
    object
}

/// Cross-links a constructor and its prototype object (`C.prototype = P`,
/// `P.constructor = C`), both non-enumerable per spec.md §4.3.
pub(crate) fn link_constructor(ctor: &JsObject, prototype: &JsObject) {
    let mut proto_attrs = Attribute::default();
    proto_attrs.set_writable(false);
    ctor.create_data_property(JsString::from("prototype"), prototype.clone(), proto_attrs);
    prototype.create_data_property(JsString::from("constructor"), ctor.clone(), Attribute::builtin());
}

/// Installs `ctor` as a global binding under `name` (spec.md's
/// `GlobalDeclarationInstantiation` initial state: constructors are plain
/// global-object data properties, writable/configurable, non-enumerable).
pub(crate) fn install_global(name: &str, ctor: JsObject, context: &mut Context) {
    context.global_object().create_data_property(JsString::from(name), ctor, Attribute::builtin());
}

pub fn initialize(context: &mut Context) {
    object::init(context);
    function::init(context);
    array::init(context);
    string::init(context);
    number::init(context);
    boolean::init(context);
    symbol::init(context);
    error::init(context);
    math::init(context);
    json::init(context);
    date::init(context);
    regexp::init(context);
    map::init(context);
    set::init(context);
    weak::init(context);
    promise::init(context);
    reflect::init(context);
    proxy::init(context);
    uri::init(context);
    global::init(context);
    crate::exec::generator::init(context);
}
