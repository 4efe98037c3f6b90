//! Function objects (spec.md §4.2, §5.4): the `Function` internal slot
//! bag distinguishing native (Rust) callables from ordinary (tree-walked)
//! ones, and the shared `[[Call]]`/`[[Construct]]` entry points.

use super::JsObject;
use crate::{
    ast::{Function as AstFunction, FunctionKind},
    context::Context,
    environment::Environment,
    error::{JsNativeError, JsResult},
    value::JsValue,
};
use gc::{custom_trace, Finalize, Trace};
use std::rc::Rc;

/// A Rust-native builtin. Takes `this`, the argument list, and the
/// context, same shape as an ordinary function call.
pub type NativeFunction = fn(&JsValue, &[JsValue], &mut Context) -> JsResult<JsValue>;

/// How `this` is bound inside the function body (spec.md §4.4): ordinary
/// functions get their own `this` binding; arrow functions close over the
/// enclosing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Trace, Finalize)]
pub enum ThisMode {
    Lexical,
    Strict,
    Global,
}

/// Holds an `Rc<AstFunction>` (plain AST data, no `Gc` pointers inside)
/// alongside the closed-over environment, so `Trace` is implemented by
/// hand rather than derived (see the same pattern in `string.rs`).
pub struct OrdinaryFunction {
    pub source: Rc<AstFunction>,
    pub closure: Environment,
    pub this_mode: ThisMode,
    pub home_object: Option<JsObject>,
    pub fields: Vec<(crate::property::PropertyKey, Option<crate::ast::Expression>)>,
}

impl Finalize for OrdinaryFunction {}
unsafe impl Trace for OrdinaryFunction {
    custom_trace!(this, {
        mark(&this.closure);
        mark(&this.home_object);
    });
}

#[derive(Trace, Finalize)]
pub enum FunctionObject {
    Native {
        #[unsafe_ignore_trace]
        function: NativeFunction,
        constructor: bool,
    },
    Ordinary(OrdinaryFunction),
    /// `Function.prototype.bind` result (spec.md L3 addition): wraps a
    /// target with a fixed `this` and a prefix of bound arguments.
    Bound {
        target: JsObject,
        bound_this: JsValue,
        bound_args: Vec<JsValue>,
    },
}

impl FunctionObject {
    pub fn is_constructor(&self) -> bool {
        match self {
            Self::Native { constructor, .. } => *constructor,
            Self::Ordinary(f) => !matches!(
                f.source.kind,
                FunctionKind::Arrow | FunctionKind::Generator | FunctionKind::Async | FunctionKind::AsyncGenerator
            ),
            Self::Bound { target, .. } => target.is_constructor(),
        }
    }

    pub fn kind(&self) -> Option<FunctionKind> {
        match self {
            Self::Ordinary(f) => Some(f.source.kind),
            _ => None,
        }
    }
}

pub fn new_native(
    name: Option<crate::string::JsString>,
    length: usize,
    native: NativeFunction,
    context: &Context,
) -> JsObject {
    let proto = context.intrinsics().function_prototype();
    let object = JsObject::from_data(
        super::ObjectData::Function(FunctionObject::Native {
            function: native,
            constructor: false,
        }),
        Some(proto),
    );
    install_length_and_name(&object, length, name.unwrap_or_default());
    object
}

fn install_length_and_name(object: &JsObject, length: usize, name: crate::string::JsString) {
    use crate::property::Attribute;
    object.create_data_property(
        crate::string::JsString::from("length"),
        length as u32,
        Attribute::builtin(),
    );
    object.create_data_property(crate::string::JsString::from("name"), name, Attribute::builtin());
}

pub fn call(object: &JsObject, this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let borrowed = object.borrow();
    let Some(func) = borrowed.as_function() else {
        return Err(JsNativeError::typ().with_message("value is not callable").into());
    };

    match func {
        FunctionObject::Native { function, .. } => {
            let f = *function;
            drop(borrowed);
            f(this, args, context)
        }
        FunctionObject::Ordinary(_) => {
            drop(borrowed);
            context.call_ordinary_function(object, this, args)
        }
        FunctionObject::Bound {
            target,
            bound_this,
            bound_args,
        } => {
            let target = target.clone();
            let bound_this = bound_this.clone();
            let mut full_args = bound_args.clone();
            full_args.extend_from_slice(args);
            drop(borrowed);
            target.call(&bound_this, &full_args, context)
        }
    }
}

pub fn construct(
    object: &JsObject,
    args: &[JsValue],
    new_target: &JsObject,
    context: &mut Context,
) -> JsResult<JsValue> {
    let borrowed = object.borrow();
    let Some(func) = borrowed.as_function() else {
        return Err(JsNativeError::typ().with_message("value is not a constructor").into());
    };
    if !func.is_constructor() {
        return Err(JsNativeError::typ()
            .with_message("value is not a constructor")
            .into());
    }

    match func {
        FunctionObject::Native { function, .. } => {
            let f = *function;
            drop(borrowed);
            let proto = context.get_prototype_from_constructor(new_target, |i| i.object_prototype())?;
            let this = JsValue::object(JsObject::ordinary(Some(proto)));
            f(&this, args, context)
        }
        FunctionObject::Ordinary(_) => {
            drop(borrowed);
            context.construct_ordinary_function(object, args, new_target)
        }
        FunctionObject::Bound { target, bound_args, .. } => {
            let target = target.clone();
            let mut full_args = bound_args.clone();
            full_args.extend_from_slice(args);
            drop(borrowed);
            target.construct(&full_args, new_target, context)
        }
    }
}
