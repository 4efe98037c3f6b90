//! Host interop (spec.md §4.7, L7): lets JS code read, write, and call
//! members on values the embedding exposes from its own type system,
//! through an [`ObjectWrapper`] adapter rather than any concrete host
//! language binding. Wrapping is built on the same `Proxy` trap mechanism
//! `builtins::proxy` uses (`object::internal_methods`'s `get`/`set`/`has`
//! dispatch), rather than a new internal-slot kind: a wrapped host value is
//! a `Proxy` over an empty target whose handler's traps are native
//! functions closing over the wrapper, via the `FunctionObject::Bound`
//! technique `builtins::proxy::revocable` already uses to close over state
//! a bare `fn` pointer can't capture.

use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{FunctionObject, JsObject, NativeFunction, ObjectData},
    property::Attribute,
    value::JsValue,
};
use gc::{custom_trace, Finalize, Trace};
use std::{fmt, rc::Rc};

/// Opaque handle to a host type, returned by [`TypeResolver::resolve_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHandle(pub u64);

#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    pub name: String,
    pub is_method: bool,
}

/// `resolveType`/`listMembers`/`memberFilter` (spec.md §4.7): lets the host
/// expose a subset of its type system's members without the engine ever
/// knowing that type system's shape.
pub trait TypeResolver {
    fn resolve_type(&self, name: &str) -> Option<TypeHandle>;
    fn list_members(&self, type_handle: TypeHandle) -> Vec<MemberDescriptor>;
    fn member_filter(&self, member: &MemberDescriptor) -> bool {
        let _ = member;
        true
    }
}

/// Consulted before a wrapped object's own `TryGet` (spec.md §4.7):
/// `Ok(Some(_))` short-circuits the lookup, `Ok(None)` falls through.
pub trait MemberAccessor {
    fn get(&self, context: &mut Context, target: &dyn ObjectWrapper, name: &str) -> JsResult<Option<JsValue>>;
}

/// The adapter a host implements to expose one of its own values to JS
/// (spec.md §6's "Host interop contract"): `TryGet`/`TrySet`/`Keys`/
/// `Invoke`/`TypeHandle`. Method groups overloaded on the host side are
/// expected to present as a single callable from `invoke`, doing their own
/// arity-then-assignability resolution (spec.md §4.7) against `args`.
pub trait ObjectWrapper: fmt::Debug {
    fn try_get(&self, name: &str) -> JsResult<Option<JsValue>>;
    fn try_set(&self, name: &str, value: JsValue) -> JsResult<bool>;
    fn keys(&self) -> Vec<String>;
    fn invoke(&self, name: &str, args: &[JsValue], context: &mut Context) -> JsResult<JsValue>;
    fn type_handle(&self) -> Option<TypeHandle> {
        None
    }

    /// Host-provided dictionaries (spec.md §4.7) expose their entries as
    /// extra JS properties alongside structural methods; structural methods
    /// win on a name collision. `None` means this wrapper isn't
    /// dictionary-like and `try_get`/`keys` are the whole story.
    fn dictionary_get(&self, _key: &str) -> Option<JsValue> {
        None
    }
    fn dictionary_keys(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Interop-specific configuration (spec.md §4.7/§6): off by default, since
/// granting type-reflection or dictionary access is a capability the
/// embedder opts into per `Context`, mirroring `Options::allow_host_reflection`.
#[derive(Debug, Clone, Copy, Default)]
pub struct InteropOptions {
    pub allow_get_type: bool,
    pub allow_system_reflection: bool,
}

/// `"Cannot access System.Reflection namespace, check Engine's interop
/// options"` (spec.md §6): the exact message a reflection-sandbox trip
/// must raise.
const REFLECTION_FORBIDDEN_MESSAGE: &str = "Cannot access System.Reflection namespace, check Engine's interop options";

fn reflection_forbidden() -> crate::error::JsError {
    JsNativeError::error().with_message(REFLECTION_FORBIDDEN_MESSAGE).into()
}

/// `GetType` is gated by `interop.allowGetType`; `constructor`/`__proto__`
/// are the entry points into a host's reflection namespace that
/// `interop.allowSystemReflection` gates (spec.md §4.7/§6).
const GET_TYPE_ENTRY_POINT: &str = "GetType";
const REFLECTION_ENTRY_POINTS: &[&str] = &["constructor", "__proto__"];

/// Holds the `Rc<dyn ObjectWrapper>` a wrapped host object's Proxy traps
/// close over. Contains no `Gc`-traced pointers (the host value lives
/// outside this engine's heap), so tracing it is a no-op.
#[derive(Clone, Finalize)]
struct HostHandle(Rc<dyn ObjectWrapper>);

unsafe impl Trace for HostHandle {
    custom_trace!(this, {
        let _ = this;
    });
}

impl fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostHandle({:?})", self.0)
    }
}

fn bound_native(native: NativeFunction, bound_this: JsValue, context: &Context) -> JsObject {
    let target = JsObject::native_function(None, 0, native, context);
    JsObject::from_data(
        ObjectData::Function(FunctionObject::Bound {
            target,
            bound_this,
            bound_args: Vec::new(),
        }),
        Some(context.intrinsics().function_prototype()),
    )
}

fn handle_of(carrier: &JsValue) -> JsResult<Rc<dyn ObjectWrapper>> {
    let obj = carrier
        .as_object()
        .ok_or_else(|| JsNativeError::typ().with_message("interop: missing host handle"))?;
    let borrowed = obj.borrow();
    let ObjectData::Native(data) = &borrowed.data else {
        return Err(JsNativeError::typ().with_message("interop: missing host handle").into());
    };
    let handle = data
        .as_any()
        .downcast_ref::<HostHandle>()
        .ok_or_else(|| JsNativeError::typ().with_message("interop: missing host handle"))?;
    Ok(handle.0.clone())
}

fn key_name(key: JsValue, context: &mut Context) -> JsResult<String> {
    Ok(key.to_js_string(context)?.to_string_lossy())
}

fn trap_get(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let wrapper = handle_of(this)?;
    let name = key_name(args.get(1).cloned().unwrap_or_else(JsValue::undefined), context)?;
    get_member(this.clone(), &*wrapper, &name, context)
}

/// Structural members win over dictionary entries on a name collision
/// (spec.md §4.7). A name that resolves to neither a field/property
/// (`try_get`) nor a dictionary entry is assumed to name a method group and
/// comes back as a single callable that performs overload resolution on
/// `invoke` at call time, rather than `undefined`.
fn get_member(carrier: JsValue, wrapper: &dyn ObjectWrapper, name: &str, context: &mut Context) -> JsResult<JsValue> {
    if !is_reflection_allowed(context, name) {
        return Err(reflection_forbidden());
    }
    if let Some(value) = wrapper.try_get(name)? {
        return Ok(value);
    }
    if let Some(value) = wrapper.dictionary_get(name) {
        return Ok(value);
    }
    Ok(JsValue::object(method_thunk(carrier, name.to_string(), context)))
}

fn is_reflection_allowed(context: &Context, name: &str) -> bool {
    let interop = context.options().interop;
    if name == GET_TYPE_ENTRY_POINT {
        return interop.allow_get_type;
    }
    if REFLECTION_ENTRY_POINTS.contains(&name) {
        return interop.allow_system_reflection;
    }
    true
}

fn trap_set(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let wrapper = handle_of(this)?;
    let name = key_name(args.get(1).cloned().unwrap_or_else(JsValue::undefined), context)?;
    let value = args.get(2).cloned().unwrap_or_else(JsValue::undefined);
    Ok(JsValue::from(wrapper.try_set(&name, value)?))
}

fn trap_has(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let wrapper = handle_of(this)?;
    let name = key_name(args.get(1).cloned().unwrap_or_else(JsValue::undefined), context)?;
    let present = wrapper.keys().iter().any(|k| k == &name) || wrapper.try_get(&name)?.is_some();
    Ok(JsValue::from(present))
}

fn trap_own_keys(this: &JsValue, _args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let wrapper = handle_of(this)?;
    let mut names = wrapper.keys();
    names.extend(wrapper.dictionary_keys());
    names.sort();
    names.dedup();
    let items = names.into_iter().map(JsValue::string).collect();
    Ok(JsValue::object(context.new_array(items)))
}

/// Builds a method object whose calling it invokes `wrapper.invoke(name,
/// ..)`: the unified overload-resolution entry point a host's own member
/// group collapses into (spec.md §4.7).
fn method_thunk(wrapper_carrier: JsValue, name: String, context: &mut Context) -> JsObject {
    let bound_name = JsObject::ordinary(None);
    bound_name.create_data_property("__name", name.as_str(), Attribute::empty());
    bound_name.create_data_property("__handle", wrapper_carrier, Attribute::empty());
    bound_native(invoke_thunk, JsValue::object(bound_name), context)
}

fn invoke_thunk(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let carrier = this.as_object().cloned().ok_or_else(|| JsNativeError::typ().with_message("interop: invalid method"))?;
    let name = carrier
        .get("__name", context)?
        .to_js_string(context)?
        .to_string_lossy();
    let handle_value = carrier.get("__handle", context)?;
    let wrapper = handle_of(&handle_value)?;
    wrapper.invoke(&name, args, context)
}

/// Wraps `wrapper` as a callable-property host object (spec.md §4.7/§6): a
/// `Proxy` over an empty ordinary target whose handler traps `get`/`set`/
/// `has`/`ownKeys` against `wrapper`, and whose members that resolve to a
/// method group come back as a single overload-resolving callable.
pub fn wrap_host_object(wrapper: Rc<dyn ObjectWrapper>, context: &mut Context) -> JsObject {
    let carrier = JsObject::from_data(ObjectData::Native(Box::new(HostHandle(wrapper))), None);
    let carrier_value = JsValue::object(carrier);

    let target = JsObject::ordinary(Some(context.intrinsics().object_prototype()));

    let handler = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    handler.create_data_property(
        "get",
        bound_native(trap_get, carrier_value.clone(), context),
        Attribute::all(),
    );
    handler.create_data_property(
        "set",
        bound_native(trap_set, carrier_value.clone(), context),
        Attribute::all(),
    );
    handler.create_data_property(
        "has",
        bound_native(trap_has, carrier_value.clone(), context),
        Attribute::all(),
    );
    handler.create_data_property(
        "ownKeys",
        bound_native(trap_own_keys, carrier_value, context),
        Attribute::all(),
    );

    JsObject::from_data(
        ObjectData::Proxy {
            target,
            handler,
            revoked: false,
        },
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug)]
    struct Host {
        greeting: RefCell<String>,
    }

    impl ObjectWrapper for Host {
        fn try_get(&self, name: &str) -> JsResult<Option<JsValue>> {
            Ok(match name {
                "greeting" => Some(JsValue::string(self.greeting.borrow().clone())),
                _ => None,
            })
        }

        fn try_set(&self, name: &str, value: JsValue) -> JsResult<bool> {
            if name != "greeting" {
                return Ok(false);
            }
            *self.greeting.borrow_mut() = value.to_string();
            Ok(true)
        }

        fn keys(&self) -> Vec<String> {
            vec!["greeting".to_string()]
        }

        fn invoke(&self, name: &str, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
            if name != "shout" {
                return Err(JsNativeError::typ().with_message(format!("no such method {name}")).into());
            }
            let suffix = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
            Ok(JsValue::string(format!("{}{}!", self.greeting.borrow(), suffix)))
        }
    }

    #[test]
    fn get_set_and_has_forward_to_wrapper() {
        let mut context = Context::default();
        let wrapper = Rc::new(Host { greeting: RefCell::new("hi".to_string()) });
        let object = wrap_host_object(wrapper, &mut context);

        let value = object.get("greeting", &mut context).unwrap();
        assert_eq!(value.to_js_string(&mut context).unwrap().to_string_lossy(), "hi");

        assert!(object.set("greeting", JsValue::string("yo"), true, &mut context).unwrap());
        let value = object.get("greeting", &mut context).unwrap();
        assert_eq!(value.to_js_string(&mut context).unwrap().to_string_lossy(), "yo");

        assert!(object.has_property(&PropertyKey::from(JsString::from("greeting")), &mut context).unwrap());
    }

    #[test]
    fn unrecognized_member_becomes_an_invokable_method_group() {
        let mut context = Context::default();
        let wrapper = Rc::new(Host { greeting: RefCell::new("hi".to_string()) });
        let object = wrap_host_object(wrapper, &mut context);

        let shout = object.get("shout", &mut context).unwrap();
        let shout = shout.as_object().cloned().unwrap();
        assert!(shout.is_callable());
        let result = shout
            .call(&JsValue::object(object), &[JsValue::string(" there")], &mut context)
            .unwrap();
        assert_eq!(result.to_js_string(&mut context).unwrap().to_string_lossy(), "hi there!");
    }

    #[test]
    fn reflection_entry_points_are_forbidden_by_default() {
        let mut context = Context::default();
        let wrapper = Rc::new(Host { greeting: RefCell::new("hi".to_string()) });
        let object = wrap_host_object(wrapper, &mut context);

        let err = object.get("constructor", &mut context).unwrap_err();
        assert_eq!(err.to_string(), REFLECTION_FORBIDDEN_MESSAGE);
    }
}
