//! The Rust representation of a JavaScript object (spec.md §3, §4.2).
//!
//! [`JsObject`] is a cheap-to-clone, garbage-collected handle
//! (`Gc<GcCell<Object>>`) into the realm's object graph. `Object` holds
//! the ordinary property table every object has plus an [`ObjectData`]
//! tag distinguishing ordinary objects from the various exotic/function
//! kinds that need extra internal slots.

mod function;
mod internal_methods;
mod ordered_map;
mod property_map;

pub use function::{FunctionObject, NativeFunction, OrdinaryFunction, ThisMode};
pub use ordered_map::{GcOrderedMap, GcOrderedSet};

use crate::{
    context::Context,
    error::JsResult,
    property::{Attribute, PropertyDescriptor, PropertyKey},
    string::JsString,
    symbol::JsSymbol,
    value::{JsBigInt, JsValue},
};
use gc::{Finalize, Gc, GcCell, GcCellRef, GcCellRefMut, Trace};
use property_map::PropertyMap;
use std::{
    any::Any,
    fmt::{self, Debug},
    rc::Rc,
};

pub type Ref<'a> = GcCellRef<'a, ObjectInner>;
pub type RefMut<'a> = GcCellRefMut<'a, ObjectInner>;

/// A Rust type usable as the payload of `ObjectData::Native`. Automatically
/// implemented for anything `Debug + Any + Trace`.
pub trait NativeObject: Debug + Any + Trace {
    fn as_any(&self) -> &dyn Any;
    fn as_mut_any(&mut self) -> &mut dyn Any;
}

impl<T: Any + Debug + Trace> NativeObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_mut_any(&mut self) -> &mut dyn Any {
        self
    }
}

/// What kind of object this is, i.e. which internal slots besides the
/// ordinary property table it carries (spec.md §3 "internal slots").
#[derive(Trace, Finalize)]
pub enum ObjectData {
    Ordinary,
    Array,
    Arguments { mapped: bool },
    Function(FunctionObject),
    Boolean(bool),
    Number(f64),
    String(JsString),
    Symbol(JsSymbol),
    BigInt(JsBigInt),
    Error,
    Date(Option<f64>),
    RegExp(Box<RegExpData>),
    Map(GcOrderedMap<crate::value::HashableValue, JsValue>),
    Set(GcOrderedSet<crate::value::HashableValue>),
    WeakMap(Vec<(JsObject, JsValue)>),
    WeakSet(Vec<JsObject>),
    Promise(PromiseData),
    Proxy { target: JsObject, handler: JsObject, revoked: bool },
    Global,
    Generator(crate::exec::generator::GeneratorState),
    WeakRef(JsObject),
    FinalizationRegistry(FinalizationRegistryData),
    Native(Box<dyn NativeObject>),
}

impl Debug for ObjectData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}

impl ObjectData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Ordinary => "Ordinary",
            Self::Array => "Array",
            Self::Arguments { .. } => "Arguments",
            Self::Function(_) => "Function",
            Self::Boolean(_) => "Boolean",
            Self::Number(_) => "Number",
            Self::String(_) => "String",
            Self::Symbol(_) => "Symbol",
            Self::BigInt(_) => "BigInt",
            Self::Error => "Error",
            Self::Date(_) => "Date",
            Self::RegExp(_) => "RegExp",
            Self::Map(_) => "Map",
            Self::Set(_) => "Set",
            Self::Promise(_) => "Promise",
            Self::Proxy { .. } => "Proxy",
            Self::Global => "Global",
            Self::Generator(_) => "Generator",
            Self::WeakRef(_) => "WeakRef",
            Self::FinalizationRegistry(_) => "FinalizationRegistry",
            Self::Native(_) => "Native",
        }
    }
}

/// A `FinalizationRegistry`'s registered entries (spec.md L3 table). There
/// is no GC finalization hook in this engine (see `builtins::weak`'s module
/// doc), so `callback` is kept only for API completeness and never invoked;
/// entries are removed solely by an explicit `unregister` call.
#[derive(Debug, Trace, Finalize)]
pub struct FinalizationRegistryData {
    pub callback: JsObject,
    pub entries: Vec<FinalizationEntry>,
}

#[derive(Debug, Trace, Finalize)]
pub struct FinalizationEntry {
    pub target: JsObject,
    pub held_value: JsValue,
    pub unregister_token: Option<JsObject>,
}

#[derive(Debug, Trace, Finalize)]
pub struct RegExpData {
    pub source: JsString,
    pub flags: JsString,
    #[unsafe_ignore_trace]
    pub matcher: Option<Rc<regress::Regex>>,
    pub last_index: usize,
}

#[derive(Debug, Clone, Trace, Finalize, PartialEq, Eq)]
pub enum PromiseState {
    Pending,
    Fulfilled,
    Rejected,
}

#[derive(Debug, Trace, Finalize)]
pub struct PromiseData {
    pub state: PromiseState,
    pub result: JsValue,
    pub fulfill_reactions: Vec<JsObject>,
    pub reject_reactions: Vec<JsObject>,
    pub already_resolved: bool,
}

/// The non-handle half of an object: the property table, prototype link
/// and extensibility flag every object (ordinary or exotic) carries.
#[derive(Trace, Finalize)]
pub struct ObjectInner {
    pub data: ObjectData,
    properties: PropertyMap,
    prototype: Option<JsObject>,
    extensible: bool,
}

impl Default for ObjectInner {
    fn default() -> Self {
        Self {
            data: ObjectData::Ordinary,
            properties: PropertyMap::new(),
            prototype: None,
            extensible: true,
        }
    }
}

impl ObjectInner {
    pub fn prototype(&self) -> Option<&JsObject> {
        self.prototype.as_ref()
    }

    pub fn set_prototype(&mut self, prototype: Option<JsObject>) {
        self.prototype = prototype;
    }

    pub fn extensible(&self) -> bool {
        self.extensible
    }

    pub fn set_extensible(&mut self, value: bool) {
        self.extensible = value;
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }

    pub fn as_function(&self) -> Option<&FunctionObject> {
        match &self.data {
            ObjectData::Function(f) => Some(f),
            _ => None,
        }
    }
}

/// A garbage-collected handle to a JS object. Cloning is a refcount bump;
/// identity is pointer identity (spec.md's notion of object equality for
/// `===`/`SameValue`).
#[derive(Trace, Finalize, Clone)]
pub struct JsObject(Gc<GcCell<ObjectInner>>);

impl JsObject {
    pub fn from_data(data: ObjectData, prototype: Option<JsObject>) -> Self {
        Self(Gc::new(GcCell::new(ObjectInner {
            data,
            properties: PropertyMap::new(),
            prototype,
            extensible: true,
        })))
    }

    /// `OrdinaryObjectCreate` (spec.md §4.2): a plain object with no extra
    /// internal slots.
    pub fn ordinary(prototype: Option<JsObject>) -> Self {
        Self::from_data(ObjectData::Ordinary, prototype)
    }

    #[track_caller]
    pub fn borrow(&self) -> Ref<'_> {
        self.0.borrow()
    }

    #[track_caller]
    pub fn borrow_mut(&self) -> RefMut<'_> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }

    /// Stable identity for hashing (`Map`/`Set` keyed on object identity,
    /// `WeakMap`/`WeakSet` membership checks).
    pub fn as_ptr(&self) -> *const () {
        self.0.as_ref() as *const GcCell<ObjectInner> as *const ()
    }

    pub fn is_callable(&self) -> bool {
        let borrowed = self.borrow();
        match &borrowed.data {
            ObjectData::Proxy { revoked: true, .. } => false,
            ObjectData::Proxy { target, .. } => {
                let target = target.clone();
                drop(borrowed);
                target.is_callable()
            }
            _ => borrowed.as_function().is_some(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        let borrowed = self.borrow();
        match &borrowed.data {
            ObjectData::Proxy { revoked: true, .. } => false,
            ObjectData::Proxy { target, .. } => {
                let target = target.clone();
                drop(borrowed);
                target.is_constructor()
            }
            _ => borrowed.as_function().map(FunctionObject::is_constructor).unwrap_or(false),
        }
    }

    fn is_proxy(&self) -> bool {
        matches!(self.borrow().data, ObjectData::Proxy { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.borrow().data, ObjectData::Array)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.borrow().data, ObjectData::Error)
    }

    // -- [[...]] internal methods, spec.md §4.2 --------------------------

    pub fn get_prototype_of(&self) -> Option<JsObject> {
        internal_methods::ordinary_get_prototype_of(self)
    }

    pub fn set_prototype_of(&self, proto: Option<JsObject>) -> bool {
        internal_methods::ordinary_set_prototype_of(self, proto)
    }

    pub fn is_extensible(&self) -> bool {
        self.borrow().extensible()
    }

    pub fn prevent_extensions(&self) -> bool {
        self.borrow_mut().set_extensible(false);
        true
    }

    pub fn get_own_property(&self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        internal_methods::ordinary_get_own_property(self, key)
    }

    pub fn has_property(&self, key: &PropertyKey, context: &mut Context) -> JsResult<bool> {
        internal_methods::ordinary_has_property(self, key, context)
    }

    pub fn get(&self, key: impl Into<PropertyKey>, context: &mut Context) -> JsResult<JsValue> {
        let key = key.into();
        internal_methods::ordinary_get(self, &key, &JsValue::object(self.clone()), context)
    }

    pub fn get_with_receiver(
        &self,
        key: &PropertyKey,
        receiver: &JsValue,
        context: &mut Context,
    ) -> JsResult<JsValue> {
        internal_methods::ordinary_get(self, key, receiver, context)
    }

    pub fn set(
        &self,
        key: impl Into<PropertyKey>,
        value: impl Into<JsValue>,
        throw: bool,
        context: &mut Context,
    ) -> JsResult<bool> {
        let key = key.into();
        let value = value.into();
        let receiver = JsValue::object(self.clone());
        internal_methods::ordinary_set(self, key, value, &receiver, throw, context)
    }

    pub fn set_with_receiver(
        &self,
        key: &PropertyKey,
        value: JsValue,
        receiver: &JsValue,
        throw: bool,
        context: &mut Context,
    ) -> JsResult<bool> {
        internal_methods::ordinary_set(self, key.clone(), value, receiver, throw, context)
    }

    pub fn define_own_property(
        &self,
        key: impl Into<PropertyKey>,
        desc: crate::property::PropertyDescriptorBuilder,
        context: &mut Context,
    ) -> JsResult<bool> {
        internal_methods::ordinary_define_own_property(self, key.into(), desc, context)
    }

    /// Convenience: define a plain data property, bypassing the
    /// `[[DefineOwnProperty]]` validation path (used by engine-internal
    /// setup code, mirroring spec.md's `CreateDataPropertyOrThrow`).
    pub fn create_data_property(&self, key: impl Into<PropertyKey>, value: impl Into<JsValue>, attrs: Attribute) {
        self.borrow_mut()
            .properties_mut()
            .insert(key.into(), PropertyDescriptor::data(value, attrs));
    }

    pub fn create_method(
        &self,
        name: impl Into<JsString>,
        length: usize,
        native: NativeFunction,
        context: &Context,
    ) {
        let name = name.into();
        let func = JsObject::native_function(Some(name.clone()), length, native, context);
        self.create_data_property(name, func, Attribute::builtin());
    }

    pub fn delete(&self, key: &PropertyKey, context: &mut Context) -> JsResult<bool> {
        internal_methods::ordinary_delete(self, key, context)
    }

    pub fn own_property_keys(&self) -> Vec<PropertyKey> {
        self.borrow().properties().keys()
    }

    pub fn call(&self, this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
        if self.is_proxy() {
            return internal_methods::proxy_call(self, this, args, context);
        }
        function::call(self, this, args, context)
    }

    pub fn construct(
        &self,
        args: &[JsValue],
        new_target: &JsObject,
        context: &mut Context,
    ) -> JsResult<JsValue> {
        if self.is_proxy() {
            return internal_methods::proxy_construct(self, args, new_target, context);
        }
        function::construct(self, args, new_target, context)
    }

    pub fn native_function(
        name: Option<JsString>,
        length: usize,
        native: NativeFunction,
        context: &Context,
    ) -> Self {
        function::new_native(name, length, native, context)
    }
}

impl Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(inner) => write!(f, "JsObject({})", inner.data.kind_name()),
            Err(_) => write!(f, "JsObject(<borrowed>)"),
        }
    }
}
