//! `Symbol` (spec.md §4.3): symbol creation and the global symbol registry
//! (`Symbol.for`/`Symbol.keyFor`), plus the well-known symbols installed
//! as static properties on the constructor.

use super::{install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::{JsObject, ObjectData},
    property::Attribute,
    string::JsString,
    symbol::JsSymbol,
    value::JsValue,
};
use rustc_hash::FxHashMap;
use std::any::Any;
use gc::{custom_trace, Finalize, Trace};

/// The global symbol registry `Symbol.for`/`Symbol.keyFor` share (spec.md
/// §4.3): stored as a realm-extra native object since it needs no prototype
/// chain of its own, just a place to live the registry can attach to.
/// Holds no `Gc` pointers (`JsSymbol` is `Rc`-backed), so tracing is a
/// no-op, same pattern as `string.rs`'s `JsString`.
#[derive(Debug, Default)]
struct SymbolRegistry(FxHashMap<String, JsSymbol>);

impl Finalize for SymbolRegistry {}
unsafe impl Trace for SymbolRegistry {
    custom_trace!(this, {
        let _ = this;
    });
}

pub fn init(context: &mut Context) {
    let prototype = context.intrinsics().symbol_prototype();
    prototype.create_method("toString", 0, to_string, context);
    prototype.create_method("valueOf", 0, value_of, context);

    let ctor = native_constructor("Symbol", 0, construct, context);
    link_constructor(&ctor, &prototype);

    let well_known = context.well_known_symbols().clone();
    ctor.create_data_property("iterator", well_known.iterator, Attribute::default());
    ctor.create_data_property("asyncIterator", well_known.async_iterator, Attribute::default());
    ctor.create_data_property("hasInstance", well_known.has_instance, Attribute::default());
    ctor.create_data_property("isConcatSpreadable", well_known.is_concat_spreadable, Attribute::default());
    ctor.create_data_property("match", well_known.match_, Attribute::default());
    ctor.create_data_property("matchAll", well_known.match_all, Attribute::default());
    ctor.create_data_property("replace", well_known.replace, Attribute::default());
    ctor.create_data_property("search", well_known.search, Attribute::default());
    ctor.create_data_property("species", well_known.species, Attribute::default());
    ctor.create_data_property("split", well_known.split, Attribute::default());
    ctor.create_data_property("toPrimitive", well_known.to_primitive, Attribute::default());
    ctor.create_data_property("toStringTag", well_known.to_string_tag, Attribute::default());
    ctor.create_data_property("unscopables", well_known.unscopables, Attribute::default());

    let registry = JsObject::from_data(ObjectData::Native(Box::new(SymbolRegistry::default())), None);
    context.intrinsics_mut().insert("%SymbolRegistry%", registry);

    ctor.create_method("for", 1, for_key, context);
    ctor.create_method("keyFor", 1, key_for, context);
    install_global("Symbol", ctor, context);
}

fn construct(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let description = match args.first() {
        Some(v) if !v.is_undefined() => Some(v.to_js_string(context)?),
        _ => None,
    };
    Ok(JsValue::Symbol(context.new_symbol(description)))
}

fn this_symbol(this: &JsValue) -> JsResult<JsSymbol> {
    match this {
        JsValue::Symbol(s) => Ok(s.clone()),
        JsValue::Object(o) => match &o.borrow().data {
            ObjectData::Symbol(s) => Ok(s.clone()),
            _ => Err(JsNativeError::typ().with_message("Symbol.prototype method called on incompatible receiver").into()),
        },
        _ => Err(JsNativeError::typ().with_message("Symbol.prototype method called on incompatible receiver").into()),
    }
}

fn to_string(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let s = this_symbol(this)?;
    Ok(JsValue::string(format!("Symbol({})", s.description().map(ToString::to_string).unwrap_or_default())))
}

fn value_of(this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::Symbol(this_symbol(this)?))
}

fn for_key(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let key = args.first().cloned().unwrap_or_else(JsValue::undefined).to_js_string(context)?.to_string_lossy();
    let registry_obj = context.intrinsics().get("%SymbolRegistry%").expect("symbol registry installed at init");
    let mut borrowed = registry_obj.borrow_mut();
    let ObjectData::Native(native) = &mut borrowed.data else {
        unreachable!("symbol registry native slot")
    };
    let reg = native.as_mut_any().downcast_mut::<SymbolRegistry>().expect("symbol registry type");
    if let Some(existing) = reg.0.get(&key) {
        return Ok(JsValue::Symbol(existing.clone()));
    }
    drop(borrowed);
    let symbol = context.new_symbol(Some(JsString::from(key.clone())));
    let mut borrowed = registry_obj.borrow_mut();
    let ObjectData::Native(native) = &mut borrowed.data else {
        unreachable!("symbol registry native slot")
    };
    let reg = native.as_mut_any().downcast_mut::<SymbolRegistry>().expect("symbol registry type");
    reg.0.insert(key, symbol.clone());
    Ok(JsValue::Symbol(symbol))
}

fn key_for(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(JsValue::Symbol(sym)) = args.first() else {
        return Err(JsNativeError::typ().with_message("Symbol.keyFor called on non-symbol").into());
    };
    let registry_obj = context.intrinsics().get("%SymbolRegistry%").expect("symbol registry installed at init");
    let borrowed = registry_obj.borrow();
    let ObjectData::Native(native) = &borrowed.data else {
        unreachable!("symbol registry native slot")
    };
    let reg = native.as_any().downcast_ref::<SymbolRegistry>().expect("symbol registry type");
    for (k, v) in reg.0.iter() {
        if v == sym {
            return Ok(JsValue::string(k.clone()));
        }
    }
    Ok(JsValue::undefined())
}
