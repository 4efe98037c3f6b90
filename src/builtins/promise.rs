//! `Promise` (spec.md §4.3): settlement/reaction bookkeeping lives on
//! `ObjectData::Promise`'s `PromiseData`; reactions are modeled as bound
//! native functions (the same `FunctionObject::Bound` mechanism
//! `Function.prototype.bind` uses) closing over a small reaction-record
//! object, since `NativeFunction` itself is a bare `fn` pointer with no
//! capture storage. `await` (`exec::expression::await_value`) drains the
//! job queue once and reads the settled state directly rather than truly
//! suspending, so this module only needs to make that state reachable.

use super::{install_global, link_constructor, native_constructor};
use crate::{
    context::Context,
    error::{JsError, JsNativeError, JsResult},
    object::{FunctionObject, JsObject, ObjectData, PromiseData, PromiseState},
    property::Attribute,
    value::JsValue,
};

pub fn init(context: &mut Context) {
    let prototype = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    prototype.create_method("then", 2, then, context);
    prototype.create_method("catch", 1, catch, context);
    prototype.create_method("finally", 1, finally, context);

    let ctor = native_constructor("Promise", 1, construct, context);
    link_constructor(&ctor, &prototype);
    ctor.create_method("resolve", 1, static_resolve, context);
    ctor.create_method("reject", 1, static_reject, context);
    ctor.create_method("all", 1, all, context);
    context.intrinsics_mut().insert("%Promise.prototype%", prototype);
    install_global("Promise", ctor, context);
}

fn new_pending_promise(context: &Context) -> JsObject {
    JsObject::from_data(
        ObjectData::Promise(PromiseData {
            state: PromiseState::Pending,
            result: JsValue::undefined(),
            fulfill_reactions: Vec::new(),
            reject_reactions: Vec::new(),
            already_resolved: false,
        }),
        context.intrinsics().get("%Promise.prototype%"),
    )
}

fn bound_native(target: crate::object::NativeFunction, bound_this: JsValue, context: &Context) -> JsObject {
    let target = JsObject::native_function(None, 1, target, context);
    JsObject::from_data(
        ObjectData::Function(FunctionObject::Bound { target, bound_this, bound_args: Vec::new() }),
        Some(context.intrinsics().function_prototype()),
    )
}

fn construct(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Promise constructor called on non-object").into());
    };
    let Some(executor) = args.first().and_then(JsValue::as_object).filter(|o| o.is_callable()).cloned() else {
        return Err(JsNativeError::typ().with_message("Promise resolver is not a function").into());
    };
    obj.borrow_mut().data = ObjectData::Promise(PromiseData {
        state: PromiseState::Pending,
        result: JsValue::undefined(),
        fulfill_reactions: Vec::new(),
        reject_reactions: Vec::new(),
        already_resolved: false,
    });

    let resolve = bound_native(resolve_impl, this.clone(), context);
    let reject = bound_native(reject_impl, this.clone(), context);
    if let Err(err) = executor.call(&JsValue::undefined(), &[JsValue::object(resolve), JsValue::object(reject)], context) {
        reject_promise(obj, err.into_value(), context);
    }
    Ok(this.clone())
}

fn resolve_impl(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(promise) = this.as_object() else {
        return Ok(JsValue::undefined());
    };
    let value = args.first().cloned().unwrap_or_else(JsValue::undefined);
    resolve_promise(promise, value, context);
    Ok(JsValue::undefined())
}

fn reject_impl(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(promise) = this.as_object() else {
        return Ok(JsValue::undefined());
    };
    let reason = args.first().cloned().unwrap_or_else(JsValue::undefined);
    reject_promise(promise, reason, context);
    Ok(JsValue::undefined())
}

/// `ResolvePromise` (spec.md's settlement): chains onto `value.then` when
/// it is thenable, otherwise fulfills directly.
fn resolve_promise(promise: &JsObject, value: JsValue, context: &mut Context) {
    if already_resolved(promise) {
        return;
    }
    if let Some(value_obj) = value.as_object() {
        if !value_obj.ptr_eq(promise) {
            if let Ok(then) = value_obj.get("then", context) {
                if let Some(then_fn) = then.as_object().filter(|o| o.is_callable()).cloned() {
                    mark_resolved(promise);
                    let promise = promise.clone();
                    context.enqueue_job(move |context| {
                        let resolve = bound_native(resolve_impl, JsValue::object(promise.clone()), context);
                        let reject = bound_native(reject_impl, JsValue::object(promise.clone()), context);
                        if let Err(err) =
                            then_fn.call(&value, &[JsValue::object(resolve), JsValue::object(reject)], context)
                        {
                            settle(&promise, PromiseState::Rejected, err.into_value(), context);
                        }
                    });
                    return;
                }
            }
        }
    }
    mark_resolved(promise);
    settle(promise, PromiseState::Fulfilled, value, context);
}

fn reject_promise(promise: &JsObject, reason: JsValue, context: &mut Context) {
    if already_resolved(promise) {
        return;
    }
    mark_resolved(promise);
    settle(promise, PromiseState::Rejected, reason, context);
}

fn already_resolved(promise: &JsObject) -> bool {
    matches!(&promise.borrow().data, ObjectData::Promise(p) if p.already_resolved)
}

fn mark_resolved(promise: &JsObject) {
    if let ObjectData::Promise(p) = &mut promise.borrow_mut().data {
        p.already_resolved = true;
    }
}

fn settle(promise: &JsObject, state: PromiseState, value: JsValue, context: &mut Context) {
    let reactions = {
        let mut borrowed = promise.borrow_mut();
        let ObjectData::Promise(p) = &mut borrowed.data else { return };
        p.state = state.clone();
        p.result = value.clone();
        std::mem::take(if state == PromiseState::Fulfilled { &mut p.fulfill_reactions } else { &mut p.reject_reactions })
    };
    for reaction in reactions {
        let value = value.clone();
        context.enqueue_job(move |context| {
            let _ = reaction.call(&JsValue::undefined(), &[value], context);
        });
    }
}

/// A reaction record: an ordinary object carrying the derived promise,
/// the optional user handler, and which settlement it fires on.
fn make_reaction_record(derived: JsObject, handler: Option<JsObject>, is_fulfill: bool, context: &Context) -> JsObject {
    let record = JsObject::ordinary(Some(context.intrinsics().object_prototype()));
    record.create_data_property("derived", JsValue::object(derived), Attribute::all());
    record.create_data_property(
        "handler",
        handler.map(JsValue::object).unwrap_or_else(JsValue::undefined),
        Attribute::all(),
    );
    record.create_data_property("isFulfill", is_fulfill, Attribute::all());
    record
}

fn run_reaction(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(record) = this.as_object() else {
        return Ok(JsValue::undefined());
    };
    let derived = record.get("derived", context)?.as_object().cloned().expect("reaction record always has a derived promise");
    let handler = record.get("handler", context)?.as_object().cloned();
    let is_fulfill = record.get("isFulfill", context)?.to_boolean();
    let argument = args.first().cloned().unwrap_or_else(JsValue::undefined);

    let outcome = match handler {
        Some(f) => f.call(&JsValue::undefined(), &[argument], context),
        None if is_fulfill => Ok(argument),
        None => Err(JsError::from_value(argument)),
    };
    match outcome {
        Ok(value) => resolve_promise(&derived, value, context),
        Err(err) => reject_promise(&derived, err.into_value(), context),
    }
    Ok(JsValue::undefined())
}

/// `PerformPromiseThen` (spec.md's `.then`): always returns a new derived
/// promise, registering a reaction that runs once this promise settles
/// (immediately queued if it already has).
fn then(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(promise) = this.as_object() else {
        return Err(JsNativeError::typ().with_message("Promise.prototype.then called on non-object").into());
    };
    let on_fulfilled = args.first().and_then(JsValue::as_object).filter(|o| o.is_callable()).cloned();
    let on_rejected = args.get(1).and_then(JsValue::as_object).filter(|o| o.is_callable()).cloned();

    let derived = new_pending_promise(context);
    let fulfill_record = make_reaction_record(derived.clone(), on_fulfilled, true, context);
    let reject_record = make_reaction_record(derived.clone(), on_rejected, false, context);
    let fulfill_reaction = bound_native(run_reaction, JsValue::object(fulfill_record), context);
    let reject_reaction = bound_native(run_reaction, JsValue::object(reject_record), context);

    let (state, result) = {
        let borrowed = promise.borrow();
        let ObjectData::Promise(p) = &borrowed.data else {
            return Err(JsNativeError::typ().with_message("Promise.prototype.then called on incompatible receiver").into());
        };
        (p.state.clone(), p.result.clone())
    };

    match state {
        PromiseState::Pending => {
            let mut borrowed = promise.borrow_mut();
            let ObjectData::Promise(p) = &mut borrowed.data else { unreachable!() };
            p.fulfill_reactions.push(fulfill_reaction);
            p.reject_reactions.push(reject_reaction);
        }
        PromiseState::Fulfilled => {
            context.enqueue_job(move |context| {
                let _ = fulfill_reaction.call(&JsValue::undefined(), &[result], context);
            });
        }
        PromiseState::Rejected => {
            context.enqueue_job(move |context| {
                let _ = reject_reaction.call(&JsValue::undefined(), &[result], context);
            });
        }
    }
    Ok(JsValue::object(derived))
}

fn get_then(this: &JsValue, who: &str, context: &mut Context) -> JsResult<JsObject> {
    let Some(obj) = this.as_object() else {
        return Err(JsNativeError::typ().with_message(format!("{who} called on incompatible receiver")).into());
    };
    let then_value = obj.get("then", context)?;
    then_value
        .as_object()
        .filter(|o| o.is_callable())
        .cloned()
        .ok_or_else(|| JsNativeError::typ().with_message(format!("{who} called on incompatible receiver")).into())
}

fn catch(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let then_fn = get_then(this, "Promise.prototype.catch", context)?;
    let on_rejected = args.first().cloned().unwrap_or_else(JsValue::undefined);
    then_fn.call(this, &[JsValue::undefined(), on_rejected], context)
}

fn finally(this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let then_fn = get_then(this, "Promise.prototype.finally", context)?;
    let on_finally = args.first().cloned().unwrap_or_else(JsValue::undefined);
    then_fn.call(this, &[on_finally.clone(), on_finally], context)
}

fn static_resolve(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let value = args.first().cloned().unwrap_or_else(JsValue::undefined);
    if let Some(obj) = value.as_object() {
        if matches!(obj.borrow().data, ObjectData::Promise(_)) {
            return Ok(value);
        }
    }
    let promise = new_pending_promise(context);
    resolve_promise(&promise, value, context);
    Ok(JsValue::object(promise))
}

fn static_reject(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let reason = args.first().cloned().unwrap_or_else(JsValue::undefined);
    let promise = new_pending_promise(context);
    reject_promise(&promise, reason, context);
    Ok(JsValue::object(promise))
}

/// Wraps an already-completed `async function` body in a settled Promise
/// (spec.md §8): by the time `call_ordinary` reaches this, the body has
/// already run to completion (`await` resolves synchronously rather than
/// truly suspending, see this module's doc comment), so there's no pending
/// state to track — only the outcome to box up the way the caller expects.
pub(crate) fn settle_async_call(outcome: JsResult<JsValue>, context: &mut Context) -> JsObject {
    let promise = new_pending_promise(context);
    match outcome {
        Ok(value) => resolve_promise(&promise, value, context),
        Err(err) => reject_promise(&promise, err.into_value(), context),
    }
    promise
}

/// `Promise.all`, simplified to the synchronous subset the engine's
/// cooperative job queue can actually settle within one `run_jobs` drain:
/// every input is resolved via `Promise.resolve` and awaited eagerly.
fn all(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let Some(iterable) = args.first() else {
        return Err(JsNativeError::typ().with_message("Promise.all argument must be iterable").into());
    };
    let mut iter = crate::exec::iterator::JsIterator::from_value(iterable, context)?;
    let mut results = Vec::new();
    while let Some(item) = iter.next(context)? {
        let resolved = static_resolve(&JsValue::undefined(), &[item], context)?;
        context.run_jobs();
        let Some(obj) = resolved.as_object() else { unreachable!() };
        let (state, value) = match &obj.borrow().data {
            ObjectData::Promise(p) => (p.state.clone(), p.result.clone()),
            _ => unreachable!(),
        };
        match state {
            PromiseState::Fulfilled | PromiseState::Pending => results.push(value),
            PromiseState::Rejected => {
                let rejected = new_pending_promise(context);
                reject_promise(&rejected, value, context);
                return Ok(JsValue::object(rejected));
            }
        }
    }
    let promise = new_pending_promise(context);
    resolve_promise(&promise, JsValue::object(context.new_array(results)), context);
    Ok(JsValue::object(promise))
}
