//! The Iterator protocol (spec.md §4.3 `Symbol.iterator`): `GetIterator`,
//! `IteratorStep`/`IteratorValue`, and `IteratorClose`, used by `for-of`,
//! destructuring, spread elements, and argument spreading.

use crate::{
    context::Context,
    error::{JsNativeError, JsResult},
    object::JsObject,
    value::JsValue,
};

pub struct JsIterator {
    iterator: JsObject,
    next_method: JsObject,
    done: bool,
}

impl JsIterator {
    /// `GetIterator`: looks up `value[Symbol.iterator]` and calls it.
    pub fn from_value(value: &JsValue, context: &mut Context) -> JsResult<Self> {
        if value.is_null_or_undefined() {
            return Err(not_iterable());
        }
        let method = value.to_object(context).and_then(|obj| {
            obj.get(context.well_known_symbols().iterator.clone(), context)
        })?;
        let f = method.as_object().filter(|o| o.is_callable()).ok_or_else(not_iterable)?;
        let iterator = f.call(value, &[], context)?;
        let iterator = iterator.as_object().cloned().ok_or_else(not_iterable)?;
        let next_method = iterator
            .get("next", context)?
            .as_object()
            .cloned()
            .filter(JsObject::is_callable)
            .ok_or_else(not_iterable)?;
        Ok(Self {
            iterator,
            next_method,
            done: false,
        })
    }

    /// `IteratorStep` + `IteratorValue`: advances the iterator, returning
    /// `None` once `{ done: true }` is observed.
    pub fn next(&mut self, context: &mut Context) -> JsResult<Option<JsValue>> {
        if self.done {
            return Ok(None);
        }
        let result = self
            .next_method
            .call(&JsValue::object(self.iterator.clone()), &[], context)?;
        let result = result.as_object().ok_or_else(|| {
            JsNativeError::typ()
                .with_message("Iterator result is not an object")
                .into()
        })?;
        if result.get("done", context)?.to_boolean() {
            self.done = true;
            return Ok(None);
        }
        Ok(Some(result.get("value", context)?))
    }

    /// `IteratorClose`: calls `.return()` if present, best-effort (errors
    /// are swallowed, matching the "close ignores result" path spec.md
    /// takes when already unwinding for an unrelated reason).
    pub fn close(&mut self, context: &mut Context) {
        if self.done {
            return;
        }
        self.done = true;
        if let Ok(method) = self.iterator.get("return", context) {
            if let Some(f) = method.as_object().filter(|o| o.is_callable()) {
                let _ = f.call(&JsValue::object(self.iterator.clone()), &[], context);
            }
        }
    }
}

fn not_iterable() -> crate::error::JsError {
    JsNativeError::typ().with_message("value is not iterable").into()
}
