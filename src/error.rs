//! The error taxonomy used throughout the engine.
//!
//! JavaScript-level errors travel as [`JsError`] values inside `throw`
//! completions and can be observed by user `catch`/`finally`. Host-fatal
//! conditions (quota trips, forbidden reflection, internal invariant
//! failures) are [`EngineError`]s: they unwind straight to the engine
//! facade and are never representable as a JS value, so `catch` cannot see
//! them. See spec.md §7.

use crate::value::JsValue;
use std::fmt;

/// A thrown JavaScript value, almost always an `Error` instance built by
/// [`JsNativeError`] but in principle any value (`throw 3` is valid JS).
#[derive(Debug, Clone, Trace, Finalize)]
pub struct JsError {
    value: JsValue,
}

impl JsError {
    /// Wraps an arbitrary JS value as a thrown error.
    pub fn from_value(value: JsValue) -> Self {
        Self { value }
    }

    /// The thrown value itself.
    pub fn as_value(&self) -> &JsValue {
        &self.value
    }

    pub fn into_value(self) -> JsValue {
        self.value
    }
}

impl From<JsNativeError> for JsError {
    fn from(err: JsNativeError) -> Self {
        Self {
            value: err.to_opaque_value(),
        }
    }
}

/// Lets a quota trip travel through the same `?`-propagated `JsResult`
/// chain every other abstract operation uses (see `QuotaTracker::fail`):
/// the triggering `QuotaTracker` already recorded the fault before
/// returning it, so whoever let this escape past `execute_try`'s catch can
/// recover the original [`crate::quota::QuotaError`] and report it as
/// host-fatal instead of a catchable throw.
impl From<crate::quota::QuotaError> for JsError {
    fn from(err: crate::quota::QuotaError) -> Self {
        JsNativeError::error().with_message(err.to_string()).into()
    }
}

/// The six `Error` subclasses the specification requires core support for,
/// plus the two non-standard kinds the host interop layer raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsErrorKind {
    Error,
    Type,
    Range,
    Reference,
    Syntax,
    Uri,
    Eval,
}

impl JsErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Type => "TypeError",
            Self::Range => "RangeError",
            Self::Reference => "ReferenceError",
            Self::Syntax => "SyntaxError",
            Self::Uri => "URIError",
            Self::Eval => "EvalError",
        }
    }
}

/// A builder for one of the native JS error kinds. Every internal abstract
/// operation that needs to throw goes through this so `name`/`message`
/// and the synthesized `stack` are always shaped the same way (spec.md §7,
/// "Diagnostic payload").
#[derive(Debug, Clone)]
pub struct JsNativeError {
    kind: JsErrorKind,
    message: String,
}

impl JsNativeError {
    fn new(kind: JsErrorKind) -> Self {
        Self {
            kind,
            message: String::new(),
        }
    }

    pub fn error() -> Self {
        Self::new(JsErrorKind::Error)
    }
    pub fn typ() -> Self {
        Self::new(JsErrorKind::Type)
    }
    pub fn range() -> Self {
        Self::new(JsErrorKind::Range)
    }
    pub fn reference() -> Self {
        Self::new(JsErrorKind::Reference)
    }
    pub fn syntax() -> Self {
        Self::new(JsErrorKind::Syntax)
    }
    pub fn uri() -> Self {
        Self::new(JsErrorKind::Uri)
    }
    pub fn eval() -> Self {
        Self::new(JsErrorKind::Eval)
    }

    #[must_use]
    pub fn with_message<M: Into<String>>(mut self, message: M) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> JsErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Materializes this builder as an `Error` object carrying `name` and
    /// `message` own properties. Abstract operations throw long before a
    /// `&mut Context` is always in scope, so this intentionally does not
    /// give the object a realm-specific prototype (no `instanceof
    /// TypeError` chain); `exec` re-wraps caught native errors through
    /// `Context::realm_error` to attach the real prototype whenever a
    /// thrown value crosses back into user-observable `catch` bindings.
    fn to_opaque_value(&self) -> JsValue {
        use crate::{object::ObjectData, property::Attribute};
        let object = crate::object::JsObject::from_data(ObjectData::Error, None);
        object.create_data_property("name", self.kind.name(), Attribute::builtin());
        object.create_data_property("message", self.message.clone(), Attribute::builtin());
        JsValue::object(object)
    }
}

impl fmt::Display for JsNativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

/// A condition that escapes the interpreter loop as a genuine Rust
/// exception rather than a `throw` completion. These can never be caught
/// by user `try`/`catch`; they unwind through `finally` blocks (the
/// unwinder still runs them, see `exec::completion`) straight back to
/// whichever `Context` method the host called.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("quota exceeded: {0}")]
    QuotaExceeded(#[from] crate::quota::QuotaError),

    #[error("Cannot access System.Reflection namespace, check Engine's interop options")]
    HostReflectionForbidden,

    #[error("internal invariant failure: {0}")]
    InternalInvariantFailure(String),
}

/// The result type for abstract operations that may throw a JS error.
pub type JsResult<T> = Result<T, JsError>;

/// The result type for engine-facade operations, which may also abort with
/// a host-fatal [`EngineError`].
pub type EngineResult<T> = Result<T, EngineOutcome>;

/// Unifies the two distinct failure channels (spec.md §7 "Propagation
/// policy") for code that sits at the boundary between the interpreter
/// and the facade.
#[derive(Debug, Clone)]
pub enum EngineOutcome {
    Thrown(JsError),
    Fatal(EngineError),
}

impl From<JsError> for EngineOutcome {
    fn from(e: JsError) -> Self {
        Self::Thrown(e)
    }
}

impl From<EngineError> for EngineOutcome {
    fn from(e: EngineError) -> Self {
        Self::Fatal(e)
    }
}

use gc::{Finalize, Trace};
