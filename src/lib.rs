#![deny(
    unused_qualifications,
    clippy::all,
    unused_import_braces,
    unused_lifetimes,
    unreachable_pub,
    trivial_numeric_casts,
    rustdoc,
    missing_copy_implementations,
    deprecated_in_future,
    meta_variable_misuse,
    non_ascii_idents,
    rust_2018_compatibility,
    rust_2018_idioms,
    future_incompatible,
    nonstandard_style
)]
#![warn(clippy::perf, clippy::single_match_else, clippy::dbg_macro)]
#![allow(
    clippy::missing_inline_in_public_items,
    clippy::cognitive_complexity,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::as_conversions
)]

//! An embeddable ECMAScript engine (spec.md's L1-L9 layering): a value
//! model and ordinary/exotic object machinery, a tree-walking interpreter
//! over a host-supplied AST, environment records and modules, a standalone
//! JSON parser, and the realm-scoped built-ins a conforming host expects.
//!
//! This crate does not parse JavaScript source text itself (spec.md §1's
//! L0 is explicitly out of scope) — [`Context::evaluate`] consumes an
//! [`ast::Program`] the embedder already parsed.

pub mod ast;
pub mod builtins;
pub mod context;
pub mod environment;
pub mod error;
pub mod exec;
mod gc;
pub mod interop;
pub mod json;
pub mod module;
pub mod object;
pub mod property;
pub mod quota;
pub mod realm;
pub mod string;
pub mod symbol;
pub mod value;

#[cfg(feature = "deser")]
pub use serde_json;

pub use crate::{
    context::{Context, Options, OptionsBuilder},
    error::{EngineOutcome, JsError, JsResult},
    interop::{InteropOptions, MemberAccessor, MemberDescriptor, ObjectWrapper, TypeHandle, TypeResolver},
    module::ModuleLoader,
    value::JsValue,
};
