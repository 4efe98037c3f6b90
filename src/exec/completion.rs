//! Completion records (spec.md §4.5, §5): every statement evaluates to one
//! of these instead of returning a bare `JsValue`, so `break`/`continue`/
//! `return` can unwind through nested statement lists without Rust-level
//! exceptions.

use crate::{ast::Identifier, error::JsError, value::JsValue};

#[derive(Debug, Clone)]
pub enum Completion {
    Normal(JsValue),
    Return(JsValue),
    Break(Option<Box<str>>),
    Continue(Option<Box<str>>),
}

impl Completion {
    pub fn value(&self) -> Option<JsValue> {
        match self {
            Self::Normal(v) | Self::Return(v) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Self::Normal(_))
    }
}

pub type ExecResult = Result<Completion, JsError>;

pub(crate) fn label_name(label: &Option<Identifier>) -> Option<Box<str>> {
    label.as_ref().map(|id| id.name.clone())
}
