//! The AST contract handed to the interpreter by the (external,
//! out-of-scope) surface-syntax parser. See spec.md §1 and §6.
//!
//! Every node carries a [`Span`] (line/column plus byte range) for
//! diagnostics. This module only defines shapes; nothing here lexes or
//! parses source text.

pub mod expression;
pub mod pattern;
pub mod statement;

pub use expression::Expression;
pub use pattern::BindingPattern;
pub use statement::{CatchClause, ForHead, ForInit, Statement, SwitchCase};

/// A source location: 1-based line/column of the start, plus the byte
/// range `[start, end)` in the original UTF-16 source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub column: u32,
    pub start: u32,
    pub end: u32,
}

/// An identifier as interned by the parser. The core never re-derives
/// identifier text from source; it trusts the string the parser handed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: Box<str>,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: impl Into<Box<str>>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// Top-level unit handed to `Context::execute`/`Context::import_module`.
#[derive(Debug, Clone)]
pub enum Program {
    Script(Script),
    Module(Module),
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    pub statements: Vec<Statement>,
    /// Set by the parser when the source began with a `"use strict"`
    /// directive prologue entry.
    pub strict: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Module {
    pub body: Vec<ModuleItem>,
}

#[derive(Debug, Clone)]
pub enum ModuleItem {
    Import(ImportDeclaration),
    Export(ExportDeclaration),
    Statement(Statement),
}

#[derive(Debug, Clone)]
pub struct ImportDeclaration {
    pub specifier: Box<str>,
    pub entries: Vec<ImportEntry>,
}

#[derive(Debug, Clone)]
pub enum ImportEntry {
    /// `import x from 'm'`
    Default(Identifier),
    /// `import * as ns from 'm'`
    Namespace(Identifier),
    /// `import { a as b } from 'm'`
    Named {
        imported: Identifier,
        local: Identifier,
    },
}

#[derive(Debug, Clone)]
pub enum ExportDeclaration {
    /// `export function f() {}` / `export let x = 1`
    Local(Statement),
    /// `export default <expr>`
    Default(Expression),
    /// `export { a as b }` and `export { a as b } from 'm'`
    Named {
        entries: Vec<ExportEntry>,
        from: Option<Box<str>>,
    },
    /// `export * from 'm'`
    All {
        from: Box<str>,
        as_namespace: Option<Identifier>,
    },
}

#[derive(Debug, Clone)]
pub struct ExportEntry {
    pub local: Identifier,
    pub exported: Identifier,
}

/// `var` / `let` / `const`, per spec.md §3 ("Environment Record") and
/// §4.5 ("Hoisting").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone)]
pub struct VariableDeclarator {
    pub pattern: BindingPattern,
    pub init: Option<Expression>,
}

#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub kind: DeclarationKind,
    pub declarations: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Ordinary,
    Arrow,
    Generator,
    Async,
    AsyncGenerator,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Option<Identifier>,
    pub params: Vec<FormalParameter>,
    pub body: Vec<Statement>,
    pub kind: FunctionKind,
    pub strict: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FormalParameter {
    pub pattern: BindingPattern,
    pub default: Option<Expression>,
    pub rest: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Ordinary,
    Getter,
    Setter,
    Generator,
    Async,
}

#[derive(Debug, Clone)]
pub struct ClassMethod {
    pub key: PropertyKeyExpr,
    pub function: Function,
    pub kind: MethodKind,
    pub is_static: bool,
    pub is_private: bool,
}

#[derive(Debug, Clone)]
pub struct ClassField {
    pub key: PropertyKeyExpr,
    pub init: Option<Expression>,
    pub is_static: bool,
    pub is_private: bool,
}

#[derive(Debug, Clone)]
pub struct Class {
    pub name: Option<Identifier>,
    pub super_class: Option<Expression>,
    pub methods: Vec<ClassMethod>,
    pub fields: Vec<ClassField>,
    pub span: Span,
}

/// A property key as written in source: either a plain identifier/string
/// literal key or a `[computed]` expression.
#[derive(Debug, Clone)]
pub enum PropertyKeyExpr {
    Identifier(Box<str>),
    StringLiteral(Box<str>),
    NumberLiteral(f64),
    Computed(Box<Expression>),
    PrivateIdentifier(Box<str>),
}
