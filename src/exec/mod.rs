//! The tree-walking interpreter (spec.md §4, §5): evaluates an AST handed
//! to it by the (out-of-scope) parser against an [`environment::Environment`]
//! chain. `completion` defines the result shape every statement produces;
//! `declaration` hoists bindings before a statement list runs;
//! `expression`/`statement` walk the AST; `function` implements
//! `[[Call]]`/`[[Construct]]` for tree-walked functions; `iterator` is the
//! shared iterator protocol used by destructuring, spreads, and `for-of`.

pub mod completion;
pub mod declaration;
pub mod expression;
pub mod function;
pub mod generator;
pub mod iterator;
pub mod statement;
