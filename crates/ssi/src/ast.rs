/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compiled template AST types.
//!
//! A compiled template is a flat list of nodes; conditional blocks nest
//! recursively. Include directives never appear here: they are spliced away
//! by the resolver before compilation.

/// A node in the compiled template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text to be output as-is.
    Literal(String),

    /// Variable assignment: `<!--#set var="k" value="v"-->`
    Assign(Assign),

    /// Variable interpolation: `<!--#echo var="k" default="d"-->`
    Echo(Echo),

    /// Conditional block: `<!--#if expr="..."-->...<!--#endif-->`
    Conditional(Conditional),
}

/// Variable assignment. The value is always a literal string; richer values
/// can only enter through the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    /// Variable name to bind.
    pub name: String,
    /// Literal value, stored verbatim.
    pub value: String,
}

/// Variable interpolation with an optional fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Echo {
    /// Variable name to look up.
    pub name: String,
    /// Emitted when the variable is unbound or null.
    pub default: Option<String>,
}

/// Conditional block: `if`/`elif` branches plus an optional `else` body.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    /// List of (guard, body) pairs for if/elif branches, in document order.
    pub branches: Vec<(CondExpr, Vec<Node>)>,
    /// Optional else branch, taken when no guard matches.
    pub else_branch: Option<Vec<Node>>,
}

/// Equality operator in a comparison guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==` (or the legacy bare `=`).
    Eq,
    /// `!=`
    Ne,
}

/// A conditional guard expression.
///
/// Comparison-shaped guards are recognized at compile time; anything else is
/// kept as source text and handed to the expression interpreter per render,
/// so a malformed expression fails that render only.
#[derive(Debug, Clone, PartialEq)]
pub enum CondExpr {
    /// `key == literal` / `key != literal`, compared on string form.
    Comparison {
        /// Variable name, leading `$` sigil already stripped.
        key: String,
        /// Comparison operator.
        op: CompareOp,
        /// Unquoted literal to compare against.
        literal: String,
    },

    /// Free-form expression source, evaluated at render time.
    Free(String),
}
