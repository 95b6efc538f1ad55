/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template compilation.
//!
//! Compilation scans the (already include-resolved) text left to right,
//! classifying directive spans and assembling conditional blocks with an
//! explicit stack. Literal text between directives is carried over with
//! carriage returns stripped. The only fatal condition is malformed
//! conditional nesting; guard expressions are not parsed here, so a bad
//! expression fails at render time without invalidating the template.

use crate::ast::{Assign, CondExpr, Conditional, Echo, Node};
use crate::error::{SsiError, SsiResult};
use crate::expr;
use crate::grammar::{self, Directive};

/// A compiled template, ready to render any number of times.
///
/// Compilation is pure and the template holds no mutable state, so one
/// instance can be rendered concurrently against different contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub(crate) nodes: Vec<Node>,
}

/// The section of an open conditional currently collecting nodes.
#[derive(Debug)]
enum ActiveSection {
    /// An `if` or `elif` branch with its guard.
    Guarded(CondExpr),
    /// The `else` branch.
    Else,
}

/// An `if` block whose `endif` has not been seen yet.
#[derive(Debug)]
struct OpenBlock {
    /// Byte offset of the opening `if`, for error messages.
    offset: usize,
    /// Completed (guard, body) branches.
    done: Vec<(CondExpr, Vec<Node>)>,
    /// Which section `body` belongs to.
    section: ActiveSection,
    /// Nodes collected for the active section.
    body: Vec<Node>,
}

impl OpenBlock {
    fn new(guard: CondExpr, offset: usize) -> Self {
        OpenBlock {
            offset,
            done: Vec::new(),
            section: ActiveSection::Guarded(guard),
            body: Vec::new(),
        }
    }
}

impl Template {
    /// Compile template text into an executable form.
    ///
    /// Fails only on malformed conditional nesting: a stray `elif`/`else`/
    /// `endif`, an `elif` after `else`, a second `else`, or an unterminated
    /// block.
    pub fn compile(text: &str) -> SsiResult<Template> {
        let mut root: Vec<Node> = Vec::new();
        let mut stack: Vec<OpenBlock> = Vec::new();
        let mut cursor = 0;

        while let Some(m) = grammar::find_directive(text, cursor) {
            push_literal(sink(&mut root, &mut stack), &text[cursor..m.start]);
            cursor = m.end;

            match m.directive {
                Directive::SetVar { name, value } => {
                    sink(&mut root, &mut stack).push(Node::Assign(Assign { name, value }));
                }

                Directive::Echo { name, default } => {
                    sink(&mut root, &mut stack).push(Node::Echo(Echo { name, default }));
                }

                Directive::If { expr } => {
                    stack.push(OpenBlock::new(expr::classify(&expr), m.start));
                }

                Directive::Elif { expr } => {
                    let Some(block) = stack.last_mut() else {
                        return Err(syntax_error("Unexpected elif with no open conditional", m.start));
                    };
                    match std::mem::replace(
                        &mut block.section,
                        ActiveSection::Guarded(expr::classify(&expr)),
                    ) {
                        ActiveSection::Guarded(guard) => {
                            let body = std::mem::take(&mut block.body);
                            block.done.push((guard, body));
                        }
                        ActiveSection::Else => {
                            return Err(syntax_error("Unexpected elif after else", m.start));
                        }
                    }
                }

                Directive::Else => {
                    let Some(block) = stack.last_mut() else {
                        return Err(syntax_error("Unexpected else with no open conditional", m.start));
                    };
                    match std::mem::replace(&mut block.section, ActiveSection::Else) {
                        ActiveSection::Guarded(guard) => {
                            let body = std::mem::take(&mut block.body);
                            block.done.push((guard, body));
                        }
                        ActiveSection::Else => {
                            return Err(syntax_error("Unexpected second else in conditional", m.start));
                        }
                    }
                }

                Directive::EndIf => {
                    let Some(block) = stack.pop() else {
                        return Err(syntax_error("Unexpected endif with no open conditional", m.start));
                    };
                    let conditional = close_block(block);
                    sink(&mut root, &mut stack).push(Node::Conditional(conditional));
                }

                // Unknown forms, and any include that survived resolution,
                // are consumed without output
                Directive::Opaque => {}
            }
        }

        if let Some(block) = stack.last() {
            return Err(syntax_error("Unterminated conditional block", block.offset));
        }

        push_literal(&mut root, &text[cursor..]);
        Ok(Template { nodes: root })
    }
}

/// The node list currently collecting output: the innermost open block's
/// active section, or the template root.
fn sink<'a>(root: &'a mut Vec<Node>, stack: &'a mut Vec<OpenBlock>) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(block) => &mut block.body,
        None => root,
    }
}

/// Append a literal span, dropping carriage returns. Newlines, quotes, and
/// backslashes pass through untouched.
fn push_literal(nodes: &mut Vec<Node>, segment: &str) {
    if segment.is_empty() {
        return;
    }
    let normalized = segment.replace('\r', "");
    if !normalized.is_empty() {
        nodes.push(Node::Literal(normalized));
    }
}

fn close_block(block: OpenBlock) -> Conditional {
    let OpenBlock {
        mut done,
        section,
        body,
        ..
    } = block;

    match section {
        ActiveSection::Guarded(guard) => {
            done.push((guard, body));
            Conditional {
                branches: done,
                else_branch: None,
            }
        }
        ActiveSection::Else => Conditional {
            branches: done,
            else_branch: Some(body),
        },
    }
}

fn syntax_error(what: &str, offset: usize) -> SsiError {
    SsiError::SyntaxError {
        message: format!("{what} (byte {offset})"),
    }
}
