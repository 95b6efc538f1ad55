/*
 * expr.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conditional expression classification and evaluation.
//!
//! Guard expressions come in two flavors. The comparison shape
//! `key (==|!=|=) literal` is recognized at compile time and compares a
//! variable's string form against an unquoted literal. Everything else is
//! free-form: a small boolean language over context identifiers with `&&`,
//! `||`, `!`, comparisons, parentheses, and quoted or bare literals. Free-form
//! sources are parsed here at render time, so a malformed expression fails
//! the render that reaches it and nothing else.

use regex::Regex;
use std::sync::LazyLock;

use crate::ast::{CompareOp, CondExpr};
use crate::context::{TemplateContext, TemplateValue};
use crate::error::{SsiError, SsiResult};

/// Comparison guard shape, anchored to the whole trimmed expression.
///
/// The key may carry a leading `$` sigil (stripped on capture). The literal
/// is an unquoted word/number token. A partial match (say, a comparison
/// followed by `|| other`) falls through to the free-form language.
static COMPARISON_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // Pattern breakdown:
    // ^([\w$.-]+)   - Variable name, dots and dashes allowed
    // \s*(==|!=|=)  - Operator; bare '=' is the legacy equality spelling
    // \s*([\w.-]+)$ - Bare literal
    Regex::new(r"^([\w$.-]+)\s*(==|!=|=)\s*([\w.-]+)$")
        .expect("Invalid regex pattern for comparison guard")
});

/// Classify a guard expression into its compiled form.
pub fn classify(expr: &str) -> CondExpr {
    let trimmed = expr.trim();

    if let Some(caps) = COMPARISON_PATTERN.captures(trimmed) {
        let raw_key = &caps[1];
        let key = raw_key.strip_prefix('$').unwrap_or(raw_key).to_string();
        let op = if &caps[2] == "!=" {
            CompareOp::Ne
        } else {
            CompareOp::Eq
        };
        return CondExpr::Comparison {
            key,
            op,
            literal: caps[3].to_string(),
        };
    }

    CondExpr::Free(trimmed.to_string())
}

/// Evaluate a guard against a context.
///
/// Comparisons resolve the key (unbound means null, whose string form is
/// empty) and compare string forms. Free-form sources are parsed and
/// interpreted; failures surface as render errors.
pub fn evaluate(cond: &CondExpr, context: &TemplateContext) -> SsiResult<bool> {
    match cond {
        CondExpr::Comparison { key, op, literal } => {
            let actual = context.resolve(key).map(|v| v.render()).unwrap_or_default();
            Ok(match op {
                CompareOp::Eq => actual == *literal,
                CompareOp::Ne => actual != *literal,
            })
        }
        CondExpr::Free(src) => {
            let expr = parse(src).map_err(|message| SsiError::RenderError {
                message: format!("in expression '{src}': {message}"),
            })?;
            Ok(eval(&expr, context).is_truthy())
        }
    }
}

// ---------------------------------------------------------------------------
// Free-form expression language
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Literal(TemplateValue),
    Eq,
    Ne,
    Not,
    And,
    Or,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Ident(String),
    Literal(TemplateValue),
    Not(Box<Expr>),
    Compare {
        lhs: Box<Expr>,
        op: CompareOp,
        rhs: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '-')
}

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            ' ' | '\t' => pos += 1,
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            '!' => {
                if chars.get(pos + 1) == Some(&'=') {
                    tokens.push(Token::Ne);
                    pos += 2;
                } else {
                    tokens.push(Token::Not);
                    pos += 1;
                }
            }
            '=' => {
                // Both '==' and the legacy bare '=' mean equality
                if chars.get(pos + 1) == Some(&'=') {
                    pos += 2;
                } else {
                    pos += 1;
                }
                tokens.push(Token::Eq);
            }
            '&' => {
                if chars.get(pos + 1) == Some(&'&') {
                    tokens.push(Token::And);
                    pos += 2;
                } else {
                    return Err("expected '&&'".to_string());
                }
            }
            '|' => {
                if chars.get(pos + 1) == Some(&'|') {
                    tokens.push(Token::Or);
                    pos += 2;
                } else {
                    return Err("expected '||'".to_string());
                }
            }
            '\'' | '"' => {
                let quote = c;
                let mut value = String::new();
                pos += 1;
                loop {
                    match chars.get(pos) {
                        Some(&ch) if ch == quote => {
                            pos += 1;
                            break;
                        }
                        Some(&ch) => {
                            value.push(ch);
                            pos += 1;
                        }
                        None => return Err("unterminated string literal".to_string()),
                    }
                }
                tokens.push(Token::Literal(TemplateValue::String(value)));
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while pos < chars.len() && is_word_char(chars[pos]) {
                    word.push(chars[pos]);
                    pos += 1;
                }
                tokens.push(word_token(word));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    Ok(tokens)
}

/// Interpret a bare word: boolean keywords and numbers are literals,
/// anything else names a context variable.
fn word_token(word: String) -> Token {
    match word.as_str() {
        "true" => return Token::Literal(TemplateValue::Bool(true)),
        "false" => return Token::Literal(TemplateValue::Bool(false)),
        _ => {}
    }

    let mut chars = word.chars();
    let numeric = chars.next().is_some_and(|c| c.is_ascii_digit())
        && word.chars().all(|c| c.is_ascii_digit() || c == '.');
    if numeric {
        // Numbers compare on their source text, same as payload numbers
        return Token::Literal(TemplateValue::String(word));
    }

    Token::Ident(word)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And) {
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, String> {
        if self.eat(&Token::Not) {
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<Expr, String> {
        let lhs = self.parse_primary()?;

        let op = match self.peek() {
            Some(Token::Eq) => CompareOp::Eq,
            Some(Token::Ne) => CompareOp::Ne,
            _ => return Ok(lhs),
        };
        self.pos += 1;

        let rhs = self.parse_primary()?;
        Ok(Expr::Compare {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                if !self.eat(&Token::RParen) {
                    return Err("expected ')'".to_string());
                }
                Ok(inner)
            }
            Some(Token::Ident(name)) => Ok(Expr::Ident(name)),
            Some(Token::Literal(value)) => Ok(Expr::Literal(value)),
            Some(other) => Err(format!("unexpected token {other:?}")),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}

fn parse(src: &str) -> Result<Expr, String> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!(
            "unexpected token {:?} after expression",
            parser.tokens[parser.pos]
        ));
    }
    Ok(expr)
}

fn eval(expr: &Expr, context: &TemplateContext) -> TemplateValue {
    match expr {
        Expr::Ident(name) => {
            let name = name.strip_prefix('$').unwrap_or(name);
            context.resolve(name).cloned().unwrap_or(TemplateValue::Null)
        }
        Expr::Literal(value) => value.clone(),
        Expr::Not(inner) => TemplateValue::Bool(!eval(inner, context).is_truthy()),
        Expr::Compare { lhs, op, rhs } => {
            let left = eval(lhs, context).render();
            let right = eval(rhs, context).render();
            TemplateValue::Bool(match op {
                CompareOp::Eq => left == right,
                CompareOp::Ne => left != right,
            })
        }
        Expr::And(a, b) => {
            TemplateValue::Bool(eval(a, context).is_truthy() && eval(b, context).is_truthy())
        }
        Expr::Or(a, b) => {
            TemplateValue::Bool(eval(a, context).is_truthy() || eval(b, context).is_truthy())
        }
    }
}
