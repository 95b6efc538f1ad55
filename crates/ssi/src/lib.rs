/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Server Side Includes template engine.
//!
//! This crate processes the Apache-style SSI directive syntax embedded in
//! HTML comments. It supports:
//!
//! - Includes: `<!--#include file="header.html" -->` and
//!   `<!--#include virtual="partials/nav.html" -->`
//! - Variables: `<!--#set var="name" value="some value" -->`
//! - Interpolation: `<!--#echo var="name" -->`, with an optional
//!   `default="..."` fallback
//! - Conditionals: `<!--#if expr="$mode = live" -->`, `<!--#elif expr="..." -->`,
//!   `<!--#else -->`, `<!--#endif -->`
//!
//! # Architecture
//!
//! Processing runs in three stages. An [`IncludeResolver`] flattens `include`
//! directives into a single piece of text, [`Template::compile`] parses the
//! remaining directives into a node tree, and rendering walks that tree
//! against a [`TemplateContext`] payload. The [`Ssi`] engine wires the three
//! together behind one call.
//!
//! # Example
//!
//! ```ignore
//! use ssi::{Ssi, SsiOptions};
//!
//! let engine = Ssi::with_options(
//!     SsiOptions::new()
//!         .with_base_dir("site")
//!         .with_payload_json(serde_json::json!({ "title": "Home" })),
//! );
//!
//! let output = engine
//!     .compile("<!--#include file=\"banner.html\" --><h1><!--#echo var=\"title\" --></h1>")
//!     .await?;
//! ```

pub mod ast;
pub mod context;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod grammar;
pub mod options;
pub mod parser;
pub mod resolver;

// Re-export main types at crate root
pub use ast::{Assign, CompareOp, CondExpr, Conditional, Echo, Node};
pub use context::{TemplateContext, TemplateValue};
pub use engine::Ssi;
pub use error::{SsiError, SsiResult};
pub use grammar::IncludeMode;
pub use options::{DEFAULT_MAX_INCLUDE_DEPTH, SsiOptions, TextEncoding};
pub use parser::Template;
pub use resolver::{FsLoader, IncludeLoader, IncludeResolver, MemoryLoader};
