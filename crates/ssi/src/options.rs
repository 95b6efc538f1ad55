/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Engine configuration.
//!
//! [`SsiOptions`] carries everything a processing call needs: where includes
//! are anchored, how file bytes are decoded, the variable payload, and the
//! include nesting bound. Options are immutable once handed to an engine;
//! engines built from different options never affect one another.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::context::TemplateContext;

/// Default bound on include nesting depth.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 50;

/// Text encoding used when decoding included files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    /// UTF-8, decoded lossily: invalid sequences become U+FFFD.
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,

    /// ISO-8859-1: each byte maps to the code point of the same value.
    #[serde(rename = "latin1", alias = "iso-8859-1")]
    Latin1,
}

impl TextEncoding {
    /// Decode raw file bytes into text.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Latin1 => write!(f, "latin1"),
        }
    }
}

/// Configuration for an SSI engine.
#[derive(Debug, Clone)]
pub struct SsiOptions {
    /// Directory anchoring file-mode includes, absolute virtual includes,
    /// and relative virtual includes at the top of a `compile` call.
    pub base_dir: PathBuf,

    /// Encoding for files read during include resolution.
    pub encoding: TextEncoding,

    /// Variable bindings templates are rendered against.
    pub payload: TemplateContext,

    /// Include nesting depth at which resolution fails instead of
    /// recursing further.
    pub max_include_depth: usize,
}

impl Default for SsiOptions {
    fn default() -> Self {
        SsiOptions {
            base_dir: PathBuf::from("."),
            encoding: TextEncoding::default(),
            payload: TemplateContext::new(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

impl SsiOptions {
    /// Create options with the defaults: base directory `.`, UTF-8, empty
    /// payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base directory for include resolution.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Set the text encoding for included files.
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the variable payload.
    pub fn with_payload(mut self, payload: TemplateContext) -> Self {
        self.payload = payload;
        self
    }

    /// Set the variable payload from a JSON object.
    pub fn with_payload_json(self, payload: serde_json::Value) -> Self {
        self.with_payload(TemplateContext::from_json(payload))
    }

    /// Set the maximum include nesting depth.
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }
}
