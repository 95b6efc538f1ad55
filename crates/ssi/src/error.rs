/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for include resolution, template compilation, and rendering.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during SSI processing.
#[derive(Debug, Error)]
pub enum SsiError {
    /// An include target could not be stat'd or read.
    #[error("Failed to include '{}': {source}", path.display())]
    Include {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Include nesting exceeded the configured depth limit.
    #[error("Recursive include detected (depth > {max_depth}): {}", path.display())]
    RecursiveInclude { path: PathBuf, max_depth: usize },

    /// Malformed conditional nesting discovered at compile time.
    #[error("Directive syntax error: {message}")]
    SyntaxError { message: String },

    /// A conditional expression failed to evaluate at render time.
    #[error("Render error: {message}")]
    RenderError { message: String },

    /// I/O error outside include resolution (e.g., reading the top-level file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for SSI operations.
pub type SsiResult<T> = Result<T, SsiError>;
