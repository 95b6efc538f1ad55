/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The processing facade.
//!
//! [`Ssi`] ties the pipeline together: flatten includes, compile the
//! directive grammar into a template, render against the payload.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SsiResult;
use crate::options::SsiOptions;
use crate::parser::Template;
use crate::resolver::{FsLoader, IncludeResolver};

/// SSI processing engine.
///
/// An engine is immutable once built. It may be shared across tasks and
/// used for any number of processing calls.
#[derive(Debug, Clone)]
pub struct Ssi {
    options: SsiOptions,
    resolver: IncludeResolver<FsLoader>,
}

impl Default for Ssi {
    fn default() -> Self {
        Self::with_options(SsiOptions::default())
    }
}

impl Ssi {
    /// Create an engine with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine from options.
    pub fn with_options(options: SsiOptions) -> Self {
        let resolver =
            IncludeResolver::with_loader(FsLoader::new(options.encoding), options.base_dir.clone())
                .with_max_depth(options.max_include_depth);
        Ssi { options, resolver }
    }

    /// The options this engine was built with.
    pub fn options(&self) -> &SsiOptions {
        &self.options
    }

    /// Process template text: flatten includes, then render directives
    /// against the payload. Relative `virtual` includes at the top level
    /// resolve against the base directory.
    pub async fn compile(&self, content: &str) -> SsiResult<String> {
        let flattened = self.resolver.resolve(content).await?;
        let template = Template::compile(&flattened)?;
        template.render(&self.options.payload)
    }

    /// Process a template file. Relative `virtual` includes at the top
    /// level resolve against the file's own directory.
    pub async fn compile_file(&self, path: impl AsRef<Path>) -> SsiResult<String> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Compiling template file");

        let bytes = tokio::fs::read(path).await?;
        let content = self.options.encoding.decode(&bytes);
        let current_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let flattened = self.resolver.resolve_from(&content, current_dir).await?;
        let template = Template::compile(&flattened)?;
        template.render(&self.options.payload)
    }

    /// Flatten includes without compiling or rendering other directives.
    pub async fn resolve_includes(&self, content: &str) -> SsiResult<String> {
        self.resolver.resolve(content).await
    }
}
