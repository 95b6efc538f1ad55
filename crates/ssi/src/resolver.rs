/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Include resolution.
//!
//! Flattens `<!--#include -->` directives by repeatedly locating the first
//! include in the text, loading its target, recursively flattening that
//! content, and splicing the result in place of the directive. Path lookup
//! distinguishes the two directive modes: `file` paths always resolve
//! against the configured base directory, while `virtual` paths resolve
//! against the including file's own directory unless they start with `/`,
//! in which case they resolve against the base directory too.
//!
//! Loading goes through the [`IncludeLoader`] trait so tests can run
//! against an in-memory tree instead of the filesystem.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{SsiError, SsiResult};
use crate::grammar::{self, IncludeMatch, IncludeMode};
use crate::options::{TextEncoding, DEFAULT_MAX_INCLUDE_DEPTH};

/// Source of include targets.
#[async_trait]
pub trait IncludeLoader: Send + Sync {
    /// Whether the path names a directory.
    async fn is_dir(&self, path: &Path) -> std::io::Result<bool>;

    /// Load the path's content as text.
    async fn load(&self, path: &Path) -> std::io::Result<String>;
}

/// Loader backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader {
    encoding: TextEncoding,
}

impl FsLoader {
    pub fn new(encoding: TextEncoding) -> Self {
        FsLoader { encoding }
    }
}

#[async_trait]
impl IncludeLoader for FsLoader {
    async fn is_dir(&self, path: &Path) -> std::io::Result<bool> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(metadata.is_dir())
    }

    async fn load(&self, path: &Path) -> std::io::Result<String> {
        let bytes = tokio::fs::read(path).await?;
        Ok(self.encoding.decode(&bytes))
    }
}

/// In-memory loader for testing.
///
/// A path is treated as a directory when it is a proper prefix of some
/// stored file's path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader pre-populated with files.
    pub fn with_files(
        files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<String>)>,
    ) -> Self {
        let mut loader = Self::new();
        for (path, content) in files {
            loader.add(path, content);
        }
        loader
    }

    /// Add a file to the loader.
    pub fn add(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> &mut Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

#[async_trait]
impl IncludeLoader for MemoryLoader {
    async fn is_dir(&self, path: &Path) -> std::io::Result<bool> {
        if self.files.contains_key(path) {
            return Ok(false);
        }
        if self.files.keys().any(|known| known.starts_with(path)) {
            return Ok(true);
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no entry for {}", path.display()),
        ))
    }

    async fn load(&self, path: &Path) -> std::io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no entry for {}", path.display()),
            )
        })
    }
}

/// Where the resolver currently is in the include tree.
#[derive(Debug, Clone)]
struct ResolveScope {
    /// Directory of the file whose content is being scanned, if known.
    /// Relative `virtual` includes resolve against this.
    current_dir: Option<PathBuf>,
    depth: usize,
}

impl ResolveScope {
    fn root(current_dir: Option<PathBuf>) -> Self {
        ResolveScope {
            current_dir,
            depth: 0,
        }
    }

    /// Scope for the content of an included file.
    fn enter(&self, target: &Path) -> Self {
        ResolveScope {
            current_dir: target.parent().map(Path::to_path_buf),
            depth: self.depth + 1,
        }
    }
}

/// Flattens include directives out of template text.
#[derive(Debug, Clone)]
pub struct IncludeResolver<L = FsLoader> {
    loader: L,
    base_dir: PathBuf,
    max_depth: usize,
}

impl IncludeResolver<FsLoader> {
    /// Create a filesystem-backed resolver anchored at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_loader(FsLoader::default(), base_dir)
    }

    /// Set the encoding used to decode included files.
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.loader = FsLoader::new(encoding);
        self
    }
}

impl<L: IncludeLoader> IncludeResolver<L> {
    /// Create a resolver over a custom loader, anchored at `base_dir`.
    pub fn with_loader(loader: L, base_dir: impl Into<PathBuf>) -> Self {
        IncludeResolver {
            loader,
            base_dir: base_dir.into(),
            max_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }

    /// Set the include nesting depth at which resolution fails.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Resolve all includes in `text`. Relative `virtual` paths resolve
    /// against the base directory, as there is no including file.
    pub async fn resolve(&self, text: &str) -> SsiResult<String> {
        self.resolve_scoped(text.to_string(), ResolveScope::root(None))
            .await
    }

    /// Resolve all includes in `text` as if it were the content of a file
    /// in `current_dir`.
    pub async fn resolve_from(
        &self,
        text: &str,
        current_dir: impl Into<PathBuf>,
    ) -> SsiResult<String> {
        self.resolve_scoped(text.to_string(), ResolveScope::root(Some(current_dir.into())))
            .await
    }

    // Recursive and async, so the future is boxed by hand.
    fn resolve_scoped(
        &self,
        mut content: String,
        scope: ResolveScope,
    ) -> Pin<Box<dyn Future<Output = SsiResult<String>> + Send + '_>> {
        Box::pin(async move {
            while let Some(found) = grammar::find_include(&content) {
                let target = self.target_path(&found, scope.current_dir.as_deref());
                if scope.depth >= self.max_depth {
                    return Err(SsiError::RecursiveInclude {
                        path: target,
                        max_depth: self.max_depth,
                    });
                }
                debug!(path = %target.display(), mode = ?found.mode, "Resolving include");

                let target = if self
                    .loader
                    .is_dir(&target)
                    .await
                    .map_err(|source| SsiError::Include {
                        path: target.clone(),
                        source,
                    })?
                {
                    debug!(path = %target.display(), "Include target is a directory, using index.html");
                    target.join("index.html")
                } else {
                    target
                };

                let raw = self
                    .loader
                    .load(&target)
                    .await
                    .map_err(|source| SsiError::Include {
                        path: target.clone(),
                        source,
                    })?;
                let inner = self.resolve_scoped(raw, scope.enter(&target)).await?;
                content.replace_range(found.start..found.end, &inner);
            }
            Ok(content)
        })
    }

    /// Resolve an include directive's path to a concrete target.
    fn target_path(&self, found: &IncludeMatch, current_dir: Option<&Path>) -> PathBuf {
        let is_absolute = found.path.starts_with('/');
        let base = match current_dir {
            Some(dir) if found.mode == IncludeMode::Virtual && !is_absolute => dir,
            _ => self.base_dir.as_path(),
        };
        // A leading slash anchors the path under the base directory, not
        // the filesystem root.
        base.join(found.path.trim_start_matches('/'))
    }
}
