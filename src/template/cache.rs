//! Modification-time gated cache of parsed template documents.

use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

use crate::dom::{parse_html, Document};
use crate::error::TemplateError;

/// File extension appended to template names
pub const TEMPLATE_EXTENSION: &str = "html";

#[derive(Debug)]
struct CacheEntry {
    modified: SystemTime,
    document: Arc<Document>,
}

/// Shared store of parsed templates keyed by canonical path.
///
/// Cloning is cheap and every clone sees the same entries, so one cache can
/// be handed to the renderer and to the hot-reload watcher. Cached documents
/// are immutable; expansion always builds a new output tree.
///
/// A stale entry is replaced wholesale. Two renders racing on the same stale
/// file may both parse it; the last insert wins and both results are valid.
#[derive(Debug, Clone, Default)]
pub struct DocumentCache {
    entries: Arc<DashMap<PathBuf, CacheEntry>>,
}

impl DocumentCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `name` relative to the directory containing `source_path`.
    ///
    /// Returns the canonical path of the template together with its parsed
    /// document.
    pub fn resolve(
        &self,
        source_path: &Path,
        name: &str,
    ) -> Result<(PathBuf, Arc<Document>), TemplateError> {
        let dir = source_path.parent().unwrap_or_else(|| Path::new(""));
        self.resolve_in(dir, name)
    }

    /// Resolve `name` inside `dir`, appending the template extension
    pub fn resolve_in(
        &self,
        dir: &Path,
        name: &str,
    ) -> Result<(PathBuf, Arc<Document>), TemplateError> {
        if name.trim().is_empty() {
            return Err(TemplateError::InvalidName(name.to_string()));
        }
        let path = dir.join(format!("{name}.{TEMPLATE_EXTENSION}"));
        let canonical = fs::canonicalize(&path)
            .map_err(|source| TemplateError::NotFound { path, source })?;
        let document = self.load(&canonical)?;
        Ok((canonical, document))
    }

    /// Return the cached document for `canonical`, reparsing when the file's
    /// modification time differs from the cached one
    pub fn load(&self, canonical: &Path) -> Result<Arc<Document>, TemplateError> {
        let modified = fs::metadata(canonical)
            .and_then(|meta| meta.modified())
            .map_err(|source| TemplateError::Io {
                path: canonical.to_path_buf(),
                source,
            })?;

        if let Some(entry) = self.entries.get(canonical) {
            if entry.modified == modified {
                debug!(path = %canonical.display(), "Template cache hit");
                return Ok(Arc::clone(&entry.document));
            }
        }

        let source = fs::read_to_string(canonical).map_err(|source| TemplateError::Io {
            path: canonical.to_path_buf(),
            source,
        })?;
        let document = Arc::new(parse_html(source.trim()));
        let replaced = self
            .entries
            .insert(
                canonical.to_path_buf(),
                CacheEntry {
                    modified,
                    document: Arc::clone(&document),
                },
            )
            .is_some();
        info!(
            path = %canonical.display(),
            nodes = document.node_count(),
            replaced,
            "Template parsed"
        );
        Ok(document)
    }

    /// Drop the entry for `path`. Returns `true` when an entry was removed.
    pub fn invalidate(&self, path: &Path) -> bool {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let removed = self.entries.remove(&key).is_some();
        if removed {
            debug!(path = %key.display(), "Template cache entry invalidated");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }
}
