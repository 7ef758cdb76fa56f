//! # Hot Reload Module
//!
//! Watches a template directory and evicts changed templates from a
//! [`DocumentCache`] so the next render reparses them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use keml::hot_reload::watch_templates;
//! use keml::template::DocumentCache;
//!
//! # fn main() -> notify::Result<()> {
//! let cache = DocumentCache::new();
//! let watcher = watch_templates("templates", cache.clone())?;
//!
//! // Keep the watcher alive for as long as the cache is in use
//! # drop(watcher);
//! # Ok(())
//! # }
//! ```
//!
//! [`watch_if_enabled`] starts the same watcher for a [`Renderer`] when
//! `KEML_HOT_RELOAD` is set; `keml render` goes through it.
//!
//! The cache already compares modification times on every resolve, so the
//! watcher is an optimization for long-running processes rather than a
//! correctness requirement. Dropping the returned watcher stops watching.

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::runtime_config::RuntimeConfig;
use crate::template::{DocumentCache, Renderer, TEMPLATE_EXTENSION};

fn is_template(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == TEMPLATE_EXTENSION)
}

/// Watch `dir` recursively and evict modified, created or removed templates
/// from `cache`.
pub fn watch_templates<P>(dir: P, cache: DocumentCache) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
{
    // Events carry paths under the watched root; canonicalizing the root makes
    // them line up with the cache's canonical keys.
    let root: PathBuf = dir
        .as_ref()
        .canonicalize()
        .unwrap_or_else(|_| dir.as_ref().to_path_buf());

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                for path in event.paths.iter().filter(|p| is_template(p)) {
                    if cache.invalidate(path) {
                        info!(path = %path.display(), "hot-reload: template evicted");
                    } else {
                        debug!(path = %path.display(), "hot-reload: template not cached");
                    }
                }
            }
            Err(e) => warn!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(dir = %root.display(), "hot-reload: watching templates");
    Ok(watcher)
}

/// Watch `renderer`'s template directory when `config.hot_reload` is set.
///
/// Returns `None` when hot reload is disabled. The watcher evicts from the
/// renderer's own cache and stops when dropped.
pub fn watch_if_enabled(
    config: &RuntimeConfig,
    renderer: &Renderer,
) -> notify::Result<Option<RecommendedWatcher>> {
    if !config.hot_reload {
        debug!("hot-reload: disabled");
        return Ok(None);
    }
    watch_templates(renderer.template_dir(), renderer.cache().clone()).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RouteTable;

    #[test]
    fn test_is_template() {
        assert!(is_template(Path::new("/t/page.html")));
        assert!(!is_template(Path::new("/t/page.htm")));
        assert!(!is_template(Path::new("/t/html")));
    }

    #[test]
    fn test_watch_if_enabled_follows_flag() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(dir.path(), RouteTable::default());

        let disabled = RuntimeConfig {
            template_dir: dir.path().to_path_buf(),
            ..RuntimeConfig::default()
        };
        assert!(watch_if_enabled(&disabled, &renderer).unwrap().is_none());

        let enabled = RuntimeConfig {
            hot_reload: true,
            ..disabled
        };
        assert!(watch_if_enabled(&enabled, &renderer).unwrap().is_some());
    }

    #[test]
    fn test_watch_if_enabled_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(dir.path().join("absent"), RouteTable::default());
        let config = RuntimeConfig {
            hot_reload: true,
            ..RuntimeConfig::default()
        };
        assert!(watch_if_enabled(&config, &renderer).is_err());
    }
}
