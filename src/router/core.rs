//! Route table: ordered named path templates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::pattern::{strip_path, ParamVec, RouteTemplate};
use crate::error::RouteTableError;
use crate::value::Value;

/// One `name -> path template` entry as declared in a route file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub path: String,
}

impl Route {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Result of matching a request path against the route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Name of the matched route
    pub name: Arc<str>,
    /// Captured path parameters, in template order
    pub params: ParamVec,
}

impl RouteMatch {
    /// Get a captured parameter by name
    ///
    /// Uses "last write wins" semantics: when a template captures the same
    /// name twice (e.g. `/org/{id}/user/{id}`), the later capture is returned.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Captures as an owned map (later duplicates win)
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    name: Arc<str>,
    /// Declared template, used for URL generation
    template: RouteTemplate,
    /// Template with trailing slashes stripped, used for matching
    matcher: RouteTemplate,
}

/// Ordered route table. The first route whose template matches wins, so
/// declaration order is significant.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compile `routes`, keeping their order
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        let routes: Vec<CompiledRoute> = routes
            .into_iter()
            .map(|route| CompiledRoute {
                name: Arc::from(route.name.as_str()),
                matcher: RouteTemplate::new(strip_path(&route.path)),
                template: RouteTemplate::new(&route.path),
            })
            .collect();

        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.name, r.template.source()))
            .collect();
        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            "Route table loaded"
        );

        Self { routes }
    }

    /// Parse a YAML list of `{ name, path }` entries
    pub fn from_yaml_str(source: &str) -> Result<Self, RouteTableError> {
        let routes: Vec<Route> = serde_yaml::from_str(source)?;
        Ok(Self::new(routes))
    }

    /// Load a YAML route file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RouteTableError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| RouteTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&source)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// `(name, declared template)` pairs in match order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.routes
            .iter()
            .map(|r| (r.name.as_ref(), r.template.source()))
    }

    /// Match a request path, ignoring trailing slashes on both sides.
    ///
    /// Returns `None` when no route matches; the caller decides what a miss
    /// renders as.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        let path = strip_path(path);
        debug!(path = %path, "Route match attempt");
        let match_start = Instant::now();

        for route in &self.routes {
            if let Some(params) = route.matcher.matches(path) {
                info!(
                    path = %path,
                    route_name = %route.name,
                    route_pattern = %route.template.source(),
                    path_params = ?params,
                    duration_us = match_start.elapsed().as_micros(),
                    "Route matched"
                );
                return Some(RouteMatch {
                    name: Arc::clone(&route.name),
                    params,
                });
            }
        }

        warn!(
            path = %path,
            duration_us = match_start.elapsed().as_micros(),
            "No route matched"
        );
        None
    }

    /// Build the URL of the route called `name`.
    ///
    /// Keyword arguments naming a capture fill the template, the rest form
    /// the query string. Unknown route names yield `None`.
    #[must_use]
    pub fn url(&self, name: &str, kwargs: &[(String, Value)]) -> Option<String> {
        let Some(route) = self.routes.iter().find(|r| r.name.as_ref() == name) else {
            warn!(route_name = %name, "URL requested for unknown route");
            return None;
        };
        Some(route.template.generate(kwargs))
    }
}
