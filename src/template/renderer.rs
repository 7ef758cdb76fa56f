//! Standard render entry point: root context assembly plus expansion.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::builtins::{self, DEFAULT_DATETIME_FORMAT};
use crate::context::Context;
use crate::dom::Document;
use crate::error::TemplateError;
use crate::router::{RouteMatch, RouteTable};
use crate::runtime_config::RuntimeConfig;
use crate::value::{Fields, Value};

use super::cache::DocumentCache;
use super::expand::Expander;

/// Per-request values bound into the root context
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    /// Authenticated principal, null when anonymous
    pub user: Value,
    /// Name of the route that matched the request
    pub active_route: Option<String>,
    /// Captured route parameters
    pub params: Fields,
    /// Handler-provided computed properties, bound after the builtins
    pub computed: Fields,
    /// Client timezone offset in minutes, as `Date.getTimezoneOffset()` reports it
    pub tz_offset_minutes: i32,
}

impl RequestState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a matched route: `active_route` plus its captures
    #[must_use]
    pub fn from_match(route: &RouteMatch) -> Self {
        Self {
            active_route: Some(route.name.to_string()),
            params: route
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), Value::from(v.as_str())))
                .collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: Value) -> Self {
        self.user = user;
        self
    }

    #[must_use]
    pub fn with_computed(mut self, name: impl Into<String>, value: Value) -> Self {
        self.computed.push((name.into(), value));
        self
    }

    #[must_use]
    pub fn with_tz_offset(mut self, minutes: i32) -> Self {
        self.tz_offset_minutes = minutes;
        self
    }
}

/// Renders named templates from one directory
#[derive(Debug, Clone)]
pub struct Renderer {
    cache: DocumentCache,
    routes: Arc<RouteTable>,
    template_dir: PathBuf,
    datetime_format: String,
}

impl Renderer {
    pub fn new(template_dir: impl Into<PathBuf>, routes: RouteTable) -> Self {
        Self {
            cache: DocumentCache::new(),
            routes: Arc::new(routes),
            template_dir: template_dir.into(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
        }
    }

    /// Renderer over the configured template directory and date format
    #[must_use]
    pub fn from_config(config: &RuntimeConfig, routes: RouteTable) -> Self {
        Self::new(&config.template_dir, routes).with_datetime_format(&config.datetime_format)
    }

    /// Share an existing cache (e.g. one watched for hot reload)
    #[must_use]
    pub fn with_cache(mut self, cache: DocumentCache) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_datetime_format(mut self, format: &str) -> Self {
        self.datetime_format = format.to_string();
        self
    }

    #[must_use]
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    /// Builtins followed by the request bindings; later names shadow earlier ones
    #[must_use]
    pub fn root_context(&self, state: &RequestState) -> Context {
        let mut bindings: Fields = vec![
            ("ceil".into(), builtins::ceil()),
            ("len".into(), builtins::len()),
            ("markdown".into(), builtins::markdown()),
            ("url".into(), builtins::url(Arc::clone(&self.routes))),
            (
                "ftime".into(),
                builtins::ftime(state.tz_offset_minutes, &self.datetime_format),
            ),
            ("gravatar".into(), builtins::gravatar()),
            ("user".into(), state.user.clone()),
            (
                "active_route".into(),
                state.active_route.clone().into(),
            ),
        ];
        bindings.extend(state.params.iter().cloned());
        bindings.extend(state.computed.iter().cloned());
        Context::new().extend(bindings)
    }

    /// Render template `name` with `bindings` layered over the root context
    pub fn render<I, K>(
        &self,
        name: &str,
        state: &RequestState,
        bindings: I,
    ) -> Result<String, TemplateError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let ctx = self.root_context(state).extend(bindings);
        self.render_with(name, &ctx)
    }

    /// Render template `name` against an already assembled context
    pub fn render_with(&self, name: &str, ctx: &Context) -> Result<String, TemplateError> {
        let (path, document) = self.cache.resolve_in(&self.template_dir, name)?;
        let mut output = Document::new();
        let root = output.root();
        Expander::new(&self.cache, &mut output).expand(
            &path,
            root,
            &document,
            document.root(),
            ctx,
        )?;
        debug!(template = %name, path = %path.display(), "Template rendered");
        Ok(output.to_html())
    }
}
