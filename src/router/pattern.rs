//! Path templates: matching request paths and generating URLs.
//!
//! A path template uses the segment grammar, so `/article/{slug}` has one
//! literal (`/article/`) and one capture (`slug`). Matching anchors each
//! literal at its next occurrence in the candidate path; the text between
//! anchors becomes the capture value.

use smallvec::SmallVec;
use std::sync::Arc;
use url::form_urlencoded;

use crate::context::Context;
use crate::expr::{evaluate, join};
use crate::segments::{self, Segment};
use crate::value::Value;

/// Maximum number of captures before [`ParamVec`] spills to the heap.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Captured `name -> value` pairs in template order.
///
/// Names are shared with the owning [`RouteTemplate`]; values are per request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Remove trailing slashes; the bare root stays `/`
#[must_use]
pub fn strip_path(path: &str) -> &str {
    let stripped = path.trim_end_matches('/');
    if stripped.is_empty() {
        "/"
    } else {
        stripped
    }
}

/// Parsed path template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    source: String,
    segments: Vec<Segment>,
    names: Vec<Arc<str>>,
}

impl RouteTemplate {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let segments = segments::parse(source);
        let names = segments::extract_names(&segments)
            .into_iter()
            .map(Arc::from)
            .collect();
        Self {
            source: source.to_string(),
            segments,
            names,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Capture names in template order, duplicates included
    #[must_use]
    pub fn names(&self) -> &[Arc<str>] {
        &self.names
    }

    /// Match `path` against this template.
    ///
    /// A template without captures matches only the identical string. When a
    /// name is captured twice both values are kept in order; lookups through
    /// [`RouteMatch::param`](super::RouteMatch::param) see the last one.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<ParamVec> {
        if self.names.is_empty() {
            return (self.source == path).then(ParamVec::new);
        }

        // (capture index, start, end)
        let mut limits: SmallVec<[(usize, usize, Option<usize>); MAX_INLINE_PARAMS]> =
            SmallVec::new();
        let mut offset = 0;
        for segment in &self.segments {
            if segment.expression {
                limits.push((limits.len(), offset, None));
            } else {
                let found = offset + path.get(offset..)?.find(segment.text.as_str())?;
                offset = found + segment.text.len();
                if let Some(last) = limits.last_mut() {
                    last.2 = Some(found);
                }
            }
        }

        let &(_, first_start, _) = limits.first()?;
        if first_start != 0 {
            let prefix = &self.segments.first()?.text;
            if path.get(..first_start) != Some(prefix.as_str()) {
                return None;
            }
        }
        let &(_, _, last_end) = limits.last()?;
        if let Some(end) = last_end {
            let suffix = &self.segments.last()?.text;
            if path.get(end..) != Some(suffix.as_str()) {
                return None;
            }
        }

        limits
            .iter()
            .map(|&(index, start, end)| {
                let value = match end {
                    Some(end) => path.get(start..end)?,
                    None => path.get(start..)?,
                };
                Some((Arc::clone(&self.names[index]), value.to_string()))
            })
            .collect()
    }

    /// Build a URL from keyword arguments.
    ///
    /// Arguments naming a capture are substituted into the template; the rest
    /// become a form-encoded query string. Null arguments are dropped, and no
    /// `?` is added when the query is empty.
    #[must_use]
    pub fn generate(&self, kwargs: &[(String, Value)]) -> String {
        let mut known: Vec<(String, Value)> = Vec::new();
        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut has_query = false;
        for (name, value) in kwargs {
            if value.is_null() {
                continue;
            }
            if self.names.iter().any(|n| n.as_ref() == name) {
                known.push((name.clone(), value.clone()));
            } else {
                query.append_pair(name, &value.render());
                has_query = true;
            }
        }

        let ctx = Context::from_bindings(known);
        let mut url = join(evaluate(&self.segments, &ctx)).render();
        if has_query {
            url.push('?');
            url.push_str(&query.finish());
        }
        url
    }
}

/// Match `path` against `template`, returning captures by name
#[must_use]
pub fn match_template(template: &str, path: &str) -> Option<ParamVec> {
    RouteTemplate::new(template).matches(path)
}

/// Generate a URL from `template` and keyword arguments
#[must_use]
pub fn generate(template: &str, kwargs: &[(String, Value)]) -> String {
    RouteTemplate::new(template).generate(kwargs)
}
