//! Template tree expansion.
//!
//! Walks a parsed template document and writes a fresh output tree, resolving
//! the control tags and substituting `{ ... }` expressions in attribute values
//! and text.

use std::path::Path;
use tracing::warn;

use crate::context::Context;
use crate::dom::{Document, Element, NodeId, NodeKind};
use crate::error::TemplateError;
use crate::expr::fstr;
use crate::value::{Fields, Value};

use super::cache::DocumentCache;

/// Conditional include: children are expanded when the value is truthy
pub const TAG_YES: &str = "yes";
/// Conditional exclude: children are expanded when the value is falsy
pub const TAG_NO: &str = "no";
/// Loop over a list or set
pub const TAG_FOR: &str = "for";
/// Sub-template include
pub const TAG_INCLUDE: &str = "include";

/// Attribute read by every control tag
pub const VALUE_ATTR: &str = "value";

/// Nesting limit for `include`; deeper chains fail with
/// [`TemplateError::IncludeDepth`]
pub const MAX_INCLUDE_DEPTH: usize = 64;

/// Writes expanded nodes into an output [`Document`]
pub struct Expander<'a> {
    cache: &'a DocumentCache,
    out: &'a mut Document,
    depth: usize,
}

impl<'a> Expander<'a> {
    pub fn new(cache: &'a DocumentCache, out: &'a mut Document) -> Self {
        Self {
            cache,
            out,
            depth: 0,
        }
    }

    /// Expand every child of `node` (from `input`) into `parent` in the
    /// output document.
    ///
    /// `source_path` is the file `input` was loaded from; includes resolve
    /// relative to its directory. Expression failures are soft and render as
    /// empty, and an include whose value is not a string is skipped. A missing
    /// or unreadable include, or one nested past [`MAX_INCLUDE_DEPTH`], aborts
    /// with an error.
    pub fn expand(
        &mut self,
        source_path: &Path,
        parent: NodeId,
        input: &Document,
        node: NodeId,
        ctx: &Context,
    ) -> Result<(), TemplateError> {
        for &child in input.children(node) {
            match input.kind(child) {
                NodeKind::Element(element) => match element.tag.as_str() {
                    TAG_YES => {
                        let enabled = control_value(element, ctx).is_none_or(|v| v.is_truthy());
                        if enabled {
                            self.expand(source_path, parent, input, child, ctx)?;
                        }
                    }
                    TAG_NO => {
                        let enabled = control_value(element, ctx).is_none_or(|v| v.is_truthy());
                        if !enabled {
                            self.expand(source_path, parent, input, child, ctx)?;
                        }
                    }
                    TAG_FOR => self.expand_for(source_path, parent, input, child, element, ctx)?,
                    TAG_INCLUDE => self.expand_include(source_path, parent, element, ctx)?,
                    _ => self.expand_element(source_path, parent, input, child, element, ctx)?,
                },
                NodeKind::Text(text) => {
                    let rendered = fstr(text, ctx).render();
                    if !rendered.is_empty() {
                        self.out.append_text(parent, &rendered);
                    }
                }
                NodeKind::Document => {}
            }
        }
        Ok(())
    }

    fn expand_for(
        &mut self,
        source_path: &Path,
        parent: NodeId,
        input: &Document,
        node: NodeId,
        element: &Element,
        ctx: &Context,
    ) -> Result<(), TemplateError> {
        let Some(collection) = control_value(element, ctx) else {
            return Ok(());
        };
        let Some(items) = collection.as_items() else {
            return Ok(());
        };
        for (index, item) in items.iter().enumerate() {
            let mut bindings: Fields = item.fields();
            bindings.push(("i".to_string(), Value::from(index)));
            bindings.push(("item".to_string(), item.clone()));
            bindings.push(("items".to_string(), collection.clone()));
            let scope = ctx.extend(bindings);
            self.expand(source_path, parent, input, node, &scope)?;
        }
        Ok(())
    }

    fn expand_include(
        &mut self,
        source_path: &Path,
        parent: NodeId,
        element: &Element,
        ctx: &Context,
    ) -> Result<(), TemplateError> {
        let value = match element.attribute(VALUE_ATTR) {
            Some(Some(raw)) if !raw.is_empty() => fstr(raw, ctx),
            _ => Value::Null,
        };
        let name = match value {
            Value::Str(name) => name,
            other => {
                warn!(
                    source = %source_path.display(),
                    value_type = other.type_name(),
                    "Include skipped: value is not a template name"
                );
                return Ok(());
            }
        };

        if self.depth >= MAX_INCLUDE_DEPTH {
            warn!(
                source = %source_path.display(),
                include = %name,
                max_depth = MAX_INCLUDE_DEPTH,
                "Include depth exceeded"
            );
            return Err(TemplateError::IncludeDepth {
                path: source_path.to_path_buf(),
            });
        }

        let (path, document) = self.cache.resolve(source_path, &name)?;

        let overlay: Fields = element
            .attrs
            .iter()
            .filter(|(attr, _)| attr != VALUE_ATTR)
            .map(|(attr, raw)| {
                let value = match raw {
                    Some(raw) if !raw.is_empty() => fstr(raw, ctx),
                    Some(raw) => Value::Str(raw.clone()),
                    None => Value::Null,
                };
                (attr.clone(), value)
            })
            .collect();
        let scope = ctx.extend(overlay);
        self.depth += 1;
        let result = self.expand(&path, parent, &document, document.root(), &scope);
        self.depth -= 1;
        result
    }

    fn expand_element(
        &mut self,
        source_path: &Path,
        parent: NodeId,
        input: &Document,
        node: NodeId,
        element: &Element,
        ctx: &Context,
    ) -> Result<(), TemplateError> {
        let output = self.out.create_element(&element.tag);
        for (attr, raw) in &element.attrs {
            match raw {
                Some(raw) if !raw.is_empty() => match fstr(raw, ctx) {
                    Value::Str(text) => self.out.set_attribute(output, attr, Some(text)),
                    Value::Bool(true) => self.out.set_attribute(output, attr, None),
                    value if value.is_truthy() => {
                        self.out.set_attribute(output, attr, Some(value.render()));
                    }
                    _ => {}
                },
                unevaluated => self.out.set_attribute(output, attr, unevaluated.clone()),
            }
        }
        self.expand(source_path, output, input, node, ctx)?;
        self.out.append_child(parent, output);
        Ok(())
    }
}

/// Value of a control tag's `value` attribute.
///
/// The attribute is run through `fstr`; a string result names a binding and is
/// looked up again (unbound names give null). `None` means the attribute is
/// absent or empty.
fn control_value(element: &Element, ctx: &Context) -> Option<Value> {
    let raw = element.attribute(VALUE_ATTR)?.as_deref()?;
    if raw.is_empty() {
        return None;
    }
    Some(match fstr(raw, ctx) {
        Value::Str(name) => ctx.get(&name).cloned().unwrap_or_default(),
        other => other,
    })
}
