//! Binding contexts.
//!
//! A [`Context`] is an immutable layer of `name -> value` bindings with an
//! optional parent. Extending a context creates a new layer on top of a shared
//! parent, so loop bodies and includes never copy or mutate the outer scope.

use std::collections::HashMap;
use std::sync::Arc;

use crate::value::Value;

#[derive(Debug, Default)]
struct Layer {
    vars: HashMap<String, Value>,
    parent: Option<Arc<Layer>>,
}

/// Layered name -> value environment for one render
#[derive(Debug, Clone, Default)]
pub struct Context {
    layer: Arc<Layer>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Root context holding `bindings`; later duplicates win
    pub fn from_bindings<I, K>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::new().extend(bindings)
    }

    /// New context whose bindings shadow `self`; `self` is left untouched
    #[must_use]
    pub fn extend<I, K>(&self, bindings: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let vars: HashMap<String, Value> = bindings
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        if vars.is_empty() {
            return self.clone();
        }
        Self {
            layer: Arc::new(Layer {
                vars,
                parent: Some(Arc::clone(&self.layer)),
            }),
        }
    }

    /// Innermost binding for `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut layer = Some(&self.layer);
        while let Some(current) = layer {
            if let Some(v) = current.vars.get(name) {
                return Some(v);
            }
            layer = current.parent.as_ref();
        }
        None
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of layers, counting the root
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut layer = Some(&self.layer);
        while let Some(current) = layer {
            depth += 1;
            layer = current.parent.as_ref();
        }
        depth
    }
}
