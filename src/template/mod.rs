//! # Template Module
//!
//! Expands HTML-like template files into rendered HTML.
//!
//! ## Template syntax
//!
//! Text and attribute values may embed `{ expression }` runs, evaluated
//! against the render [`Context`](crate::context::Context). Four tags control
//! expansion and never appear in the output:
//!
//! | Tag | Behaviour |
//! |-----|-----------|
//! | `<yes value="...">` | expand children when the value is truthy (or `value` is absent) |
//! | `<no value="...">` | expand children when the value is falsy |
//! | `<for value="...">` | expand children once per list or set item, binding the item's fields plus `i`, `item` and `items` |
//! | `<include value="name" a="{x}">` | expand `name.html` from the current file's directory, binding the other attributes; skipped when the value is not a string |
//!
//! A control tag's `value` is first evaluated; when the result is a string it
//! names a binding, so `<for value="articles">` and `<for value="{articles}">`
//! are equivalent.
//!
//! Ordinary attributes are kept when their value evaluates to a string or to
//! anything truthy: `true` renders as a bare attribute, other values are
//! stringified, and falsy values drop the attribute.
//!
//! ## Example
//!
//! ```rust,no_run
//! use keml::router::RouteTable;
//! use keml::template::{Renderer, RequestState};
//! use keml::value::Value;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let renderer = Renderer::new("templates", RouteTable::default());
//! let html = renderer.render(
//!     "index",
//!     &RequestState::new(),
//!     [("items", Value::list(vec!["x", "y"]))],
//! )?;
//! println!("{html}");
//! # Ok(())
//! # }
//! ```

mod cache;
mod expand;
mod renderer;
#[cfg(test)]
mod tests;

pub use cache::{DocumentCache, TEMPLATE_EXTENSION};
pub use expand::{Expander, MAX_INCLUDE_DEPTH, TAG_FOR, TAG_INCLUDE, TAG_NO, TAG_YES, VALUE_ATTR};
pub use renderer::{Renderer, RequestState};
