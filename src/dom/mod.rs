//! # Mini-DOM
//!
//! A lightweight tree of document, element and text nodes used both for parsed
//! template sources and for rendered output.
//!
//! Nodes live in an arena owned by a [`Document`] and are addressed by
//! [`NodeId`]. Parent, child and sibling links are indices, so there are no
//! reference cycles and a node can only belong to the arena that created it.
//!
//! ## Serialization rules
//!
//! - Text collapses whitespace runs to a single space unless an ancestor is
//!   `pre`, `textarea`, `script` or `style`. Leading whitespace is dropped when
//!   the node has no previous sibling, trailing whitespace when it has no next
//!   sibling, and all-whitespace text renders as nothing.
//! - Attributes whose value is absent or blank render bare (`disabled`);
//!   others render as `name="trimmed value"`.
//! - Void elements (see [`VOID_ELEMENTS`]) have no closing tag.
//! - An `html` element directly under the document is prefixed with
//!   `<!DOCTYPE html>`.
//!
//! ```rust
//! use keml::dom::Document;
//!
//! let mut doc = Document::new();
//! let p = doc.create_element("p");
//! doc.set_attribute(p, "class", Some(" lead ".into()));
//! doc.append_text(p, "  hello   world  ");
//! doc.append_child(doc.root(), p);
//! assert_eq!(doc.to_html(), r#"<p class="lead">hello world</p>"#);
//! ```

mod core;
mod parser;

pub use self::core::{
    is_void, Document, Element, NodeId, NodeKind, PREFORMATTED_ELEMENTS, VOID_ELEMENTS,
};
pub use parser::parse_html;
