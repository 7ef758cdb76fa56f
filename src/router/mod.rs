//! # Router Module
//!
//! Named path templates that both match incoming request paths and generate
//! URLs, using the same `{name}` segment grammar as template expressions.
//!
//! ## Overview
//!
//! - [`RouteTemplate`] parses one template and knows its capture names
//! - [`RouteTable`] holds routes in declaration order; the first structural
//!   match wins, so a catch-all such as `/{slug}` must come last
//! - [`RouteTable::url`] turns a route name plus keyword arguments back into
//!   a URL, sending unknown arguments to the query string
//!
//! ## Example
//!
//! ```rust
//! use keml::router::{Route, RouteTable};
//! use keml::value::Value;
//!
//! let table = RouteTable::new(vec![
//!     Route::new("home", "/"),
//!     Route::new("article", "/article/{slug}"),
//! ]);
//!
//! let m = table.match_path("/article/hello-world/").unwrap();
//! assert_eq!(m.name.as_ref(), "article");
//! assert_eq!(m.param("slug"), Some("hello-world"));
//!
//! let url = table.url(
//!     "article",
//!     &[
//!         ("slug".to_string(), Value::from("hi")),
//!         ("page".to_string(), Value::Int(2)),
//!     ],
//! );
//! assert_eq!(url.as_deref(), Some("/article/hi?page=2"));
//! ```

mod core;
mod pattern;

pub use self::core::{Route, RouteMatch, RouteTable};
pub use pattern::{generate, match_template, strip_path, ParamVec, RouteTemplate, MAX_INLINE_PARAMS};
