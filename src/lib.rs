//! # keml
//!
//! **keml** renders HTML-like template files whose text and attribute values
//! embed `{ expression }` runs, and maps request paths to named routes.
//!
//! ## Overview
//!
//! A render starts from a named route match: the matched route's captures,
//! the signed-in user and a set of builtin helpers become the root
//! [`Context`]. The template is loaded from disk, parsed into a small
//! arena-backed DOM and cached by path and modification time. Expansion then
//! walks the parsed tree, evaluates every embedded expression, applies the
//! four control tags (`yes`, `no`, `for`, `include`) and serializes the
//! result.
//!
//! ## Architecture
//!
//! - **[`segments`]** - splits `"a {b} c"` into alternating literal/expression runs
//! - **[`expr`]** - expression parser and interpreter
//! - **[`value`]** - dynamic values, records and callables
//! - **[`context`]** - immutable layered name bindings
//! - **[`dom`]** - arena DOM, lenient HTML parser and serializer
//! - **[`template`]** - document cache, expander and renderer
//! - **[`router`]** - named route table, path matching and URL generation
//! - **[`builtins`]** - helpers available to every template (`url`, `ftime`, `markdown`, ...)
//! - **[`hot_reload`]** - filesystem watcher that evicts changed templates
//! - **[`runtime_config`]** / **[`logging`]** - environment driven configuration
//! - **[`cli`]** - the `keml` command line tool
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keml::{Renderer, RequestState, Route, RouteTable, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let routes = RouteTable::new(vec![
//!     Route::new("home", "/"),
//!     Route::new("article", "/article/{slug}"),
//! ]);
//! let renderer = Renderer::new("templates", routes);
//!
//! let matched = renderer.routes().match_path("/article/hello").ok_or("no route")?;
//! let state = RequestState::from_match(&matched).with_tz_offset(-60);
//! let html = renderer.render("article", &state, [("title", Value::from("Hello"))])?;
//! println!("{html}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The library emits [`tracing`] events only. Binaries install a subscriber
//! with [`logging::init_logging`]; expression failures inside templates are
//! reported as `warn!` events and render as empty text.

pub mod builtins;
pub mod cli;
pub mod context;
pub mod dom;
pub mod error;
pub mod expr;
pub mod hot_reload;
pub mod logging;
pub mod router;
pub mod runtime_config;
pub mod segments;
pub mod template;
pub mod value;

pub use context::Context;
pub use error::{EvalError, RouteTableError, TemplateError};
pub use expr::fstr;
pub use router::{Route, RouteMatch, RouteTable};
pub use template::{DocumentCache, Renderer, RequestState};
pub use value::{Bindable, Value};
