//! # CLI Module
//!
//! Command-line access to the renderer and the route table.
//!
//! ## Commands
//!
//! ### `render`
//!
//! Render a template to stdout:
//!
//! ```bash
//! keml render --templates views --context data.json index
//! ```
//!
//! Options:
//! - `--templates <DIR>` - Template directory (default: `KEML_TEMPLATE_DIR`, then `templates`)
//! - `--context <FILE>` - JSON object whose keys become bindings
//! - `--routes <FILE>` - YAML route table for `url()` and `--path`
//! - `--path <PATH>` - Request path; binds `active_route` and the route captures
//! - `--tz-offset <MINUTES>` - Client timezone offset used by `ftime()`
//!
//! ### `match`
//!
//! Print the route a path matches, with its captures, as JSON:
//!
//! ```bash
//! keml match --routes routes.yaml /article/hello
//! ```
//!
//! ### `url`
//!
//! Generate the URL of a named route:
//!
//! ```bash
//! keml url --routes routes.yaml article slug=hello page=2
//! ```
//!
//! ### `routes`
//!
//! List routes in match order:
//!
//! ```bash
//! keml routes --routes routes.yaml
//! ```
//!
//! ## Route files
//!
//! ```yaml
//! - name: home
//!   path: /
//! - name: article
//!   path: /article/{slug}
//! ```

mod commands;


pub use commands::{run, run_cli, Cli, Commands};
