use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::hot_reload::watch_if_enabled;
use crate::router::RouteTable;
use crate::runtime_config::RuntimeConfig;
use crate::template::{Renderer, RequestState};
use crate::value::Value;

/// Command-line interface for keml
///
/// Renders templates and exercises route tables from the shell.
#[derive(Parser)]
#[command(name = "keml")]
#[command(about = "Render keml templates and inspect route tables", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Render a template to stdout
    Render {
        /// Template name, without the `.html` extension
        name: String,

        /// Template directory (defaults to KEML_TEMPLATE_DIR, then `templates`)
        #[arg(short, long)]
        templates: Option<PathBuf>,

        /// JSON object whose keys become template bindings
        #[arg(short, long)]
        context: Option<PathBuf>,

        /// YAML route table used by `url()` and `--path`
        #[arg(short, long)]
        routes: Option<PathBuf>,

        /// Request path to match; sets `active_route` and binds the captures
        #[arg(short, long)]
        path: Option<String>,

        /// Client timezone offset in minutes, as `Date.getTimezoneOffset()` reports it
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        tz_offset: i32,
    },
    /// Match a request path against a route table
    Match {
        /// YAML route table
        #[arg(short, long)]
        routes: PathBuf,

        /// Request path
        path: String,
    },
    /// Generate the URL of a named route
    Url {
        /// YAML route table
        #[arg(short, long)]
        routes: PathBuf,

        /// Route name
        name: String,

        /// Parameters as `key=value`; unknown keys become the query string
        params: Vec<String>,
    },
    /// List the routes of a route table in match order
    Routes {
        /// YAML route table
        #[arg(short, long)]
        routes: PathBuf,
    },
}

fn load_routes(path: &Path) -> Result<RouteTable> {
    RouteTable::from_yaml_file(path)
        .with_context(|| format!("Failed to load routes from {}", path.display()))
}

fn load_bindings(path: &Path) -> Result<Vec<(String, Value)>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read context {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&source)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    match json {
        serde_json::Value::Object(map) => {
            Ok(map.into_iter().map(|(k, v)| (k, v.into())).collect())
        }
        _ => bail!("context {} must be a JSON object", path.display()),
    }
}

fn parse_param(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("parameter '{raw}' must be key=value"))?;
    if key.is_empty() {
        bail!("parameter '{raw}' has an empty key");
    }
    Ok((key.to_string(), Value::from(value)))
}

/// Execute `cli`, writing command output to `out`
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    match &cli.command {
        Commands::Render {
            name,
            templates,
            context,
            routes,
            path,
            tz_offset,
        } => {
            let config = RuntimeConfig::from_env();
            let table = match routes {
                Some(routes) => load_routes(routes)?,
                None => RouteTable::default(),
            };
            let bindings = match context {
                Some(context) => load_bindings(context)?,
                None => Vec::new(),
            };
            let renderer = match templates {
                Some(dir) => {
                    Renderer::new(dir, table).with_datetime_format(&config.datetime_format)
                }
                None => Renderer::from_config(&config, table),
            };
            let _watcher = watch_if_enabled(&config, &renderer)
                .context("Failed to start template watcher")?;

            let state = match path {
                Some(path) => match renderer.routes().match_path(path) {
                    Some(matched) => RequestState::from_match(&matched),
                    None => bail!("no route matches '{path}'"),
                },
                None => RequestState::new(),
            }
            .with_tz_offset(*tz_offset);

            let html = renderer
                .render(name, &state, bindings)
                .with_context(|| format!("Failed to render template '{name}'"))?;
            info!(template = %name, bytes = html.len(), "Rendered template");
            writeln!(out, "{html}")?;
            Ok(())
        }
        Commands::Match { routes, path } => {
            let table = load_routes(routes)?;
            let Some(matched) = table.match_path(path) else {
                bail!("no route matches '{path}'");
            };
            let params: serde_json::Map<String, serde_json::Value> = matched
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), json!(v)))
                .collect();
            let result = json!({ "route": matched.name.as_ref(), "params": params });
            writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
            Ok(())
        }
        Commands::Url {
            routes,
            name,
            params,
        } => {
            let table = load_routes(routes)?;
            let kwargs = params
                .iter()
                .map(|raw| parse_param(raw))
                .collect::<Result<Vec<_>>>()?;
            let Some(url) = table.url(name, &kwargs) else {
                bail!("unknown route '{name}'");
            };
            writeln!(out, "{url}")?;
            Ok(())
        }
        Commands::Routes { routes } => {
            let table = load_routes(routes)?;
            for (name, path) in table.iter() {
                writeln!(out, "{name}\t{path}")?;
            }
            Ok(())
        }
    }
}

/// Parse process arguments and run against stdout
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&cli, &mut out)
}
