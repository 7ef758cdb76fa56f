//! # Template Builtins
//!
//! Callables injected into every render context by the
//! [`Renderer`](crate::template::Renderer). Expressions have no other ambient
//! functions; anything else must be bound explicitly.
//!
//! | Name | Call | Result |
//! |------|------|--------|
//! | `ceil` | `ceil(x)` | smallest integer `>= x` |
//! | `len` | `len(x)` | length of a string, list, set or record |
//! | `markdown` | `markdown(text)` | HTML rendered from Markdown |
//! | `url` | `url(route, **params)` | URL of a named route, null for unknown routes |
//! | `ftime` | `ftime(timestamp, format=None)` | Unix seconds formatted in the request's timezone |
//! | `gravatar` | `gravatar(email, size=100)` | Gravatar image URL |

use chrono::{DateTime, FixedOffset};
use pulldown_cmark::{html, Options, Parser};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::EvalError;
use crate::router::{RouteTable, RouteTemplate};
use crate::value::{CallArgs, Value};

/// Default `ftime` format: the locale's date and time representation
pub const DEFAULT_DATETIME_FORMAT: &str = "%c";

/// Default `gravatar` image size in pixels
pub const DEFAULT_GRAVATAR_SIZE: i64 = 100;

const GRAVATAR_TEMPLATE: &str = "https://www.gravatar.com/avatar/{hash}";

fn fail(callable: &str, message: impl Into<String>) -> EvalError {
    EvalError::Call {
        callable: callable.to_string(),
        message: message.into(),
    }
}

fn required<'a>(
    args: &'a CallArgs,
    callable: &str,
    index: usize,
    name: &str,
) -> Result<&'a Value, EvalError> {
    args.get(index, name)
        .ok_or_else(|| fail(callable, format!("missing argument '{name}'")))
}

/// `ceil(x)`
#[must_use]
pub fn ceil() -> Value {
    Value::callable("ceil", |args| match required(args, "ceil", 0, "x")? {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.ceil() as i64)),
        other => Err(fail(
            "ceil",
            format!("expected a number, got {}", other.type_name()),
        )),
    })
}

/// `len(x)`
#[must_use]
pub fn len() -> Value {
    Value::callable("len", |args| {
        let value = required(args, "len", 0, "x")?;
        let length = match value {
            Value::Str(s) => s.chars().count(),
            Value::List(items) | Value::Set(items) => items.len(),
            Value::Record(record) => record.len(),
            other => {
                return Err(fail(
                    "len",
                    format!("'{}' value has no length", other.type_name()),
                ))
            }
        };
        Ok(Value::from(length))
    })
}

/// Render Markdown to HTML
#[must_use]
pub fn render_markdown(text: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(text, options);
    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

/// `markdown(text)`; null renders as empty
#[must_use]
pub fn markdown() -> Value {
    Value::callable("markdown", |args| {
        match args.get(0, "text").unwrap_or(&Value::Null) {
            Value::Null => Ok(Value::Str(String::new())),
            Value::Str(text) => Ok(Value::Str(render_markdown(text))),
            other => Err(fail(
                "markdown",
                format!("expected a string, got {}", other.type_name()),
            )),
        }
    })
}

/// `url(route, **params)` bound to `routes`
#[must_use]
pub fn url(routes: Arc<RouteTable>) -> Value {
    Value::callable("url", move |args| {
        let name = required(args, "url", 0, "route")?;
        let Some(name) = name.as_str() else {
            return Err(fail("url", "route name must be a string"));
        };
        let kwargs: Vec<(String, Value)> = args
            .keywords
            .iter()
            .filter(|(key, _)| key != "route")
            .cloned()
            .collect();
        Ok(routes.url(name, &kwargs).into())
    })
}

/// Format Unix `timestamp` seconds for a client whose timezone offset is
/// `tz_offset_minutes`, as reported by `Date.getTimezoneOffset()` (minutes
/// *behind* UTC, so UTC+2 is `-120`).
pub fn format_timestamp(
    timestamp: i64,
    tz_offset_minutes: i32,
    format: &str,
) -> Result<String, EvalError> {
    let offset = tz_offset_minutes
        .checked_mul(-60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| fail("ftime", format!("invalid timezone offset {tz_offset_minutes}")))?;
    let time = DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| fail("ftime", format!("timestamp {timestamp} out of range")))?
        .with_timezone(&offset);
    let mut output = String::new();
    write!(output, "{}", time.format(format))
        .map_err(|_| fail("ftime", format!("invalid format '{format}'")))?;
    Ok(output)
}

/// `ftime(timestamp, format=None)` bound to a request timezone and default format
#[must_use]
pub fn ftime(tz_offset_minutes: i32, default_format: &str) -> Value {
    let default_format = default_format.to_string();
    Value::callable("ftime", move |args| {
        let timestamp = match required(args, "ftime", 0, "time")? {
            Value::Int(i) => *i,
            Value::Float(f) if f.is_finite() => f.floor() as i64,
            other => {
                return Err(fail(
                    "ftime",
                    format!("expected a timestamp, got {}", other.type_name()),
                ))
            }
        };
        let format = match args.get(1, "format") {
            Some(Value::Str(f)) if !f.is_empty() => f.as_str(),
            _ => default_format.as_str(),
        };
        format_timestamp(timestamp, tz_offset_minutes, format).map(Value::Str)
    })
}

/// Gravatar URL for `email`: SHA-256 of the trimmed, lowercased address
#[must_use]
pub fn gravatar_url(email: &str, size: i64) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    let hash: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    RouteTemplate::new(GRAVATAR_TEMPLATE).generate(&[
        ("hash".to_string(), Value::Str(hash)),
        ("s".to_string(), Value::Int(size)),
    ])
}

/// `gravatar(email, size=100)`
#[must_use]
pub fn gravatar() -> Value {
    Value::callable("gravatar", |args| {
        let Some(email) = required(args, "gravatar", 0, "email")?.as_str() else {
            return Err(fail("gravatar", "email must be a string"));
        };
        let size = match args.get(1, "size") {
            None | Some(Value::Null) => DEFAULT_GRAVATAR_SIZE,
            Some(value) => value
                .as_i64()
                .ok_or_else(|| fail("gravatar", "size must be an integer"))?,
        };
        Ok(Value::Str(gravatar_url(email, size)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Route;

    fn call(
        callable: &Value,
        positional: Vec<Value>,
        keywords: Vec<(&str, Value)>,
    ) -> Result<Value, EvalError> {
        let Value::Callable(c) = callable else {
            panic!("not a callable");
        };
        c.call(&CallArgs {
            positional: positional.into_iter().collect(),
            keywords: keywords
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        })
    }

    #[test]
    fn test_ceil() {
        assert_eq!(call(&ceil(), vec![Value::Float(2.1)], vec![]), Ok(Value::Int(3)));
        assert_eq!(call(&ceil(), vec![Value::Float(-2.5)], vec![]), Ok(Value::Int(-2)));
        assert_eq!(call(&ceil(), vec![Value::Int(4)], vec![]), Ok(Value::Int(4)));
        assert!(call(&ceil(), vec![Value::from("x")], vec![]).is_err());
        assert!(call(&ceil(), vec![], vec![]).is_err());
    }

    #[test]
    fn test_len() {
        assert_eq!(call(&len(), vec![Value::from("héllo")], vec![]), Ok(Value::Int(5)));
        assert_eq!(
            call(&len(), vec![Value::list(vec![1, 2, 3])], vec![]),
            Ok(Value::Int(3))
        );
        assert!(call(&len(), vec![Value::Int(3)], vec![]).is_err());
    }

    #[test]
    fn test_markdown() {
        let html = call(&markdown(), vec![Value::from("# Title\n\n*hi*")], vec![]).unwrap();
        assert_eq!(html, Value::from("<h1>Title</h1>\n<p><em>hi</em></p>\n"));
        assert_eq!(call(&markdown(), vec![Value::Null], vec![]), Ok(Value::from("")));
    }

    #[test]
    fn test_url() {
        let routes = Arc::new(RouteTable::new(vec![
            Route::new("home", "/"),
            Route::new("profile", "/profile/{username}"),
        ]));
        let url = url(routes);
        assert_eq!(
            call(&url, vec![Value::from("profile")], vec![("username", Value::from("ann"))]),
            Ok(Value::from("/profile/ann"))
        );
        assert_eq!(
            call(&url, vec![Value::from("home")], vec![("page", Value::Int(2))]),
            Ok(Value::from("/?page=2"))
        );
        assert_eq!(call(&url, vec![Value::from("nope")], vec![]), Ok(Value::Null));
    }

    #[test]
    fn test_format_timestamp_applies_offset() {
        assert_eq!(
            format_timestamp(0, 0, "%Y-%m-%d %H:%M").unwrap(),
            "1970-01-01 00:00"
        );
        // UTC+2 reports an offset of -120
        assert_eq!(
            format_timestamp(0, -120, "%Y-%m-%d %H:%M").unwrap(),
            "1970-01-01 02:00"
        );
        assert_eq!(
            format_timestamp(0, 300, "%Y-%m-%d %H:%M").unwrap(),
            "1969-12-31 19:00"
        );
    }

    #[test]
    fn test_ftime_default_and_explicit_format() {
        let ftime = ftime(0, "%d/%m/%Y");
        assert_eq!(
            call(&ftime, vec![Value::Int(86_400)], vec![]),
            Ok(Value::from("02/01/1970"))
        );
        assert_eq!(
            call(&ftime, vec![Value::Int(86_400)], vec![("format", Value::from("%Y"))]),
            Ok(Value::from("1970"))
        );
        assert!(call(&ftime, vec![Value::from("soon")], vec![]).is_err());
    }

    #[test]
    fn test_gravatar_url() {
        let url = gravatar_url("  Ann@Example.com ", 80);
        let expected_hash: String = Sha256::digest(b"ann@example.com")
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        assert_eq!(
            url,
            format!("https://www.gravatar.com/avatar/{expected_hash}?s=80")
        );
        assert_eq!(
            call(&gravatar(), vec![Value::from("ann@example.com")], vec![]),
            Ok(Value::Str(gravatar_url("ann@example.com", 100)))
        );
    }
}
