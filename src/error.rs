//! Error types for expression evaluation and template loading.
//!
//! Two failure classes exist and they never mix:
//!
//! - [`EvalError`] is a *soft* failure local to one `{ ... }` expression. The
//!   segment evaluator logs it and substitutes null, so rendering continues.
//! - [`TemplateError`] is a *hard* failure (missing or unreadable template
//!   file, runaway include recursion) that aborts the whole render and is
//!   returned to the caller.
//!
//! [`RouteTableError`] covers loading route tables from disk.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failure while evaluating a single embedded expression
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The expression text does not match the grammar
    Syntax {
        /// Human readable reason
        message: String,
        /// Byte offset into the expression text
        position: usize,
    },
    /// Identifier is not bound in the context
    UnknownName(String),
    /// Attribute access on a record that has no such field
    UnknownField {
        /// Requested field
        field: String,
        /// Type of the value the field was looked up on
        type_name: &'static str,
    },
    /// Operator or builtin applied to unsupported operand types
    Type(String),
    /// `/`, `//` or `%` with a zero right-hand side
    DivisionByZero,
    /// List or string index outside the value's bounds
    IndexOutOfRange(i64),
    /// Call on a value that is not callable
    NotCallable(&'static str),
    /// A bound callable reported a failure
    Call {
        /// Name the callable was registered under
        callable: String,
        /// Failure reported by the callable
        message: String,
    },
}

impl EvalError {
    pub(crate) fn syntax(message: impl Into<String>, position: usize) -> Self {
        EvalError::Syntax {
            message: message.into(),
            position,
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        EvalError::Type(message.into())
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Syntax { message, position } => {
                write!(f, "syntax error at {position}: {message}")
            }
            EvalError::UnknownName(name) => write!(f, "name '{name}' is not defined"),
            EvalError::UnknownField { field, type_name } => {
                write!(f, "'{type_name}' value has no field '{field}'")
            }
            EvalError::Type(message) => write!(f, "type error: {message}"),
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::IndexOutOfRange(index) => write!(f, "index {index} out of range"),
            EvalError::NotCallable(type_name) => write!(f, "'{type_name}' value is not callable"),
            EvalError::Call { callable, message } => write!(f, "{callable}(): {message}"),
        }
    }
}

impl std::error::Error for EvalError {}

/// Failure that aborts a render
#[derive(Debug)]
pub enum TemplateError {
    /// The template file does not exist (or cannot be canonicalized)
    NotFound {
        /// Path that was looked up
        path: PathBuf,
        /// Underlying filesystem error
        source: io::Error,
    },
    /// The template file exists but could not be read
    Io {
        /// Canonical template path
        path: PathBuf,
        /// Underlying filesystem error
        source: io::Error,
    },
    /// A template name was blank
    InvalidName(String),
    /// Includes nested deeper than [`MAX_INCLUDE_DEPTH`](crate::template::MAX_INCLUDE_DEPTH)
    IncludeDepth {
        /// Template whose include exceeded the limit
        path: PathBuf,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::NotFound { path, source } => {
                write!(f, "template not found: {} ({source})", path.display())
            }
            TemplateError::Io { path, source } => {
                write!(f, "failed to read template {}: {source}", path.display())
            }
            TemplateError::InvalidName(name) => write!(f, "invalid template name '{name}'"),
            TemplateError::IncludeDepth { path } => {
                write!(f, "include depth exceeded in {}", path.display())
            }
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::NotFound { source, .. } | TemplateError::Io { source, .. } => {
                Some(source)
            }
            TemplateError::InvalidName(_) | TemplateError::IncludeDepth { .. } => None,
        }
    }
}

/// Failure while loading a route table
#[derive(Debug)]
pub enum RouteTableError {
    /// The route file could not be read
    Io {
        /// Route file path
        path: PathBuf,
        /// Underlying filesystem error
        source: io::Error,
    },
    /// The route file is not a YAML list of `{ name, path }` entries
    Yaml(serde_yaml::Error),
}

impl fmt::Display for RouteTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTableError::Io { path, source } => {
                write!(f, "failed to read routes {}: {source}", path.display())
            }
            RouteTableError::Yaml(err) => write!(f, "invalid route table: {err}"),
        }
    }
}

impl std::error::Error for RouteTableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteTableError::Io { source, .. } => Some(source),
            RouteTableError::Yaml(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for RouteTableError {
    fn from(err: serde_yaml::Error) -> Self {
        RouteTableError::Yaml(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_error_display() {
        assert_eq!(
            EvalError::UnknownName("user".into()).to_string(),
            "name 'user' is not defined"
        );
        assert_eq!(
            EvalError::Call {
                callable: "url".into(),
                message: "unknown route 'nope'".into()
            }
            .to_string(),
            "url(): unknown route 'nope'"
        );
    }

    #[test]
    fn test_template_error_exposes_source() {
        use std::error::Error;
        let err = TemplateError::NotFound {
            path: PathBuf::from("missing.html"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("missing.html"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_include_depth_display() {
        let err = TemplateError::IncludeDepth {
            path: PathBuf::from("/t/page.html"),
        };
        assert_eq!(err.to_string(), "include depth exceeded in /t/page.html");
    }
}
