//! # Template Values
//!
//! [`Value`] is everything an expression can produce or a context can bind:
//! scalars, ordered sequences, sets, records with named fields and callables.
//!
//! Records replace runtime introspection: any type that wants to be bound as a
//! record (and have its fields spread into a `for` loop body) implements
//! [`Bindable`] and returns its fields in declaration order.
//!
//! ```rust
//! use keml::value::{Bindable, Fields, Value};
//!
//! struct Article {
//!     title: String,
//!     likes: i64,
//! }
//!
//! impl Bindable for Article {
//!     fn fields(&self) -> Fields {
//!         vec![
//!             ("title".into(), self.title.as_str().into()),
//!             ("likes".into(), self.likes.into()),
//!         ]
//!     }
//! }
//!
//! let v = Value::from_bindable(&Article { title: "Hi".into(), likes: 3 });
//! assert_eq!(v.field("likes"), Some(&Value::Int(3)));
//! ```

use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use crate::error::EvalError;

/// Ordered `name -> value` pairs of a record
pub type Fields = Vec<(String, Value)>;

/// Capability of exposing named fields to templates
pub trait Bindable {
    /// Fields in a stable order
    fn fields(&self) -> Fields;
}

/// Record value with ordered, named fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Fields,
}

impl Record {
    #[must_use]
    pub fn new(fields: Fields) -> Self {
        Self { fields }
    }

    /// Field lookup; the last field with a given name wins
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Arguments passed to a [`Callable`]
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub positional: SmallVec<[Value; 4]>,
    pub keywords: SmallVec<[(String, Value); 4]>,
}

impl CallArgs {
    /// Positional argument `index`, falling back to keyword `name`
    #[must_use]
    pub fn get(&self, index: usize, name: &str) -> Option<&Value> {
        self.positional.get(index).or_else(|| self.keyword(name))
    }

    #[must_use]
    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keywords
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

type CallFn = dyn Fn(&CallArgs) -> Result<Value, EvalError> + Send + Sync;

/// Named function value that expressions may call
#[derive(Clone)]
pub struct Callable {
    name: Arc<str>,
    func: Arc<CallFn>,
}

impl Callable {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&CallArgs) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            func: Arc::new(func),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &CallArgs) -> Result<Value, EvalError> {
        (self.func)(args)
    }

    /// Wrap a failure message as an [`EvalError::Call`] for this callable
    pub fn fail(&self, message: impl Into<String>) -> EvalError {
        EvalError::Call {
            callable: self.name.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self.name)
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

/// Dynamic value bound in a context or produced by an expression
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Arc<Vec<Value>>),
    /// Insertion-ordered collection without duplicates
    Set(Arc<Vec<Value>>),
    Record(Arc<Record>),
    Callable(Callable),
}

impl Value {
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build a set, dropping later duplicates
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let mut out: Vec<Value> = Vec::new();
        for item in items {
            let item = item.into();
            if !out.contains(&item) {
                out.push(item);
            }
        }
        Value::Set(Arc::new(out))
    }

    #[must_use]
    pub fn record(fields: Fields) -> Self {
        Value::Record(Arc::new(Record::new(fields)))
    }

    pub fn from_bindable<T: Bindable + ?Sized>(item: &T) -> Self {
        Value::record(item.fields())
    }

    pub fn callable<F>(name: &str, func: F) -> Self
    where
        F: Fn(&CallArgs) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Value::Callable(Callable::new(name, func))
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Record(_) => "record",
            Value::Callable(_) => "callable",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used by `yes`/`no`, `and`/`or` and attribute emission
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Set(items) => !items.is_empty(),
            Value::Record(r) => !r.is_empty(),
            Value::Callable(_) => true,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Items of a list or set; `None` for every other kind
    #[must_use]
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Set(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(r) => r.get(name),
            _ => None,
        }
    }

    /// Named fields spread into a loop body; empty for non-records
    #[must_use]
    pub fn fields(&self) -> Fields {
        match self {
            Value::Record(r) => r
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Output form: null renders as the empty string
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    fn write_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Str(s) => write!(f, "{s:?}"),
            other => fmt::Display::fmt(other, f),
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        write!(f, "{value:.1}")
    } else {
        write!(f, "{value}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write_float(f, *v),
            Value::Str(s) => f.write_str(s),
            Value::List(items) | Value::Set(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_repr(f)?;
                }
                f.write_str("]")
            }
            Value::Record(r) => {
                f.write_str("{")?;
                for (i, (k, v)) in r.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: ")?;
                    v.write_repr(f)?;
                }
                f.write_str("}")
            }
            Value::Callable(c) => write!(f, "<callable {}>", c.name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a.len() == b.len() && a.iter().all(|x| b.contains(x)),
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl Value {
    /// Numeric view of ints and floats only (booleans are not numbers here)
    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        i64::try_from(v).map_or(Value::Float(v as f64), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v)
    }
}

impl From<Callable> for Value {
    fn from(v: Callable) -> Self {
        Value::Callable(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::list(items),
            serde_json::Value::Object(map) => {
                Value::record(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
