//! Typed values and resolved keyword sets.
//!
//! Every descriptor cast produces a [`Value`]. Producers, processors and
//! command bodies receive their inputs as [`Args`], a name-ordered keyword
//! set with typed getters:
//!
//! ```rust
//! use roost_dispatch::{Args, Value};
//!
//! let mut args = Args::new();
//! args.insert("port", Value::Int(5432));
//! args.insert("host", "localhost");
//!
//! let port: i64 = args.get("port")?;
//! let host: String = args.get("host")?;
//! assert_eq!((port, host.as_str()), (5432, "localhost"));
//! # Ok::<(), roost_dispatch::ValueError>(())
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;
use uuid::Uuid;

/// Format used when rendering naive datetimes back to a token.
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Format used when rendering dates back to a token.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// A typed argument value.
#[derive(Clone)]
pub enum Value {
    /// Absence of a value (`None` default).
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Path(PathBuf),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// A datetime that carried an explicit UTC offset.
    ZonedDateTime(DateTime<FixedOffset>),
    Uuid(Uuid),
    /// A JSON object.
    Dict(serde_json::Map<String, serde_json::Value>),
    List(Vec<Value>),
    /// Opaque value returned by a derived producer.
    Any(Rc<dyn Any>),
}

impl Value {
    /// Wraps an arbitrary value, typically the result of a derived producer.
    pub fn any<T: 'static>(value: T) -> Self {
        Value::Any(Rc::new(value))
    }

    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Short name of the variant, used in type mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Path(_) => "path",
            Value::Date(_) => "date",
            Value::DateTime(_) | Value::ZonedDateTime(_) => "datetime",
            Value::Uuid(_) => "uuid",
            Value::Dict(_) => "dict",
            Value::List(_) => "list",
            Value::Any(_) => "opaque",
        }
    }

    /// Renders the value as a command-line token.
    ///
    /// Casting the returned token with the descriptor type that produced the
    /// value yields an equal value for scalar types and JSON objects. Lists
    /// render their items separated by spaces.
    pub fn to_token(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.clone(),
            Value::Path(p) => p.display().to_string(),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
            Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            Value::ZonedDateTime(dt) => dt.to_rfc3339(),
            Value::Uuid(u) => u.hyphenated().to_string(),
            Value::Dict(map) => serde_json::Value::Object(map.clone()).to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::to_token)
                .collect::<Vec<_>>()
                .join(" "),
            Value::Any(_) => "<opaque>".to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            other => write!(f, "{}", other.to_token()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Path(p) => f.debug_tuple("Path").field(p).finish(),
            Value::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Value::DateTime(dt) => f.debug_tuple("DateTime").field(dt).finish(),
            Value::ZonedDateTime(dt) => f.debug_tuple("ZonedDateTime").field(dt).finish(),
            Value::Uuid(u) => f.debug_tuple("Uuid").field(u).finish(),
            Value::Dict(m) => f.debug_tuple("Dict").field(m).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Any(_) => write!(f, "Any(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Path(a), Value::Path(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::ZonedDateTime(a), Value::ZonedDateTime(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Any(a), Value::Any(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Dict(map) => map.serialize(serializer),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            other => serializer.serialize_str(&other.to_token()),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i64 => Int,
    i32 => Int,
    u32 => Int,
    u16 => Int,
    f64 => Float,
    String => Str,
    &str => Str,
    PathBuf => Path,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => ZonedDateTime,
    Uuid => Uuid,
    serde_json::Map<String, serde_json::Value> => Dict,
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Conversion from a resolved [`Value`] into a concrete Rust type.
pub trait FromValue: Sized {
    /// Name of the expected type, used in error messages.
    fn expected() -> &'static str;

    /// Returns `None` when the value has the wrong shape.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($ty:ty, $expected:literal, |$v:ident| $body:expr) => {
        impl FromValue for $ty {
            fn expected() -> &'static str {
                $expected
            }

            fn from_value($v: &Value) -> Option<Self> {
                $body
            }
        }
    };
}

impl_from_value!(bool, "bool", |v| v.as_bool());
impl_from_value!(i64, "int", |v| v.as_int());
impl_from_value!(i32, "int", |v| v.as_int().and_then(|i| i32::try_from(i).ok()));
impl_from_value!(u16, "int", |v| v.as_int().and_then(|i| u16::try_from(i).ok()));
impl_from_value!(u32, "int", |v| v.as_int().and_then(|i| u32::try_from(i).ok()));
impl_from_value!(u64, "int", |v| v.as_int().and_then(|i| u64::try_from(i).ok()));
impl_from_value!(usize, "int", |v| v.as_int().and_then(|i| usize::try_from(i).ok()));
impl_from_value!(f64, "float", |v| match v {
    Value::Float(f) => Some(*f),
    Value::Int(i) => Some(*i as f64),
    _ => None,
});
impl_from_value!(String, "string", |v| v.as_str().map(String::from));
impl_from_value!(PathBuf, "path", |v| match v {
    Value::Path(p) => Some(p.clone()),
    Value::Str(s) => Some(PathBuf::from(s)),
    _ => None,
});
impl_from_value!(NaiveDate, "date", |v| match v {
    Value::Date(d) => Some(*d),
    _ => None,
});
impl_from_value!(NaiveDateTime, "datetime", |v| match v {
    Value::DateTime(dt) => Some(*dt),
    Value::ZonedDateTime(dt) => Some(dt.naive_local()),
    _ => None,
});
impl_from_value!(Uuid, "uuid", |v| match v {
    Value::Uuid(u) => Some(*u),
    _ => None,
});
impl_from_value!(serde_json::Map<String, serde_json::Value>, "dict", |v| match v {
    Value::Dict(m) => Some(m.clone()),
    _ => None,
});
impl_from_value!(Value, "value", |v| Some(v.clone()));

impl<T: FromValue> FromValue for Option<T> {
    fn expected() -> &'static str {
        T::expected()
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn expected() -> &'static str {
        "list"
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

/// Error returned by the typed getters on [`Args`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("no argument named '{0}'")]
    Missing(String),

    #[error("argument '{name}' is a {found}, expected {expected}")]
    WrongType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A resolved keyword set, in insertion order.
#[derive(Clone, Default, PartialEq)]
pub struct Args {
    entries: Vec<(String, Value)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing and returning any previous value of that name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Returns the raw value for `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns the value for `name` converted to `T`.
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T, ValueError> {
        let value = self
            .value(name)
            .ok_or_else(|| ValueError::Missing(name.to_string()))?;
        T::from_value(value).ok_or_else(|| ValueError::WrongType {
            name: name.to_string(),
            expected: T::expected(),
            found: value.type_name(),
        })
    }

    /// Retrieves an opaque value stored with [`Value::any`].
    pub fn downcast<T: 'static>(&self, name: &str) -> Result<Rc<T>, ValueError> {
        let value = self
            .value(name)
            .ok_or_else(|| ValueError::Missing(name.to_string()))?;
        let wrong_type = || ValueError::WrongType {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
            found: value.type_name(),
        };
        match value {
            Value::Any(any) => any.clone().downcast::<T>().map_err(|_| wrong_type()),
            _ => Err(wrong_type()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Copies entries from `other` whose names are not present yet.
    pub(crate) fn merge_under(&mut self, other: &Args) {
        for (name, value) in other.iter() {
            if !self.contains(name) {
                self.entries.push((name.to_string(), value.clone()));
            }
        }
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Serialize for Args {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = Args::new();
        for (name, value) in iter {
            args.insert(name, value);
        }
        args
    }
}
