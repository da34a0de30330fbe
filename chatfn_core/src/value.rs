//! Parsed argument values and their conversion into native Rust types.

use std::{
    collections::{BTreeMap, HashMap},
    hash::{BuildHasher, Hash},
};

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ToolError;

/// A JSON value that has been checked against a [`TypeDescriptor`](crate::schema::TypeDescriptor).
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Bool(bool),
    Integer(i64),
    /// Integers above `i64::MAX`.
    Unsigned(u64),
    Float(f64),
    String(String),
    Null,
    List(Vec<ArgValue>),
    Map(IndexMap<String, ArgValue>),
    Choice {
        type_name: String,
        member: String,
    },
    Record {
        type_name: String,
        fields: IndexMap<String, ArgValue>,
    },
}

impl ArgValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ArgValue::Bool(_) => "bool",
            ArgValue::Integer(_) | ArgValue::Unsigned(_) => "integer",
            ArgValue::Float(_) => "float",
            ArgValue::String(_) => "string",
            ArgValue::Null => "null",
            ArgValue::List(_) => "list",
            ArgValue::Map(_) => "map",
            ArgValue::Choice { .. } => "choice",
            ArgValue::Record { .. } => "record",
        }
    }

    /// Converts back to plain JSON. Choices become their member name.
    pub fn to_json(&self) -> Value {
        match self {
            ArgValue::Bool(b) => Value::Bool(*b),
            ArgValue::Integer(i) => Value::from(*i),
            ArgValue::Unsigned(u) => Value::from(*u),
            ArgValue::Float(f) => Value::from(*f),
            ArgValue::String(s) => Value::String(s.clone()),
            ArgValue::Null => Value::Null,
            ArgValue::List(items) => Value::Array(items.iter().map(ArgValue::to_json).collect()),
            ArgValue::Map(entries) | ArgValue::Record { fields: entries, .. } => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            ArgValue::Choice { member, .. } => Value::String(member.clone()),
        }
    }

    pub fn into_record(self, type_name: &str) -> Result<IndexMap<String, ArgValue>, ToolError> {
        match self {
            ArgValue::Record { type_name: t, fields } if t == type_name => Ok(fields),
            other => Err(mismatch(type_name, &other)),
        }
    }

    pub fn into_choice(self, type_name: &str) -> Result<String, ToolError> {
        match self {
            ArgValue::Choice { type_name: t, member } if t == type_name => Ok(member),
            other => Err(mismatch(type_name, &other)),
        }
    }
}

fn mismatch(expected: &str, found: &ArgValue) -> ToolError {
    ToolError::ArgumentConversion {
        expected: expected.to_string(),
        found: found.kind().to_string(),
    }
}

/// Removes `name` from a parsed record and converts it.
///
/// An absent field converts from `Null`, so only `Option` fields tolerate it.
pub fn take_field<T: FromArgValue>(
    fields: &mut IndexMap<String, ArgValue>,
    name: &str,
) -> Result<T, ToolError> {
    T::from_arg_value(fields.shift_remove(name).unwrap_or(ArgValue::Null))
}

/// Conversion from a parsed [`ArgValue`] into a native type.
pub trait FromArgValue: Sized {
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError>;
}

impl FromArgValue for ArgValue {
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
        Ok(value)
    }
}

impl FromArgValue for Value {
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
        Ok(value.to_json())
    }
}

impl FromArgValue for bool {
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
        match value {
            ArgValue::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

macro_rules! int {
    ($($ty:ty),+) => {
        $(
            impl FromArgValue for $ty {
                fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
                    match value {
                        ArgValue::Integer(i) => <$ty>::try_from(i).map_err(|_| ToolError::ArgumentConversion {
                            expected: stringify!($ty).to_string(),
                            found: i.to_string(),
                        }),
                        ArgValue::Unsigned(u) => <$ty>::try_from(u).map_err(|_| ToolError::ArgumentConversion {
                            expected: stringify!($ty).to_string(),
                            found: u.to_string(),
                        }),
                        other => Err(mismatch(stringify!($ty), &other)),
                    }
                }
            }
        )+
    };
}

int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromArgValue for f64 {
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
        match value {
            ArgValue::Float(f) => Ok(f),
            ArgValue::Integer(i) => Ok(i as f64),
            ArgValue::Unsigned(u) => Ok(u as f64),
            other => Err(mismatch("f64", &other)),
        }
    }
}

impl FromArgValue for f32 {
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
        f64::from_arg_value(value).map(|f| f as f32)
    }
}

impl FromArgValue for String {
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
        match value {
            ArgValue::String(s) => Ok(s),
            other => Err(mismatch("String", &other)),
        }
    }
}

impl FromArgValue for () {
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
        match value {
            ArgValue::Null => Ok(()),
            other => Err(mismatch("()", &other)),
        }
    }
}

impl<T: FromArgValue> FromArgValue for Option<T> {
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
        match value {
            ArgValue::Null => Ok(None),
            other => T::from_arg_value(other).map(Some),
        }
    }
}

impl<T: FromArgValue> FromArgValue for Box<T> {
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
        T::from_arg_value(value).map(Box::new)
    }
}

impl<T: FromArgValue> FromArgValue for Vec<T> {
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
        match value {
            ArgValue::List(items) => items.into_iter().map(T::from_arg_value).collect(),
            other => Err(mismatch("Vec", &other)),
        }
    }
}

fn map_entries<K, V, C>(value: ArgValue) -> Result<C, ToolError>
where
    K: FromArgValue,
    V: FromArgValue,
    C: FromIterator<(K, V)>,
{
    match value {
        ArgValue::Map(entries) => entries
            .into_iter()
            .map(|(k, v)| -> Result<(K, V), ToolError> {
                Ok((K::from_arg_value(ArgValue::String(k))?, V::from_arg_value(v)?))
            })
            .collect(),
        other => Err(mismatch("map", &other)),
    }
}

impl<K, V, S> FromArgValue for HashMap<K, V, S>
where
    K: FromArgValue + Eq + Hash,
    V: FromArgValue,
    S: BuildHasher + Default,
{
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
        map_entries(value)
    }
}

impl<K: FromArgValue + Ord, V: FromArgValue> FromArgValue for BTreeMap<K, V> {
    fn from_arg_value(value: ArgValue) -> Result<Self, ToolError> {
        map_entries(value)
    }
}
