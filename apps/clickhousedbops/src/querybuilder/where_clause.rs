use std::fmt;

use super::{backtick, quote};

/// A value compared against a column in a `WHERE` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    String(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::String(s) => write!(f, "{}", quote(s)),
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::UInt(v) => write!(f, "{v}"),
            SqlValue::Float(v) => write!(f, "{v}"),
            SqlValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::String(value.clone())
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        SqlValue::UInt(value.into())
    }
}

impl From<u64> for SqlValue {
    fn from(value: u64) -> Self {
        SqlValue::UInt(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<uuid::Uuid> for SqlValue {
    fn from(value: uuid::Uuid) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Equals,
    Differs,
}

/// A single predicate. Several predicates on a `SELECT` are joined with `AND`.
#[derive(Debug, Clone, PartialEq)]
pub struct Where {
    field: String,
    value: SqlValue,
    operator: Operator,
}

impl Where {
    pub fn equals(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator: Operator::Equals,
        }
    }

    pub fn differs(field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator: Operator::Differs,
        }
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::equals(field, SqlValue::Null)
    }

    pub fn clause(&self) -> String {
        let field = backtick(&self.field);
        match (&self.value, self.operator) {
            (SqlValue::Null, Operator::Equals) => format!("{field} IS NULL"),
            (SqlValue::Null, Operator::Differs) => format!("{field} IS NOT NULL"),
            (value, Operator::Equals) => format!("{field} = {value}"),
            (value, Operator::Differs) => format!("{field} <> {value}"),
        }
    }
}
