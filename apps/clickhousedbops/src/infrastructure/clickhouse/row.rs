use serde_json::{Map, Value};

use super::errors::ClickhouseError;

/// One `JSONEachRow` result line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Map<String, Value>,
}

impl Row {
    pub fn new(columns: Map<String, Value>) -> Self {
        Self { columns }
    }

    pub fn parse(line: &str) -> Result<Self, ClickhouseError> {
        let columns: Map<String, Value> = serde_json::from_str(line)?;
        Ok(Self { columns })
    }

    fn column(&self, name: &str) -> Result<&Value, ClickhouseError> {
        self.columns
            .get(name)
            .ok_or_else(|| ClickhouseError::MissingColumn {
                column: name.to_string(),
            })
    }

    fn unexpected(name: &str, expected: &'static str) -> ClickhouseError {
        ClickhouseError::UnexpectedType {
            column: name.to_string(),
            expected,
        }
    }

    pub fn get_string(&self, name: &str) -> Result<String, ClickhouseError> {
        match self.column(name)? {
            Value::String(s) => Ok(s.clone()),
            _ => Err(Self::unexpected(name, "string")),
        }
    }

    pub fn get_nullable_string(&self, name: &str) -> Result<Option<String>, ClickhouseError> {
        match self.column(name)? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s.clone())),
            _ => Err(Self::unexpected(name, "nullable string")),
        }
    }

    /// ClickHouse renders `Bool` as `true`/`false` and `UInt8` flags as `0`/`1`.
    pub fn get_bool(&self, name: &str) -> Result<bool, ClickhouseError> {
        match self.column(name)? {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(false),
                Some(1) => Ok(true),
                _ => Err(Self::unexpected(name, "boolean")),
            },
            Value::String(s) => match s.as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(Self::unexpected(name, "boolean")),
            },
            _ => Err(Self::unexpected(name, "boolean")),
        }
    }

    /// 64 bit integers are quoted by default in ClickHouse JSON output.
    pub fn get_u64(&self, name: &str) -> Result<u64, ClickhouseError> {
        match self.column(name)? {
            Value::Number(n) => n.as_u64().ok_or_else(|| Self::unexpected(name, "u64")),
            Value::String(s) => s.parse().map_err(|_| Self::unexpected(name, "u64")),
            _ => Err(Self::unexpected(name, "u64")),
        }
    }

    pub fn get_string_array(&self, name: &str) -> Result<Vec<String>, ClickhouseError> {
        match self.column(name)? {
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    _ => Err(Self::unexpected(name, "array of strings")),
                })
                .collect(),
            _ => Err(Self::unexpected(name, "array of strings")),
        }
    }
}

impl From<Map<String, Value>> for Row {
    fn from(columns: Map<String, Value>) -> Self {
        Self::new(columns)
    }
}
