//! Typed, row-oriented tables handed to validation and the publish sink

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    String,
    Double,
    Int,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Double => "double",
            ColumnType::Int => "int",
        }
    }

    /// SQLite storage class used by the publish sink
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::String => "TEXT",
            ColumnType::Double => "REAL",
            ColumnType::Int => "INTEGER",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

impl Column {
    pub fn new(name: &str, dtype: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            dtype,
        }
    }
}

/// A single cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    String(String),
    Double(f64),
    Int(i64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type of a non-null value
    pub fn dtype(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::String(_) => Some(ColumnType::String),
            Value::Double(_) => Some(ColumnType::Double),
            Value::Int(_) => Some(ColumnType::Int),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Stable textual form used for uniqueness keys
    pub fn key_repr(&self) -> String {
        match self {
            Value::Null => "\u{0}null".to_string(),
            Value::String(s) => s.clone(),
            Value::Double(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("row has {actual} values but table has {expected} columns")]
    ArityMismatch { expected: usize, actual: usize },
}

/// Rows that know their own column layout
pub trait TableRow {
    fn columns() -> Vec<Column>;
    fn values(&self) -> Vec<Value>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from typed rows
    pub fn from_rows<R: TableRow>(rows: &[R]) -> Self {
        Self {
            columns: R::columns(),
            rows: rows.iter().map(TableRow::values).collect(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::ArityMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Iterate one column's values, `None` if the column does not exist
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }
}
