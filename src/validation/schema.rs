//! Structural checks: columns, types, nulls, uniqueness, row count

use std::collections::HashSet;

use crate::table::{Column, ColumnType, Table};

/// Violations raised by [`validate`] and the domain assertions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("column '{column}' row {row}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        row: usize,
        expected: ColumnType,
        actual: ColumnType,
    },

    #[error("column '{column}' has a null at row {row}")]
    NullValue { column: String, row: usize },

    #[error("duplicate ({columns}) = ({key})")]
    DuplicateKey { columns: String, key: String },

    #[error("expected at least {min} rows, got {actual}")]
    TooFewRows { min: usize, actual: usize },

    #[error("column '{column}' row {row}: '{value}' is not a valid year")]
    InvalidYear {
        column: String,
        row: usize,
        value: String,
    },

    #[error("column '{column}': expected {bound} year {expected}, got {actual}")]
    YearBound {
        column: String,
        bound: &'static str,
        expected: i32,
        actual: i32,
    },

    #[error("column '{column}' row {row}: {value} outside [{min}, {max}]")]
    OutOfRange {
        column: String,
        row: usize,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("column '{column}' row {row}: {value} must be {requirement}")]
    SignViolation {
        column: String,
        row: usize,
        value: f64,
        requirement: &'static str,
    },

    #[error("column '{column}' is missing expected value '{value}'")]
    MissingValue { column: String, value: String },

    #[error("column '{column}' row {row}: '{value}' is not {width} characters")]
    WrongWidth {
        column: String,
        row: usize,
        value: String,
        width: usize,
    },

    #[error("column '{column}' has {actual} distinct values, expected at least {min}")]
    TooFewDistinct {
        column: String,
        min: usize,
        actual: usize,
    },
}

/// Declared shape of a table
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    pub columns: Vec<Column>,
    pub not_null: Vec<String>,
    /// Column set whose combined values must be unique; empty means unchecked
    pub unique: Vec<String>,
    pub min_rows: usize,
}

impl TableSchema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    pub fn not_null(mut self, columns: &[&str]) -> Self {
        self.not_null = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Mark every declared column as not-null
    pub fn all_not_null(mut self) -> Self {
        self.not_null = self.columns.iter().map(|c| c.name.clone()).collect();
        self
    }

    pub fn unique(mut self, columns: &[&str]) -> Self {
        self.unique = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = min_rows;
        self
    }
}

fn require_column(table: &Table, name: &str) -> Result<usize, ValidationError> {
    table
        .column_index(name)
        .ok_or_else(|| ValidationError::MissingColumn(name.to_string()))
}

/// Check `table` against `schema`, stopping at the first violation
pub fn validate(table: &Table, schema: &TableSchema) -> Result<(), ValidationError> {
    for declared in &schema.columns {
        let idx = require_column(table, &declared.name)?;
        for (row, values) in table.rows().iter().enumerate() {
            if let Some(actual) = values[idx].dtype() {
                if actual != declared.dtype {
                    return Err(ValidationError::TypeMismatch {
                        column: declared.name.clone(),
                        row,
                        expected: declared.dtype,
                        actual,
                    });
                }
            }
        }
    }

    for name in &schema.not_null {
        let idx = require_column(table, name)?;
        if let Some(row) = table.rows().iter().position(|values| values[idx].is_null()) {
            return Err(ValidationError::NullValue {
                column: name.clone(),
                row,
            });
        }
    }

    if !schema.unique.is_empty() {
        let indices = schema
            .unique
            .iter()
            .map(|name| require_column(table, name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::with_capacity(table.num_rows());
        for values in table.rows() {
            let key: Vec<String> = indices.iter().map(|&i| values[i].key_repr()).collect();
            if !seen.insert(key.clone()) {
                return Err(ValidationError::DuplicateKey {
                    columns: schema.unique.join(", "),
                    key: key.join(", "),
                });
            }
        }
    }

    if table.num_rows() < schema.min_rows {
        return Err(ValidationError::TooFewRows {
            min: schema.min_rows,
            actual: table.num_rows(),
        });
    }

    Ok(())
}
