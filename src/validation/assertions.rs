//! Domain assertions layered on top of the structural schema check
//!
//! Null cells are skipped by the value checks below; use the schema's
//! not-null list to forbid them. `assert_valid_year` is the exception.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::table::{Table, Value};

use super::schema::ValidationError;

fn column<'a>(
    table: &'a Table,
    name: &str,
) -> Result<impl Iterator<Item = (usize, &'a Value)> + 'a, ValidationError> {
    table
        .column(name)
        .map(|values| values.enumerate())
        .ok_or_else(|| ValidationError::MissingColumn(name.to_string()))
}

fn numeric_cells<'a>(
    table: &'a Table,
    name: &str,
) -> Result<impl Iterator<Item = (usize, f64)> + 'a, ValidationError> {
    Ok(column(table, name)?.filter_map(|(row, value)| value.as_f64().map(|v| (row, v))))
}

fn parse_year(value: &Value) -> Option<i32> {
    let text = value.as_str()?;
    if text.len() != 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Every value is a 4-digit year string inside `range`
pub fn assert_valid_year(
    table: &Table,
    name: &str,
    range: &RangeInclusive<i32>,
) -> Result<(), ValidationError> {
    for (row, value) in column(table, name)? {
        match parse_year(value) {
            Some(year) if range.contains(&year) => {}
            _ => {
                return Err(ValidationError::InvalidYear {
                    column: name.to_string(),
                    row,
                    value: value.key_repr(),
                })
            }
        }
    }
    Ok(())
}

/// Smallest year equals `first` and largest equals `last`
pub fn assert_year_bounds(
    table: &Table,
    name: &str,
    first: i32,
    last: i32,
) -> Result<(), ValidationError> {
    let years: Vec<i32> = column(table, name)?.filter_map(|(_, v)| parse_year(v)).collect();

    let (Some(&min), Some(&max)) = (years.iter().min(), years.iter().max()) else {
        return Err(ValidationError::TooFewRows { min: 1, actual: 0 });
    };

    if min != first {
        return Err(ValidationError::YearBound {
            column: name.to_string(),
            bound: "min",
            expected: first,
            actual: min,
        });
    }
    if max != last {
        return Err(ValidationError::YearBound {
            column: name.to_string(),
            bound: "max",
            expected: last,
            actual: max,
        });
    }
    Ok(())
}

pub fn assert_in_range(
    table: &Table,
    name: &str,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    for (row, value) in numeric_cells(table, name)? {
        if !(min..=max).contains(&value) {
            return Err(ValidationError::OutOfRange {
                column: name.to_string(),
                row,
                value,
                min,
                max,
            });
        }
    }
    Ok(())
}

pub fn assert_non_negative(table: &Table, name: &str) -> Result<(), ValidationError> {
    match numeric_cells(table, name)?.find(|(_, v)| *v < 0.0) {
        Some((row, value)) => Err(ValidationError::SignViolation {
            column: name.to_string(),
            row,
            value,
            requirement: "non-negative",
        }),
        None => Ok(()),
    }
}

pub fn assert_positive(table: &Table, name: &str) -> Result<(), ValidationError> {
    match numeric_cells(table, name)?.find(|(_, v)| *v <= 0.0) {
        Some((row, value)) => Err(ValidationError::SignViolation {
            column: name.to_string(),
            row,
            value,
            requirement: "positive",
        }),
        None => Ok(()),
    }
}

/// Each of `expected` appears at least once in the column
pub fn assert_contains(
    table: &Table,
    name: &str,
    expected: &[&str],
) -> Result<(), ValidationError> {
    let present: HashSet<&str> = column(table, name)?.filter_map(|(_, v)| v.as_str()).collect();

    match expected.iter().find(|value| !present.contains(**value)) {
        Some(missing) => Err(ValidationError::MissingValue {
            column: name.to_string(),
            value: missing.to_string(),
        }),
        None => Ok(()),
    }
}

pub fn assert_fixed_width(table: &Table, name: &str, width: usize) -> Result<(), ValidationError> {
    for (row, value) in column(table, name)? {
        if let Some(text) = value.as_str() {
            if text.chars().count() != width {
                return Err(ValidationError::WrongWidth {
                    column: name.to_string(),
                    row,
                    value: text.to_string(),
                    width,
                });
            }
        }
    }
    Ok(())
}

/// At least `min` distinct non-null values
pub fn assert_min_distinct(table: &Table, name: &str, min: usize) -> Result<(), ValidationError> {
    let distinct: HashSet<String> = column(table, name)?
        .filter(|(_, v)| !v.is_null())
        .map(|(_, v)| v.key_repr())
        .collect();

    if distinct.len() < min {
        return Err(ValidationError::TooFewDistinct {
            column: name.to_string(),
            min,
            actual: distinct.len(),
        });
    }
    Ok(())
}
