//! Envirofacts request paths
//!
//! A request path looks like
//! `{table}/{column}/=/{value}/.../rows/{start}:{end}/{FORMAT}`.
//! Row ranges are inclusive on both ends.

use std::fmt;

/// Inclusive row window `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start: u64,
    pub end: u64,
}

impl RowRange {
    /// Window of `size` rows beginning at `start`
    pub fn window(start: u64, size: u64) -> Self {
        let size = size.max(1);
        Self {
            start,
            end: start + size - 1,
        }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Adjacent window of the same size, starting right after this one
    pub fn next(&self) -> Self {
        Self::window(self.end + 1, self.len())
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Csv,
    Xml,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "JSON",
            ResponseFormat::Csv => "CSV",
            ResponseFormat::Xml => "XML",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub table: String,
    /// Equality filters in the order they appear in the path
    pub filters: Vec<(String, String)>,
    pub rows: RowRange,
    pub format: ResponseFormat,
}

impl TableQuery {
    pub fn new(table: impl Into<String>, rows: RowRange) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            rows,
            format: ResponseFormat::Json,
        }
    }

    pub fn filter(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((column.into(), value.to_string()));
        self
    }

    pub fn format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_rows(&self, rows: RowRange) -> Self {
        Self {
            rows,
            ..self.clone()
        }
    }

    /// Resource path relative to the API base
    ///
    /// Filter values are percent-encoded so they stay one path segment.
    pub fn path(&self) -> String {
        let mut parts = vec![self.table.clone()];
        for (column, value) in &self.filters {
            parts.push(format!("{column}/=/{}", urlencoding::encode(value)));
        }
        parts.push(format!("rows/{}", self.rows));
        parts.push(self.format.as_str().to_string());
        parts.join("/")
    }
}

/// Upstream tables the pipeline reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamTable {
    /// Toxics Release Inventory facilities
    TriFacility,
    /// GHGRP facility emissions broken down by gas
    GhgEmitterGas,
    /// GHGRP facility emissions with sector classification
    GhgEmitterSector,
}

impl UpstreamTable {
    pub fn name(&self) -> &'static str {
        match self {
            UpstreamTable::TriFacility => "tri_facility",
            UpstreamTable::GhgEmitterGas => "ghg_emitter_gas",
            UpstreamTable::GhgEmitterSector => "ghg_emitter_sector",
        }
    }

    fn state_column(&self) -> &'static str {
        match self {
            UpstreamTable::TriFacility => "state_abbr",
            UpstreamTable::GhgEmitterGas | UpstreamTable::GhgEmitterSector => "state",
        }
    }

    fn supports_year(&self) -> bool {
        !matches!(self, UpstreamTable::TriFacility)
    }

    /// JSON query with optional year and state filters
    ///
    /// The year filter is ignored for tables that have no reporting year.
    pub fn query(&self, year: Option<i32>, state: Option<&str>, rows: RowRange) -> TableQuery {
        let mut query = TableQuery::new(self.name(), rows);
        if let Some(year) = year.filter(|_| self.supports_year()) {
            query = query.filter("year", year);
        }
        if let Some(state) = state {
            query = query.filter(self.state_column(), state);
        }
        query
    }
}
