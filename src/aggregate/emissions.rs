//! GHG emission summaries by state, sector and gas

use crate::records::RawRecord;
use crate::table::{Column, ColumnType, TableRow, Value};

use super::engine::{aggregate, AggregateError, MeasureRules, OutputRow, YearDimensionKey};

const GAS_BUCKETS: &[(&str, &str)] = &[("CO2", "co2"), ("CH4", "ch4"), ("N2O", "n2o")];

const MEASURE_FIELD: &str = "co2e_emission";
const FACILITY_FIELD: &str = "facility_id";

pub const STATE_RULES: MeasureRules = MeasureRules {
    measure_field: MEASURE_FIELD,
    discriminator_field: Some("gas_code"),
    buckets: GAS_BUCKETS,
    entity_field: Some(FACILITY_FIELD),
    descriptive_field: Some("state_name"),
};

pub const SECTOR_RULES: MeasureRules = MeasureRules {
    measure_field: MEASURE_FIELD,
    discriminator_field: Some("gas_code"),
    buckets: GAS_BUCKETS,
    entity_field: Some(FACILITY_FIELD),
    descriptive_field: None,
};

pub const GAS_RULES: MeasureRules = MeasureRules {
    measure_field: MEASURE_FIELD,
    discriminator_field: None,
    buckets: &[],
    entity_field: None,
    descriptive_field: Some("gas_name"),
};

const STATE_KEY: YearDimensionKey = YearDimensionKey::new("year", "state");
const SECTOR_KEY: YearDimensionKey = YearDimensionKey::new("year", "sector_name");
const GAS_KEY: YearDimensionKey = YearDimensionKey::new("year", "gas_code");

fn format_year(year: i32) -> String {
    format!("{:04}", year)
}

fn facility_count(row: &OutputRow) -> i64 {
    i64::try_from(row.entity_count).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateEmissions {
    pub year: i32,
    pub state: String,
    pub state_name: Option<String>,
    pub co2: f64,
    pub ch4: f64,
    pub n2o: f64,
    pub total_co2e: f64,
    pub facility_count: i64,
}

impl From<OutputRow> for StateEmissions {
    fn from(row: OutputRow) -> Self {
        Self {
            co2: row.bucket("co2"),
            ch4: row.bucket("ch4"),
            n2o: row.bucket("n2o"),
            total_co2e: row.total,
            facility_count: facility_count(&row),
            year: row.key.year,
            state: row.key.dimension,
            state_name: row.descriptive,
        }
    }
}

impl TableRow for StateEmissions {
    fn columns() -> Vec<Column> {
        vec![
            Column::new("year", ColumnType::String),
            Column::new("state", ColumnType::String),
            Column::new("state_name", ColumnType::String),
            Column::new("co2", ColumnType::Double),
            Column::new("ch4", ColumnType::Double),
            Column::new("n2o", ColumnType::Double),
            Column::new("total_co2e", ColumnType::Double),
            Column::new("facility_count", ColumnType::Int),
        ]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            format_year(self.year).into(),
            self.state.as_str().into(),
            self.state_name.clone().into(),
            self.co2.into(),
            self.ch4.into(),
            self.n2o.into(),
            self.total_co2e.into(),
            self.facility_count.into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorEmissions {
    pub year: i32,
    pub sector: String,
    pub co2: f64,
    pub ch4: f64,
    pub n2o: f64,
    pub total_co2e: f64,
    pub facility_count: i64,
}

impl From<OutputRow> for SectorEmissions {
    fn from(row: OutputRow) -> Self {
        Self {
            co2: row.bucket("co2"),
            ch4: row.bucket("ch4"),
            n2o: row.bucket("n2o"),
            total_co2e: row.total,
            facility_count: facility_count(&row),
            year: row.key.year,
            sector: row.key.dimension,
        }
    }
}

impl TableRow for SectorEmissions {
    fn columns() -> Vec<Column> {
        vec![
            Column::new("year", ColumnType::String),
            Column::new("sector", ColumnType::String),
            Column::new("co2", ColumnType::Double),
            Column::new("ch4", ColumnType::Double),
            Column::new("n2o", ColumnType::Double),
            Column::new("total_co2e", ColumnType::Double),
            Column::new("facility_count", ColumnType::Int),
        ]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            format_year(self.year).into(),
            self.sector.as_str().into(),
            self.co2.into(),
            self.ch4.into(),
            self.n2o.into(),
            self.total_co2e.into(),
            self.facility_count.into(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GasEmissions {
    pub year: i32,
    pub gas_code: String,
    pub gas_name: Option<String>,
    pub total_co2e: f64,
}

impl From<OutputRow> for GasEmissions {
    fn from(row: OutputRow) -> Self {
        Self {
            year: row.key.year,
            gas_code: row.key.dimension,
            gas_name: row.descriptive,
            total_co2e: row.total,
        }
    }
}

impl TableRow for GasEmissions {
    fn columns() -> Vec<Column> {
        vec![
            Column::new("year", ColumnType::String),
            Column::new("gas_code", ColumnType::String),
            Column::new("gas_name", ColumnType::String),
            Column::new("total_co2e", ColumnType::Double),
        ]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            format_year(self.year).into(),
            self.gas_code.as_str().into(),
            self.gas_name.clone().into(),
            self.total_co2e.into(),
        ]
    }
}

/// One row per (year, state), gases split into CO2/CH4/N2O columns
pub fn aggregate_by_state(records: &[RawRecord]) -> Result<Vec<StateEmissions>, AggregateError> {
    let rows = aggregate(records, |r| STATE_KEY.project(r), &STATE_RULES)?;
    Ok(rows.into_iter().map(StateEmissions::from).collect())
}

/// One row per (year, sector_name)
pub fn aggregate_by_sector(records: &[RawRecord]) -> Result<Vec<SectorEmissions>, AggregateError> {
    let rows = aggregate(records, |r| SECTOR_KEY.project(r), &SECTOR_RULES)?;
    Ok(rows.into_iter().map(SectorEmissions::from).collect())
}

/// One row per (year, gas_code), total only
pub fn aggregate_by_gas(records: &[RawRecord]) -> Result<Vec<GasEmissions>, AggregateError> {
    let rows = aggregate(records, |r| GAS_KEY.project(r), &GAS_RULES)?;
    Ok(rows.into_iter().map(GasEmissions::from).collect())
}
