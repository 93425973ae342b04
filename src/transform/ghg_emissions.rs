//! Checks for the three GHG emission summaries

use crate::aggregate::{GasEmissions, SectorEmissions, StateEmissions};
use crate::table::{Table, TableRow};
use crate::validation::{
    assert_contains, assert_fixed_width, assert_non_negative, assert_positive, assert_valid_year,
    assert_year_bounds, validate, TableSchema, ValidationError,
};

use super::datasets::DatasetLimits;

pub fn check_by_state(table: &Table, limits: &DatasetLimits) -> Result<(), ValidationError> {
    let schema = TableSchema::new(StateEmissions::columns())
        .not_null(&["year", "state", "state_name", "total_co2e", "facility_count"])
        .unique(&["year", "state"])
        .min_rows(limits.by_state_min_rows);
    validate(table, &schema)?;

    assert_valid_year(table, "year", &limits.valid_years)?;
    assert_year_bounds(table, "year", limits.first_year, limits.last_year)?;
    assert_fixed_width(table, "state", 2)?;
    assert_non_negative(table, "total_co2e")?;
    assert_positive(table, "facility_count")?;
    Ok(())
}

pub fn check_by_sector(table: &Table, limits: &DatasetLimits) -> Result<(), ValidationError> {
    let schema = TableSchema::new(SectorEmissions::columns())
        .not_null(&["year", "sector", "total_co2e", "facility_count"])
        .unique(&["year", "sector"])
        .min_rows(limits.by_sector_min_rows);
    validate(table, &schema)?;

    assert_valid_year(table, "year", &limits.valid_years)?;
    assert_year_bounds(table, "year", limits.first_year, limits.last_year)?;
    assert_non_negative(table, "total_co2e")?;
    assert_contains(table, "sector", &["Power Plants"])?;
    Ok(())
}

pub fn check_by_gas(table: &Table, limits: &DatasetLimits) -> Result<(), ValidationError> {
    let schema = TableSchema::new(GasEmissions::columns())
        .all_not_null()
        .unique(&["year", "gas_code"])
        .min_rows(limits.by_gas_min_rows);
    validate(table, &schema)?;

    assert_valid_year(table, "year", &limits.valid_years)?;
    assert_contains(table, "gas_code", &["CO2", "CH4", "N2O"])?;
    Ok(())
}
