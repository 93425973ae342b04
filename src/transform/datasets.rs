//! Published dataset identities and the limits their checks enforce

use std::ops::RangeInclusive;

use crate::config::PipelineConfig;
use crate::storage::DatasetMetadata;

pub const TRI_FACILITIES_ID: &str = "epa_tri_facilities";
pub const GHG_BY_STATE_ID: &str = "epa_ghg_emissions_by_state";
pub const GHG_BY_SECTOR_ID: &str = "epa_ghg_emissions_by_sector";
pub const GHG_BY_GAS_ID: &str = "epa_ghg_emissions_by_gas";

/// Thresholds used by the per-dataset checks
///
/// Production values match full upstream history; tests shrink them to fit
/// small synthetic inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetLimits {
    /// Any year outside this range is malformed
    pub valid_years: RangeInclusive<i32>,
    /// Expected smallest and largest reporting year in the GHG datasets
    pub first_year: i32,
    pub last_year: i32,
    pub by_state_min_rows: usize,
    pub by_sector_min_rows: usize,
    pub by_gas_min_rows: usize,
    pub tri_min_rows: usize,
    pub tri_min_states: usize,
}

impl Default for DatasetLimits {
    fn default() -> Self {
        Self {
            valid_years: 1900..=2100,
            first_year: 2010,
            last_year: 2023,
            by_state_min_rows: 500,
            by_sector_min_rows: 100,
            by_gas_min_rows: 100,
            tri_min_rows: 10_000,
            tri_min_states: 40,
        }
    }
}

impl DatasetLimits {
    /// Defaults with the year bounds taken from the ingest range
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            first_year: config.first_year,
            last_year: config.last_year,
            ..Self::default()
        }
    }
}

fn metadata(id: &str, title: &str, description: &str, columns: &[(&str, &str)]) -> DatasetMetadata {
    DatasetMetadata {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        column_descriptions: columns
            .iter()
            .map(|(name, text)| (name.to_string(), text.to_string()))
            .collect(),
    }
}

const YEAR: (&str, &str) = ("year", "Reporting year (YYYY)");
const CO2: (&str, &str) = ("co2", "Carbon dioxide emissions (metric tons CO2e)");
const CH4: (&str, &str) = ("ch4", "Methane emissions (metric tons CO2e)");
const N2O: (&str, &str) = ("n2o", "Nitrous oxide emissions (metric tons CO2e)");
const TOTAL: (&str, &str) = ("total_co2e", "Total emissions across all gases (metric tons CO2e)");
const FACILITIES: (&str, &str) = ("facility_count", "Number of reporting facilities");

pub fn tri_facilities_metadata() -> DatasetMetadata {
    metadata(
        TRI_FACILITIES_ID,
        "EPA TRI Facilities",
        "Facilities reporting to EPA's Toxics Release Inventory (TRI) program. TRI tracks the \
         management of certain toxic chemicals that may pose a threat to human health and the \
         environment.",
        &[
            ("tri_facility_id", "EPA TRI facility identifier"),
            ("facility_name", "Name of the facility"),
            ("street_address", "Street address"),
            ("city_name", "City name"),
            ("county_name", "County name"),
            ("state_abbr", "State abbreviation"),
            ("zip_code", "ZIP code"),
            ("region", "EPA region number"),
            ("latitude", "Facility latitude"),
            ("longitude", "Facility longitude"),
            ("parent_co_name", "Parent company name"),
            ("epa_registry_id", "EPA Facility Registry ID"),
            ("fac_closed_ind", "Facility closed indicator"),
        ],
    )
}

pub fn ghg_by_state_metadata() -> DatasetMetadata {
    metadata(
        GHG_BY_STATE_ID,
        "EPA Greenhouse Gas Emissions by State",
        "Annual greenhouse gas emissions by U.S. state from EPA's Greenhouse Gas Reporting \
         Program (GHGRP). Covers large facilities emitting >25,000 metric tons CO2e/year. \
         Emissions reported in metric tons CO2-equivalent.",
        &[
            YEAR,
            ("state", "U.S. state abbreviation (2-letter code)"),
            ("state_name", "Full state name"),
            CO2,
            CH4,
            N2O,
            TOTAL,
            FACILITIES,
        ],
    )
}

pub fn ghg_by_sector_metadata() -> DatasetMetadata {
    metadata(
        GHG_BY_SECTOR_ID,
        "EPA Greenhouse Gas Emissions by Sector",
        "Annual greenhouse gas emissions by industry sector from EPA's Greenhouse Gas Reporting \
         Program (GHGRP). Sectors include Power Plants, Refineries, Chemicals, Metals, etc. \
         Emissions reported in metric tons CO2-equivalent.",
        &[YEAR, ("sector", "Industry sector name"), CO2, CH4, N2O, TOTAL, FACILITIES],
    )
}

pub fn ghg_by_gas_metadata() -> DatasetMetadata {
    metadata(
        GHG_BY_GAS_ID,
        "EPA Greenhouse Gas Emissions by Gas Type",
        "Annual greenhouse gas emissions by gas type from EPA's Greenhouse Gas Reporting Program \
         (GHGRP). Includes CO2, CH4, N2O, HFCs, PFCs, SF6, and other fluorinated gases. \
         Emissions reported in metric tons CO2-equivalent.",
        &[
            YEAR,
            ("gas_code", "Gas identifier code"),
            ("gas_name", "Full gas name"),
            ("total_co2e", "Total emissions (metric tons CO2e)"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{GasEmissions, SectorEmissions, StateEmissions};
    use crate::table::TableRow;

    fn described(meta: &DatasetMetadata) -> Vec<String> {
        meta.column_descriptions.iter().map(|(c, _)| c.clone()).collect()
    }

    fn declared<R: TableRow>() -> Vec<String> {
        R::columns().into_iter().map(|c| c.name).collect()
    }

    #[test]
    fn test_metadata_describes_every_output_column() {
        assert_eq!(described(&ghg_by_state_metadata()), declared::<StateEmissions>());
        assert_eq!(described(&ghg_by_sector_metadata()), declared::<SectorEmissions>());
        assert_eq!(described(&ghg_by_gas_metadata()), declared::<GasEmissions>());
        assert_eq!(tri_facilities_metadata().column_descriptions.len(), 13);
    }

    #[test]
    fn test_limits_follow_config_years() {
        let config = PipelineConfig {
            first_year: 2015,
            last_year: 2020,
            ..PipelineConfig::default()
        };
        let limits = DatasetLimits::from_config(&config);

        assert_eq!((limits.first_year, limits.last_year), (2015, 2020));
        assert_eq!(limits.tri_min_rows, 10_000);
    }
}
