//! TRI facility normalization and checks

use crate::records::{field_f64, field_str, RawRecord};
use crate::table::{Column, ColumnType, Table, TableRow, Value};
use crate::validation::{
    assert_in_range, assert_min_distinct, validate, TableSchema, ValidationError,
};

use super::datasets::DatasetLimits;

/// One facility with its upstream fields renamed to the published layout
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriFacility {
    pub tri_facility_id: Option<String>,
    pub facility_name: Option<String>,
    pub street_address: Option<String>,
    pub city_name: Option<String>,
    pub county_name: Option<String>,
    pub state_abbr: Option<String>,
    pub zip_code: Option<String>,
    pub region: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub parent_co_name: Option<String>,
    pub epa_registry_id: Option<String>,
    pub fac_closed_ind: Option<String>,
}

impl TriFacility {
    /// Upstream publishes coordinates as `pref_latitude` / `pref_longitude`
    pub fn from_record(record: &RawRecord) -> Self {
        let text = |field: &str| field_str(record, field);
        Self {
            tri_facility_id: text("tri_facility_id"),
            facility_name: text("facility_name"),
            street_address: text("street_address"),
            city_name: text("city_name"),
            county_name: text("county_name"),
            state_abbr: text("state_abbr"),
            zip_code: text("zip_code"),
            region: text("region"),
            latitude: field_f64(record, "pref_latitude"),
            longitude: field_f64(record, "pref_longitude"),
            parent_co_name: text("parent_co_name"),
            epa_registry_id: text("epa_registry_id"),
            fac_closed_ind: text("fac_closed_ind"),
        }
    }
}

impl TableRow for TriFacility {
    fn columns() -> Vec<Column> {
        use ColumnType::{Double, String};
        vec![
            Column::new("tri_facility_id", String),
            Column::new("facility_name", String),
            Column::new("street_address", String),
            Column::new("city_name", String),
            Column::new("county_name", String),
            Column::new("state_abbr", String),
            Column::new("zip_code", String),
            Column::new("region", String),
            Column::new("latitude", Double),
            Column::new("longitude", Double),
            Column::new("parent_co_name", String),
            Column::new("epa_registry_id", String),
            Column::new("fac_closed_ind", String),
        ]
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.tri_facility_id.clone().into(),
            self.facility_name.clone().into(),
            self.street_address.clone().into(),
            self.city_name.clone().into(),
            self.county_name.clone().into(),
            self.state_abbr.clone().into(),
            self.zip_code.clone().into(),
            self.region.clone().into(),
            self.latitude.into(),
            self.longitude.into(),
            self.parent_co_name.clone().into(),
            self.epa_registry_id.clone().into(),
            self.fac_closed_ind.clone().into(),
        ]
    }
}

pub fn normalize(records: &[RawRecord]) -> Table {
    let facilities: Vec<TriFacility> = records.iter().map(TriFacility::from_record).collect();
    Table::from_rows(&facilities)
}

pub fn check(table: &Table, limits: &DatasetLimits) -> Result<(), ValidationError> {
    let schema = TableSchema::new(TriFacility::columns())
        .not_null(&["tri_facility_id", "facility_name", "state_abbr"])
        .min_rows(limits.tri_min_rows);
    validate(table, &schema)?;

    assert_in_range(table, "latitude", 17.0, 72.0)?;
    assert_in_range(table, "longitude", -180.0, -60.0)?;
    assert_min_distinct(table, "state_abbr", limits.tri_min_states)?;

    log::info!("  Validated {} TRI facilities", table.num_rows());
    Ok(())
}
