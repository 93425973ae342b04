//! Transform phase: raw snapshots to validated, published datasets
//!
//! | dataset                       | source snapshot          | upload    |
//! |-------------------------------|--------------------------|-----------|
//! | `epa_tri_facilities`          | `tri_facilities`         | overwrite |
//! | `epa_ghg_emissions_by_state`  | `ghg_emissions`          | append    |
//! | `epa_ghg_emissions_by_sector` | `ghg_emissions_by_sector`| append    |
//! | `epa_ghg_emissions_by_gas`    | `ghg_emissions`          | append    |

pub mod datasets;
pub mod ghg_emissions;
pub mod runner;
pub mod tri_facilities;

pub use datasets::{
    DatasetLimits, GHG_BY_GAS_ID, GHG_BY_SECTOR_ID, GHG_BY_STATE_ID, TRI_FACILITIES_ID,
};
pub use runner::{PublishReport, TransformRunner};
