//! In-memory aggregation of raw records into keyed summary rows
//!
//! ```text
//! raw records ──► key_fn ──► BTreeMap<AggregationKey, Accumulator> ──► OutputRow
//!                                  │
//!                                  └─ buckets / total / distinct entities
//! ```

pub mod emissions;
pub mod engine;

pub use emissions::{
    aggregate_by_gas, aggregate_by_sector, aggregate_by_state, GasEmissions, SectorEmissions,
    StateEmissions,
};
pub use engine::{
    aggregate, Accumulator, AggregateError, AggregationKey, MeasureRules, OutputRow,
    YearDimensionKey,
};
