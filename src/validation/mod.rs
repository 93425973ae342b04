//! Table validation run before every publish
//!
//! A dataset is either fully valid or not published at all.

pub mod assertions;
pub mod schema;

pub use assertions::{
    assert_contains, assert_fixed_width, assert_in_range, assert_min_distinct, assert_non_negative,
    assert_positive, assert_valid_year, assert_year_bounds,
};
pub use schema::{validate, TableSchema, ValidationError};
