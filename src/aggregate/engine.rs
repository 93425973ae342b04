//! Keyed fold of raw records into one summary row per key

use std::collections::{BTreeMap, HashSet};

use crate::records::{field_f64, field_str, field_year, RawRecord};

/// Composite grouping key: reporting year plus one dimension
///
/// Ordered by integer year first, so sorting never depends on how the
/// year is later rendered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AggregationKey {
    pub year: i32,
    pub dimension: String,
}

impl AggregationKey {
    pub fn new(year: i32, dimension: impl Into<String>) -> Self {
        Self {
            year,
            dimension: dimension.into(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AggregateError {
    #[error("key field '{field}' is missing or null")]
    MissingKeyField { field: String },

    #[error("key field '{field}' holds '{value}', which is not a year")]
    InvalidYear { field: String, value: String },
}

/// Builds `(year, dimension)` keys from two record fields
#[derive(Debug, Clone, Copy)]
pub struct YearDimensionKey {
    pub year_field: &'static str,
    pub dimension_field: &'static str,
}

impl YearDimensionKey {
    pub const fn new(year_field: &'static str, dimension_field: &'static str) -> Self {
        Self {
            year_field,
            dimension_field,
        }
    }

    pub fn project(&self, record: &RawRecord) -> Result<AggregationKey, AggregateError> {
        let year = match field_year(record, self.year_field) {
            Some(year) => year,
            None => {
                return Err(match field_str(record, self.year_field) {
                    Some(value) => AggregateError::InvalidYear {
                        field: self.year_field.to_string(),
                        value,
                    },
                    None => AggregateError::MissingKeyField {
                        field: self.year_field.to_string(),
                    },
                })
            }
        };

        let dimension = field_str(record, self.dimension_field).ok_or_else(|| {
            AggregateError::MissingKeyField {
                field: self.dimension_field.to_string(),
            }
        })?;

        Ok(AggregationKey::new(year, dimension))
    }
}

/// What to fold out of each record
#[derive(Debug, Clone, Copy)]
pub struct MeasureRules {
    /// Numeric field summed into the total (null counts as 0.0)
    pub measure_field: &'static str,
    /// Categorical field that routes the measure into a named bucket
    pub discriminator_field: Option<&'static str>,
    /// (discriminator value, bucket name)
    pub buckets: &'static [(&'static str, &'static str)],
    /// Field whose distinct values are counted per key
    pub entity_field: Option<&'static str>,
    /// Text carried through per key, assumed constant within a key
    pub descriptive_field: Option<&'static str>,
}

/// Running state for one key
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    pub descriptive: Option<String>,
    pub buckets: Vec<f64>,
    pub total: f64,
    pub entities: HashSet<String>,
}

impl Accumulator {
    fn new(bucket_count: usize) -> Self {
        Self {
            buckets: vec![0.0; bucket_count],
            ..Self::default()
        }
    }

    fn fold(&mut self, record: &RawRecord, rules: &MeasureRules) {
        if let Some(field) = rules.descriptive_field {
            // Last non-null value wins
            if let Some(value) = field_str(record, field) {
                self.descriptive = Some(value);
            }
        }

        if let Some(field) = rules.entity_field {
            if let Some(id) = field_str(record, field) {
                self.entities.insert(id);
            }
        }

        let measure = field_f64(record, rules.measure_field).unwrap_or(0.0);
        self.total += measure;

        if let Some(field) = rules.discriminator_field {
            if let Some(code) = field_str(record, field) {
                if let Some(idx) = rules.buckets.iter().position(|(value, _)| *value == code) {
                    self.buckets[idx] += measure;
                }
            }
        }
    }
}

/// Finalized summary for one key
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub key: AggregationKey,
    pub descriptive: Option<String>,
    /// (bucket name, sum) in rule order
    pub buckets: Vec<(&'static str, f64)>,
    pub total: f64,
    pub entity_count: usize,
}

impl OutputRow {
    /// Sum routed into a bucket; 0.0 for unknown bucket names
    pub fn bucket(&self, name: &str) -> f64 {
        self.buckets
            .iter()
            .find(|(bucket, _)| *bucket == name)
            .map(|(_, sum)| *sum)
            .unwrap_or(0.0)
    }
}

/// Group `records` by `key_fn` and fold each group under `rules`
///
/// Output is sorted ascending by key. A record whose key cannot be built
/// fails the whole aggregation.
pub fn aggregate<K>(
    records: &[RawRecord],
    key_fn: K,
    rules: &MeasureRules,
) -> Result<Vec<OutputRow>, AggregateError>
where
    K: Fn(&RawRecord) -> Result<AggregationKey, AggregateError>,
{
    let mut groups: BTreeMap<AggregationKey, Accumulator> = BTreeMap::new();

    for (index, record) in records.iter().enumerate() {
        let key = key_fn(record).inspect_err(|e| {
            log::error!("❌ Record {} cannot be keyed: {}", index, e);
        })?;

        groups
            .entry(key)
            .or_insert_with(|| Accumulator::new(rules.buckets.len()))
            .fold(record, rules);
    }

    Ok(groups
        .into_iter()
        .map(|(key, acc)| OutputRow {
            key,
            descriptive: acc.descriptive,
            buckets: rules
                .buckets
                .iter()
                .zip(acc.buckets)
                .map(|((_, name), sum)| (*name, sum))
                .collect(),
            total: acc.total,
            entity_count: acc.entities.len(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RULES: MeasureRules = MeasureRules {
        measure_field: "amount",
        discriminator_field: Some("kind"),
        buckets: &[("A", "a"), ("B", "b")],
        entity_field: Some("entity"),
        descriptive_field: Some("label"),
    };

    const KEY: YearDimensionKey = YearDimensionKey::new("year", "group");

    fn records(value: serde_json::Value) -> Vec<RawRecord> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_buckets_and_total() {
        let input = records(json!([
            {"year": 2020, "group": "g", "kind": "A", "amount": 1.0, "entity": "e1"},
            {"year": 2020, "group": "g", "kind": "B", "amount": 2.0, "entity": "e1"},
            {"year": 2020, "group": "g", "kind": "Z", "amount": 4.0, "entity": "e2"}
        ]));

        let rows = aggregate(&input, |r| KEY.project(r), &RULES).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bucket("a"), 1.0);
        assert_eq!(rows[0].bucket("b"), 2.0);
        assert_eq!(rows[0].total, 7.0);
        assert_eq!(rows[0].entity_count, 2);
    }

    #[test]
    fn test_sorted_by_numeric_year_then_dimension() {
        let input = records(json!([
            {"year": "2021", "group": "b", "amount": 1},
            {"year": 999, "group": "z", "amount": 1},
            {"year": 2021, "group": "a", "amount": 1},
            {"year": 2010, "group": "c", "amount": 1}
        ]));

        let rows = aggregate(&input, |r| KEY.project(r), &RULES).unwrap();
        let keys: Vec<(i32, &str)> = rows
            .iter()
            .map(|r| (r.key.year, r.key.dimension.as_str()))
            .collect();

        assert_eq!(keys, vec![(999, "z"), (2010, "c"), (2021, "a"), (2021, "b")]);
    }

    #[test]
    fn test_null_and_missing_measures_count_as_zero() {
        let input = records(json!([
            {"year": 2020, "group": "g", "kind": "A", "amount": null},
            {"year": 2020, "group": "g", "kind": "A"},
            {"year": 2020, "group": "g", "kind": "A", "amount": "2.5"}
        ]));

        let rows = aggregate(&input, |r| KEY.project(r), &RULES).unwrap();

        assert_eq!(rows[0].bucket("a"), 2.5);
        assert_eq!(rows[0].total, 2.5);
    }

    #[test]
    fn test_descriptive_field_last_non_null_wins() {
        let input = records(json!([
            {"year": 2020, "group": "g", "label": "first"},
            {"year": 2020, "group": "g", "label": "second"},
            {"year": 2020, "group": "g", "label": null}
        ]));

        let rows = aggregate(&input, |r| KEY.project(r), &RULES).unwrap();
        assert_eq!(rows[0].descriptive.as_deref(), Some("second"));
    }

    #[test]
    fn test_unkeyable_record_fails() {
        let missing = records(json!([{"year": 2020}]));
        let err = aggregate(&missing, |r| KEY.project(r), &RULES).unwrap_err();
        assert_eq!(err, AggregateError::MissingKeyField { field: "group".to_string() });

        let bad_year = records(json!([{"year": "FY20", "group": "g"}]));
        let err = aggregate(&bad_year, |r| KEY.project(r), &RULES).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidYear { .. }));
    }

    #[test]
    fn test_empty_input_yields_no_rows() {
        let rows = aggregate(&[], |r| KEY.project(r), &RULES).unwrap();
        assert!(rows.is_empty());
    }
}
