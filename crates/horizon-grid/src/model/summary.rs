//! Aggregates over store records.
//!
//! Every aggregate has a form over the visible records and an `_of` form over
//! an explicit record slice. Group headers and footers never contribute.

use super::record::Record;
use super::store::Store;
use super::value::FieldValue;

/// Numeric reading used by `sum` and `average`: numbers as-is, numeric strings parsed.
fn numeric(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::String(s) => s.trim().parse().ok(),
        other => other.as_number(),
    }
    .filter(|n: &f64| !n.is_nan())
}

fn extreme(records: &[Record], field: &str, pick: fn(f64, f64) -> f64) -> Option<f64> {
    records
        .iter()
        .filter(|r| !r.is_special_row())
        .filter_map(|r| r.get(field).as_number())
        .filter(|n| !n.is_nan())
        .reduce(pick)
}

impl Store {
    /// Sum of `field` over the visible records.
    pub fn sum(&self, field: &str) -> f64 {
        Self::sum_of(field, &self.records())
    }

    /// Sum of `field` over `records`. Non-numeric values are skipped.
    pub fn sum_of(field: &str, records: &[Record]) -> f64 {
        records
            .iter()
            .filter(|r| !r.is_special_row())
            .filter_map(|r| numeric(&r.get(field)))
            .sum()
    }

    /// Smallest numeric value of `field` over the visible records.
    pub fn min(&self, field: &str) -> Option<f64> {
        Self::min_of(field, &self.records())
    }

    /// Smallest numeric value of `field` over `records`.
    pub fn min_of(field: &str, records: &[Record]) -> Option<f64> {
        extreme(records, field, f64::min)
    }

    /// Largest numeric value of `field` over the visible records.
    pub fn max(&self, field: &str) -> Option<f64> {
        Self::max_of(field, &self.records())
    }

    /// Largest numeric value of `field` over `records`.
    pub fn max_of(field: &str, records: &[Record]) -> Option<f64> {
        extreme(records, field, f64::max)
    }

    /// Mean of `field` over the visible records; `0.0` when nothing is numeric.
    pub fn average(&self, field: &str) -> f64 {
        Self::average_of(field, &self.records())
    }

    /// Mean of `field` over `records`.
    pub fn average_of(field: &str, records: &[Record]) -> f64 {
        let (sum, count) = records
            .iter()
            .filter(|r| !r.is_special_row())
            .filter_map(|r| numeric(&r.get(field)))
            .fold((0.0, 0usize), |(sum, count), n| (sum + n, count + 1));
        if count == 0 { 0.0 } else { sum / count as f64 }
    }

    /// Sum of `field` over the visible members of the group with `group_value`.
    /// `None` when the store is not grouped.
    pub fn group_sum(&self, group_value: &FieldValue, field: &str) -> Option<f64> {
        self.get_group_records(group_value)
            .map(|records| Self::sum_of(field, &records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::StoreConfig;

    fn row(id: i64, team: &str, score: FieldValue) -> Record {
        Record::new(id, [("team", FieldValue::from(team)), ("score", score)])
    }

    fn store() -> Store {
        Store::with_records(
            StoreConfig::default(),
            vec![
                row(1, "red", FieldValue::Int(4)),
                row(2, "red", FieldValue::Float(2.5)),
                row(3, "blue", FieldValue::from("3")),
                row(4, "blue", FieldValue::from("n/a")),
            ],
        )
    }

    #[test]
    fn test_sum_and_average() {
        let store = store();
        assert_eq!(store.sum("score"), 9.5);
        assert!((store.average("score") - 9.5 / 3.0).abs() < f64::EPSILON);
        assert_eq!(store.sum("missing"), 0.0);
        assert_eq!(store.average("missing"), 0.0);
    }

    #[test]
    fn test_min_max_ignore_strings() {
        let store = store();
        assert_eq!(store.min("score"), Some(2.5));
        assert_eq!(store.max("score"), Some(4.0));
        assert_eq!(store.min("team"), None);
        assert_eq!(Store::max_of("score", &[]), None);
    }

    #[test]
    fn test_group_sum_skips_headers() {
        let mut store = store();
        assert_eq!(store.group_sum(&"red".into(), "score"), None);

        store.group_by("team").unwrap();
        assert_eq!(store.count(), 6);
        assert_eq!(store.group_sum(&"red".into(), "score"), Some(6.5));
        assert_eq!(store.group_sum(&"blue".into(), "score"), Some(3.0));
        assert_eq!(store.sum("score"), 9.5);
    }
}
