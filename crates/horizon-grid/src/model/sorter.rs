//! Record sorters.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::record::Record;

/// A record comparator.
pub type SortFn = Arc<dyn Fn(&Record, &Record) -> Ordering + Send + Sync>;

/// Sorts records by a field or a comparator.
#[derive(Clone)]
pub struct Sorter {
    field: Option<String>,
    ascending: bool,
    sort_fn: Option<SortFn>,
}

impl Sorter {
    /// Sort ascending by `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ascending: true,
            sort_fn: None,
        }
    }

    /// Sort with a comparator.
    pub fn by<F>(compare: F) -> Self
    where
        F: Fn(&Record, &Record) -> Ordering + Send + Sync + 'static,
    {
        Self {
            field: None,
            ascending: true,
            sort_fn: Some(Arc::new(compare)),
        }
    }

    /// Set the direction.
    pub fn ascending(mut self, ascending: bool) -> Self {
        self.ascending = ascending;
        self
    }

    /// Sort descending.
    pub fn descending(self) -> Self {
        self.ascending(false)
    }

    /// The sorted field, `None` for comparator sorters.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns `true` when sorting ascending.
    pub fn is_ascending(&self) -> bool {
        self.ascending
    }

    /// Compare two records.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let ord = match (&self.sort_fn, &self.field) {
            (Some(compare), _) => compare(a, b),
            (None, Some(field)) => a.get(field).compare(&b.get(field)),
            (None, None) => Ordering::Equal,
        };
        if self.ascending { ord } else { ord.reverse() }
    }
}

impl fmt::Debug for Sorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sorter")
            .field("field", &self.field)
            .field("ascending", &self.ascending)
            .field("function", &self.sort_fn.is_some())
            .finish()
    }
}

/// Compare with each sorter in turn until one decides.
pub fn compare_all(sorters: &[Sorter], a: &Record, b: &Record) -> Ordering {
    sorters
        .iter()
        .map(|sorter| sorter.compare(a, b))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_sorter() {
        let a = Record::new(1, [("type", "A"), ("name", "b")]);
        let b = Record::new(2, [("type", "A"), ("name", "a")]);
        let c = Record::new(3, [("type", "B"), ("name", "c")]);
        let sorters = vec![Sorter::new("type").descending(), Sorter::new("name")];

        let mut records = vec![a.clone(), b.clone(), c.clone()];
        records.sort_by(|x, y| compare_all(&sorters, x, y));
        assert_eq!(records, vec![c, b, a]);
    }

    #[test]
    fn test_comparator_sorter() {
        let a = Record::new(1, [("n", 2)]);
        let b = Record::new(2, [("n", 1)]);
        let sorter = Sorter::by(|x, y| x.id().cmp(y.id()));
        assert_eq!(sorter.compare(&a, &b), Ordering::Less);
        assert_eq!(sorter.clone().descending().compare(&a, &b), Ordering::Greater);
    }
}
