//! Groupers: how records are partitioned into groups.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::record::Record;
use super::value::FieldValue;

/// Computes the group value of a record.
pub type GroupValueFn = Arc<dyn Fn(&Record) -> FieldValue + Send + Sync>;

/// Orders group values.
pub type GroupSortFn = Arc<dyn Fn(&FieldValue, &FieldValue) -> Ordering + Send + Sync>;

/// Group value used for records with no value in the grouped field.
pub const NO_VALUE: &str = "!!novalue!!";

/// What a grouper reads from each record.
#[derive(Clone)]
pub enum GroupField {
    /// A field name, possibly dotted (`"resource.city"`).
    Field(String),
    /// A computed value.
    Function(GroupValueFn),
}

/// Partitions records by a field or a function.
#[derive(Clone)]
pub struct Grouper {
    field: GroupField,
    ascending: Option<bool>,
    sort_fn: Option<GroupSortFn>,
    complex_mapping: bool,
    root_field_name: String,
    leaf_field_name: String,
    field_path: String,
}

impl Grouper {
    /// Group by a field. Dotted names group by a nested value.
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        let dot = field.find('.').filter(|pos| *pos > 0);
        let complex_mapping = dot.is_some();
        let (root_field_name, leaf_field_name, field_path) = match dot {
            Some(pos) => (
                field[..pos].to_string(),
                field.rsplit('.').next().unwrap_or_default().to_string(),
                field[pos + 1..].to_string(),
            ),
            None => (field.clone(), field.clone(), field.clone()),
        };
        Self {
            field: GroupField::Field(field),
            ascending: None,
            sort_fn: None,
            complex_mapping,
            root_field_name,
            leaf_field_name,
            field_path,
        }
    }

    /// Group by a computed value. `name` is the field the value is derived from,
    /// used to decide whether an update affects grouping.
    pub fn by<F>(name: impl Into<String>, group_value: F) -> Self
    where
        F: Fn(&Record) -> FieldValue + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            field: GroupField::Function(Arc::new(group_value)),
            ascending: None,
            sort_fn: None,
            complex_mapping: false,
            root_field_name: name.clone(),
            leaf_field_name: name.clone(),
            field_path: name,
        }
    }

    /// Set the group direction.
    pub fn ascending(mut self, ascending: bool) -> Self {
        self.ascending = Some(ascending);
        self
    }

    /// Order groups with a custom comparator instead of value order.
    pub fn sort_with<F>(mut self, compare: F) -> Self
    where
        F: Fn(&FieldValue, &FieldValue) -> Ordering + Send + Sync + 'static,
    {
        self.sort_fn = Some(Arc::new(compare));
        self
    }

    pub(crate) fn set_ascending(&mut self, ascending: bool) {
        self.ascending = Some(ascending);
    }

    /// The configured direction, `None` when not yet decided.
    pub fn direction(&self) -> Option<bool> {
        self.ascending
    }

    /// Groups sort ascending unless explicitly descending.
    pub fn is_ascending(&self) -> bool {
        self.ascending != Some(false)
    }

    /// What this grouper reads.
    pub fn field(&self) -> &GroupField {
        &self.field
    }

    /// The field name for field groupers.
    pub fn field_name(&self) -> Option<&str> {
        match &self.field {
            GroupField::Field(name) => Some(name.as_str()),
            GroupField::Function(_) => None,
        }
    }

    /// Returns `true` when the field is a dotted path.
    pub fn is_complex_mapping(&self) -> bool {
        self.complex_mapping
    }

    /// First segment of the field path; updates to this field trigger regrouping.
    pub fn root_field_name(&self) -> &str {
        &self.root_field_name
    }

    /// Last segment of the field path; group headers expose the value under this name.
    pub fn leaf_field_name(&self) -> &str {
        &self.leaf_field_name
    }

    /// The path below the root field.
    pub fn field_path(&self) -> &str {
        &self.field_path
    }

    /// The group value of `record`.
    pub fn group_value(&self, record: &Record) -> FieldValue {
        match &self.field {
            GroupField::Field(name) => record.get(name),
            GroupField::Function(group_value) => group_value(record),
        }
    }

    /// Order two group values in ascending terms.
    pub fn compare_values(&self, a: &FieldValue, b: &FieldValue) -> Ordering {
        match &self.sort_fn {
            Some(compare) => compare(a, b),
            None => a.compare(b),
        }
    }

    /// Returns `true` if both groupers partition by the same field or function.
    pub fn same_criterion(&self, other: &Grouper) -> bool {
        match (&self.field, &other.field) {
            (GroupField::Field(a), GroupField::Field(b)) => a == b,
            (GroupField::Function(a), GroupField::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Grouper {
    fn from(field: &str) -> Self {
        Grouper::new(field)
    }
}

impl From<String> for Grouper {
    fn from(field: String) -> Self {
        Grouper::new(field)
    }
}

impl fmt::Debug for Grouper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match &self.field {
            GroupField::Field(name) => name.as_str(),
            GroupField::Function(_) => "<fn>",
        };
        f.debug_struct("Grouper")
            .field("field", &field)
            .field("ascending", &self.ascending)
            .field("root_field_name", &self.root_field_name)
            .finish()
    }
}

/// Derive the id fragment for a group value: numbers verbatim, everything
/// else with characters outside `[A-Za-z0-9_-]` replaced by `-`.
pub(crate) fn group_id_fragment(value: &FieldValue) -> String {
    match value {
        FieldValue::Int(n) => n.to_string(),
        FieldValue::Float(n) => n.to_string(),
        other => other
            .id_fragment()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '-' })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complex_mapping() {
        let grouper = Grouper::new("resource.address.city");
        assert!(grouper.is_complex_mapping());
        assert_eq!(grouper.root_field_name(), "resource");
        assert_eq!(grouper.leaf_field_name(), "city");
        assert_eq!(grouper.field_path(), "address.city");

        let simple = Grouper::new("type");
        assert!(!simple.is_complex_mapping());
        assert_eq!(simple.root_field_name(), "type");
    }

    #[test]
    fn test_same_criterion() {
        assert!(Grouper::new("a").same_criterion(&Grouper::new("a").ascending(false)));
        assert!(!Grouper::new("a").same_criterion(&Grouper::new("b")));
        let by = Grouper::by("size", |r| r.get("size"));
        assert!(by.same_criterion(&by.clone()));
        assert!(!by.same_criterion(&Grouper::by("size", |r| r.get("size"))));
    }

    #[test]
    fn test_id_fragment() {
        assert_eq!(group_id_fragment(&FieldValue::Int(3)), "3");
        assert_eq!(group_id_fragment(&FieldValue::from("New York")), "New-York");
        assert_eq!(group_id_fragment(&FieldValue::from(NO_VALUE)), "--novalue--");
    }
}
