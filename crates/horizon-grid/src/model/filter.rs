//! Filter definitions.
//!
//! A [`CollectionFilter`] is either a property test (`property`, `operator`,
//! `value`) or an arbitrary predicate over a record. Stores hold their
//! filters keyed by id; adding a filter whose id is already present
//! replaces the existing one in place.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::record::Record;
use super::value::FieldValue;
use crate::error::{Error, Result};

static NEXT_FILTER_ID: AtomicU64 = AtomicU64::new(1);

/// A record predicate.
pub type FilterByFn = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Comparison applied by a property filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterOperator {
    /// `=`
    #[default]
    #[serde(rename = "=")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// `*`: string containment.
    #[serde(rename = "*")]
    Contains,
    /// `startsWith`
    #[serde(rename = "startsWith")]
    StartsWith,
    /// `endsWith`
    #[serde(rename = "endsWith")]
    EndsWith,
    /// `isIncludedIn`: the record value is one of the filter's list values.
    #[serde(rename = "isIncludedIn")]
    IsIncludedIn,
    /// `includes`: the record's list (or string) value contains the filter value.
    #[serde(rename = "includes")]
    Includes,
    /// `matches`: the record value matches a regular expression.
    #[serde(rename = "matches")]
    Matches,
}

impl FilterOperator {
    /// The textual form of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Ne => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Ge => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Le => "<=",
            FilterOperator::Contains => "*",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::IsIncludedIn => "isIncludedIn",
            FilterOperator::Includes => "includes",
            FilterOperator::Matches => "matches",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for FilterOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "=" | "==" | "===" => FilterOperator::Eq,
            "!=" | "!==" => FilterOperator::Ne,
            ">" => FilterOperator::Gt,
            ">=" => FilterOperator::Ge,
            "<" => FilterOperator::Lt,
            "<=" => FilterOperator::Le,
            "*" | "like" => FilterOperator::Contains,
            "startsWith" => FilterOperator::StartsWith,
            "endsWith" => FilterOperator::EndsWith,
            "isIncludedIn" => FilterOperator::IsIncludedIn,
            "includes" => FilterOperator::Includes,
            "matches" => FilterOperator::Matches,
            other => return Err(Error::invalid_data(format!("unknown filter operator '{other}'"))),
        })
    }
}

/// A single filter.
#[derive(Clone)]
pub struct CollectionFilter {
    id: String,
    property: Option<String>,
    operator: FilterOperator,
    value: FieldValue,
    filter_by: Option<FilterByFn>,
    pattern: Option<Regex>,
    disabled: bool,
    internal: bool,
    case_sensitive: bool,
}

impl CollectionFilter {
    /// An equality filter on `property`. The filter id defaults to the property name.
    pub fn new(property: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let property = property.into();
        Self {
            id: property.clone(),
            property: Some(property),
            operator: FilterOperator::Eq,
            value: value.into(),
            filter_by: None,
            pattern: None,
            disabled: false,
            internal: false,
            case_sensitive: true,
        }
    }

    /// A predicate filter with a generated id.
    pub fn by<F>(filter: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self::by_fn(Arc::new(filter))
    }

    /// A predicate filter from an already shared function.
    pub fn by_fn(filter: FilterByFn) -> Self {
        Self {
            id: format!("b-filter-{}", NEXT_FILTER_ID.fetch_add(1, Ordering::Relaxed)),
            property: None,
            operator: FilterOperator::Eq,
            value: FieldValue::None,
            filter_by: Some(filter),
            pattern: None,
            disabled: false,
            internal: false,
            case_sensitive: true,
        }
    }

    /// A `matches` filter testing `property` against a regular expression.
    pub fn matches(property: impl Into<String>, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let mut filter = Self::new(property, pattern).operator(FilterOperator::Matches);
        filter.pattern = Some(regex);
        Ok(filter)
    }

    /// Set the operator.
    pub fn operator(mut self, operator: FilterOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Set the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set whether the filter is disabled. Disabled filters are kept but not applied.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Mark the filter as internal (added by a feature rather than the user).
    pub fn internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }

    /// Set whether string comparisons are case sensitive (default `true`).
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub(crate) fn set_internal(&mut self, internal: bool) {
        self.internal = internal;
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The filter id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The tested property, `None` for predicate filters.
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// The comparison operator.
    pub fn filter_operator(&self) -> FilterOperator {
        self.operator
    }

    /// The comparison value.
    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Returns `true` for predicate filters.
    pub fn is_function(&self) -> bool {
        self.filter_by.is_some()
    }

    /// Returns `true` if the filter is kept but not applied.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns `true` for filters added internally.
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// A string identifying what this filter tests, used to detect no-op reapplies.
    pub fn signature(&self) -> String {
        match &self.filter_by {
            Some(f) => format!("{}|fn@{:p}", self.id, Arc::as_ptr(f) as *const ()),
            None => format!(
                "{}|{}|{}|{:?}|{}",
                self.id,
                self.property.as_deref().unwrap_or_default(),
                self.operator,
                self.value,
                self.case_sensitive
            ),
        }
    }

    // -------------------------------------------------------------------------
    // Evaluation
    // -------------------------------------------------------------------------

    /// Test a record against the filter.
    pub fn test(&self, record: &Record) -> bool {
        if let Some(filter_by) = &self.filter_by {
            return filter_by(record);
        }
        let Some(property) = self.property.as_deref() else {
            return true;
        };
        self.test_value(&record.get(property))
    }

    fn test_value(&self, actual: &FieldValue) -> bool {
        match self.operator {
            FilterOperator::Eq => self.equals(actual, &self.value),
            FilterOperator::Ne => !self.equals(actual, &self.value),
            FilterOperator::Gt => actual.is_some() && actual.compare(&self.value).is_gt(),
            FilterOperator::Ge => actual.is_some() && actual.compare(&self.value).is_ge(),
            FilterOperator::Lt => actual.is_some() && actual.compare(&self.value).is_lt(),
            FilterOperator::Le => actual.is_some() && actual.compare(&self.value).is_le(),
            FilterOperator::Contains => self.text(actual).contains(&self.text(&self.value)),
            FilterOperator::StartsWith => self.text(actual).starts_with(&self.text(&self.value)),
            FilterOperator::EndsWith => self.text(actual).ends_with(&self.text(&self.value)),
            FilterOperator::IsIncludedIn => match &self.value {
                FieldValue::List(items) => items.iter().any(|item| self.equals(actual, item)),
                other => self.equals(actual, other),
            },
            FilterOperator::Includes => match actual {
                FieldValue::List(items) => items.iter().any(|item| self.equals(item, &self.value)),
                FieldValue::String(_) => self.text(actual).contains(&self.text(&self.value)),
                _ => false,
            },
            FilterOperator::Matches => self
                .pattern
                .as_ref()
                .is_some_and(|regex| regex.is_match(&actual.to_string())),
        }
    }

    fn equals(&self, a: &FieldValue, b: &FieldValue) -> bool {
        match (a, b) {
            (FieldValue::String(x), FieldValue::String(y)) if !self.case_sensitive => {
                x.to_lowercase() == y.to_lowercase()
            }
            _ => a.loosely_equals(b),
        }
    }

    fn text(&self, value: &FieldValue) -> String {
        let text = value.to_string();
        if self.case_sensitive { text } else { text.to_lowercase() }
    }
}

impl fmt::Debug for CollectionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionFilter")
            .field("id", &self.id)
            .field("property", &self.property)
            .field("operator", &self.operator)
            .field("value", &self.value)
            .field("function", &self.filter_by.is_some())
            .field("disabled", &self.disabled)
            .field("internal", &self.internal)
            .finish()
    }
}

impl fmt::Display for CollectionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.property {
            Some(property) if self.filter_by.is_none() => {
                write!(f, "{} {} {}", property, self.operator, self.value)
            }
            _ => write!(f, "{}", self.id),
        }
    }
}

impl horizon_grid_core::Keyed for CollectionFilter {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }
}

impl<V: Into<FieldValue>> From<(&str, V)> for CollectionFilter {
    fn from((property, value): (&str, V)) -> Self {
        CollectionFilter::new(property, value)
    }
}

/// One filter specification in any accepted shape.
#[derive(Clone)]
pub enum FilterSpec {
    /// A ready filter.
    Filter(CollectionFilter),
    /// An equality test.
    Property { property: String, value: FieldValue },
    /// A predicate.
    Function(FilterByFn),
    /// Several specifications.
    Many(Vec<FilterSpec>),
}

impl FilterSpec {
    /// A predicate specification.
    pub fn function<F>(filter: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        FilterSpec::Function(Arc::new(filter))
    }

    /// Flatten into concrete filters.
    pub fn into_filters(self) -> Vec<CollectionFilter> {
        match self {
            FilterSpec::Filter(filter) => vec![filter],
            FilterSpec::Property { property, value } => {
                vec![CollectionFilter::new(property, value)]
            }
            FilterSpec::Function(filter) => vec![CollectionFilter::by_fn(filter)],
            FilterSpec::Many(specs) => {
                specs.into_iter().flat_map(FilterSpec::into_filters).collect()
            }
        }
    }
}

impl From<CollectionFilter> for FilterSpec {
    fn from(filter: CollectionFilter) -> Self {
        FilterSpec::Filter(filter)
    }
}

impl From<Vec<CollectionFilter>> for FilterSpec {
    fn from(filters: Vec<CollectionFilter>) -> Self {
        FilterSpec::Many(filters.into_iter().map(FilterSpec::Filter).collect())
    }
}

impl<V: Into<FieldValue>> From<(&str, V)> for FilterSpec {
    fn from((property, value): (&str, V)) -> Self {
        FilterSpec::Property {
            property: property.to_string(),
            value: value.into(),
        }
    }
}

impl fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::Filter(filter) => f.debug_tuple("Filter").field(filter).finish(),
            FilterSpec::Property { property, value } => f
                .debug_struct("Property")
                .field("property", property)
                .field("value", value)
                .finish(),
            FilterSpec::Function(_) => f.write_str("Function"),
            FilterSpec::Many(specs) => f.debug_tuple("Many").field(specs).finish(),
        }
    }
}

/// Options form of a filter request.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Filters to add.
    pub filters: Vec<FilterSpec>,
    /// Clear existing filters first.
    pub replace: bool,
    /// Apply without firing events.
    pub silent: bool,
    /// Mark the added filters as internal.
    pub internal: bool,
}

impl FilterOptions {
    /// Options adding `filters`.
    pub fn new(filters: impl IntoIterator<Item = FilterSpec>) -> Self {
        Self {
            filters: filters.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Clear existing filters first.
    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    /// Apply without firing events.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Mark the added filters as internal.
    pub fn internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }
}

/// What [`Store::filter`](super::Store::filter) should do.
#[derive(Debug, Clone)]
pub enum FilterRequest {
    /// Re-run the current filters.
    Reapply,
    /// Add filters, then apply.
    Add(FilterSpec),
    /// Add filters with options, then apply.
    Options(FilterOptions),
}

impl From<FilterSpec> for FilterRequest {
    fn from(spec: FilterSpec) -> Self {
        FilterRequest::Add(spec)
    }
}

impl From<CollectionFilter> for FilterRequest {
    fn from(filter: CollectionFilter) -> Self {
        FilterRequest::Add(FilterSpec::Filter(filter))
    }
}

impl From<Vec<CollectionFilter>> for FilterRequest {
    fn from(filters: Vec<CollectionFilter>) -> Self {
        FilterRequest::Add(filters.into())
    }
}

impl From<FilterOptions> for FilterRequest {
    fn from(options: FilterOptions) -> Self {
        FilterRequest::Options(options)
    }
}

/// Result of a filter request.
#[derive(Debug, Clone)]
pub enum FilterOutcome {
    /// Nothing was filtered before or after the request; no pass ran.
    Unchanged,
    /// Filtering is suspended; the pass runs on the matching resume.
    Deferred,
    /// A pass ran.
    Applied(FilterDelta),
}

impl FilterOutcome {
    /// The delta of an applied pass.
    pub fn delta(&self) -> Option<&FilterDelta> {
        match self {
            FilterOutcome::Applied(delta) => Some(delta),
            _ => None,
        }
    }
}

/// Records that entered and left the visible sequence during a pass.
#[derive(Debug, Clone, Default)]
pub struct FilterDelta {
    pub added: Vec<Record>,
    pub removed: Vec<Record>,
    /// Visible count before the pass.
    pub old_count: usize,
    /// Visible count after the pass.
    pub count: usize,
}
