//! Filter expressions over model fields
//!
//! A [`Filter<F>`] is a closed expression tree over a per-model field enum
//! `F`. Models expose their fields as [`FieldValue`]s through
//! [`FilterTarget`]; evaluation is total and never fails. Comparing values
//! of different kinds is simply "no match".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::ids::FeedId;

/// A model field value as seen by filters and sorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Field is unset
    Null,
    /// Boolean field
    Bool(bool),
    /// Integer field (counts, scores)
    Int(i64),
    /// Text field (ids, names, enum tags)
    Text(String),
    /// List of strings (feeds, filter tags)
    TextList(Vec<String>),
    /// Timestamp field
    Time(DateTime<Utc>),
}

impl FieldValue {
    /// Whether the value is set.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Compare two values of the same kind.
    ///
    /// Returns `None` when the kinds differ or the kind has no order.
    pub fn partial_compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Int(a), FieldValue::Int(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Time(a), FieldValue::Time(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Ordering used for sorting: unset values first, mismatched kinds equal.
    pub fn sort_compare(&self, other: &FieldValue) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.partial_compare(other).unwrap_or(Ordering::Equal),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(i64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&FeedId> for FieldValue {
    fn from(value: &FeedId) -> Self {
        FieldValue::Text(value.raw_value())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::TextList(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Time(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Models that can be evaluated against a [`Filter<F>`].
pub trait FilterTarget<F> {
    /// The current value of `field`.
    fn field_value(&self, field: &F) -> FieldValue;
}

/// A filter expression over the fields `F` of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter<F> {
    /// Field equals the value
    Equal(F, FieldValue),
    /// Field differs from the value
    NotEqual(F, FieldValue),
    /// Field equals one of the values
    In(F, Vec<FieldValue>),
    /// List field contains the string, or text field contains the substring
    Contains(F, String),
    /// Field is set (`true`) or unset (`false`)
    Exists(F, bool),
    /// Field is strictly greater than the value
    GreaterThan(F, FieldValue),
    /// Field is greater than or equal to the value
    GreaterOrEqual(F, FieldValue),
    /// Field is strictly less than the value
    LessThan(F, FieldValue),
    /// Field is less than or equal to the value
    LessOrEqual(F, FieldValue),
    /// All sub-filters match (empty matches everything)
    And(Vec<Filter<F>>),
    /// Any sub-filter matches (empty matches nothing)
    Or(Vec<Filter<F>>),
    /// Sub-filter does not match
    Not(Box<Filter<F>>),
}

impl<F> Filter<F> {
    /// `field == value`
    pub fn equal(field: F, value: impl Into<FieldValue>) -> Self {
        Filter::Equal(field, value.into())
    }

    /// `field != value`
    pub fn not_equal(field: F, value: impl Into<FieldValue>) -> Self {
        Filter::NotEqual(field, value.into())
    }

    /// `field in values`
    pub fn one_of<V: Into<FieldValue>>(field: F, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(field, values.into_iter().map(Into::into).collect())
    }

    /// `field contains needle`
    pub fn contains(field: F, needle: impl Into<String>) -> Self {
        Filter::Contains(field, needle.into())
    }

    /// `field` is set
    pub fn exists(field: F) -> Self {
        Filter::Exists(field, true)
    }

    /// `field > value`
    pub fn greater_than(field: F, value: impl Into<FieldValue>) -> Self {
        Filter::GreaterThan(field, value.into())
    }

    /// `field < value`
    pub fn less_than(field: F, value: impl Into<FieldValue>) -> Self {
        Filter::LessThan(field, value.into())
    }

    /// Conjunction of `filters`
    pub fn and(filters: impl IntoIterator<Item = Filter<F>>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// Disjunction of `filters`
    pub fn or(filters: impl IntoIterator<Item = Filter<F>>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// Negation of `filter`
    pub fn negate(filter: Filter<F>) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Evaluate against a model.
    pub fn matches<T: FilterTarget<F>>(&self, target: &T) -> bool {
        match self {
            Filter::Equal(field, value) => target.field_value(field) == *value,
            Filter::NotEqual(field, value) => target.field_value(field) != *value,
            Filter::In(field, values) => {
                let current = target.field_value(field);
                values.iter().any(|v| *v == current)
            }
            Filter::Contains(field, needle) => match target.field_value(field) {
                FieldValue::TextList(items) => items.iter().any(|item| item == needle),
                FieldValue::Text(text) => text.contains(needle.as_str()),
                _ => false,
            },
            Filter::Exists(field, expected) => !target.field_value(field).is_null() == *expected,
            Filter::GreaterThan(field, value) => {
                compare(target, field, value, |o| o == Ordering::Greater)
            }
            Filter::GreaterOrEqual(field, value) => {
                compare(target, field, value, |o| o != Ordering::Less)
            }
            Filter::LessThan(field, value) => compare(target, field, value, |o| o == Ordering::Less),
            Filter::LessOrEqual(field, value) => {
                compare(target, field, value, |o| o != Ordering::Greater)
            }
            Filter::And(filters) => filters.iter().all(|f| f.matches(target)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(target)),
            Filter::Not(inner) => !inner.matches(target),
        }
    }
}

fn compare<F, T: FilterTarget<F>>(
    target: &T,
    field: &F,
    value: &FieldValue,
    accept: impl FnOnce(Ordering) -> bool,
) -> bool {
    target
        .field_value(field)
        .partial_compare(value)
        .is_some_and(accept)
}
