//! Sort keys over model fields

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::filter::{FieldValue, FilterTarget};

/// Models that can be ordered by [`Sort<F>`] keys.
///
/// Every [`FilterTarget`] sorts by the same field values.
pub trait SortTarget<F> {
    /// The sort key for `field`.
    fn sort_value(&self, field: &F) -> FieldValue;
}

impl<F, T: FilterTarget<F>> SortTarget<F> for T {
    fn sort_value(&self, field: &F) -> FieldValue {
        self.field_value(field)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

/// A single sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort<F> {
    /// Field to sort by
    pub field: F,
    /// Direction
    pub direction: SortDirection,
}

impl<F> Sort<F> {
    /// Ascending sort on `field`
    pub fn asc(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort on `field`
    pub fn desc(field: F) -> Self {
        Self {
            field,
            direction: SortDirection::Descending,
        }
    }

    /// Compare two models by this key.
    pub fn compare<T: SortTarget<F>>(&self, a: &T, b: &T) -> Ordering {
        let ordering = a
            .sort_value(&self.field)
            .sort_compare(&b.sort_value(&self.field));
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Lexicographic comparison over `sorts`; `Equal` when every key ties.
pub fn compare_by<F, T: SortTarget<F>>(sorts: &[Sort<F>], a: &T, b: &T) -> Ordering {
    sorts
        .iter()
        .map(|sort| sort.compare(a, b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    enum Field {
        Score,
        Name,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Row(i64, &'static str);

    impl FilterTarget<Field> for Row {
        fn field_value(&self, field: &Field) -> FieldValue {
            match field {
                Field::Score => self.0.into(),
                Field::Name => self.1.into(),
            }
        }
    }

    #[test]
    fn sorts_lexicographically_and_stably() {
        let sorts = vec![Sort::desc(Field::Score), Sort::asc(Field::Name)];
        let mut rows = vec![Row(1, "b"), Row(2, "z"), Row(1, "a"), Row(2, "c")];
        rows.sort_by(|a, b| compare_by(&sorts, a, b));
        assert_eq!(rows, vec![Row(2, "c"), Row(2, "z"), Row(1, "a"), Row(1, "b")]);
    }

    #[test]
    fn no_keys_keeps_order() {
        let mut rows = vec![Row(3, "c"), Row(1, "a"), Row(2, "b")];
        rows.sort_by(|a, b| compare_by::<Field, _>(&[], a, b));
        assert_eq!(rows, vec![Row(3, "c"), Row(1, "a"), Row(2, "b")]);
    }
}
