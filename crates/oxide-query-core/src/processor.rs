//! Turning raw row-sets into caller-requested shapes.
//!
//! A [`ResultProcessor`] consumes the [`RowSet`] of one statement. Closures
//! `FnOnce(RowSet) -> Result<T>` are processors, and this module ships the
//! common shapes as constructors.
//!
//! ```rust
//! use oxide_query_core::processor::{self, ResultProcessor};
//! use oxide_query_core::{RowSet, SqlValue};
//!
//! let mut set = RowSet::new(["total"]);
//! set.push_row(vec![SqlValue::Int(42)]).unwrap();
//! let total: i64 = Box::new(processor::scalar::<i64>()).process(set).unwrap();
//! assert_eq!(total, 42);
//! ```

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::rows::{Row, RowSet};
use crate::value::FromSqlValue;

/// Converts a row-set into a `T`.
pub trait ResultProcessor<T>: Send {
    /// Consumes the processor and the row-set.
    ///
    /// # Errors
    ///
    /// Returns an error when the row-set does not have the expected shape.
    fn process(self: Box<Self>, rows: RowSet) -> Result<T>;
}

impl<T, F> ResultProcessor<T> for F
where
    F: FnOnce(RowSet) -> Result<T> + Send,
{
    fn process(self: Box<Self>, rows: RowSet) -> Result<T> {
        (*self)(rows)
    }
}

/// How column names are matched when mapping rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnMatching {
    /// Names must match exactly.
    #[default]
    Exact,
    /// Names match ignoring ASCII case.
    CaseInsensitive,
}

/// Row-mapping configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Column-name matching policy.
    pub column_matching: ColumnMatching,
}

impl MappingConfig {
    /// Reads a named column from `row` under this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Column`] when the column is missing or has the wrong
    /// type.
    pub fn column<T: FromSqlValue>(&self, row: &Row, name: &str) -> Result<T> {
        match self.column_matching {
            ColumnMatching::Exact => row.get(name),
            ColumnMatching::CaseInsensitive => row.get_ignore_case(name),
        }
    }
}

/// Types that can be built from one row.
pub trait FromRow: Sized {
    /// Builds a value from `row`.
    ///
    /// # Errors
    ///
    /// Returns an error when a required column is missing or mistyped.
    fn from_row(row: &Row, mapping: &MappingConfig) -> Result<Self>;
}

macro_rules! impl_from_row_tuple {
    ($($ty:ident => $idx:tt),+) => {
        impl<$($ty: FromSqlValue),+> FromRow for ($($ty,)+) {
            fn from_row(row: &Row, _mapping: &MappingConfig) -> Result<Self> {
                Ok(($(row.get::<$ty, usize>($idx)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(A => 0);
impl_from_row_tuple!(A => 0, B => 1);
impl_from_row_tuple!(A => 0, B => 1, C => 2);
impl_from_row_tuple!(A => 0, B => 1, C => 2, D => 3);

fn first_of(rows: RowSet) -> Option<Row> {
    rows.into_rows().into_iter().next()
}

/// Hands back the row-set unchanged.
#[must_use]
pub fn rows() -> impl ResultProcessor<RowSet> {
    |rows: RowSet| -> Result<RowSet> { Ok(rows) }
}

/// Hands back the number of rows the statement changed.
#[must_use]
pub fn rows_affected() -> impl ResultProcessor<u64> {
    |rows: RowSet| -> Result<u64> { Ok(rows.rows_affected()) }
}

/// Ignores the row-set.
#[must_use]
pub fn discard() -> impl ResultProcessor<()> {
    |_: RowSet| -> Result<()> { Ok(()) }
}

/// Hands back the first row; an empty row-set is an error.
#[must_use]
pub fn first_row() -> impl ResultProcessor<Row> {
    |rows: RowSet| -> Result<Row> {
        first_of(rows).ok_or_else(|| Error::Processor(String::from("expected at least one row")))
    }
}

/// Hands back the first row, if any.
#[must_use]
pub fn optional_row() -> impl ResultProcessor<Option<Row>> {
    |rows: RowSet| -> Result<Option<Row>> { Ok(first_of(rows)) }
}

/// Hands back the first column of the first row.
#[must_use]
pub fn scalar<T: FromSqlValue + Send>() -> impl ResultProcessor<T> {
    |rows: RowSet| -> Result<T> {
        let row = first_of(rows)
            .ok_or_else(|| Error::Processor(String::from("expected a scalar, got no rows")))?;
        row.get(0_usize)
    }
}

/// Maps every row through [`FromRow`].
#[must_use]
pub fn list<T: FromRow + Send>(mapping: &MappingConfig) -> impl ResultProcessor<Vec<T>> {
    let mapping = *mapping;
    move |rows: RowSet| -> Result<Vec<T>> {
        rows.iter()
            .map(|row| T::from_row(row, &mapping))
            .collect::<Result<Vec<_>>>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;

    #[derive(Debug, PartialEq)]
    struct User {
        id: i64,
        name: String,
    }

    impl FromRow for User {
        fn from_row(row: &Row, mapping: &MappingConfig) -> Result<Self> {
            Ok(Self {
                id: mapping.column(row, "id")?,
                name: mapping.column(row, "name")?,
            })
        }
    }

    fn users() -> RowSet {
        let mut set = RowSet::new(["ID", "NAME"]).with_rows_affected(0);
        set.push_row(vec![SqlValue::Int(1), SqlValue::Text(String::from("ann"))])
            .unwrap();
        set.push_row(vec![SqlValue::Int(2), SqlValue::Text(String::from("bob"))])
            .unwrap();
        set
    }

    fn run<T, P: ResultProcessor<T>>(processor: P, rows: RowSet) -> Result<T> {
        Box::new(processor).process(rows)
    }

    #[test]
    fn test_list_with_case_insensitive_mapping() {
        let mapping = MappingConfig {
            column_matching: ColumnMatching::CaseInsensitive,
        };
        let mapped: Vec<User> = run(list(&mapping), users()).unwrap();
        assert_eq!(mapped.len(), 2);
        assert_eq!(
            mapped[1],
            User {
                id: 2,
                name: String::from("bob")
            }
        );

        let exact = run(list::<User>(&MappingConfig::default()), users());
        assert!(matches!(exact, Err(Error::Column { .. })));
    }

    #[test]
    fn test_tuple_rows() {
        let pairs: Vec<(i64, String)> = run(list(&MappingConfig::default()), users()).unwrap();
        assert_eq!(pairs[0], (1, String::from("ann")));
    }

    #[test]
    fn test_first_and_optional_row() {
        assert!(run(first_row(), RowSet::empty()).is_err());
        assert!(run(optional_row(), RowSet::empty()).unwrap().is_none());
        let row = run(first_row(), users()).unwrap();
        assert_eq!(row.get::<i64, _>(0).unwrap(), 1);
    }

    #[test]
    fn test_scalar_and_counts() {
        assert_eq!(run(scalar::<i64>(), users()).unwrap(), 1);
        assert!(run(scalar::<i64>(), RowSet::empty()).is_err());
        assert_eq!(
            run(rows_affected(), RowSet::empty().with_rows_affected(4)).unwrap(),
            4
        );
        run(discard(), users()).unwrap();
    }

    #[test]
    fn test_closure_processor() {
        let count = run(|rows: RowSet| -> Result<usize> { Ok(rows.len()) }, users()).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_mapping_config_deserializes() {
        let config: MappingConfig =
            serde_json::from_str(r#"{"column_matching": "case_insensitive"}"#).unwrap();
        assert_eq!(config.column_matching, ColumnMatching::CaseInsensitive);
        let defaults: MappingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults, MappingConfig::default());
    }
}
