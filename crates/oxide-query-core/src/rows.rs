//! Result rows handed back by an executor.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::{FromSqlValue, SqlValue};

/// Something that selects a column of a [`Row`]: an ordinal or a name.
pub trait ColumnIndex {
    /// Resolves the position of the column.
    fn position(&self, columns: &[String]) -> Option<usize>;

    /// Describes the column for error messages.
    fn describe(&self) -> String;
}

impl ColumnIndex for usize {
    fn position(&self, columns: &[String]) -> Option<usize> {
        (*self < columns.len()).then_some(*self)
    }

    fn describe(&self) -> String {
        format!("#{self}")
    }
}

impl ColumnIndex for &str {
    fn position(&self, columns: &[String]) -> Option<usize> {
        columns.iter().position(|c| c == self)
    }

    fn describe(&self) -> String {
        String::from(*self)
    }
}

/// One row of a [`RowSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the raw values in column order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the raw value of a column.
    pub fn value<I: ColumnIndex>(&self, index: I) -> Option<&SqlValue> {
        index.position(&self.columns).and_then(|i| self.values.get(i))
    }

    /// Reads and converts a column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Column`] when the column does not exist or its value
    /// cannot be converted to `T`.
    pub fn get<T: FromSqlValue, I: ColumnIndex>(&self, index: I) -> Result<T> {
        let Some(value) = self.value(&index) else {
            return Err(Error::Column {
                column: index.describe(),
                reason: String::from("no such column"),
            });
        };
        T::from_sql_value(value).map_err(|reason| Error::Column {
            column: index.describe(),
            reason,
        })
    }

    /// Reads a column by name ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// As for [`Row::get`].
    pub fn get_ignore_case<T: FromSqlValue>(&self, name: &str) -> Result<T> {
        let position = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name));
        match position {
            Some(i) => self.get(i),
            None => Err(Error::Column {
                column: String::from(name),
                reason: String::from("no such column"),
            }),
        }
    }
}

impl<I: ColumnIndex> ColumnIndex for &I {
    fn position(&self, columns: &[String]) -> Option<usize> {
        (**self).position(columns)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// The rows produced by one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    columns: Arc<[String]>,
    rows: Vec<Row>,
    rows_affected: u64,
}

impl Default for RowSet {
    fn default() -> Self {
        Self {
            columns: Arc::from(Vec::new()),
            rows: Vec::new(),
            rows_affected: 0,
        }
    }
}

impl RowSet {
    /// Creates an empty row-set with the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            rows_affected: 0,
        }
    }

    /// Creates a row-set with no columns and no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the number of rows the statement changed.
    #[must_use]
    pub const fn with_rows_affected(mut self, rows_affected: u64) -> Self {
        self.rows_affected = rows_affected;
        self
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Column`] when the number of values differs from the
    /// number of columns.
    pub fn push_row(&mut self, values: Vec<SqlValue>) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(Error::Column {
                column: format!("#{}", values.len()),
                reason: format!(
                    "row has {} values for {} columns",
                    values.len(),
                    self.columns.len()
                ),
            });
        }
        self.rows.push(Row {
            columns: Arc::clone(&self.columns),
            values,
        });
        Ok(())
    }

    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the rows.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consumes the set and returns its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows the statement changed.
    #[must_use]
    pub const fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Returns the first row.
    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Iterates over the rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl IntoIterator for RowSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> RowSet {
        let mut set = RowSet::new(["id", "Name"]);
        set.push_row(vec![SqlValue::Int(1), SqlValue::Text(String::from("ann"))])
            .unwrap();
        set.push_row(vec![SqlValue::Int(2), SqlValue::Null]).unwrap();
        set
    }

    #[test]
    fn test_access_by_name_and_ordinal() {
        let set = users();
        let row = set.first().unwrap();
        assert_eq!(row.get::<i64, _>("id").unwrap(), 1);
        assert_eq!(row.get::<String, _>(1).unwrap(), "ann");
        assert_eq!(row.get_ignore_case::<String>("name").unwrap(), "ann");
        assert_eq!(set.rows()[1].get::<Option<String>, _>("Name").unwrap(), None);
    }

    #[test]
    fn test_missing_column() {
        let set = users();
        let err = set.rows()[0].get::<i64, _>("missing").unwrap_err();
        assert!(matches!(err, Error::Column { column, .. } if column == "missing"));
        assert!(set.rows()[0].get::<i64, _>(9).is_err());
    }

    #[test]
    fn test_push_row_checks_width() {
        let mut set = RowSet::new(["a"]);
        assert!(set.push_row(vec![]).is_err());
        assert!(set.is_empty());
    }

    #[test]
    fn test_rows_affected() {
        let set = RowSet::empty().with_rows_affected(3);
        assert_eq!(set.rows_affected(), 3);
        assert!(set.columns().is_empty());
    }
}
