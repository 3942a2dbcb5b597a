use std::collections::HashMap;
use std::sync::Arc;

use crate::types::SqlValue;

/// A single row from a query result.
///
/// Column names are shared across all rows of a result set; values are
/// reachable both by name and by position.
#[derive(Debug, Clone)]
pub struct Row {
    /// The column names for this row (shared across the result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<SqlValue>,
    // Name-to-index lookup shared across the result set.
    #[doc(hidden)]
    pub(crate) column_index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Build a standalone row. The name-to-index map is derived on the spot;
    /// rows produced by a [`ResultSet`] share one map instead.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            values,
            column_index,
        }
    }

    /// Get the index of a column by name.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index.get(column_name) {
            return Some(idx);
        }
        // Fall back to linear search
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value by column name, or `None` if the column doesn't exist.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value by column position, or `None` if out of bounds.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Consume the row, keeping only the positional values.
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

/// A fully materialized result of a query.
///
/// Holds the returned rows plus the affected-row count the driver reported
/// for the statement (for DML the count is the interesting part and `rows`
/// is empty).
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub rows: Vec<Row>,
    /// The number of rows the driver reported as affected by the statement
    pub rows_affected: u64,
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create an empty result set with preallocated row capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            rows: Vec::with_capacity(capacity),
            rows_affected: 0,
            column_names: None,
            column_index: None,
        }
    }

    /// Set the column names shared by all rows of this result set.
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(Arc::new(index_columns(&column_names)));
        self.column_names = Some(column_names);
    }

    /// Column names of this result set, if any rows or metadata were seen.
    #[must_use]
    pub fn column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append a row built from positional values, sharing this result set's
    /// column metadata. No-op if column names were never set.
    pub fn add_row_values(&mut self, values: Vec<SqlValue>) {
        if let (Some(column_names), Some(column_index)) =
            (&self.column_names, &self.column_index)
        {
            self.rows.push(Row {
                column_names: Arc::clone(column_names),
                values,
                column_index: Arc::clone(column_index),
            });
        }
    }

    /// Number of rows in the result set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result set contains no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        let mut rs = ResultSet::with_capacity(2);
        rs.set_column_names(Arc::new(vec!["id".to_string(), "name".to_string()]));
        rs.add_row_values(vec![SqlValue::Int(1), SqlValue::Text("alice".into())]);
        rs.add_row_values(vec![SqlValue::Int(2), SqlValue::Text("bob".into())]);
        rs
    }

    #[test]
    fn rows_are_readable_by_name_and_position() {
        let rs = sample();
        assert_eq!(rs.len(), 2);
        let row = &rs.rows[0];
        assert_eq!(row.get("id").unwrap().as_int(), Some(&1));
        assert_eq!(row.get_by_index(1).unwrap().as_text(), Some("alice"));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_by_index(7), None);
    }

    #[test]
    fn rows_share_column_metadata() {
        let rs = sample();
        assert!(Arc::ptr_eq(
            &rs.rows[0].column_names,
            &rs.rows[1].column_names
        ));
        assert!(Arc::ptr_eq(
            &rs.rows[0].column_index,
            &rs.rows[1].column_index
        ));
    }

    #[test]
    fn add_row_values_without_metadata_is_a_no_op() {
        let mut rs = ResultSet::default();
        rs.add_row_values(vec![SqlValue::Int(1)]);
        assert!(rs.is_empty());
    }
}
