//! Row sources.
//!
//! A row source is a forward-only stream of result-set rows. The driver
//! closes it on every exit path, including early drops of a lazy iterator.

use aquifer_core::{ColumnList, Result, Row, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A forward-only stream of rows.
pub trait RowSource {
    /// Fetch the next row, `None` at end of stream.
    fn next_row(&mut self) -> Result<Option<Row>>;

    /// Release the underlying resources. Must be idempotent.
    fn close(&mut self);
}

/// An in-memory row source over prepared fixtures.
///
/// All rows share one column list; rows shorter than the column list are
/// padded with NULL, which is how outer joins surface absent children.
#[derive(Debug)]
pub struct ArrayRowSource {
    columns: Arc<ColumnList>,
    rows: std::vec::IntoIter<Vec<Value>>,
    closed: Arc<AtomicBool>,
}

impl ArrayRowSource {
    /// Create a source from column names and row values.
    #[must_use]
    pub fn new(columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let names = columns.iter().map(ToString::to_string).collect();
        Self {
            columns: Arc::new(ColumnList::new(names)),
            rows: rows.into_iter(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A flag that flips to `true` once the source is closed.
    ///
    /// Lets tests observe that the driver released the source on every
    /// exit path.
    #[must_use]
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }
}

impl RowSource for ArrayRowSource {
    fn next_row(&mut self) -> Result<Option<Row>> {
        if self.closed.load(Ordering::Relaxed) {
            return Ok(None);
        }
        Ok(self.rows.next().map(|mut values| {
            values.resize(self.columns.len(), Value::Null);
            Row::with_columns(Arc::clone(&self.columns), values)
        }))
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_in_order_then_end() {
        let mut source = ArrayRowSource::new(
            &["u__id"],
            vec![vec![Value::Int(1)], vec![Value::Int(2)]],
        );

        let row = source.next_row().unwrap().unwrap();
        assert_eq!(row.get_by_name("u__id"), Some(&Value::Int(1)));
        let row = source.next_row().unwrap().unwrap();
        assert_eq!(row.get_by_name("u__id"), Some(&Value::Int(2)));
        assert!(source.next_row().unwrap().is_none());
    }

    #[test]
    fn test_short_rows_padded_with_null() {
        let mut source =
            ArrayRowSource::new(&["u__id", "a__id"], vec![vec![Value::Int(1)]]);
        let row = source.next_row().unwrap().unwrap();
        assert_eq!(row.get_by_name("a__id"), Some(&Value::Null));
    }

    #[test]
    fn test_close_stops_iteration() {
        let mut source = ArrayRowSource::new(&["u__id"], vec![vec![Value::Int(1)]]);
        let closed = source.closed_flag();

        source.close();
        assert!(closed.load(Ordering::Relaxed));
        assert!(source.next_row().unwrap().is_none());
        // idempotent
        source.close();
    }
}
