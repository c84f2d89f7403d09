#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sm_columnar::{Column, ColumnError};
use sm_index::{Index, IndexError};
use sm_types::{DType, Scalar};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("index length ({index_len}) does not match column length ({column_len})")]
    LengthMismatch { index_len: usize, column_len: usize },
    #[error("column {0:?} not found")]
    MissingColumn(String),
    #[error("column {name:?} has dtype {dtype:?}; a numeric column is required")]
    NonNumericColumn { name: String, dtype: DType },
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// An immutable in-memory table: named columns sharing one row index.
///
/// Every row operation returns a new table and carries the index labels of
/// the surviving rows, so a record keeps its identity from load to chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    index: Index,
    columns: BTreeMap<String, Column>,
}

impl Table {
    pub fn new(index: Index, columns: BTreeMap<String, Column>) -> Result<Self, FrameError> {
        for column in columns.values() {
            if column.len() != index.len() {
                return Err(FrameError::LengthMismatch {
                    index_len: index.len(),
                    column_len: column.len(),
                });
            }
        }

        Ok(Self { index, columns })
    }

    /// Build a table labelled `0..n` by position. Columns must agree on
    /// length; an empty list gives an empty table.
    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self, FrameError> {
        let len = columns.first().map_or(0, |(_, column)| column.len());
        Self::new(Index::range(len), columns.into_iter().collect())
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            index: Index::new(Vec::new()),
            columns: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column, FrameError> {
        self.column(name)
            .ok_or_else(|| FrameError::MissingColumn(name.to_owned()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn value(&self, column: &str, row: usize) -> Option<&Scalar> {
        self.column(column).and_then(|column| column.value(row))
    }

    /// Return a copy with `column` added, replacing any column of that name.
    pub fn with_column(&self, name: impl Into<String>, column: Column) -> Result<Self, FrameError> {
        let mut columns = self.columns.clone();
        columns.insert(name.into(), column);
        Self::new(self.index.clone(), columns)
    }

    /// Keep the rows whose mask bit is `true`, in their current order.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Self, FrameError> {
        let index = self.index.filter_mask(mask)?;
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| Ok((name.clone(), column.filter_mask(mask)?)))
            .collect::<Result<BTreeMap<_, _>, FrameError>>()?;

        #[cfg(feature = "tracing")]
        tracing::trace!(rows_in = self.len(), rows_out = index.len(), "filter_rows");

        Self::new(index, columns)
    }

    /// Gather rows by position, in the order given.
    pub fn take(&self, positions: &[usize]) -> Result<Self, FrameError> {
        let index = self.index.take(positions)?;
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| Ok((name.clone(), column.take(positions)?)))
            .collect::<Result<BTreeMap<_, _>, FrameError>>()?;
        Self::new(index, columns)
    }

    /// The first `k` rows; the whole table when it is shorter.
    pub fn head(&self, k: usize) -> Result<Self, FrameError> {
        let positions = (0..self.len().min(k)).collect::<Vec<_>>();
        self.take(&positions)
    }

    /// Drop every row whose `column` cell is missing.
    pub fn drop_missing(&self, column: &str) -> Result<Self, FrameError> {
        let mask = self.require_column(column)?.validity().bits().to_vec();
        self.filter_rows(&mask)
    }

    /// Sort rows by a numeric column, largest first. Equal keys keep their
    /// current relative order; missing keys sink to the end.
    pub fn sort_by_desc_stable(&self, column: &str) -> Result<Self, FrameError> {
        let keys = self.require_column(column)?;
        if !keys.is_numeric() {
            return Err(FrameError::NonNumericColumn {
                name: column.to_owned(),
                dtype: keys.dtype(),
            });
        }

        let sort_keys = keys
            .values()
            .iter()
            .map(|value| {
                if value.is_missing() {
                    None
                } else {
                    value.to_f64().ok()
                }
            })
            .collect::<Vec<_>>();

        let mut positions = (0..self.len()).collect::<Vec<_>>();
        // `sort_by` is stable, which gives the tie order for free.
        positions.sort_by(|&a, &b| match (sort_keys[a], sort_keys[b]) {
            (Some(left), Some(right)) => right.partial_cmp(&left).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        self.take(&positions)
    }
}

#[cfg(test)]
mod tests {
    use sm_columnar::Column;
    use sm_index::IndexLabel;
    use sm_types::{NullKind, Scalar};

    use super::{FrameError, Table};

    fn gross_table() -> Table {
        Table::from_columns(vec![
            (
                "Title".to_owned(),
                Column::from_values(vec![
                    Scalar::from("Alien"),
                    Scalar::from("Big"),
                    Scalar::from("Clue"),
                    Scalar::from("Dune"),
                ])
                .expect("titles"),
            ),
            (
                "US_Gross".to_owned(),
                Column::from_values(vec![
                    Scalar::Int64(10),
                    Scalar::Null(NullKind::Null),
                    Scalar::Int64(30),
                    Scalar::Int64(10),
                ])
                .expect("gross"),
            ),
        ])
        .expect("table")
    }

    #[test]
    fn sort_desc_is_stable_and_sinks_missing() {
        let sorted = gross_table()
            .sort_by_desc_stable("US_Gross")
            .expect("sort");
        assert_eq!(
            sorted.index().labels(),
            &[
                IndexLabel::Int64(2),
                IndexLabel::Int64(0),
                IndexLabel::Int64(3),
                IndexLabel::Int64(1)
            ]
        );
    }

    #[test]
    fn drop_missing_then_head_keeps_identity() {
        let table = gross_table().drop_missing("US_Gross").expect("dropna");
        assert_eq!(table.len(), 3);

        let top = table.head(2).expect("head");
        assert_eq!(top.index().labels(), &[0_i64.into(), 2_i64.into()]);
        assert_eq!(top.value("Title", 1), Some(&Scalar::from("Clue")));

        let all = table.head(50).expect("head past end");
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn sorting_text_and_unknown_columns_is_rejected() {
        let table = gross_table();
        assert!(matches!(
            table.sort_by_desc_stable("Title"),
            Err(FrameError::NonNumericColumn { .. })
        ));
        assert!(matches!(
            table.drop_missing("Worldwide_Gross"),
            Err(FrameError::MissingColumn(name)) if name == "Worldwide_Gross"
        ));
    }

    #[test]
    fn with_column_rejects_wrong_length() {
        let table = gross_table();
        let short = Column::from_values(vec![Scalar::Int64(1)]).expect("short");
        assert!(matches!(
            table.with_column("extra", short),
            Err(FrameError::LengthMismatch {
                index_len: 4,
                column_len: 1
            })
        ));
    }
}
