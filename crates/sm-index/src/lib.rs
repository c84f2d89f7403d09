#![forbid(unsafe_code)]

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IndexLabel {
    Int64(i64),
}

impl From<i64> for IndexLabel {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

/// Row labels of a table. A freshly loaded table is labelled `0..n` by
/// source position, and the labels ride along through every row operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    labels: Vec<IndexLabel>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("row position {position} is out of bounds for index of length {len}")]
    PositionOutOfBounds { position: usize, len: usize },
    #[error("mask length {mask_len} does not match index length {index_len}")]
    MaskLengthMismatch { index_len: usize, mask_len: usize },
}

impl Index {
    #[must_use]
    pub fn new(labels: Vec<IndexLabel>) -> Self {
        Self { labels }
    }

    /// Positional labels `0..len`.
    #[must_use]
    pub fn range(len: usize) -> Self {
        Self::new((0..len as i64).map(IndexLabel::from).collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn labels(&self) -> &[IndexLabel] {
        &self.labels
    }

    pub fn take(&self, positions: &[usize]) -> Result<Self, IndexError> {
        let labels = positions
            .iter()
            .map(|&position| {
                self.labels
                    .get(position)
                    .cloned()
                    .ok_or(IndexError::PositionOutOfBounds {
                        position,
                        len: self.labels.len(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(labels))
    }

    pub fn filter_mask(&self, mask: &[bool]) -> Result<Self, IndexError> {
        if mask.len() != self.labels.len() {
            return Err(IndexError::MaskLengthMismatch {
                index_len: self.labels.len(),
                mask_len: mask.len(),
            });
        }

        let labels = self
            .labels
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(label, _)| label.clone())
            .collect();
        Ok(Self::new(labels))
    }

    /// True when every label of `self` also appears in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        let universe = other.labels.iter().collect::<HashSet<_>>();
        self.labels.iter().all(|label| universe.contains(label))
    }
}
