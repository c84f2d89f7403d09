#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sm_dataset::{DatasetSummary, MAJOR_GENRE, MPAA_RATING, MpaaRating, RELEASE_YEAR, UnknownRating};
use sm_frame::{FrameError, Table};
use sm_types::Scalar;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("year bound {value:?} is not an integer")]
    InvalidYearBound { value: String },
    #[error(transparent)]
    UnknownRating(#[from] UnknownRating),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// An inclusive release-year bound. UI controls hand these over as text;
/// they must become integers before any comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearBound(pub i32);

impl YearBound {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        raw.trim()
            .parse::<i32>()
            .map(Self)
            .map_err(|_| QueryError::InvalidYearBound {
                value: raw.to_owned(),
            })
    }
}

impl FromStr for YearBound {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<i32> for YearBound {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for YearBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A row predicate over a table. Missing cells never satisfy a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    InSet {
        column: String,
        values: BTreeSet<String>,
    },
    Between {
        column: String,
        low: i64,
        high: i64,
    },
    And {
        terms: Vec<Predicate>,
    },
}

impl Predicate {
    fn matches(&self, table: &Table, row: usize) -> Result<bool, QueryError> {
        match self {
            Self::InSet { column, values } => Ok(table
                .require_column(column)?
                .value(row)
                .and_then(Scalar::as_str)
                .is_some_and(|cell| values.contains(cell))),
            Self::Between { column, low, high } => Ok(table
                .require_column(column)?
                .value(row)
                .and_then(Scalar::as_i64)
                .is_some_and(|cell| *low <= cell && cell <= *high)),
            Self::And { terms } => {
                for term in terms {
                    if !term.matches(table, row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    fn check_columns(&self, table: &Table) -> Result<(), QueryError> {
        match self {
            Self::InSet { column, .. } | Self::Between { column, .. } => {
                table.require_column(column)?;
                Ok(())
            }
            Self::And { terms } => terms.iter().try_for_each(|term| term.check_columns(table)),
        }
    }
}

/// Evaluate `predicate` for every row.
pub fn evaluate_mask(predicate: &Predicate, table: &Table) -> Result<Vec<bool>, QueryError> {
    predicate.check_columns(table)?;
    (0..table.len())
        .map(|row| predicate.matches(table, row))
        .collect()
}

/// Keep the rows matching `predicate`, in their original order.
pub fn filter_on_predicate(predicate: &Predicate, table: &Table) -> Result<Table, QueryError> {
    let mask = evaluate_mask(predicate, table)?;
    Ok(table.filter_rows(&mask)?)
}

/// The user's choice of genres, ratings and an inclusive year range.
///
/// An empty genre or rating set admits nothing. Turning an untouched
/// checklist into "everything" is a caller decision; see
/// [`RawSelection::resolve`] and [`EmptySetPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub genres: BTreeSet<String>,
    pub ratings: BTreeSet<MpaaRating>,
    pub year_from: YearBound,
    pub year_to: YearBound,
}

impl FilterSelection {
    pub fn new<G, R>(genres: G, ratings: R, year_from: YearBound, year_to: YearBound) -> Self
    where
        G: IntoIterator,
        G::Item: Into<String>,
        R: IntoIterator<Item = MpaaRating>,
    {
        Self {
            genres: genres.into_iter().map(Into::into).collect(),
            ratings: ratings.into_iter().collect(),
            year_from,
            year_to,
        }
    }

    #[must_use]
    pub fn to_predicate(&self) -> Predicate {
        Predicate::And {
            terms: vec![
                Predicate::InSet {
                    column: MAJOR_GENRE.to_owned(),
                    values: self.genres.clone(),
                },
                Predicate::InSet {
                    column: MPAA_RATING.to_owned(),
                    values: self
                        .ratings
                        .iter()
                        .map(|rating| rating.as_str().to_owned())
                        .collect(),
                },
                Predicate::Between {
                    column: RELEASE_YEAR.to_owned(),
                    low: i64::from(self.year_from.0),
                    high: i64::from(self.year_to.0),
                },
            ],
        }
    }

    pub fn apply(&self, table: &Table) -> Result<Table, QueryError> {
        let out = filter_on_predicate(&self.to_predicate(), table)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            genres = self.genres.len(),
            ratings = self.ratings.len(),
            year_from = self.year_from.0,
            year_to = self.year_to.0,
            rows_in = table.len(),
            rows_out = out.len(),
            "filtered movies"
        );

        Ok(out)
    }
}

/// Rows whose genre, rating and release year all pass the selection.
/// `year_from > year_to` yields an empty table.
pub fn filter(
    table: &Table,
    genres: &BTreeSet<String>,
    ratings: &BTreeSet<MpaaRating>,
    year_from: YearBound,
    year_to: YearBound,
) -> Result<Table, QueryError> {
    FilterSelection {
        genres: genres.clone(),
        ratings: ratings.clone(),
        year_from,
        year_to,
    }
    .apply(table)
}

/// How the caller reads an empty genre or rating checklist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySetPolicy {
    /// Nothing selected means nothing shown.
    #[default]
    ExcludeAll,
    /// Nothing selected means every known value is selected.
    Unrestricted,
}

/// Control values exactly as a UI hands them over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSelection {
    pub genres: Vec<String>,
    pub ratings: Vec<String>,
    pub year_from: Option<String>,
    pub year_to: Option<String>,
}

impl RawSelection {
    /// Sanitize raw control values into a [`FilterSelection`].
    ///
    /// Empty checklists are read through `policy`; absent year bounds fall
    /// back to the dataset's first and last year.
    pub fn resolve(
        &self,
        policy: EmptySetPolicy,
        summary: &DatasetSummary,
    ) -> Result<FilterSelection, QueryError> {
        let genres = if self.genres.is_empty() && policy == EmptySetPolicy::Unrestricted {
            summary.genres.iter().cloned().collect()
        } else {
            self.genres.iter().cloned().collect()
        };

        let ratings = if self.ratings.is_empty() && policy == EmptySetPolicy::Unrestricted {
            summary.ratings.iter().copied().collect()
        } else {
            self.ratings
                .iter()
                .map(|raw| raw.parse::<MpaaRating>())
                .collect::<Result<BTreeSet<_>, _>>()?
        };

        let (first, last) = summary.default_year_bounds().unwrap_or((0, 0));
        let year_from = self
            .year_from
            .as_deref()
            .map_or(Ok(YearBound(first)), YearBound::parse)?;
        let year_to = self
            .year_to
            .as_deref()
            .map_or(Ok(YearBound(last)), YearBound::parse)?;

        Ok(FilterSelection {
            genres,
            ratings,
            year_from,
            year_to,
        })
    }
}
