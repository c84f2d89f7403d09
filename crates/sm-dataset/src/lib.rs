#![forbid(unsafe_code)]

//! Load the movies table and normalize its release dates.
//!
//! The raw `Release_Date` column holds text such as `"Jun 12 1998"`. Some
//! rows were keyed with a truncated century and land 100 years in the
//! future; [`normalize`] parses every date, shifts those back one century,
//! and derives `Release_Year` from the corrected date. Unparseable dates
//! become nulls instead of errors.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use sm_columnar::{Column, ColumnError};
use sm_frame::{FrameError, Table};
use sm_io::IoError;
use sm_types::{DType, NullKind, Scalar};
use thiserror::Error;

pub const TITLE: &str = "Title";
pub const RELEASE_DATE: &str = "Release_Date";
pub const RELEASE_YEAR: &str = "Release_Year";
pub const MAJOR_GENRE: &str = "Major_Genre";
pub const MPAA_RATING: &str = "MPAA_Rating";
pub const US_GROSS: &str = "US_Gross";
pub const WORLDWIDE_GROSS: &str = "Worldwide_Gross";

/// Textual release-date layouts seen in the movies source, tried in order.
pub const RELEASE_DATE_FORMATS: [&str; 4] = ["%b %d %Y", "%B %d %Y", "%d-%b-%y", "%m/%d/%Y"];

/// Last valid release date. Anything later is a century-rollover defect.
pub const LAST_VALID_RELEASE: (i32, u32, u32) = (2012, 12, 31);

const CENTURY: Months = Months::new(1200);

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset is missing required column {0:?}")]
    MissingColumn(&'static str),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Column(#[from] ColumnError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown MPAA rating {0:?}")]
pub struct UnknownRating(pub String);

/// The rating vocabulary offered to users.
///
/// `None` is the literal label `"None"`, not a missing value: a record with
/// no rating at all never matches any rating selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MpaaRating {
    #[serde(rename = "G")]
    G,
    #[serde(rename = "PG")]
    Pg,
    #[serde(rename = "PG-13")]
    Pg13,
    #[serde(rename = "R")]
    R,
    #[serde(rename = "NC-17")]
    Nc17,
    #[serde(rename = "Open")]
    Open,
    #[serde(rename = "None")]
    None,
}

impl MpaaRating {
    pub const ALL: [Self; 7] = [
        Self::G,
        Self::Pg,
        Self::Pg13,
        Self::R,
        Self::Nc17,
        Self::Open,
        Self::None,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::G => "G",
            Self::Pg => "PG",
            Self::Pg13 => "PG-13",
            Self::R => "R",
            Self::Nc17 => "NC-17",
            Self::Open => "Open",
            Self::None => "None",
        }
    }
}

impl fmt::Display for MpaaRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MpaaRating {
    type Err = UnknownRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|rating| rating.as_str() == trimmed)
            .ok_or_else(|| UnknownRating(trimmed.to_owned()))
    }
}

/// Parse a raw release date using [`RELEASE_DATE_FORMATS`].
#[must_use]
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    RELEASE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Shift dates after [`LAST_VALID_RELEASE`] back exactly 100 years.
/// Feb 29 of a leap year lands on Feb 28 when the target year is not one.
#[must_use]
pub fn correct_century(date: NaiveDate) -> NaiveDate {
    let (year, month, day) = LAST_VALID_RELEASE;
    let cutoff = NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MAX);
    if date <= cutoff {
        return date;
    }
    date.checked_sub_months(CENTURY).unwrap_or(date)
}

/// Release year of a raw cell after parsing and century correction.
#[must_use]
pub fn release_year(raw: &Scalar) -> Option<i32> {
    normalized_date(raw).map(|date| date.year())
}

fn normalized_date(raw: &Scalar) -> Option<NaiveDate> {
    let parsed = match raw {
        Scalar::Utf8(text) => parse_release_date(text),
        other => other.as_date(),
    }?;
    Some(correct_century(parsed))
}

/// Replace `Release_Date` with parsed, century-corrected dates and add the
/// derived `Release_Year` column. Other columns pass through untouched.
///
/// The title, date, genre and rating columns must exist so every later
/// filter term has a column to read; their cells may still be null.
pub fn normalize(raw: Table) -> Result<Table, DatasetError> {
    for required in [TITLE, RELEASE_DATE, MAJOR_GENRE, MPAA_RATING] {
        if raw.column(required).is_none() {
            return Err(DatasetError::MissingColumn(required));
        }
    }
    let raw_dates = raw
        .column(RELEASE_DATE)
        .ok_or(DatasetError::MissingColumn(RELEASE_DATE))?;

    let mut dates = Vec::with_capacity(raw_dates.len());
    let mut years = Vec::with_capacity(raw_dates.len());
    for cell in raw_dates.values() {
        match normalized_date(cell) {
            Some(date) => {
                dates.push(Scalar::Date(date));
                years.push(Scalar::Int64(i64::from(date.year())));
            }
            None => {
                dates.push(Scalar::Null(NullKind::NaT));
                years.push(Scalar::Null(NullKind::Null));
            }
        }
    }

    #[cfg(feature = "tracing")]
    {
        let unparsed = years.iter().filter(|year| year.is_missing()).count();
        let corrected = raw_dates
            .values()
            .iter()
            .filter_map(|cell| match cell {
                Scalar::Utf8(text) => parse_release_date(text),
                other => other.as_date(),
            })
            .filter(|date| correct_century(*date) != *date)
            .count();
        tracing::debug!(rows = raw.len(), unparsed, corrected, "normalized release dates");
    }

    let table = raw
        .with_column(RELEASE_DATE, Column::new(DType::Date, dates)?)?
        .with_column(RELEASE_YEAR, Column::new(DType::Int64, years)?)?;
    Ok(table)
}

pub fn load_json_str(input: &str) -> Result<Table, DatasetError> {
    normalize(sm_io::read_json_records_str(input)?)
}

pub fn load_csv_str(input: &str) -> Result<Table, DatasetError> {
    normalize(sm_io::read_csv_str(input)?)
}

/// Load and normalize the dataset at `path` (`.json` or `.csv`).
pub fn load_from_path(path: &Path) -> Result<Table, DatasetError> {
    #[cfg(feature = "tracing")]
    tracing::info!(path = %path.display(), "loading movies dataset");

    normalize(sm_io::read_path(path)?)
}

/// Values the UI layer needs to populate its controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub genres: Vec<String>,
    pub ratings: Vec<MpaaRating>,
    pub years: Vec<i32>,
}

impl DatasetSummary {
    /// First and last release year, the default year-range selection.
    #[must_use]
    pub fn default_year_bounds(&self) -> Option<(i32, i32)> {
        Some((*self.years.first()?, *self.years.last()?))
    }
}

/// Distinct sorted genres and years of a normalized table, plus the fixed
/// rating vocabulary.
#[must_use]
pub fn summarize(table: &Table) -> DatasetSummary {
    let genres = table
        .column(MAJOR_GENRE)
        .map(|column| {
            column
                .values()
                .iter()
                .filter_map(Scalar::as_str)
                .map(str::to_owned)
                .collect::<BTreeSet<_>>()
        })
        .unwrap_or_default();

    let years = table
        .column(RELEASE_YEAR)
        .map(|column| {
            column
                .values()
                .iter()
                .filter_map(Scalar::as_i64)
                .filter_map(|year| i32::try_from(year).ok())
                .collect::<BTreeSet<_>>()
        })
        .unwrap_or_default();

    DatasetSummary {
        genres: genres.into_iter().collect(),
        ratings: MpaaRating::ALL.to_vec(),
        years: years.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate};
    use sm_types::{DType, NullKind, Scalar};

    use super::{
        DatasetError, MpaaRating, RELEASE_DATE, RELEASE_YEAR, correct_century, load_csv_str,
        load_json_str, parse_release_date, release_year, summarize,
    };

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn parses_every_source_layout() {
        assert_eq!(parse_release_date("Jun 12 1998"), Some(ymd(1998, 6, 12)));
        assert_eq!(parse_release_date(" June 12 1998 "), Some(ymd(1998, 6, 12)));
        assert_eq!(parse_release_date("12-Jun-98"), Some(ymd(1998, 6, 12)));
        assert_eq!(parse_release_date("6/12/1998"), Some(ymd(1998, 6, 12)));
        assert_eq!(parse_release_date("TBD"), None);
        assert_eq!(parse_release_date(""), None);
    }

    #[test]
    fn century_correction_applies_strictly_after_2012() {
        assert_eq!(correct_century(ymd(2012, 12, 31)), ymd(2012, 12, 31));
        assert_eq!(correct_century(ymd(2013, 1, 1)), ymd(1913, 1, 1));
        assert_eq!(correct_century(ymd(2087, 6, 12)), ymd(1987, 6, 12));
        assert_eq!(correct_century(ymd(1998, 6, 12)), ymd(1998, 6, 12));
    }

    #[test]
    fn leap_day_clamps_when_shifted_into_a_common_year() {
        // 2400 is a leap year, 2300 is not.
        assert_eq!(correct_century(ymd(2400, 2, 29)), ymd(2300, 2, 28));
        assert_eq!(correct_century(ymd(2096, 2, 29)), ymd(1996, 2, 29));
        assert_eq!(correct_century(ymd(2000, 2, 29)), ymd(2000, 2, 29));
    }

    #[test]
    fn two_digit_years_rolled_into_the_future_come_back() {
        // chrono reads "46" as 2046.
        assert_eq!(release_year(&Scalar::from("25-Dec-46")), Some(1946));
        assert_eq!(release_year(&Scalar::from("Jun 12 2087")), Some(1987));
        assert_eq!(release_year(&Scalar::Null(NullKind::Null)), None);
    }

    #[test]
    fn normalize_derives_year_and_tolerates_bad_dates() {
        let input = r#"[
            {"Title": "Heat", "Release_Date": "Dec 15 1995", "Major_Genre": "Action", "MPAA_Rating": "R", "US_Gross": 67436818},
            {"Title": "Future Past", "Release_Date": "Jun 12 2087", "Major_Genre": null, "MPAA_Rating": "PG", "US_Gross": 1},
            {"Title": "Mystery", "Release_Date": "sometime", "Major_Genre": "Drama", "MPAA_Rating": null, "US_Gross": null},
            {"Title": "Undated", "Release_Date": null, "Major_Genre": "Drama", "MPAA_Rating": "G"}
        ]"#;
        let table = load_json_str(input).expect("load");

        let dates = table.column(RELEASE_DATE).expect("dates");
        assert_eq!(dates.dtype(), DType::Date);
        assert_eq!(dates.values()[1], Scalar::Date(ymd(1987, 6, 12)));
        assert_eq!(dates.values()[2], Scalar::Null(NullKind::NaT));

        let years = table.column(RELEASE_YEAR).expect("years");
        assert_eq!(
            years.values(),
            &[
                Scalar::Int64(1995),
                Scalar::Int64(1987),
                Scalar::Null(NullKind::Null),
                Scalar::Null(NullKind::Null)
            ]
        );

        for (date, year) in dates.values().iter().zip(years.values()) {
            if let Some(date) = date.as_date() {
                assert_eq!(year.as_i64(), Some(i64::from(date.year())));
            }
        }
        assert_eq!(table.value("US_Gross", 0), Some(&Scalar::Int64(67_436_818)));
    }

    #[test]
    fn normalize_requires_every_filtered_column() {
        let err = load_csv_str("Title,US_Gross\nHeat,1\n").expect_err("no dates");
        assert!(matches!(err, DatasetError::MissingColumn("Release_Date")));

        let err = load_csv_str("Release_Date\nJun 12 1998\n").expect_err("no titles");
        assert!(matches!(err, DatasetError::MissingColumn("Title")));
        let err = load_json_str(
            r#"[{"Title": "Big", "Release_Date": "Jun 03 1988", "Major_Genre": "Comedy", "US_Gross": 114968774}]"#,
        )
        .expect_err("no ratings");
        assert!(matches!(err, DatasetError::MissingColumn("MPAA_Rating")));

        let err = load_csv_str("Title,Release_Date,MPAA_Rating\nBig,Jun 03 1988,PG\n")
            .expect_err("no genres");
        assert!(matches!(err, DatasetError::MissingColumn("Major_Genre")));
    }

    #[test]
    fn rating_vocabulary_parses_and_prints() {
        assert_eq!("PG-13".parse::<MpaaRating>(), Ok(MpaaRating::Pg13));
        assert_eq!(" None ".parse::<MpaaRating>(), Ok(MpaaRating::None));
        assert!("Not Rated".parse::<MpaaRating>().is_err());
        assert_eq!(MpaaRating::Nc17.to_string(), "NC-17");
    }

    #[test]
    fn summary_lists_sorted_distinct_controls() {
        let input = "Title,Release_Date,Major_Genre,MPAA_Rating\n\
                     A,Jun 12 1998,Drama,R\n\
                     B,Jan 01 1990,Comedy,PG\n\
                     C,Jun 12 2087,Drama,\n\
                     D,unknown,,G\n";
        let table = load_csv_str(input).expect("load");
        let summary = summarize(&table);

        assert_eq!(summary.genres, vec!["Comedy".to_owned(), "Drama".to_owned()]);
        assert_eq!(summary.years, vec![1987, 1990, 1998]);
        assert_eq!(summary.ratings.len(), 7);
        assert_eq!(summary.default_year_bounds(), Some((1987, 1998)));
    }
}
