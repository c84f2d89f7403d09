#![forbid(unsafe_code)]

use sm_columnar::ColumnError;
use sm_frame::{FrameError, Table};
use sm_types::DType;
use thiserror::Error;

/// Window size of the ranked charts.
pub const DEFAULT_TOP_K: usize = 10;

/// Currency values are charted in millions.
pub const MILLIONS: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankOptions {
    pub k: usize,
    pub divisor: f64,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            k: DEFAULT_TOP_K,
            divisor: MILLIONS,
        }
    }
}

#[derive(Debug, Error)]
pub enum RankError {
    #[error("metric column {name:?} has dtype {dtype:?}; a numeric column is required")]
    NonNumericMetric { name: String, dtype: DType },
    #[error("divisor must be finite and non-zero, got {0}")]
    InvalidDivisor(f64),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Column(#[from] ColumnError),
}

/// Name of the derived column that [`rank`] adds for `metric_field`.
#[must_use]
pub fn derived_metric_name(metric_field: &str) -> String {
    format!("{metric_field}_millions")
}

/// Top `k` rows by `metric_field / 1_000_000`, largest first.
///
/// Rows with a missing metric are dropped before ranking, equal values keep
/// their incoming order, and fewer than `k` survivors are all returned. The
/// derived value is added as [`derived_metric_name`].
pub fn rank(table: &Table, metric_field: &str, k: usize) -> Result<Table, RankError> {
    rank_with_options(
        table,
        metric_field,
        RankOptions {
            k,
            ..RankOptions::default()
        },
    )
}

pub fn rank_with_options(
    table: &Table,
    metric_field: &str,
    options: RankOptions,
) -> Result<Table, RankError> {
    if options.divisor == 0.0 || !options.divisor.is_finite() {
        return Err(RankError::InvalidDivisor(options.divisor));
    }

    let metric = table.require_column(metric_field)?;
    if !metric.is_numeric() {
        return Err(RankError::NonNumericMetric {
            name: metric_field.to_owned(),
            dtype: metric.dtype(),
        });
    }

    let present = table.drop_missing(metric_field)?;
    let derived = present
        .require_column(metric_field)?
        .div_scalar(options.divisor)?;
    let derived_name = derived_metric_name(metric_field);

    let window = present
        .with_column(derived_name.as_str(), derived)?
        .sort_by_desc_stable(&derived_name)?
        .head(options.k)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(
        metric = metric_field,
        rows_in = table.len(),
        with_metric = present.len(),
        rows_out = window.len(),
        k = options.k,
        "ranked window"
    );

    Ok(window)
}

#[cfg(test)]
mod tests {
    use sm_columnar::Column;
    use sm_frame::Table;
    use sm_index::IndexLabel;
    use sm_types::{NullKind, Scalar};

    use super::{RankError, RankOptions, derived_metric_name, rank, rank_with_options};

    fn gross_table(gross: Vec<Scalar>) -> Table {
        let titles = (0..gross.len())
            .map(|i| Scalar::Utf8(format!("Movie {i}")))
            .collect();
        Table::from_columns(vec![
            ("Title".to_owned(), Column::from_values(titles).expect("titles")),
            ("US_Gross".to_owned(), Column::from_values(gross).expect("gross")),
        ])
        .expect("table")
    }

    fn derived(table: &Table) -> Vec<f64> {
        table
            .column(&derived_metric_name("US_Gross"))
            .expect("derived column")
            .values()
            .iter()
            .map(|value| value.to_f64().expect("numeric"))
            .collect()
    }

    #[test]
    fn fifteen_records_truncate_to_the_ten_largest() {
        let gross = (1..=15)
            .map(|i| Scalar::Int64(i * 1_000_000))
            .collect::<Vec<_>>();
        let out = rank(&gross_table(gross), "US_Gross", 10).expect("rank");

        assert_eq!(out.len(), 10);
        assert_eq!(
            derived(&out),
            vec![15.0, 14.0, 13.0, 12.0, 11.0, 10.0, 9.0, 8.0, 7.0, 6.0]
        );
    }

    #[test]
    fn missing_metrics_are_dropped_before_ranking() {
        let out = rank(
            &gross_table(vec![
                Scalar::Null(NullKind::Null),
                Scalar::Int64(2_500_000),
                Scalar::Float64(f64::NAN),
                Scalar::Int64(7_000_000),
            ]),
            "US_Gross",
            10,
        )
        .expect("rank");

        assert_eq!(derived(&out), vec![7.0, 2.5]);
        assert_eq!(out.index().labels(), &[IndexLabel::Int64(3), IndexLabel::Int64(1)]);
    }

    #[test]
    fn ties_keep_incoming_order() {
        let out = rank(
            &gross_table(vec![
                Scalar::Int64(5_000_000),
                Scalar::Int64(9_000_000),
                Scalar::Int64(5_000_000),
                Scalar::Int64(5_000_000),
            ]),
            "US_Gross",
            3,
        )
        .expect("rank");

        assert_eq!(
            out.index().labels(),
            &[1_i64.into(), 0_i64.into(), 2_i64.into()]
        );
    }

    #[test]
    fn empty_input_ranks_to_an_empty_window() {
        let out = rank(&gross_table(Vec::new()), "US_Gross", 10).expect("rank");
        assert!(out.is_empty());
        assert!(out.column(&derived_metric_name("US_Gross")).is_some());
    }

    #[test]
    fn bad_metric_and_divisor_are_rejected() {
        let table = gross_table(vec![Scalar::Int64(1)]);
        assert!(matches!(
            rank(&table, "Title", 10),
            Err(RankError::NonNumericMetric { .. })
        ));
        assert!(matches!(
            rank(&table, "Worldwide_Gross", 10),
            Err(RankError::Frame(_))
        ));
        assert!(matches!(
            rank_with_options(
                &table,
                "US_Gross",
                RankOptions {
                    k: 10,
                    divisor: 0.0
                }
            ),
            Err(RankError::InvalidDivisor(_))
        ));
    }

    mod properties {
        use proptest::prelude::*;
        use sm_types::{NullKind, Scalar};

        use super::super::rank;
        use super::{derived, gross_table};

        proptest! {
            #[test]
            fn window_is_sorted_and_sized(
                gross in prop::collection::vec(prop::option::of(0_i64..900_000_000), 0..40),
                k in 0_usize..15,
            ) {
                let non_null = gross.iter().filter(|value| value.is_some()).count();
                let cells = gross
                    .into_iter()
                    .map(|value| value.map_or(Scalar::Null(NullKind::Null), Scalar::Int64))
                    .collect();
                let out = rank(&gross_table(cells), "US_Gross", k).expect("rank");

                prop_assert_eq!(out.len(), k.min(non_null));
                let values = derived(&out);
                prop_assert!(values.windows(2).all(|pair| pair[0] >= pair[1]));
            }
        }
    }
}
