use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use sm_dataset::{MAJOR_GENRE, MPAA_RATING, RELEASE_YEAR, TITLE, US_GROSS};
use sm_frame::Table;
use sm_rank::derived_metric_name;
use sm_types::Scalar;
use thiserror::Error;

use crate::spec::{
    Axis, ChartSpec, ColorCondition, ColorScale, ConditionalColor, DataRow, Encoding, FieldType,
    InlineData, Legend, MarkType, Param, ParamBind, PositionChannel, Selection, SortField,
    SortOrder, TooltipChannel,
};
use crate::theme::Theme;

/// Name of the scale-bound interval parameter that makes a chart pannable
/// and zoomable.
pub const ZOOM_PARAM: &str = "zoom";

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("ranked table is missing column {0:?} required by the chart")]
    MissingColumn(String),
}

/// The point selection shared by sibling charts.
///
/// Both charts of a dashboard are built with the same value so that picking
/// a bar in one highlights the matching bars in the other. The UI layer owns
/// it and passes it in on every build; the builder only reads it. `field`
/// is the column a click selects on (the title by default) and `selected`
/// seeds the selection with values already picked elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionState {
    pub name: String,
    pub field: String,
    pub selected: BTreeSet<String>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            name: "pts".to_owned(),
            field: TITLE.to_owned(),
            selected: BTreeSet::new(),
        }
    }
}

impl SelectionState {
    #[must_use]
    pub fn with_selected<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = titles.into_iter().map(Into::into).collect();
        self
    }

    fn to_param(&self) -> Param {
        let value = (!self.selected.is_empty()).then(|| {
            self.selected
                .iter()
                .map(|title| {
                    let mut datum = Map::new();
                    datum.insert(self.field.clone(), Value::String(title.clone()));
                    datum
                })
                .collect()
        });

        Param {
            name: self.name.clone(),
            select: Selection::Point {
                fields: vec![self.field.clone()],
            },
            value,
            bind: None,
        }
    }
}

/// What one chart ranks and how it is labelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub title: String,
    pub metric_field: String,
    pub axis_title: String,
    pub tooltip_metric_title: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Highest Grossing US Movies".to_owned(),
            metric_field: US_GROSS.to_owned(),
            axis_title: "Gross Revenue (millions of USD)".to_owned(),
            tooltip_metric_title: "Gross Revenue (millions)".to_owned(),
        }
    }
}

impl ChartOptions {
    #[must_use]
    pub fn derived_field(&self) -> String {
        derived_metric_name(&self.metric_field)
    }
}

/// Describe a ranked window as a horizontal bar chart.
///
/// Bars are titles ordered by the derived metric, largest first. A bar is
/// drawn in the theme's categorical scheme while `selection` holds it and
/// in the neutral colour otherwise. An empty window gives a chart with no
/// rows.
pub fn build_chart(
    ranked: &Table,
    selection: &SelectionState,
    options: &ChartOptions,
    theme: &Theme,
) -> Result<ChartSpec, ChartError> {
    let metric = options.derived_field();
    let rows = data_rows(ranked, &metric, &selection.field)?;

    let encoding = Encoding {
        y: PositionChannel {
            field: TITLE.to_owned(),
            field_type: FieldType::Nominal,
            title: None,
            sort: Some(SortField {
                field: metric.clone(),
                order: SortOrder::Descending,
            }),
            axis: Some(Axis {
                label_limit: theme.label_limit,
            }),
        },
        x: PositionChannel {
            field: metric.clone(),
            field_type: FieldType::Quantitative,
            title: Some(options.axis_title.clone()),
            sort: None,
            axis: None,
        },
        color: ConditionalColor {
            condition: ColorCondition {
                param: selection.name.clone(),
                field: selection.field.clone(),
                field_type: FieldType::Ordinal,
                scale: ColorScale {
                    scheme: theme.categorical_scheme.clone(),
                },
                legend: theme.legend_orient.clone().map(|orient| Legend { orient }),
            },
            value: theme.neutral_color.clone(),
        },
        tooltip: vec![
            tooltip(RELEASE_YEAR, FieldType::Nominal, "Year", None),
            tooltip(MAJOR_GENRE, FieldType::Nominal, "Genre", None),
            tooltip(MPAA_RATING, FieldType::Nominal, "MPAA Rating", None),
            tooltip(
                &metric,
                FieldType::Quantitative,
                &options.tooltip_metric_title,
                Some(".2f"),
            ),
        ],
    };

    let params = vec![
        selection.to_param(),
        Param {
            name: ZOOM_PARAM.to_owned(),
            select: Selection::Interval {
                encodings: vec!["x".to_owned()],
            },
            value: None,
            bind: Some(ParamBind::Scales),
        },
    ];

    #[cfg(feature = "tracing")]
    tracing::debug!(title = %options.title, rows = rows.len(), "built chart spec");

    Ok(ChartSpec::new(
        options.title.clone(),
        InlineData { values: rows },
        MarkType::Bar,
        params,
        encoding,
        theme.to_config(),
    ))
}

fn tooltip(field: &str, field_type: FieldType, title: &str, format: Option<&str>) -> TooltipChannel {
    TooltipChannel {
        field: field.to_owned(),
        field_type,
        title: title.to_owned(),
        format: format.map(str::to_owned),
    }
}

/// One JSON object per ranked row, in table order. Title, metric and the
/// selection field are required; tooltip-only columns that are absent come
/// out as `null`.
fn data_rows(
    ranked: &Table,
    metric: &str,
    selection_field: &str,
) -> Result<Vec<DataRow>, ChartError> {
    if ranked.is_empty() {
        return Ok(Vec::new());
    }
    for required in [TITLE, metric, selection_field] {
        if ranked.column(required).is_none() {
            return Err(ChartError::MissingColumn(required.to_owned()));
        }
    }

    let mut fields = vec![TITLE, RELEASE_YEAR, MAJOR_GENRE, MPAA_RATING, metric];
    if !fields.contains(&selection_field) {
        fields.push(selection_field);
    }
    let rows = (0..ranked.len())
        .map(|row| {
            fields
                .iter()
                .map(|field| {
                    let value = ranked.value(field, row).map_or(Value::Null, scalar_to_json);
                    ((*field).to_owned(), value)
                })
                .collect::<DataRow>()
        })
        .collect();
    Ok(rows)
}

fn scalar_to_json(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Null(_) => Value::Null,
        Scalar::Bool(v) => Value::Bool(*v),
        Scalar::Int64(v) => Value::Number((*v).into()),
        Scalar::Float64(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
        Scalar::Utf8(v) => Value::String(v.clone()),
        Scalar::Date(v) => Value::String(v.format("%Y-%m-%d").to_string()),
    }
}
