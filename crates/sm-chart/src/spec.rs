//! Serializable Vega-Lite v5 document model.
//!
//! Only the parts of the grammar the movie charts use are modelled. Field
//! names follow Vega-Lite through `serde` renames so the serialized form is
//! the document itself.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::theme::ChartConfig;

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

pub type DataRow = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Nominal,
    Ordinal,
    Quantitative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    pub label_limit: u32,
}

/// An `x` or `y` channel. A `None` title serializes as `null`, which hides
/// the axis title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionChannel {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<Axis>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScale {
    pub scheme: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legend {
    pub orient: String,
}

/// Colour used while the referenced selection parameter holds a datum. A
/// `None` legend serializes as `null`, which hides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorCondition {
    pub param: String,
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub scale: ColorScale,
    pub legend: Option<Legend>,
}

/// `condition` when selected, the flat `value` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalColor {
    pub condition: ColorCondition,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TooltipChannel {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub y: PositionChannel,
    pub x: PositionChannel,
    pub color: ConditionalColor,
    pub tooltip: Vec<TooltipChannel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Selection {
    Point { fields: Vec<String> },
    Interval { encodings: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamBind {
    Scales,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub select: Selection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Vec<DataRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<ParamBind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineData {
    pub values: Vec<DataRow>,
}

/// A complete, self-describing bar chart document.
///
/// Built once by [`crate::build_chart`] and never edited afterwards; the
/// fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(rename = "$schema")]
    schema: String,
    title: String,
    data: InlineData,
    mark: MarkType,
    params: Vec<Param>,
    encoding: Encoding,
    config: ChartConfig,
}

impl ChartSpec {
    pub(crate) fn new(
        title: String,
        data: InlineData,
        mark: MarkType,
        params: Vec<Param>,
        encoding: Encoding,
        config: ChartConfig,
    ) -> Self {
        Self {
            schema: VEGA_LITE_SCHEMA.to_owned(),
            title,
            data,
            mark,
            params,
            encoding,
            config,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn mark(&self) -> MarkType {
        self.mark
    }

    #[must_use]
    pub fn rows(&self) -> &[DataRow] {
        &self.data.values
    }

    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    #[must_use]
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    #[must_use]
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
