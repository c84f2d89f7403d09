use serde::{Deserialize, Serialize};

/// Visual settings handed to the chart builder on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub font: String,
    pub title_font_size: u32,
    pub label_font_size: u32,
    pub axis_title_font_size: u32,
    pub text_color: String,
    pub background: String,
    pub width: u32,
    pub height: u32,
    /// Vega colour scheme for highlighted bars.
    pub categorical_scheme: String,
    /// Colour of bars outside the active selection.
    pub neutral_color: String,
    /// Pixel limit before long titles on the category axis are truncated.
    pub label_limit: u32,
    /// Where to draw the colour legend; hidden when unset.
    pub legend_orient: Option<String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            font: "Helvetica Neue, Arial, sans-serif".to_owned(),
            title_font_size: 18,
            label_font_size: 12,
            axis_title_font_size: 14,
            text_color: "#333333".to_owned(),
            background: "#ffffff".to_owned(),
            width: 500,
            height: 300,
            categorical_scheme: "set1".to_owned(),
            neutral_color: "grey".to_owned(),
            label_limit: 300,
            legend_orient: None,
        }
    }
}

impl Theme {
    #[must_use]
    pub fn to_config(&self) -> ChartConfig {
        ChartConfig {
            background: self.background.clone(),
            font: self.font.clone(),
            view: ViewConfig {
                continuous_width: self.width,
                continuous_height: self.height,
                stroke_width: 0,
            },
            title: TitleConfig {
                font_size: self.title_font_size,
                color: self.text_color.clone(),
                anchor: "start".to_owned(),
            },
            axis: AxisConfig {
                label_font_size: self.label_font_size,
                title_font_size: self.axis_title_font_size,
                label_color: self.text_color.clone(),
                title_color: self.text_color.clone(),
            },
        }
    }
}

/// The `config` block of a Vega-Lite document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub background: String,
    pub font: String,
    pub view: ViewConfig,
    pub title: TitleConfig,
    pub axis: AxisConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewConfig {
    pub continuous_width: u32,
    pub continuous_height: u32,
    pub stroke_width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleConfig {
    pub font_size: u32,
    pub color: String,
    pub anchor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisConfig {
    pub label_font_size: u32,
    pub title_font_size: u32,
    pub label_color: String,
    pub title_color: String,
}

#[cfg(test)]
mod tests {
    use super::Theme;

    #[test]
    fn partial_theme_json_fills_in_defaults() {
        let theme: Theme =
            serde_json::from_str(r#"{"neutral_color": "lightgray", "width": 640}"#).expect("theme");
        assert_eq!(theme.neutral_color, "lightgray");
        assert_eq!(theme.width, 640);
        assert_eq!(theme.categorical_scheme, "set1");

        let config = serde_json::to_value(theme.to_config()).expect("config");
        assert_eq!(config["view"]["continuousWidth"], 640);
        assert_eq!(config["axis"]["labelFontSize"], 12);
    }
}
