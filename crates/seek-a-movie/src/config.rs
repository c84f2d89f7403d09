use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sm_chart::{ChartOptions, Theme};
use sm_dataset::WORLDWIDE_GROSS;
use sm_query::EmptySetPolicy;
use sm_rank::DEFAULT_TOP_K;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Everything about a dashboard that is a product choice rather than a
/// user selection. Fields missing from a config file keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub top_k: usize,
    pub empty_set_policy: EmptySetPolicy,
    pub theme: Theme,
    pub upper: ChartOptions,
    pub lower: ChartOptions,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Seek-a-Movie".to_owned(),
            top_k: DEFAULT_TOP_K,
            empty_set_policy: EmptySetPolicy::default(),
            theme: Theme::default(),
            upper: ChartOptions::default(),
            lower: ChartOptions {
                title: "Highest Grossing Movies Worldwide".to_owned(),
                metric_field: WORLDWIDE_GROSS.to_owned(),
                ..ChartOptions::default()
            },
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_json_path(path: &Path) -> Result<Self, ConfigError> {
        let input = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&input)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use sm_query::EmptySetPolicy;

    use super::{ConfigError, DashboardConfig};

    #[test]
    fn defaults_describe_the_two_gross_charts() {
        let config = DashboardConfig::default();
        assert_eq!(config.top_k, 10);
        assert_eq!(config.empty_set_policy, EmptySetPolicy::ExcludeAll);
        assert_eq!(config.upper.metric_field, "US_Gross");
        assert_eq!(config.upper.title, "Highest Grossing US Movies");
        assert_eq!(config.lower.metric_field, "Worldwide_Gross");
        assert_eq!(config.lower.axis_title, "Gross Revenue (millions of USD)");
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"top_k": 5, "empty_set_policy": "unrestricted", "theme": {{"categorical_scheme": "tableau10"}}}}"#
        )
        .expect("write config");

        let config = DashboardConfig::from_json_path(file.path()).expect("config");
        assert_eq!(config.top_k, 5);
        assert_eq!(config.empty_set_policy, EmptySetPolicy::Unrestricted);
        assert_eq!(config.theme.categorical_scheme, "tableau10");
        assert_eq!(config.theme.neutral_color, "grey");
        assert_eq!(config.upper, DashboardConfig::default().upper);
    }

    #[test]
    fn unreadable_and_malformed_configs_are_errors() {
        let missing = DashboardConfig::from_json_path(Path::new("/nonexistent/seek-a-movie.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
        assert!(matches!(
            DashboardConfig::from_json_str("{\"top_k\": \"ten\"}"),
            Err(ConfigError::Json(_))
        ));
    }
}
