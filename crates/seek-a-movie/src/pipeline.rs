use std::path::Path;

use sm_chart::{ChartError, ChartOptions, ChartSpec, SelectionState, build_chart, embed};
use sm_dataset::{DatasetError, DatasetSummary, summarize};
use sm_frame::Table;
use sm_query::{FilterSelection, QueryError, RawSelection};
use sm_rank::{RankError, rank};
use thiserror::Error;

use crate::config::{ConfigError, DashboardConfig};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("dataset has no {0:?} column to rank the upper chart by")]
    MissingMetric(String),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Rank(#[from] RankError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// The two chart documents produced for one selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub title: String,
    pub upper: ChartSpec,
    /// Absent when the dataset carries no column for the lower metric.
    pub lower: Option<ChartSpec>,
}

impl Dashboard {
    #[must_use]
    pub fn charts(&self) -> Vec<&ChartSpec> {
        std::iter::once(&self.upper).chain(self.lower.as_ref()).collect()
    }

    /// Both documents as one JSON object keyed `upper` and `lower`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let doc = serde_json::json!({
            "upper": self.upper.to_value()?,
            "lower": self.lower.as_ref().map(ChartSpec::to_value).transpose()?,
        });
        serde_json::to_string_pretty(&doc)
    }

    pub fn to_html(&self) -> Result<String, serde_json::Error> {
        embed::dashboard_html(&self.title, &self.charts())
    }
}

/// Filter, rank and chart queries against one loaded movies table.
///
/// The table is fixed at construction; every query reads it and nothing
/// else, so a pipeline can be shared across threads by reference.
#[derive(Debug, Clone)]
pub struct Pipeline {
    table: Table,
    summary: DatasetSummary,
    config: DashboardConfig,
}

impl Pipeline {
    /// Wrap an already normalized table. The upper chart's metric column is
    /// required.
    pub fn new(table: Table, config: DashboardConfig) -> Result<Self, PipelineError> {
        if table.column(&config.upper.metric_field).is_none() {
            return Err(PipelineError::MissingMetric(config.upper.metric_field));
        }
        let summary = summarize(&table);

        #[cfg(feature = "tracing")]
        tracing::info!(
            rows = table.len(),
            genres = summary.genres.len(),
            years = summary.years.len(),
            "pipeline ready"
        );

        Ok(Self {
            table,
            summary,
            config,
        })
    }

    pub fn from_path(path: &Path, config: DashboardConfig) -> Result<Self, PipelineError> {
        Self::new(sm_dataset::load_from_path(path)?, config)
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn summary(&self) -> &DatasetSummary {
        &self.summary
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Run one selection through filter, rank and chart for both charts.
    /// `chart_selection` is handed unchanged to both chart builds.
    pub fn run(
        &self,
        selection: &FilterSelection,
        chart_selection: &SelectionState,
    ) -> Result<Dashboard, PipelineError> {
        let filtered = selection.apply(&self.table)?;

        let upper = self.chart(&filtered, &self.config.upper, chart_selection)?;
        let lower = if filtered.column(&self.config.lower.metric_field).is_some() {
            Some(self.chart(&filtered, &self.config.lower, chart_selection)?)
        } else {
            None
        };

        Ok(Dashboard {
            title: self.config.title.clone(),
            upper,
            lower,
        })
    }

    /// Resolve raw control values with the configured empty-set policy and
    /// run them with no titles pre-selected.
    pub fn query(&self, raw: &RawSelection) -> Result<Dashboard, PipelineError> {
        let selection = raw.resolve(self.config.empty_set_policy, &self.summary)?;
        self.run(&selection, &SelectionState::default())
    }

    fn chart(
        &self,
        filtered: &Table,
        options: &ChartOptions,
        chart_selection: &SelectionState,
    ) -> Result<ChartSpec, PipelineError> {
        let ranked = rank(filtered, &options.metric_field, self.config.top_k)?;
        Ok(build_chart(
            &ranked,
            chart_selection,
            options,
            &self.config.theme,
        )?)
    }
}
