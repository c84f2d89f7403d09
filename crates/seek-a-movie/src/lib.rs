#![forbid(unsafe_code)]

//! Seek-a-Movie: filter a movies table by genre, MPAA rating and release
//! year, rank the matches by gross revenue and describe the top ten as
//! Vega-Lite bar charts.
//!
//! [`Pipeline`] ties the stages together; each stage crate is re-exported
//! for callers that want to drive them directly.

mod config;
mod pipeline;

pub use config::{ConfigError, DashboardConfig};
pub use pipeline::{Dashboard, Pipeline, PipelineError};

pub use sm_chart::{
    self as chart, ChartError, ChartOptions, ChartSpec, SelectionState, Theme, build_chart,
};
pub use sm_dataset::{
    self as dataset, DatasetError, DatasetSummary, MpaaRating, load_from_path, normalize,
    summarize,
};
pub use sm_frame::{FrameError, Table};
pub use sm_query::{
    self as query, EmptySetPolicy, FilterSelection, QueryError, RawSelection, YearBound, filter,
};
pub use sm_rank::{DEFAULT_TOP_K, RankError, rank};
pub use sm_types::{DType, NullKind, Scalar};
