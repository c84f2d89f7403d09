#![forbid(unsafe_code)]

//! Vega-Lite bar charts for ranked movie windows.
//!
//! [`build_chart`] turns a ranked table into an immutable [`ChartSpec`].
//! Rendering is left to any Vega-Lite v5 runtime; [`embed`] wraps documents
//! in a page that loads one from a CDN.

mod builder;
pub mod embed;
pub mod spec;
mod theme;

pub use builder::{ChartError, ChartOptions, SelectionState, ZOOM_PARAM, build_chart};
pub use spec::{ChartSpec, DataRow, VEGA_LITE_SCHEMA};
pub use theme::{AxisConfig, ChartConfig, Theme, TitleConfig, ViewConfig};
