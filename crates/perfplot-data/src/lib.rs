//! Data ingestion layer for perfplot.
//!
//! Reads monitor log files into per-process time series, merges the result
//! of several files into one ordered set, and shapes that set into chart
//! datasets.

pub mod dataset;
pub mod reader;
pub mod store;

pub use perfplot_core as core;
