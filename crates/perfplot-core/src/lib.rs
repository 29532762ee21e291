//! Core types for perfplot.
//!
//! Holds the process model, metric column resolution, process selection,
//! timestamp normalisation and the command-line / column settings shared by
//! the ingestion layer and the binary.

pub mod error;
pub mod formatting;
pub mod models;
pub mod process_filter;
pub mod series;
pub mod settings;
pub mod time_utils;

pub use error::{PerfPlotError, Result};
