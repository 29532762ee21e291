//! Chart-ready views over ingested processes.
//!
//! A [`ChartDataset`] has one [`Panel`] per resolved series; every panel
//! holds one [`Curve`] per process, plotted against minutes elapsed since
//! that process's first sample.

use std::collections::BTreeMap;
use std::path::Path;

use perfplot_core::error::{PerfPlotError, Result};
use perfplot_core::models::Process;
use perfplot_core::series::SeriesSpec;
use perfplot_core::time_utils::TimestampConverter;
use serde::Serialize;

/// Shared x-axis title of every panel.
pub const ELAPSED_AXIS_TITLE: &str = "Elapsed Time (min)";

/// Characters that cannot appear in a file name on common platforms.
const UNSAFE_FILE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

// ── Dataset types ─────────────────────────────────────────────────────────────

/// One process's values in one panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Curve {
    pub label: String,
    pub elapsed_minutes: Vec<f64>,
    pub values: Vec<f64>,
}

/// One chart pane: a single series across every process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub series: String,
    pub unit: String,
    pub y_axis_title: String,
    pub curves: Vec<Curve>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub x_axis_title: String,
    pub panels: Vec<Panel>,
}

impl ChartDataset {
    /// Build panels for `series` over `processes`, keeping process order.
    ///
    /// Fails when any process carries a timestamp the converter cannot
    /// parse.
    pub fn build<'a>(
        processes: impl IntoIterator<Item = &'a Process>,
        series: &[SeriesSpec],
        converter: &TimestampConverter,
    ) -> Result<Self> {
        let mut panels: Vec<Panel> = series
            .iter()
            .map(|spec| Panel {
                series: spec.name.clone(),
                unit: spec.unit().to_string(),
                y_axis_title: spec.axis_title(),
                curves: Vec::new(),
            })
            .collect();

        for process in processes {
            let elapsed = process.elapsed_minutes(converter)?;
            let label = process.label();

            for panel in &mut panels {
                let values = process.get(&panel.series).unwrap_or_default().to_vec();
                panel.curves.push(Curve {
                    label: label.clone(),
                    elapsed_minutes: elapsed.clone(),
                    values,
                });
            }
        }

        Ok(Self {
            x_axis_title: ELAPSED_AXIS_TITLE.to_string(),
            panels,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.panels.iter().all(|p| p.curves.is_empty())
    }

    /// Write the dataset as pretty-printed JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PerfPlotError::FileUnavailable {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| PerfPlotError::FileUnavailable {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// ── Summaries ─────────────────────────────────────────────────────────────────

/// Min / max / mean / last of one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub last: f64,
}

impl SeriesStats {
    /// `None` for an empty series.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let last = *values.last()?;
        let (min, max, sum) = values.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
        );

        Some(Self {
            min,
            max,
            mean: sum / values.len() as f64,
            last,
        })
    }
}

// ── Grouping ──────────────────────────────────────────────────────────────────

/// Group processes by name. Within a group the input order is kept.
pub fn group_by_name(processes: &[Process]) -> BTreeMap<String, Vec<&Process>> {
    let mut groups: BTreeMap<String, Vec<&Process>> = BTreeMap::new();
    for process in processes {
        groups
            .entry(process.name().to_string())
            .or_default()
            .push(process);
    }
    groups
}

/// `<name>.json`, with characters unsafe in file names replaced by `_`.
pub fn dataset_file_name(process_name: &str) -> String {
    let stem: String = process_name
        .trim()
        .chars()
        .map(|c| {
            if UNSAFE_FILE_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    if stem.is_empty() {
        "unnamed.json".to_string()
    } else {
        format!("{}.json", stem)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
