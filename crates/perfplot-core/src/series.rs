//! Metric columns: how raw cells are converted, and how configured metric
//! names are bound to column positions in a log header.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PerfPlotError, Result};
use crate::models::FIELD_DELIMITER;

// ── SeriesTransform ───────────────────────────────────────────────────────────

/// Legacy namespace that old column configurations prefix kind names with.
const LEGACY_KIND_PREFIX: &str = "PlotComPlus.Series.";

/// Converts a raw cell into a plottable number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesTransform {
    /// Plain decimal value, e.g. `%ProcessorTime`.
    Default,
    /// Byte counts, displayed in megabytes.
    Memory,
}

impl SeriesTransform {
    /// Every kind, paired with the canonical configuration name.
    pub const ALL: [(SeriesTransform, &'static str); 2] = [
        (SeriesTransform::Default, "DefaultSeries"),
        (SeriesTransform::Memory, "MemorySeries"),
    ];

    /// Convert a raw cell.
    ///
    /// Never fails: missing, empty, unparsable or non-finite input yields
    /// `0.0` so that a single bad cell cannot discard an otherwise valid row.
    pub fn transform(&self, raw: Option<&str>) -> f64 {
        let value = parse_decimal(raw);
        match self {
            SeriesTransform::Default => value,
            SeriesTransform::Memory => value / 1_000_000.0,
        }
    }

    /// The unit shown next to the series name on the y-axis.
    pub fn unit(&self) -> &'static str {
        match self {
            SeriesTransform::Default => "",
            SeriesTransform::Memory => "(MB)",
        }
    }

    /// Canonical configuration name of this kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SeriesTransform::Default => "DefaultSeries",
            SeriesTransform::Memory => "MemorySeries",
        }
    }

    /// Resolve a configured kind name.
    ///
    /// Matching is case-insensitive; the short forms `Default` / `Memory`
    /// and the legacy `PlotComPlus.Series.` prefix are accepted.
    pub fn from_kind_name(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        let bare = match trimmed.get(..LEGACY_KIND_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(LEGACY_KIND_PREFIX) => {
                &trimmed[LEGACY_KIND_PREFIX.len()..]
            }
            _ => trimmed,
        };

        match bare.to_ascii_lowercase().as_str() {
            "defaultseries" | "default" => Ok(SeriesTransform::Default),
            "memoryseries" | "memory" => Ok(SeriesTransform::Memory),
            _ => Err(PerfPlotError::UnknownTransform(name.to_string())),
        }
    }
}

impl FromStr for SeriesTransform {
    type Err = PerfPlotError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_kind_name(s)
    }
}

impl fmt::Display for SeriesTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_name())
    }
}

fn parse_decimal(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

// ── DesiredSeries / SeriesSpec ────────────────────────────────────────────────

/// A metric the caller wants extracted, independent of any header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredSeries {
    pub name: String,
    pub transform: SeriesTransform,
}

impl DesiredSeries {
    pub fn new(name: impl Into<String>, transform: SeriesTransform) -> Self {
        Self {
            name: name.into(),
            transform,
        }
    }
}

/// A desired series bound to a concrete, zero-based column position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesSpec {
    pub name: String,
    pub transform: SeriesTransform,
    pub position: usize,
}

impl SeriesSpec {
    pub fn unit(&self) -> &'static str {
        self.transform.unit()
    }

    /// Transform the cell at this spec's column; a short row yields `0.0`.
    pub fn extract(&self, fields: &[&str]) -> f64 {
        self.transform.transform(fields.get(self.position).copied())
    }

    /// `"<name> <unit>"`, the y-axis title for this series.
    pub fn axis_title(&self) -> String {
        format!("{} {}", self.name, self.unit())
    }
}

// ── SeriesRegistry ────────────────────────────────────────────────────────────

/// Holds the desired series and, once a header has been seen, their
/// resolved column positions.
#[derive(Debug, Clone, Default)]
pub struct SeriesRegistry {
    desired: Vec<DesiredSeries>,
    specs: Vec<SeriesSpec>,
    resolved: bool,
}

impl SeriesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an already-ordered list of desired series.
    pub fn with_desired(desired: impl IntoIterator<Item = DesiredSeries>) -> Self {
        Self {
            desired: desired.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Register a metric of interest. Call before [`initialize_with_header`].
    ///
    /// [`initialize_with_header`]: SeriesRegistry::initialize_with_header
    pub fn add_desired(&mut self, name: impl Into<String>, transform: SeriesTransform) {
        self.desired.push(DesiredSeries::new(name, transform));
    }

    /// Bind every desired series to the first header column with the same
    /// name.
    ///
    /// Specs come out in registration order, not header order. Fails with
    /// [`PerfPlotError::SeriesNotFound`] when not a single desired series
    /// appears in the header; a partial match is accepted.
    pub fn initialize_with_header(&mut self, header_line: &str) -> Result<()> {
        let headers: Vec<&str> = header_line.split(FIELD_DELIMITER).collect();

        let specs: Vec<SeriesSpec> = self
            .desired
            .iter()
            .filter_map(|desired| {
                let position = headers.iter().position(|h| *h == desired.name);
                if position.is_none() {
                    debug!("Column \"{}\" not present in header", desired.name);
                }
                position.map(|position| SeriesSpec {
                    name: desired.name.clone(),
                    transform: desired.transform,
                    position,
                })
            })
            .collect();

        if specs.is_empty() {
            return Err(PerfPlotError::SeriesNotFound);
        }

        debug!(
            "Resolved {} of {} desired columns",
            specs.len(),
            self.desired.len()
        );
        self.specs = specs;
        self.resolved = true;
        Ok(())
    }

    /// Resolved specs; empty until a header has been accepted.
    pub fn specs(&self) -> &[SeriesSpec] {
        &self.specs
    }

    pub fn desired(&self) -> &[DesiredSeries] {
        &self.desired
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
