use serde::Serialize;

use crate::error::Result;
use crate::time_utils::TimestampConverter;

/// Column separator used by the monitor log files.
pub const FIELD_DELIMITER: char = ',';

/// Value of the first column on a header row.
pub const HEADER_TOKEN: &str = "Time";

/// Identity of a tracked process: the same name and id seen in two different
/// log files are two different processes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProcessKey {
    pub name: String,
    pub pid: i64,
    pub source_file: String,
}

impl ProcessKey {
    /// Split a raw `Name(Id)` field.
    ///
    /// The name is everything before the first parenthesis; the id is the
    /// text up to the closing one. An absent or unparsable id becomes `0`.
    pub fn parse(name_and_id: &str, source_file: impl Into<String>) -> Self {
        let mut parts = name_and_id.split(['(', ')']);
        let name = parts.next().unwrap_or_default().to_string();
        let pid = parts
            .next()
            .and_then(|id| id.trim().parse::<i64>().ok())
            .unwrap_or(0);

        Self {
            name,
            pid,
            source_file: source_file.into(),
        }
    }
}

/// One named value sequence of a process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub unit: String,
    pub values: Vec<f64>,
}

/// A process recorded in a log file, with its time axis and metric series.
#[derive(Debug, Clone, Serialize)]
pub struct Process {
    key: ProcessKey,
    time_axis: Vec<String>,
    series: Vec<Series>,
}

/// Returned by [`Process::record`] when a row's series names do not line up
/// with the series the process already holds. Nothing is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMismatch;

impl Process {
    pub fn new(key: ProcessKey) -> Self {
        Self {
            key,
            time_axis: Vec::new(),
            series: Vec::new(),
        }
    }

    /// Append one sample row: a timestamp plus exactly one value per series.
    ///
    /// The first row defines the series (in row order). Later rows must name
    /// the same series in the same order, otherwise the row is rejected and
    /// the process is left untouched.
    pub fn record(
        &mut self,
        timestamp: impl Into<String>,
        row: &[(&str, &str, f64)],
    ) -> std::result::Result<(), RowMismatch> {
        if self.time_axis.is_empty() && self.series.is_empty() {
            self.series = row
                .iter()
                .map(|(name, unit, _)| Series {
                    name: name.to_string(),
                    unit: unit.to_string(),
                    values: Vec::new(),
                })
                .collect();
        } else {
            let same_layout = self.series.len() == row.len()
                && self
                    .series
                    .iter()
                    .zip(row)
                    .all(|(series, (name, _, _))| series.name == *name);
            if !same_layout {
                return Err(RowMismatch);
            }
        }

        self.time_axis.push(timestamp.into());
        for (series, (_, _, value)) in self.series.iter_mut().zip(row) {
            series.values.push(*value);
        }
        Ok(())
    }

    pub fn key(&self) -> &ProcessKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn pid(&self) -> i64 {
        self.key.pid
    }

    pub fn source_file(&self) -> &str {
        &self.key.source_file
    }

    /// Raw timestamps, one per recorded row.
    pub fn time_axis(&self) -> &[String] {
        &self.time_axis
    }

    /// Series in first-write order.
    pub fn series(&self) -> &[Series] {
        &self.series
    }

    /// Values of the named series, if the process has it.
    pub fn get(&self, series_name: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|s| s.name == series_name)
            .map(|s| s.values.as_slice())
    }

    pub fn len(&self) -> usize {
        self.time_axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_axis.is_empty()
    }

    /// Legend label: `Name(Id) source_file`.
    pub fn label(&self) -> String {
        format!("{}({}) {}", self.key.name, self.key.pid, self.key.source_file)
    }

    /// Key used to order processes in a result set.
    ///
    /// Compared as one string, so pid `10` sorts before pid `9`.
    pub fn sort_key(&self) -> String {
        format!(
            "{} {} {}",
            self.key.name, self.key.source_file, self.key.pid
        )
    }

    /// The time axis converted to minutes elapsed since the first sample.
    pub fn elapsed_minutes(&self, converter: &TimestampConverter) -> Result<Vec<f64>> {
        converter.to_elapsed_minutes(&self.time_axis)
    }
}

/// Sort processes by [`Process::sort_key`]. Stable.
pub fn sort_processes(processes: &mut [Process]) {
    processes.sort_by_cached_key(Process::sort_key);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
