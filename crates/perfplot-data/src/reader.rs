//! Monitor log ingestion.
//!
//! Reads one or more comma-separated monitor logs, binds the configured
//! metric columns from the first header row, and builds one [`Process`] per
//! `(name, pid, log file)` seen on an accepted data row.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use perfplot_core::error::{PerfPlotError, Result};
use perfplot_core::models::{
    sort_processes, Process, ProcessKey, FIELD_DELIMITER, HEADER_TOKEN,
};
use perfplot_core::process_filter::ProcessFilter;
use perfplot_core::series::{SeriesRegistry, SeriesSpec};
use tracing::{debug, info, warn};

use crate::store::ProcessStore;

/// Time, computer name, `Name(Id)` and at least one metric.
const MIN_FIELDS: usize = 4;

/// Column holding the raw `Name(Id)` value.
const NAME_AND_ID_FIELD: usize = 2;

/// Byte-order mark some Windows editors put at the start of a saved log.
const UTF8_BOM: char = '\u{feff}';

// ── Public types ──────────────────────────────────────────────────────────────

/// The outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct Ingested {
    /// Every process found, ordered by [`Process::sort_key`].
    pub processes: Vec<Process>,
    /// The columns that were bound; empty when no header was ever seen.
    pub series: Vec<SeriesSpec>,
}

/// State carried across the files of one run.
///
/// The registry is resolved from the first header row of the run and kept
/// for every later file.
#[derive(Debug)]
pub struct IngestRun {
    registry: SeriesRegistry,
    resolved_header: Option<String>,
    processes: Vec<Process>,
}

impl IngestRun {
    pub fn new(registry: SeriesRegistry) -> Self {
        Self {
            registry,
            resolved_header: None,
            processes: Vec::new(),
        }
    }

    pub fn registry(&self) -> &SeriesRegistry {
        &self.registry
    }

    /// Processes collected so far, unsorted.
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// Flatten and order the collected processes.
    pub fn finish(self) -> Ingested {
        let mut processes = self.processes;
        sort_processes(&mut processes);
        Ingested {
            processes,
            series: self.registry.specs().to_vec(),
        }
    }

    fn accept_header(&mut self, header_line: &str, source: &str) -> Result<()> {
        match &self.resolved_header {
            None => {
                self.registry.initialize_with_header(header_line)?;
                info!(
                    "Bound {} column(s) using the header of {}",
                    self.registry.specs().len(),
                    source
                );
                self.resolved_header = Some(header_line.to_string());
            }
            Some(first) if first != header_line => {
                warn!(
                    "Header in {} differs from the first header; keeping the first column layout",
                    source
                );
            }
            Some(_) => {}
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct FileStats {
    lines_read: u64,
    lines_skipped: u64,
    lines_filtered: u64,
    rows_recorded: u64,
}

// ── LogIngestionPipeline ──────────────────────────────────────────────────────

/// Parses monitor log files into processes.
#[derive(Debug, Clone)]
pub struct LogIngestionPipeline {
    filter: ProcessFilter,
    registry: SeriesRegistry,
}

impl LogIngestionPipeline {
    /// `registry` holds the desired series; each run resolves its own copy.
    pub fn new(filter: ProcessFilter, registry: SeriesRegistry) -> Self {
        Self { filter, registry }
    }

    /// Parse every log in the comma-separated `paths`, in order.
    ///
    /// Unreadable files are logged and contribute nothing. Fails only when
    /// the first header row matches none of the desired series.
    pub fn ingest(&self, paths: &str) -> Result<Ingested> {
        let mut run = IngestRun::new(self.registry.clone());
        let mut files = 0usize;

        for path in split_paths(paths) {
            self.ingest_file(Path::new(path), &mut run)?;
            files += 1;
        }

        let ingested = run.finish();
        debug!(
            "Ingested {} process(es) from {} file(s)",
            ingested.processes.len(),
            files
        );
        Ok(ingested)
    }

    /// Parse one file into `run`. A missing or unreadable file is logged and
    /// leaves `run` without any process from it.
    pub fn ingest_file(&self, path: &Path, run: &mut IngestRun) -> Result<usize> {
        let source = path.to_string_lossy();

        let file = match std::fs::File::open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Log file {} is not found! ({})", source, e);
                return Ok(0);
            }
        };

        match self.ingest_reader(std::io::BufReader::new(file), &source, run) {
            Err(PerfPlotError::FileUnavailable { path, source: e }) => {
                warn!("Failed to read log file {}: {}", path.display(), e);
                Ok(0)
            }
            other => other,
        }
    }

    /// Parse an already-open log. `source` is recorded as the log file of
    /// every process found.
    ///
    /// Processes are merged into `run` only once the whole input has been
    /// read; a read error yields [`PerfPlotError::FileUnavailable`] and
    /// discards this input's rows. Returns the number of processes added.
    pub fn ingest_reader<R: BufRead>(
        &self,
        mut reader: R,
        source: &str,
        run: &mut IngestRun,
    ) -> Result<usize> {
        let mut store = ProcessStore::new();
        let mut stats = FileStats::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| PerfPlotError::FileUnavailable {
                    path: PathBuf::from(source),
                    source: e,
                })?;
            if read == 0 {
                break;
            }

            stats.lines_read += 1;
            let text = String::from_utf8_lossy(&buf);
            let mut line = text.trim_end_matches(['\n', '\r']);
            if stats.lines_read == 1 {
                line = line.strip_prefix(UTF8_BOM).unwrap_or(line);
            }
            self.ingest_line(line, source, run, &mut store, &mut stats)?;
        }

        debug!(
            "File {}: {} read, {} skipped, {} filtered, {} recorded into {} process(es)",
            source,
            stats.lines_read,
            stats.lines_skipped,
            stats.lines_filtered,
            stats.rows_recorded,
            store.len()
        );

        let added = store.len();
        run.processes.extend(store.into_processes());
        Ok(added)
    }

    fn ingest_line(
        &self,
        line: &str,
        source: &str,
        run: &mut IngestRun,
        store: &mut ProcessStore,
        stats: &mut FileStats,
    ) -> Result<()> {
        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();

        if fields.len() < MIN_FIELDS {
            stats.lines_skipped += 1;
            return Ok(());
        }

        if fields[0] == HEADER_TOKEN {
            return run.accept_header(line, source);
        }

        let timestamp = fields[0];
        if timestamp.is_empty() {
            stats.lines_skipped += 1;
            return Ok(());
        }

        if !run.registry.is_resolved() {
            debug!("Skipping data row before any header in {}", source);
            stats.lines_skipped += 1;
            return Ok(());
        }

        let name_and_id = fields[NAME_AND_ID_FIELD];
        if !self.filter.accepts(name_and_id) {
            stats.lines_filtered += 1;
            return Ok(());
        }

        let row: Vec<(&str, &str, f64)> = run
            .registry
            .specs()
            .iter()
            .map(|spec| (spec.name.as_str(), spec.unit(), spec.extract(&fields)))
            .collect();

        let process = store.upsert(ProcessKey::parse(name_and_id, source));
        match process.record(timestamp, &row) {
            Ok(()) => stats.rows_recorded += 1,
            Err(_) => {
                debug!("Row for {} does not match its series; skipped", process.label());
                stats.lines_skipped += 1;
            }
        }
        Ok(())
    }
}

/// Split a comma-separated path list, dropping blank entries.
pub fn split_paths(paths: &str) -> impl Iterator<Item = &str> {
    paths.split(',').map(str::trim).filter(|p| !p.is_empty())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
