use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use perfplot_core::formatting::{format_elapsed, format_sample};
use perfplot_core::time_utils::TimestampConverter;
use perfplot_data::dataset::{dataset_file_name, group_by_name, ChartDataset, SeriesStats};
use perfplot_data::reader::Ingested;
use tracing::info;

const DATASET_EXTENSION: &str = "json";

// ── Output paths ──────────────────────────────────────────────────────────────

/// Force a `.json` extension onto `path`.
///
/// Returns the path to write and, when the extension had to be replaced, a
/// notice for the user.
pub fn normalize_output_path(path: &Path) -> (PathBuf, Option<String>) {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(DATASET_EXTENSION));
    if is_json {
        return (path.to_path_buf(), None);
    }

    let normalized = path.with_extension(DATASET_EXTENSION);
    let notice = format!(
        "Only JSON datasets are supported; saving to {} instead.",
        normalized.display()
    );
    (normalized, Some(notice))
}

// ── Writers ───────────────────────────────────────────────────────────────────

/// Write every process into one dataset file. Returns the path written.
pub fn write_file(
    ingested: &Ingested,
    converter: &TimestampConverter,
    path: &Path,
    out: &mut impl Write,
) -> anyhow::Result<PathBuf> {
    let (path, notice) = normalize_output_path(path);
    if let Some(notice) = notice {
        writeln!(out, "{}", notice)?;
    }

    let dataset = ChartDataset::build(&ingested.processes, &ingested.series, converter)?;
    dataset
        .write_json(&path)
        .with_context(|| format!("writing dataset to {}", path.display()))?;
    info!("Saved dataset to {}", path.display());
    Ok(path)
}

/// Write one dataset per process name into `dir`. Returns the paths written,
/// in name order.
pub fn write_directory(
    ingested: &Ingested,
    converter: &TimestampConverter,
    dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let mut written = Vec::new();
    for (name, processes) in group_by_name(&ingested.processes) {
        let dataset = ChartDataset::build(processes, &ingested.series, converter)?;
        let path = dir.join(dataset_file_name(&name));
        dataset
            .write_json(&path)
            .with_context(|| format!("writing dataset for {}", name))?;
        written.push(path);
    }

    info!("Saved {} dataset(s) to {}", written.len(), dir.display());
    Ok(written)
}

// ── Interactive summary ───────────────────────────────────────────────────────

/// Print one block per process: label, sample count, span and per-series
/// min / max / mean / last.
pub fn print_summary(
    ingested: &Ingested,
    converter: &TimestampConverter,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    writeln!(out, "{} process(es)", ingested.processes.len())?;

    for process in &ingested.processes {
        let elapsed = process.elapsed_minutes(converter)?;
        let span = elapsed.last().copied().unwrap_or(0.0);

        writeln!(out)?;
        writeln!(
            out,
            "{}  samples: {}  span: {}",
            process.label(),
            process.len(),
            format_elapsed(span)
        )?;
        writeln!(
            out,
            "  {:<24} {:>12} {:>12} {:>12} {:>12}",
            "series", "min", "max", "mean", "last"
        )?;

        for spec in &ingested.series {
            let values = process.get(&spec.name).unwrap_or_default();
            let Some(stats) = SeriesStats::from_values(values) else {
                continue;
            };
            writeln!(
                out,
                "  {:<24} {:>12} {:>12} {:>12} {:>12}",
                spec.axis_title().trim_end(),
                format_sample(stats.min, spec.transform),
                format_sample(stats.max, spec.transform),
                format_sample(stats.mean, spec.transform),
                format_sample(stats.last, spec.transform)
            )?;
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
