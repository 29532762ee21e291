mod bootstrap;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use perfplot_core::process_filter::ProcessFilter;
use perfplot_core::settings::{ColumnSettings, Invocation, OutputMode, Settings};
use perfplot_core::time_utils::{resolve_timezone, TimestampConverter};
use perfplot_data::reader::LogIngestionPipeline;

fn main() -> ExitCode {
    let settings = match Settings::from_args(std::env::args_os()) {
        Ok(Invocation::Run(settings)) => settings,
        Ok(Invocation::Help(text)) => {
            println!("{}", text);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            // clap prints usage errors to stderr and --version to stdout.
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    if let Err(e) = bootstrap::setup_logging(&settings.log_level) {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Run failed: {:?}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(settings: &Settings) -> Result<()> {
    tracing::info!("perfplot v{} starting", env!("CARGO_PKG_VERSION"));

    let columns = ColumnSettings::load(settings.columns.as_deref())?;
    let filter = ProcessFilter::from_option(settings.processes.as_deref())?;
    let converter = TimestampConverter::new(resolve_timezone(&settings.timezone));
    tracing::debug!("Interpreting timestamps in {}", converter.timezone());

    let pipeline = LogIngestionPipeline::new(filter, columns.registry());
    let ingested = pipeline.ingest(&settings.logs)?;

    if ingested.processes.is_empty() {
        tracing::warn!("No matching processes found in {}", settings.logs);
    } else {
        tracing::info!(
            "Found {} process(es) with {} series",
            ingested.processes.len(),
            ingested.series.len()
        );
    }

    let mut stdout = std::io::stdout().lock();
    match settings.output_mode() {
        OutputMode::Interactive => output::print_summary(&ingested, &converter, &mut stdout)?,
        OutputMode::File(path) => {
            output::write_file(&ingested, &converter, &path, &mut stdout)?;
        }
        OutputMode::Directory(dir) => {
            output::write_directory(&ingested, &converter, &dir)?;
        }
    }

    Ok(())
}
