use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{PerfPlotError, Result};
use crate::series::{DesiredSeries, SeriesRegistry, SeriesTransform};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Arguments that request the help text instead of a run.
pub const HELP_TOKENS: &[&str] = &["--help", "-h", "/?", "/HELP", "-help"];

const ASSUMPTIONS: &str = "\
Assumptions:
  1) Each log file must have a header line at the top of the file.
  2) The columns in the log file must begin in order from left with:
     Time, Computer Name, Process Name
  3) The fields in the log file must be separated by comma (,)

Examples:
  Show all processes in a log (generally not too useful):
      perfplot log1.txt
  Show a process from 2 different logs together:
      perfplot log1.txt,log2.txt process1
  Same as above, but save the dataset to a file:
      perfplot log1.txt,log2.txt process1 -o graph.json
  Save a dataset for each process in a log to a folder:
      perfplot log1.txt -a graph_folder";

/// Extract per-process metric series from COM+ monitor logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "perfplot",
    about = "Extract per-process metric series from COM+ monitor logs",
    version,
    disable_help_flag = true,
    after_help = ASSUMPTIONS
)]
pub struct Settings {
    /// Comma-separated list of log files
    #[arg(value_name = "LOG[,LOG2,...]")]
    pub logs: String,

    /// Comma-separated list of process name patterns
    #[arg(value_name = "PROCESS[,PROCESS2,...]")]
    pub processes: Option<String>,

    /// Save the dataset to a file instead of displaying it
    #[arg(short = 'o', long = "output", value_name = "FILE", conflicts_with = "each_app")]
    pub output: Option<PathBuf>,

    /// Save a dataset for each process name into a directory
    #[arg(
        short = 'a',
        long = "for-each-app",
        value_name = "DIR",
        conflicts_with = "processes"
    )]
    pub each_app: Option<PathBuf>,

    /// Column configuration file (JSON object of `Column.<name>` keys)
    #[arg(long, value_name = "PATH")]
    pub columns: Option<PathBuf>,

    /// Timezone of the log timestamps (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Where the extracted dataset goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Print a summary to stdout.
    Interactive,
    /// Write one dataset file.
    File(PathBuf),
    /// Write one dataset per process name into a directory.
    Directory(PathBuf),
}

/// Result of reading the command line.
#[derive(Debug)]
pub enum Invocation {
    /// A help token was present; carries the rendered help text.
    Help(String),
    Run(Settings),
}

impl Settings {
    /// Interpret an argument list (program name first).
    ///
    /// A help token anywhere short-circuits to [`Invocation::Help`]; any
    /// other invalid combination is returned as a clap error.
    pub fn from_args<I, T>(args: I) -> std::result::Result<Invocation, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

        let wants_help = args
            .iter()
            .skip(1)
            .any(|a| a.to_str().is_some_and(|s| HELP_TOKENS.contains(&s)));
        if wants_help {
            return Ok(Invocation::Help(help_text()));
        }

        let mut settings = Settings::try_parse_from(args)?;
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        Ok(Invocation::Run(settings))
    }

    pub fn output_mode(&self) -> OutputMode {
        match (&self.output, &self.each_app) {
            (Some(file), _) => OutputMode::File(file.clone()),
            (None, Some(dir)) => OutputMode::Directory(dir.clone()),
            (None, None) => OutputMode::Interactive,
        }
    }
}

/// The long help text, including usage, options and examples.
pub fn help_text() -> String {
    Settings::command().render_long_help().to_string()
}

// ── ColumnSettings ─────────────────────────────────────────────────────────────

/// Key prefix marking a column entry in the settings file.
pub const COLUMN_PREFIX: &str = "Column.";

/// Columns extracted when no settings file exists.
pub const DEFAULT_COLUMNS: &[(&str, SeriesTransform)] = &[
    ("%ProcessorTime", SeriesTransform::Default),
    ("PrivateBytes", SeriesTransform::Memory),
];

/// The metric columns a run should extract, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSettings {
    pub desired: Vec<DesiredSeries>,
}

impl ColumnSettings {
    /// `~/.perfplot/columns.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".perfplot").join("columns.json")
    }

    pub fn builtin() -> Self {
        Self {
            desired: DEFAULT_COLUMNS
                .iter()
                .map(|(name, kind)| DesiredSeries::new(*name, *kind))
                .collect(),
        }
    }

    /// Load from `explicit` when given, otherwise from the default path if
    /// it exists, otherwise fall back to [`ColumnSettings::builtin`].
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_impl(explicit, &Self::config_path())
    }

    /// Same as [`ColumnSettings::load`] with an injectable default path.
    pub fn load_impl(explicit: Option<&Path>, default_path: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if default_path.exists() {
            return Self::load_from(default_path);
        }
        debug!("No column settings file; using built-in columns");
        Ok(Self::builtin())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| PerfPlotError::FileUnavailable {
                path: path.to_path_buf(),
                source,
            })?;
        let settings = Self::from_json_str(&content)?;
        debug!(
            "Loaded {} column(s) from {}",
            settings.desired.len(),
            path.display()
        );
        Ok(settings)
    }

    /// Parse a JSON object; see [`ColumnSettings::from_map`].
    pub fn from_json_str(content: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(content)? {
            Value::Object(map) => Self::from_map(&map),
            _ => Err(PerfPlotError::Config(
                "column settings must be a JSON object".to_string(),
            )),
        }
    }

    /// Every `Column.<name>` key becomes a desired series whose kind is the
    /// string value. Other keys are ignored; key order is kept.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let mut desired = Vec::new();
        for (key, value) in map {
            let Some(name) = key.strip_prefix(COLUMN_PREFIX) else {
                continue;
            };
            let kind = value.as_str().ok_or_else(|| {
                PerfPlotError::Config(format!("value of \"{}\" must be a string", key))
            })?;
            desired.push(DesiredSeries::new(name, SeriesTransform::from_kind_name(kind)?));
        }

        if desired.is_empty() {
            return Err(PerfPlotError::Config(format!(
                "no \"{}<name>\" entries found",
                COLUMN_PREFIX
            )));
        }
        Ok(Self { desired })
    }

    /// A fresh, unresolved registry holding these columns.
    pub fn registry(&self) -> SeriesRegistry {
        SeriesRegistry::with_desired(self.desired.iter().cloned())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run(args: &[&str]) -> Settings {
        match Settings::from_args(args.iter().copied()).expect("valid args") {
            Invocation::Run(settings) => settings,
            Invocation::Help(_) => panic!("unexpected help"),
        }
    }

    // ── Settings ──────────────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = run(&["perfplot", "log1.txt"]);
        assert_eq!(settings.logs, "log1.txt");
        assert!(settings.processes.is_none());
        assert!(settings.columns.is_none());
        assert_eq!(settings.timezone, "auto");
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert_eq!(settings.output_mode(), OutputMode::Interactive);
    }

    #[test]
    fn test_settings_with_processes() {
        let settings = run(&["perfplot", "log1.txt,log2.txt", "session,userinfo"]);
        assert_eq!(settings.logs, "log1.txt,log2.txt");
        assert_eq!(settings.processes.as_deref(), Some("session,userinfo"));
    }

    #[test]
    fn test_settings_output_file() {
        let settings = run(&["perfplot", "log1.txt", "session", "-o", "graph.json"]);
        assert_eq!(
            settings.output_mode(),
            OutputMode::File(PathBuf::from("graph.json"))
        );
    }

    #[test]
    fn test_settings_output_directory() {
        let settings = run(&["perfplot", "log1.txt", "-a", "graphs"]);
        assert_eq!(
            settings.output_mode(),
            OutputMode::Directory(PathBuf::from("graphs"))
        );
    }

    #[test]
    fn test_settings_output_and_directory_conflict() {
        let result = Settings::from_args(["perfplot", "log1.txt", "-o", "a.json", "-a", "dir"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_directory_with_processes_rejected() {
        let result = Settings::from_args(["perfplot", "log1.txt", "session", "-a", "dir"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_missing_logs_rejected() {
        assert!(Settings::from_args(["perfplot"]).is_err());
    }

    #[test]
    fn test_settings_too_many_positionals_rejected() {
        assert!(Settings::from_args(["perfplot", "a.txt", "b", "c"]).is_err());
    }

    #[test]
    fn test_settings_help_tokens() {
        for token in HELP_TOKENS {
            let invocation = Settings::from_args(["perfplot", "log1.txt", *token]).unwrap();
            match invocation {
                Invocation::Help(text) => assert!(text.contains("Assumptions")),
                Invocation::Run(_) => panic!("{} should request help", token),
            }
        }
    }

    #[test]
    fn test_settings_debug_overrides_log_level() {
        let settings = run(&["perfplot", "log1.txt", "--log-level", "ERROR", "--debug"]);
        assert_eq!(settings.log_level, "DEBUG");
    }

    // ── ColumnSettings ────────────────────────────────────────────────────────

    #[test]
    fn test_columns_extracted_in_order() {
        let settings = ColumnSettings::from_json_str(
            r#"{
                "Column.%ProcessorTime": "DefaultSeries",
                "Some Other Key": "Some Other Value",
                "Column.PrivateBytes": "MemorySeries"
            }"#,
        )
        .unwrap();

        assert_eq!(
            settings.desired,
            vec![
                DesiredSeries::new("%ProcessorTime", SeriesTransform::Default),
                DesiredSeries::new("PrivateBytes", SeriesTransform::Memory),
            ]
        );
    }

    #[test]
    fn test_columns_keep_file_order_not_alphabetical() {
        let settings = ColumnSettings::from_json_str(
            r#"{"Column.WS": "MemorySeries", "Column.%UT": "DefaultSeries"}"#,
        )
        .unwrap();
        let names: Vec<&str> = settings.desired.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["WS", "%UT"]);
    }

    #[test]
    fn test_columns_unknown_kind_fails() {
        let err = ColumnSettings::from_json_str(r#"{"Column.WS": "HandleSeries"}"#).unwrap_err();
        assert!(matches!(err, PerfPlotError::UnknownTransform(_)));
    }

    #[test]
    fn test_columns_non_string_kind_fails() {
        let err = ColumnSettings::from_json_str(r#"{"Column.WS": 3}"#).unwrap_err();
        assert!(matches!(err, PerfPlotError::Config(_)));
    }

    #[test]
    fn test_columns_without_entries_fails() {
        let err = ColumnSettings::from_json_str(r#"{"Other": "x"}"#).unwrap_err();
        assert!(matches!(err, PerfPlotError::Config(_)));
        assert!(ColumnSettings::from_json_str("[1, 2]").is_err());
    }

    #[test]
    fn test_columns_load_falls_back_to_builtin() {
        let tmp = TempDir::new().expect("tempdir");
        let default_path = ColumnSettings::config_path_in(tmp.path());

        let settings = ColumnSettings::load_impl(None, &default_path).unwrap();
        assert_eq!(settings, ColumnSettings::builtin());
        assert_eq!(settings.desired.len(), 2);
    }

    #[test]
    fn test_columns_load_default_path() {
        let tmp = TempDir::new().expect("tempdir");
        let default_path = ColumnSettings::config_path_in(tmp.path());
        std::fs::create_dir_all(default_path.parent().unwrap()).unwrap();
        std::fs::write(&default_path, r#"{"Column.WS": "Memory"}"#).unwrap();

        let settings = ColumnSettings::load_impl(None, &default_path).unwrap();
        assert_eq!(
            settings.desired,
            vec![DesiredSeries::new("WS", SeriesTransform::Memory)]
        );
    }

    #[test]
    fn test_columns_explicit_missing_file_fails() {
        let tmp = TempDir::new().expect("tempdir");
        let missing = tmp.path().join("nope.json");
        let default_path = ColumnSettings::config_path_in(tmp.path());

        let err = ColumnSettings::load_impl(Some(&missing), &default_path).unwrap_err();
        assert!(matches!(err, PerfPlotError::FileUnavailable { .. }));
    }

    #[test]
    fn test_columns_registry_is_unresolved() {
        let registry = ColumnSettings::builtin().registry();
        assert_eq!(registry.desired().len(), 2);
        assert!(!registry.is_resolved());
    }
}
