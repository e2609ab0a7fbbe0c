//! Runtime settings resolved from flags, environment and defaults.
//!
//! Data lives in `~/.taskman/tasks.json` unless `--db` (or `TASKMAN_DB`)
//! points elsewhere.

use std::io::IsTerminal;
use std::path::PathBuf;

/// Directory under the home directory holding the default data file.
pub const DATA_DIR_NAME: &str = ".taskman";
/// File name of the default data file.
pub const TASKS_FILENAME: &str = "tasks.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub color: bool,
    pub log_filter: String,
}

impl Config {
    /// Resolve settings from parsed flags and the process environment.
    pub fn resolve(db: Option<PathBuf>, no_color: bool, verbose: u8) -> Self {
        let color = !no_color && std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal();
        Config {
            db_path: db.unwrap_or_else(default_db_path),
            color,
            log_filter: log_filter(verbose).to_string(),
        }
    }
}

/// `~/.taskman/tasks.json`, or `./tasks.json` when there is no home directory.
pub fn default_db_path() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(DATA_DIR_NAME).join(TASKS_FILENAME),
        None => PathBuf::from(TASKS_FILENAME),
    }
}

/// Default `tracing` filter for a given `-v` count. `RUST_LOG` overrides it.
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "taskman=warn",
        1 => "taskman=info",
        _ => "taskman=debug",
    }
}
