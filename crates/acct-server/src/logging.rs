//! Tracing subscriber setup shared by both binaries
//!
//! Human readable lines go to stdout. When a log file is configured every
//! event is also appended to it as one JSON object per line.

use crate::config::LogSettings;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::registry::{LookupSpan, Registry};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Timestamp format for both sinks (UTC)
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to open log file {path}: {source}")]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

fn timer() -> ChronoUtc {
    ChronoUtc::new(LOG_TIMESTAMP_FORMAT.to_string())
}

/// Open `path` for appending, creating it if needed
pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::OpenLogFile {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn file_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_timer(timer())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(settings: &LogSettings) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    let file = match settings.log_file_path() {
        Some(path) => Some(file_layer::<Registry>(open_log_file(path)?)),
        None => None,
    };

    tracing_subscriber::registry()
        .with(file)
        .with(filter)
        .with(fmt::layer().with_timer(timer()))
        .try_init()?;

    Ok(())
}

/// Run `f` with a JSON file subscriber installed on this thread and return
/// the events it wrote, one JSON value per line
#[cfg(test)]
pub(crate) fn capture_json_logs<F: FnOnce()>(f: F) -> Vec<serde_json::Value> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.log");

    let subscriber = tracing_subscriber::registry().with(file_layer::<Registry>(open_log_file(&path).unwrap()));
    tracing::subscriber::with_default(subscriber, f);

    std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_layer_writes_json_lines() {
        let lines = capture_json_logs(|| {
            tracing::info!(key = "radius:acct:alice:s1:20250621T100000", "Received update");
        });

        let line = &lines[0];
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["fields"]["message"], "Received update");
        assert_eq!(line["fields"]["key"], "radius:acct:alice:s1:20250621T100000");
    }

    #[test]
    fn test_open_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acct.log");
        std::fs::write(&path, "existing\n").unwrap();

        {
            use std::io::Write;
            let mut file = open_log_file(&path).unwrap();
            writeln!(file, "appended").unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing\nappended\n");
    }

    #[test]
    fn test_open_log_file_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("acct.log");

        match open_log_file(&path) {
            Err(LoggingError::OpenLogFile { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected open error, got {:?}", other),
        }
    }
}
