//! Tracing setup shared by the binaries

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::model::LogLevel;

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `level`. Events go to stderr and, when
/// `log_path` is given, are appended to that file without ANSI colours.
pub fn init_logging(level: LogLevel, log_path: Option<&Path>) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let (file, open_error) = match log_path.map(open_log_file) {
        Some(Ok(file)) => (Some(file), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    // A second initialisation keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .try_init();

    if let (Some(path), Some(e)) = (log_path, open_error) {
        tracing::warn!(path = %path.display(), error = %e, "Cannot open log file, logging to stderr only");
    }
}

/// Open `path` for appending, creating it and its parent directory
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
