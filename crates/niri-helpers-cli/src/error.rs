use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use niri_helpers_config::ConfigError;
use niri_helpers_ipc::NiriError;
use thiserror::Error;

/// Reasons a workflow stops early
///
/// Actions already sent are not rolled back; running the workflow again is
/// safe.
#[derive(Error, Diagnostic, Debug)]
pub enum WorkflowError {
    #[error("Workspace '{name}' not found")]
    #[diagnostic(
        code(niri_helpers::workflow::workspace_not_found),
        help("name the workspace in your niri config, e.g. `workspace \"{name}\"`")
    )]
    WorkspaceNotFound { name: String },

    #[error("No window title matches {pattern:?}")]
    #[diagnostic(code(niri_helpers::workflow::window_not_found))]
    WindowNotFound { pattern: String },

    #[error(
        "Timed out after {}s waiting for {}; launcher output is in {}",
        .timeout.as_secs_f32(),
        .missing.join(", "),
        .log_file.display()
    )]
    #[diagnostic(code(niri_helpers::workflow::timeout))]
    LaunchTimeout {
        timeout: Duration,
        missing: Vec<String>,
        log_file: PathBuf,
    },

    #[error("Expected {expected} windows, but found {found}")]
    #[diagnostic(code(niri_helpers::workflow::count_mismatch))]
    CountMismatch { expected: usize, found: usize },

    #[error("Cannot determine the column of window {id}")]
    #[diagnostic(code(niri_helpers::workflow::layout_unparsable))]
    LayoutUnparsable { id: u64 },

    #[error("Invalid window title pattern {pattern:?}")]
    #[diagnostic(code(niri_helpers::workflow::invalid_pattern))]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(niri_helpers::workflow::niri))]
    Niri(#[from] NiriError),
}
