//! XDG locations for config, state and logs

use std::path::{Path, PathBuf};

const APP_DIR: &str = "niri-helpers";

/// `$XDG_CONFIG_HOME/niri-helpers/config.kdl`, or a relative fallback when
/// no home directory can be determined
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.kdl")
}

/// `$XDG_STATE_HOME/niri-helpers`, falling back to `~/.local/state/niri-helpers`
pub fn default_state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("state")))
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
}

/// Log file for a component, e.g. `<state-dir>/window-glancer.log`
pub fn log_file(state_dir: &Path, component: &str) -> PathBuf {
    state_dir.join(format!("{}.log", component))
}
