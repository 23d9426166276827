//! Configuration data model

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default time to wait for launched apps to show up
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Root configuration structure
///
/// Workflow sections are optional in the file. Use the `*_section` accessors
/// to get a section or a `MissingSection` error naming it.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub dynamic_float: Option<FloatConfig>,
    pub launch_music: Option<LaunchConfig>,
    pub window_glancer: Option<GlancerConfig>,
}

impl Config {
    pub fn dynamic_float_section(&self) -> Result<&FloatConfig, ConfigError> {
        self.dynamic_float.as_ref().ok_or_else(|| missing("dynamic-float"))
    }

    pub fn launch_music_section(&self) -> Result<&LaunchConfig, ConfigError> {
        self.launch_music.as_ref().ok_or_else(|| missing("launch-music"))
    }

    pub fn window_glancer_section(&self) -> Result<&GlancerConfig, ConfigError> {
        self.window_glancer.as_ref().ok_or_else(|| missing("window-glancer"))
    }
}

fn missing(section: &str) -> ConfigError {
    ConfigError::MissingSection {
        section: section.to_string(),
    }
}

/// Global settings
#[derive(Debug, Clone, Default)]
pub struct GlobalConfig {
    pub log_level: LogLevel,
    /// Directory for state files and logs; `None` means the XDG default
    pub state_dir: Option<PathBuf>,
}

impl GlobalConfig {
    /// The configured state directory, or the XDG default
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(crate::paths::default_state_dir)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive usable in a tracing `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// Rules for the dynamic float daemon, in declaration order
#[derive(Debug, Clone, Default)]
pub struct FloatConfig {
    pub rules: Vec<FloatRule>,
}

/// One float rule as written in the config
///
/// Patterns are kept as strings; the daemon compiles them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatRule {
    /// OR-combined match predicates
    pub matches: Vec<MatchSpec>,
    /// Any matching exclude vetoes the rule
    pub excludes: Vec<MatchSpec>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub centered: bool,
}

/// A title and/or app-id pattern; both must match when both are set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSpec {
    pub title: Option<String>,
    pub app_id: Option<String>,
}

impl MatchSpec {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.app_id.is_none()
    }
}

/// Settings for the window stack launcher
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchConfig {
    /// Named workspace the stack is assembled on
    pub workspace: String,
    /// Logical app identifiers, in stacking order
    pub app_ids: Vec<String>,
    /// Browser profile suffix, part of the compositor app id
    pub profile_suffix: String,
    /// Browser executable used to launch missing apps
    pub browser: PathBuf,
    pub wait_timeout: Duration,
}

impl LaunchConfig {
    /// The app id niri reports for a launched app
    pub fn niri_app_id(&self, app_id: &str) -> String {
        format!("brave-{}-{}", app_id, self.profile_suffix)
    }

    /// Browser arguments selecting the profile and the app
    pub fn launch_args(&self, app_id: &str) -> Vec<String> {
        vec![
            format!("--profile-directory={}", self.profile_suffix.replace('_', " ")),
            format!("--app-id={}", app_id),
        ]
    }
}

/// Settings for the primary/glance toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlancerConfig {
    /// Case-insensitive pattern locating the target window by title
    pub window_title_regex: String,
    pub glance_workspace: String,
    pub primary_monitor: String,
    pub secondary_monitor: String,
    pub primary_workspace: String,
}
