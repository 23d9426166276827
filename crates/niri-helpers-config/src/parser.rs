//! KDL configuration parser

use std::path::{Path, PathBuf};
use std::time::Duration;

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};

use crate::error::ConfigError;
use crate::model::*;

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // Convert span from kdl's miette version to our miette version
        // kdl uses an older miette version, so we need to extract offset/len manually
        let offset = e.span.offset();
        let len = e.span.len();
        let span = miette::SourceSpan::from((offset, len));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "dynamic-float" => {
                config.dynamic_float = Some(parse_dynamic_float(node)?);
            }
            "launch-music" => {
                config.launch_music = Some(parse_launch_music(node)?);
            }
            "window-glancer" => {
                config.window_glancer = Some(parse_window_glancer(node)?);
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    Ok(config)
}

fn parse_global(node: &KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    for child in children(node) {
        match child.name().value() {
            "log-level" => {
                if let Some(val) = first_arg(child).and_then(KdlValue::as_string) {
                    global.log_level = val
                        .parse()
                        .map_err(|e| ConfigError::Invalid { message: e })?;
                }
            }
            "state-dir" => {
                if let Some(val) = first_arg(child).and_then(KdlValue::as_string) {
                    global.state_dir = Some(expand("global.state-dir", val)?.into());
                }
            }
            name => {
                tracing::warn!("Unknown global config option: {}", name);
            }
        }
    }

    Ok(global)
}

fn parse_dynamic_float(node: &KdlNode) -> Result<FloatConfig, ConfigError> {
    let mut float = FloatConfig::default();

    for child in children(node) {
        match child.name().value() {
            "rule" => float.rules.push(parse_rule(child, float.rules.len())?),
            name => {
                tracing::warn!("Unknown dynamic-float option: {}", name);
            }
        }
    }

    Ok(float)
}

/// A rule accepts its directives and one inline match as properties, and any
/// number of `match`/`exclude` predicates as children:
///
/// ```kdl
/// rule title="Picture-in-Picture" width=640 height=360 centered=true
/// rule {
///     match app-id="^pavucontrol$"
///     exclude title="Settings"
///     width 900
/// }
/// ```
fn parse_rule(node: &KdlNode, index: usize) -> Result<FloatRule, ConfigError> {
    let context = format!("dynamic-float.rule[{}]", index);
    let mut rule = FloatRule::default();

    let inline = parse_match_spec(node);
    if !inline.is_empty() {
        rule.matches.push(inline);
    }

    for entry in node.entries() {
        let Some(name) = entry.name() else { continue };
        match name.value() {
            "title" | "app-id" => {}
            "width" => rule.width = Some(positive_int(&context, "width", entry.value())?),
            "height" => rule.height = Some(positive_int(&context, "height", entry.value())?),
            "centered" => rule.centered = bool_value(&context, "centered", entry.value())?,
            other => {
                tracing::warn!("Unknown property on {}: {}", context, other);
            }
        }
    }

    for child in children(node) {
        match child.name().value() {
            "match" => {
                let spec = parse_match_spec(child);
                if spec.is_empty() {
                    tracing::warn!("{}: match without title or app-id never matches", context);
                }
                rule.matches.push(spec);
            }
            "exclude" => rule.excludes.push(parse_match_spec(child)),
            "width" => rule.width = Some(positive_int(&context, "width", required_arg(child, &context)?)?),
            "height" => {
                rule.height = Some(positive_int(&context, "height", required_arg(child, &context)?)?)
            }
            "centered" => {
                // A bare `centered` node means true
                rule.centered = match first_arg(child) {
                    Some(value) => bool_value(&context, "centered", value)?,
                    None => true,
                };
            }
            name => {
                tracing::warn!("Unknown option on {}: {}", context, name);
            }
        }
    }

    Ok(rule)
}

/// Patterns are regular expressions and are taken literally, without
/// environment expansion.
fn parse_match_spec(node: &KdlNode) -> MatchSpec {
    MatchSpec {
        title: property(node, "title").map(str::to_string),
        app_id: property(node, "app-id").map(str::to_string),
    }
}

fn parse_launch_music(node: &KdlNode) -> Result<LaunchConfig, ConfigError> {
    const SECTION: &str = "launch-music";
    let mut workspace = None;
    let mut app_ids = None;
    let mut profile_suffix = None;
    let mut browser: Option<PathBuf> = None;
    let mut wait_timeout = DEFAULT_WAIT_TIMEOUT;

    for child in children(node) {
        match child.name().value() {
            "workspace" => workspace = Some(string_arg(SECTION, child)?),
            "app-ids" => {
                let mut ids = Vec::new();
                for entry in child.entries().iter().filter(|e| e.name().is_none()) {
                    let id = entry.value().as_string().ok_or_else(|| ConfigError::Invalid {
                        message: format!("{}.app-ids: expected strings, got {}", SECTION, entry.value()),
                    })?;
                    ids.push(expand("launch-music.app-ids", id)?);
                }
                app_ids = Some(ids);
            }
            "profile-suffix" => profile_suffix = Some(string_arg(SECTION, child)?),
            "browser" => browser = Some(string_arg(SECTION, child)?.into()),
            "wait-timeout-seconds" => {
                let value = required_arg(child, SECTION)?;
                let secs = positive_int(SECTION, "wait-timeout-seconds", value)?;
                wait_timeout = Duration::from_secs(secs as u64);
            }
            name => {
                tracing::warn!("Unknown launch-music option: {}", name);
            }
        }
    }

    let app_ids = required(SECTION, "app-ids", app_ids)?;
    if app_ids.is_empty() {
        return Err(ConfigError::Invalid {
            message: format!("{}.app-ids must list at least one app", SECTION),
        });
    }

    Ok(LaunchConfig {
        workspace: required(SECTION, "workspace", workspace)?,
        app_ids,
        profile_suffix: required(SECTION, "profile-suffix", profile_suffix)?,
        browser: required(SECTION, "browser", browser)?,
        wait_timeout,
    })
}

fn parse_window_glancer(node: &KdlNode) -> Result<GlancerConfig, ConfigError> {
    const SECTION: &str = "window-glancer";
    let mut window_title_regex = None;
    let mut glance_workspace = None;
    let mut primary_monitor = None;
    let mut secondary_monitor = None;
    let mut primary_workspace = None;

    for child in children(node) {
        match child.name().value() {
            "window-title-regex" => {
                let value = required_arg(child, SECTION)?;
                let pattern = value.as_string().ok_or_else(|| ConfigError::Invalid {
                    message: format!("{}.window-title-regex: expected a string", SECTION),
                })?;
                window_title_regex = Some(pattern.to_string());
            }
            "glance-workspace" => glance_workspace = Some(string_arg(SECTION, child)?),
            "primary-monitor" => primary_monitor = Some(string_arg(SECTION, child)?),
            "secondary-monitor" => secondary_monitor = Some(string_arg(SECTION, child)?),
            "primary-workspace" => primary_workspace = Some(string_arg(SECTION, child)?),
            name => {
                tracing::warn!("Unknown window-glancer option: {}", name);
            }
        }
    }

    Ok(GlancerConfig {
        window_title_regex: required(SECTION, "window-title-regex", window_title_regex)?,
        glance_workspace: required(SECTION, "glance-workspace", glance_workspace)?,
        primary_monitor: required(SECTION, "primary-monitor", primary_monitor)?,
        secondary_monitor: required(SECTION, "secondary-monitor", secondary_monitor)?,
        primary_workspace: required(SECTION, "primary-workspace", primary_workspace)?,
    })
}

fn children(node: &KdlNode) -> impl Iterator<Item = &KdlNode> {
    node.children().into_iter().flat_map(|doc| doc.nodes())
}

fn first_arg(node: &KdlNode) -> Option<&KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .map(KdlEntry::value)
}

fn property<'a>(node: &'a KdlNode, key: &str) -> Option<&'a str> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(key))
        .and_then(|e| e.value().as_string())
}

fn required_arg<'a>(node: &'a KdlNode, section: &str) -> Result<&'a KdlValue, ConfigError> {
    first_arg(node).ok_or_else(|| ConfigError::MissingField {
        field: format!("{}.{} value", section, node.name().value()),
    })
}

/// First argument as an expanded string
fn string_arg(section: &str, node: &KdlNode) -> Result<String, ConfigError> {
    let key = node.name().value();
    let value = required_arg(node, section)?;
    let raw = value.as_string().ok_or_else(|| ConfigError::Invalid {
        message: format!("{}.{}: expected a string, got {}", section, key, value),
    })?;
    expand(&format!("{}.{}", section, key), raw)
}

fn required<T>(section: &str, key: &str, value: Option<T>) -> Result<T, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingField {
        field: format!("{}.{}", section, key),
    })
}

/// Expand `~` and `$VAR`/`${VAR}` references
fn expand(field: &str, raw: &str) -> Result<String, ConfigError> {
    shellexpand::full(raw)
        .map(|s| s.into_owned())
        .map_err(|e| ConfigError::UndefinedVariable {
            field: field.to_string(),
            var: e.var_name,
        })
}

fn positive_int(context: &str, key: &str, value: &KdlValue) -> Result<i32, ConfigError> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::Invalid {
            message: format!("{}.{}: expected a positive integer, got {}", context, key, value),
        })
}

fn bool_value(context: &str, key: &str, value: &KdlValue) -> Result<bool, ConfigError> {
    value.as_bool().ok_or_else(|| ConfigError::Invalid {
        message: format!("{}.{}: expected true or false, got {}", context, key, value),
    })
}
