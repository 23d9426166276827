//! niri-helpers CLI
//!
//! Entry point for the niri workflows: window stack launcher, primary/glance
//! toggle, the dynamic float daemon, and config validation.

mod error;
mod glancer;
mod launch;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use niri_helpers_config::{init_logging, parse_config, paths, Config, LogLevel, StateFile};
use niri_helpers_ipc::NiriClient;

use crate::error::WorkflowError;
use crate::glancer::Glancer;
use crate::launch::{DetachedLauncher, StackWorkflow};

/// Name of the float daemon binary
const FLOAT_DAEMON: &str = "niri-floatd";

#[derive(Parser, Debug)]
#[command(name = "niri-helpers")]
#[command(about = "Workflow helpers for the niri compositor")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch the configured apps and stack them in one column
    LaunchMusic,

    /// Move the configured window between primary and glance layouts
    WindowGlancer {
        #[arg(value_enum, default_value_t = GlancerCommand::Toggle)]
        action: GlancerCommand,
    },

    /// Run the dynamic float daemon in the foreground
    DynamicFloat,

    /// Validate the configuration file
    Validate,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum GlancerCommand {
    Primary,
    Glance,
    Toggle,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = match &cli.config {
        Some(path) => shellexpand::tilde(path).into_owned().into(),
        None => paths::default_config_path(),
    };

    match cli.command {
        Commands::LaunchMusic => cmd_launch_music(&config_path).await,
        Commands::WindowGlancer { action } => cmd_window_glancer(&config_path, action).await,
        Commands::DynamicFloat => cmd_dynamic_float(&config_path).await,
        Commands::Validate => cmd_validate(&config_path),
    }
}

/// Load the config and start logging to `<state-dir>/<component>.log`
fn load(config_path: &Path, component: &str) -> Result<(Config, PathBuf), WorkflowError> {
    let config = parse_config(config_path)?;
    let log_file = paths::log_file(&config.global.state_dir(), component);
    init_logging(config.global.log_level, Some(&log_file));
    tracing::info!("Loaded configuration from {}", config_path.display());
    Ok((config, log_file))
}

async fn cmd_launch_music(config_path: &Path) -> miette::Result<()> {
    let (config, log_file) = load(config_path, "launch-music")?;
    let launch = config.launch_music_section().map_err(WorkflowError::from)?;
    let client = NiriClient::connect().map_err(WorkflowError::from)?;

    let launcher = DetachedLauncher::new(&log_file);
    let result = StackWorkflow::new(&client, launcher, launch, &log_file)
        .run()
        .await;

    report(&result);
    Ok(result?)
}

async fn cmd_window_glancer(config_path: &Path, action: GlancerCommand) -> miette::Result<()> {
    let (config, _) = load(config_path, "window-glancer")?;
    let section = config.window_glancer_section().map_err(WorkflowError::from)?;
    let client = NiriClient::connect().map_err(WorkflowError::from)?;
    let state = StateFile::in_dir(&config.global.state_dir(), "window-glancer");

    tracing::info!("Started with action: {:?}", action);
    let glancer = Glancer::new(&client, section, state)?;
    let result = match action {
        GlancerCommand::Primary => glancer.move_to_primary().await,
        GlancerCommand::Glance => glancer.move_to_glance().await,
        GlancerCommand::Toggle => glancer.toggle().await,
    };

    report(&result);
    Ok(result?)
}

fn report(result: &Result<(), WorkflowError>) {
    match result {
        Ok(()) => tracing::info!("Finished with success=true"),
        Err(e) => tracing::error!("Finished with success=false: {}", e),
    }
}

/// Run the float daemon next to this binary, or from `PATH`, and exit with
/// its status
async fn cmd_dynamic_float(config_path: &Path) -> miette::Result<()> {
    init_logging(LogLevel::Info, None);

    let program = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(FLOAT_DAEMON)))
        .filter(|candidate| candidate.exists())
        .unwrap_or_else(|| PathBuf::from(FLOAT_DAEMON));

    tracing::info!("Starting {}", program.display());

    let status = tokio::process::Command::new(&program)
        .arg("--config")
        .arg(config_path)
        .status()
        .await
        .into_diagnostic()?;

    if status.success() {
        Ok(())
    } else {
        std::process::exit(status.code().unwrap_or(1));
    }
}

fn cmd_validate(config_path: &Path) -> miette::Result<()> {
    init_logging(LogLevel::Warn, None);

    println!("Validating configuration: {}", config_path.display());

    let config = parse_config(config_path)?;

    println!("Configuration is valid!");
    println!("  Log level: {}", config.global.log_level.as_str());
    println!("  State dir: {}", config.global.state_dir().display());

    match &config.dynamic_float {
        Some(float) => println!("  dynamic-float: {} rule(s)", float.rules.len()),
        None => println!("  dynamic-float: not configured"),
    }

    match &config.launch_music {
        Some(launch) => println!(
            "  launch-music: {} app(s) on workspace '{}', timeout {}s",
            launch.app_ids.len(),
            launch.workspace,
            launch.wait_timeout.as_secs()
        ),
        None => println!("  launch-music: not configured"),
    }

    match &config.window_glancer {
        Some(glancer) => println!(
            "  window-glancer: '{}' between {} ({}) and {} ({})",
            glancer.window_title_regex,
            glancer.primary_monitor,
            glancer.primary_workspace,
            glancer.secondary_monitor,
            glancer.glance_workspace
        ),
        None => println!("  window-glancer: not configured"),
    }

    Ok(())
}
