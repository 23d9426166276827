//! Window stack launcher
//!
//! Makes sure every configured app has a tiled window on the target
//! workspace, launching the missing ones, then merges all of them into a
//! single column at the left edge and reveals them one by one.
//!
//! niri has no "wait for app id" request, so launched apps are found by
//! re-listing windows on a fixed interval until all show up or the timeout
//! expires.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use niri_helpers_config::{logging::open_log_file, LaunchConfig};
use niri_helpers_ipc::{Action, NiriClient, Transport, Window, WorkspaceReference};
use tokio::time::{sleep, Instant};
use tracing::{error, info};

use crate::error::WorkflowError;

/// Interval between window list refreshes while waiting
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Pause before each launch so the browser's single-instance handshake
/// settles
pub const LAUNCH_DELAY: Duration = Duration::from_millis(100);

/// Starts an external program without waiting for it
pub trait Launcher {
    fn launch(&self, program: &Path, args: &[String]) -> io::Result<()>;
}

/// Spawns programs in their own process group with output appended to a
/// log file
#[derive(Debug, Clone)]
pub struct DetachedLauncher {
    log_file: PathBuf,
}

impl DetachedLauncher {
    pub fn new(log_file: impl Into<PathBuf>) -> Self {
        Self {
            log_file: log_file.into(),
        }
    }
}

impl Launcher for DetachedLauncher {
    fn launch(&self, program: &Path, args: &[String]) -> io::Result<()> {
        let stdout: File = open_log_file(&self.log_file)?;
        let stderr = stdout.try_clone()?;

        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .process_group(0)
            .spawn()?;

        Ok(())
    }
}

pub struct StackWorkflow<'a, T, L> {
    client: &'a NiriClient<T>,
    launcher: L,
    config: &'a LaunchConfig,
    log_file: PathBuf,
    poll_interval: Duration,
    launch_delay: Duration,
}

impl<'a, T: Transport, L: Launcher> StackWorkflow<'a, T, L> {
    pub fn new(
        client: &'a NiriClient<T>,
        launcher: L,
        config: &'a LaunchConfig,
        log_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            launcher,
            config,
            log_file: log_file.into(),
            poll_interval: POLL_INTERVAL,
            launch_delay: LAUNCH_DELAY,
        }
    }

    #[cfg(test)]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[cfg(test)]
    pub fn with_launch_delay(mut self, delay: Duration) -> Self {
        self.launch_delay = delay;
        self
    }

    pub async fn run(&self) -> Result<(), WorkflowError> {
        info!("--- Stack launcher started ---");

        let workspace_id = self.resolve_workspace().await?;

        info!("Checking for running apps...");
        let windows = self.client.windows().await;
        let mut found = HashMap::new();
        let mut missing = Vec::new();

        for app in &self.config.app_ids {
            match self.find_app_window(&windows, app, workspace_id) {
                Some(window) => {
                    info!("  - Found {} (ID: {})", app, window.id);
                    found.insert(app.as_str(), window.id);
                }
                None => {
                    info!("  - {} not found, queued for launch", app);
                    missing.push(app.as_str());
                }
            }
        }

        if missing.is_empty() {
            info!("All apps are already running, focusing workspace and first app");
            self.focus_existing(&found).await;
            return Ok(());
        }

        self.launch_missing(&missing).await;
        self.wait_for_windows(&mut found, &missing, workspace_id).await?;

        info!("All apps are running, finding leftmost and stacking...");
        let leftmost = self.find_leftmost(workspace_id).await?;

        let reveal_order: Vec<u64> = self
            .config
            .app_ids
            .iter()
            .filter_map(|app| found.get(app.as_str()).copied())
            .collect();
        self.stack(leftmost, &reveal_order).await;

        info!("--- Stack created and revealed ---");
        Ok(())
    }

    async fn resolve_workspace(&self) -> Result<u64, WorkflowError> {
        let name = &self.config.workspace;
        info!("Finding workspace '{}'...", name);

        let workspace = self
            .client
            .workspaces()
            .await
            .into_iter()
            .find(|ws| ws.name.as_deref() == Some(name.as_str()))
            .ok_or_else(|| WorkflowError::WorkspaceNotFound { name: name.clone() })?;

        info!("Found workspace ID: {}", workspace.id);
        Ok(workspace.id)
    }

    /// A tiled window of `app` on the target workspace
    fn find_app_window<'w>(
        &self,
        windows: &'w [Window],
        app: &str,
        workspace_id: u64,
    ) -> Option<&'w Window> {
        let niri_app_id = self.config.niri_app_id(app);
        windows
            .iter()
            .find(|w| is_stack_window(w, workspace_id) && w.app_id == niri_app_id)
    }

    async fn focus_existing(&self, found: &HashMap<&str, u64>) {
        self.client
            .send_action(&Action::FocusWorkspace {
                reference: WorkspaceReference::name(&self.config.workspace),
            })
            .await;

        let first = self.config.app_ids.first().and_then(|app| found.get(app.as_str()));
        match first {
            Some(&id) => {
                info!("Focusing first window (ID: {})", id);
                self.client.send_action(&Action::FocusWindow { id }).await;
            }
            None => error!("Could not find first window ID"),
        }
    }

    async fn launch_missing(&self, missing: &[&str]) {
        info!("Launching missing apps...");

        for app in missing {
            sleep(self.launch_delay).await;

            let args = self.config.launch_args(app);
            info!(
                "  - Launching: {} {}",
                self.config.browser.display(),
                args.join(" ")
            );

            if let Err(e) = self.launcher.launch(&self.config.browser, &args) {
                error!("Launch failed for {}: {}", app, e);
            }
        }
    }

    async fn wait_for_windows<'s>(
        &self,
        found: &mut HashMap<&'s str, u64>,
        launched: &[&'s str],
        workspace_id: u64,
    ) -> Result<(), WorkflowError> {
        info!("Waiting for newly launched apps...");
        let started = Instant::now();

        while found.len() < self.config.app_ids.len() {
            if started.elapsed() > self.config.wait_timeout {
                let missing = launched
                    .iter()
                    .filter(|app| !found.contains_key(*app))
                    .map(|app| app.to_string())
                    .collect();
                error!("Timed out waiting for all apps to launch");
                return Err(WorkflowError::LaunchTimeout {
                    timeout: self.config.wait_timeout,
                    missing,
                    log_file: self.log_file.clone(),
                });
            }

            sleep(self.poll_interval).await;
            let windows = self.client.windows().await;

            for &app in launched {
                if found.contains_key(app) {
                    continue;
                }
                if let Some(window) = self.find_app_window(&windows, app, workspace_id) {
                    info!("  - ... found new app {} (ID: {})", app, window.id);
                    found.insert(app, window.id);
                }
            }
        }

        Ok(())
    }

    async fn find_leftmost(&self, workspace_id: u64) -> Result<u64, WorkflowError> {
        let niri_app_ids: Vec<String> = self
            .config
            .app_ids
            .iter()
            .map(|app| self.config.niri_app_id(app))
            .collect();

        let targets: Vec<Window> = self
            .client
            .windows()
            .await
            .into_iter()
            .filter(|w| is_stack_window(w, workspace_id) && niri_app_ids.contains(&w.app_id))
            .collect();

        let expected = self.config.app_ids.len();
        if targets.len() != expected {
            return Err(WorkflowError::CountMismatch {
                expected,
                found: targets.len(),
            });
        }

        let mut leftmost: Option<(u64, u64)> = None;
        for window in &targets {
            let column = window
                .column()
                .ok_or(WorkflowError::LayoutUnparsable { id: window.id })?;
            if leftmost.map_or(true, |(_, best)| column < best) {
                leftmost = Some((window.id, column));
            }
        }

        // `expected` is at least one, so a leftmost window exists
        let (id, column) = leftmost.ok_or(WorkflowError::CountMismatch { expected, found: 0 })?;
        info!("Leftmost window is ID {} (col {})", id, column);
        Ok(id)
    }

    /// The fast burst: focus, consume into one column, move it first, reveal
    async fn stack(&self, leftmost: u64, reveal_order: &[u64]) {
        info!("Switching to workspace and starting fast burst...");

        // Focusing the window also switches to its workspace
        self.client
            .send_action(&Action::FocusWindow { id: leftmost })
            .await;

        for _ in 1..self.config.app_ids.len() {
            self.client
                .send_action(&Action::ConsumeWindowIntoColumn {})
                .await;
        }

        self.client.send_action(&Action::MoveColumnToFirst {}).await;

        info!("Stack created, revealing...");
        for &id in reveal_order {
            self.client.send_action(&Action::FocusWindow { id }).await;
            self.client
                .send_action(&Action::ToggleWindowRuleOpacity {})
                .await;
        }

        self.client
            .send_action(&Action::FocusWindow { id: leftmost })
            .await;
    }
}

fn is_stack_window(window: &Window, workspace_id: u64) -> bool {
    window.workspace_id == Some(workspace_id) && !window.is_floating
}
