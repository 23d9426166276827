//! Primary/glance toggle
//!
//! Moves one window (found by title) between its place in the primary
//! layout and a full-width column on the secondary monitor's last workspace.
//! What is needed to put it back (column, width, the secondary monitor's
//! previously active window) is saved in a state file between invocations.

use niri_helpers_config::{GlancerConfig, StateFile};
use niri_helpers_ipc::{
    Action, NiriClient, SizeChange, Transport, Window, Workspace, WorkspaceReference,
};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::WorkflowError;

/// Layout the window was last moved to
///
/// Only `primary` leads to a glance on toggle; any other stored value
/// (including ones this version never writes) toggles back to primary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Primary,
    Glance,
    #[serde(other)]
    Other,
}

/// Persisted between invocations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleState {
    #[serde(default)]
    pub state: Layout,
    #[serde(default)]
    pub saved_column: Option<u64>,
    #[serde(default)]
    pub saved_width: Option<i32>,
    #[serde(default)]
    pub saved_secondary_window_id: Option<u64>,
}

/// Workspaces of one monitor, summarised
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorInfo {
    /// Highest workspace index on the monitor, 0 if it has none
    pub last_workspace_idx: u8,
    /// Whether one of its workspaces has focus
    pub focused: bool,
    /// Active window of its visible workspace
    pub active_window_id: Option<u64>,
}

impl MonitorInfo {
    pub fn from_workspaces(workspaces: &[Workspace], output: &str) -> Self {
        let mut info = Self::default();

        for ws in workspaces
            .iter()
            .filter(|ws| ws.output.as_deref() == Some(output))
        {
            info.last_workspace_idx = info.last_workspace_idx.max(ws.idx);
            info.focused |= ws.is_focused;
            if ws.is_active {
                info.active_window_id = ws.active_window_id;
            }
        }

        info
    }
}

pub struct Glancer<'a, T> {
    client: &'a NiriClient<T>,
    config: &'a GlancerConfig,
    state: StateFile,
    title: Regex,
}

impl<'a, T: Transport> Glancer<'a, T> {
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidPattern` if the title pattern does not
    /// compile.
    pub fn new(
        client: &'a NiriClient<T>,
        config: &'a GlancerConfig,
        state: StateFile,
    ) -> Result<Self, WorkflowError> {
        let title = RegexBuilder::new(&config.window_title_regex)
            .case_insensitive(true)
            .build()
            .map_err(|source| WorkflowError::InvalidPattern {
                pattern: config.window_title_regex.clone(),
                source,
            })?;

        Ok(Self {
            client,
            config,
            state,
            title,
        })
    }

    pub fn load_state(&self) -> ToggleState {
        let state: ToggleState = self.state.load();
        info!(
            "Current state: {:?}, column: {:?}, width: {:?}, secondary window: {:?}",
            state.state, state.saved_column, state.saved_width, state.saved_secondary_window_id
        );
        state
    }

    fn save_state(&self, state: &ToggleState) -> Result<(), WorkflowError> {
        self.state.save(state)?;
        info!("Saved state: {:?}", state);
        Ok(())
    }

    async fn find_target(&self) -> Result<Window, WorkflowError> {
        let target = self
            .client
            .windows()
            .await
            .into_iter()
            .find(|w| self.title.is_match(&w.title));

        match target {
            Some(window) => {
                info!(
                    "Found window: id={}, column={:?}, width={:?}",
                    window.id,
                    window.column(),
                    window.width()
                );
                Ok(window)
            }
            None => {
                warn!("Target window not found");
                Err(WorkflowError::WindowNotFound {
                    pattern: self.config.window_title_regex.clone(),
                })
            }
        }
    }

    pub async fn move_to_glance(&self) -> Result<(), WorkflowError> {
        info!("=== Moving to glance layout ===");
        let target = self.find_target().await?;

        let secondary = MonitorInfo::from_workspaces(
            &self.client.workspaces().await,
            &self.config.secondary_monitor,
        );
        let previously_focused = self.client.focused_window().await;

        let glance = &self.config.glance_workspace;
        self.send(Action::FocusMonitor {
            output: self.config.secondary_monitor.clone(),
        })
        .await;
        self.send(Action::SetWorkspaceName {
            name: glance.clone(),
            reference: WorkspaceReference::Index(secondary.last_workspace_idx),
        })
        .await;

        self.send(Action::FocusWindow { id: target.id }).await;
        self.send(Action::SetWindowWidth {
            id: target.id,
            change: SizeChange::SetProportion(100.0),
        })
        .await;
        self.send(Action::MoveColumnToWorkspace {
            reference: WorkspaceReference::name(glance),
            focus: true,
        })
        .await;

        if !secondary.focused {
            match previously_focused {
                Some(window) => self.send(Action::FocusWindow { id: window.id }).await,
                None => warn!("No previously focused window to return to"),
            }
        }

        self.save_state(&ToggleState {
            state: Layout::Glance,
            saved_column: target.column(),
            saved_width: target.width(),
            saved_secondary_window_id: secondary.active_window_id,
        })
    }

    pub async fn move_to_primary(&self) -> Result<(), WorkflowError> {
        info!("=== Moving to primary layout ===");
        let target = self.find_target().await?;
        let saved = self.load_state();

        self.send(Action::UnsetWorkspaceName {
            reference: WorkspaceReference::name(&self.config.glance_workspace),
        })
        .await;

        self.send(Action::FocusWindow { id: target.id }).await;

        if let Some(width) = saved.saved_width {
            self.send(Action::SetColumnWidth {
                change: SizeChange::SetFixed(width),
            })
            .await;
        }

        // Up first so the column leaves the secondary monitor
        self.send(Action::MoveColumnToWorkspaceUp { focus: true }).await;
        self.send(Action::MoveColumnToWorkspace {
            reference: WorkspaceReference::name(&self.config.primary_workspace),
            focus: true,
        })
        .await;

        if let Some(index) = saved.saved_column {
            self.send(Action::MoveColumnToIndex { index }).await;
        }

        if let Some(id) = saved.saved_secondary_window_id {
            info!("Restoring focus to secondary window: {}", id);
            self.send(Action::FocusWindow { id }).await;
        }

        self.send(Action::FocusWindow { id: target.id }).await;

        self.save_state(&ToggleState::default())
    }

    pub async fn toggle(&self) -> Result<(), WorkflowError> {
        info!("=== Toggle called ===");
        match self.load_state().state {
            Layout::Primary => {
                info!("Toggling from primary to glance");
                self.move_to_glance().await
            }
            state => {
                info!("Toggling from {:?} to primary", state);
                self.move_to_primary().await
            }
        }
    }

    async fn send(&self, action: Action) {
        self.client.send_action(&action).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use niri_helpers_ipc::testing::StubTransport;
    use serde_json::json;
    use tempfile::tempdir;

    fn config() -> GlancerConfig {
        GlancerConfig {
            window_title_regex: "youtube".to_string(),
            glance_workspace: "glance".to_string(),
            primary_monitor: "DP-1".to_string(),
            secondary_monitor: "HDMI-A-1".to_string(),
            primary_workspace: "main".to_string(),
        }
    }

    fn workspace(id: u64, idx: u8, output: &str, active: bool, focused: bool) -> Workspace {
        Workspace {
            id,
            idx,
            name: None,
            output: Some(output.to_string()),
            is_focused: focused,
            is_active: active,
            active_window_id: if active { Some(id * 10) } else { None },
        }
    }

    fn stub() -> StubTransport {
        StubTransport::new()
            .with_ok(
                "Windows",
                json!([
                    {"id": 3, "title": "notes", "app_id": "foot", "workspace_id": 1},
                    {"id": 42, "title": "Lecture - YouTube - Brave", "app_id": "brave",
                     "workspace_id": 1, "is_floating": false,
                     "layout": {"pos_in_scrolling_layout": [3, 1], "window_size": [1200, 1000]}}
                ]),
            )
            .with_ok(
                "Workspaces",
                json!([
                    {"id": 1, "idx": 1, "output": "DP-1", "is_active": true,
                     "is_focused": true, "active_window_id": 42},
                    {"id": 5, "idx": 1, "output": "HDMI-A-1", "is_active": true,
                     "is_focused": false, "active_window_id": 50},
                    {"id": 6, "idx": 2, "output": "HDMI-A-1", "is_active": false,
                     "is_focused": false, "active_window_id": null}
                ]),
            )
            .with_ok("FocusedWindow", json!({"id": 3, "title": "notes", "app_id": "foot"}))
    }

    #[test]
    fn test_monitor_info() {
        let workspaces = vec![
            workspace(1, 1, "DP-1", true, true),
            workspace(4, 3, "HDMI-A-1", false, false),
            workspace(5, 1, "HDMI-A-1", true, false),
            workspace(6, 2, "HDMI-A-1", false, false),
        ];

        assert_eq!(
            MonitorInfo::from_workspaces(&workspaces, "HDMI-A-1"),
            MonitorInfo {
                last_workspace_idx: 3,
                focused: false,
                active_window_id: Some(50),
            }
        );
        assert_eq!(
            MonitorInfo::from_workspaces(&workspaces, "DP-2"),
            MonitorInfo::default()
        );
    }

    #[test]
    fn test_state_file_format() {
        let state = ToggleState {
            state: Layout::Glance,
            saved_column: Some(2),
            saved_width: Some(900),
            saved_secondary_window_id: None,
        };

        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({"state": "glance", "saved_column": 2, "saved_width": 900,
                   "saved_secondary_window_id": null})
        );
        let partial: ToggleState = serde_json::from_str(r#"{"state": "glance"}"#).unwrap();
        assert_eq!(partial.state, Layout::Glance);
        assert_eq!(partial.saved_column, None);
    }

    #[test]
    fn test_unrecognised_layout_keeps_saved_fields() {
        let state: ToggleState =
            serde_json::from_str(r#"{"state": "Glance", "saved_column": 2, "saved_width": 700}"#)
                .unwrap();

        assert_eq!(state.state, Layout::Other);
        assert_eq!(state.saved_column, Some(2));
        assert_eq!(state.saved_width, Some(700));
    }

    #[tokio::test]
    async fn test_toggle_from_unrecognised_layout_restores_primary() {
        let dir = tempdir().unwrap();
        let state_file = StateFile::in_dir(dir.path(), "window-glancer");
        std::fs::write(state_file.path(), r#"{"state":"Glance","saved_column":2}"#).unwrap();
        let client = NiriClient::new(stub());
        let config = config();
        let glancer = Glancer::new(&client, &config, state_file.clone()).unwrap();

        glancer.toggle().await.unwrap();

        let names = client.transport().action_names();
        assert_eq!(names.first().map(String::as_str), Some("UnsetWorkspaceName"));
        assert!(client
            .transport()
            .actions()
            .contains(&json!({"MoveColumnToIndex": {"index": 2}})));
        assert_eq!(state_file.load::<ToggleState>(), ToggleState::default());
    }

    #[test]
    fn test_invalid_pattern() {
        let client = NiriClient::new(StubTransport::new());
        let mut config = config();
        config.window_title_regex = "[".to_string();

        let result = Glancer::new(&client, &config, StateFile::new("/tmp/unused.json"));

        assert!(matches!(result, Err(WorkflowError::InvalidPattern { .. })));
    }

    #[tokio::test]
    async fn test_toggle_round_trip() {
        let dir = tempdir().unwrap();
        let state_file = StateFile::in_dir(dir.path(), "window-glancer");
        let client = NiriClient::new(stub());
        let config = config();
        let glancer = Glancer::new(&client, &config, state_file.clone()).unwrap();

        glancer.toggle().await.unwrap();

        assert_eq!(
            client.transport().actions(),
            vec![
                json!({"FocusMonitor": {"output": "HDMI-A-1"}}),
                json!({"SetWorkspaceName": {"name": "glance", "reference": {"Index": 2}}}),
                json!({"FocusWindow": {"id": 42}}),
                json!({"SetWindowWidth": {"id": 42, "change": {"SetProportion": 100.0}}}),
                json!({"MoveColumnToWorkspace": {"reference": {"Name": "glance"}, "focus": true}}),
                json!({"FocusWindow": {"id": 3}}),
            ]
        );
        assert_eq!(
            state_file.load::<ToggleState>(),
            ToggleState {
                state: Layout::Glance,
                saved_column: Some(3),
                saved_width: Some(1200),
                saved_secondary_window_id: Some(50),
            }
        );

        let client = NiriClient::new(stub());
        let glancer = Glancer::new(&client, &config, state_file.clone()).unwrap();

        glancer.toggle().await.unwrap();

        assert_eq!(
            client.transport().actions(),
            vec![
                json!({"UnsetWorkspaceName": {"reference": {"Name": "glance"}}}),
                json!({"FocusWindow": {"id": 42}}),
                json!({"SetColumnWidth": {"change": {"SetFixed": 1200}}}),
                json!({"MoveColumnToWorkspaceUp": {"focus": true}}),
                json!({"MoveColumnToWorkspace": {"reference": {"Name": "main"}, "focus": true}}),
                json!({"MoveColumnToIndex": {"index": 3}}),
                json!({"FocusWindow": {"id": 50}}),
                json!({"FocusWindow": {"id": 42}}),
            ]
        );
        assert_eq!(state_file.load::<ToggleState>(), ToggleState::default());
    }

    #[tokio::test]
    async fn test_glance_from_focused_secondary_keeps_focus() {
        let dir = tempdir().unwrap();
        let stub = StubTransport::new()
            .with_ok(
                "Windows",
                json!([{"id": 42, "title": "YouTube", "app_id": "brave", "layout": {}}]),
            )
            .with_ok(
                "Workspaces",
                json!([{"id": 5, "idx": 1, "output": "HDMI-A-1", "is_active": true,
                        "is_focused": true, "active_window_id": null}]),
            )
            .with_ok("FocusedWindow", json!({"id": 7}));
        let client = NiriClient::new(stub);
        let config = config();
        let state_file = StateFile::in_dir(dir.path(), "window-glancer");
        let glancer = Glancer::new(&client, &config, state_file.clone()).unwrap();

        glancer.move_to_glance().await.unwrap();

        let names = client.transport().action_names();
        assert_eq!(names.last().map(String::as_str), Some("MoveColumnToWorkspace"));
        assert_eq!(
            state_file.load::<ToggleState>(),
            ToggleState {
                state: Layout::Glance,
                ..ToggleState::default()
            }
        );
    }

    #[tokio::test]
    async fn test_primary_without_saved_state_skips_restores() {
        let dir = tempdir().unwrap();
        let client = NiriClient::new(stub());
        let config = config();
        let glancer =
            Glancer::new(&client, &config, StateFile::in_dir(dir.path(), "window-glancer"))
                .unwrap();

        glancer.move_to_primary().await.unwrap();

        assert_eq!(
            client.transport().action_names(),
            vec![
                "UnsetWorkspaceName",
                "FocusWindow",
                "MoveColumnToWorkspaceUp",
                "MoveColumnToWorkspace",
                "FocusWindow",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_window_touches_nothing() {
        let dir = tempdir().unwrap();
        let state_file = StateFile::in_dir(dir.path(), "window-glancer");
        let stub = StubTransport::new().with_ok("Windows", json!([{"id": 1, "title": "notes"}]));
        let client = NiriClient::new(stub);
        let config = config();
        let glancer = Glancer::new(&client, &config, state_file.clone()).unwrap();

        for result in [glancer.toggle().await, glancer.move_to_primary().await] {
            assert!(matches!(result, Err(WorkflowError::WindowNotFound { .. })));
        }

        assert!(client.transport().actions().is_empty());
        assert!(!state_file.path().exists());
    }
}
