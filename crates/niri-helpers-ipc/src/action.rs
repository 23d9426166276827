//! Typed niri actions
//!
//! Every action the helpers send is a variant of [`Action`]. Serde's default
//! externally tagged representation produces exactly the wire shape niri
//! expects, e.g. `{"FocusWindow":{"id":42}}` or `{"MoveColumnToFirst":{}}`,
//! which the client then wraps as `{"Action": ...}`.

use serde::Serialize;

/// Reference to a workspace by id, index on its output, or name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WorkspaceReference {
    Id(u64),
    Index(u8),
    Name(String),
}

impl WorkspaceReference {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

/// Change applied to a window or column size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SizeChange {
    /// Absolute size in logical pixels
    SetFixed(i32),
    /// Size as a percentage of the output
    SetProportion(f64),
}

/// Change applied to a floating window position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PositionChange {
    /// Position as a percentage of the output
    SetProportion(f64),
    /// Offset from the current position in logical pixels
    AdjustFixed(f64),
}

/// An imperative layout action sent to niri
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Action {
    FocusWorkspace {
        reference: WorkspaceReference,
    },
    FocusWindow {
        id: u64,
    },
    FocusMonitor {
        output: String,
    },
    ConsumeWindowIntoColumn {},
    MoveColumnToFirst {},
    ToggleWindowRuleOpacity {},
    UnsetWorkspaceName {
        reference: WorkspaceReference,
    },
    SetWorkspaceName {
        name: String,
        reference: WorkspaceReference,
    },
    SetColumnWidth {
        change: SizeChange,
    },
    MoveColumnToWorkspaceUp {
        focus: bool,
    },
    MoveColumnToWorkspace {
        reference: WorkspaceReference,
        focus: bool,
    },
    MoveColumnToIndex {
        index: u64,
    },
    SetWindowWidth {
        id: u64,
        change: SizeChange,
    },
    SetWindowHeight {
        id: u64,
        change: SizeChange,
    },
    MoveWindowToFloating {
        id: u64,
    },
    MoveFloatingWindow {
        id: u64,
        x: PositionChange,
        y: PositionChange,
    },
}

impl Action {
    /// Variant name, as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Action::FocusWorkspace { .. } => "FocusWorkspace",
            Action::FocusWindow { .. } => "FocusWindow",
            Action::FocusMonitor { .. } => "FocusMonitor",
            Action::ConsumeWindowIntoColumn {} => "ConsumeWindowIntoColumn",
            Action::MoveColumnToFirst {} => "MoveColumnToFirst",
            Action::ToggleWindowRuleOpacity {} => "ToggleWindowRuleOpacity",
            Action::UnsetWorkspaceName { .. } => "UnsetWorkspaceName",
            Action::SetWorkspaceName { .. } => "SetWorkspaceName",
            Action::SetColumnWidth { .. } => "SetColumnWidth",
            Action::MoveColumnToWorkspaceUp { .. } => "MoveColumnToWorkspaceUp",
            Action::MoveColumnToWorkspace { .. } => "MoveColumnToWorkspace",
            Action::MoveColumnToIndex { .. } => "MoveColumnToIndex",
            Action::SetWindowWidth { .. } => "SetWindowWidth",
            Action::SetWindowHeight { .. } => "SetWindowHeight",
            Action::MoveWindowToFloating { .. } => "MoveWindowToFloating",
            Action::MoveFloatingWindow { .. } => "MoveFloatingWindow",
        }
    }
}
