//! Internal types for niri IPC data
//!
//! These mirror the JSON objects niri puts on the wire for windows and
//! workspaces, keeping only the fields the helpers act on. Unknown fields are
//! ignored and nullable strings decode to empty strings, so a newer niri that
//! adds fields does not break decoding.

use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` (or a missing field) as the type's default value
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Snapshot of a single window as reported by niri
///
/// Windows are owned by the compositor. A snapshot is never edited in place:
/// when niri reports a change, the whole snapshot is replaced.
///
/// # Example
///
/// ```ignore
/// let windows = client.windows().await;
/// for window in windows {
///     println!("{}: {} (workspace {:?})", window.id, window.app_id, window.workspace_id);
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Unique window identifier assigned by niri
    ///
    /// This ID is stable for the lifetime of the window.
    pub id: u64,

    /// The application identifier (e.g., "firefox", "Alacritty")
    ///
    /// Empty until the client sets one; some apps only set it after mapping.
    #[serde(default, deserialize_with = "null_as_default")]
    pub app_id: String,

    /// The window title
    ///
    /// Same caveat as `app_id`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    /// The workspace ID this window belongs to
    #[serde(default)]
    pub workspace_id: Option<u64>,

    /// Whether the window is in the floating layout
    #[serde(default)]
    pub is_floating: bool,

    /// Position and size information
    #[serde(default)]
    pub layout: WindowLayout,
}

/// Layout details of a window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowLayout {
    /// `(column, row)` in the scrolling layout, 1-based
    ///
    /// `None` for floating windows.
    #[serde(default)]
    pub pos_in_scrolling_layout: Option<(u64, u64)>,

    /// `(width, height)` of the window in logical pixels
    #[serde(default)]
    pub window_size: Option<(i32, i32)>,
}

impl Window {
    /// Column index in the scrolling layout, if tiled
    pub fn column(&self) -> Option<u64> {
        self.layout.pos_in_scrolling_layout.map(|(column, _)| column)
    }

    /// Window width in logical pixels, if known
    pub fn width(&self) -> Option<i32> {
        self.layout.window_size.map(|(width, _)| width)
    }
}

/// Information about a workspace
///
/// # Example
///
/// ```ignore
/// for ws in client.workspaces().await {
///     if ws.is_active {
///         println!("Active workspace on {:?}: {:?}", ws.output, ws.name);
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique workspace identifier assigned by niri
    ///
    /// This ID remains constant regardless of the workspace moving around
    /// or across monitors.
    pub id: u64,

    /// Index of the workspace on its output, 1-based
    #[serde(default)]
    pub idx: u8,

    /// Optional human-readable workspace name
    ///
    /// Only named workspaces can be addressed by name.
    #[serde(default)]
    pub name: Option<String>,

    /// The output (monitor) this workspace is on
    #[serde(default)]
    pub output: Option<String>,

    /// Whether this workspace is currently focused
    ///
    /// Only one workspace can be focused at a time, even in multi-monitor
    /// setups.
    #[serde(default)]
    pub is_focused: bool,

    /// Whether this workspace is the visible one on its output
    #[serde(default)]
    pub is_active: bool,

    /// The window that has focus within this workspace
    #[serde(default)]
    pub active_window_id: Option<u64>,
}
