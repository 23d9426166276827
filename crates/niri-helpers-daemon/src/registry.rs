//! In-memory window registry
//!
//! Owned by the float daemon and mutated only from its event loop. Besides the
//! latest snapshot of each window it remembers whether the window has already
//! triggered a float rule.

use std::collections::HashMap;

use niri_helpers_ipc::Window;

#[derive(Debug, Clone)]
struct Entry {
    window: Window,
    matched: bool,
}

#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: HashMap<u64, Entry>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a window snapshot, keeping its matched flag
    pub fn upsert(&mut self, window: Window) {
        let matched = self.is_matched(window.id);
        self.windows.insert(window.id, Entry { window, matched });
    }

    /// Remove a window; unknown ids are ignored
    pub fn remove(&mut self, id: u64) -> Option<Window> {
        self.windows.remove(&id).map(|entry| entry.window)
    }

    /// Reset the registry to exactly `windows`
    ///
    /// Windows present before and after keep their matched flag.
    pub fn replace_all(&mut self, windows: Vec<Window>) {
        let mut previous = std::mem::take(&mut self.windows);
        for window in windows {
            let matched = previous
                .remove(&window.id)
                .map(|entry| entry.matched)
                .unwrap_or(false);
            self.windows.insert(window.id, Entry { window, matched });
        }
    }

    pub fn get(&self, id: u64) -> Option<&Window> {
        self.windows.get(&id).map(|entry| &entry.window)
    }

    pub fn is_matched(&self, id: u64) -> bool {
        self.windows.get(&id).is_some_and(|entry| entry.matched)
    }

    /// Record that the window has fired its rule; no-op for unknown ids
    pub fn mark_matched(&mut self, id: u64) {
        if let Some(entry) = self.windows.get_mut(&id) {
            entry.matched = true;
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Ids of all known windows, sorted
    #[cfg(test)]
    pub fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.windows.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use niri_helpers_ipc::WindowLayout;

    fn window(id: u64, title: &str) -> Window {
        Window {
            id,
            app_id: "app".to_string(),
            title: title.to_string(),
            workspace_id: Some(1),
            is_floating: false,
            layout: WindowLayout::default(),
        }
    }

    #[test]
    fn test_upsert_replaces_snapshot() {
        let mut registry = WindowRegistry::new();
        registry.upsert(window(1, "loading"));
        registry.upsert(window(1, "Spotify"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(1).unwrap().title, "Spotify");
    }

    #[test]
    fn test_upsert_keeps_matched_flag() {
        let mut registry = WindowRegistry::new();
        registry.upsert(window(1, "a"));
        registry.mark_matched(1);
        registry.upsert(window(1, "b"));

        assert!(registry.is_matched(1));
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut registry = WindowRegistry::new();
        registry.upsert(window(1, "a"));

        assert!(registry.remove(42).is_none());
        assert_eq!(registry.ids(), vec![1]);
    }

    #[test]
    fn test_replace_all_then_close() {
        let mut registry = WindowRegistry::new();
        registry.upsert(window(9, "stale"));

        registry.replace_all(vec![window(1, "A"), window(2, "B")]);
        assert_eq!(registry.ids(), vec![1, 2]);

        registry.remove(1);
        assert_eq!(registry.ids(), vec![2]);
        assert_eq!(registry.get(2).unwrap().title, "B");
    }

    #[test]
    fn test_replace_all_carries_flags_of_survivors() {
        let mut registry = WindowRegistry::new();
        registry.replace_all(vec![window(1, "A"), window(2, "B")]);
        registry.mark_matched(1);
        registry.mark_matched(2);

        registry.replace_all(vec![window(2, "B"), window(3, "C")]);

        assert!(!registry.is_matched(1));
        assert!(registry.is_matched(2));
        assert!(!registry.is_matched(3));
    }

    #[test]
    fn test_removed_window_loses_flag() {
        let mut registry = WindowRegistry::new();
        registry.upsert(window(1, "a"));
        registry.mark_matched(1);
        registry.remove(1);
        registry.upsert(window(1, "a"));

        assert!(!registry.is_matched(1));
    }
}
