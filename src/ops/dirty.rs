use indexmap::IndexMap;

/// Unsaved-changes flags: surface → sub-key → dirty.
///
/// A surface is dirty when any of its sub-keys is. The tracker is advisory;
/// it only decides whether a destructive navigation asks for confirmation.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    surfaces: IndexMap<String, IndexMap<String, bool>>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        DirtyTracker::default()
    }

    pub fn set_dirty(&mut self, surface: &str, key: &str, dirty: bool) {
        let keys = self.surfaces.entry(surface.to_string()).or_default();
        keys.insert(key.to_string(), dirty);
    }

    /// OR over the surface's sub-keys; unknown surfaces are clean
    pub fn is_dirty(&self, surface: &str) -> bool {
        self.surfaces
            .get(surface)
            .is_some_and(|keys| keys.values().any(|d| *d))
    }

    pub fn is_key_dirty(&self, surface: &str, key: &str) -> bool {
        self.surfaces
            .get(surface)
            .and_then(|keys| keys.get(key))
            .copied()
            .unwrap_or(false)
    }

    pub fn any_dirty(&self) -> bool {
        self.surfaces.keys().any(|s| self.is_dirty(s))
    }

    /// Dirty surfaces in first-marked order
    pub fn dirty_surfaces(&self) -> Vec<&str> {
        self.surfaces
            .keys()
            .filter(|s| self.is_dirty(s))
            .map(|s| s.as_str())
            .collect()
    }

    pub fn clear_surface(&mut self, surface: &str) {
        self.surfaces.shift_remove(surface);
    }

    pub fn clear_key(&mut self, surface: &str, key: &str) {
        if let Some(keys) = self.surfaces.get_mut(surface) {
            keys.shift_remove(key);
        }
    }

    pub fn clear_all(&mut self) {
        self.surfaces.clear();
    }
}
