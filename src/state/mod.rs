//! Session state shared by the engine, the focus manager and the shell.
//!
//! [`GraphStore`] never hands out `&mut GraphState`. Every setter builds the
//! next snapshot, so a frame that grabbed [`GraphStore::snapshot`] keeps a
//! consistent view even while input handlers queue further changes.

mod persist;
mod viewport;

use std::collections::BTreeSet;
use std::sync::Arc;

use eframe::egui::Vec2;

use crate::knowledge::{FilterPatch, FilterSpec, Locale};

pub use persist::PersistedSettings;
pub use viewport::{
    ContrastMode, DEFAULT_RENDER_NODE_CAP, LayoutMode, RENDER_NODE_CAP_RANGE, ViewportState,
    ZOOM_RANGE, clamp_render_cap, clamp_zoom,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphState {
    pub filters: FilterSpec,
    pub viewport: ViewportState,
    pub selected: BTreeSet<String>,
    pub highlighted: Option<String>,
    pub expanded: BTreeSet<String>,
    pub locale: Locale,
    pub contrast: ContrastMode,
}

impl GraphState {
    /// Filter handed to assembly: the smaller of the two caps wins.
    pub fn assembly_filter(&self) -> FilterSpec {
        self.filters
            .with_max_nodes(self.filters.max_nodes.min(self.viewport.render_node_cap))
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn persisted(&self) -> PersistedSettings {
        PersistedSettings {
            filters: self.filters.clone(),
            layout: self.viewport.layout,
            physics_enabled: self.viewport.physics_enabled,
            render_node_cap: self.viewport.render_node_cap,
            locale: self.locale,
            contrast: self.contrast,
        }
    }
}

#[derive(Debug)]
pub struct GraphStore {
    current: Arc<GraphState>,
    revision: u64,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(GraphState::default())
    }
}

impl GraphStore {
    pub fn new(initial: GraphState) -> Self {
        Self {
            current: Arc::new(initial),
            revision: 0,
        }
    }

    pub fn from_settings(settings: PersistedSettings) -> Self {
        let viewport = ViewportState {
            layout: settings.layout,
            physics_enabled: settings.physics_enabled,
            render_node_cap: clamp_render_cap(settings.render_node_cap),
            ..ViewportState::default()
        };
        Self::new(GraphState {
            filters: settings.filters.normalized(),
            viewport,
            locale: settings.locale,
            contrast: settings.contrast,
            ..GraphState::default()
        })
    }

    pub fn snapshot(&self) -> Arc<GraphState> {
        Arc::clone(&self.current)
    }

    pub fn state(&self) -> &GraphState {
        &self.current
    }

    /// Bumped once per committed change; unchanged by no-op setters.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn update(&mut self, apply: impl FnOnce(&mut GraphState)) {
        let mut next = GraphState::clone(&self.current);
        apply(&mut next);
        if next != *self.current {
            self.current = Arc::new(next);
            self.revision = self.revision.wrapping_add(1);
        }
    }

    pub fn set_filters(&mut self, patch: FilterPatch) {
        self.update(|state| state.filters = state.filters.patched(patch));
    }

    pub fn reset_filters(&mut self) {
        self.update(|state| state.filters = FilterSpec::default());
    }

    /// Swaps in a whole filter, as an import does.
    pub fn replace_filters(&mut self, filters: FilterSpec) {
        self.update(|state| state.filters = filters.normalized());
    }

    pub fn add_selected_node(&mut self, id: &str) {
        self.update(|state| {
            state.selected.insert(id.to_owned());
        });
    }

    pub fn remove_selected_node(&mut self, id: &str) {
        self.update(|state| {
            state.selected.remove(id);
        });
    }

    pub fn toggle_select_node(&mut self, id: &str) {
        self.update(|state| {
            if !state.selected.remove(id) {
                state.selected.insert(id.to_owned());
            }
        });
    }

    pub fn clear_selected_nodes(&mut self) {
        self.update(|state| state.selected.clear());
    }

    pub fn set_layout(&mut self, mode: LayoutMode) {
        self.update(|state| state.viewport.layout = mode);
    }

    /// Non-finite levels are ignored.
    pub fn set_zoom_level(&mut self, level: f32) {
        if let Some(zoom) = clamp_zoom(level) {
            self.update(|state| state.viewport.zoom = zoom);
        }
    }

    /// Zooms by `factor` keeping the world point under `anchor` in place.
    /// `anchor` is measured from the canvas center.
    pub fn zoom_about(&mut self, factor: f32, anchor: Vec2) {
        if !factor.is_finite() || factor <= 0.0 || !anchor.is_finite() {
            return;
        }

        self.update(|state| {
            let viewport = &mut state.viewport;
            let world_before = (anchor - viewport.pan) / viewport.zoom;
            let Some(zoom) = clamp_zoom(viewport.zoom * factor) else {
                return;
            };
            viewport.zoom = zoom;
            viewport.pan = anchor - world_before * zoom;
        });
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.update(|state| state.viewport.pan += delta);
        }
    }

    pub fn reset_view(&mut self) {
        self.update(|state| {
            state.viewport.zoom = 1.0;
            state.viewport.pan = Vec2::ZERO;
        });
    }

    pub fn toggle_play(&mut self) {
        self.update(|state| state.viewport.playing = !state.viewport.playing);
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.update(|state| state.viewport.playing = playing);
    }

    pub fn set_highlight_node(&mut self, id: Option<&str>) {
        self.update(|state| state.highlighted = id.map(str::to_owned));
    }

    pub fn expand_node(&mut self, id: &str) {
        self.update(|state| {
            state.expanded.insert(id.to_owned());
        });
    }

    pub fn collapse_node(&mut self, id: &str) {
        self.update(|state| {
            state.expanded.remove(id);
        });
    }

    pub fn set_enable_physics(&mut self, enabled: bool) {
        self.update(|state| state.viewport.physics_enabled = enabled);
    }

    pub fn set_max_render_nodes(&mut self, cap: usize) {
        self.update(|state| state.viewport.render_node_cap = clamp_render_cap(cap));
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.update(|state| state.locale = locale);
    }

    pub fn set_contrast(&mut self, contrast: ContrastMode) {
        self.update(|state| state.contrast = contrast);
    }

    /// Drops selection, highlight and expansion entries for ids that left
    /// the render set.
    pub fn retain_present(&mut self, is_present: impl Fn(&str) -> bool) {
        self.update(|state| {
            state.selected.retain(|id| is_present(id));
            state.expanded.retain(|id| is_present(id));
            if state
                .highlighted
                .as_deref()
                .is_some_and(|id| !is_present(id))
            {
                state.highlighted = None;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_op_setters_keep_the_same_snapshot() {
        let mut store = GraphStore::default();
        let before = store.snapshot();
        store.remove_selected_node("missing");
        store.set_layout(LayoutMode::Force);
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn earlier_snapshots_are_not_mutated() {
        let mut store = GraphStore::default();
        let before = store.snapshot();
        store.add_selected_node("a");
        assert!(before.selected.is_empty());
        assert!(store.state().is_selected("a"));
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn zoom_about_keeps_anchor_fixed() {
        let mut store = GraphStore::default();
        store.pan_by(Vec2::new(30.0, -10.0));
        let anchor = Vec2::new(120.0, 80.0);
        let viewport = &store.state().viewport;
        let world_before = (anchor - viewport.pan) / viewport.zoom;

        store.zoom_about(2.0, anchor);
        let viewport = &store.state().viewport;
        let world_after = (anchor - viewport.pan) / viewport.zoom;
        assert_eq!(viewport.zoom, 2.0);
        assert!((world_before - world_after).length() < 1e-3);
    }
}
