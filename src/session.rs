//! One interactive session: data, state, engine and focus, advanced one
//! frame at a time.

use std::collections::BTreeSet;
use std::time::Instant;

use eframe::egui::{Pos2, Rect, Vec2};
use tracing::info;

use crate::a11y::{
    FocusKind, FocusManager, NeighborDirection, keyboard_help, no_results, selection_changed,
    view_reset,
};
use crate::engine::{DrawSurface, EngineError, FrameStats, GraphEngine, ViewTransform};
use crate::knowledge::{
    Dataset, FilterSpec, GraphExport, GraphPayload, ImportedGraph, Locale, assemble,
};
use crate::state::GraphStore;

const KEYBOARD_ZOOM_STEP: f32 = 1.25;

/// Keyboard actions over the graph, already decoupled from key codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    Next,
    Previous,
    NeighborForward,
    NeighborBackward,
    First,
    Last,
    Activate,
    ToggleExpand,
    ClearFocus,
    ZoomIn,
    ZoomOut,
    ResetView,
    TogglePlay,
    Help,
}

pub struct Session {
    dataset: Dataset,
    store: GraphStore,
    engine: GraphEngine,
    focus: FocusManager,
    payload: GraphPayload,
    assembled_for: Option<FilterSpec>,
    synced_locale: Locale,
    expanded_seen: BTreeSet<String>,
    last_view: Option<ViewTransform>,
    last_stats: Option<FrameStats>,
    last_error: Option<EngineError>,
}

impl Session {
    pub fn new(dataset: Dataset, store: GraphStore) -> Self {
        Self::with_parts(dataset, store, GraphEngine::new(), FocusManager::new())
    }

    pub fn with_parts(
        dataset: Dataset,
        store: GraphStore,
        engine: GraphEngine,
        focus: FocusManager,
    ) -> Self {
        let synced_locale = store.state().locale;
        Self {
            dataset,
            store,
            engine,
            focus,
            payload: GraphPayload::default(),
            assembled_for: None,
            synced_locale,
            expanded_seen: BTreeSet::new(),
            last_view: None,
            last_stats: None,
            last_error: None,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    pub fn engine(&self) -> &GraphEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut GraphEngine {
        &mut self.engine
    }

    pub fn focus(&self) -> &FocusManager {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut FocusManager {
        &mut self.focus
    }

    /// The render set currently owned by the engine.
    pub fn payload(&self) -> &GraphPayload {
        &self.payload
    }

    pub fn last_stats(&self) -> Option<&FrameStats> {
        self.last_stats.as_ref()
    }

    pub fn last_error(&self) -> Option<&EngineError> {
        self.last_error.as_ref()
    }

    pub fn last_view(&self) -> Option<&ViewTransform> {
        self.last_view.as_ref()
    }

    /// Swaps the raw data; the next frame reassembles.
    pub fn replace_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.assembled_for = None;
    }

    /// Snapshot of the current render set with the filter that produced it.
    pub fn export_render_set(&self) -> GraphExport {
        let state = self.store.state();
        GraphExport::from_payload(&self.payload, &state.filters, state.locale)
    }

    /// Makes an imported graph the session's data and adopts its filter;
    /// the next frame reassembles.
    pub fn import_graph(&mut self, imported: ImportedGraph) {
        info!(
            nodes = imported.dataset.nodes.len(),
            relationships = imported.dataset.relationships.len(),
            "switching to imported graph"
        );
        self.replace_dataset(imported.dataset);
        self.store.replace_filters(imported.filters);
        if let Some(locale) = imported.locale {
            self.store.set_locale(locale);
        }
    }

    /// Applies committed state changes the engine and focus ring depend on:
    /// reassembly when the filter changed, then the focus ring, then the
    /// expansion diff. Returns whether the render set was rebuilt.
    pub fn refresh(&mut self) -> bool {
        let state = self.store.snapshot();
        // Label visibility is a drawing option and never changes the set.
        let mut filter = state.assembly_filter();
        filter.show_labels = true;

        let reassembled = self.assembled_for.as_ref() != Some(&filter);
        if reassembled {
            self.payload = assemble(
                &self.dataset.nodes,
                &self.dataset.relationships,
                &self.dataset.supplements,
                &filter,
            );
            self.engine.load(&self.payload, &state);
            self.assembled_for = Some(filter);
            info!(
                nodes = self.payload.nodes.len(),
                relationships = self.payload.relationships.len(),
                supplements = self.payload.supplements.len(),
                issues = self.payload.diagnostics.len(),
                "render set reassembled"
            );

            let graph = self.engine.graph();
            self.store.retain_present(|id| graph.contains(id));
            self.focus.sync(self.engine.graph(), state.locale);
            self.synced_locale = state.locale;
            self.focus.announce(self.focus.describe_render_set().to_owned());
            self.expanded_seen = self.store.state().expanded.clone();
        } else if state.locale != self.synced_locale {
            self.focus.sync(self.engine.graph(), state.locale);
            self.synced_locale = state.locale;
        }

        let expanded = &self.store.state().expanded;
        if *expanded != self.expanded_seen {
            for id in expanded.difference(&self.expanded_seen) {
                self.engine.expand(id);
            }
            self.expanded_seen = expanded.clone();
        }
        reassembled
    }

    /// Runs one frame against `surface`: refresh, simulate, draw, then
    /// feed the frame time back into the budget.
    pub fn frame(
        &mut self,
        surface: &mut dyn DrawSurface,
        canvas: Rect,
    ) -> Result<FrameStats, EngineError> {
        let started = Instant::now();
        self.refresh();

        let state = self.store.snapshot();
        self.engine.step(&state);
        let view = ViewTransform::new(canvas, &state.viewport);
        self.last_view = Some(view);
        let focus = self.focus.indicator(&self.engine, &view);

        let result = self
            .engine
            .render(&state, surface, view, focus, no_results(state.locale));
        match &result {
            Ok(stats) => {
                self.last_stats = Some(*stats);
                self.last_error = None;
                self.engine.record_frame_time(started.elapsed());
            }
            Err(error) => self.last_error = Some(error.clone()),
        }
        result
    }

    /// Clears a surface loss so the next frame draws again.
    pub fn retry_surface(&mut self) {
        self.engine.restore_surface();
        self.last_error = None;
    }

    /// Adds or removes relationships from the focus ring right away.
    pub fn set_focus_relationships(&mut self, include: bool) {
        if self.focus.includes_relationships() == include {
            return;
        }
        self.focus.set_include_relationships(include);
        self.focus.sync(self.engine.graph(), self.synced_locale);
    }

    /// Focuses and highlights a node picked outside the canvas, such as a
    /// neighbour row in the details panel.
    pub fn focus_node(&mut self, id: &str) -> bool {
        if !self.focus.set_focused_element(id) {
            return false;
        }
        self.store.set_highlight_node(Some(id));
        true
    }

    pub fn handle_key(&mut self, command: KeyCommand) {
        self.focus.set_keyboard_navigation(true);
        let locale = self.store.state().locale;

        match command {
            KeyCommand::Next => {
                self.focus.next();
            }
            KeyCommand::Previous => {
                self.focus.previous();
            }
            KeyCommand::NeighborForward => {
                self.focus.move_to_neighbor(NeighborDirection::Forward);
            }
            KeyCommand::NeighborBackward => {
                self.focus.move_to_neighbor(NeighborDirection::Backward);
            }
            KeyCommand::First => {
                self.focus.first();
            }
            KeyCommand::Last => {
                self.focus.last();
            }
            KeyCommand::Activate => self.activate_focused(),
            KeyCommand::ToggleExpand => {
                if let Some(id) = self.focused_node_id() {
                    if self.store.state().expanded.contains(&id) {
                        self.store.collapse_node(&id);
                    } else {
                        self.store.expand_node(&id);
                    }
                }
            }
            KeyCommand::ClearFocus => {
                self.focus.clear_focus();
                self.focus.set_keyboard_navigation(false);
                self.store.set_highlight_node(None);
                return;
            }
            KeyCommand::ZoomIn => self.store.zoom_about(KEYBOARD_ZOOM_STEP, Vec2::ZERO),
            KeyCommand::ZoomOut => self.store.zoom_about(1.0 / KEYBOARD_ZOOM_STEP, Vec2::ZERO),
            KeyCommand::ResetView => {
                self.store.reset_view();
                self.focus.announce(view_reset(locale));
            }
            KeyCommand::TogglePlay => self.store.toggle_play(),
            KeyCommand::Help => self.focus.announce(keyboard_help(locale)),
        }

        let focused = self.focused_node_id();
        self.store.set_highlight_node(focused.as_deref());
    }

    /// Pointer click at `screen`: toggles selection of the node under it
    /// and moves focus there, or clears the selection on empty canvas.
    pub fn click(&mut self, screen: Pos2) -> Option<usize> {
        let hit = self.hit_test(screen);
        match hit {
            Some(index) => {
                let id = self.engine.graph().nodes()[index].id().to_owned();
                self.focus.set_focused_element(&id);
                self.toggle_selection(&id);
            }
            None => self.store.clear_selected_nodes(),
        }
        hit
    }

    pub fn hover(&mut self, screen: Option<Pos2>) -> Option<usize> {
        let hit = screen.and_then(|screen| self.hit_test(screen));
        self.engine.set_hovered(hit);
        hit
    }

    pub fn hit_test(&self, screen: Pos2) -> Option<usize> {
        let view = self.last_view.as_ref()?;
        self.engine.hit_test(screen, view)
    }

    /// Moves `index` under the pointer; the node stays pinned until
    /// [`Session::release`].
    pub fn drag(&mut self, index: usize, screen: Pos2) {
        if let Some(view) = self.last_view {
            self.engine.drag_node(index, view.screen_to_world(screen));
        }
    }

    pub fn release(&mut self, index: usize) {
        self.engine.release_node(index);
    }

    fn focused_node_id(&self) -> Option<String> {
        self.focus
            .focused_entry()
            .filter(|entry| entry.kind == FocusKind::Node)
            .map(|entry| entry.id.clone())
    }

    fn activate_focused(&mut self) {
        let Some(entry) = self.focus.focused_entry() else {
            return;
        };
        match entry.kind {
            FocusKind::Node => {
                let id = entry.id.clone();
                self.toggle_selection(&id);
            }
            FocusKind::Relationship => {
                let description = entry.description.clone();
                self.focus.announce(description);
            }
        }
    }

    fn toggle_selection(&mut self, id: &str) {
        self.store.toggle_select_node(id);
        let state = self.store.state();
        let Some(index) = self.engine.graph().node_index(id) else {
            return;
        };
        let name = self.engine.graph().nodes()[index]
            .meta()
            .display_name(state.locale)
            .to_owned();
        let message = selection_changed(&name, state.is_selected(id), state.locale);
        self.focus.announce(message);
    }
}
