//! Layout simulation and budgeted drawing over the assembled render set.
//!
//! [`GraphEngine`] owns the render set once it is handed over and is the
//! only writer of node positions. Everything else reads through
//! [`RenderGraph`] by index or id.

use std::time::Duration;

use eframe::egui::{Pos2, Vec2};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::knowledge::GraphPayload;
use crate::state::{GraphState, LayoutMode};

mod budget;
mod graph;
mod highlight;
mod layout;
mod physics;
mod render;
pub mod style;
mod surface;
mod view;

pub use budget::{BudgetAdjustment, FRAME_BUDGET, FpsWindow, FrameBudget, MAX_SUBSTEPS};
pub use graph::{RebuildSummary, RenderEdge, RenderGraph, RenderNode};
pub use surface::{
    CommandList, DrawCommand, DrawSurface, EguiSurface, SurfaceError, SurfaceTransform,
};
pub use view::{
    CULL_MARGIN, FocusIndicator, LOD_FULL_ZOOM, LOD_LABEL_ZOOM, LevelOfDetail, ViewTransform,
};

use physics::{Partition, WORLD_HALF_EXTENT};
use render::{RenderInputs, draw_frame};
use view::NodeVisibility;

const ALPHA_START: f32 = 1.0;
/// Below this temperature the layout counts as settled.
const ALPHA_MIN: f32 = 0.001;
/// Reaches `ALPHA_MIN` from `ALPHA_START` in about 300 ticks.
const ALPHA_DECAY: f32 = 0.0228;
const SETTLE_MIN_TICKS: usize = 30;
const SETTLE_SPEED: f32 = 0.05;
const RELOAD_HEAT: f32 = 0.6;
const DRAG_HEAT: f32 = 0.3;
const EXPAND_HEAT: f32 = 0.5;
const HIT_SLOP: f32 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationPhase {
    Idle,
    Simulating,
    Settled,
}

impl SimulationPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Simulating => "simulating",
            Self::Settled => "settled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum EngineError {
    #[error("rendering unavailable, retry: {0}")]
    SurfaceUnavailable(#[from] SurfaceError),
}

/// What the last frame drew and skipped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub drawn_nodes: usize,
    pub drawn_edges: usize,
    pub drawn_labels: usize,
    pub culled_nodes: usize,
    pub sampled_out: usize,
    pub lod: LevelOfDetail,
    pub render_cap: usize,
}

pub struct GraphEngine {
    graph: RenderGraph,
    phase: SimulationPhase,
    alpha: f32,
    ticks_in_phase: usize,
    total_ticks: u64,
    layout: LayoutMode,
    budget: FrameBudget,
    partition: Partition,
    suspended: Option<SurfaceError>,
    show_partition: bool,
    hovered: Option<usize>,
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphEngine {
    pub fn new() -> Self {
        Self::with_budget(FrameBudget::default())
    }

    pub fn with_budget(budget: FrameBudget) -> Self {
        Self {
            graph: RenderGraph::default(),
            phase: SimulationPhase::Idle,
            alpha: 0.0,
            ticks_in_phase: 0,
            total_ticks: 0,
            layout: LayoutMode::default(),
            budget,
            partition: Partition::default(),
            suspended: None,
            show_partition: false,
            hovered: None,
        }
    }

    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn budget(&self) -> &FrameBudget {
        &self.budget
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.is_some()
    }

    pub fn show_partition(&self) -> bool {
        self.show_partition
    }

    pub fn set_partition_overlay(&mut self, show: bool) {
        self.show_partition = show;
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn set_hovered(&mut self, hovered: Option<usize>) {
        self.hovered = hovered.filter(|&index| index < self.graph.len());
    }

    /// Takes ownership of a new render set. Surviving nodes keep their
    /// place; the simulation reheats unless a static layout is active.
    pub fn load(&mut self, payload: &GraphPayload, state: &GraphState) -> RebuildSummary {
        let summary = self.graph.rebuild(payload);
        self.partition.invalidate();
        self.hovered = None;
        self.layout = state.viewport.layout;
        info!(
            nodes = self.graph.len(),
            relationships = self.graph.edges().len(),
            kept = summary.kept,
            added = summary.added,
            removed = summary.removed,
            "render set loaded"
        );

        if !self.layout.is_simulated() {
            self.arrange(self.layout);
            return summary;
        }
        if self.graph.len() < 2 {
            self.settle();
            return summary;
        }

        let heat = if summary.kept == 0 {
            ALPHA_START
        } else {
            RELOAD_HEAT
        };
        self.alpha = 0.0;
        self.reheat(heat, state);
        summary
    }

    /// Runs this frame's simulation ticks and returns how many ran.
    pub fn step(&mut self, state: &GraphState) -> usize {
        if state.viewport.layout != self.layout {
            self.switch_layout(state.viewport.layout, state);
        }

        let running = self.wants_motion(state);
        match self.phase {
            SimulationPhase::Simulating if !running => {
                self.transition(SimulationPhase::Idle);
            }
            SimulationPhase::Idle if running && self.alpha > ALPHA_MIN => {
                self.transition(SimulationPhase::Simulating);
            }
            _ => {}
        }
        if self.phase != SimulationPhase::Simulating {
            return 0;
        }

        let mut ticks = 0;
        for _ in 0..self.budget.substeps() {
            self.tick();
            ticks += 1;
            if self.phase != SimulationPhase::Simulating {
                break;
            }
        }
        ticks
    }

    /// Raises the temperature after an external disturbance. A paused
    /// simulation stays paused but resumes hotter.
    pub fn perturb(&mut self, heat: f32) {
        if self.graph.len() < 2 || !self.layout.is_simulated() || !heat.is_finite() {
            return;
        }

        self.alpha = self.alpha.max(heat.clamp(0.0, ALPHA_START));
        self.ticks_in_phase = 0;
        if self.phase == SimulationPhase::Settled {
            self.transition(SimulationPhase::Simulating);
        }
    }

    /// Pins `index` under the pointer at `world`.
    pub fn drag_node(&mut self, index: usize, world: Vec2) {
        if !world.is_finite() {
            return;
        }
        let Some(node) = self.graph.node_mut(index) else {
            return;
        };

        node.set_pinned(true);
        node.set_position(world.clamp(
            Vec2::splat(-WORLD_HALF_EXTENT),
            Vec2::splat(WORLD_HALF_EXTENT),
        ));
        self.perturb(DRAG_HEAT);
    }

    pub fn release_node(&mut self, index: usize) {
        if let Some(node) = self.graph.node_mut(index) {
            node.set_pinned(false);
            self.perturb(DRAG_HEAT);
        }
    }

    /// Nudges the layout after `id` was expanded.
    pub fn expand(&mut self, id: &str) {
        if self.graph.node_index(id).is_some() {
            self.perturb(EXPAND_HEAT);
        }
    }

    /// Draws one frame. A surface that fails to begin suspends the engine
    /// until [`GraphEngine::restore_surface`].
    pub fn render(
        &mut self,
        state: &GraphState,
        surface: &mut dyn DrawSurface,
        view: ViewTransform,
        focus: Option<FocusIndicator>,
        empty_message: &str,
    ) -> Result<FrameStats, EngineError> {
        if let Some(lost) = &self.suspended {
            return Err(EngineError::SurfaceUnavailable(lost.clone()));
        }

        if let Err(lost) = surface.begin_frame(view.canvas) {
            error!(error = %lost, "drawing surface lost, suspending simulation");
            if self.phase == SimulationPhase::Simulating {
                self.transition(SimulationPhase::Idle);
            }
            self.suspended = Some(lost.clone());
            return Err(lost.into());
        }

        let inputs = RenderInputs {
            state,
            view,
            cap: self.budget.effective_cap(state.viewport.render_node_cap),
            focus,
            hovered: self.hovered,
            show_partition: self.show_partition,
            empty_message,
        };
        Ok(draw_frame(&mut self.graph, surface, inputs))
    }

    /// Clears a surface loss. The next `step` resumes the simulation.
    pub fn restore_surface(&mut self) {
        if let Some(lost) = self.suspended.take() {
            info!(previous = %lost, "drawing surface restored");
        }
    }

    pub fn record_frame_time(&mut self, frame_time: Duration) -> BudgetAdjustment {
        self.budget.record(frame_time)
    }

    /// Topmost drawn node under `screen`, read from live positions.
    pub fn hit_test(&self, screen: Pos2, view: &ViewTransform) -> Option<usize> {
        let visibility = &self.graph.view_scratch.visibility;
        let mut best: Option<(usize, f32)> = None;
        for (index, node) in self.graph.nodes().iter().enumerate() {
            if visibility.len() == self.graph.len()
                && visibility[index] != NodeVisibility::Drawn
            {
                continue;
            }

            let center = view.world_to_screen(node.position());
            let reach = view.screen_radius(node.radius()) + HIT_SLOP;
            let distance_sq = center.distance_sq(screen);
            if distance_sq > reach * reach {
                continue;
            }
            let closer = best.is_none_or(|(_, best_sq)| distance_sq <= best_sq);
            if closer {
                best = Some((index, distance_sq));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Current screen center and radius of `index`, from the live position.
    pub fn node_screen_geometry(&self, index: usize, view: &ViewTransform) -> Option<(Pos2, f32)> {
        let node = self.graph.node(index)?;
        Some((
            view.world_to_screen(node.position()),
            view.screen_radius(node.radius()),
        ))
    }

    fn wants_motion(&self, state: &GraphState) -> bool {
        state.viewport.playing
            && state.viewport.physics_enabled
            && self.layout.is_simulated()
            && self.suspended.is_none()
    }

    fn tick(&mut self) {
        let outcome = physics::step(&mut self.graph, &mut self.partition, self.alpha);
        self.alpha *= 1.0 - ALPHA_DECAY;
        self.ticks_in_phase += 1;
        self.total_ticks += 1;

        let still = self.ticks_in_phase >= SETTLE_MIN_TICKS
            && outcome.max_speed_sq < SETTLE_SPEED * SETTLE_SPEED;
        if self.alpha < ALPHA_MIN || still {
            self.settle();
        }
    }

    fn reheat(&mut self, heat: f32, state: &GraphState) {
        self.alpha = self.alpha.max(heat);
        self.ticks_in_phase = 0;
        let next = if self.wants_motion(state) {
            SimulationPhase::Simulating
        } else {
            SimulationPhase::Idle
        };
        self.transition(next);
    }

    fn settle(&mut self) {
        self.alpha = 0.0;
        for node in self.graph.nodes_mut() {
            node.set_velocity(Vec2::ZERO);
        }
        self.transition(SimulationPhase::Settled);
    }

    fn switch_layout(&mut self, mode: LayoutMode, state: &GraphState) {
        debug!(from = self.layout.label(), to = mode.label(), "layout mode changed");
        self.layout = mode;
        self.partition.invalidate();
        if !mode.is_simulated() {
            self.arrange(mode);
        } else if self.graph.len() >= 2 {
            self.reheat(ALPHA_START, state);
        }
    }

    fn arrange(&mut self, mode: LayoutMode) {
        if let Some(targets) = layout::arrange(mode, &self.graph) {
            for (node, target) in self.graph.nodes_mut().iter_mut().zip(targets) {
                node.set_position(target);
            }
        }
        self.settle();
    }

    fn transition(&mut self, next: SimulationPhase) {
        if self.phase == next {
            return;
        }
        debug!(
            from = self.phase.label(),
            to = next.label(),
            alpha = self.alpha,
            nodes = self.graph.len(),
            "simulation phase changed"
        );
        self.phase = next;
        self.ticks_in_phase = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{
        EvidenceLevel, FilterSpec, NodeRecord, NodeType, RelationshipRecord, RelationshipType,
        assemble,
    };
    use eframe::egui::{Rect, pos2};

    fn chain(count: usize) -> GraphPayload {
        let nodes = (0..count)
            .map(|index| {
                NodeRecord::new(
                    format!("n{index}"),
                    format!("Node {index}"),
                    NodeType::Mechanism,
                    EvidenceLevel::Strong,
                )
                .with_importance(1.0 - index as f32 * 0.01)
            })
            .collect::<Vec<_>>();
        let relationships = (1..count)
            .map(|index| {
                RelationshipRecord::new(
                    format!("r{index}"),
                    format!("n{}", index - 1),
                    format!("n{index}"),
                    RelationshipType::Modulates,
                    0.8,
                )
            })
            .collect::<Vec<_>>();
        assemble(&nodes, &relationships, &[], &FilterSpec::default())
    }

    fn view() -> ViewTransform {
        ViewTransform {
            canvas: Rect::from_min_max(pos2(0.0, 0.0), pos2(1000.0, 800.0)),
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }

    #[test]
    fn single_node_is_settled_immediately() {
        let mut engine = GraphEngine::new();
        let state = GraphState::default();
        engine.load(&chain(1), &state);
        assert_eq!(engine.phase(), SimulationPhase::Settled);
        assert_eq!(engine.step(&state), 0);
    }

    #[test]
    fn pause_moves_to_idle_and_resume_continues() {
        let mut engine = GraphEngine::new();
        let mut state = GraphState::default();
        engine.load(&chain(6), &state);
        assert_eq!(engine.phase(), SimulationPhase::Simulating);

        state.viewport.playing = false;
        assert_eq!(engine.step(&state), 0);
        assert_eq!(engine.phase(), SimulationPhase::Idle);

        state.viewport.playing = true;
        assert!(engine.step(&state) > 0);
        assert_eq!(engine.phase(), SimulationPhase::Simulating);
    }

    #[test]
    fn settled_layout_wakes_on_drag() {
        let mut engine = GraphEngine::new();
        let state = GraphState::default();
        engine.load(&chain(5), &state);
        for _ in 0..1_000 {
            engine.step(&state);
        }
        assert_eq!(engine.phase(), SimulationPhase::Settled);

        engine.drag_node(2, Vec2::new(300.0, -120.0));
        assert_eq!(engine.phase(), SimulationPhase::Simulating);
        let node = &engine.graph().nodes()[2];
        assert!(node.is_pinned());
        assert_eq!(node.position(), Vec2::new(300.0, -120.0));
    }

    #[test]
    fn static_layout_settles_without_ticks() {
        let mut engine = GraphEngine::new();
        let mut state = GraphState::default();
        state.viewport.layout = LayoutMode::Circular;
        engine.load(&chain(8), &state);
        assert_eq!(engine.phase(), SimulationPhase::Settled);
        assert_eq!(engine.step(&state), 0);

        let radius = engine.graph().nodes()[0].position().length();
        for node in engine.graph().nodes() {
            assert!((node.position().length() - radius).abs() < 1e-2);
        }
    }

    #[test]
    fn hit_test_reads_live_positions() {
        let mut engine = GraphEngine::new();
        let state = GraphState::default();
        engine.load(&chain(3), &state);
        engine.drag_node(1, Vec2::new(50.0, 40.0));

        let view = view();
        let (center, _) = engine.node_screen_geometry(1, &view).unwrap();
        assert_eq!(center, pos2(550.0, 440.0));
        assert_eq!(engine.hit_test(center, &view), Some(1));
        assert_eq!(engine.hit_test(pos2(-400.0, -400.0), &view), None);
    }

    #[test]
    fn lost_surface_suspends_until_restored() {
        let mut engine = GraphEngine::new();
        let state = GraphState::default();
        engine.load(&chain(4), &state);

        let mut surface = CommandList::new();
        surface.set_available(false);
        let result = engine.render(&state, &mut surface, view(), None, "");
        assert!(matches!(result, Err(EngineError::SurfaceUnavailable(_))));
        assert!(engine.is_suspended());
        assert_eq!(engine.step(&state), 0);

        surface.set_available(true);
        assert!(engine.render(&state, &mut surface, view(), None, "").is_err());

        engine.restore_surface();
        let stats = engine.render(&state, &mut surface, view(), None, "").unwrap();
        assert_eq!(stats.drawn_nodes, 4);
        assert!(engine.step(&state) > 0);
    }
}
