use std::time::Duration;

use eframe::egui::{Color32, Rect, pos2};
use graf_wiedzy::engine::{
    CommandList, DrawCommand, EngineError, FRAME_BUDGET, FrameBudget, GraphEngine,
    SimulationPhase, ViewTransform,
};
use graf_wiedzy::knowledge::{
    Dataset, EvidenceLevel, FilterSpec, GraphPayload, NodeRecord, NodeType, RelationshipRecord,
    RelationshipType, SourceSpec, assemble,
};
use graf_wiedzy::session::Session;
use graf_wiedzy::state::{ContrastMode, GraphState, GraphStore};

const MAX_SETTLE_FRAMES: usize = 2_000;

fn canvas() -> Rect {
    Rect::from_min_max(pos2(0.0, 0.0), pos2(2000.0, 2000.0))
}

fn ring_payload(count: usize) -> GraphPayload {
    let nodes = (0..count)
        .map(|index| {
            NodeRecord::new(
                format!("n{index}"),
                format!("Node {index}"),
                NodeType::Mechanism,
                EvidenceLevel::Moderate,
            )
            .with_importance(index as f32 / count as f32)
        })
        .collect::<Vec<_>>();
    let relationships = (0..count)
        .map(|index| {
            let next = (index + 1) % count;
            RelationshipRecord::new(
                format!("n{index}-n{next}"),
                format!("n{index}"),
                format!("n{next}"),
                RelationshipType::Synergizes,
                0.7,
            )
        })
        .collect::<Vec<_>>();
    assemble(&nodes, &relationships, &[], &FilterSpec::default())
}

#[test]
fn stable_graph_settles_within_bounded_frames() {
    let state = GraphState::default();
    let mut engine = GraphEngine::new();
    engine.load(&ring_payload(40), &state);
    assert_eq!(engine.phase(), SimulationPhase::Simulating);

    let settled_after = (0..MAX_SETTLE_FRAMES).find(|_| {
        engine.step(&state);
        engine.phase() == SimulationPhase::Settled
    });
    assert!(settled_after.is_some(), "still moving after {MAX_SETTLE_FRAMES} frames");

    let ticks = engine.total_ticks();
    assert_eq!(engine.step(&state), 0);
    assert_eq!(engine.total_ticks(), ticks);
    assert!(engine.graph().nodes().iter().all(|node| node.position().is_finite()));
}

#[test]
fn large_graph_settles_with_approximate_repulsion() {
    let dataset = SourceSpec::Synthetic(400)
        .load()
        .expect("synthetic dataset loads");
    let payload = assemble(
        &dataset.nodes,
        &dataset.relationships,
        &dataset.supplements,
        &FilterSpec::default(),
    );
    let state = GraphState::default();
    let mut engine = GraphEngine::new();
    engine.load(&payload, &state);

    let settled = (0..MAX_SETTLE_FRAMES).any(|_| {
        engine.step(&state);
        engine.phase() == SimulationPhase::Settled
    });
    assert!(settled);
}

#[test]
fn empty_render_set_draws_the_no_results_message() {
    let mut session = Session::new(Dataset::default(), GraphStore::default());
    let mut surface = CommandList::new();

    let stats = session
        .frame(&mut surface, canvas())
        .expect("an empty graph is not an error");

    assert_eq!(stats.drawn_nodes, 0);
    assert_eq!(stats.drawn_edges, 0);
    assert!(
        surface
            .texts()
            .any(|text| text == "No results: no nodes match the current filters.")
    );
}

#[test]
fn render_cap_samples_out_the_least_important_nodes() {
    let mut state = GraphState::default();
    state.viewport.render_node_cap = 10;
    let mut engine = GraphEngine::new();
    engine.load(&ring_payload(40), &state);

    let mut surface = CommandList::new();
    let view = ViewTransform::new(canvas(), &state.viewport);
    let stats = engine
        .render(&state, &mut surface, view, None, "")
        .expect("recording surface is available");

    assert_eq!(stats.drawn_nodes, 10);
    assert_eq!(stats.sampled_out, 30);
    assert_eq!(stats.render_cap, 10);
    assert_eq!(surface.circle_count(), 10);
}

#[test]
fn high_contrast_mode_draws_in_one_foreground() {
    let yellow = Color32::from_rgb(0xff, 0xff, 0);
    let state = GraphState {
        contrast: ContrastMode::BlueYellow,
        ..GraphState::default()
    };
    let mut engine = GraphEngine::new();
    engine.load(&ring_payload(6), &state);

    let mut surface = CommandList::new();
    let view = ViewTransform::new(canvas(), &state.viewport);
    engine
        .render(&state, &mut surface, view, None, "")
        .expect("recording surface is available");

    assert_eq!(
        surface.commands().first(),
        Some(&DrawCommand::Clear(Color32::from_rgb(0, 0, 0x80)))
    );
    for command in surface.commands() {
        match command {
            DrawCommand::Line { stroke, .. }
            | DrawCommand::Quadratic { stroke, .. }
            | DrawCommand::Circle { stroke, .. } => assert_eq!(stroke.color, yellow),
            DrawCommand::Text { color, .. } | DrawCommand::Polygon { fill: color, .. } => {
                assert_eq!(*color, yellow)
            }
            DrawCommand::Clear(_) | DrawCommand::Rect { .. } => {}
        }
    }
    assert_eq!(surface.circle_count(), 6);
}

#[test]
fn degraded_budget_shrinks_the_render_cap() {
    let mut budget = FrameBudget::new(FRAME_BUDGET);
    for _ in 0..200 {
        budget.record(Duration::from_millis(50));
    }
    assert_eq!(budget.substeps(), 1);
    assert!(budget.cap_scale() < 1.0);

    let state = GraphState::default();
    let mut engine = GraphEngine::with_budget(budget);
    engine.load(&ring_payload(40), &state);
    let mut surface = CommandList::new();
    let view = ViewTransform::new(canvas(), &state.viewport);
    let stats = engine
        .render(&state, &mut surface, view, None, "")
        .expect("recording surface is available");

    assert!(stats.render_cap < state.viewport.render_node_cap);
    assert!(stats.drawn_nodes <= stats.render_cap);
}

#[test]
fn lost_surface_is_recoverable() {
    let dataset = SourceSpec::Synthetic(30)
        .load()
        .expect("synthetic dataset loads");
    let mut session = Session::new(dataset, GraphStore::default());
    let mut surface = CommandList::new();
    session
        .frame(&mut surface, canvas())
        .expect("first frame draws");

    surface.set_available(false);
    let error = session
        .frame(&mut surface, canvas())
        .expect_err("lost surface is reported");
    assert!(matches!(error, EngineError::SurfaceUnavailable(_)));
    assert!(error.to_string().starts_with("rendering unavailable, retry"));
    assert!(session.engine().is_suspended());
    assert_ne!(session.engine().phase(), SimulationPhase::Simulating);

    surface.set_available(true);
    let ticks = session.engine().total_ticks();
    assert!(session.frame(&mut surface, canvas()).is_err());
    assert_eq!(session.engine().total_ticks(), ticks);

    session.retry_surface();
    session
        .frame(&mut surface, canvas())
        .expect("frame draws after retry");
    assert!(!session.engine().is_suspended());
}

#[test]
fn paused_simulation_does_not_tick() {
    let mut store = GraphStore::default();
    let mut engine = GraphEngine::new();
    engine.load(&ring_payload(12), &store.snapshot());

    store.set_playing(false);
    let paused = store.snapshot();
    assert_eq!(engine.step(&paused), 0);
    assert_eq!(engine.phase(), SimulationPhase::Idle);

    store.set_playing(true);
    assert!(engine.step(&store.snapshot()) > 0);
    assert_eq!(engine.phase(), SimulationPhase::Simulating);
}
