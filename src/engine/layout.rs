use std::collections::VecDeque;
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};

use crate::knowledge::NodeType;
use crate::state::LayoutMode;

use super::graph::RenderGraph;

const RING_GAP: f32 = 24.0;
const MIN_RING_RADIUS: f32 = 120.0;
const LAYER_SPACING: f32 = 140.0;
const LAYER_NODE_SPACING: f32 = 90.0;
const TYPE_RING_START: f32 = 140.0;
const TYPE_RING_STEP: f32 = 150.0;

/// Target positions for a static layout mode, indexed like the graph.
/// `Force` has no fixed arrangement and yields `None`.
pub(super) fn arrange(mode: LayoutMode, graph: &RenderGraph) -> Option<Vec<Vec2>> {
    match mode {
        LayoutMode::Force => None,
        LayoutMode::Circular => Some(circular(graph)),
        LayoutMode::Hierarchical => Some(hierarchical(graph)),
        LayoutMode::Radial => Some(radial(graph)),
    }
}

/// Indices ordered by importance, highest first, ties by index.
fn by_importance(graph: &RenderGraph, indices: &mut [usize]) {
    let nodes = graph.nodes();
    indices.sort_by(|a, b| {
        nodes[*b]
            .meta()
            .importance
            .total_cmp(&nodes[*a].meta().importance)
            .then(a.cmp(b))
    });
}

/// Spreads `ring` evenly, starting at twelve o'clock.
fn place_on_ring(ring: &[usize], radius: f32, positions: &mut [Vec2]) {
    for (slot, &index) in ring.iter().enumerate() {
        let angle = (slot as f32 / ring.len() as f32) * TAU - TAU / 4.0;
        positions[index] = vec2(angle.cos(), angle.sin()) * radius;
    }
}

fn ring_radius(graph: &RenderGraph, ring: &[usize]) -> f32 {
    let circumference = ring
        .iter()
        .map(|&index| graph.nodes()[index].radius() * 2.0 + RING_GAP)
        .sum::<f32>();
    (circumference / TAU).max(MIN_RING_RADIUS)
}

fn circular(graph: &RenderGraph) -> Vec<Vec2> {
    let mut positions = vec![Vec2::ZERO; graph.len()];
    if graph.len() < 2 {
        return positions;
    }

    let mut order = (0..graph.len()).collect::<Vec<_>>();
    by_importance(graph, &mut order);
    let radius = ring_radius(graph, &order);
    place_on_ring(&order, radius, &mut positions);
    positions
}

/// Concentric rings, one per node type present, in declaration order.
fn radial(graph: &RenderGraph) -> Vec<Vec2> {
    let mut positions = vec![Vec2::ZERO; graph.len()];
    let mut radius = 0.0_f32;
    let mut ring_index = 0usize;
    for node_type in NodeType::ALL {
        let mut ring = (0..graph.len())
            .filter(|&index| graph.nodes()[index].meta().node_type == node_type)
            .collect::<Vec<_>>();
        if ring.is_empty() {
            continue;
        }
        by_importance(graph, &mut ring);

        let wanted = TYPE_RING_START + ring_index as f32 * TYPE_RING_STEP;
        radius = ring_radius(graph, &ring).max(wanted).max(radius + TYPE_RING_STEP);
        place_on_ring(&ring, radius, &mut positions);
        ring_index += 1;
    }
    positions
}

/// Breadth-first layers. Roots are nodes without incoming relationships,
/// most important first; leftover components start from their most
/// important node.
fn hierarchical(graph: &RenderGraph) -> Vec<Vec2> {
    let node_count = graph.len();
    let mut depth = vec![usize::MAX; node_count];
    let mut has_incoming = vec![false; node_count];
    for edge in graph.edges() {
        has_incoming[edge.target] = true;
    }

    let mut order = (0..node_count).collect::<Vec<_>>();
    by_importance(graph, &mut order);
    let roots = order
        .iter()
        .copied()
        .filter(|&index| !has_incoming[index])
        .chain(order.iter().copied());

    let mut layers: Vec<Vec<usize>> = Vec::new();
    let mut queue = VecDeque::new();
    for root in roots {
        if depth[root] != usize::MAX {
            continue;
        }
        depth[root] = 0;
        queue.push_back(root);
        while let Some(index) = queue.pop_front() {
            let level = depth[index];
            if layers.len() <= level {
                layers.resize_with(level + 1, Vec::new);
            }
            layers[level].push(index);

            for &edge_index in graph.incident_edges(index) {
                let edge = &graph.edges()[edge_index];
                if edge.source == index && depth[edge.target] == usize::MAX {
                    depth[edge.target] = level + 1;
                    queue.push_back(edge.target);
                }
            }
        }
    }

    let mut positions = vec![Vec2::ZERO; node_count];
    let top = -((layers.len().saturating_sub(1)) as f32) * LAYER_SPACING * 0.5;
    for (level, layer) in layers.iter().enumerate() {
        let width = (layer.len().saturating_sub(1)) as f32 * LAYER_NODE_SPACING;
        for (slot, &index) in layer.iter().enumerate() {
            positions[index] = vec2(
                slot as f32 * LAYER_NODE_SPACING - width * 0.5,
                top + level as f32 * LAYER_SPACING,
            );
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{
        EvidenceLevel, FilterSpec, NodeRecord, RelationshipRecord, RelationshipType, assemble,
    };

    fn graph(nodes: &[(&str, NodeType, f32)], edges: &[(&str, &str)]) -> RenderGraph {
        let nodes = nodes
            .iter()
            .map(|(id, node_type, importance)| {
                NodeRecord::new(*id, *id, *node_type, EvidenceLevel::Moderate)
                    .with_importance(*importance)
            })
            .collect::<Vec<_>>();
        let relationships = edges
            .iter()
            .map(|(source, target)| {
                RelationshipRecord::new(
                    format!("{source}-{target}"),
                    *source,
                    *target,
                    RelationshipType::Produces,
                    0.5,
                )
            })
            .collect::<Vec<_>>();
        let payload = assemble(&nodes, &relationships, &[], &FilterSpec::default());
        let mut graph = RenderGraph::default();
        graph.rebuild(&payload);
        graph
    }

    #[test]
    fn force_has_no_fixed_arrangement() {
        let graph = graph(&[("a", NodeType::Herb, 0.5)], &[]);
        assert!(arrange(LayoutMode::Force, &graph).is_none());
    }

    #[test]
    fn circular_starts_with_most_important_at_top() {
        let graph = graph(
            &[
                ("low", NodeType::Herb, 0.1),
                ("high", NodeType::Herb, 0.9),
                ("mid", NodeType::Herb, 0.5),
            ],
            &[],
        );
        let positions = arrange(LayoutMode::Circular, &graph).expect("static layout");
        let high = positions[graph.node_index("high").expect("present")];

        assert!(high.x.abs() < 1e-3);
        assert!(high.y < 0.0);
        let radius = high.length();
        for position in &positions {
            assert!((position.length() - radius).abs() < 1e-3);
        }
    }

    #[test]
    fn hierarchical_puts_targets_below_sources() {
        let graph = graph(
            &[
                ("root", NodeType::Supplement, 0.9),
                ("child", NodeType::Neurotransmitter, 0.5),
                ("grandchild", NodeType::BrainRegion, 0.3),
            ],
            &[("root", "child"), ("child", "grandchild")],
        );
        let positions = arrange(LayoutMode::Hierarchical, &graph).expect("static layout");
        let y = |id: &str| positions[graph.node_index(id).expect("present")].y;

        assert!(y("root") < y("child"));
        assert!(y("child") < y("grandchild"));
    }

    #[test]
    fn radial_gives_each_type_its_own_ring() {
        let graph = graph(
            &[
                ("s1", NodeType::Supplement, 0.5),
                ("s2", NodeType::Supplement, 0.4),
                ("n1", NodeType::Neurotransmitter, 0.5),
            ],
            &[],
        );
        let positions = arrange(LayoutMode::Radial, &graph).expect("static layout");
        let distance = |id: &str| positions[graph.node_index(id).expect("present")].length();

        assert!((distance("s1") - distance("s2")).abs() < 1e-3);
        assert!(distance("n1") > distance("s1"));
    }
}
