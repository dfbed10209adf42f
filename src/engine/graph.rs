use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2, vec2};
use tracing::warn;

use crate::knowledge::{GraphPayload, KnowledgeNode, KnowledgeRelationship};
use crate::util::stable_pair;

use super::physics::QuadtreeCell;
use super::view::NodeVisibility;

/// A node inside the engine arena. `meta.position` is the live position;
/// it is written only from inside the engine.
#[derive(Clone, Debug)]
pub struct RenderNode {
    meta: KnowledgeNode,
    velocity: Vec2,
    pinned: bool,
}

impl RenderNode {
    fn new(meta: KnowledgeNode, index: usize) -> Self {
        let (jx, jy) = stable_pair(&meta.id);
        let mut direction = vec2(jx, jy);
        if direction.length_sq() <= 0.0001 {
            let angle = ((index as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
            direction = vec2(angle.cos(), angle.sin());
        } else {
            direction = direction.normalized();
        }

        let initial_speed = 1.15 + meta.size * 0.022;
        Self {
            meta,
            velocity: direction * initial_speed,
            pinned: false,
        }
    }

    pub fn meta(&self) -> &KnowledgeNode {
        &self.meta
    }

    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn position(&self) -> Vec2 {
        self.meta.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn radius(&self) -> f32 {
        self.meta.size
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub(super) fn set_position(&mut self, position: Vec2) {
        self.meta.position = position;
    }

    pub(super) fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub(super) fn set_pinned(&mut self, pinned: bool) {
        self.pinned = pinned;
        if pinned {
            self.velocity = Vec2::ZERO;
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderEdge {
    pub meta: KnowledgeRelationship,
    pub source: usize,
    pub target: usize,
}

#[derive(Default)]
pub(super) struct PhysicsScratch {
    pub(super) forces: Vec<Vec2>,
    pub(super) positions: Vec<Vec2>,
    pub(super) radii: Vec<f32>,
}

#[derive(Default)]
pub(super) struct ViewScratch {
    pub(super) screen_positions: Vec<Pos2>,
    pub(super) screen_radii: Vec<f32>,
    pub(super) visible_indices: Vec<usize>,
    pub(super) visibility: Vec<NodeVisibility>,
    pub(super) draw_order: Vec<usize>,
    pub(super) quadtree_cells: Vec<QuadtreeCell>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    pub kept: usize,
    pub added: usize,
    pub removed: usize,
}

/// Flat arena the engine simulates and draws. Everything outside the engine
/// refers to nodes by index or id and reads positions through it.
#[derive(Default)]
pub struct RenderGraph {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    index_by_id: HashMap<String, usize>,
    edge_index_by_id: HashMap<String, usize>,
    neighbors: Vec<Vec<usize>>,
    incident: Vec<Vec<usize>>,
    pub(super) physics_scratch: PhysicsScratch,
    pub(super) view_scratch: ViewScratch,
}

impl RenderGraph {
    pub fn nodes(&self) -> &[RenderNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[RenderEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&RenderNode> {
        self.nodes.get(index)
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn edge_index(&self, id: &str) -> Option<usize> {
        self.edge_index_by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id) || self.edge_index_by_id.contains_key(id)
    }

    /// Nodes one relationship away, either direction, in index order.
    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.neighbors.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn incident_edges(&self, index: usize) -> &[usize] {
        self.incident.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(super) fn nodes_mut(&mut self) -> &mut [RenderNode] {
        &mut self.nodes
    }

    pub(super) fn node_mut(&mut self, index: usize) -> Option<&mut RenderNode> {
        self.nodes.get_mut(index)
    }

    /// Replaces the render set. Nodes whose id survives keep their position,
    /// velocity and pin; new nodes start from their seed position.
    pub(super) fn rebuild(&mut self, payload: &GraphPayload) -> RebuildSummary {
        let mut prior = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|node| (node.meta.id.clone(), node))
            .collect::<HashMap<_, _>>();

        let mut summary = RebuildSummary::default();
        let mut nodes = Vec::with_capacity(payload.nodes.len());
        for (index, meta) in payload.nodes.iter().enumerate() {
            match prior.remove(&meta.id) {
                Some(previous) => {
                    let mut meta = meta.clone();
                    meta.position = previous.meta.position;
                    nodes.push(RenderNode {
                        meta,
                        velocity: previous.velocity,
                        pinned: previous.pinned,
                    });
                    summary.kept += 1;
                }
                None => {
                    nodes.push(RenderNode::new(meta.clone(), index));
                    summary.added += 1;
                }
            }
        }
        summary.removed = prior.len();

        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.meta.id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut edges = Vec::with_capacity(payload.relationships.len());
        let mut neighbors = vec![Vec::new(); nodes.len()];
        let mut incident = vec![Vec::new(); nodes.len()];
        for relationship in &payload.relationships {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(&relationship.source_id),
                index_by_id.get(&relationship.target_id),
            ) else {
                warn!(
                    relationship = %relationship.id,
                    source = %relationship.source_id,
                    target = %relationship.target_id,
                    "rejecting relationship with an endpoint outside the render set"
                );
                continue;
            };

            let edge_index = edges.len();
            edges.push(RenderEdge {
                meta: relationship.clone(),
                source,
                target,
            });
            neighbors[source].push(target);
            neighbors[target].push(source);
            incident[source].push(edge_index);
            incident[target].push(edge_index);
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        self.edge_index_by_id = edges
            .iter()
            .enumerate()
            .map(|(index, edge)| (edge.meta.id.clone(), index))
            .collect();
        self.nodes = nodes;
        self.edges = edges;
        self.index_by_id = index_by_id;
        self.neighbors = neighbors;
        self.incident = incident;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{
        EvidenceLevel, FilterSpec, NodeRecord, NodeType, RelationshipRecord, RelationshipType,
        assemble,
    };

    fn payload(ids: &[&str], edges: &[(&str, &str)]) -> GraphPayload {
        let nodes = ids
            .iter()
            .map(|id| NodeRecord::new(*id, *id, NodeType::Vitamin, EvidenceLevel::Strong))
            .collect::<Vec<_>>();
        let relationships = edges
            .iter()
            .map(|(source, target)| {
                RelationshipRecord::new(
                    format!("{source}-{target}"),
                    *source,
                    *target,
                    RelationshipType::Requires,
                    0.4,
                )
            })
            .collect::<Vec<_>>();
        assemble(&nodes, &relationships, &[], &FilterSpec::default())
    }

    #[test]
    fn rebuild_keeps_surviving_positions_and_pins() {
        let mut graph = RenderGraph::default();
        graph.rebuild(&payload(&["a", "b", "c"], &[("a", "b")]));
        let b = graph.node_index("b").expect("present");
        graph.nodes_mut()[b].set_position(vec2(12.0, -7.0));
        graph.nodes_mut()[b].set_pinned(true);

        let summary = graph.rebuild(&payload(&["b", "d"], &[("b", "d")]));

        assert_eq!(
            summary,
            RebuildSummary {
                kept: 1,
                added: 1,
                removed: 2
            }
        );
        let b = graph.node_index("b").expect("still present");
        assert_eq!(b, 0);
        assert_eq!(graph.nodes()[b].position(), vec2(12.0, -7.0));
        assert!(graph.nodes()[b].is_pinned());
        assert!(!graph.contains("a"));
    }

    #[test]
    fn adjacency_is_symmetric_and_deduplicated() {
        let mut graph = RenderGraph::default();
        graph.rebuild(&payload(&["a", "b", "c"], &[("a", "b"), ("b", "a"), ("b", "c")]));
        let a = graph.node_index("a").expect("present");
        let b = graph.node_index("b").expect("present");

        assert_eq!(graph.neighbors(a), &[b]);
        assert_eq!(graph.neighbors(b).len(), 2);
        assert_eq!(graph.incident_edges(b).len(), 3);
        assert_eq!(graph.edge_index("b-c"), Some(2));
    }
}
