use std::collections::HashSet;

use crate::state::GraphState;

use super::graph::RenderGraph;

const RELATED_NODE_LIMIT: usize = 280;

/// Elements emphasized this frame. Built from the snapshot, never stored.
#[derive(Debug, Default)]
pub(super) struct HighlightState {
    /// Selected or highlighted nodes themselves.
    pub(super) focus_nodes: HashSet<usize>,
    /// One hop from a focus node.
    pub(super) related_nodes: HashSet<usize>,
    pub(super) related_edges: HashSet<usize>,
    /// One hop from an expanded node; always labelled.
    pub(super) revealed_nodes: HashSet<usize>,
}

impl HighlightState {
    pub(super) fn is_active(&self) -> bool {
        !self.focus_nodes.is_empty()
    }

    pub(super) fn emphasizes(&self, index: usize) -> bool {
        self.focus_nodes.contains(&index) || self.related_nodes.contains(&index)
    }
}

fn collect_one_hop(
    graph: &RenderGraph,
    origin: usize,
    nodes: &mut HashSet<usize>,
    mut edges: Option<&mut HashSet<usize>>,
) {
    for &edge_index in graph.incident_edges(origin) {
        if nodes.len() >= RELATED_NODE_LIMIT {
            return;
        }

        let edge = &graph.edges()[edge_index];
        let other = if edge.source == origin {
            edge.target
        } else {
            edge.source
        };
        nodes.insert(other);
        if let Some(edges) = edges.as_deref_mut() {
            edges.insert(edge_index);
        }
    }
}

pub(super) fn build_highlight_state(graph: &RenderGraph, state: &GraphState) -> HighlightState {
    let mut highlight = HighlightState::default();

    let focus_ids = state.selected.iter().chain(state.highlighted.as_ref());
    for id in focus_ids {
        if let Some(index) = graph.node_index(id) {
            highlight.focus_nodes.insert(index);
        }
    }

    for &origin in &highlight.focus_nodes {
        collect_one_hop(
            graph,
            origin,
            &mut highlight.related_nodes,
            Some(&mut highlight.related_edges),
        );
    }

    for id in &state.expanded {
        if let Some(origin) = graph.node_index(id) {
            highlight.revealed_nodes.insert(origin);
            collect_one_hop(graph, origin, &mut highlight.revealed_nodes, None);
        }
    }

    highlight
}
