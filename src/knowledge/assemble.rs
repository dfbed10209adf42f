use std::collections::HashSet;
use std::f32::consts::TAU;

use eframe::egui::{Vec2, vec2};
use thiserror::Error;
use tracing::{debug, warn};

use crate::util::stable_pair;

use super::filter::FilterSpec;
use super::model::{
    KnowledgeNode, KnowledgeRelationship, NodeRecord, RelationshipRecord, SupplementRecord,
};
use super::search::SearchQuery;

const SEED_RING_SPACING: f32 = 60.0;
const SEED_JITTER: f32 = 40.0;
const MIN_NODE_SIZE: f32 = 4.0;
const MAX_NODE_SIZE: f32 = 40.0;

/// A record dropped during assembly. Assembly itself never fails.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IntegrityIssue {
    #[error("relationship `{relationship}` references missing node `{missing}`")]
    DanglingRelationship {
        relationship: String,
        missing: String,
    },
    #[error("node id `{id}` appears more than once; keeping the first")]
    DuplicateNode { id: String },
    #[error("relationship id `{id}` appears more than once; keeping the first")]
    DuplicateRelationship { id: String },
    #[error("relationship `{relationship}` connects a node to itself")]
    SelfLoop { relationship: String },
}

/// Bounded, referentially consistent render set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphPayload {
    pub nodes: Vec<KnowledgeNode>,
    pub relationships: Vec<KnowledgeRelationship>,
    pub supplements: Vec<SupplementRecord>,
    pub diagnostics: Vec<IntegrityIssue>,
}

impl GraphPayload {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Turns raw records into a render set.
///
/// Nodes are filtered first and capped by importance; relationships are
/// filtered only against the final node set, so none can dangle. The output
/// keeps input order. Ties in importance keep the earlier record.
pub fn assemble(
    raw_nodes: &[NodeRecord],
    raw_relationships: &[RelationshipRecord],
    raw_supplements: &[SupplementRecord],
    filter: &FilterSpec,
) -> GraphPayload {
    let mut diagnostics = Vec::new();

    let mut known_ids = HashSet::with_capacity(raw_nodes.len());
    let mut unique_nodes = Vec::with_capacity(raw_nodes.len());
    for node in raw_nodes {
        if known_ids.insert(node.id.as_str()) {
            unique_nodes.push(node);
        } else {
            diagnostics.push(IntegrityIssue::DuplicateNode {
                id: node.id.clone(),
            });
        }
    }

    let query = SearchQuery::new(&filter.search_term);
    let passing = unique_nodes
        .into_iter()
        .filter(|node| filter.accepts_node(node, &query))
        .collect::<Vec<_>>();
    let kept_nodes = cap_by_importance(passing, filter.max_nodes);
    let kept_ids = kept_nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();

    let mut seen_relationships = HashSet::with_capacity(raw_relationships.len());
    let mut relationships = Vec::new();
    for relationship in raw_relationships {
        if let Some(missing) = [&relationship.source_id, &relationship.target_id]
            .into_iter()
            .find(|id| !known_ids.contains(id.as_str()))
        {
            diagnostics.push(IntegrityIssue::DanglingRelationship {
                relationship: relationship.id.clone(),
                missing: missing.clone(),
            });
            continue;
        }
        if relationship.source_id == relationship.target_id {
            diagnostics.push(IntegrityIssue::SelfLoop {
                relationship: relationship.id.clone(),
            });
            continue;
        }
        if !seen_relationships.insert(relationship.id.as_str()) {
            diagnostics.push(IntegrityIssue::DuplicateRelationship {
                id: relationship.id.clone(),
            });
            continue;
        }

        if kept_ids.contains(relationship.source_id.as_str())
            && kept_ids.contains(relationship.target_id.as_str())
            && filter.accepts_relationship(relationship)
        {
            relationships.push(KnowledgeRelationship::from(relationship));
        }
    }

    let node_count = kept_nodes.len();
    let nodes = kept_nodes
        .into_iter()
        .enumerate()
        .map(|(index, record)| make_node(record, index, node_count))
        .collect::<Vec<_>>();

    let supplements = raw_supplements
        .iter()
        .filter(|supplement| kept_ids.contains(supplement.id.as_str()))
        .cloned()
        .collect::<Vec<_>>();

    for issue in &diagnostics {
        warn!(%issue, "dropped record during assembly");
    }
    debug!(
        nodes = nodes.len(),
        relationships = relationships.len(),
        supplements = supplements.len(),
        "assembled render set"
    );

    GraphPayload {
        nodes,
        relationships,
        supplements,
        diagnostics,
    }
}

fn cap_by_importance(passing: Vec<&NodeRecord>, max_nodes: usize) -> Vec<&NodeRecord> {
    if passing.len() <= max_nodes {
        return passing;
    }

    let mut ranked = (0..passing.len()).collect::<Vec<_>>();
    // Stable sort: equal importance keeps input order.
    ranked.sort_by(|a, b| passing[*b].importance().total_cmp(&passing[*a].importance()));
    ranked.truncate(max_nodes);
    ranked.sort_unstable();

    ranked.into_iter().map(|index| passing[index]).collect()
}

fn make_node(record: &NodeRecord, index: usize, count: usize) -> KnowledgeNode {
    let importance = record.importance();
    KnowledgeNode {
        id: record.id.clone(),
        name: record.name.clone(),
        localized_name: record.localized_name.clone(),
        node_type: record.node_type,
        evidence_level: record.evidence_level,
        category: record.category.clone(),
        description: record.description.clone(),
        tags: record.tags.clone(),
        importance,
        size: node_size(record.size, importance),
        position: seed_position(&record.id, index, count),
    }
}

fn node_size(explicit: Option<f32>, importance: f32) -> f32 {
    match explicit.filter(|size| size.is_finite() && *size > 0.0) {
        Some(size) => size.clamp(MIN_NODE_SIZE, MAX_NODE_SIZE),
        None => 6.0 + importance.clamp(0.0, 1.0) * 14.0,
    }
}

/// Ring placement with a per-id jitter; repeatable for identical input.
pub fn seed_position(id: &str, index: usize, count: usize) -> Vec2 {
    if count <= 1 {
        return Vec2::ZERO;
    }

    let base_radius = (count as f32).sqrt() * SEED_RING_SPACING;
    let angle = (index as f32 / count as f32) * TAU;
    let (jx, jy) = stable_pair(id);
    vec2(angle.cos(), angle.sin()) * base_radius + vec2(jx, jy) * SEED_JITTER
}
