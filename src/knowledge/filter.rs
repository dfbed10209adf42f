use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::model::{EvidenceLevel, NodeRecord, NodeType, RelationshipRecord, RelationshipType};
use super::search::SearchQuery;

pub const DEFAULT_MAX_NODES: usize = 500;
pub const MAX_NODES_RANGE: RangeInclusive<usize> = 1..=10_000;

/// Filter applied during assembly. Empty sets mean "no constraint".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    pub node_types: BTreeSet<NodeType>,
    pub relationship_types: BTreeSet<RelationshipType>,
    pub evidence_levels: BTreeSet<EvidenceLevel>,
    pub categories: BTreeSet<String>,
    pub search_term: String,
    pub min_strength: f32,
    pub max_strength: f32,
    pub max_nodes: usize,
    pub show_labels: bool,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            node_types: BTreeSet::new(),
            relationship_types: BTreeSet::new(),
            evidence_levels: BTreeSet::new(),
            categories: BTreeSet::new(),
            search_term: String::new(),
            min_strength: 0.0,
            max_strength: 1.0,
            max_nodes: DEFAULT_MAX_NODES,
            show_labels: true,
        }
    }
}

/// Partial update for [`FilterSpec`]; `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterPatch {
    pub node_types: Option<BTreeSet<NodeType>>,
    pub relationship_types: Option<BTreeSet<RelationshipType>>,
    pub evidence_levels: Option<BTreeSet<EvidenceLevel>>,
    pub categories: Option<BTreeSet<String>>,
    pub search_term: Option<String>,
    pub min_strength: Option<f32>,
    pub max_strength: Option<f32>,
    pub max_nodes: Option<usize>,
    pub show_labels: Option<bool>,
}

impl FilterPatch {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search_term: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn node_types(types: impl IntoIterator<Item = NodeType>) -> Self {
        Self {
            node_types: Some(types.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn strength(min: f32, max: f32) -> Self {
        Self {
            min_strength: Some(min),
            max_strength: Some(max),
            ..Self::default()
        }
    }

    pub fn max_nodes(max_nodes: usize) -> Self {
        Self {
            max_nodes: Some(max_nodes),
            ..Self::default()
        }
    }
}

impl FilterSpec {
    pub fn patched(&self, patch: FilterPatch) -> Self {
        let mut next = self.clone();
        if let Some(node_types) = patch.node_types {
            next.node_types = node_types;
        }
        if let Some(relationship_types) = patch.relationship_types {
            next.relationship_types = relationship_types;
        }
        if let Some(evidence_levels) = patch.evidence_levels {
            next.evidence_levels = evidence_levels;
        }
        if let Some(categories) = patch.categories {
            next.categories = categories;
        }
        if let Some(search_term) = patch.search_term {
            next.search_term = search_term;
        }
        if let Some(min_strength) = patch.min_strength {
            next.min_strength = min_strength;
        }
        if let Some(max_strength) = patch.max_strength {
            next.max_strength = max_strength;
        }
        if let Some(max_nodes) = patch.max_nodes {
            next.max_nodes = max_nodes;
        }
        if let Some(show_labels) = patch.show_labels {
            next.show_labels = show_labels;
        }
        next.normalized()
    }

    /// Clamps strengths into `[0, 1]`, orders them, and bounds `max_nodes`.
    pub fn normalized(mut self) -> Self {
        self.min_strength = clamp_strength(self.min_strength, 0.0);
        self.max_strength = clamp_strength(self.max_strength, 1.0);
        if self.min_strength > self.max_strength {
            std::mem::swap(&mut self.min_strength, &mut self.max_strength);
        }
        self.max_nodes = self
            .max_nodes
            .clamp(*MAX_NODES_RANGE.start(), *MAX_NODES_RANGE.end());
        self
    }

    pub fn with_max_nodes(&self, max_nodes: usize) -> Self {
        let mut next = self.clone();
        next.max_nodes = max_nodes;
        next
    }

    pub fn accepts_node(&self, node: &NodeRecord, query: &SearchQuery) -> bool {
        (self.node_types.is_empty() || self.node_types.contains(&node.node_type))
            && (self.evidence_levels.is_empty() || self.evidence_levels.contains(&node.evidence_level))
            && (self.categories.is_empty() || self.categories.contains(&node.category))
            && query.matches_node(node)
    }

    /// Endpoint membership is checked by the caller.
    pub fn accepts_relationship(&self, relationship: &RelationshipRecord) -> bool {
        let strength = relationship.strength;
        (self.relationship_types.is_empty()
            || self.relationship_types.contains(&relationship.relationship_type))
            && (self.evidence_levels.is_empty()
                || self.evidence_levels.contains(&relationship.evidence_level))
            && strength.is_finite()
            && strength >= self.min_strength
            && strength <= self.max_strength
    }
}

fn clamp_strength(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}
