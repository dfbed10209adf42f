use std::collections::HashMap;
use std::mem;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::debug;

use crate::engine::{FocusIndicator, GraphEngine, RenderGraph, ViewTransform};
use crate::knowledge::{Locale, fold};

use super::describe::{describe_node, describe_relationship, describe_render_set};

const RING_PADDING: f32 = 5.0;
const RELATIONSHIP_RING_RADIUS: f32 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusKind {
    Node,
    Relationship,
}

/// One stop of the focus ring.
#[derive(Clone, Debug, PartialEq)]
pub struct FocusEntry {
    pub id: String,
    pub kind: FocusKind,
    pub label: String,
    pub description: String,
}

/// A focused ring stop. Node and relationship ids come from separate
/// record sets and may coincide, so the kind is part of the identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FocusTarget {
    pub kind: FocusKind,
    pub id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FocusState {
    pub focused: Option<FocusTarget>,
    pub keyboard_navigation: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeighborDirection {
    Forward,
    Backward,
}

/// Keyboard focus over the render set. Ring order is render-set order,
/// nodes first, then relationships when enabled, so it is stable across
/// recomputation and independent of where nodes are drawn.
pub struct FocusManager {
    state: FocusState,
    include_relationships: bool,
    ring: Vec<FocusEntry>,
    node_slots: HashMap<String, usize>,
    relationship_slots: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
    summary: String,
    pending: Vec<String>,
    matcher: SkimMatcherV2,
}

impl Default for FocusManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusManager {
    pub fn new() -> Self {
        Self {
            state: FocusState::default(),
            include_relationships: false,
            ring: Vec::new(),
            node_slots: HashMap::new(),
            relationship_slots: HashMap::new(),
            adjacency: Vec::new(),
            summary: describe_render_set(0, 0, Locale::default()),
            pending: Vec::new(),
            matcher: SkimMatcherV2::default(),
        }
    }

    /// Adds relationship ids to the ring after the nodes. Takes effect on
    /// the next [`FocusManager::sync`].
    pub fn with_relationships(mut self, include: bool) -> Self {
        self.include_relationships = include;
        self
    }

    pub fn set_include_relationships(&mut self, include: bool) {
        self.include_relationships = include;
    }

    pub fn includes_relationships(&self) -> bool {
        self.include_relationships
    }

    pub fn state(&self) -> &FocusState {
        &self.state
    }

    pub fn ring(&self) -> &[FocusEntry] {
        &self.ring
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Rebuilds the ring from the engine's current render set. Focus on an
    /// id that left the set is dropped without an announcement.
    pub fn sync(&mut self, graph: &RenderGraph, locale: Locale) {
        let mut ring = Vec::with_capacity(graph.len());
        let mut adjacency = Vec::with_capacity(graph.len());
        for (index, node) in graph.nodes().iter().enumerate() {
            let meta = node.meta();
            ring.push(FocusEntry {
                id: meta.id.clone(),
                kind: FocusKind::Node,
                label: meta.display_name(locale).to_owned(),
                description: describe_node(meta, locale),
            });
            adjacency.push(graph.neighbors(index).to_vec());
        }

        if self.include_relationships {
            for edge in graph.edges() {
                let nodes = graph.nodes();
                let source = nodes[edge.source].meta().display_name(locale);
                let target = nodes[edge.target].meta().display_name(locale);
                ring.push(FocusEntry {
                    id: edge.meta.id.clone(),
                    kind: FocusKind::Relationship,
                    label: format!("{source} → {target}"),
                    description: describe_relationship(&edge.meta, source, target, locale),
                });
                adjacency.push(vec![edge.source, edge.target]);
            }
        }

        self.node_slots.clear();
        self.relationship_slots.clear();
        for (slot, entry) in ring.iter().enumerate() {
            let slots = match entry.kind {
                FocusKind::Node => &mut self.node_slots,
                FocusKind::Relationship => &mut self.relationship_slots,
            };
            slots.entry(entry.id.clone()).or_insert(slot);
        }
        self.ring = ring;
        self.adjacency = adjacency;
        self.summary = describe_render_set(graph.len(), graph.edges().len(), locale);

        let stale = self.state.focused.is_some() && self.focused_slot().is_none();
        if stale {
            debug!(
                focused = ?self.state.focused,
                "focused element left the render set, clearing focus"
            );
            self.state.focused = None;
        }
    }

    /// Focuses `id` if it is on the ring; unknown ids are ignored. A node
    /// wins over a relationship sharing its id.
    pub fn set_focused_element(&mut self, id: &str) -> bool {
        let slot = self
            .slot_of(FocusKind::Node, id)
            .or_else(|| self.slot_of(FocusKind::Relationship, id));
        match slot {
            Some(slot) => {
                self.focus_slot(slot);
                true
            }
            None => false,
        }
    }

    pub fn focused_element_id(&self) -> Option<&str> {
        self.state.focused.as_ref().map(|target| target.id.as_str())
    }

    pub fn focused_target(&self) -> Option<&FocusTarget> {
        self.state.focused.as_ref()
    }

    pub fn focused_entry(&self) -> Option<&FocusEntry> {
        self.focused_slot().map(|slot| &self.ring[slot])
    }

    pub fn clear_focus(&mut self) {
        self.state.focused = None;
    }

    pub fn set_keyboard_navigation(&mut self, enabled: bool) {
        self.state.keyboard_navigation = enabled;
    }

    pub fn keyboard_navigation(&self) -> bool {
        self.state.keyboard_navigation
    }

    /// Moves one stop forward, wrapping past the end. With nothing focused
    /// the first stop is taken.
    pub fn next(&mut self) -> Option<&str> {
        let len = self.ring.len();
        if len == 0 {
            return None;
        }
        let slot = self.focused_slot().map_or(0, |slot| (slot + 1) % len);
        self.focus_slot(slot);
        self.focused_element_id()
    }

    pub fn previous(&mut self) -> Option<&str> {
        let len = self.ring.len();
        if len == 0 {
            return None;
        }
        let slot = self
            .focused_slot()
            .map_or(len - 1, |slot| (slot + len - 1) % len);
        self.focus_slot(slot);
        self.focused_element_id()
    }

    pub fn first(&mut self) -> Option<&str> {
        if self.ring.is_empty() {
            return None;
        }
        self.focus_slot(0);
        self.focused_element_id()
    }

    pub fn last(&mut self) -> Option<&str> {
        let slot = self.ring.len().checked_sub(1)?;
        self.focus_slot(slot);
        self.focused_element_id()
    }

    /// Follows a relationship from the focused element. Forward takes the
    /// nearest neighbour after the current stop in ring order, Backward the
    /// nearest before it, both wrapping. Without neighbours this is plain
    /// `next`/`previous`.
    pub fn move_to_neighbor(&mut self, direction: NeighborDirection) -> Option<&str> {
        let Some(current) = self.focused_slot() else {
            return match direction {
                NeighborDirection::Forward => self.first(),
                NeighborDirection::Backward => self.last(),
            };
        };

        let neighbors = &self.adjacency[current];
        let target = match direction {
            NeighborDirection::Forward => neighbors
                .iter()
                .copied()
                .filter(|&slot| slot > current)
                .min()
                .or_else(|| neighbors.iter().copied().min()),
            NeighborDirection::Backward => neighbors
                .iter()
                .copied()
                .filter(|&slot| slot < current)
                .max()
                .or_else(|| neighbors.iter().copied().max()),
        };

        match target.filter(|&slot| slot != current) {
            Some(slot) => {
                self.focus_slot(slot);
                self.focused_element_id()
            }
            None => match direction {
                NeighborDirection::Forward => self.next(),
                NeighborDirection::Backward => self.previous(),
            },
        }
    }

    /// Type-ahead: focuses the node whose label best matches `query`.
    pub fn find(&mut self, query: &str) -> Option<&str> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let folded_query = fold(query);
        let mut best: Option<(usize, i64)> = None;
        for (slot, entry) in self.ring.iter().enumerate() {
            if entry.kind != FocusKind::Node {
                continue;
            }
            let score = self
                .matcher
                .fuzzy_match(&entry.label, query)
                .or_else(|| self.matcher.fuzzy_match(&fold(&entry.label), &folded_query));
            let Some(score) = score else {
                continue;
            };
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((slot, score));
            }
        }

        let (slot, _) = best?;
        self.focus_slot(slot);
        self.focused_element_id()
    }

    /// Where to draw the focus ring this frame, from the engine's live
    /// positions.
    pub fn indicator(&self, engine: &GraphEngine, view: &ViewTransform) -> Option<FocusIndicator> {
        let entry = self.focused_entry()?;
        let graph = engine.graph();
        match entry.kind {
            FocusKind::Node => {
                let index = graph.node_index(&entry.id)?;
                let (center, radius) = engine.node_screen_geometry(index, view)?;
                Some(FocusIndicator {
                    center,
                    radius: radius + RING_PADDING,
                })
            }
            FocusKind::Relationship => {
                let edge = &graph.edges()[graph.edge_index(&entry.id)?];
                let (from, _) = engine.node_screen_geometry(edge.source, view)?;
                let (to, _) = engine.node_screen_geometry(edge.target, view)?;
                Some(FocusIndicator {
                    center: from.lerp(to, 0.5),
                    radius: RELATIONSHIP_RING_RADIUS,
                })
            }
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.focused_entry().map(|entry| entry.description.as_str())
    }

    /// Count summary of the render set, or the "no results" text.
    pub fn describe_render_set(&self) -> &str {
        &self.summary
    }

    /// Queues `message` for the assistive-technology channel after
    /// anything not yet taken. A repeat of the last queued message is
    /// dropped.
    pub fn announce(&mut self, message: impl Into<String>) {
        let message = message.into();
        if message.is_empty() || self.pending.last() == Some(&message) {
            return;
        }
        self.pending.push(message);
    }

    /// Drains the queue into one utterance, oldest first.
    pub fn take_announcement(&mut self) -> Option<String> {
        match mem::take(&mut self.pending).as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            messages => Some(
                messages
                    .iter()
                    .map(|message| as_sentence(message))
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        }
    }

    fn slot_of(&self, kind: FocusKind, id: &str) -> Option<usize> {
        let slots = match kind {
            FocusKind::Node => &self.node_slots,
            FocusKind::Relationship => &self.relationship_slots,
        };
        slots.get(id).copied()
    }

    fn focused_slot(&self) -> Option<usize> {
        let target = self.state.focused.as_ref()?;
        self.slot_of(target.kind, &target.id)
    }

    fn focus_slot(&mut self, slot: usize) {
        let entry = &self.ring[slot];
        self.state.focused = Some(FocusTarget {
            kind: entry.kind,
            id: entry.id.clone(),
        });
        let description = entry.description.clone();
        self.announce(description);
    }
}

fn as_sentence(message: &str) -> String {
    let message = message.trim_end();
    if message.ends_with(['.', '!', '?']) {
        message.to_owned()
    } else {
        format!("{message}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{
        EvidenceLevel, FilterSpec, NodeRecord, NodeType, RelationshipRecord, RelationshipType,
        assemble,
    };
    use crate::state::GraphState;

    fn engine_with(ids: &[&str], links: &[(&str, &str)]) -> GraphEngine {
        let nodes = ids
            .iter()
            .map(|id| {
                NodeRecord::new(*id, id.to_uppercase(), NodeType::Nootropic, EvidenceLevel::Weak)
            })
            .collect::<Vec<_>>();
        let relationships = links
            .iter()
            .map(|(source, target)| {
                RelationshipRecord::new(
                    format!("{source}-{target}"),
                    *source,
                    *target,
                    RelationshipType::Enhances,
                    0.5,
                )
            })
            .collect::<Vec<_>>();
        let payload = assemble(&nodes, &relationships, &[], &FilterSpec::default());
        let mut engine = GraphEngine::new();
        engine.load(&payload, &GraphState::default());
        engine
    }

    #[test]
    fn next_wraps_from_last_to_first() {
        let engine = engine_with(&["n1", "n2", "n3"], &[]);
        let mut focus = FocusManager::new();
        focus.sync(engine.graph(), Locale::En);

        assert!(focus.set_focused_element("n3"));
        assert_eq!(focus.next(), Some("n1"));
        assert_eq!(focus.previous(), Some("n3"));
    }

    #[test]
    fn unknown_focus_target_is_ignored() {
        let engine = engine_with(&["a"], &[]);
        let mut focus = FocusManager::new();
        focus.sync(engine.graph(), Locale::En);
        assert!(!focus.set_focused_element("missing"));
        assert_eq!(focus.focused_element_id(), None);
    }

    #[test]
    fn neighbor_moves_follow_relationships() {
        let engine = engine_with(&["a", "b", "c", "d"], &[("a", "c"), ("d", "a")]);
        let mut focus = FocusManager::new();
        focus.sync(engine.graph(), Locale::En);
        focus.set_focused_element("a");

        assert_eq!(focus.move_to_neighbor(NeighborDirection::Forward), Some("c"));
        assert_eq!(focus.move_to_neighbor(NeighborDirection::Forward), Some("a"));
        assert_eq!(focus.move_to_neighbor(NeighborDirection::Backward), Some("d"));

        focus.set_focused_element("b");
        assert_eq!(focus.move_to_neighbor(NeighborDirection::Forward), Some("c"));
    }

    #[test]
    fn relationships_join_the_ring_after_nodes() {
        let engine = engine_with(&["a", "b"], &[("a", "b")]);
        let mut focus = FocusManager::new().with_relationships(true);
        focus.sync(engine.graph(), Locale::En);

        let ids = focus.ring().iter().map(|entry| entry.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["a", "b", "a-b"]);
        focus.last();
        let description = focus.description().unwrap_or_default();
        assert!(description.starts_with("A enhances B"));
    }

    #[test]
    fn relationship_sharing_a_node_id_keeps_the_ring_moving() {
        let nodes = vec![
            NodeRecord::new("1", "Magnesium", NodeType::Mineral, EvidenceLevel::Strong),
            NodeRecord::new("2", "GABA", NodeType::Neurotransmitter, EvidenceLevel::Strong),
        ];
        let relationships = vec![RelationshipRecord::new(
            "1",
            "1",
            "2",
            RelationshipType::Modulates,
            0.7,
        )];
        let payload = assemble(&nodes, &relationships, &[], &FilterSpec::default());
        let mut engine = GraphEngine::new();
        engine.load(&payload, &GraphState::default());
        let mut focus = FocusManager::new().with_relationships(true);
        focus.sync(engine.graph(), Locale::En);

        let visited = (0..4)
            .filter_map(|_| {
                focus.next()?;
                focus.focused_entry().map(|entry| (entry.id.clone(), entry.kind))
            })
            .collect::<Vec<_>>();
        assert_eq!(
            visited,
            [
                ("1".to_owned(), FocusKind::Node),
                ("2".to_owned(), FocusKind::Node),
                ("1".to_owned(), FocusKind::Relationship),
                ("1".to_owned(), FocusKind::Node),
            ]
        );

        focus.last();
        assert_eq!(focus.focused_target().map(|target| target.kind), Some(FocusKind::Relationship));
        focus.set_include_relationships(false);
        focus.sync(engine.graph(), Locale::En);
        assert_eq!(focus.focused_element_id(), None);

        assert!(focus.set_focused_element("1"));
        assert_eq!(focus.focused_target().map(|target| target.kind), Some(FocusKind::Node));
    }

    #[test]
    fn pending_announcements_are_joined_in_order() {
        let mut focus = FocusManager::new();
        assert_eq!(focus.take_announcement(), None);

        focus.announce("Selected node: Rhodiola");
        assert_eq!(focus.take_announcement().as_deref(), Some("Selected node: Rhodiola"));

        focus.announce("Rhodiola, Adaptogen, evidence: Moderate.");
        focus.announce("Rhodiola, Adaptogen, evidence: Moderate.");
        focus.announce("Knowledge graph: 3 nodes, 2 relationships.");
        focus.announce("Graph view reset");
        assert_eq!(
            focus.take_announcement().as_deref(),
            Some(
                "Rhodiola, Adaptogen, evidence: Moderate. \
                 Knowledge graph: 3 nodes, 2 relationships. Graph view reset."
            )
        );
        assert_eq!(focus.take_announcement(), None);
    }

    #[test]
    fn find_focuses_best_fuzzy_match() {
        let engine = engine_with(&["caffeine", "l-theanine", "creatine"], &[]);
        let mut focus = FocusManager::new();
        focus.sync(engine.graph(), Locale::En);

        assert_eq!(focus.find("thean"), Some("l-theanine"));
        assert_eq!(focus.find("   "), None);
        assert!(focus.take_announcement().is_some());
    }
}
