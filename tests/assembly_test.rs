use std::collections::{BTreeSet, HashSet};

use graf_wiedzy::knowledge::{
    Dataset, EvidenceLevel, FilterSpec, IntegrityIssue, NodeRecord, NodeType, RelationshipRecord,
    RelationshipType, SourceSpec, SupplementRecord, assemble,
};
use graf_wiedzy::state::GraphState;

fn pair() -> (Vec<NodeRecord>, Vec<RelationshipRecord>) {
    let nodes = vec![
        NodeRecord::new("A", "Alpha-GPC", NodeType::Supplement, EvidenceLevel::Strong)
            .with_importance(1.0),
        NodeRecord::new("B", "Acetylcholine", NodeType::Neurotransmitter, EvidenceLevel::Strong)
            .with_importance(0.5),
    ];
    let relationships = vec![RelationshipRecord::new(
        "A-B",
        "A",
        "B",
        RelationshipType::Produces,
        0.8,
    )];
    (nodes, relationships)
}

fn ids<T>(items: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
    items.iter().map(|item| id(item).to_owned()).collect()
}

fn synthetic() -> Dataset {
    SourceSpec::Synthetic(240)
        .load()
        .expect("synthetic dataset loads")
}

fn filters() -> Vec<FilterSpec> {
    let mut specs = vec![FilterSpec::default()];
    for max_nodes in [1, 7, 50, 10_000] {
        specs.push(FilterSpec {
            max_nodes,
            ..FilterSpec::default()
        });
    }
    specs.push(FilterSpec {
        node_types: BTreeSet::from([NodeType::Supplement, NodeType::Herb]),
        ..FilterSpec::default()
    });
    specs.push(FilterSpec {
        relationship_types: BTreeSet::from([RelationshipType::Enhances]),
        min_strength: 0.4,
        max_strength: 0.9,
        ..FilterSpec::default()
    });
    specs.push(FilterSpec {
        evidence_levels: BTreeSet::from([EvidenceLevel::Strong, EvidenceLevel::Moderate]),
        max_nodes: 30,
        ..FilterSpec::default()
    });
    specs.push(FilterSpec {
        search_term: "a".to_owned(),
        ..FilterSpec::default()
    });
    specs
}

#[test]
fn both_nodes_and_relationship_survive_a_loose_cap() {
    let (nodes, relationships) = pair();
    let filter = FilterSpec {
        max_nodes: 10,
        ..FilterSpec::default()
    };
    let payload = assemble(&nodes, &relationships, &[], &filter);

    assert_eq!(ids(&payload.nodes, |node| &node.id), vec!["A", "B"]);
    assert_eq!(ids(&payload.relationships, |rel| &rel.id), vec!["A-B"]);
    assert_eq!(payload.relationships[0].strength, 0.8);
    assert!(payload.diagnostics.is_empty());
}

#[test]
fn cap_of_one_keeps_the_more_important_node_only() {
    let (nodes, relationships) = pair();
    let filter = FilterSpec {
        max_nodes: 1,
        ..FilterSpec::default()
    };
    let payload = assemble(&nodes, &relationships, &[], &filter);

    assert_eq!(ids(&payload.nodes, |node| &node.id), vec!["A"]);
    assert!(payload.relationships.is_empty());
}

#[test]
fn node_type_filter_drops_relationships_to_excluded_nodes() {
    let (nodes, relationships) = pair();
    let filter = FilterSpec {
        node_types: BTreeSet::from([NodeType::Supplement]),
        ..FilterSpec::default()
    };
    let payload = assemble(&nodes, &relationships, &[], &filter);

    assert_eq!(ids(&payload.nodes, |node| &node.id), vec!["A"]);
    assert!(payload.relationships.is_empty());
}

#[test]
fn empty_input_gives_empty_payload() {
    let payload = assemble(&[], &[], &[], &FilterSpec::default());

    assert!(payload.is_empty());
    assert!(payload.relationships.is_empty());
    assert!(payload.supplements.is_empty());
    assert!(payload.diagnostics.is_empty());
}

fn relationship_filter(filter: FilterSpec, relationship: RelationshipRecord) -> (usize, usize) {
    let (nodes, _) = pair();
    let payload = assemble(&nodes, &[relationship], &[], &filter);
    (payload.nodes.len(), payload.relationships.len())
}

#[test]
fn excluded_relationship_type_is_dropped_while_endpoints_stay() {
    let filter = FilterSpec {
        relationship_types: BTreeSet::from([RelationshipType::Enhances]),
        ..FilterSpec::default()
    };
    let produces = RelationshipRecord::new("A-B", "A", "B", RelationshipType::Produces, 0.8);
    let enhances = RelationshipRecord::new("A-B", "A", "B", RelationshipType::Enhances, 0.8);

    assert_eq!(relationship_filter(filter.clone(), produces), (2, 0));
    assert_eq!(relationship_filter(filter, enhances), (2, 1));
}

#[test]
fn strength_outside_bounds_is_dropped_while_endpoints_stay() {
    let filter = FilterSpec {
        min_strength: 0.3,
        max_strength: 0.7,
        ..FilterSpec::default()
    };
    for (strength, expected) in [(0.2, 0), (0.3, 1), (0.5, 1), (0.7, 1), (0.8, 0)] {
        let relationship =
            RelationshipRecord::new("A-B", "A", "B", RelationshipType::Produces, strength);
        assert_eq!(
            relationship_filter(filter.clone(), relationship),
            (2, expected),
            "strength {strength}"
        );
    }
}

#[test]
fn relationship_with_excluded_evidence_is_dropped_while_endpoints_stay() {
    let filter = FilterSpec {
        evidence_levels: BTreeSet::from([EvidenceLevel::Strong]),
        ..FilterSpec::default()
    };
    let mut conflicting = RelationshipRecord::new("A-B", "A", "B", RelationshipType::Produces, 0.8);
    conflicting.evidence_level = EvidenceLevel::Conflicting;
    let mut strong = conflicting.clone();
    strong.evidence_level = EvidenceLevel::Strong;

    assert_eq!(relationship_filter(filter.clone(), conflicting), (2, 0));
    assert_eq!(relationship_filter(filter, strong), (2, 1));
}

#[test]
fn dangling_relationship_is_dropped_and_reported() {
    let (nodes, mut relationships) = pair();
    relationships.push(RelationshipRecord::new(
        "A-ghost",
        "A",
        "ghost",
        RelationshipType::Modulates,
        0.3,
    ));
    let payload = assemble(&nodes, &relationships, &[], &FilterSpec::default());

    assert_eq!(ids(&payload.relationships, |rel| &rel.id), vec!["A-B"]);
    assert_eq!(
        payload.diagnostics,
        vec![IntegrityIssue::DanglingRelationship {
            relationship: "A-ghost".to_owned(),
            missing: "ghost".to_owned(),
        }]
    );
}

#[test]
fn duplicate_node_ids_keep_the_first_record() {
    let (mut nodes, relationships) = pair();
    nodes.push(
        NodeRecord::new("A", "Impostor", NodeType::Herb, EvidenceLevel::Weak).with_importance(0.9),
    );
    let payload = assemble(&nodes, &relationships, &[], &FilterSpec::default());

    assert_eq!(payload.nodes.len(), 2);
    assert_eq!(payload.nodes[0].name, "Alpha-GPC");
    assert!(
        payload
            .diagnostics
            .contains(&IntegrityIssue::DuplicateNode { id: "A".to_owned() })
    );
}

#[test]
fn supplements_follow_surviving_nodes() {
    let (nodes, relationships) = pair();
    let supplement = |id: &str| SupplementRecord {
        id: id.to_owned(),
        name: id.to_owned(),
        localized_name: String::new(),
        category: "cholinergic".to_owned(),
        evidence_level: EvidenceLevel::Moderate,
        active_compounds: vec!["glycerophosphocholine".to_owned()],
    };
    let supplements = vec![supplement("A"), supplement("missing")];
    let payload = assemble(&nodes, &relationships, &supplements, &FilterSpec::default());

    assert_eq!(ids(&payload.supplements, |supplement| &supplement.id), vec!["A"]);
}

#[test]
fn every_relationship_references_nodes_in_the_output() {
    let dataset = synthetic();
    for filter in filters() {
        let payload = assemble(
            &dataset.nodes,
            &dataset.relationships,
            &dataset.supplements,
            &filter,
        );
        let present = payload
            .nodes
            .iter()
            .map(|node| node.id.as_str())
            .collect::<HashSet<_>>();
        for relationship in &payload.relationships {
            assert!(
                present.contains(relationship.source_id.as_str())
                    && present.contains(relationship.target_id.as_str()),
                "relationship {} dangles under {filter:?}",
                relationship.id
            );
        }
    }
}

#[test]
fn output_never_exceeds_either_cap() {
    let dataset = synthetic();
    for filter in filters() {
        for render_node_cap in [10, 64, 500, 2_000] {
            let mut state = GraphState {
                filters: filter.clone(),
                ..GraphState::default()
            };
            state.viewport.render_node_cap = render_node_cap;

            let payload = assemble(
                &dataset.nodes,
                &dataset.relationships,
                &dataset.supplements,
                &state.assembly_filter(),
            );
            assert!(payload.nodes.len() <= filter.max_nodes.min(render_node_cap));
        }
    }
}

#[test]
fn assembly_is_deterministic() {
    let dataset = synthetic();
    for filter in filters() {
        let first = assemble(
            &dataset.nodes,
            &dataset.relationships,
            &dataset.supplements,
            &filter,
        );
        let second = assemble(
            &dataset.nodes,
            &dataset.relationships,
            &dataset.supplements,
            &filter,
        );
        assert_eq!(first, second);
    }
}
