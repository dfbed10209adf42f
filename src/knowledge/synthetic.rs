use anyhow::Result;

use crate::util::{stable_hash, stable_unit};

use super::model::{
    EvidenceLevel, NodeRecord, NodeType, RelationshipRecord, RelationshipType, SupplementRecord,
};
use super::source::GraphSource;

/// Deterministic stress graph: a random-looking tree plus cross links.
///
/// Every value comes from hashing the node id, so two runs with the same
/// `count` produce identical records.
#[derive(Clone, Debug)]
pub struct SyntheticSource {
    count: usize,
}

impl SyntheticSource {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    fn node_id(index: usize) -> String {
        format!("syn-{index:05}")
    }

    fn node_type(index: usize) -> NodeType {
        let id = Self::node_id(index);
        NodeType::ALL[(stable_hash(&id) % NodeType::ALL.len() as u64) as usize]
    }

    fn evidence(id: &str, salt: u64) -> EvidenceLevel {
        let value = stable_unit(id, salt);
        EvidenceLevel::ALL[((value * EvidenceLevel::ALL.len() as f32) as usize)
            .min(EvidenceLevel::ALL.len() - 1)]
    }

    fn relationship(index: usize, kind: &str, source: usize, target: usize) -> RelationshipRecord {
        let id = format!("syn-rel-{kind}-{index:05}");
        let relationship_type = RelationshipType::ALL
            [(stable_hash(&id) % RelationshipType::ALL.len() as u64) as usize];
        RelationshipRecord {
            source_id: Self::node_id(source),
            target_id: Self::node_id(target),
            relationship_type,
            strength: 0.2 + stable_unit(&id, 3) * 0.8,
            confidence: 0.4 + stable_unit(&id, 4) * 0.6,
            evidence_level: Self::evidence(&id, 5),
            mechanism: String::new(),
            bidirectional: false,
            id,
        }
    }
}

impl GraphSource for SyntheticSource {
    fn nodes(&self) -> Result<Vec<NodeRecord>> {
        Ok((0..self.count)
            .map(|index| {
                let id = Self::node_id(index);
                let node_type = Self::node_type(index);
                NodeRecord {
                    name: format!("Node {index}"),
                    localized_name: format!("Węzeł {index}"),
                    node_type,
                    evidence_level: Self::evidence(&id, 1),
                    category: format!("group-{}", index % 7),
                    importance: Some(stable_unit(&id, 2)),
                    description: String::new(),
                    tags: Vec::new(),
                    size: None,
                    id,
                }
            })
            .collect())
    }

    fn relationships(&self) -> Result<Vec<RelationshipRecord>> {
        let mut relationships = Vec::with_capacity(self.count + self.count / 3);
        for index in 1..self.count {
            let parent = (stable_hash(&Self::node_id(index)) % index as u64) as usize;
            relationships.push(Self::relationship(index, "tree", parent, index));

            if index % 3 == 0 && index > 2 {
                let salt = stable_hash(&format!("cross-{index}"));
                let other = (salt % index as u64) as usize;
                if other != parent {
                    relationships.push(Self::relationship(index, "cross", index, other));
                }
            }
        }
        Ok(relationships)
    }

    fn supplements(&self) -> Result<Vec<SupplementRecord>> {
        Ok((0..self.count)
            .filter(|index| Self::node_type(*index) == NodeType::Supplement)
            .map(|index| {
                let id = Self::node_id(index);
                SupplementRecord {
                    name: format!("Node {index}"),
                    localized_name: format!("Węzeł {index}"),
                    category: format!("group-{}", index % 7),
                    evidence_level: Self::evidence(&id, 1),
                    active_compounds: Vec::new(),
                    id,
                }
            })
            .collect())
    }

    fn describe(&self) -> String {
        format!("synthetic graph ({} nodes)", self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn synthetic_graph_is_repeatable() {
        let first = SyntheticSource::new(64);
        let second = SyntheticSource::new(64);
        assert_eq!(first.nodes().unwrap(), second.nodes().unwrap());
        assert_eq!(first.relationships().unwrap(), second.relationships().unwrap());
    }

    #[test]
    fn synthetic_relationships_reference_existing_nodes() {
        let source = SyntheticSource::new(300);
        let ids = source
            .nodes()
            .unwrap()
            .into_iter()
            .map(|node| node.id)
            .collect::<HashSet<_>>();
        for relationship in source.relationships().unwrap() {
            assert!(ids.contains(&relationship.source_id));
            assert!(ids.contains(&relationship.target_id));
            assert_ne!(relationship.source_id, relationship.target_id);
        }
    }
}
