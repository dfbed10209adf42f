//! JSON snapshots of a render set that can be loaded back as a dataset.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::assemble::{GraphPayload, assemble};
use super::filter::FilterSpec;
use super::model::{
    KnowledgeNode, KnowledgeRelationship, Locale, NodeRecord, RelationshipRecord,
    SupplementRecord,
};
use super::source::{Dataset, JsonSource, load_dataset};

/// Format version written into every export. Imports accept any version
/// with the same major number.
pub const EXPORT_VERSION: &str = "1.0.0";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub node_count: usize,
    pub relationship_count: usize,
    pub supplement_count: usize,
}

/// An exported render set. The `nodes`, `relationships` and `supplements`
/// sections use the same shape as a source document, so an export is also a
/// valid `--data` file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphExport {
    pub version: String,
    pub locale: Locale,
    pub metadata: ExportMetadata,
    pub filters: FilterSpec,
    pub nodes: Vec<NodeRecord>,
    pub relationships: Vec<RelationshipRecord>,
    pub supplements: Vec<SupplementRecord>,
}

impl GraphExport {
    pub fn from_payload(payload: &GraphPayload, filters: &FilterSpec, locale: Locale) -> Self {
        Self {
            version: EXPORT_VERSION.to_owned(),
            locale,
            metadata: ExportMetadata {
                node_count: payload.nodes.len(),
                relationship_count: payload.relationships.len(),
                supplement_count: payload.supplements.len(),
            },
            filters: filters.clone(),
            nodes: payload.nodes.iter().map(NodeRecord::from).collect(),
            relationships: payload
                .relationships
                .iter()
                .map(RelationshipRecord::from)
                .collect(),
            supplements: payload.supplements.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to encode graph export")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let encoded = self.to_json()?;
        fs::write(path, encoded)
            .with_context(|| format!("failed to write graph export {}", path.display()))?;
        info!(
            path = %path.display(),
            nodes = self.metadata.node_count,
            relationships = self.metadata.relationship_count,
            "graph exported"
        );
        Ok(())
    }
}

impl From<&KnowledgeNode> for NodeRecord {
    fn from(node: &KnowledgeNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            localized_name: node.localized_name.clone(),
            node_type: node.node_type,
            evidence_level: node.evidence_level,
            category: node.category.clone(),
            importance: Some(node.importance),
            description: node.description.clone(),
            tags: node.tags.clone(),
            size: Some(node.size),
        }
    }
}

impl From<&KnowledgeRelationship> for RelationshipRecord {
    fn from(relationship: &KnowledgeRelationship) -> Self {
        Self {
            id: relationship.id.clone(),
            source_id: relationship.source_id.clone(),
            target_id: relationship.target_id.clone(),
            relationship_type: relationship.relationship_type,
            strength: relationship.strength,
            confidence: relationship.confidence,
            evidence_level: relationship.evidence_level,
            mechanism: relationship.mechanism.clone(),
            bidirectional: relationship.bidirectional,
        }
    }
}

/// Fields read before the records; the records go through [`JsonSource`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportHeader {
    version: Option<String>,
    #[serde(default)]
    locale: Option<Locale>,
    #[serde(default)]
    metadata: Option<ExportMetadata>,
    #[serde(default)]
    filters: Option<FilterSpec>,
}

/// A loaded export: the records as a dataset, the filter it was taken
/// with, and the render set that filter yields.
#[derive(Clone, Debug)]
pub struct ImportedGraph {
    pub dataset: Dataset,
    pub filters: FilterSpec,
    pub locale: Option<Locale>,
    pub payload: GraphPayload,
    pub warnings: Vec<String>,
}

pub fn import_json(raw: &str, origin: &str) -> Result<ImportedGraph> {
    let header = serde_json::from_str::<ExportHeader>(raw)
        .with_context(|| format!("failed to parse graph export {origin}"))?;
    let Some(version) = header.version else {
        bail!("{origin} is not a graph export: missing version");
    };
    let mut warnings = Vec::new();
    if major(&version) != major(EXPORT_VERSION) {
        warnings.push(format!(
            "export version {version} may not match supported version {EXPORT_VERSION}"
        ));
    }

    let source = JsonSource::parse(raw, origin)?;
    let dataset = load_dataset(&source)?;
    let filters = header.filters.unwrap_or_default().normalized();
    let payload = assemble(
        &dataset.nodes,
        &dataset.relationships,
        &dataset.supplements,
        &filters,
    );

    if let Some(metadata) = header.metadata {
        if metadata.node_count != dataset.nodes.len() {
            warnings.push(format!(
                "metadata lists {} nodes, file holds {}",
                metadata.node_count,
                dataset.nodes.len()
            ));
        }
        if metadata.relationship_count != dataset.relationships.len() {
            warnings.push(format!(
                "metadata lists {} relationships, file holds {}",
                metadata.relationship_count,
                dataset.relationships.len()
            ));
        }
    }
    warnings.extend(payload.diagnostics.iter().map(ToString::to_string));

    for warning in &warnings {
        warn!(origin, %warning, "graph import");
    }
    info!(
        origin,
        nodes = payload.nodes.len(),
        relationships = payload.relationships.len(),
        warnings = warnings.len(),
        "graph imported"
    );

    Ok(ImportedGraph {
        dataset,
        filters,
        locale: header.locale,
        payload,
        warnings,
    })
}

pub fn import_path(path: &Path) -> Result<ImportedGraph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph export {}", path.display()))?;
    import_json(&raw, &path.display().to_string())
}

fn major(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}
