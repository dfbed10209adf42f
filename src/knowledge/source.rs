use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use super::model::{NodeRecord, RelationshipRecord, SupplementRecord};
use super::synthetic::SyntheticSource;

const BUNDLED_GRAPH: &str = include_str!("../../data/knowledge_graph.json");

/// Read side of a persistence layer. The core never writes back.
pub trait GraphSource: Send {
    fn nodes(&self) -> Result<Vec<NodeRecord>>;
    fn relationships(&self) -> Result<Vec<RelationshipRecord>>;
    fn supplements(&self) -> Result<Vec<SupplementRecord>>;

    fn describe(&self) -> String;
}

#[derive(Clone, Debug, Default, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    relationships: Vec<RelationshipRecord>,
    #[serde(default)]
    supplements: Vec<SupplementRecord>,
}

#[derive(Clone, Debug)]
pub struct JsonSource {
    origin: String,
    document: GraphDocument,
}

impl JsonSource {
    pub fn parse(raw: &str, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let document = serde_json::from_str::<GraphDocument>(raw)
            .with_context(|| format!("failed to parse graph document from {origin}"))?;
        Ok(Self { origin, document })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read graph document {}", path.display()))?;
        Self::parse(&raw, path.display().to_string())
    }

    /// Sample graph compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED_GRAPH, "bundled sample graph")
    }
}

impl GraphSource for JsonSource {
    fn nodes(&self) -> Result<Vec<NodeRecord>> {
        Ok(self.document.nodes.clone())
    }

    fn relationships(&self) -> Result<Vec<RelationshipRecord>> {
        Ok(self.document.relationships.clone())
    }

    fn supplements(&self) -> Result<Vec<SupplementRecord>> {
        Ok(self.document.supplements.clone())
    }

    fn describe(&self) -> String {
        self.origin.clone()
    }
}

/// Raw records pulled from a source, before any filtering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub nodes: Vec<NodeRecord>,
    pub relationships: Vec<RelationshipRecord>,
    pub supplements: Vec<SupplementRecord>,
}

pub fn load_dataset(source: &dyn GraphSource) -> Result<Dataset> {
    let origin = source.describe();
    let nodes = source
        .nodes()
        .with_context(|| format!("failed to load nodes from {origin}"))?;
    let relationships = source
        .relationships()
        .with_context(|| format!("failed to load relationships from {origin}"))?;
    let supplements = source
        .supplements()
        .with_context(|| format!("failed to load supplements from {origin}"))?;

    info!(
        source = %origin,
        nodes = nodes.len(),
        relationships = relationships.len(),
        supplements = supplements.len(),
        "dataset loaded"
    );

    Ok(Dataset {
        nodes,
        relationships,
        supplements,
    })
}

/// Where the shell pulls its dataset from; chosen on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSpec {
    Bundled,
    Json(PathBuf),
    Synthetic(usize),
}

impl SourceSpec {
    pub fn open(&self) -> Result<Box<dyn GraphSource>> {
        Ok(match self {
            Self::Bundled => Box::new(JsonSource::bundled()?),
            Self::Json(path) => Box::new(JsonSource::from_path(path)?),
            Self::Synthetic(count) => Box::new(SyntheticSource::new(*count)),
        })
    }

    pub fn load(&self) -> Result<Dataset> {
        let source = self.open()?;
        load_dataset(source.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_graph_parses() {
        let dataset = SourceSpec::Bundled.load().expect("bundled graph loads");
        assert!(dataset.nodes.len() > 30);
        assert!(!dataset.relationships.is_empty());
        assert!(!dataset.supplements.is_empty());
    }

    #[test]
    fn malformed_document_reports_origin() {
        let error = JsonSource::parse("{ nodes: ", "broken.json").expect_err("invalid json");
        assert!(format!("{error:#}").contains("broken.json"));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let source = JsonSource::parse("{}", "empty").expect("empty document");
        let dataset = load_dataset(&source).expect("loads");
        assert_eq!(dataset, Dataset::default());
    }
}
