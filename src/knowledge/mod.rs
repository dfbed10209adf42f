mod assemble;
mod export;
mod filter;
mod model;
mod search;
mod source;
mod synthetic;

pub use assemble::{GraphPayload, IntegrityIssue, assemble, seed_position};
pub use export::{
    EXPORT_VERSION, ExportMetadata, GraphExport, ImportedGraph, import_json, import_path,
};
pub use filter::{DEFAULT_MAX_NODES, FilterPatch, FilterSpec, MAX_NODES_RANGE};
pub use model::{
    EvidenceLevel, KnowledgeNode, KnowledgeRelationship, Locale, NodeRecord, NodeType,
    RelationshipRecord, RelationshipType, SupplementRecord,
};
pub use search::{SearchQuery, fold};
pub use source::{Dataset, GraphSource, JsonSource, SourceSpec, load_dataset};
pub use synthetic::SyntheticSource;
