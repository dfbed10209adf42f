use eframe::egui::Vec2;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Pl,
}

impl Locale {
    pub fn label(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Pl => "Polski",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Supplement,
    Neurotransmitter,
    BrainRegion,
    CognitiveFunction,
    Pathway,
    Mechanism,
    Vitamin,
    Mineral,
    AminoAcid,
    FattyAcid,
    Herb,
    Nootropic,
    Adaptogen,
}

impl NodeType {
    pub const ALL: [Self; 13] = [
        Self::Supplement,
        Self::Neurotransmitter,
        Self::BrainRegion,
        Self::CognitiveFunction,
        Self::Pathway,
        Self::Mechanism,
        Self::Vitamin,
        Self::Mineral,
        Self::AminoAcid,
        Self::FattyAcid,
        Self::Herb,
        Self::Nootropic,
        Self::Adaptogen,
    ];

    pub fn label(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => match self {
                Self::Supplement => "Supplement",
                Self::Neurotransmitter => "Neurotransmitter",
                Self::BrainRegion => "Brain region",
                Self::CognitiveFunction => "Cognitive function",
                Self::Pathway => "Pathway",
                Self::Mechanism => "Mechanism",
                Self::Vitamin => "Vitamin",
                Self::Mineral => "Mineral",
                Self::AminoAcid => "Amino acid",
                Self::FattyAcid => "Fatty acid",
                Self::Herb => "Herb",
                Self::Nootropic => "Nootropic",
                Self::Adaptogen => "Adaptogen",
            },
            Locale::Pl => match self {
                Self::Supplement => "Suplement",
                Self::Neurotransmitter => "Neuroprzekaźnik",
                Self::BrainRegion => "Region mózgu",
                Self::CognitiveFunction => "Funkcja poznawcza",
                Self::Pathway => "Szlak neuronalny",
                Self::Mechanism => "Mechanizm działania",
                Self::Vitamin => "Witamina",
                Self::Mineral => "Minerał",
                Self::AminoAcid => "Aminokwas",
                Self::FattyAcid => "Kwas tłuszczowy",
                Self::Herb => "Zioło",
                Self::Nootropic => "Nootropik",
                Self::Adaptogen => "Adaptogen",
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Enhances,
    Inhibits,
    Modulates,
    Synergizes,
    Antagonizes,
    Requires,
    Produces,
    Metabolizes,
}

impl RelationshipType {
    pub const ALL: [Self; 8] = [
        Self::Enhances,
        Self::Inhibits,
        Self::Modulates,
        Self::Synergizes,
        Self::Antagonizes,
        Self::Requires,
        Self::Produces,
        Self::Metabolizes,
    ];

    pub fn label(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => match self {
                Self::Enhances => "Enhances",
                Self::Inhibits => "Inhibits",
                Self::Modulates => "Modulates",
                Self::Synergizes => "Synergizes",
                Self::Antagonizes => "Antagonizes",
                Self::Requires => "Requires",
                Self::Produces => "Produces",
                Self::Metabolizes => "Metabolizes",
            },
            Locale::Pl => match self {
                Self::Enhances => "Wzmacnia",
                Self::Inhibits => "Hamuje",
                Self::Modulates => "Moduluje",
                Self::Synergizes => "Synergia",
                Self::Antagonizes => "Antagonizm",
                Self::Requires => "Wymaga",
                Self::Produces => "Wytwarza",
                Self::Metabolizes => "Metabolizuje",
            },
        }
    }

    /// Phrase used between source and target names ("A enhances B").
    pub fn verb(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => match self {
                Self::Enhances => "enhances",
                Self::Inhibits => "inhibits",
                Self::Modulates => "modulates",
                Self::Synergizes => "works in synergy with",
                Self::Antagonizes => "antagonizes",
                Self::Requires => "requires",
                Self::Produces => "produces",
                Self::Metabolizes => "metabolizes",
            },
            Locale::Pl => match self {
                Self::Enhances => "wzmacnia",
                Self::Inhibits => "hamuje",
                Self::Modulates => "moduluje",
                Self::Synergizes => "działa synergicznie z",
                Self::Antagonizes => "działa antagonistycznie wobec",
                Self::Requires => "wymaga",
                Self::Produces => "wytwarza",
                Self::Metabolizes => "metabolizuje",
            },
        }
    }
}

/// Declared weakest-first so the derived `Ord` reads `Strong > Moderate > ... > Conflicting`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceLevel {
    Conflicting,
    Insufficient,
    Weak,
    Moderate,
    Strong,
}

impl EvidenceLevel {
    pub const ALL: [Self; 5] = [
        Self::Strong,
        Self::Moderate,
        Self::Weak,
        Self::Insufficient,
        Self::Conflicting,
    ];

    pub fn weight(self) -> f32 {
        match self {
            Self::Strong => 1.0,
            Self::Moderate => 0.8,
            Self::Weak => 0.6,
            Self::Insufficient => 0.4,
            Self::Conflicting => 0.2,
        }
    }

    /// Every level at or above `min`.
    pub fn at_least(min: Self) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |level| *level >= min)
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => match self {
                Self::Strong => "Strong",
                Self::Moderate => "Moderate",
                Self::Weak => "Weak",
                Self::Insufficient => "Insufficient",
                Self::Conflicting => "Conflicting",
            },
            Locale::Pl => match self {
                Self::Strong => "Silne",
                Self::Moderate => "Umiarkowane",
                Self::Weak => "Słabe",
                Self::Insufficient => "Niewystarczające",
                Self::Conflicting => "Sprzeczne",
            },
        }
    }
}

/// Node as returned by a data source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "polishName")]
    pub localized_name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub evidence_level: EvidenceLevel,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub importance: Option<f32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub size: Option<f32>,
}

impl NodeRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        node_type: NodeType,
        evidence_level: EvidenceLevel,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            localized_name: String::new(),
            node_type,
            evidence_level,
            category: String::new(),
            importance: None,
            description: String::new(),
            tags: Vec::new(),
            size: None,
        }
    }

    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = Some(importance);
        self
    }

    /// Missing or non-finite importance ranks as zero.
    pub fn importance(&self) -> f32 {
        self.importance.filter(|value| value.is_finite()).unwrap_or(0.0)
    }
}

/// Relationship as returned by a data source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRecord {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    pub strength: f32,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    pub evidence_level: EvidenceLevel,
    #[serde(default)]
    pub mechanism: String,
    #[serde(default)]
    pub bidirectional: bool,
}

impl RelationshipRecord {
    pub fn new(
        id: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship_type: RelationshipType,
        strength: f32,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type,
            strength,
            confidence: default_confidence(),
            evidence_level: EvidenceLevel::Moderate,
            mechanism: String::new(),
            bidirectional: false,
        }
    }
}

fn default_confidence() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementRecord {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "polishName")]
    pub localized_name: String,
    #[serde(default)]
    pub category: String,
    pub evidence_level: EvidenceLevel,
    #[serde(default)]
    pub active_compounds: Vec<String>,
}

/// A node admitted to a render set. Only `position` is ever written after
/// assembly, and only by the layout engine.
#[derive(Clone, Debug, PartialEq)]
pub struct KnowledgeNode {
    pub id: String,
    pub name: String,
    pub localized_name: String,
    pub node_type: NodeType,
    pub evidence_level: EvidenceLevel,
    pub category: String,
    pub description: String,
    pub tags: Vec<String>,
    pub importance: f32,
    pub size: f32,
    pub position: Vec2,
}

impl KnowledgeNode {
    pub fn display_name(&self, locale: Locale) -> &str {
        match locale {
            Locale::Pl if !self.localized_name.is_empty() => &self.localized_name,
            _ => &self.name,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KnowledgeRelationship {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: RelationshipType,
    pub strength: f32,
    pub confidence: f32,
    pub evidence_level: EvidenceLevel,
    pub mechanism: String,
    pub bidirectional: bool,
}

impl From<&RelationshipRecord> for KnowledgeRelationship {
    fn from(record: &RelationshipRecord) -> Self {
        Self {
            id: record.id.clone(),
            source_id: record.source_id.clone(),
            target_id: record.target_id.clone(),
            relationship_type: record.relationship_type,
            strength: sanitize_unit(record.strength),
            confidence: sanitize_unit(record.confidence),
            evidence_level: record.evidence_level,
            mechanism: record.mechanism.clone(),
            bidirectional: record.bidirectional,
        }
    }
}

pub(crate) fn sanitize_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
