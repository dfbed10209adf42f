use eframe::egui::{Color32, Stroke};

use crate::knowledge::{EvidenceLevel, NodeType, RelationshipType};
use crate::state::ContrastMode;

const MIN_EVIDENCE_OPACITY: f32 = 0.3;

/// Canvas colours for one [`ContrastMode`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub background: Color32,
    pub grid_line: Color32,
    pub label_text: Color32,
    pub label_backdrop: Color32,
    pub selection_ring: Color32,
    pub highlight_ring: Color32,
    pub focus_ring: Color32,
    pub muted_edge: Color32,
    pub partition_leaf: Color32,
    pub partition_branch: Color32,
    pub empty_message: Color32,
    /// Single foreground for edges and outlines; `None` keeps type colours.
    foreground: Option<Color32>,
}

impl Palette {
    pub const STANDARD: Self = Self {
        background: Color32::from_rgb(19, 23, 29),
        grid_line: Color32::from_rgba_premultiplied(24, 28, 33, 70),
        label_text: Color32::from_rgb(225, 230, 236),
        label_backdrop: Color32::from_rgba_premultiplied(10, 12, 16, 190),
        selection_ring: Color32::from_rgb(255, 215, 95),
        highlight_ring: Color32::from_rgb(150, 220, 255),
        focus_ring: Color32::WHITE,
        muted_edge: Color32::from_rgb(110, 118, 130),
        partition_leaf: Color32::from_rgba_premultiplied(40, 70, 45, 110),
        partition_branch: Color32::from_rgba_premultiplied(40, 55, 75, 110),
        empty_message: Color32::from_rgb(160, 168, 178),
        foreground: None,
    };

    pub fn for_mode(mode: ContrastMode) -> Self {
        match mode {
            ContrastMode::Standard => Self::STANDARD,
            ContrastMode::BlackWhite => Self::high_contrast(Color32::BLACK, Color32::WHITE),
            ContrastMode::BlueYellow => Self::high_contrast(
                Color32::from_rgb(0, 0, 0x80),
                Color32::from_rgb(0xff, 0xff, 0),
            ),
            ContrastMode::GreenBlack => {
                Self::high_contrast(Color32::BLACK, Color32::from_rgb(0, 0xff, 0))
            }
        }
    }

    fn high_contrast(background: Color32, foreground: Color32) -> Self {
        Self {
            background,
            grid_line: Color32::TRANSPARENT,
            label_text: foreground,
            label_backdrop: background,
            selection_ring: foreground,
            highlight_ring: foreground,
            focus_ring: foreground,
            muted_edge: foreground,
            partition_leaf: foreground,
            partition_branch: foreground,
            empty_message: foreground,
            foreground: Some(foreground),
        }
    }

    pub fn is_high_contrast(&self) -> bool {
        self.foreground.is_some()
    }

    /// High-contrast fills stay opaque whatever the evidence level.
    pub fn node_fill(&self, node_type: NodeType, evidence: EvidenceLevel) -> Color32 {
        match self.foreground {
            Some(_) => node_color(node_type),
            None => with_opacity(node_color(node_type), evidence_opacity(evidence)),
        }
    }

    pub fn node_outline(&self, fill: Color32) -> Stroke {
        match self.foreground {
            Some(foreground) => Stroke::new(2.0, foreground),
            None => Stroke::new(1.0, blend_color(fill, Color32::WHITE, 0.35)),
        }
    }

    pub fn edge_color(
        &self,
        relationship_type: RelationshipType,
        evidence: EvidenceLevel,
    ) -> Color32 {
        match self.foreground {
            Some(foreground) => foreground,
            None => with_opacity(
                relationship_color(relationship_type),
                evidence_opacity(evidence),
            ),
        }
    }

    /// Extra stroke width so thin edges stay visible.
    pub fn edge_width_boost(&self) -> f32 {
        if self.is_high_contrast() { 0.8 } else { 0.0 }
    }

    /// Brightness kept by elements outside the current highlight.
    pub fn dim_factor(&self) -> f32 {
        if self.is_high_contrast() { 0.6 } else { 0.35 }
    }
}

pub fn node_color(node_type: NodeType) -> Color32 {
    match node_type {
        NodeType::Supplement => Color32::from_rgb(0x3b, 0x82, 0xf6),
        NodeType::Neurotransmitter => Color32::from_rgb(0x10, 0xb9, 0x81),
        NodeType::BrainRegion => Color32::from_rgb(0x8b, 0x5c, 0xf6),
        NodeType::CognitiveFunction => Color32::from_rgb(0xf5, 0x9e, 0x0b),
        NodeType::Pathway => Color32::from_rgb(0xef, 0x44, 0x44),
        NodeType::Mechanism => Color32::from_rgb(0xec, 0x48, 0x99),
        NodeType::Vitamin => Color32::from_rgb(0x06, 0xb6, 0xd4),
        NodeType::Mineral => Color32::from_rgb(0x84, 0xcc, 0x16),
        NodeType::AminoAcid => Color32::from_rgb(0xf9, 0x73, 0x16),
        NodeType::FattyAcid => Color32::from_rgb(0x14, 0xb8, 0xa6),
        NodeType::Herb => Color32::from_rgb(0x22, 0xc5, 0x5e),
        NodeType::Nootropic => Color32::from_rgb(0x63, 0x66, 0xf1),
        NodeType::Adaptogen => Color32::from_rgb(0xa8, 0x55, 0xf7),
    }
}

pub fn relationship_color(relationship_type: RelationshipType) -> Color32 {
    match relationship_type {
        RelationshipType::Enhances => Color32::from_rgb(0x10, 0xb9, 0x81),
        RelationshipType::Inhibits => Color32::from_rgb(0xef, 0x44, 0x44),
        RelationshipType::Modulates => Color32::from_rgb(0x8b, 0x5c, 0xf6),
        RelationshipType::Synergizes => Color32::from_rgb(0xf5, 0x9e, 0x0b),
        RelationshipType::Antagonizes => Color32::from_rgb(0xf9, 0x73, 0x16),
        RelationshipType::Requires => Color32::from_rgb(0x3b, 0x82, 0xf6),
        RelationshipType::Produces => Color32::from_rgb(0xec, 0x48, 0x99),
        RelationshipType::Metabolizes => Color32::from_rgb(0x06, 0xb6, 0xd4),
    }
}

/// Opacity applied to elements backed by weaker evidence.
pub fn evidence_opacity(level: EvidenceLevel) -> f32 {
    level.weight().max(MIN_EVIDENCE_OPACITY)
}

pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

pub fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * amount) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

/// Darkens and fades an element that is outside the current highlight.
pub fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + factor * 0.55)) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weaker_evidence_is_never_more_opaque() {
        let opacities = EvidenceLevel::ALL.map(evidence_opacity);
        assert!(opacities.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    fn luminance(color: Color32) -> f32 {
        let channel = |value: u8| {
            let value = value as f32 / 255.0;
            if value <= 0.039_28 {
                value / 12.92
            } else {
                ((value + 0.055) / 1.055).powf(2.4)
            }
        };
        0.2126 * channel(color.r()) + 0.7152 * channel(color.g()) + 0.0722 * channel(color.b())
    }

    fn contrast_ratio(a: Color32, b: Color32) -> f32 {
        let (a, b) = (luminance(a), luminance(b));
        (a.max(b) + 0.05) / (a.min(b) + 0.05)
    }

    #[test]
    fn high_contrast_schemes_reach_seven_to_one() {
        for mode in ContrastMode::ALL.into_iter().filter(|mode| mode.is_high_contrast()) {
            let palette = Palette::for_mode(mode);
            assert!(palette.is_high_contrast());
            let edge = palette.edge_color(RelationshipType::Inhibits, EvidenceLevel::Conflicting);
            for color in [palette.label_text, palette.focus_ring, edge] {
                let ratio = contrast_ratio(color, palette.background);
                assert!(ratio >= 7.0, "{mode:?}: {ratio}");
            }
        }
    }

    #[test]
    fn high_contrast_ignores_evidence_opacity() {
        let palette = Palette::for_mode(ContrastMode::BlackWhite);
        let strong = palette.node_fill(NodeType::Herb, EvidenceLevel::Strong);
        let conflicting = palette.node_fill(NodeType::Herb, EvidenceLevel::Conflicting);
        assert_eq!(strong, conflicting);
        assert_eq!(conflicting.a(), 255);

        let standard = Palette::for_mode(ContrastMode::Standard);
        assert!(standard.node_fill(NodeType::Herb, EvidenceLevel::Conflicting).a() < 255);
        assert!(!standard.is_high_contrast());
    }

    #[test]
    fn blend_endpoints_match_inputs() {
        let a = Color32::from_rgb(10, 20, 30);
        let b = Color32::from_rgb(200, 100, 0);
        assert_eq!(blend_color(a, b, 0.0), a);
        assert_eq!(blend_color(a, b, 1.0), b);
    }
}
