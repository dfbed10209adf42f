use std::ops::RangeInclusive;

use eframe::egui::Vec2;
use serde::{Deserialize, Serialize};

pub const ZOOM_RANGE: RangeInclusive<f32> = 0.1..=10.0;
pub const RENDER_NODE_CAP_RANGE: RangeInclusive<usize> = 10..=2_000;
pub const DEFAULT_RENDER_NODE_CAP: usize = 500;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Force,
    Hierarchical,
    Circular,
    Radial,
}

impl LayoutMode {
    pub const ALL: [Self; 4] = [Self::Force, Self::Hierarchical, Self::Circular, Self::Radial];

    pub fn label(self) -> &'static str {
        match self {
            Self::Force => "Force",
            Self::Hierarchical => "Hierarchical",
            Self::Circular => "Circular",
            Self::Radial => "Radial",
        }
    }

    pub fn is_simulated(self) -> bool {
        matches!(self, Self::Force)
    }
}

/// Colour scheme for the canvas. Every mode other than `Standard` is a
/// high-contrast scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContrastMode {
    #[default]
    Standard,
    BlackWhite,
    BlueYellow,
    GreenBlack,
}

impl ContrastMode {
    pub const ALL: [Self; 4] = [
        Self::Standard,
        Self::BlackWhite,
        Self::BlueYellow,
        Self::GreenBlack,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::BlackWhite => "Black / white",
            Self::BlueYellow => "Blue / yellow",
            Self::GreenBlack => "Green / black",
        }
    }

    pub fn is_high_contrast(self) -> bool {
        self != Self::Standard
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewportState {
    pub zoom: f32,
    pub pan: Vec2,
    pub playing: bool,
    pub physics_enabled: bool,
    pub render_node_cap: usize,
    pub layout: LayoutMode,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            playing: true,
            physics_enabled: true,
            render_node_cap: DEFAULT_RENDER_NODE_CAP,
            layout: LayoutMode::Force,
        }
    }
}

pub fn clamp_zoom(level: f32) -> Option<f32> {
    level
        .is_finite()
        .then(|| level.clamp(*ZOOM_RANGE.start(), *ZOOM_RANGE.end()))
}

pub fn clamp_render_cap(cap: usize) -> usize {
    cap.clamp(*RENDER_NODE_CAP_RANGE.start(), *RENDER_NODE_CAP_RANGE.end())
}
