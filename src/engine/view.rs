use eframe::egui::{Pos2, Rect, Vec2};

use crate::state::ViewportState;

use super::surface::SurfaceTransform;

/// Below this zoom labels are hidden and edges drawn as plain strokes.
pub const LOD_LABEL_ZOOM: f32 = 0.6;
/// At or above this zoom curved edges, arrowheads and highlight rings appear.
pub const LOD_FULL_ZOOM: f32 = 1.4;
/// Screen-space slack around the canvas before an element counts as off-screen.
pub const CULL_MARGIN: f32 = 12.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelOfDetail {
    Minimal,
    Standard,
    Full,
}

impl LevelOfDetail {
    pub fn for_zoom(zoom: f32) -> Self {
        if zoom < LOD_LABEL_ZOOM {
            Self::Minimal
        } else if zoom < LOD_FULL_ZOOM {
            Self::Standard
        } else {
            Self::Full
        }
    }

    pub fn labels(self) -> bool {
        self != Self::Minimal
    }

    pub fn curved_edges(self) -> bool {
        self == Self::Full
    }

    pub fn highlight_rings(self) -> bool {
        self == Self::Full
    }
}

/// Pan/zoom mapping between world and screen for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub canvas: Rect,
    pub pan: Vec2,
    pub zoom: f32,
}

impl ViewTransform {
    pub fn new(canvas: Rect, viewport: &ViewportState) -> Self {
        Self {
            canvas,
            pan: viewport.pan,
            zoom: viewport.zoom,
        }
    }

    pub fn world_to_screen(&self, world: Vec2) -> Pos2 {
        self.canvas.center() + self.pan + world * self.zoom
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Vec2 {
        (screen - self.canvas.center() - self.pan) / self.zoom
    }

    pub fn screen_radius(&self, world_radius: f32) -> f32 {
        (world_radius * self.zoom.powf(0.6)).clamp(2.0, 60.0)
    }

    pub fn level_of_detail(&self) -> LevelOfDetail {
        LevelOfDetail::for_zoom(self.zoom)
    }

    pub fn surface_transform(&self) -> SurfaceTransform {
        SurfaceTransform {
            translation: self.canvas.center().to_vec2() + self.pan,
            scale: self.zoom,
        }
    }

    pub fn cull_rect(&self) -> Rect {
        self.canvas.expand(CULL_MARGIN)
    }
}

/// Per-node outcome of culling and sampling for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum NodeVisibility {
    Offscreen,
    SampledOut,
    Drawn,
}

/// Where the focus ring should be drawn this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusIndicator {
    pub center: Pos2,
    pub radius: f32,
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2) -> bool {
    let bounds = Rect::from_two_pos(start, end);
    if !bounds.intersects(rect) {
        return false;
    }
    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ];
    (0..4).any(|side| segments_intersect(start, end, corners[side], corners[(side + 1) % 4]))
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        oa.x * ob.y - oa.y * ob.x
    }
    fn straddles(c1: f32, c2: f32) -> bool {
        (c1 <= 0.0 && c2 >= 0.0) || (c1 >= 0.0 && c2 <= 0.0)
    }

    straddles(cross(a1, a2, b1), cross(a1, a2, b2))
        && straddles(cross(b1, b2, a1), cross(b1, b2, a2))
}

/// Trims `visible` to the `cap` most important entries, ties broken by
/// index, which is assembly order. Returns how many were dropped.
pub(super) fn sample_by_importance(
    visible: &mut Vec<usize>,
    cap: usize,
    importance: impl Fn(usize) -> f32,
) -> usize {
    if visible.len() <= cap {
        return 0;
    }

    let dropped = visible.len() - cap;
    visible.sort_by(|a, b| importance(*b).total_cmp(&importance(*a)).then(a.cmp(b)));
    visible.truncate(cap);
    visible.sort_unstable();
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    fn canvas() -> Rect {
        Rect::from_min_max(pos2(0.0, 0.0), pos2(800.0, 600.0))
    }

    #[test]
    fn world_and_screen_round_trip() {
        let view = ViewTransform {
            canvas: canvas(),
            pan: Vec2::new(40.0, -25.0),
            zoom: 2.5,
        };
        let world = Vec2::new(-33.0, 71.0);
        let back = view.screen_to_world(view.world_to_screen(world));
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn lod_thresholds() {
        assert_eq!(LevelOfDetail::for_zoom(0.3), LevelOfDetail::Minimal);
        assert_eq!(LevelOfDetail::for_zoom(1.0), LevelOfDetail::Standard);
        assert_eq!(LevelOfDetail::for_zoom(1.4), LevelOfDetail::Full);
        assert!(!LevelOfDetail::Minimal.labels());
    }

    #[test]
    fn edge_crossing_canvas_is_visible() {
        let rect = canvas();
        assert!(edge_visible(rect, pos2(-100.0, 300.0), pos2(900.0, 300.0)));
        assert!(!edge_visible(rect, pos2(-100.0, -50.0), pos2(-10.0, -300.0)));
        assert!(!circle_visible(rect, pos2(-30.0, 10.0), 5.0));
    }

    #[test]
    fn sampling_keeps_most_important_in_index_order() {
        let importance = [0.1, 0.9, 0.5, 0.9, 0.2];
        let mut visible = vec![0, 1, 2, 3, 4];
        let dropped = sample_by_importance(&mut visible, 3, |index| importance[index]);
        assert_eq!(dropped, 2);
        assert_eq!(visible, vec![1, 2, 3]);
    }
}
