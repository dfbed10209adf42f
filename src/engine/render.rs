use eframe::egui::{Align2, Color32, Pos2, Rect, Stroke, Vec2, pos2, vec2};

use crate::state::GraphState;
use crate::util::truncate_label;

use super::FrameStats;
use super::graph::{RenderEdge, RenderGraph};
use super::highlight::{HighlightState, build_highlight_state};
use super::physics::quadtree_cells;
use super::style::{Palette, blend_color, dim_color, with_opacity};
use super::surface::{DrawSurface, SurfaceTransform};
use super::view::{
    FocusIndicator, LevelOfDetail, NodeVisibility, ViewTransform, circle_visible, edge_visible,
    sample_by_importance,
};

const LABEL_MAX_CHARS: usize = 28;
const LABEL_MIN_SCREEN_RADIUS: f32 = 12.0;
const CURVE_BEND: f32 = 0.12;
const ARROW_LENGTH: f32 = 9.0;
const ARROW_HALF_WIDTH: f32 = 4.0;

pub(super) struct RenderInputs<'a> {
    pub(super) state: &'a GraphState,
    pub(super) view: ViewTransform,
    pub(super) cap: usize,
    pub(super) focus: Option<FocusIndicator>,
    pub(super) hovered: Option<usize>,
    pub(super) show_partition: bool,
    pub(super) empty_message: &'a str,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Emphasis {
    Normal,
    Dimmed,
    Strong,
}

pub(super) fn draw_frame(
    graph: &mut RenderGraph,
    surface: &mut dyn DrawSurface,
    inputs: RenderInputs<'_>,
) -> FrameStats {
    let view = inputs.view;
    let lod = view.level_of_detail();
    let palette = Palette::for_mode(inputs.state.contrast);
    surface.set_transform(SurfaceTransform::IDENTITY);
    surface.clear(palette.background);
    if !palette.is_high_contrast() {
        draw_grid(surface, &view, palette.grid_line);
    }

    let mut scratch = std::mem::take(&mut graph.view_scratch);
    scratch.screen_positions.clear();
    scratch.screen_radii.clear();
    for node in graph.nodes() {
        scratch.screen_positions.push(view.world_to_screen(node.position()));
        scratch.screen_radii.push(view.screen_radius(node.radius()));
    }

    let cull = view.cull_rect();
    scratch.visible_indices.clear();
    scratch.visible_indices.extend((0..graph.len()).filter(|&index| {
        circle_visible(cull, scratch.screen_positions[index], scratch.screen_radii[index])
    }));
    let culled_nodes = graph.len() - scratch.visible_indices.len();

    scratch.visibility.clear();
    scratch.visibility.resize(graph.len(), NodeVisibility::Offscreen);
    for &index in &scratch.visible_indices {
        scratch.visibility[index] = NodeVisibility::SampledOut;
    }
    let sampled_out = sample_by_importance(&mut scratch.visible_indices, inputs.cap, |index| {
        graph.nodes()[index].meta().importance
    });
    for &index in &scratch.visible_indices {
        scratch.visibility[index] = NodeVisibility::Drawn;
    }

    let highlight = build_highlight_state(graph, inputs.state);

    let mut drawn_edges = 0usize;
    let mut strong_edges = Vec::new();
    for (edge_index, edge) in graph.edges().iter().enumerate() {
        let source = scratch.visibility[edge.source];
        let target = scratch.visibility[edge.target];
        if source == NodeVisibility::SampledOut || target == NodeVisibility::SampledOut {
            continue;
        }
        let from = scratch.screen_positions[edge.source];
        let to = scratch.screen_positions[edge.target];
        if source == NodeVisibility::Offscreen
            && target == NodeVisibility::Offscreen
            && !edge_visible(cull, from, to)
        {
            continue;
        }

        let emphasis = if lod == LevelOfDetail::Minimal {
            Emphasis::Normal
        } else if highlight.related_edges.contains(&edge_index) {
            strong_edges.push(edge_index);
            continue;
        } else if highlight.is_active() {
            Emphasis::Dimmed
        } else {
            Emphasis::Normal
        };

        let target_radius = scratch.screen_radii[edge.target];
        let source_radius = scratch.screen_radii[edge.source];
        let radii = [source_radius, target_radius];
        draw_edge(surface, &palette, edge, [from, to], radii, lod, emphasis);
        drawn_edges += 1;
    }
    for edge_index in strong_edges {
        let edge = &graph.edges()[edge_index];
        let from = scratch.screen_positions[edge.source];
        let to = scratch.screen_positions[edge.target];
        let radii = [
            scratch.screen_radii[edge.source],
            scratch.screen_radii[edge.target],
        ];
        draw_edge(surface, &palette, edge, [from, to], radii, lod, Emphasis::Strong);
        drawn_edges += 1;
    }

    // Important and emphasized nodes are drawn last so they sit on top.
    scratch.draw_order.clear();
    scratch.draw_order.extend_from_slice(&scratch.visible_indices);
    scratch.draw_order.sort_by(|a, b| {
        let rank = |index: usize| {
            (
                highlight.emphasizes(index) || inputs.hovered == Some(index),
                graph.nodes()[index].meta().importance,
            )
        };
        let (a_emphasis, a_importance) = rank(*a);
        let (b_emphasis, b_importance) = rank(*b);
        a_emphasis
            .cmp(&b_emphasis)
            .then(a_importance.total_cmp(&b_importance))
            .then(a.cmp(b))
    });

    for &index in &scratch.draw_order {
        let node = &graph.nodes()[index];
        let position = scratch.screen_positions[index];
        let radius = scratch.screen_radii[index];
        let meta = node.meta();

        let mut fill = palette.node_fill(meta.node_type, meta.evidence_level);
        if highlight.is_active()
            && !highlight.emphasizes(index)
            && !highlight.revealed_nodes.contains(&index)
        {
            fill = dim_color(fill, palette.dim_factor());
        }
        let outline = if lod == LevelOfDetail::Minimal && !palette.is_high_contrast() {
            Stroke::NONE
        } else {
            palette.node_outline(fill)
        };
        surface.circle(position, radius, fill, outline);

        if lod != LevelOfDetail::Minimal && inputs.state.is_selected(&meta.id) {
            surface.circle(
                position,
                radius + 3.0,
                Color32::TRANSPARENT,
                Stroke::new(2.0, palette.selection_ring),
            );
        }
        let ringed = highlight.related_nodes.contains(&index)
            || inputs.state.highlighted.as_deref() == Some(meta.id.as_str())
            || inputs.hovered == Some(index);
        if lod.highlight_rings() && ringed {
            surface.circle(
                position,
                radius + 2.0,
                Color32::TRANSPARENT,
                Stroke::new(1.5, palette.highlight_ring),
            );
        }
    }

    let mut drawn_labels = 0usize;
    for &index in &scratch.draw_order {
        let screen_radius = scratch.screen_radii[index];
        if !wants_label(index, lod, inputs.state, &highlight, inputs.hovered, screen_radius) {
            continue;
        }
        let meta = graph.nodes()[index].meta();
        let text = truncate_label(meta.display_name(inputs.state.locale), LABEL_MAX_CHARS);
        let anchor = scratch.screen_positions[index] + vec2(0.0, screen_radius + 4.0);
        let size = if lod == LevelOfDetail::Full { 13.0 } else { 12.0 };
        if lod == LevelOfDetail::Full {
            let extent = surface.measure_text(&text, size);
            let backdrop = Rect::from_min_size(
                anchor - vec2(extent.x * 0.5 + 3.0, 1.0),
                extent + vec2(6.0, 2.0),
            );
            surface.rect(backdrop, palette.label_backdrop, Stroke::NONE);
        }
        surface.text(anchor, Align2::CENTER_TOP, &text, size, palette.label_text);
        drawn_labels += 1;
    }

    if inputs.show_partition {
        quadtree_cells(graph, &mut scratch.quadtree_cells);
        surface.set_transform(view.surface_transform());
        for cell in &scratch.quadtree_cells {
            let half = Vec2::splat(cell.half_extent);
            let color = if cell.is_leaf {
                palette.partition_leaf
            } else {
                palette.partition_branch
            };
            surface.rect(
                Rect::from_min_max(
                    Pos2::ZERO + cell.center - half,
                    Pos2::ZERO + cell.center + half,
                ),
                Color32::TRANSPARENT,
                Stroke::new(1.0, color),
            );
        }
        surface.set_transform(SurfaceTransform::IDENTITY);
    }

    if let Some(focus) = inputs.focus {
        let halo = Stroke::new(2.0, palette.background);
        surface.circle(focus.center, focus.radius + 2.0, Color32::TRANSPARENT, halo);
        let ring = Stroke::new(2.5, palette.focus_ring);
        surface.circle(focus.center, focus.radius, Color32::TRANSPARENT, ring);
    }

    if graph.is_empty() {
        surface.text(
            view.canvas.center(),
            Align2::CENTER_CENTER,
            inputs.empty_message,
            16.0,
            palette.empty_message,
        );
    }

    let drawn_nodes = scratch.visible_indices.len();
    graph.view_scratch = scratch;

    FrameStats {
        drawn_nodes,
        drawn_edges,
        drawn_labels,
        culled_nodes,
        sampled_out,
        lod,
        render_cap: inputs.cap,
    }
}

fn wants_label(
    index: usize,
    lod: LevelOfDetail,
    state: &GraphState,
    highlight: &HighlightState,
    hovered: Option<usize>,
    screen_radius: f32,
) -> bool {
    if highlight.revealed_nodes.contains(&index) {
        return true;
    }
    if !lod.labels() || !state.filters.show_labels {
        return false;
    }

    lod == LevelOfDetail::Full
        || screen_radius > LABEL_MIN_SCREEN_RADIUS
        || highlight.emphasizes(index)
        || hovered == Some(index)
}

fn draw_edge(
    surface: &mut dyn DrawSurface,
    palette: &Palette,
    edge: &RenderEdge,
    [from, to]: [Pos2; 2],
    [from_radius, to_radius]: [f32; 2],
    lod: LevelOfDetail,
    emphasis: Emphasis,
) {
    let meta = &edge.meta;
    let boost = palette.edge_width_boost();
    let (color, width) = if lod == LevelOfDetail::Minimal {
        let opacity = if palette.is_high_contrast() { 1.0 } else { 0.5 };
        (with_opacity(palette.muted_edge, opacity), 0.6 + boost)
    } else {
        let base = palette.edge_color(meta.relationship_type, meta.evidence_level);
        let width = 0.8 + meta.strength * 1.6 + boost;
        match emphasis {
            Emphasis::Normal => (base, width),
            Emphasis::Dimmed => (dim_color(base, palette.dim_factor()), width),
            Emphasis::Strong if palette.is_high_contrast() => (base, width + 1.5),
            Emphasis::Strong =>(blend_color(base, Color32::WHITE, 0.15), width + 1.0),
        }
    };
    let stroke = Stroke::new(width, color);

    if !lod.curved_edges() {
        surface.line(from, to, stroke);
        return;
    }

    let delta = to - from;
    let length = delta.length();
    if length <= f32::EPSILON {
        return;
    }
    let normal = vec2(-delta.y, delta.x) / length;
    let control = from + delta * 0.5 + normal * (length * CURVE_BEND);
    surface.quadratic(from, control, to, stroke);

    draw_arrowhead(surface, control, to, to_radius, color);
    if meta.bidirectional {
        draw_arrowhead(surface, control, from, from_radius, color);
    }
}

fn draw_arrowhead(
    surface: &mut dyn DrawSurface,
    control: Pos2,
    tip_node: Pos2,
    radius: f32,
    color: Color32,
) {
    let tangent = tip_node - control;
    let length = tangent.length();
    if length <= radius + ARROW_LENGTH {
        return;
    }

    let direction = tangent / length;
    let tip = tip_node - direction * radius;
    let base = tip - direction * ARROW_LENGTH;
    let side = vec2(-direction.y, direction.x) * ARROW_HALF_WIDTH;
    surface.polygon(&[tip, base + side, base - side], color);
}

fn draw_grid(surface: &mut dyn DrawSurface, view: &ViewTransform, color: Color32) {
    let rect = view.canvas;
    let step = (56.0 * view.zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + view.pan;
    let stroke = Stroke::new(1.0, color);

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        surface.line(pos2(x, rect.top()), pos2(x, rect.bottom()), stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        surface.line(pos2(rect.left(), y), pos2(rect.right(), y), stroke);
        y += step;
    }
}
