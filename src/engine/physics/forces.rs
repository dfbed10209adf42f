use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

#[derive(Clone, Copy, Debug)]
pub(super) struct RepulsionParams {
    pub(super) strength: f32,
    pub(super) softening: f32,
    pub(super) cutoff_sq: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy, Debug)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) padding: f32,
    pub(super) max_distance_sq: f32,
}

impl CollisionParams {
    pub(super) fn min_distance(self, radius_a: f32, radius_b: f32) -> f32 {
        (radius_a + radius_b) * 1.6 + self.padding
    }
}

/// Unit vector from `b` to `a`; coincident points get a fixed, index-derived
/// direction so they still separate.
fn separation(a: Vec2, b: Vec2, seed_a: usize, seed_b: usize) -> (Vec2, f32) {
    let delta = a - b;
    let distance = delta.length();
    if distance > 0.0001 {
        return (delta / distance, distance);
    }

    let angle = ((seed_a as f32) * 0.618_034 + (seed_b as f32) * 0.414_214) * std::f32::consts::TAU;
    (vec2(angle.cos(), angle.sin()), distance)
}

fn repulsion(a: Vec2, b: Vec2, params: RepulsionParams) -> Vec2 {
    let delta = a - b;
    let distance_sq = delta.length_sq();
    if distance_sq > params.cutoff_sq {
        return Vec2::ZERO;
    }

    let distance = distance_sq.sqrt();
    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        vec2(1.0, 0.0)
    };
    direction * (params.strength / (distance_sq + params.softening))
}

fn collision(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    let min_distance = params.min_distance(radii[from], radii[to]);
    let (direction, distance) = separation(positions[from], positions[to], from, to);
    if distance < min_distance {
        let push = direction * ((min_distance - distance) * params.strength);
        forces[from] += push;
        forces[to] -= push;
    }
}

/// Exact pairwise pass for small render sets.
pub(super) fn accumulate_pairwise(
    positions: &[Vec2],
    radii: &[f32],
    repulsion_params: RepulsionParams,
    collision_params: CollisionParams,
    forces: &mut [Vec2],
) {
    for from in 0..positions.len() {
        for to in (from + 1)..positions.len() {
            let push = repulsion(positions[from], positions[to], repulsion_params);
            forces[from] += push;
            forces[to] -= push;
            collision(from, to, positions, radii, collision_params, forces);
        }
    }
}

pub(super) fn accumulate_repulsion_for_node(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: RepulsionParams,
    force: &mut Vec2,
) {
    let point = positions[index];
    if node.mass <= 0.0 || node.bounds.gap_sq_to_point(point) > params.cutoff_sq {
        return;
    }

    if node.is_leaf() {
        for &other in &node.indices {
            if other != index {
                *force += repulsion(point, positions[other], params);
            }
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance_sq = delta.length_sq().max(0.0001);
    let distance = distance_sq.sqrt();
    let far_enough = !node.bounds.contains(point)
        && node.bounds.side_length() / distance < params.theta
        && node.mass > 1.0;

    if far_enough {
        *force += (delta / distance) * (params.strength * node.mass / (distance_sq + params.softening));
        return;
    }

    for child in node.children() {
        accumulate_repulsion_for_node(child, index, positions, params, force);
    }
}

/// Dual-tree walk visiting only cell pairs close enough to overlap.
pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    if node_a.bounds.gap_sq(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    collision(from, to, positions, radii, params, forces);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    collision(from, to, positions, radii, params, forces);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (offset, child_a) in children.iter().enumerate() {
            accumulate_collision_pairs(child_a, child_a, true, positions, radii, params, forces);
            for child_b in &children[offset + 1..] {
                accumulate_collision_pairs(child_a, child_b, false, positions, radii, params, forces);
            }
        }
        return;
    }

    let split_a = !node_a.is_leaf()
        && (node_b.is_leaf() || node_a.bounds.half_extent >= node_b.bounds.half_extent);
    if split_a {
        for child in node_a.children() {
            accumulate_collision_pairs(child, node_b, false, positions, radii, params, forces);
        }
    } else {
        for child in node_b.children() {
            accumulate_collision_pairs(node_a, child, false, positions, radii, params, forces);
        }
    }
}
