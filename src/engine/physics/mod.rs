mod forces;
mod quadtree;

use eframe::egui::Vec2;
use tracing::debug;

use super::graph::RenderGraph;
use forces::{
    CollisionParams, RepulsionParams, accumulate_collision_pairs, accumulate_pairwise,
    accumulate_repulsion_for_node,
};
use quadtree::QuadNode;
pub(in crate::engine) use quadtree::QuadtreeCell;

/// Below this many nodes the exact pairwise pass is cheaper than a tree.
pub(in crate::engine) const SPATIAL_THRESHOLD: usize = 150;
pub(in crate::engine) const WORLD_HALF_EXTENT: f32 = 8_000.0;

const BARNES_HUT_THETA: f32 = 0.72;
const REPULSION_STRENGTH: f32 = 78_000.0;
const REPULSION_SOFTENING: f32 = 620.0;
const REPULSION_CUTOFF: f32 = 1_400.0;
const SPRING_STRENGTH: f32 = 0.016;
const SPRING_DAMPING: f32 = 0.22;
const SPRING_REST_LENGTH: f32 = 90.0;
const COLLISION_STRENGTH: f32 = 1.9;
const COLLISION_PADDING: f32 = 8.0;
const CENTER_PULL: f32 = 0.0011;
const VELOCITY_DAMPING: f32 = 0.86;
const FORCE_SCALE: f32 = 0.055;
const MAX_FORCE: f32 = 255.0;
const MAX_SPEED: f32 = 26.0;

/// Quadtree reused across ticks. Rebuilding every tick is wasteful for large
/// sets, so the interval grows with node count.
#[derive(Default)]
pub(in crate::engine) struct Partition {
    tree: Option<QuadNode>,
    built_for: usize,
    ticks_since_build: usize,
    interval: usize,
}

impl Partition {
    pub(in crate::engine) fn invalidate(&mut self) {
        self.tree = None;
        self.ticks_since_build = 0;
    }

    pub(in crate::engine) fn rebuild_interval(node_count: usize) -> usize {
        match node_count {
            0..500 => 1,
            500..1_000 => 2,
            _ => 4,
        }
    }

    fn refresh(&mut self, positions: &[Vec2]) -> Option<&QuadNode> {
        let interval = Self::rebuild_interval(positions.len());
        if interval != self.interval {
            debug!(nodes = positions.len(), interval, "partition rebuild cadence changed");
            self.interval = interval;
        }

        let stale = self.tree.is_none()
            || self.built_for != positions.len()
            || self.ticks_since_build + 1 >= interval;
        if stale {
            self.tree = QuadNode::build(positions);
            self.built_for = positions.len();
            self.ticks_since_build = 0;
        } else {
            self.ticks_since_build += 1;
        }
        self.tree.as_ref()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::engine) struct StepOutcome {
    pub max_speed_sq: f32,
}

/// Cell outlines for the debug overlay, built from current positions.
pub(in crate::engine) fn quadtree_cells(graph: &RenderGraph, cells: &mut Vec<QuadtreeCell>) {
    cells.clear();
    let positions = graph.nodes().iter().map(|node| node.position()).collect::<Vec<_>>();
    if let Some(tree) = QuadNode::build(&positions) {
        tree.collect_cells(cells);
    }
}

/// Advances the layout by one tick. Every force is scaled by `alpha`, the
/// simulation temperature.
pub(in crate::engine) fn step(
    graph: &mut RenderGraph,
    partition: &mut Partition,
    alpha: f32,
) -> StepOutcome {
    let node_count = graph.len();
    if node_count < 2 {
        return StepOutcome { max_speed_sq: 0.0 };
    }

    let mut scratch = std::mem::take(&mut graph.physics_scratch);
    scratch.forces.clear();
    scratch.forces.resize(node_count, Vec2::ZERO);
    scratch.positions.clear();
    scratch.radii.clear();
    let mut max_radius = 0.0_f32;
    for node in graph.nodes() {
        scratch.positions.push(node.position());
        scratch.radii.push(node.radius());
        max_radius = max_radius.max(node.radius());
    }

    let repulsion = RepulsionParams {
        strength: REPULSION_STRENGTH,
        softening: REPULSION_SOFTENING,
        cutoff_sq: REPULSION_CUTOFF * REPULSION_CUTOFF,
        theta: BARNES_HUT_THETA,
    };
    let mut collision = CollisionParams {
        strength: COLLISION_STRENGTH,
        padding: COLLISION_PADDING,
        max_distance_sq: 0.0,
    };
    let max_collision_distance = collision.min_distance(max_radius, max_radius);
    collision.max_distance_sq = max_collision_distance * max_collision_distance;

    if node_count < SPATIAL_THRESHOLD {
        partition.invalidate();
        accumulate_pairwise(
            &scratch.positions,
            &scratch.radii,
            repulsion,
            collision,
            &mut scratch.forces,
        );
    } else if let Some(tree) = partition.refresh(&scratch.positions) {
        for (index, force) in scratch.forces.iter_mut().enumerate() {
            accumulate_repulsion_for_node(tree, index, &scratch.positions, repulsion, force);
        }
        accumulate_collision_pairs(
            tree,
            tree,
            true,
            &scratch.positions,
            &scratch.radii,
            collision,
            &mut scratch.forces,
        );
    }

    for edge in graph.edges() {
        let (from, to) = (edge.source, edge.target);
        let delta = scratch.positions[from] - scratch.positions[to];
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }
        let direction = delta / distance;

        let rest_length = SPRING_REST_LENGTH + (scratch.radii[from] + scratch.radii[to]) * 2.0;
        let spring = (distance - rest_length) * SPRING_STRENGTH * edge.meta.strength;
        let nodes = graph.nodes();
        let relative_velocity = nodes[from].velocity() - nodes[to].velocity();
        let damping = relative_velocity.dot(direction) * SPRING_DAMPING * edge.meta.strength;
        let correction = direction * (spring + damping);

        scratch.forces[from] -= correction;
        scratch.forces[to] += correction;
    }

    for (force, position) in scratch.forces.iter_mut().zip(&scratch.positions) {
        *force -= *position * CENTER_PULL;
    }

    let max_force_sq = MAX_FORCE * MAX_FORCE;
    let max_speed_sq = MAX_SPEED * MAX_SPEED;
    let mut fastest_sq = 0.0_f32;
    for (node, force) in graph.nodes_mut().iter_mut().zip(&scratch.forces) {
        if node.is_pinned() {
            node.set_velocity(Vec2::ZERO);
            continue;
        }

        let mut force = *force * alpha;
        if !force.is_finite() {
            force = Vec2::ZERO;
        }
        let force_sq = force.length_sq();
        if force_sq > max_force_sq {
            force *= MAX_FORCE / force_sq.sqrt();
        }

        let mut velocity = (node.velocity() + force * FORCE_SCALE) * VELOCITY_DAMPING;
        let speed_sq = velocity.length_sq();
        if speed_sq > max_speed_sq {
            velocity *= MAX_SPEED / speed_sq.sqrt();
        }

        let mut position = node.position() + velocity;
        if !position.is_finite() {
            position = Vec2::ZERO;
            velocity = Vec2::ZERO;
        }
        if position.x.abs() > WORLD_HALF_EXTENT {
            position.x = position.x.clamp(-WORLD_HALF_EXTENT, WORLD_HALF_EXTENT);
            velocity.x = 0.0;
        }
        if position.y.abs() > WORLD_HALF_EXTENT {
            position.y = position.y.clamp(-WORLD_HALF_EXTENT, WORLD_HALF_EXTENT);
            velocity.y = 0.0;
        }

        fastest_sq = fastest_sq.max(velocity.length_sq());
        node.set_velocity(velocity);
        node.set_position(position);
    }

    graph.physics_scratch = scratch;
    StepOutcome {
        max_speed_sq: fastest_sq,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuild_interval_grows_with_node_count() {
        assert_eq!(Partition::rebuild_interval(10), 1);
        assert_eq!(Partition::rebuild_interval(499), 1);
        assert_eq!(Partition::rebuild_interval(500), 2);
        assert_eq!(Partition::rebuild_interval(999), 2);
        assert_eq!(Partition::rebuild_interval(5_000), 4);
    }

    #[test]
    fn partition_reuses_tree_between_rebuilds() {
        let positions = (0..600)
            .map(|index| Vec2::new(index as f32, (index % 17) as f32 * 9.0))
            .collect::<Vec<_>>();
        let mut partition = Partition::default();
        assert!(partition.refresh(&positions).is_some());
        assert_eq!(partition.ticks_since_build, 0);
        partition.refresh(&positions);
        assert_eq!(partition.ticks_since_build, 1);
        partition.refresh(&positions);
        assert_eq!(partition.ticks_since_build, 0);
    }
}
