use eframe::egui::{Vec2, vec2};

const LEAF_CAPACITY: usize = 12;
const MAX_DEPTH: usize = 10;

/// Axis-aligned square cell.
#[derive(Clone, Copy, Debug)]
pub(super) struct QuadBounds {
    pub(super) center: Vec2,
    pub(super) half_extent: f32,
}

impl QuadBounds {
    fn enclosing(points: &[Vec2]) -> Option<Self> {
        let (min, max) = points.iter().fold(
            (vec2(f32::INFINITY, f32::INFINITY), vec2(f32::NEG_INFINITY, f32::NEG_INFINITY)),
            |(min, max), point| (min.min(*point), max.max(*point)),
        );
        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let span = (max - min).max(vec2(1.0, 1.0));
        Some(Self {
            center: (min + max) * 0.5,
            half_extent: span.max_elem() * 0.5 + 1.0,
        })
    }

    pub(super) fn contains(self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_extent && offset.y <= self.half_extent
    }

    pub(super) fn side_length(self) -> f32 {
        self.half_extent * 2.0
    }

    fn quadrant_of(self, point: Vec2) -> usize {
        usize::from(point.x >= self.center.x) | (usize::from(point.y >= self.center.y) << 1)
    }

    fn quadrant(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let sign_x = if quadrant & 1 == 0 { -1.0 } else { 1.0 };
        let sign_y = if quadrant & 2 == 0 { -1.0 } else { 1.0 };
        Self {
            center: self.center + vec2(sign_x * quarter, sign_y * quarter),
            half_extent: quarter,
        }
    }

    /// Squared gap between two cells; zero when they touch or overlap.
    pub(super) fn gap_sq(self, other: Self) -> f32 {
        let reach = self.half_extent + other.half_extent;
        let gap = ((self.center - other.center).abs() - vec2(reach, reach)).max(Vec2::ZERO);
        gap.length_sq()
    }

    pub(super) fn gap_sq_to_point(self, point: Vec2) -> f32 {
        let gap = ((point - self.center).abs() - vec2(self.half_extent, self.half_extent))
            .max(Vec2::ZERO);
        gap.length_sq()
    }
}

/// Barnes–Hut quadtree over node indices.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Vec2,
    pub(super) mass: f32,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::engine) struct QuadtreeCell {
    pub center: Vec2,
    pub half_extent: f32,
    pub depth: usize,
    pub is_leaf: bool,
}

impl QuadNode {
    pub(super) fn build(positions: &[Vec2]) -> Option<Self> {
        let bounds = QuadBounds::enclosing(positions)?;
        Some(Self::subdivide(bounds, (0..positions.len()).collect(), positions, 0))
    }

    fn subdivide(bounds: QuadBounds, indices: Vec<usize>, positions: &[Vec2], depth: usize) -> Self {
        let mass = indices.len() as f32;
        let center_of_mass = if indices.is_empty() {
            bounds.center
        } else {
            indices
                .iter()
                .fold(Vec2::ZERO, |sum, &index| sum + positions[index])
                / mass
        };

        let mut node = Self {
            bounds,
            center_of_mass,
            mass,
            indices,
            children: Default::default(),
        };
        if depth >= MAX_DEPTH || node.indices.len() <= LEAF_CAPACITY {
            return node;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &index in &node.indices {
            buckets[bounds.quadrant_of(positions[index])].push(index);
        }
        // Coincident points would otherwise recurse to MAX_DEPTH for nothing.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                node.children[quadrant] = Some(Box::new(Self::subdivide(
                    bounds.quadrant(quadrant),
                    bucket,
                    positions,
                    depth + 1,
                )));
            }
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &QuadNode> {
        self.children.iter().filter_map(|child| child.as_deref())
    }

    pub(super) fn collect_cells(&self, cells: &mut Vec<QuadtreeCell>) {
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            cells.push(QuadtreeCell {
                center: node.bounds.center,
                half_extent: node.bounds.half_extent,
                depth,
                is_leaf: node.is_leaf(),
            });
            stack.extend(node.children().map(|child| (child, depth + 1)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_index_lands_in_exactly_one_leaf() {
        let positions = (0..200)
            .map(|index| {
                let angle = index as f32 * 0.37;
                vec2(angle.cos(), angle.sin()) * (index as f32 * 3.0)
            })
            .collect::<Vec<_>>();
        let tree = QuadNode::build(&positions).expect("finite positions");

        let mut seen = vec![0usize; positions.len()];
        let mut stack = vec![&tree];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                for &index in &node.indices {
                    seen[index] += 1;
                }
            }
            stack.extend(node.children());
        }
        assert!(seen.iter().all(|count| *count == 1));
        assert_eq!(tree.mass, 200.0);
    }

    #[test]
    fn non_finite_positions_build_no_tree() {
        assert!(QuadNode::build(&[vec2(f32::NAN, 0.0)]).is_none());
        assert!(QuadNode::build(&[]).is_none());
    }

    #[test]
    fn gap_is_zero_for_overlapping_cells() {
        let a = QuadBounds {
            center: Vec2::ZERO,
            half_extent: 10.0,
        };
        let b = QuadBounds {
            center: vec2(15.0, 0.0),
            half_extent: 10.0,
        };
        assert_eq!(a.gap_sq(b), 0.0);
        assert_eq!(a.gap_sq_to_point(vec2(13.0, 14.0)), 9.0 + 16.0);
    }
}
