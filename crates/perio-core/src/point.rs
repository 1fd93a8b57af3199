use std::fmt;

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Integer pixel coordinate.
///
/// Ordering is lexicographic on `(x, y)`, which is what column partitioning
/// relies on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn to_point2(self) -> Point2<f32> {
        Point2::new(self.x as f32, self.y as f32)
    }

    #[inline]
    pub fn distance(self, other: PixelPoint) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        dx.hypot(dy)
    }
}

impl From<(i32, i32)> for PixelPoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Neighbour index over a fixed point set, backed by an immutable k-d tree.
///
/// Query results are point indices into [`PointIndex::points`], ascending.
pub struct PointIndex {
    points: Vec<PixelPoint>,
    tree: Option<ImmutableKdTree<f32, 2>>,
}

impl fmt::Debug for PointIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointIndex")
            .field("len", &self.points.len())
            .finish_non_exhaustive()
    }
}

impl PointIndex {
    pub fn new(points: &[PixelPoint]) -> Self {
        let coords: Vec<[f32; 2]> = points.iter().map(|p| [p.x as f32, p.y as f32]).collect();
        let tree = (!coords.is_empty()).then(|| ImmutableKdTree::new_from_slice(&coords));
        Self {
            points: points.to_vec(),
            tree,
        }
    }

    #[inline]
    pub fn points(&self) -> &[PixelPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Candidate indices within a padded radius of `(cx, cy)`, unfiltered.
    fn around(&self, cx: f32, cy: f32, radius: f32) -> Vec<usize> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        let r = radius.max(0.0) + 1.0;
        tree.within_unsorted::<SquaredEuclidean>(&[cx, cy], r * r)
            .into_iter()
            .map(|nn| nn.item as usize)
            .collect()
    }

    /// Indices of points with `min.x <= x <= max.x` and `min.y <= y <= max.y`.
    pub fn query_rect(&self, min: PixelPoint, max: PixelPoint) -> Vec<usize> {
        if min.x > max.x || min.y > max.y {
            return Vec::new();
        }
        let (cx, cy) = (
            0.5 * (min.x as f32 + max.x as f32),
            0.5 * (min.y as f32 + max.y as f32),
        );
        let half_diag = (0.5 * (max.x - min.x) as f32).hypot(0.5 * (max.y - min.y) as f32);
        let mut out = self.around(cx, cy, half_diag);
        out.retain(|&i| {
            let p = self.points[i];
            p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
        });
        out.sort_unstable();
        out
    }

    /// Indices of points within Euclidean `radius` of `center`.
    pub fn within_radius(&self, center: PixelPoint, radius: f32) -> Vec<usize> {
        let mut out = self.around(center.x as f32, center.y as f32, radius);
        out.retain(|&i| self.points[i].distance(center) <= radius);
        out.sort_unstable();
        out
    }
}
