//! Grow filtered edge points into vertical segments, keep the best ones and
//! merge nearby segments into clusters.

use std::collections::{HashMap, VecDeque};

use perio_core::{PixelPoint, PointIndex};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Segment growing and merging settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentParams {
    /// Horizontal reach between consecutive members, px.
    pub max_dx: i32,
    /// Vertical reach between consecutive members, px.
    pub max_dy: i32,
    /// Segments with fewer points are discarded regardless of score.
    pub min_points: usize,
    /// Number of best-scoring segments kept.
    pub max_segments: usize,
    /// Kept segments closer than this (any point pair) are merged, px.
    pub merge_distance: f32,
    /// Floor of the centrality factor for segments at the image edge.
    pub min_centrality: f32,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            max_dx: 5,
            max_dy: 10,
            min_points: 3,
            max_segments: 5,
            merge_distance: 10.0,
            min_centrality: 0.1,
        }
    }
}

/// Points believed to follow one vertical structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub points: Vec<PixelPoint>,
    pub mean_x: f32,
    pub score: f32,
}

impl Segment {
    fn new(points: Vec<PixelPoint>, width: usize, height: usize, params: &SegmentParams) -> Self {
        let mean_x = mean_x(&points);
        let score = segment_score(&points, width, height, params.min_centrality);
        Self {
            points,
            mean_x,
            score,
        }
    }
}

/// Output of the segment stage.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SegmentSet {
    /// Kept segments, best first.
    pub segments: Vec<Segment>,
    /// Merged clusters of kept segments.
    pub clusters: Vec<Vec<PixelPoint>>,
    /// Number of grown segments dropped by the size floor.
    pub undersized: usize,
}

impl SegmentSet {
    /// Flatten all clusters into one point pool.
    pub fn pooled_points(&self) -> Vec<PixelPoint> {
        self.clusters.iter().flatten().copied().collect()
    }
}

pub(crate) fn mean_x(points: &[PixelPoint]) -> f32 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| p.x as f64).sum::<f64>() as f32 / points.len() as f32
}

/// `max_y - min_y` over the set (0 for an empty set).
pub fn vertical_spread(points: &[PixelPoint]) -> i32 {
    let min = points.iter().map(|p| p.y).min();
    let max = points.iter().map(|p| p.y).max();
    match (min, max) {
        (Some(a), Some(b)) => b - a,
        _ => 0,
    }
}

/// `1` at the horizontal centre falling linearly to `min_centrality` at the
/// image edge.
pub fn centrality_factor(mean_x: f32, width: usize, min_centrality: f32) -> f32 {
    let half = 0.5 * width as f32;
    if half <= 0.0 {
        return min_centrality;
    }
    (1.0 - (mean_x - half).abs() / half).max(min_centrality)
}

/// `spread / height × count × centrality`.
pub fn segment_score(
    points: &[PixelPoint],
    width: usize,
    height: usize,
    min_centrality: f32,
) -> f32 {
    if points.is_empty() || height == 0 {
        return 0.0;
    }
    let spread = vertical_spread(points) as f32 / height as f32;
    spread * points.len() as f32 * centrality_factor(mean_x(points), width, min_centrality)
}

/// Breadth-first grouping of `points`. Groups smaller than `min_points` are
/// dropped; the second value counts them.
pub fn grow_segments(points: &[PixelPoint], params: &SegmentParams) -> (Vec<Vec<PixelPoint>>, usize) {
    let index = PointIndex::new(points);
    let mut visited = vec![false; points.len()];
    let mut groups = Vec::new();
    let mut undersized = 0usize;
    let mut queue = VecDeque::new();

    for seed in 0..points.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        queue.push_back(seed);
        let mut group = Vec::new();

        while let Some(k) = queue.pop_front() {
            let p = points[k];
            group.push(p);
            let min = PixelPoint::new(p.x - params.max_dx, p.y - params.max_dy);
            let max = PixelPoint::new(p.x + params.max_dx, p.y + params.max_dy);
            for j in index.query_rect(min, max) {
                if !visited[j] {
                    visited[j] = true;
                    queue.push_back(j);
                }
            }
        }

        if group.len() >= params.min_points {
            groups.push(group);
        } else {
            undersized += 1;
        }
    }
    (groups, undersized)
}

/// Union segments whose points come within `merge_distance` of each other.
///
/// Cluster order follows the best-ranked member segment.
pub fn merge_segments(segments: &[Segment], merge_distance: f32) -> Vec<Vec<PixelPoint>> {
    let mut all = Vec::new();
    let mut owner = Vec::new();
    for (si, seg) in segments.iter().enumerate() {
        all.extend_from_slice(&seg.points);
        owner.extend(std::iter::repeat(si).take(seg.points.len()));
    }
    let index = PointIndex::new(&all);

    let mut parent: Vec<usize> = (0..segments.len()).collect();
    for (pi, &p) in all.iter().enumerate() {
        for qi in index.within_radius(p, merge_distance) {
            if owner[qi] != owner[pi] {
                union(&mut parent, owner[pi], owner[qi]);
            }
        }
    }

    let mut slot: HashMap<usize, usize> = HashMap::new();
    let mut clusters: Vec<Vec<PixelPoint>> = Vec::new();
    for (si, seg) in segments.iter().enumerate() {
        let root = find(&mut parent, si);
        let idx = *slot.entry(root).or_insert_with(|| {
            clusters.push(Vec::new());
            clusters.len() - 1
        });
        clusters[idx].extend_from_slice(&seg.points);
    }
    clusters
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi] = lo;
    }
}

/// Grow, score, keep the top `max_segments` and merge.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(points, params), fields(points = points.len()))
)]
pub fn build_segments(
    points: &[PixelPoint],
    width: usize,
    height: usize,
    params: &SegmentParams,
) -> SegmentSet {
    let (groups, undersized) = grow_segments(points, params);
    let mut segments: Vec<Segment> = groups
        .into_iter()
        .map(|g| Segment::new(g, width, height, params))
        .collect();
    // Stable: equal scores keep scan order.
    segments.sort_by(|a, b| b.score.total_cmp(&a.score));
    segments.truncate(params.max_segments);

    let clusters = merge_segments(&segments, params.merge_distance);
    SegmentSet {
        segments,
        clusters,
        undersized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn line(x: i32, ys: std::ops::Range<i32>) -> Vec<PixelPoint> {
        ys.map(|y| PixelPoint::new(x, y)).collect()
    }

    #[test]
    fn two_point_segments_are_discarded() {
        let mut pts = line(50, 10..40);
        pts.push(PixelPoint::new(80, 100));
        pts.push(PixelPoint::new(81, 101));
        let (groups, undersized) = grow_segments(&pts, &SegmentParams::default());
        assert_eq!(groups.len(), 1);
        assert_eq!(undersized, 1);
        assert_eq!(groups[0].len(), 30);
    }

    #[test]
    fn small_segment_is_dropped_even_when_it_would_score_high() {
        // Two far-apart points at the image centre would have spread ~1.
        let pts = vec![PixelPoint::new(50, 0), PixelPoint::new(50, 9)];
        let set = build_segments(&pts, 100, 10, &SegmentParams::default());
        assert!(set.segments.is_empty());
        assert!(set.clusters.is_empty());
    }

    #[test]
    fn centrality_prefers_middle() {
        assert_relative_eq!(centrality_factor(50.0, 100, 0.1), 1.0);
        assert_relative_eq!(centrality_factor(75.0, 100, 0.1), 0.5);
        assert_relative_eq!(centrality_factor(0.0, 100, 0.1), 0.1);
    }

    #[test]
    fn score_is_spread_times_count_times_centrality() {
        let pts = line(50, 0..50);
        let s = segment_score(&pts, 100, 98, 0.1);
        assert_relative_eq!(s, 0.5 * 50.0, epsilon = 1e-4);
    }

    #[test]
    fn keeps_only_top_scoring_segments() {
        let mut pts = Vec::new();
        for (i, x) in [20, 35, 50, 65, 80].iter().enumerate() {
            pts.extend(line(*x, 10..(20 + 10 * i as i32)));
        }
        let params = SegmentParams {
            max_segments: 2,
            merge_distance: 1.0,
            ..SegmentParams::default()
        };
        let set = build_segments(&pts, 100, 100, &params);
        assert_eq!(set.segments.len(), 2);
        assert!(set.segments[0].score >= set.segments[1].score);
        assert_eq!(set.clusters.len(), 2);
    }

    #[test]
    fn nearby_segments_merge_into_one_cluster() {
        let mut pts = line(40, 0..30);
        pts.extend(line(48, 0..30));
        pts.extend(line(90, 0..30));
        let params = SegmentParams {
            max_dx: 2,
            ..SegmentParams::default()
        };
        let set = build_segments(&pts, 100, 100, &params);
        assert_eq!(set.segments.len(), 3);
        assert_eq!(set.clusters.len(), 2);
        assert_eq!(set.clusters[0].len(), 60);
        assert_eq!(set.pooled_points().len(), 90);
    }
}
