//! Partition clustered points into candidate tooth columns and pick the best.

use perio_core::PixelPoint;
use serde::{Deserialize, Serialize};

use crate::segments::{mean_x, vertical_spread};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Column partitioning and scoring settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToothColumnParams {
    /// Widest plausible tooth, as a fraction of image width.
    pub max_tooth_width_frac: f32,
    /// Columns with fewer points are dropped.
    pub min_points: usize,
    /// Spread-ratio window that earns the spread bonus.
    pub spread_bonus_range: [f32; 2],
    /// Multiplier applied inside `spread_bonus_range`.
    pub spread_bonus: f32,
}

impl Default for ToothColumnParams {
    fn default() -> Self {
        Self {
            max_tooth_width_frac: 0.25,
            min_points: 3,
            spread_bonus_range: [0.4, 0.9],
            spread_bonus: 1.5,
        }
    }
}

impl ToothColumnParams {
    /// Widest plausible tooth in pixels.
    pub fn max_tooth_width(&self, width: usize) -> f32 {
        self.max_tooth_width_frac * width as f32
    }
}

/// Candidate tooth column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToothColumn {
    /// Member points sorted by `(x, y)`.
    pub points: Vec<PixelPoint>,
    pub mean_x: f32,
    pub score: f32,
}

/// Greedy x-sweep. A point joins the current column while it stays within
/// `max_tooth_width / 2` of the column's first point. Columns are never empty,
/// whatever `min_points` says.
pub fn partition_columns(
    points: &[PixelPoint],
    max_tooth_width: f32,
    min_points: usize,
) -> Vec<Vec<PixelPoint>> {
    let min_points = min_points.max(1);
    let mut sorted = points.to_vec();
    sorted.sort();

    let half = 0.5 * max_tooth_width;
    let mut columns = Vec::new();
    let mut current: Vec<PixelPoint> = Vec::new();
    for p in sorted {
        match current.first() {
            Some(reference) if (p.x - reference.x) as f32 <= half => current.push(p),
            _ => {
                let done = std::mem::replace(&mut current, vec![p]);
                if done.len() >= min_points {
                    columns.push(done);
                }
            }
        }
    }
    if current.len() >= min_points {
        columns.push(current);
    }
    columns
}

/// Number of image-height thirds (upper, middle, lower) holding a point.
pub fn thirds_coverage(points: &[PixelPoint], height: usize) -> u32 {
    let h = height as f32;
    let (mut upper, mut middle, mut lower) = (false, false, false);
    for p in points {
        let y = p.y as f32;
        if y < h / 3.0 {
            upper = true;
        } else if y < 2.0 * h / 3.0 {
            middle = true;
        } else {
            lower = true;
        }
    }
    upper as u32 + middle as u32 + lower as u32
}

/// `1 + max|x - mean_x| / (max_tooth_width / 2)`.
pub fn alignment_penalty(points: &[PixelPoint], max_tooth_width: f32) -> f32 {
    let mx = mean_x(points);
    let max_dev = points
        .iter()
        .map(|p| (p.x as f32 - mx).abs())
        .fold(0.0f32, f32::max);
    let half = (0.5 * max_tooth_width).max(1.0);
    1.0 + max_dev / half
}

/// Thirds coverage × spread bonus ÷ alignment penalty.
pub fn column_score(
    points: &[PixelPoint],
    height: usize,
    max_tooth_width: f32,
    params: &ToothColumnParams,
) -> f32 {
    if points.len() < params.min_points || height == 0 {
        return 0.0;
    }
    let mut score = thirds_coverage(points, height) as f32;
    let ratio = vertical_spread(points) as f32 / height as f32;
    let [lo, hi] = params.spread_bonus_range;
    if ratio >= lo && ratio <= hi {
        score *= params.spread_bonus;
    }
    score / alignment_penalty(points, max_tooth_width)
}

/// Partition and return the highest-scoring column (first wins ties).
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(points, params), fields(points = points.len()))
)]
pub fn select_tooth_column(
    points: &[PixelPoint],
    width: usize,
    height: usize,
    params: &ToothColumnParams,
) -> Option<ToothColumn> {
    let max_w = params.max_tooth_width(width);
    let mut best: Option<ToothColumn> = None;
    for col in partition_columns(points, max_w, params.min_points) {
        let score = column_score(&col, height, max_w, params);
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(ToothColumn {
                mean_x: mean_x(&col),
                points: col,
                score,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pts(raw: &[(i32, i32)]) -> Vec<PixelPoint> {
        raw.iter().map(|&p| PixelPoint::from(p)).collect()
    }

    #[test]
    fn partitions_by_distance_to_column_start() {
        let points = pts(&[(10, 5), (14, 9), (20, 1), (21, 3), (40, 5), (41, 6), (42, 7), (90, 1)]);
        let cols = partition_columns(&points, 20.0, 3);
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0], pts(&[(10, 5), (14, 9), (20, 1)]));
        assert_eq!(cols[1], pts(&[(40, 5), (41, 6), (42, 7)]));
    }

    #[test]
    fn zero_min_points_yields_no_empty_column() {
        let points = pts(&[(10, 5), (14, 9), (40, 5), (90, 1)]);
        let cols = partition_columns(&points, 20.0, 0);
        assert_eq!(cols.len(), 3);
        assert!(cols.iter().all(|c| !c.is_empty()));
        assert_eq!(cols.iter().map(Vec::len).sum::<usize>(), points.len());

        // Zero height scores every column 0; the first real one still wins.
        let params = ToothColumnParams {
            min_points: 0,
            ..ToothColumnParams::default()
        };
        let best = select_tooth_column(&points, 100, 0, &params).expect("column");
        assert_eq!(best.points, pts(&[(10, 5), (14, 9)]));
        assert!(partition_columns(&[], 20.0, 0).is_empty());
    }

    #[test]
    fn thirds_count_each_band_once() {
        assert_eq!(thirds_coverage(&pts(&[(0, 10), (0, 20)]), 90), 1);
        assert_eq!(thirds_coverage(&pts(&[(0, 10), (0, 40), (0, 80)]), 90), 3);
    }

    #[test]
    fn spread_bonus_and_alignment_penalty_apply() {
        let params = ToothColumnParams::default();
        let straight = pts(&[(50, 10), (50, 50), (50, 80)]);
        // spread 70/100 inside [0.4, 0.9]: 3 × 1.5, no penalty.
        assert_relative_eq!(column_score(&straight, 100, 20.0, &params), 4.5, epsilon = 1e-5);

        let skewed = pts(&[(40, 10), (50, 50), (60, 80)]);
        // max deviation 10, half-width 10 → penalty 2.
        assert_relative_eq!(column_score(&skewed, 100, 20.0, &params), 2.25, epsilon = 1e-5);
    }

    #[test]
    fn picks_best_column_and_none_for_tiny_input() {
        let mut points = pts(&[(10, 40), (11, 45), (12, 50)]);
        points.extend(pts(&[(60, 5), (60, 50), (61, 95)]));
        let best = select_tooth_column(&points, 100, 100, &ToothColumnParams::default())
            .expect("column");
        assert_eq!(best.points.len(), 3);
        assert!(best.points.iter().all(|p| p.x >= 60));

        let few = pts(&[(10, 40), (11, 45)]);
        assert!(select_tooth_column(&few, 100, 100, &ToothColumnParams::default()).is_none());
    }
}
