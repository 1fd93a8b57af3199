//! Landmark types and the per-target point search inside a tooth column.

use std::fmt;

use perio_core::{PixelPoint, PointIndex};
use serde::{Deserialize, Serialize};

use crate::tooth_column::ToothColumn;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// The three anatomical landmarks located per tooth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    /// Cemento-enamel junction.
    Cej,
    /// Alveolar bone crest.
    BoneCrest,
    /// Root apex.
    Apex,
}

impl LandmarkKind {
    pub const ALL: [LandmarkKind; 3] = [Self::Cej, Self::BoneCrest, Self::Apex];
}

impl fmt::Display for LandmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cej => "CEJ",
            Self::BoneCrest => "bone crest",
            Self::Apex => "apex",
        })
    }
}

/// CEJ, bone crest and apex of one tooth, in image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkTriple {
    pub cej: PixelPoint,
    pub bone: PixelPoint,
    pub apex: PixelPoint,
}

impl LandmarkTriple {
    pub fn get(&self, kind: LandmarkKind) -> PixelPoint {
        match kind {
            LandmarkKind::Cej => self.cej,
            LandmarkKind::BoneCrest => self.bone,
            LandmarkKind::Apex => self.apex,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkKind, PixelPoint)> + '_ {
        LandmarkKind::ALL.into_iter().map(|k| (k, self.get(k)))
    }
}

/// Landmark search settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkSearchParams {
    /// Expected CEJ height as a fraction of image height.
    pub cej_frac: f32,
    /// Expected bone crest height as a fraction of image height.
    pub bone_frac: f32,
    /// Expected apex height as a fraction of image height.
    pub apex_frac: f32,
    /// Half-height of the vertical search band, fraction of image height.
    pub band_half_frac: f32,
    /// Downward band widening when the target lies below the column top.
    pub below_widening: f32,
    /// Horizontal tolerance as a fraction of the max tooth width.
    pub x_tolerance_frac: f32,
    /// Weight of horizontal distance in the candidate score.
    pub x_weight: f32,
    /// Weight of local point density in the candidate score.
    pub density_weight: f32,
    /// Radius for counting neighbouring column points, px.
    pub density_radius: f32,
    /// Maximum centrality multiplier on top of 1.
    pub centrality_bonus: f32,
    /// Band scale for the single CEJ retry.
    pub fallback_band_scale: f32,
    /// Horizontal tolerance scale for the single CEJ retry.
    pub fallback_x_scale: f32,
}

impl Default for LandmarkSearchParams {
    fn default() -> Self {
        Self {
            cej_frac: 0.35,
            bone_frac: 0.55,
            apex_frac: 0.75,
            band_half_frac: 0.1,
            below_widening: 1.5,
            x_tolerance_frac: 0.5,
            x_weight: 2.0,
            density_weight: 5.0,
            density_radius: 10.0,
            centrality_bonus: 0.5,
            fallback_band_scale: 2.0,
            fallback_x_scale: 1.5,
        }
    }
}

impl LandmarkSearchParams {
    pub fn target_frac(&self, kind: LandmarkKind) -> f32 {
        match kind {
            LandmarkKind::Cej => self.cej_frac,
            LandmarkKind::BoneCrest => self.bone_frac,
            LandmarkKind::Apex => self.apex_frac,
        }
    }
}

/// Where to look for one landmark.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandmarkTarget {
    pub kind: LandmarkKind,
    pub y: f32,
    pub x: f32,
    pub max_x_distance: f32,
    /// Half-height of the band above the target, px.
    pub band_above: f32,
    /// Extent of the band below the target, px.
    pub band_below: f32,
}

impl LandmarkTarget {
    /// Build the target for `kind`. The band below the target is widened when
    /// the target lies under the column's topmost point.
    pub fn new(
        kind: LandmarkKind,
        column_mean_x: f32,
        topmost_y: i32,
        height: usize,
        max_tooth_width: f32,
        params: &LandmarkSearchParams,
    ) -> Self {
        let h = height as f32;
        let y = params.target_frac(kind) * h;
        let half = params.band_half_frac * h;
        let below = if y > topmost_y as f32 {
            half * params.below_widening
        } else {
            half
        };
        Self {
            kind,
            y,
            x: column_mean_x,
            max_x_distance: params.x_tolerance_frac * max_tooth_width,
            band_above: half,
            band_below: below,
        }
    }

    /// Same target with band and horizontal tolerance scaled.
    pub fn widened(&self, band_scale: f32, x_scale: f32) -> Self {
        Self {
            band_above: self.band_above * band_scale,
            band_below: self.band_below * band_scale,
            max_x_distance: self.max_x_distance * x_scale,
            ..*self
        }
    }

    #[inline]
    pub fn contains(&self, p: PixelPoint) -> bool {
        let y = p.y as f32;
        y >= self.y - self.band_above
            && y <= self.y + self.band_below
            && (p.x as f32 - self.x).abs() <= self.max_x_distance
    }
}

/// Selected landmark point with its score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub point: PixelPoint,
    pub score: f32,
}

/// Multiply a non-negative score by the centrality factor, divide a negative
/// one, so a more central candidate always ranks higher.
pub fn apply_centrality(score: f32, x_dist: f32, max_x_distance: f32, bonus: f32) -> f32 {
    let closeness = if max_x_distance > 0.0 {
        (1.0 - x_dist / max_x_distance).max(0.0)
    } else {
        0.0
    };
    let factor = 1.0 + bonus * closeness;
    if score >= 0.0 {
        score * factor
    } else {
        score / factor
    }
}

/// `-(y_dist + x_weight × x_dist) + density_weight × density`, then the
/// centrality bonus.
pub fn candidate_score(
    y_dist: f32,
    x_dist: f32,
    density: usize,
    max_x_distance: f32,
    params: &LandmarkSearchParams,
) -> f32 {
    let base = -(y_dist + params.x_weight * x_dist) + params.density_weight * density as f32;
    apply_centrality(base, x_dist, max_x_distance, params.centrality_bonus)
}

/// Best-scoring point of `index` inside `target`'s band. First wins ties.
pub fn find_landmark(
    index: &PointIndex,
    target: &LandmarkTarget,
    params: &LandmarkSearchParams,
) -> Option<ScoredPoint> {
    let mut best: Option<ScoredPoint> = None;
    for &p in index.points().iter().filter(|&&p| target.contains(p)) {
        let y_dist = (p.y as f32 - target.y).abs();
        let x_dist = (p.x as f32 - target.x).abs();
        let density = index
            .within_radius(p, params.density_radius)
            .into_iter()
            .filter(|&i| index.points()[i] != p)
            .count();
        let score = candidate_score(y_dist, x_dist, density, target.max_x_distance, params);
        if best.map_or(true, |b| score > b.score) {
            best = Some(ScoredPoint { point: p, score });
        }
    }
    best
}

/// Search results for all three targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkCandidates {
    pub cej: Option<ScoredPoint>,
    pub bone: Option<ScoredPoint>,
    pub apex: Option<ScoredPoint>,
    /// Outcome of the widened CEJ search; `None` when it was not needed.
    pub cej_fallback: Option<bool>,
}

impl LandmarkCandidates {
    pub fn get(&self, kind: LandmarkKind) -> Option<ScoredPoint> {
        match kind {
            LandmarkKind::Cej => self.cej,
            LandmarkKind::BoneCrest => self.bone,
            LandmarkKind::Apex => self.apex,
        }
    }

    /// The triple if all three landmarks were found.
    pub fn triple(&self) -> Option<LandmarkTriple> {
        Some(LandmarkTriple {
            cej: self.cej?.point,
            bone: self.bone?.point,
            apex: self.apex?.point,
        })
    }

    /// First landmark that was not found, in anatomical order.
    pub fn first_missing(&self) -> Option<LandmarkKind> {
        LandmarkKind::ALL
            .into_iter()
            .find(|&k| self.get(k).is_none())
    }
}

/// Look for the CEJ, bone crest and apex inside `column`.
///
/// Only the CEJ gets a second, wider search when its band is empty.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(column, params), fields(points = column.points.len()))
)]
pub fn extract_landmarks(
    column: &ToothColumn,
    height: usize,
    max_tooth_width: f32,
    params: &LandmarkSearchParams,
) -> LandmarkCandidates {
    let mut by_y = column.points.clone();
    by_y.sort_by_key(|p| (p.y, p.x));
    let Some(topmost_y) = by_y.first().map(|p| p.y) else {
        return LandmarkCandidates::default();
    };
    let index = PointIndex::new(&by_y);

    let target = |kind| {
        LandmarkTarget::new(kind, column.mean_x, topmost_y, height, max_tooth_width, params)
    };

    let cej_target = target(LandmarkKind::Cej);
    let mut cej = find_landmark(&index, &cej_target, params);
    let mut cej_fallback = None;
    if cej.is_none() {
        let wide = cej_target.widened(params.fallback_band_scale, params.fallback_x_scale);
        cej = find_landmark(&index, &wide, params);
        cej_fallback = Some(cej.is_some());
    }

    LandmarkCandidates {
        cej,
        bone: find_landmark(&index, &target(LandmarkKind::BoneCrest), params),
        apex: find_landmark(&index, &target(LandmarkKind::Apex), params),
        cej_fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(points: Vec<PixelPoint>) -> ToothColumn {
        let mean_x = points.iter().map(|p| p.x as f32).sum::<f32>() / points.len() as f32;
        ToothColumn {
            points,
            mean_x,
            score: 1.0,
        }
    }

    #[test]
    fn centrality_multiplies_positive_and_divides_negative() {
        assert!((apply_centrality(10.0, 0.0, 10.0, 0.5) - 15.0).abs() < 1e-6);
        assert!((apply_centrality(-10.0, 0.0, 10.0, 0.5) + 10.0 / 1.5).abs() < 1e-6);
        assert!((apply_centrality(10.0, 20.0, 10.0, 0.5) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn dense_central_point_beats_isolated_close_point() {
        let params = LandmarkSearchParams::default();
        let dense = candidate_score(5.0, 1.0, 8, 25.0, &params);
        let lonely = candidate_score(0.0, 0.0, 0, 25.0, &params);
        assert!(dense > lonely);
    }

    #[test]
    fn band_is_wider_below_when_target_is_under_column_top() {
        let params = LandmarkSearchParams::default();
        let t = LandmarkTarget::new(LandmarkKind::Cej, 50.0, 10, 200, 50.0, &params);
        assert!((t.y - 70.0).abs() < 1e-4);
        assert!((t.band_above - 20.0).abs() < 1e-4);
        assert!((t.band_below - 30.0).abs() < 1e-4);

        let above_top = LandmarkTarget::new(LandmarkKind::Cej, 50.0, 100, 200, 50.0, &params);
        assert!((above_top.band_below - 20.0).abs() < 1e-4);
    }

    #[test]
    fn finds_three_landmarks_on_a_straight_root() {
        let points: Vec<PixelPoint> = (20..190).map(|y| PixelPoint::new(100, y)).collect();
        let found = extract_landmarks(&column(points), 200, 50.0, &LandmarkSearchParams::default());
        let triple = found.triple().expect("all three");
        assert!(triple.cej.y < triple.bone.y && triple.bone.y < triple.apex.y);
        assert_eq!(triple.cej, PixelPoint::new(100, 70));
        assert_eq!(triple.bone, PixelPoint::new(100, 110));
        assert_eq!(triple.apex, PixelPoint::new(100, 150));
        assert_eq!(found.cej_fallback, None);
    }

    #[test]
    fn cej_falls_back_to_wider_band_once() {
        // Nothing near 35% of height; points start well below it.
        let points: Vec<PixelPoint> = (100..190).map(|y| PixelPoint::new(100, y)).collect();
        let found = extract_landmarks(&column(points), 200, 50.0, &LandmarkSearchParams::default());
        assert_eq!(found.cej_fallback, Some(true));
        let cej = found.cej.expect("fallback cej");
        assert!(cej.point.y >= 100 && cej.point.y <= 110);
    }

    #[test]
    fn failed_cej_fallback_is_reported() {
        let points: Vec<PixelPoint> = (150..190).map(|y| PixelPoint::new(100, y)).collect();
        let found = extract_landmarks(&column(points), 200, 50.0, &LandmarkSearchParams::default());
        assert_eq!(found.cej_fallback, Some(false));
        assert!(found.cej.is_none());
        assert_eq!(found.first_missing(), Some(LandmarkKind::Cej));
    }

    #[test]
    fn reports_first_missing_landmark() {
        let points: Vec<PixelPoint> = (60..80).map(|y| PixelPoint::new(100, y)).collect();
        let found = extract_landmarks(&column(points), 200, 50.0, &LandmarkSearchParams::default());
        assert!(found.cej.is_some());
        assert_eq!(found.first_missing(), Some(LandmarkKind::BoneCrest));
        assert!(found.triple().is_none());
    }
}
