//! Keep edge points that look like part of a vertical tooth/root silhouette.

use perio_core::{PixelPoint, PointIndex};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Vertical-structure filter settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalFilterParams {
    /// Left edge of the search band, as a fraction of image width.
    pub band_start_frac: f32,
    /// Right edge of the search band, as a fraction of image width.
    pub band_end_frac: f32,
    /// Minimal vertical offset of a neighbour, px.
    pub min_dy: i32,
    /// Maximal vertical offset of a neighbour, px.
    pub max_dy: i32,
    /// Maximal horizontal offset of a neighbour, px.
    pub max_dx: i32,
    /// Path through an intermediate point may be at most this factor longer
    /// than the direct distance.
    pub continuity_slack: f32,
}

impl Default for VerticalFilterParams {
    fn default() -> Self {
        Self {
            band_start_frac: 0.3,
            band_end_frac: 0.7,
            min_dy: 5,
            max_dy: 20,
            max_dx: 3,
            continuity_slack: 1.1,
        }
    }
}

impl VerticalFilterParams {
    /// Inclusive `[x0, x1]` band for an image of the given width.
    pub fn band(&self, width: usize) -> (f32, f32) {
        let w = width as f32;
        (self.band_start_frac * w, self.band_end_frac * w)
    }
}

/// Whether `q` is a vertical neighbour of `p`.
#[inline]
pub fn is_vertical_neighbor(p: PixelPoint, q: PixelPoint, params: &VerticalFilterParams) -> bool {
    let dy = (q.y - p.y).abs();
    let dx = (q.x - p.x).abs();
    p != q && dy >= params.min_dy && dy <= params.max_dy && dx <= params.max_dx
}

/// Whether some point `m` lies (almost) on the straight path from `p` to `q`.
pub fn has_intermediate(
    p: PixelPoint,
    q: PixelPoint,
    index: &PointIndex,
    continuity_slack: f32,
) -> bool {
    let direct = p.distance(q);
    let limit = direct * continuity_slack;
    // Any m with |pm| + |mq| <= limit lies inside an ellipse with foci p, q;
    // pad the box by its semi-minor axis.
    let semi_minor = 0.5 * (limit * limit - direct * direct).max(0.0).sqrt();
    let pad = semi_minor.ceil() as i32 + 1;
    let min = PixelPoint::new(p.x.min(q.x) - pad, p.y.min(q.y) - pad);
    let max = PixelPoint::new(p.x.max(q.x) + pad, p.y.max(q.y) + pad);
    index.query_rect(min, max).into_iter().any(|i| {
        let m = index.points()[i];
        m != p && m != q && p.distance(m) + m.distance(q) <= limit
    })
}

/// Filter `edges` down to the central band and to points with vertical
/// support. Output keeps input order.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(edges, params), fields(edges = edges.len()))
)]
pub fn filter_vertical_structures(
    edges: &[PixelPoint],
    width: usize,
    params: &VerticalFilterParams,
) -> Vec<PixelPoint> {
    let (x0, x1) = params.band(width);
    let band: Vec<PixelPoint> = edges
        .iter()
        .copied()
        .filter(|p| (p.x as f32) >= x0 && (p.x as f32) <= x1)
        .collect();
    if band.is_empty() {
        return band;
    }

    let index = PointIndex::new(&band);
    band.iter()
        .copied()
        .filter(|&p| has_vertical_support(p, &index, params))
        .collect()
}

fn has_vertical_support(p: PixelPoint, index: &PointIndex, params: &VerticalFilterParams) -> bool {
    let min = PixelPoint::new(p.x - params.max_dx, p.y - params.max_dy);
    let max = PixelPoint::new(p.x + params.max_dx, p.y + params.max_dy);
    let neighbors: Vec<PixelPoint> = index
        .query_rect(min, max)
        .into_iter()
        .map(|i| index.points()[i])
        .filter(|&q| is_vertical_neighbor(p, q, params))
        .collect();

    let above = neighbors.iter().any(|q| q.y < p.y);
    let below = neighbors.iter().any(|q| q.y > p.y);
    if above && below {
        return true;
    }
    if neighbors.len() < 2 {
        return false;
    }

    neighbors
        .iter()
        .filter(|&&q| has_intermediate(p, q, index, params.continuity_slack))
        .take(2)
        .count()
        >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(x: i32, ys: std::ops::Range<i32>) -> Vec<PixelPoint> {
        ys.map(|y| PixelPoint::new(x, y)).collect()
    }

    #[test]
    fn keeps_continuous_vertical_line_including_its_ends() {
        let edges = column(50, 10..60);
        let out = filter_vertical_structures(&edges, 100, &VerticalFilterParams::default());
        assert_eq!(out, edges);
    }

    #[test]
    fn drops_points_outside_central_band() {
        let mut edges = column(10, 10..60);
        edges.extend(column(50, 10..60));
        let out = filter_vertical_structures(&edges, 100, &VerticalFilterParams::default());
        assert!(out.iter().all(|p| p.x == 50));
        assert_eq!(out.len(), 50);
    }

    #[test]
    fn drops_horizontal_runs() {
        let edges: Vec<PixelPoint> = (35..65).map(|x| PixelPoint::new(x, 40)).collect();
        let out = filter_vertical_structures(&edges, 100, &VerticalFilterParams::default());
        assert!(out.is_empty());
    }

    #[test]
    fn sparse_pair_without_continuity_is_dropped() {
        // Two neighbours below, but nothing between them and the seed.
        let edges = vec![
            PixelPoint::new(50, 10),
            PixelPoint::new(48, 25),
            PixelPoint::new(52, 28),
        ];
        let out = filter_vertical_structures(&edges, 100, &VerticalFilterParams::default());
        assert!(!out.contains(&PixelPoint::new(50, 10)));
    }

    #[test]
    fn intermediate_point_check_uses_slack() {
        let pts = [
            PixelPoint::new(0, 0),
            PixelPoint::new(0, 5),
            PixelPoint::new(4, 5),
            PixelPoint::new(0, 10),
        ];
        let index = PointIndex::new(&pts);
        assert!(has_intermediate(pts[0], pts[3], &index, 1.1));

        let no_mid = [pts[0], pts[2], pts[3]];
        let index = PointIndex::new(&no_mid);
        assert!(!has_intermediate(no_mid[0], no_mid[2], &index, 1.1));
    }
}
