//! Sobel gradient magnitude with plateau-tolerant non-maximum suppression and
//! dual-threshold acceptance.
//!
//! A pixel survives when
//! - its magnitude exceeds `weak_threshold`,
//! - no 8-neighbour is strictly stronger (ties are kept, so both pixels that
//!   straddle a step edge survive),
//! - it, or one of its 8-neighbours, exceeds `strong_threshold`.
//!
//! The last rule keeps faint pixels that touch a strong edge and drops
//! isolated weak noise.

use perio_core::{GrayImage, PixelPoint};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Edge acceptance thresholds on Sobel magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeParams {
    pub weak_threshold: f32,
    pub strong_threshold: f32,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            weak_threshold: 50.0,
            strong_threshold: 100.0,
        }
    }
}

impl EdgeParams {
    /// `(weak, strong)` with the ordering fixed if the caller swapped them.
    pub fn ordered(&self) -> (f32, f32) {
        if self.weak_threshold <= self.strong_threshold {
            (self.weak_threshold, self.strong_threshold)
        } else {
            (self.strong_threshold, self.weak_threshold)
        }
    }
}

/// Per-pixel Sobel magnitude. The outer 1-pixel border is always zero.
#[derive(Clone, Debug)]
pub struct GradientField {
    pub width: usize,
    pub height: usize,
    pub magnitude: Vec<f32>,
}

impl GradientField {
    pub fn sobel(img: &GrayImage) -> Self {
        let (w, h) = (img.width, img.height);
        let mut magnitude = vec![0.0f32; w * h];
        if w < 3 || h < 3 {
            return Self {
                width: w,
                height: h,
                magnitude,
            };
        }

        let src = &img.data;
        for y in 1..h - 1 {
            let r0 = (y - 1) * w;
            let r1 = y * w;
            let r2 = (y + 1) * w;
            for x in 1..w - 1 {
                let p = |row: usize, col: usize| src[row + col] as f32;
                let gx = (p(r0, x + 1) + 2.0 * p(r1, x + 1) + p(r2, x + 1))
                    - (p(r0, x - 1) + 2.0 * p(r1, x - 1) + p(r2, x - 1));
                let gy = (p(r2, x - 1) + 2.0 * p(r2, x) + p(r2, x + 1))
                    - (p(r0, x - 1) + 2.0 * p(r0, x) + p(r0, x + 1));
                magnitude[r1 + x] = gx.hypot(gy);
            }
        }

        Self {
            width: w,
            height: h,
            magnitude,
        }
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.magnitude[y * self.width + x]
    }

    /// Apply the acceptance rules to every interior pixel, in row-major order.
    pub fn extract_edges(&self, params: &EdgeParams) -> Vec<PixelPoint> {
        let (w, h) = (self.width, self.height);
        let mut out = Vec::new();
        if w < 3 || h < 3 {
            return out;
        }
        let (weak, strong) = params.ordered();

        for y in 1..h - 1 {
            for x in 1..w - 1 {
                let m = self.at(x, y);
                if m <= weak {
                    continue;
                }
                let mut local_max = true;
                let mut strong_neighbor = false;
                for (nx, ny) in neighbors8(x, y) {
                    let n = self.at(nx, ny);
                    if n > m {
                        local_max = false;
                        break;
                    }
                    strong_neighbor |= n > strong;
                }
                if local_max && (m > strong || strong_neighbor) {
                    out.push(PixelPoint::new(x as i32, y as i32));
                }
            }
        }
        out
    }
}

#[inline]
fn neighbors8(x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> {
    const OFFSETS: [(isize, isize); 8] = [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];
    OFFSETS
        .into_iter()
        .map(move |(dx, dy)| (x.wrapping_add_signed(dx), y.wrapping_add_signed(dy)))
}

/// Sobel + suppression + thresholds. The gradient field is dropped on return.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img, params), fields(width = img.width, height = img.height))
)]
pub fn detect_edges(img: &GrayImage, params: &EdgeParams) -> Vec<PixelPoint> {
    GradientField::sobel(img).extract_edges(params)
}
