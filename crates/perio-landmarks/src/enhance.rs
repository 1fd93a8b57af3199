//! Grayscale conversion, histogram equalization and contrast stretch.

use perio_core::{GrayImage, PixelBuffer, PixelFormat};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Contrast enhancement settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceParams {
    /// Linear stretch factor applied after equalization.
    pub contrast_factor: f32,
    /// Intensity the stretch pivots around.
    pub pivot: f32,
}

impl Default for EnhanceParams {
    fn default() -> Self {
        Self {
            contrast_factor: 2.0,
            pivot: 128.0,
        }
    }
}

/// Perceptual luminance of one pixel, rounded to `u8`.
#[inline]
pub fn luminance(px: &[u8], format: PixelFormat) -> u8 {
    match format {
        PixelFormat::Gray8 => px[0],
        PixelFormat::Rgb8 | PixelFormat::Rgba8 => {
            let l = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
            l.round().clamp(0.0, 255.0) as u8
        }
    }
}

/// Owned grayscale copy of the caller's buffer. Alpha is ignored.
pub fn to_grayscale(src: &PixelBuffer<'_>) -> GrayImage {
    let format = src.format();
    GrayImage {
        width: src.width(),
        height: src.height(),
        data: src.pixels().map(|px| luminance(px, format)).collect(),
    }
}

/// Histogram-equalization lookup table.
///
/// Uses the first nonzero CDF bin as floor. A flat histogram (all pixels in
/// one bin) yields the identity table.
pub fn equalization_lut(gray: &[u8]) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for &v in gray {
        hist[v as usize] += 1;
    }

    let mut cdf = [0u64; 256];
    let mut acc = 0u64;
    for (c, &h) in cdf.iter_mut().zip(hist.iter()) {
        acc += h as u64;
        *c = acc;
    }

    let mut lut = [0u8; 256];
    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);
    let range = acc.saturating_sub(cdf_min);
    if range == 0 {
        for (i, l) in lut.iter_mut().enumerate() {
            *l = i as u8;
        }
        return lut;
    }

    for (l, &c) in lut.iter_mut().zip(cdf.iter()) {
        let v = c.saturating_sub(cdf_min) as f64 / range as f64 * 255.0;
        *l = v.round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Linear contrast stretch around `pivot`, clamped to `[0, 255]`.
#[inline]
pub fn stretch(v: u8, params: &EnhanceParams) -> u8 {
    let s = (v as f32 - params.pivot) * params.contrast_factor + params.pivot;
    s.round().clamp(0.0, 255.0) as u8
}

/// Run the full enhancement: luminance, equalization, stretch.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, params), fields(width = src.width(), height = src.height()))
)]
pub fn enhance_contrast(src: &PixelBuffer<'_>, params: &EnhanceParams) -> GrayImage {
    let mut gray = to_grayscale(src);
    let lut = equalization_lut(&gray.data);

    let mut table = [0u8; 256];
    for (t, &l) in table.iter_mut().zip(lut.iter()) {
        *t = stretch(l, params);
    }
    for v in gray.data.iter_mut() {
        *v = table[*v as usize];
    }
    gray
}
