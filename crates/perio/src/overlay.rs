//! Debug and measurement overlays drawn onto an RGB copy of the radiograph.

use ::image::{DynamicImage, Rgb, RgbImage};
use perio_core::PixelPoint;
use perio_landmarks::{LandmarkDebug, LandmarkKind, LandmarkTriple};
use serde::{Deserialize, Serialize};

/// Overlay colours and sizes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub edge: [u8; 3],
    pub vertical: [u8; 3],
    pub cluster: [u8; 3],
    pub column: [u8; 3],
    pub cej: [u8; 3],
    pub bone: [u8; 3],
    pub apex: [u8; 3],
    pub line: [u8; 3],
    /// Half arm length of landmark crosses, px.
    pub cross_arm: i32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            edge: [70, 70, 160],
            vertical: [90, 160, 220],
            cluster: [230, 200, 60],
            column: [250, 140, 30],
            cej: [40, 220, 80],
            bone: [240, 60, 60],
            apex: [220, 80, 240],
            line: [255, 255, 255],
            cross_arm: 6,
        }
    }
}

impl OverlayStyle {
    pub fn landmark_color(&self, kind: LandmarkKind) -> [u8; 3] {
        match kind {
            LandmarkKind::Cej => self.cej,
            LandmarkKind::BoneCrest => self.bone,
            LandmarkKind::Apex => self.apex,
        }
    }
}

fn put(img: &mut RgbImage, x: i32, y: i32, color: [u8; 3]) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x < img.width() && y < img.height() {
        img.put_pixel(x, y, Rgb(color));
    }
}

fn draw_points(img: &mut RgbImage, points: &[PixelPoint], color: [u8; 3]) {
    for p in points {
        put(img, p.x, p.y, color);
    }
}

/// Bresenham line, clipped to the image.
pub fn draw_line(img: &mut RgbImage, a: PixelPoint, b: PixelPoint, color: [u8; 3]) {
    let (dx, dy) = ((b.x - a.x).abs(), -(b.y - a.y).abs());
    let (sx, sy) = (if a.x < b.x { 1 } else { -1 }, if a.y < b.y { 1 } else { -1 });
    let (mut x, mut y, mut err) = (a.x, a.y, dx + dy);
    loop {
        put(img, x, y, color);
        if x == b.x && y == b.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Three-pixel-thick cross centred on `p`.
pub fn draw_cross(img: &mut RgbImage, p: PixelPoint, arm: i32, color: [u8; 3]) {
    for d in -arm..=arm {
        for t in -1..=1 {
            put(img, p.x + d, p.y + t, color);
            put(img, p.x + t, p.y + d, color);
        }
    }
}

/// Draw intermediate point sets, back to front.
pub fn draw_debug(img: &mut RgbImage, debug: &LandmarkDebug, style: &OverlayStyle) {
    draw_points(img, &debug.edges, style.edge);
    draw_points(img, &debug.vertical, style.vertical);
    for cluster in &debug.clusters {
        draw_points(img, cluster, style.cluster);
    }
    if let Some(column) = &debug.column {
        draw_points(img, &column.points, style.column);
    }
}

/// Draw the CEJ→bone and bone→apex segments and a cross per landmark.
pub fn draw_landmarks(img: &mut RgbImage, triple: &LandmarkTriple, style: &OverlayStyle) {
    draw_line(img, triple.cej, triple.bone, style.line);
    draw_line(img, triple.bone, triple.apex, style.line);
    for (kind, p) in triple.iter() {
        draw_cross(img, p, style.cross_arm, style.landmark_color(kind));
    }
}

/// RGB copy of `base` with whatever the report carries drawn on top.
pub fn render_overlay(
    base: &DynamicImage,
    landmarks: Option<&LandmarkTriple>,
    debug: Option<&LandmarkDebug>,
    style: &OverlayStyle,
) -> RgbImage {
    let mut img = base.to_rgb8();
    if let Some(debug) = debug {
        draw_debug(&mut img, debug, style);
    }
    if let Some(triple) = landmarks {
        draw_landmarks(&mut img, triple, style);
    }
    img
}
