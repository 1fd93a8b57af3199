//! End-to-end helpers from `image` crate types.

use std::path::Path;

use ::image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use perio_core::{PixelBuffer, PixelFormat};
use perio_landmarks::{LandmarkDetection, LandmarkDetector, LandmarkReport};

use crate::report::ImageReport;
use crate::PerioError;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Borrow an `image::GrayImage` as a pixel buffer.
pub fn gray_buffer(img: &GrayImage) -> Result<PixelBuffer<'_>, PerioError> {
    Ok(PixelBuffer::new(
        img.width() as usize,
        img.height() as usize,
        PixelFormat::Gray8,
        img.as_raw(),
    )?)
}

/// Borrow an `image::RgbImage` as a pixel buffer.
pub fn rgb_buffer(img: &RgbImage) -> Result<PixelBuffer<'_>, PerioError> {
    Ok(PixelBuffer::new(
        img.width() as usize,
        img.height() as usize,
        PixelFormat::Rgb8,
        img.as_raw(),
    )?)
}

/// Borrow an `image::RgbaImage` as a pixel buffer.
pub fn rgba_buffer(img: &RgbaImage) -> Result<PixelBuffer<'_>, PerioError> {
    Ok(PixelBuffer::new(
        img.width() as usize,
        img.height() as usize,
        PixelFormat::Rgba8,
        img.as_raw(),
    )?)
}

/// Run `f` on a pixel buffer view of `img`.
///
/// 8-bit gray, RGB and RGBA images are borrowed directly; other layouts are
/// converted to RGBA first.
pub fn with_buffer<R>(
    img: &DynamicImage,
    f: impl FnOnce(&PixelBuffer<'_>) -> R,
) -> Result<R, PerioError> {
    match img {
        DynamicImage::ImageLuma8(g) => Ok(f(&gray_buffer(g)?)),
        DynamicImage::ImageRgb8(rgb) => Ok(f(&rgb_buffer(rgb)?)),
        DynamicImage::ImageRgba8(rgba) => Ok(f(&rgba_buffer(rgba)?)),
        other => {
            let rgba = other.to_rgba8();
            Ok(f(&rgba_buffer(&rgba)?))
        }
    }
}

/// Detect landmarks in a decoded image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, detector), fields(width = img.width(), height = img.height()))
)]
pub fn detect_image(
    img: &DynamicImage,
    detector: &LandmarkDetector,
) -> Result<LandmarkDetection, PerioError> {
    Ok(with_buffer(img, |buf| detector.detect(buf))??)
}

/// Detect landmarks and build the per-image report. Never fails; problems end
/// up in the warning list.
pub fn report_image(
    image_path: &str,
    img: &DynamicImage,
    detector: &LandmarkDetector,
    mm_per_pixel: Option<f32>,
) -> ImageReport {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let report = match with_buffer(img, |buf| detector.detect(buf)) {
        Ok(result) => LandmarkReport::from_result(image_path, width, height, result),
        Err(err) => {
            let mut report = LandmarkReport::new(image_path, width, height);
            report.set_failure(err.to_string());
            report
        }
    };
    ImageReport::new(report, mm_per_pixel)
}

/// Decode an image from disk and report on it.
///
/// The decoded image is handed back for overlay rendering; it is `None` when
/// the file could not be read, in which case the report carries the reason.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(detector), fields(path = %path.display())))]
pub fn load_and_report(
    path: &Path,
    detector: &LandmarkDetector,
    mm_per_pixel: Option<f32>,
) -> (Option<DynamicImage>, ImageReport) {
    let image_path = path.to_string_lossy().into_owned();
    match ::image::open(path) {
        Ok(img) => {
            let report = report_image(&image_path, &img, detector, mm_per_pixel);
            (Some(img), report)
        }
        Err(err) => {
            log::warn!("cannot read {}: {err}", path.display());
            let mut report = LandmarkReport::new(image_path, 0, 0);
            report.set_failure(PerioError::from(err).to_string());
            (None, ImageReport::new(report, mm_per_pixel))
        }
    }
}

/// Decode an image from disk and report on it.
pub fn report_path(
    path: &Path,
    detector: &LandmarkDetector,
    mm_per_pixel: Option<f32>,
) -> ImageReport {
    load_and_report(path, detector, mm_per_pixel).1
}

/// Report on many images, in parallel with the `rayon` feature.
pub fn report_paths<P>(
    paths: &[P],
    detector: &LandmarkDetector,
    mm_per_pixel: Option<f32>,
) -> Vec<ImageReport>
where
    P: AsRef<Path> + Sync,
{
    crate::batch::map_batch(paths, |p| report_path(p.as_ref(), detector, mm_per_pixel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{ImageBuffer, Luma, Rgb};
    use perio_landmarks::{DetectError, MANUAL_MARKING_WARNING};

    fn bar(w: u32, h: u32) -> GrayImage {
        ImageBuffer::from_fn(w, h, |x, y| {
            let inside = (w * 9 / 20..w * 11 / 20).contains(&x) && (h / 5..h * 4 / 5).contains(&y);
            Luma([if inside { 200 } else { 40 }])
        })
    }

    #[test]
    fn gray_and_rgb_images_agree() {
        let gray = bar(200, 256);
        let rgb: RgbImage = ImageBuffer::from_fn(200, 256, |x, y| {
            let v = gray.get_pixel(x, y)[0];
            Rgb([v, v, v])
        });
        let detector = LandmarkDetector::default();
        let a = detect_image(&DynamicImage::ImageLuma8(gray), &detector).expect("gray");
        let b = detect_image(&DynamicImage::ImageRgb8(rgb), &detector).expect("rgb");
        assert_eq!(a.landmarks, b.landmarks);
    }

    #[test]
    fn sixteen_bit_images_are_converted() {
        let gray16 = DynamicImage::ImageLuma8(bar(200, 256)).to_luma16();
        let det = detect_image(&DynamicImage::ImageLuma16(gray16), &LandmarkDetector::default())
            .expect("detected");
        assert!(det.landmarks.cej.y < det.landmarks.apex.y);
    }

    #[test]
    fn blank_image_reports_shortfall() {
        let img = DynamicImage::ImageLuma8(ImageBuffer::from_pixel(64, 64, Luma([90u8])));
        let err = detect_image(&img, &LandmarkDetector::default()).unwrap_err();
        assert!(matches!(err, PerioError::Detect(DetectError::NoEdges)));

        let report = report_image("blank.png", &img, &LandmarkDetector::default(), None);
        assert!(!report.is_detected());
        assert_eq!(
            report.report.warnings.last().map(String::as_str),
            Some(MANUAL_MARKING_WARNING)
        );
    }

    #[test]
    fn missing_file_becomes_warning() {
        let report = report_path(
            Path::new("/nonexistent/perio/tooth.png"),
            &LandmarkDetector::default(),
            None,
        );
        assert!(!report.is_detected());
        assert_eq!(report.report.warnings.len(), 2);
    }
}
