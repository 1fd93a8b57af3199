use perio_core::PixelBuffer;

use super::{DetectError, LandmarkDebug, LandmarkDetection, LandmarkDetectorParams};
use crate::alignment::check_alignment;
use crate::diagnostics::{DetectEvent, DiagnosticSink, LogSink};
use crate::edges::detect_edges;
use crate::enhance::enhance_contrast;
use crate::landmarks::{extract_landmarks, LandmarkKind};
use crate::segments::build_segments;
use crate::tooth_column::select_tooth_column;
use crate::vertical_filter::filter_vertical_structures;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Single-pass landmark detector.
///
/// Holds only configuration, so one instance can serve many threads.
#[derive(Clone, Debug, Default)]
pub struct LandmarkDetector {
    params: LandmarkDetectorParams,
}

impl LandmarkDetector {
    pub fn new(params: LandmarkDetectorParams) -> Self {
        Self { params }
    }

    /// Detector parameters.
    #[inline]
    pub fn params(&self) -> &LandmarkDetectorParams {
        &self.params
    }

    /// Detect CEJ, bone crest and apex, logging decisions through `log`.
    pub fn detect(&self, image: &PixelBuffer<'_>) -> Result<LandmarkDetection, DetectError> {
        self.detect_with_sink(image, &mut LogSink)
    }

    /// Detect and report every stage decision to `sink`.
    ///
    /// Stages run strictly in order; the first stage that comes up short ends
    /// the run.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip(self, image, sink),
            fields(width = image.width(), height = image.height())
        )
    )]
    pub fn detect_with_sink(
        &self,
        image: &PixelBuffer<'_>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<LandmarkDetection, DetectError> {
        let p = &self.params;
        let (width, height) = (image.width(), image.height());
        let min_side = p.min_image_side.max(3);
        if width < min_side || height < min_side {
            sink.record(DetectEvent::ImageTooSmall {
                width,
                height,
                min_side,
            });
            return Err(DetectError::ImageTooSmall {
                width,
                height,
                min_side,
            });
        }

        let enhanced = enhance_contrast(image, &p.enhance);
        sink.record(DetectEvent::Enhanced { width, height });

        let edges = detect_edges(&enhanced, &p.edges);
        drop(enhanced);
        sink.record(DetectEvent::EdgesDetected { count: edges.len() });
        if edges.is_empty() {
            return Err(DetectError::NoEdges);
        }
        if edges.len() > p.max_edge_points {
            sink.record(DetectEvent::TooManyEdges {
                count: edges.len(),
                limit: p.max_edge_points,
            });
            return Err(DetectError::TooManyEdges {
                count: edges.len(),
                limit: p.max_edge_points,
            });
        }

        let vertical = filter_vertical_structures(&edges, width, &p.vertical);
        sink.record(DetectEvent::VerticalFiltered {
            kept: vertical.len(),
            dropped: edges.len() - vertical.len(),
        });
        if vertical.is_empty() {
            return Err(DetectError::NoVerticalStructure);
        }

        let segments = build_segments(&vertical, width, height, &p.segments);
        sink.record(DetectEvent::SegmentsBuilt {
            kept: segments.segments.len(),
            undersized: segments.undersized,
            clusters: segments.clusters.len(),
        });
        if segments.segments.is_empty() {
            return Err(DetectError::NoSegments {
                min_points: p.segments.min_points,
            });
        }

        let pool = segments.pooled_points();
        let Some(column) = select_tooth_column(&pool, width, height, &p.columns) else {
            sink.record(DetectEvent::NoColumn {
                pooled_points: pool.len(),
            });
            return Err(DetectError::NoToothColumn);
        };
        sink.record(DetectEvent::ColumnSelected {
            points: column.points.len(),
            mean_x: column.mean_x,
            score: column.score,
        });

        let max_tooth_width = p.columns.max_tooth_width(width);
        let candidates = extract_landmarks(&column, height, max_tooth_width, &p.landmarks);
        if let Some(found) = candidates.cej_fallback {
            sink.record(DetectEvent::CejFallback { found });
        }
        for kind in LandmarkKind::ALL {
            sink.record(DetectEvent::landmark(kind, candidates.get(kind)));
        }
        let Some(landmarks) = candidates.triple() else {
            let missing = candidates.first_missing().unwrap_or(LandmarkKind::Cej);
            return Err(DetectError::LandmarkNotFound(missing));
        };

        let spans = match check_alignment(&landmarks, max_tooth_width, &p.alignment) {
            Ok(spans) => spans,
            Err(reason) => {
                sink.record(DetectEvent::Rejected { reason });
                return Err(DetectError::Rejected(reason));
            }
        };
        sink.record(DetectEvent::Accepted { landmarks });

        let debug = p.collect_debug.then(|| LandmarkDebug {
            edges,
            vertical,
            clusters: segments.clusters,
            column: Some(column),
        });

        Ok(LandmarkDetection {
            landmarks,
            candidates,
            spans,
            width,
            height,
            debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;

    fn bar_image(w: usize, h: usize, x0: usize, x1: usize) -> Vec<u8> {
        let (y0, y1) = (h / 5, h * 4 / 5);
        let mut data = vec![40u8; w * h];
        for y in y0..y1 {
            for x in x0..x1 {
                data[y * w + x] = 200;
            }
        }
        data
    }

    #[test]
    fn detector_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LandmarkDetector>();
    }

    #[test]
    fn undersized_image_takes_failure_path() {
        let data = vec![0u8; 4 * 4];
        let buf = PixelBuffer::gray(4, 4, &data).expect("buffer");
        let mut sink = RecordingSink::new();
        let err = LandmarkDetector::default()
            .detect_with_sink(&buf, &mut sink)
            .unwrap_err();
        assert!(matches!(err, DetectError::ImageTooSmall { .. }));
        assert!(sink.events[0].is_failure());
    }

    #[test]
    fn blank_image_has_no_edges() {
        let data = vec![128u8; 64 * 64];
        let buf = PixelBuffer::gray(64, 64, &data).expect("buffer");
        let mut sink = RecordingSink::new();
        let err = LandmarkDetector::default()
            .detect_with_sink(&buf, &mut sink)
            .unwrap_err();
        assert_eq!(err, DetectError::NoEdges);
        assert!(sink.contains(|e| matches!(e, DetectEvent::EdgesDetected { count: 0 })));
    }

    #[test]
    fn off_centre_structure_is_not_a_tooth() {
        // Bar hugging the left edge, outside the central band.
        let data = bar_image(200, 256, 8, 24);
        let buf = PixelBuffer::gray(200, 256, &data).expect("buffer");
        let err = LandmarkDetector::default().detect(&buf).unwrap_err();
        assert_eq!(err, DetectError::NoVerticalStructure);
    }

    #[test]
    fn bar_is_accepted_with_debug_artifacts() {
        let data = bar_image(200, 256, 90, 110);
        let buf = PixelBuffer::gray(200, 256, &data).expect("buffer");
        let detector = LandmarkDetector::new(LandmarkDetectorParams::with_debug());
        let mut sink = RecordingSink::new();
        let det = detector.detect_with_sink(&buf, &mut sink).expect("detected");
        let t = det.landmarks;
        assert!(t.cej.y < t.bone.y && t.bone.y < t.apex.y);
        let debug = det.debug.expect("debug collected");
        assert!(!debug.edges.is_empty());
        assert!(!debug.clusters.is_empty());
        assert!(sink.contains(|e| matches!(e, DetectEvent::Accepted { .. })));
    }
}
