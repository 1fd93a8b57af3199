//! Typed decision events emitted while the pipeline runs.
//!
//! The detector reports every stage outcome through a [`DiagnosticSink`].
//! [`LogSink`] forwards events to the `log` facade; [`RecordingSink`] keeps
//! them so callers and tests can inspect why a radiograph was rejected.

use log::Level;
use serde::{Deserialize, Serialize};

use crate::alignment::AlignmentRejection;
use crate::landmarks::{LandmarkKind, LandmarkTriple, ScoredPoint};
use perio_core::{PixelPoint, DIAGNOSTICS_TARGET};

/// One decision point of the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DetectEvent {
    ImageTooSmall {
        width: usize,
        height: usize,
        min_side: usize,
    },
    Enhanced {
        width: usize,
        height: usize,
    },
    EdgesDetected {
        count: usize,
    },
    TooManyEdges {
        count: usize,
        limit: usize,
    },
    VerticalFiltered {
        kept: usize,
        dropped: usize,
    },
    SegmentsBuilt {
        kept: usize,
        undersized: usize,
        clusters: usize,
    },
    ColumnSelected {
        points: usize,
        mean_x: f32,
        score: f32,
    },
    NoColumn {
        pooled_points: usize,
    },
    CejFallback {
        found: bool,
    },
    LandmarkFound {
        kind: LandmarkKind,
        point: PixelPoint,
        score: f32,
    },
    LandmarkMissing {
        kind: LandmarkKind,
    },
    Rejected {
        reason: AlignmentRejection,
    },
    Accepted {
        landmarks: LandmarkTriple,
    },
}

impl DetectEvent {
    pub(crate) fn landmark(kind: LandmarkKind, found: Option<ScoredPoint>) -> Self {
        match found {
            Some(s) => Self::LandmarkFound {
                kind,
                point: s.point,
                score: s.score,
            },
            None => Self::LandmarkMissing { kind },
        }
    }

    /// Log level the event deserves.
    pub fn level(&self) -> Level {
        match self {
            Self::Enhanced { .. } | Self::LandmarkFound { .. } => Level::Trace,
            Self::EdgesDetected { count: 0 }
            | Self::VerticalFiltered { kept: 0, .. }
            | Self::SegmentsBuilt { kept: 0, .. } => Level::Warn,
            Self::EdgesDetected { .. }
            | Self::VerticalFiltered { .. }
            | Self::SegmentsBuilt { .. }
            | Self::ColumnSelected { .. }
            | Self::CejFallback { .. } => Level::Debug,
            Self::Accepted { .. } => Level::Info,
            Self::ImageTooSmall { .. }
            | Self::TooManyEdges { .. }
            | Self::NoColumn { .. }
            | Self::LandmarkMissing { .. }
            | Self::Rejected { .. } => Level::Warn,
        }
    }

    /// Whether this event ends the run without a result.
    pub fn is_failure(&self) -> bool {
        self.level() == Level::Warn
    }
}

/// Receiver of pipeline decision events.
pub trait DiagnosticSink {
    fn record(&mut self, event: DetectEvent);
}

/// Drops all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&mut self, _event: DetectEvent) {}
}

/// Forwards events to the `log` facade under [`DIAGNOSTICS_TARGET`].
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn record(&mut self, event: DetectEvent) {
        let level = event.level();
        if log::log_enabled!(target: DIAGNOSTICS_TARGET, level) {
            log::log!(target: DIAGNOSTICS_TARGET, level, "{}", describe(&event));
        }
    }
}

/// Keeps every event in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<DetectEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The rejection reason, if the validator refused the triple.
    pub fn rejection(&self) -> Option<AlignmentRejection> {
        self.events.iter().find_map(|e| match e {
            DetectEvent::Rejected { reason } => Some(*reason),
            _ => None,
        })
    }

    pub fn contains(&self, pred: impl Fn(&DetectEvent) -> bool) -> bool {
        self.events.iter().any(pred)
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&mut self, event: DetectEvent) {
        self.events.push(event);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn record(&mut self, event: DetectEvent) {
        (**self).record(event);
    }
}

/// Fan out to two sinks, e.g. logging and recording at once.
pub struct Tee<A, B>(pub A, pub B);

impl<A: DiagnosticSink, B: DiagnosticSink> DiagnosticSink for Tee<A, B> {
    fn record(&mut self, event: DetectEvent) {
        self.0.record(event.clone());
        self.1.record(event);
    }
}

fn describe(event: &DetectEvent) -> String {
    match event {
        DetectEvent::ImageTooSmall {
            width,
            height,
            min_side,
        } => format!("image {width}x{height} is below the {min_side}px minimum side"),
        DetectEvent::Enhanced { width, height } => format!("enhanced {width}x{height} image"),
        DetectEvent::EdgesDetected { count } => format!("edge points: {count}"),
        DetectEvent::TooManyEdges { count, limit } => {
            format!("edge points {count} exceed limit {limit}")
        }
        DetectEvent::VerticalFiltered { kept, dropped } => {
            format!("vertical filter kept {kept}, dropped {dropped}")
        }
        DetectEvent::SegmentsBuilt {
            kept,
            undersized,
            clusters,
        } => format!("segments kept {kept} (undersized {undersized}), clusters {clusters}"),
        DetectEvent::ColumnSelected {
            points,
            mean_x,
            score,
        } => format!("tooth column: {points} points at x={mean_x:.1}, score {score:.3}"),
        DetectEvent::NoColumn { pooled_points } => {
            format!("no tooth column among {pooled_points} clustered points")
        }
        DetectEvent::CejFallback { found } => {
            format!("CEJ band empty, widened search found={found}")
        }
        DetectEvent::LandmarkFound { kind, point, score } => {
            format!("{kind} at ({}, {}) score {score:.2}", point.x, point.y)
        }
        DetectEvent::LandmarkMissing { kind } => format!("{kind} not found"),
        DetectEvent::Rejected { reason } => format!("rejected: {reason}"),
        DetectEvent::Accepted { landmarks } => format!(
            "accepted CEJ ({}, {}), bone ({}, {}), apex ({}, {})",
            landmarks.cej.x,
            landmarks.cej.y,
            landmarks.bone.x,
            landmarks.bone.y,
            landmarks.apex.x,
            landmarks.apex.y
        ),
    }
}
