use crate::alignment::AlignmentRejection;
use crate::landmarks::LandmarkKind;

/// Reasons the detector could not produce a landmark triple.
///
/// All variants are recoverable: the caller falls back to manual marking.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("image {width}x{height} is too small (minimum side {min_side} px)")]
    ImageTooSmall {
        width: usize,
        height: usize,
        min_side: usize,
    },
    #[error("no edges found")]
    NoEdges,
    #[error("too many edge points ({count} > {limit}); image is too noisy")]
    TooManyEdges { count: usize, limit: usize },
    #[error("no vertical tooth structures found")]
    NoVerticalStructure,
    #[error("no edge segments with at least {min_points} points")]
    NoSegments { min_points: usize },
    #[error("no valid tooth column found")]
    NoToothColumn,
    #[error("{0} landmark not found")]
    LandmarkNotFound(LandmarkKind),
    #[error("landmarks rejected: {0}")]
    Rejected(AlignmentRejection),
}
