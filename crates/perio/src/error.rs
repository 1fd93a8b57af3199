use perio_landmarks::{DetectError, LandmarkIoError};

/// Errors produced by the facade helpers and the CLI.
#[derive(thiserror::Error, Debug)]
pub enum PerioError {
    #[error(transparent)]
    Buffer(#[from] perio_core::ImageError),

    #[cfg(feature = "image")]
    #[error("failed to decode image: {0}")]
    Decode(#[from] ::image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    LandmarkIo(#[from] LandmarkIoError),

    #[error(transparent)]
    Detect(#[from] DetectError),
}
