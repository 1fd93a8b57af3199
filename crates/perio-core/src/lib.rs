//! Core types and utilities for dental radiograph landmark detection.
//!
//! This crate is intentionally small. It knows about pixel buffers, integer
//! pixel coordinates and how to index them spatially, but nothing about
//! teeth.

mod image;
mod logger;
mod point;

pub use image::{GrayImage, ImageError, PixelBuffer, PixelFormat};
pub use point::{PixelPoint, PointIndex};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, init_with_levels, LogLevels, DIAGNOSTICS_TARGET};
