use serde::{Deserialize, Serialize};

/// Sample layout of a caller-owned pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Gray8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Errors raised when wrapping a raw buffer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
    #[error("invalid {format:?} buffer length (expected {expected} bytes, got {got})")]
    InvalidBufferLength {
        format: PixelFormat,
        expected: usize,
        got: usize,
    },
}

/// Borrowed, immutable view of a radiograph as delivered by the caller.
#[derive(Clone, Copy, Debug)]
pub struct PixelBuffer<'a> {
    width: usize,
    height: usize,
    format: PixelFormat,
    data: &'a [u8], // row-major, len = w*h*channels
}

impl<'a> PixelBuffer<'a> {
    /// Wrap a row-major buffer, checking that its length matches the
    /// declared dimensions.
    pub fn new(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: &'a [u8],
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidDimensions { width, height });
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(format.channels()))
            .ok_or(ImageError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(ImageError::InvalidBufferLength {
                format,
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn gray(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageError> {
        Self::new(width, height, PixelFormat::Gray8, data)
    }

    pub fn rgba(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageError> {
        Self::new(width, height, PixelFormat::Rgba8, data)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Iterate pixels in row-major order, one channel slice per pixel.
    pub fn pixels(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        self.data.chunks_exact(self.format.channels())
    }
}

/// Owned 8-bit grayscale image, the pipeline's working copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new_fill(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    /// Borrow the image as a gray [`PixelBuffer`].
    pub fn as_buffer(&self) -> PixelBuffer<'_> {
        PixelBuffer {
            width: self.width,
            height: self.height,
            format: PixelFormat::Gray8,
            data: &self.data,
        }
    }
}
