//! Edge analysis on `image` crate types.

use std::path::Path;

use drillcore_core::FrameView;
use drillcore_edge::{
    EdgeDetectError, EdgeDetectionResult, EdgeDetectorParams, FrameAnalyzer, FrameSource,
};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by the image helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid image buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },

    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Edge(#[from] EdgeDetectError),
}

pub fn gray_view(img: &GrayImage) -> FrameView<'_> {
    FrameView::gray(img.width() as usize, img.height() as usize, img.as_raw())
}

pub fn rgb_view(img: &RgbImage) -> FrameView<'_> {
    FrameView::rgb(img.width() as usize, img.height() as usize, img.as_raw())
}

pub fn rgba_view(img: &RgbaImage) -> FrameView<'_> {
    FrameView::rgba(img.width() as usize, img.height() as usize, img.as_raw())
}

/// Analyze one still image. 8-bit gray, RGB and RGBA buffers are read in
/// place; other layouts are converted to RGBA first.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(img, params),
        fields(width = img.width(), height = img.height())
    )
)]
pub fn analyze_image(
    img: &DynamicImage,
    params: &EdgeDetectorParams,
) -> Result<EdgeDetectionResult, DetectError> {
    let mut analyzer = FrameAnalyzer::new();
    let result = match img {
        DynamicImage::ImageLuma8(g) => analyzer.analyze(&gray_view(g), params)?,
        DynamicImage::ImageRgb8(rgb) => analyzer.analyze(&rgb_view(rgb), params)?,
        DynamicImage::ImageRgba8(rgba) => analyzer.analyze(&rgba_view(rgba), params)?,
        other => analyzer.analyze(&rgba_view(&other.to_rgba8()), params)?,
    };
    Ok(result)
}

/// Decode `path` and analyze it.
pub fn analyze_path(
    path: impl AsRef<Path>,
    params: &EdgeDetectorParams,
) -> Result<EdgeDetectionResult, DetectError> {
    let img = image::open(path)?;
    analyze_image(&img, params)
}

/// Build an `image::GrayImage` from a raw grayscale buffer.
pub fn gray_image_from_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<GrayImage, DetectError> {
    let w = usize::try_from(width).ok();
    let h = usize::try_from(height).ok();
    let Some((w, h)) = w.zip(h) else {
        return Err(DetectError::InvalidDimensions { width, height });
    };
    let Some(expected) = w.checked_mul(h) else {
        return Err(DetectError::InvalidDimensions { width, height });
    };
    if pixels.len() != expected {
        return Err(DetectError::InvalidBuffer {
            expected,
            got: pixels.len(),
        });
    }
    GrayImage::from_raw(width, height, pixels.to_vec())
        .ok_or(DetectError::InvalidDimensions { width, height })
}

pub fn analyze_gray_u8(
    width: u32,
    height: u32,
    pixels: &[u8],
    params: &EdgeDetectorParams,
) -> Result<EdgeDetectionResult, DetectError> {
    let img = gray_image_from_slice(width, height, pixels)?;
    let mut analyzer = FrameAnalyzer::new();
    Ok(analyzer.analyze(&gray_view(&img), params)?)
}

/// A decoded still image served as the detector's live frame.
#[derive(Clone, Debug)]
pub struct StillImageSource {
    image: RgbaImage,
}

impl StillImageSource {
    pub fn new(img: &DynamicImage) -> Self {
        Self {
            image: img.to_rgba8(),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, DetectError> {
        Ok(Self::new(&image::open(path)?))
    }
}

impl FrameSource for StillImageSource {
    fn current_frame(&mut self) -> Result<FrameView<'_>, EdgeDetectError> {
        Ok(rgba_view(&self.image))
    }
}
