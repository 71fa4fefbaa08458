use serde::{Deserialize, Serialize};

/// Pixel layout of a borrowed video frame.
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
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Borrowed, row-major, tightly packed frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub data: &'a [u8], // len = w*h*channels
}

impl<'a> FrameView<'a> {
    pub fn gray(width: usize, height: usize, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Gray8,
            data,
        }
    }

    pub fn rgb(width: usize, height: usize, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgb8,
            data,
        }
    }

    pub fn rgba(width: usize, height: usize, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba8,
            data,
        }
    }

    /// Byte length implied by the dimensions, `None` on overflow.
    pub fn expected_len(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)?
            .checked_mul(self.format.channels())
    }

    pub fn is_consistent(&self) -> bool {
        self.expected_len() == Some(self.data.len())
    }

    /// BT.601 luma of pixel `idx` (row-major index), 0..255.
    #[inline]
    pub fn luma(&self, idx: usize) -> f32 {
        match self.format {
            PixelFormat::Gray8 => self.data[idx] as f32,
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => {
                let o = idx * self.format.channels();
                luma_rgb(self.data[o], self.data[o + 1], self.data[o + 2])
            }
        }
    }
}

#[inline]
pub fn luma_rgb(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Owned single-channel float image, reused as scratch across frames.
#[derive(Clone, Debug, Default)]
pub struct LumaImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl LumaImage {
    /// Resize only when the dimensions change; contents are not preserved.
    pub fn ensure_dims(&mut self, width: usize, height: usize) -> bool {
        if self.width == width && self.height == height {
            return false;
        }
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(width.saturating_mul(height), 0.0);
        true
    }

    /// Convert `src` into this buffer. `src` must be consistent.
    pub fn fill_from(&mut self, src: &FrameView<'_>) {
        self.ensure_dims(src.width, src.height);
        for (i, dst) in self.data.iter_mut().enumerate() {
            *dst = src.luma(i);
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }
}
