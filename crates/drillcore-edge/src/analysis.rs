//! Single-frame edge statistics.
//!
//! The edge map is a forward-difference gradient threshold: each pixel is
//! compared to its right and lower neighbour, so the last column and row never
//! hold edges. All statistics are 1D counts over strips and bands of that map.

use drillcore_core::{FrameView, LumaImage};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::EdgeDetectError;
use crate::params::EdgeDetectorParams;
use crate::result::EdgeDetectionResult;

/// Scratch buffers reused across frames; reallocated only when the frame size
/// changes.
#[derive(Clone, Debug, Default)]
pub struct FrameAnalyzer {
    luma: LumaImage,
    edges: Vec<bool>,
}

impl FrameAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the buffers for a known video resolution.
    pub fn with_dims(width: usize, height: usize) -> Self {
        let mut analyzer = Self::default();
        analyzer.ensure_dims(width, height);
        analyzer
    }

    fn ensure_dims(&mut self, width: usize, height: usize) {
        if self.luma.ensure_dims(width, height) {
            log::debug!("edge scratch resized to {width}x{height}");
        }
        let n = width.saturating_mul(height);
        if self.edges.len() != n {
            self.edges.clear();
            self.edges.resize(n, false);
        }
    }

    /// Edge map of the last analyzed frame, row-major.
    pub fn edge_map(&self) -> &[bool] {
        &self.edges
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip_all, fields(width = frame.width, height = frame.height))
    )]
    pub fn analyze(
        &mut self,
        frame: &FrameView<'_>,
        params: &EdgeDetectorParams,
    ) -> Result<EdgeDetectionResult, EdgeDetectError> {
        let Some(expected) = frame.expected_len() else {
            return Err(EdgeDetectError::InvalidFrame {
                expected: usize::MAX,
                got: frame.data.len(),
            });
        };
        if expected != frame.data.len() {
            return Err(EdgeDetectError::InvalidFrame {
                expected,
                got: frame.data.len(),
            });
        }
        if frame.width < 2 || frame.height < 2 {
            return Err(EdgeDetectError::FrameTooSmall {
                width: frame.width,
                height: frame.height,
            });
        }

        self.ensure_dims(frame.width, frame.height);
        self.luma.fill_from(frame);
        self.compute_edge_map(params.gradient_threshold);
        Ok(self.summarize(params))
    }

    fn compute_edge_map(&mut self, threshold: f32) {
        let w = self.luma.width;
        let h = self.luma.height;
        let thr2 = threshold * threshold;
        self.edges.fill(false);
        for y in 0..h - 1 {
            for x in 0..w - 1 {
                let c = self.luma.get(x, y);
                let gx = self.luma.get(x + 1, y) - c;
                let gy = self.luma.get(x, y + 1) - c;
                self.edges[y * w + x] = gx * gx + gy * gy > thr2;
            }
        }
    }

    #[inline]
    fn is_edge(&self, x: usize, y: usize) -> bool {
        self.edges[y * self.luma.width + x]
    }

    fn summarize(&self, params: &EdgeDetectorParams) -> EdgeDetectionResult {
        let w = self.luma.width;
        let h = self.luma.height;
        let wf = w as f64;
        let hf = h as f64;

        let column_at = |frac: f64| ((frac * wf) as usize).min(w - 1);
        let row_at = |frac: f64| ((frac * hf) as usize).min(h - 1);

        let has_vertical_edges = params.vertical_strips.iter().any(|&frac| {
            let x = column_at(frac);
            let count = (0..h).filter(|&y| self.is_edge(x, y)).count();
            count as f64 > params.strip_edge_fraction * hf
        });

        let has_curved_edges = params.curved_bands.iter().any(|&frac| {
            let y = row_at(frac);
            let count = (0..w).filter(|&x| self.is_edge(x, y)).count();
            count as f64 > params.band_edge_fraction * wf
        });

        let center = wf / 2.0;
        let half_band = params.center_band_fraction * wf;
        let mut total = 0usize;
        let mut centered = 0usize;
        for y in 0..h {
            for x in 0..w {
                if self.is_edge(x, y) {
                    total += 1;
                    if (x as f64 - center).abs() <= half_band {
                        centered += 1;
                    }
                }
            }
        }
        let centeredness = if total == 0 {
            0.0
        } else {
            centered as f64 / total as f64
        };

        let band = params.width_band_rows.clamp(1, h);
        let y0 = (h / 2).saturating_sub(band / 2).min(h - band);
        let mut extent: Option<(usize, usize)> = None;
        for y in y0..y0 + band {
            for x in 0..w {
                if self.is_edge(x, y) {
                    extent = Some(match extent {
                        Some((lo, hi)) => (lo.min(x), hi.max(x)),
                        None => (x, x),
                    });
                }
            }
        }
        let apparent_width_px = extent.map_or(0.0, |(lo, hi)| (hi - lo) as f64);

        let estimated_distance_cm = params.target_distance_cm * params.reference_width_px(w)
            / apparent_width_px.max(1.0);

        let edge_alignment_quality = extent.map_or(0.0, |(lo, hi)| {
            let expected_left = params.expected_edges[0] * wf;
            let expected_right = params.expected_edges[1] * wf;
            let err =
                ((lo as f64 - expected_left).abs() + (hi as f64 - expected_right).abs()) / 2.0;
            let tol = (params.alignment_tolerance_fraction * wf).max(1.0);
            (1.0 - err / tol).clamp(0.0, 1.0)
        });

        let weights = &params.weights;
        let vertical = if has_vertical_edges {
            weights.vertical_edges
        } else {
            0.0
        };
        let curved = if has_curved_edges {
            weights.curved_edges
        } else {
            0.0
        };
        let confidence = (vertical + curved + weights.centeredness * centeredness).clamp(0.0, 1.0);

        let is_ready = confidence > params.ready_confidence
            && apparent_width_px > params.ready_width_fraction * wf;

        EdgeDetectionResult {
            is_ready,
            confidence,
            has_vertical_edges,
            has_curved_edges,
            centeredness,
            estimated_distance_cm,
            distance_in_range: params.distance_in_range(estimated_distance_cm),
            apparent_width_px,
            left_edge_x: extent.map(|(lo, _)| lo as u32),
            right_edge_x: extent.map(|(_, hi)| hi as u32),
            edge_alignment_quality,
        }
    }
}
