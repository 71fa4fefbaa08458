use serde::{Deserialize, Serialize};

use crate::error::EdgeDetectError;
use crate::result::EdgeDetectionResult;

/// Largest frame, in pixels, a detector will pre-allocate scratch space for.
pub const MAX_FRAME_PIXELS: usize = 8192 * 8192;

/// Weights of the three cues that make up the confidence score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub vertical_edges: f64,
    pub curved_edges: f64,
    pub centeredness: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            vertical_edges: 0.4,
            curved_edges: 0.3,
            centeredness: 0.3,
        }
    }
}

/// Configuration for the cylinder edge detector.
///
/// Fractions are relative to frame width (columns) or height (rows).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeDetectorParams {
    /// Gradient magnitude (0..255 scale) above which a pixel is an edge.
    pub gradient_threshold: f32,
    /// Camera-to-core distance the reference width was calibrated at, cm.
    pub target_distance_cm: f64,
    /// Accepted deviation from `target_distance_cm`, cm.
    pub distance_tolerance_cm: f64,
    /// Columns sampled for vertical (core silhouette) edges.
    pub vertical_strips: [f64; 2],
    /// A strip counts when more than this fraction of its rows are edges.
    pub strip_edge_fraction: f64,
    /// Rows sampled for the curved (end-of-core) edges.
    pub curved_bands: [f64; 2],
    /// A band counts when its edge count exceeds this fraction of the width.
    pub band_edge_fraction: f64,
    /// Edges within this fraction of the width from center count as centered.
    pub center_band_fraction: f64,
    /// Height, in rows, of the middle band used to measure apparent width.
    pub width_band_rows: usize,
    /// Apparent core width at the target distance, as a fraction of width.
    pub reference_width_fraction: f64,
    /// Expected left/right edge of the virtual cylinder overlay.
    pub expected_edges: [f64; 2],
    /// Mean edge offset (fraction of width) at which alignment quality hits 0.
    pub alignment_tolerance_fraction: f64,
    pub weights: ConfidenceWeights,
    /// Confidence a frame must exceed to be ready.
    pub ready_confidence: f64,
    /// Apparent width a frame must exceed to be ready.
    pub ready_width_fraction: f64,
    /// Extra capture gate on alignment quality; 0 disables it.
    pub min_alignment_quality: f64,
    /// Consecutive capture-worthy ticks before the capture fires.
    pub stable_ticks: u32,
    /// Suggested polling period for the host timer, ms.
    pub tick_interval_ms: u64,
}

impl Default for EdgeDetectorParams {
    fn default() -> Self {
        Self {
            gradient_threshold: 50.0,
            target_distance_cm: 26.0,
            distance_tolerance_cm: 3.0,
            vertical_strips: [0.25, 0.75],
            strip_edge_fraction: 0.3,
            curved_bands: [0.2, 0.8],
            band_edge_fraction: 0.3,
            center_band_fraction: 0.3,
            width_band_rows: 40,
            reference_width_fraction: 0.4,
            expected_edges: [0.3, 0.7],
            alignment_tolerance_fraction: 0.1,
            weights: ConfidenceWeights::default(),
            ready_confidence: 0.6,
            ready_width_fraction: 0.2,
            min_alignment_quality: 0.0,
            stable_ticks: 1,
            tick_interval_ms: 300,
        }
    }
}

impl EdgeDetectorParams {
    /// Reject values the analysis cannot use. Run by
    /// [`CylinderEdgeDetector::start`](crate::CylinderEdgeDetector::start).
    pub fn validate(&self) -> Result<(), EdgeDetectError> {
        let fractions = [
            ("vertical_strips", self.vertical_strips[0]),
            ("vertical_strips", self.vertical_strips[1]),
            ("strip_edge_fraction", self.strip_edge_fraction),
            ("curved_bands", self.curved_bands[0]),
            ("curved_bands", self.curved_bands[1]),
            ("band_edge_fraction", self.band_edge_fraction),
            ("center_band_fraction", self.center_band_fraction),
            ("expected_edges", self.expected_edges[0]),
            ("expected_edges", self.expected_edges[1]),
            ("ready_confidence", self.ready_confidence),
            ("ready_width_fraction", self.ready_width_fraction),
            ("min_alignment_quality", self.min_alignment_quality),
        ];
        if let Some(&(field, _)) = fractions.iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            return Err(EdgeDetectError::InvalidParams { field });
        }

        let non_negative = [
            ("gradient_threshold", f64::from(self.gradient_threshold)),
            ("distance_tolerance_cm", self.distance_tolerance_cm),
            ("alignment_tolerance_fraction", self.alignment_tolerance_fraction),
            ("weights.vertical_edges", self.weights.vertical_edges),
            ("weights.curved_edges", self.weights.curved_edges),
            ("weights.centeredness", self.weights.centeredness),
        ];
        let negative = non_negative
            .iter()
            .find(|(_, v)| !(v.is_finite() && *v >= 0.0));
        if let Some(&(field, _)) = negative {
            return Err(EdgeDetectError::InvalidParams { field });
        }

        let positive = [
            ("target_distance_cm", self.target_distance_cm),
            ("reference_width_fraction", self.reference_width_fraction),
        ];
        if let Some(&(field, _)) = positive.iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            return Err(EdgeDetectError::InvalidParams { field });
        }
        Ok(())
    }

    /// Apparent width expected at the target distance.
    #[inline]
    pub fn reference_width_px(&self, frame_width: usize) -> f64 {
        frame_width as f64 * self.reference_width_fraction
    }

    #[inline]
    pub fn distance_in_range(&self, distance_cm: f64) -> bool {
        (distance_cm - self.target_distance_cm).abs() <= self.distance_tolerance_cm
    }

    /// Whether a single analyzed frame is good enough to capture.
    pub fn is_capture_worthy(&self, r: &EdgeDetectionResult) -> bool {
        r.is_ready
            && r.confidence > self.ready_confidence
            && r.distance_in_range
            && r.edge_alignment_quality >= self.min_alignment_quality
    }
}
