use serde::{Deserialize, Serialize};

/// Per-frame snapshot of the edge analysis. Transient, not persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeDetectionResult {
    pub is_ready: bool,
    /// `[0, 1]`.
    pub confidence: f64,
    pub has_vertical_edges: bool,
    pub has_curved_edges: bool,
    /// Fraction of edge pixels near the frame's vertical center line, `[0, 1]`.
    pub centeredness: f64,
    pub estimated_distance_cm: f64,
    pub distance_in_range: bool,
    pub apparent_width_px: f64,
    /// Leftmost edge column in the middle band, if any edge was found there.
    pub left_edge_x: Option<u32>,
    pub right_edge_x: Option<u32>,
    /// Agreement of the detected edges with the overlay's edges, `[0, 1]`.
    pub edge_alignment_quality: f64,
}

impl EdgeDetectionResult {
    /// Result for a tick that could not analyze a frame.
    pub fn zero_confidence() -> Self {
        Self {
            is_ready: false,
            confidence: 0.0,
            has_vertical_edges: false,
            has_curved_edges: false,
            centeredness: 0.0,
            estimated_distance_cm: 0.0,
            distance_in_range: false,
            apparent_width_px: 0.0,
            left_edge_x: None,
            right_edge_x: None,
            edge_alignment_quality: 0.0,
        }
    }

    /// True when the middle band contained at least one edge.
    pub fn has_width(&self) -> bool {
        self.apparent_width_px > 0.0
    }
}
