//! Edge-based distance estimation and auto-capture for drill-core photos.
//!
//! A [`FrameAnalyzer`] turns one video frame into an [`EdgeDetectionResult`]:
//! whether the core's silhouette and end edges are visible, how centered they
//! are, the apparent core width and the camera distance it implies.
//! [`CylinderEdgeDetector`] polls a [`FrameSource`] on each host tick and
//! fires [`CaptureListener::on_ready`] once the core sits at the target
//! distance. [`SharedEdgeDetector`] wraps it for timers running on another
//! thread.
//!
//! ```
//! use drillcore_core::FrameView;
//! use drillcore_edge::{EdgeDetectorParams, FrameAnalyzer};
//!
//! let pixels = vec![128u8; 64 * 48];
//! let mut analyzer = FrameAnalyzer::new();
//! let result = analyzer
//!     .analyze(&FrameView::gray(64, 48, &pixels), &EdgeDetectorParams::default())
//!     .unwrap();
//! assert!(!result.is_ready);
//! ```

mod analysis;
mod detector;
mod error;
mod params;
mod result;
mod shared;

pub use analysis::FrameAnalyzer;
pub use detector::{
    Callbacks, CaptureListener, CylinderEdgeDetector, DetectorState, FrameSource, TickOutcome,
};
pub use error::EdgeDetectError;
pub use params::{ConfidenceWeights, EdgeDetectorParams, MAX_FRAME_PIXELS};
pub use result::EdgeDetectionResult;
pub use shared::SharedEdgeDetector;
