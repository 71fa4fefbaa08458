//! Polling auto-capture detector.
//!
//! The host owns the timer and calls [`CylinderEdgeDetector::tick`] on each
//! period; the detector never spawns threads. State machine:
//!
//! ```text
//! Idle --start--> Armed --capture--> Captured --reset--> Idle
//!   ^               |                   |
//!   +-----stop------+-------stop--------+
//! ```
//!
//! Captured ticks still analyze frames and report distance/edge updates, but
//! the ready callback fires at most once per armed session.

use drillcore_core::FrameView;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::analysis::FrameAnalyzer;
use crate::error::EdgeDetectError;
use crate::params::{EdgeDetectorParams, MAX_FRAME_PIXELS};
use crate::result::EdgeDetectionResult;

/// Anything the host can sample for a still frame.
pub trait FrameSource {
    /// Borrow the current frame. `Err(FrameUnavailable)` when the stream has
    /// not produced one yet.
    fn current_frame(&mut self) -> Result<FrameView<'_>, EdgeDetectError>;
}

/// Receives detector events on the thread that calls `tick`.
pub trait CaptureListener {
    /// Fired once per armed session, on the capture-worthy frame.
    fn on_ready(&mut self, result: &EdgeDetectionResult);

    /// Fired on each analyzed frame that had a measurable core width.
    fn on_distance_update(&mut self, _distance_cm: f64) {}

    /// Fired on every tick while running, including zero-confidence ticks.
    fn on_edge_update(&mut self, _result: &EdgeDetectionResult) {}
}

type ResultCallback = Box<dyn FnMut(&EdgeDetectionResult) + Send>;
type DistanceCallback = Box<dyn FnMut(f64) + Send>;

/// Closure-based [`CaptureListener`].
pub struct Callbacks {
    on_ready: ResultCallback,
    on_distance_update: Option<DistanceCallback>,
    on_edge_update: Option<ResultCallback>,
}

impl Callbacks {
    pub fn new(on_ready: impl FnMut(&EdgeDetectionResult) + Send + 'static) -> Self {
        Self {
            on_ready: Box::new(on_ready),
            on_distance_update: None,
            on_edge_update: None,
        }
    }

    pub fn on_distance_update(mut self, f: impl FnMut(f64) + Send + 'static) -> Self {
        self.on_distance_update = Some(Box::new(f));
        self
    }

    pub fn on_edge_update(mut self, f: impl FnMut(&EdgeDetectionResult) + Send + 'static) -> Self {
        self.on_edge_update = Some(Box::new(f));
        self
    }
}

impl CaptureListener for Callbacks {
    fn on_ready(&mut self, result: &EdgeDetectionResult) {
        (self.on_ready)(result);
    }

    fn on_distance_update(&mut self, distance_cm: f64) {
        if let Some(f) = self.on_distance_update.as_mut() {
            f(distance_cm);
        }
    }

    fn on_edge_update(&mut self, result: &EdgeDetectionResult) {
        if let Some(f) = self.on_edge_update.as_mut() {
            f(result);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorState {
    Idle,
    Armed,
    Captured,
}

/// What a tick did.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// Detector not started; nothing analyzed.
    Idle,
    /// A previous tick was still running (shared handle only).
    Skipped,
    Analyzed(EdgeDetectionResult),
    /// This tick fired the capture.
    Captured(EdgeDetectionResult),
}

impl TickOutcome {
    pub fn result(&self) -> Option<&EdgeDetectionResult> {
        match self {
            TickOutcome::Analyzed(r) | TickOutcome::Captured(r) => Some(r),
            TickOutcome::Idle | TickOutcome::Skipped => None,
        }
    }
}

struct Session {
    source: Box<dyn FrameSource + Send>,
    listener: Box<dyn CaptureListener + Send>,
}

/// Edge-based distance/alignment estimator with one-shot auto-capture.
pub struct CylinderEdgeDetector {
    params: EdgeDetectorParams,
    analyzer: FrameAnalyzer,
    state: DetectorState,
    session: Option<Session>,
    consecutive_worthy: u32,
}

impl CylinderEdgeDetector {
    pub fn new(params: EdgeDetectorParams) -> Self {
        Self {
            params,
            analyzer: FrameAnalyzer::new(),
            state: DetectorState::Idle,
            session: None,
            consecutive_worthy: 0,
        }
    }

    /// Pre-size the scratch buffer for the video resolution. Sizes above
    /// [`MAX_FRAME_PIXELS`] are ignored; the buffer then grows on first use.
    pub fn with_frame_size(mut self, width: usize, height: usize) -> Self {
        match width.checked_mul(height) {
            Some(pixels) if pixels <= MAX_FRAME_PIXELS => {
                self.analyzer = FrameAnalyzer::with_dims(width, height);
            }
            _ => log::warn!("frame size {width}x{height} not pre-allocated; exceeds limit"),
        }
        self
    }

    pub fn params(&self) -> &EdgeDetectorParams {
        &self.params
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// True while the host timer should keep calling `tick`.
    pub fn is_running(&self) -> bool {
        self.state != DetectorState::Idle
    }

    /// Arm the detector on a frame source.
    pub fn start(
        &mut self,
        source: impl FrameSource + Send + 'static,
        listener: impl CaptureListener + Send + 'static,
    ) -> Result<(), EdgeDetectError> {
        if self.is_running() {
            return Err(EdgeDetectError::AlreadyRunning);
        }
        self.params.validate()?;
        self.session = Some(Session {
            source: Box::new(source),
            listener: Box::new(listener),
        });
        self.state = DetectorState::Armed;
        self.consecutive_worthy = 0;
        log::info!(
            "edge detector armed (target {:.1}±{:.1} cm)",
            self.params.target_distance_cm,
            self.params.distance_tolerance_cm
        );
        Ok(())
    }

    /// Stop and drop the session. Idempotent.
    pub fn stop(&mut self) {
        if self.session.take().is_some() {
            log::info!("edge detector stopped");
        }
        self.state = DetectorState::Idle;
        self.consecutive_worthy = 0;
    }

    /// Clear the capture guard and return to idle; `start` re-arms.
    pub fn reset(&mut self) {
        if self.state == DetectorState::Captured {
            log::debug!("capture guard cleared");
        }
        self.stop();
    }

    /// Analyze one frame without touching the session state.
    pub fn analyze_frame(&mut self, frame: &FrameView<'_>) -> EdgeDetectionResult {
        analyze_or_zero(&mut self.analyzer, frame, &self.params)
    }

    /// One polling step. Never panics on frame problems; a missing or
    /// malformed frame yields a zero-confidence result.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    pub fn tick(&mut self) -> TickOutcome {
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Idle;
        };

        let result = match session.source.current_frame() {
            Ok(frame) => analyze_or_zero(&mut self.analyzer, &frame, &self.params),
            Err(err) => {
                log::debug!("tick without frame: {err}");
                EdgeDetectionResult::zero_confidence()
            }
        };

        session.listener.on_edge_update(&result);
        if result.has_width() {
            session.listener.on_distance_update(result.estimated_distance_cm);
        }

        if self.state != DetectorState::Armed {
            return TickOutcome::Analyzed(result);
        }

        if self.params.is_capture_worthy(&result) {
            self.consecutive_worthy = self.consecutive_worthy.saturating_add(1);
        } else {
            self.consecutive_worthy = 0;
        }

        if self.consecutive_worthy >= self.params.stable_ticks.max(1) {
            self.state = DetectorState::Captured;
            log::info!(
                "auto-capture: distance {:.1} cm, confidence {:.2}, alignment {:.2}",
                result.estimated_distance_cm,
                result.confidence,
                result.edge_alignment_quality
            );
            session.listener.on_ready(&result);
            return TickOutcome::Captured(result);
        }

        TickOutcome::Analyzed(result)
    }
}

fn analyze_or_zero(
    analyzer: &mut FrameAnalyzer,
    frame: &FrameView<'_>,
    params: &EdgeDetectorParams,
) -> EdgeDetectionResult {
    match analyzer.analyze(frame, params) {
        Ok(r) => r,
        Err(err) => {
            log::warn!("frame skipped: {err}");
            EdgeDetectionResult::zero_confidence()
        }
    }
}

impl Default for CylinderEdgeDetector {
    fn default() -> Self {
        Self::new(EdgeDetectorParams::default())
    }
}
