use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use drillcore_core::FrameView;
use drillcore_edge::{
    Callbacks, CaptureListener, CylinderEdgeDetector, DetectorState, EdgeDetectError,
    EdgeDetectionResult, EdgeDetectorParams, FrameSource, SharedEdgeDetector, TickOutcome,
};

const W: usize = 200;
const H: usize = 120;

/// White RGBA frame with a black core spanning columns `[x0, x1)`.
fn core_frame(x0: usize, x1: usize) -> Vec<u8> {
    let mut data = vec![255u8; W * H * 4];
    for y in 0..H {
        for x in x0..x1 {
            let o = (y * W + x) * 4;
            data[o..o + 3].fill(0);
        }
    }
    data
}

/// Replays frames in order, then keeps returning the last one.
struct Approach {
    frames: Vec<Vec<u8>>,
    next: usize,
}

impl Approach {
    /// Core twice as far as the target for `far_ticks`, then at the target.
    fn new(far_ticks: usize) -> Self {
        let mut frames = vec![core_frame(81, 121); far_ticks];
        frames.push(core_frame(51, 131));
        Self { frames, next: 0 }
    }
}

impl FrameSource for Approach {
    fn current_frame(&mut self) -> Result<FrameView<'_>, EdgeDetectError> {
        let idx = self.next.min(self.frames.len() - 1);
        self.next += 1;
        Ok(FrameView::rgba(W, H, &self.frames[idx]))
    }
}

#[derive(Default)]
struct Log {
    ready: Vec<EdgeDetectionResult>,
    distances: Vec<f64>,
    edge_updates: usize,
}

struct Recorder(Arc<Mutex<Log>>);

impl CaptureListener for Recorder {
    fn on_ready(&mut self, result: &EdgeDetectionResult) {
        self.0.lock().unwrap().ready.push(result.clone());
    }

    fn on_distance_update(&mut self, distance_cm: f64) {
        self.0.lock().unwrap().distances.push(distance_cm);
    }

    fn on_edge_update(&mut self, _result: &EdgeDetectionResult) {
        self.0.lock().unwrap().edge_updates += 1;
    }
}

#[test]
fn approaching_core_reports_distance_then_captures_once() {
    let _ = env_logger::builder().is_test(true).try_init();
    let log = Arc::new(Mutex::new(Log::default()));
    let mut det = CylinderEdgeDetector::default();
    det.start(Approach::new(2), Recorder(Arc::clone(&log)))
        .expect("start");

    assert!(matches!(det.tick(), TickOutcome::Analyzed(_)));
    assert!(matches!(det.tick(), TickOutcome::Analyzed(_)));
    let TickOutcome::Captured(captured) = det.tick() else {
        panic!("third tick should capture");
    };
    assert!(captured.distance_in_range);
    det.tick();

    let log = log.lock().unwrap();
    assert_eq!(log.ready.len(), 1);
    assert_eq!(log.ready[0], captured);
    assert_eq!(log.edge_updates, 4);
    assert_eq!(log.distances.len(), 4);
    assert_abs_diff_eq!(log.distances[0], 52.0, epsilon = 1e-9);
    assert_abs_diff_eq!(log.distances[2], 26.0, epsilon = 1e-9);
}

#[test]
fn blank_frames_produce_no_distance_updates() {
    struct Blank(Vec<u8>);
    impl FrameSource for Blank {
        fn current_frame(&mut self) -> Result<FrameView<'_>, EdgeDetectError> {
            Ok(FrameView::gray(W, H, &self.0))
        }
    }

    let log = Arc::new(Mutex::new(Log::default()));
    let mut det = CylinderEdgeDetector::default();
    det.start(Blank(vec![90u8; W * H]), Recorder(Arc::clone(&log)))
        .expect("start");
    for _ in 0..3 {
        let outcome = det.tick();
        assert_eq!(outcome.result().map(|r| r.confidence), Some(0.0));
    }
    let log = log.lock().unwrap();
    assert!(log.distances.is_empty());
    assert_eq!(log.edge_updates, 3);
    assert!(log.ready.is_empty());
}

#[test]
fn malformed_frame_does_not_stop_the_session() {
    struct Truncated;
    impl FrameSource for Truncated {
        fn current_frame(&mut self) -> Result<FrameView<'_>, EdgeDetectError> {
            Ok(FrameView::rgba(W, H, &[0u8; 16]))
        }
    }

    let mut det = CylinderEdgeDetector::default();
    det.start(Truncated, Callbacks::new(|_| {})).expect("start");
    let outcome = det.tick();
    assert_eq!(outcome.result(), Some(&EdgeDetectionResult::zero_confidence()));
    assert!(det.is_running());
}

#[test]
fn overlapping_tick_is_skipped() {
    let shared = SharedEdgeDetector::new(CylinderEdgeDetector::default());
    shared
        .start(Approach::new(0), Callbacks::new(|_| {}))
        .expect("start");

    shared.with_detector(|_held| {
        let other = shared.clone();
        let outcome = thread::spawn(move || other.try_tick())
            .join()
            .expect("tick thread");
        assert_eq!(outcome, TickOutcome::Skipped);
    });

    assert!(matches!(shared.try_tick(), TickOutcome::Captured(_)));
    assert_eq!(shared.state(), DetectorState::Captured);
}

#[test]
fn timer_thread_drives_capture() {
    let shared = SharedEdgeDetector::new(CylinderEdgeDetector::default().with_frame_size(W, H));
    let captures = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&captures);
    shared
        .start(
            Approach::new(3),
            Callbacks::new(move |_| *counter.lock().unwrap() += 1),
        )
        .expect("start");

    let timer = {
        let shared = shared.clone();
        thread::spawn(move || {
            for _ in 0..10 {
                shared.try_tick();
            }
        })
    };
    timer.join().expect("timer thread");

    assert_eq!(*captures.lock().unwrap(), 1);
    assert_eq!(shared.state(), DetectorState::Captured);

    shared.reset();
    assert!(!shared.is_running());
    assert_eq!(shared.try_tick(), TickOutcome::Idle);
}

/// Tick on a helper thread so a deadlock fails the test instead of hanging it.
fn tick_with_deadline(shared: &SharedEdgeDetector) -> TickOutcome {
    let (tx, rx) = mpsc::channel();
    let ticker = shared.clone();
    thread::spawn(move || {
        let _ = tx.send(ticker.try_tick());
    });
    rx.recv_timeout(Duration::from_secs(5))
        .expect("tick returned without deadlocking")
}

#[test]
fn stop_from_ready_callback_is_applied_after_the_tick() {
    let shared = SharedEdgeDetector::new(CylinderEdgeDetector::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handle = shared.clone();
    let record = Arc::clone(&seen);
    shared
        .start(
            Approach::new(0),
            Callbacks::new(move |_| {
                handle.stop();
                record.lock().unwrap().push(handle.state());
                record.lock().unwrap().push(if handle.is_running() {
                    DetectorState::Armed
                } else {
                    DetectorState::Idle
                });
            }),
        )
        .expect("start");

    assert!(matches!(tick_with_deadline(&shared), TickOutcome::Captured(_)));
    assert_eq!(*seen.lock().unwrap(), vec![DetectorState::Idle; 2]);
    assert_eq!(shared.state(), DetectorState::Idle);
    assert_eq!(tick_with_deadline(&shared), TickOutcome::Idle);
}

#[test]
fn reset_from_edge_callback_ends_the_session() {
    let shared = SharedEdgeDetector::new(CylinderEdgeDetector::default());
    let handle = shared.clone();
    let restart = shared.clone();
    let restart_result = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&restart_result);
    shared
        .start(
            Approach::new(5),
            Callbacks::new(|_| {}).on_edge_update(move |_| {
                handle.reset();
                let again = restart.start(Approach::new(0), Callbacks::new(|_| {}));
                *slot.lock().unwrap() = Some(again);
            }),
        )
        .expect("start");

    assert!(matches!(tick_with_deadline(&shared), TickOutcome::Analyzed(_)));
    assert_eq!(
        *restart_result.lock().unwrap(),
        Some(Err(EdgeDetectError::AlreadyRunning))
    );
    assert!(!shared.is_running());

    shared
        .start(Approach::new(0), Callbacks::new(|_| {}))
        .expect("restart after the tick");
    assert!(matches!(tick_with_deadline(&shared), TickOutcome::Captured(_)));
}

#[test]
fn invalid_params_are_rejected_at_start() {
    let params = EdgeDetectorParams {
        distance_tolerance_cm: -1.0,
        ..EdgeDetectorParams::default()
    };
    let mut det = CylinderEdgeDetector::new(params);
    let err = det
        .start(Approach::new(0), Callbacks::new(|_| {}))
        .unwrap_err();
    assert_eq!(
        err,
        EdgeDetectError::InvalidParams {
            field: "distance_tolerance_cm"
        }
    );
    assert_eq!(det.state(), DetectorState::Idle);
    assert_eq!(det.tick(), TickOutcome::Idle);
}

#[test]
fn params_from_json_are_validated() {
    let params: EdgeDetectorParams =
        serde_json::from_str(r#"{ "ready_confidence": 1.5 }"#).expect("params json");
    assert_eq!(
        params.validate(),
        Err(EdgeDetectError::InvalidParams {
            field: "ready_confidence"
        })
    );
    assert_eq!(EdgeDetectorParams::default().validate(), Ok(()));
}

#[test]
fn params_fill_missing_fields_from_defaults() {
    let params: EdgeDetectorParams =
        serde_json::from_str(r#"{ "stable_ticks": 2, "gradient_threshold": 30.0 }"#)
            .expect("params json");
    assert_eq!(params.stable_ticks, 2);
    assert_eq!(params.gradient_threshold, 30.0);
    assert_eq!(params.target_distance_cm, 26.0);
    assert_eq!(params.weights, EdgeDetectorParams::default().weights);
}
