use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use crate::detector::{
    CaptureListener, CylinderEdgeDetector, DetectorState, FrameSource, TickOutcome,
};
use crate::error::EdgeDetectError;

/// Cloneable handle for hosts whose timer may fire on another thread.
///
/// A tick that finds the previous one still running is skipped instead of
/// queued, so slow frames never pile up.
///
/// Listener callbacks run while the tick holds the detector. From inside a
/// callback, [`stop`](Self::stop) and [`reset`](Self::reset) are deferred
/// until the tick returns, and [`state`](Self::state) reads a mirror instead
/// of the detector. [`with_detector`](Self::with_detector) must not be called
/// from a callback.
#[derive(Clone)]
pub struct SharedEdgeDetector {
    inner: Arc<Mutex<CylinderEdgeDetector>>,
    control: Arc<Control>,
}

#[derive(Default)]
struct Control {
    /// A tick holds the detector and may be running callbacks.
    ticking: AtomicBool,
    /// Stop requested while ticking; applied by the next lock holder.
    halt: AtomicBool,
    /// Last published [`DetectorState`].
    state: AtomicU8,
}

impl Control {
    fn publish(&self, state: DetectorState) {
        let code = match state {
            DetectorState::Idle => 0,
            DetectorState::Armed => 1,
            DetectorState::Captured => 2,
        };
        self.state.store(code, Ordering::Release);
    }

    fn published(&self) -> DetectorState {
        match self.state.load(Ordering::Acquire) {
            1 => DetectorState::Armed,
            2 => DetectorState::Captured,
            _ => DetectorState::Idle,
        }
    }

    /// Apply a deferred stop, if any, and publish the resulting state.
    fn settle(&self, det: &mut CylinderEdgeDetector) {
        if self.halt.swap(false, Ordering::AcqRel) {
            log::debug!("applying stop requested during tick");
            det.reset();
        }
        self.publish(det.state());
    }
}

impl SharedEdgeDetector {
    pub fn new(detector: CylinderEdgeDetector) -> Self {
        let control = Control::default();
        control.publish(detector.state());
        Self {
            inner: Arc::new(Mutex::new(detector)),
            control: Arc::new(control),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CylinderEdgeDetector> {
        let mut det = self.inner.lock().unwrap_or_else(|poisoned| {
            log::warn!("edge detector lock poisoned; recovering");
            poisoned.into_inner()
        });
        self.control.settle(&mut det);
        det
    }

    /// Non-blocking tick. Returns [`TickOutcome::Skipped`] while another
    /// thread holds the detector.
    pub fn try_tick(&self) -> TickOutcome {
        let mut det = match self.inner.try_lock() {
            Ok(det) => det,
            Err(TryLockError::WouldBlock) => {
                log::trace!("tick skipped; previous tick still running");
                return TickOutcome::Skipped;
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        self.control.settle(&mut det);
        if !det.is_running() {
            return TickOutcome::Idle;
        }

        self.control.ticking.store(true, Ordering::Release);
        let outcome = det.tick();
        self.control.ticking.store(false, Ordering::Release);

        self.control.settle(&mut det);
        outcome
    }

    /// Fails with [`EdgeDetectError::AlreadyRunning`] when called from a
    /// callback.
    pub fn start(
        &self,
        source: impl FrameSource + Send + 'static,
        listener: impl CaptureListener + Send + 'static,
    ) -> Result<(), EdgeDetectError> {
        if self.control.ticking.load(Ordering::Acquire) {
            return Err(EdgeDetectError::AlreadyRunning);
        }
        let mut det = self.lock();
        let started = det.start(source, listener);
        self.control.publish(det.state());
        started
    }

    pub fn stop(&self) {
        self.halt();
    }

    pub fn reset(&self) {
        self.halt();
    }

    fn halt(&self) {
        if self.control.ticking.load(Ordering::Acquire) {
            self.control.halt.store(true, Ordering::Release);
            return;
        }
        // `lock` settles, so a halt raised just as a tick ended is not lost.
        let mut det = self.lock();
        det.reset();
        self.control.publish(det.state());
    }

    /// While a tick is in flight this is the state the tick started from,
    /// or `Idle` once a stop is pending.
    pub fn state(&self) -> DetectorState {
        if self.control.halt.load(Ordering::Acquire) {
            return DetectorState::Idle;
        }
        self.control.published()
    }

    pub fn is_running(&self) -> bool {
        self.state() != DetectorState::Idle
    }

    /// Run `f` with exclusive access to the detector.
    pub fn with_detector<R>(&self, f: impl FnOnce(&mut CylinderEdgeDetector) -> R) -> R {
        let mut det = self.lock();
        let out = f(&mut det);
        self.control.publish(det.state());
        out
    }
}

impl From<CylinderEdgeDetector> for SharedEdgeDetector {
    fn from(detector: CylinderEdgeDetector) -> Self {
        Self::new(detector)
    }
}
