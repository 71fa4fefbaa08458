/// Errors raised around the edge detector.
///
/// Frame problems are absorbed by a tick (they yield a zero-confidence
/// result); only session management surfaces errors to the host.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EdgeDetectError {
    #[error("no frame available from the source")]
    FrameUnavailable,
    #[error("invalid frame buffer (expected {expected} bytes, got {got})")]
    InvalidFrame { expected: usize, got: usize },
    #[error("frame too small for edge analysis ({width}x{height})")]
    FrameTooSmall { width: usize, height: usize },
    #[error("detector is already running; stop or reset it first")]
    AlreadyRunning,
    #[error("invalid detector parameter `{field}`")]
    InvalidParams { field: &'static str },
}
