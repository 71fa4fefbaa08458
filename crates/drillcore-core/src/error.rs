/// Errors returned by the orientation geometry engine.
///
/// Every geometry entry point either returns a finite result or one of these
/// variants; no operation signals failure through a NaN value.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OrientError {
    #[error("points are collinear or duplicated (|v1 x v2| = {cross_norm:.3e})")]
    DegeneratePlane { cross_norm: f64 },

    #[error("point {index} lies {radial_distance:.3} from the axis, expected radius {radius:.3}")]
    PointOffSurface {
        index: usize,
        radial_distance: f64,
        radius: f64,
    },

    #[error("non-finite input: {what}")]
    NonFinite { what: &'static str },

    #[error("alpha {alpha} is outside [0, 90] degrees")]
    AlphaOutOfRange { alpha: f64 },

    #[error("hole dip {dip} is outside [-90, 0] degrees")]
    HoleDipOutOfRange { dip: f64 },

    #[error("invalid BOH config: {field} = {value}")]
    InvalidBohConfig { field: &'static str, value: f64 },

    #[error("trajectory sampling interval must be positive (got {interval})")]
    InvalidInterval { interval: f64 },

    #[error("trajectory would yield {requested:.0} samples, limit is {limit}")]
    TooManySamples { requested: f64, limit: u64 },
}

pub(crate) fn ensure_finite(value: f64, what: &'static str) -> Result<f64, OrientError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(OrientError::NonFinite { what })
    }
}
