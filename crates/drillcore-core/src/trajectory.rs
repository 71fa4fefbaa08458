//! Straight-line hole trajectory.
//!
//! Depth and collar must share units; nothing here converts them.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, OrientError};
use crate::types::{CollarPosition, DrillHoleOrientation, SpatialPosition};

/// Offset (east, north, vertical) of a point `depth` along the hole.
#[inline]
fn offset_along_hole(depth: f64, hole: &DrillHoleOrientation) -> (f64, f64, f64) {
    let (sin_dip, cos_dip) = hole.dip.to_radians().sin_cos();
    let (sin_az, cos_az) = hole.azimuth.to_radians().sin_cos();
    let horizontal = depth * cos_dip;
    let vertical = depth * sin_dip;
    (horizontal * sin_az, horizontal * cos_az, vertical)
}

/// Absolute position `depth` along a hole starting at `collar`.
pub fn to_spatial_position(
    collar: &CollarPosition,
    depth: f64,
    hole_azimuth_deg: f64,
    hole_dip_deg: f64,
) -> Result<SpatialPosition, OrientError> {
    let hole = DrillHoleOrientation::new(hole_azimuth_deg, hole_dip_deg)?;
    position_along(collar, &hole, depth)
}

/// Same as [`to_spatial_position`] for an already validated hole.
pub fn position_along(
    collar: &CollarPosition,
    hole: &DrillHoleOrientation,
    depth: f64,
) -> Result<SpatialPosition, OrientError> {
    ensure_finite(depth, "depth along hole")?;
    for (v, what) in [
        (collar.utm_east, "collar east"),
        (collar.utm_north, "collar north"),
        (collar.elevation, "collar elevation"),
    ] {
        ensure_finite(v, what)?;
    }
    let (east, north, vertical) = offset_along_hole(depth, hole);
    Ok(SpatialPosition {
        east: collar.utm_east + east,
        north: collar.utm_north + north,
        elevation: collar.elevation + vertical,
    })
}

/// One sample of a trajectory trace.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub depth: f64,
    pub position: SpatialPosition,
}

/// Upper bound on the number of samples one [`trajectory`] call may yield.
pub const MAX_TRAJECTORY_SAMPLES: u64 = 1_000_000;

/// Lazy, finite trace from the collar to `max_depth` every `interval`.
///
/// The first sample is the collar itself; the last is exactly `max_depth`
/// even when it is not a multiple of `interval`. Requests that would exceed
/// [`MAX_TRAJECTORY_SAMPLES`] are rejected.
pub fn trajectory(
    collar: CollarPosition,
    hole: DrillHoleOrientation,
    interval: f64,
    max_depth: f64,
) -> Result<impl Iterator<Item = TrajectorySample>, OrientError> {
    if !(interval.is_finite() && interval > 0.0) {
        return Err(OrientError::InvalidInterval { interval });
    }
    let max_depth = ensure_finite(max_depth, "trajectory max depth")?.max(0.0);
    let hole = hole.validated()?;
    // Validates the collar once so the iterator can stay infallible.
    position_along(&collar, &hole, 0.0)?;

    let ratio = (max_depth / interval).floor();
    // One extra sample for the collar, one for a possible tail.
    if ratio + 2.0 > MAX_TRAJECTORY_SAMPLES as f64 {
        return Err(OrientError::TooManySamples {
            requested: ratio + 1.0,
            limit: MAX_TRAJECTORY_SAMPLES,
        });
    }
    let steps = ratio as u64;
    let last_regular = steps as f64 * interval;
    let tail = (max_depth - last_regular > interval * 1e-9).then_some(max_depth);

    let sample = move |depth: f64| {
        let (east, north, vertical) = offset_along_hole(depth, &hole);
        TrajectorySample {
            depth,
            position: SpatialPosition {
                east: collar.utm_east + east,
                north: collar.utm_north + north,
                elevation: collar.elevation + vertical,
            },
        }
    };

    Ok((0..=steps)
        .map(move |k| k as f64 * interval)
        .chain(tail)
        .map(sample))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_position(p: SpatialPosition, east: f64, north: f64, elevation: f64, tol: f64) {
        assert_abs_diff_eq!(p.east, east, epsilon = tol);
        assert_abs_diff_eq!(p.north, north, epsilon = tol);
        assert_abs_diff_eq!(p.elevation, elevation, epsilon = tol);
    }

    #[test]
    fn vertical_hole_goes_straight_down() {
        let p = to_spatial_position(&CollarPosition::default(), 100.0, 0.0, -90.0).expect("pos");
        assert_position(p, 0.0, 0.0, -100.0, 1e-9);
    }

    #[test]
    fn horizontal_east_hole() {
        let p = to_spatial_position(&CollarPosition::default(), 100.0, 90.0, 0.0).expect("pos");
        assert_position(p, 100.0, 0.0, 0.0, 1e-9);
    }

    #[test]
    fn inclined_hole_known_case() {
        let p = to_spatial_position(&CollarPosition::default(), 100.0, 60.0, -60.0).expect("pos");
        assert_position(p, 43.3, 25.0, -86.6, 0.1);
    }

    #[test]
    fn collar_offsets_the_result_in_any_unit() {
        let collar = CollarPosition::new(512_000.0, 7_140_000.0, 320.0);
        let meters = to_spatial_position(&collar, 1.5, 0.0, -90.0).expect("pos");
        assert_position(meters, 512_000.0, 7_140_000.0, 318.5, 1e-6);

        let collar_cm = CollarPosition::new(0.0, 0.0, 32_000.0);
        let cm = to_spatial_position(&collar_cm, 150.0, 0.0, -90.0).expect("pos");
        assert_abs_diff_eq!(cm.elevation, 31_850.0, epsilon = 1e-6);
    }

    #[test]
    fn upward_dip_is_rejected() {
        assert!(matches!(
            to_spatial_position(&CollarPosition::default(), 10.0, 0.0, 15.0),
            Err(OrientError::HoleDipOutOfRange { .. })
        ));
    }

    #[test]
    fn trajectory_samples_include_both_ends() {
        let hole = DrillHoleOrientation::new(0.0, -90.0).expect("hole");
        let samples: Vec<_> = trajectory(CollarPosition::default(), hole, 10.0, 25.0)
            .expect("trajectory")
            .collect();
        let depths: Vec<f64> = samples.iter().map(|s| s.depth).collect();
        assert_eq!(depths, vec![0.0, 10.0, 20.0, 25.0]);
        assert_abs_diff_eq!(samples[3].position.elevation, -25.0, epsilon = 1e-9);
    }

    #[test]
    fn trajectory_exact_multiple_has_no_duplicate_tail() {
        let hole = DrillHoleOrientation::new(45.0, -45.0).expect("hole");
        let n = trajectory(CollarPosition::default(), hole, 5.0, 20.0)
            .expect("trajectory")
            .count();
        assert_eq!(n, 5);
    }

    #[test]
    fn trajectory_rejects_non_positive_interval() {
        let hole = DrillHoleOrientation::VERTICAL_DOWN;
        assert!(matches!(
            trajectory(CollarPosition::default(), hole, 0.0, 10.0),
            Err(OrientError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn oversized_trajectory_is_rejected() {
        let hole = DrillHoleOrientation::VERTICAL_DOWN;
        let err = trajectory(CollarPosition::default(), hole, 1.0, 1e30)
            .err()
            .expect("too many samples");
        assert!(matches!(
            err,
            OrientError::TooManySamples {
                limit: MAX_TRAJECTORY_SAMPLES,
                ..
            }
        ));

        let at_limit = (MAX_TRAJECTORY_SAMPLES - 2) as f64;
        let n = trajectory(CollarPosition::default(), hole, 1.0, at_limit)
            .expect("within limit")
            .count();
        assert_eq!(n as u64, MAX_TRAJECTORY_SAMPLES - 1);
    }
}
