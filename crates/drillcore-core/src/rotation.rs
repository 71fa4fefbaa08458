//! Local core frame -> global East/North/Up frame.
//!
//! The rotation is built from the hole attitude as
//!
//! ```text
//! d = radians(-dip)
//! R = [[cos(az)cos(d), -sin(az), cos(az)sin(d)],
//!      [sin(az)cos(d),  cos(az), sin(az)sin(d)],
//!      [-sin(d),        0,       cos(d)       ]]
//! ```
//!
//! Real dip is taken as `asin(|gz|)` of the rotated normal. The local
//! decomposition uses `acos(|nz|)` for alpha; the two conventions differ on
//! purpose and must stay paired with this matrix.

use nalgebra::{Matrix3, Vector3};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::angles::normalize_360;
use crate::error::{ensure_finite, OrientError};
use crate::local::LocalOrientation;
use crate::types::{DrillHoleOrientation, RealOrientation};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrillHoleRotation {
    pub r: Matrix3<f64>,
}

impl DrillHoleRotation {
    pub fn new(hole: &DrillHoleOrientation) -> Self {
        let (sin_az, cos_az) = hole.azimuth.to_radians().sin_cos();
        let (sin_d, cos_d) = (-hole.dip).to_radians().sin_cos();
        Self {
            r: Matrix3::new(
                cos_az * cos_d, -sin_az, cos_az * sin_d, //
                sin_az * cos_d, cos_az, sin_az * sin_d, //
                -sin_d, 0.0, cos_d,
            ),
        }
    }

    #[inline]
    pub fn apply(&self, local: &Vector3<f64>) -> Vector3<f64> {
        self.r * local
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.r[(0, 0)], self.r[(0, 1)], self.r[(0, 2)]],
            [self.r[(1, 0)], self.r[(1, 1)], self.r[(1, 2)]],
            [self.r[(2, 0)], self.r[(2, 1)], self.r[(2, 2)]],
        ]
    }
}

/// Rotate a local normal into (East, North, Up).
pub fn local_to_global(normal: &Vector3<f64>, hole: &DrillHoleOrientation) -> Vector3<f64> {
    DrillHoleRotation::new(hole).apply(normal)
}

/// Dip / dip-direction of a plane given its global normal.
pub fn real_orientation_from_global(g: &Vector3<f64>) -> RealOrientation {
    let dip = g.z.abs().min(1.0).asin().to_degrees();
    let mut dip_dir = g.x.atan2(g.y);
    if g.z > 0.0 {
        // Upward normal: the plane dips the other way.
        dip_dir += std::f64::consts::PI;
    }
    RealOrientation {
        dip,
        dip_direction: normalize_360(dip_dir.to_degrees()),
    }
}

/// Global normal for an alpha/beta measurement.
pub fn global_normal(
    local: &LocalOrientation,
    boh_angle_deg: f64,
    hole: &DrillHoleOrientation,
) -> Result<Vector3<f64>, OrientError> {
    ensure_finite(boh_angle_deg, "BOH angle")?;
    let hole = hole.validated()?;
    let n = local.local_normal(boh_angle_deg);
    Ok(local_to_global(&n, &hole))
}

/// Full alpha/beta -> dip/dip-direction conversion.
#[cfg_attr(feature = "tracing", instrument(level = "debug"))]
pub fn to_real_orientation(
    alpha: f64,
    beta: f64,
    boh_angle_deg: f64,
    hole_azimuth_deg: f64,
    hole_dip_deg: f64,
) -> Result<RealOrientation, OrientError> {
    let local = LocalOrientation::from_angles(alpha, beta)?;
    let hole = DrillHoleOrientation::new(hole_azimuth_deg, hole_dip_deg)?;
    let g = global_normal(&local, boh_angle_deg, &hole)?;
    Ok(real_orientation_from_global(&g))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rotation_is_orthonormal() {
        for (az, dip) in [(0.0, -90.0), (60.0, -60.0), (237.0, -12.5), (359.0, 0.0)] {
            let hole = DrillHoleOrientation::new(az, dip).expect("hole");
            let r = DrillHoleRotation::new(&hole).r;
            let err = (r.transpose() * r - Matrix3::identity()).norm();
            assert!(err < 1e-12, "az={az} dip={dip} err={err}");
            assert_abs_diff_eq!(r.determinant(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn vertical_hole_perpendicular_cut_is_flat() {
        let ro = to_real_orientation(0.0, 0.0, 90.0, 0.0, -90.0).expect("orientation");
        assert_abs_diff_eq!(ro.dip, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn vertical_hole_axial_plane_is_vertical() {
        // Dip direction across the BOH line: local normal is +X.
        let ro = to_real_orientation(90.0, 90.0, 90.0, 0.0, -90.0).expect("orientation");
        assert_abs_diff_eq!(ro.dip, 90.0, epsilon = 1e-6);
    }

    #[test]
    fn inclined_hole_perpendicular_cut() {
        // Axis maps to (sin 60, 0, cos 60): dip 30, upward normal flips the
        // direction from 90 to 270.
        let ro = to_real_orientation(0.0, 0.0, 90.0, 0.0, -60.0).expect("orientation");
        assert_abs_diff_eq!(ro.dip, 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ro.dip_direction, 270.0, epsilon = 1e-9);
    }

    #[test]
    fn downward_normal_keeps_its_bearing() {
        let ro = real_orientation_from_global(&Vector3::new(0.0, 0.5, -0.5_f64.sqrt()));
        assert_abs_diff_eq!(ro.dip_direction, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ro.dip, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn invalid_inputs_are_typed_errors() {
        assert!(matches!(
            to_real_orientation(30.0, 0.0, 90.0, 0.0, 10.0),
            Err(OrientError::HoleDipOutOfRange { .. })
        ));
        assert!(matches!(
            to_real_orientation(30.0, 0.0, f64::INFINITY, 0.0, -45.0),
            Err(OrientError::NonFinite { .. })
        ));
        assert!(matches!(
            to_real_orientation(120.0, 0.0, 90.0, 0.0, -45.0),
            Err(OrientError::AlphaOutOfRange { .. })
        ));
    }
}
