//! Plane orientation in the core's own frame (alpha/beta).
//!
//! Conventions:
//! - the core axis is local `+Z`;
//! - `alpha` is the angle between the plane normal and the axis, so `0` is a
//!   cut perpendicular to the core and `90` a plane containing the axis;
//! - the in-plane azimuth of the normal is `atan2(nx, ny)`;
//! - `beta = azimuth - (boh - 90)`, so `beta = 0` puts the dip direction on the
//!   BOH line.

use nalgebra::{Unit, Vector3};
use serde::{Deserialize, Serialize};

use crate::angles::normalize_360;
use crate::error::{ensure_finite, OrientError};
use crate::plane::UnitNormal;

/// Horizontal normal component below which the azimuth is undefined.
pub const AZIMUTH_EPS: f64 = 1e-9;

/// Alpha/beta pair for one structure.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalOrientation {
    /// Degrees in `[0, 90]`.
    pub alpha: f64,
    /// Degrees in `[0, 360)`, clockwise from the active BOH line.
    pub beta: f64,
    /// Set when the normal is parallel to the axis; `beta` is then `0`.
    #[serde(default)]
    pub azimuth_indeterminate: bool,
}

impl LocalOrientation {
    /// Store an alpha/beta pair measured elsewhere (e.g. typed by the operator).
    pub fn from_angles(alpha: f64, beta: f64) -> Result<Self, OrientError> {
        let alpha = ensure_finite(alpha, "alpha")?;
        let beta = ensure_finite(beta, "beta")?;
        if !(0.0..=90.0).contains(&alpha) {
            return Err(OrientError::AlphaOutOfRange { alpha });
        }
        let azimuth_indeterminate = alpha.to_radians().sin() < AZIMUTH_EPS;
        Ok(Self {
            alpha,
            beta: if azimuth_indeterminate {
                0.0
            } else {
                normalize_360(beta)
            },
            azimuth_indeterminate,
        })
    }

    /// Rebuild the local unit normal for the BOH angle `beta` was measured
    /// against.
    pub fn local_normal(&self, boh_angle_deg: f64) -> UnitNormal {
        let azimuth = (self.beta + (boh_angle_deg - 90.0)).to_radians();
        let (sin_a, cos_a) = self.alpha.to_radians().sin_cos();
        let (sin_az, cos_az) = azimuth.sin_cos();
        Unit::new_normalize(Vector3::new(sin_a * sin_az, sin_a * cos_az, cos_a))
    }
}

/// Express `normal` as alpha/beta relative to `boh_angle_deg`.
pub fn decompose_local(
    normal: &Vector3<f64>,
    boh_angle_deg: f64,
) -> Result<LocalOrientation, OrientError> {
    ensure_finite(boh_angle_deg, "BOH angle")?;
    let len = normal.norm();
    if !len.is_finite() || len < AZIMUTH_EPS {
        return Err(OrientError::NonFinite {
            what: "plane normal",
        });
    }
    let n = normal / len;
    // Same plane either way; keep the upper-hemisphere representative.
    let n = if n.z < 0.0 { -n } else { n };

    let alpha = n.z.abs().clamp(-1.0, 1.0).acos().to_degrees();
    if n.x.hypot(n.y) < AZIMUTH_EPS {
        log::trace!("normal parallel to core axis, azimuth indeterminate");
        return Ok(LocalOrientation {
            alpha: 0.0,
            beta: 0.0,
            azimuth_indeterminate: true,
        });
    }

    let azimuth = normalize_360(n.x.atan2(n.y).to_degrees());
    let beta = normalize_360(azimuth - (boh_angle_deg - 90.0));
    Ok(LocalOrientation {
        alpha,
        beta,
        azimuth_indeterminate: false,
    })
}
