use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, OrientError};

/// Point in the cylinder's local frame, in centimeters.
///
/// `x`/`y` span the core cross-section, `z` runs along the core axis with 0 at
/// the shallow end of the scene.
pub type CorePoint = Point3<f64>;

/// Axis of the local core frame.
pub const CORE_AXIS: Vector3<f64> = Vector3::new(0.0, 0.0, 1.0);

/// Physical core geometry used to validate picked points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoreCylinder {
    /// Core radius, cm. The default is NQ core (47.6 mm diameter).
    pub radius: f64,
    /// Allowed radial deviation of a picked point from `radius`, cm.
    pub surface_tolerance: f64,
    /// Length of one scene along the axis, cm.
    pub scene_length: f64,
}

impl Default for CoreCylinder {
    fn default() -> Self {
        Self {
            radius: 2.38,
            surface_tolerance: 0.25,
            scene_length: 30.0,
        }
    }
}

impl CoreCylinder {
    /// Distance of `p` from the core axis.
    #[inline]
    pub fn radial_distance(p: &CorePoint) -> f64 {
        p.x.hypot(p.y)
    }
}

/// Borehole attitude.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrillHoleOrientation {
    /// Degrees clockwise from North, `[0, 360)`.
    pub azimuth: f64,
    /// Degrees from horizontal, `[-90, 0]`, negative downward.
    pub dip: f64,
}

impl DrillHoleOrientation {
    /// Validated constructor. The azimuth is wrapped into `[0, 360)`.
    pub fn new(azimuth: f64, dip: f64) -> Result<Self, OrientError> {
        let azimuth = ensure_finite(azimuth, "hole azimuth")?;
        let dip = ensure_finite(dip, "hole dip")?;
        if !(-90.0..=0.0).contains(&dip) {
            return Err(OrientError::HoleDipOutOfRange { dip });
        }
        Ok(Self {
            azimuth: crate::normalize_360(azimuth),
            dip,
        })
    }

    /// Re-run the constructor checks on a value built from public fields
    /// (e.g. deserialized).
    pub fn validated(self) -> Result<Self, OrientError> {
        Self::new(self.azimuth, self.dip)
    }

    pub const VERTICAL_DOWN: DrillHoleOrientation = DrillHoleOrientation {
        azimuth: 0.0,
        dip: -90.0,
    };
}

/// Real-world anchor of a borehole.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CollarPosition {
    pub utm_east: f64,
    pub utm_north: f64,
    pub elevation: f64,
}

impl CollarPosition {
    pub fn new(utm_east: f64, utm_north: f64, elevation: f64) -> Self {
        Self {
            utm_east,
            utm_north,
            elevation,
        }
    }
}

/// Global plane orientation in geological convention.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RealOrientation {
    /// `[0, 90]` degrees.
    pub dip: f64,
    /// `[0, 360)` degrees clockwise from North.
    pub dip_direction: f64,
}

/// Absolute position of a measurement along the hole trajectory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialPosition {
    pub east: f64,
    pub north: f64,
    pub elevation: f64,
}
