//! Plane normal from three points picked on the core surface.

use nalgebra::{Unit, Vector3};

use crate::error::OrientError;
use crate::types::{CoreCylinder, CorePoint, CORE_AXIS};

/// Below this `|v1 x v2|` the three points are treated as collinear.
pub const DEGENERATE_EPS: f64 = 1e-9;

/// Unit plane normal in the local core frame, oriented so that its axial
/// component is non-negative.
pub type UnitNormal = Unit<Vector3<f64>>;

/// Fit the plane through `p1`, `p2`, `p3` and return its unit normal.
///
/// The sign is chosen so that `n · axis >= 0`. Collinear or duplicated points
/// yield [`OrientError::DegeneratePlane`].
pub fn fit_plane(
    p1: &CorePoint,
    p2: &CorePoint,
    p3: &CorePoint,
) -> Result<UnitNormal, OrientError> {
    for p in [p1, p2, p3] {
        if !p.coords.iter().all(|c| c.is_finite()) {
            return Err(OrientError::NonFinite {
                what: "plane point",
            });
        }
    }

    let v1 = p2 - p1;
    let v2 = p3 - p1;
    let n = v1.cross(&v2);
    let m = n.norm();
    if m < DEGENERATE_EPS {
        return Err(OrientError::DegeneratePlane { cross_norm: m });
    }

    let n = n / m;
    let n = if n.dot(&CORE_AXIS) < 0.0 { -n } else { n };
    Ok(Unit::new_unchecked(n))
}

/// Three points tracing one structural plane on the core surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointTrio {
    points: [CorePoint; 3],
    normal: UnitNormal,
}

impl PointTrio {
    /// Validate that the points span a plane and sit on the core's lateral
    /// surface.
    pub fn new(points: [CorePoint; 3], cylinder: &CoreCylinder) -> Result<Self, OrientError> {
        for (index, p) in points.iter().enumerate() {
            let radial_distance = CoreCylinder::radial_distance(p);
            if !radial_distance.is_finite() || !p.z.is_finite() {
                return Err(OrientError::NonFinite {
                    what: "plane point",
                });
            }
            if (radial_distance - cylinder.radius).abs() > cylinder.surface_tolerance {
                return Err(OrientError::PointOffSurface {
                    index,
                    radial_distance,
                    radius: cylinder.radius,
                });
            }
        }
        Self::unchecked_surface(points)
    }

    /// Build without the surface check. Collinearity is still rejected.
    pub fn unchecked_surface(points: [CorePoint; 3]) -> Result<Self, OrientError> {
        let normal = fit_plane(&points[0], &points[1], &points[2])?;
        Ok(Self { points, normal })
    }

    pub fn points(&self) -> &[CorePoint; 3] {
        &self.points
    }

    pub fn normal(&self) -> UnitNormal {
        self.normal
    }

    /// Mean axial position of the three points, cm from the scene's shallow end.
    pub fn mean_depth(&self) -> f64 {
        self.points.iter().map(|p| p.z).sum::<f64>() / 3.0
    }
}
