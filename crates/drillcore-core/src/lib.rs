//! Geometry engine for oriented drill-core structure measurement.
//!
//! Everything here is pure and synchronous: three points picked on the core
//! surface (or an alpha/beta pair) plus the BOH reference angle and the hole
//! attitude become a geographic dip / dip direction and a position along the
//! hole. No function keeps shared state, so all of them may be called from
//! any thread.
//!
//! Pipeline:
//! 1. [`fit_plane`] / [`PointTrio`]: unit normal in the local core frame.
//! 2. [`decompose_local`]: alpha/beta relative to the active BOH line.
//! 3. [`BohState`]: clamped reference lines, active line by scene depth.
//! 4. [`to_real_orientation`]: rotation into East/North/Up, dip + dip direction.
//! 5. [`to_spatial_position`] / [`trajectory`]: position along a straight hole.
//!
//! [`measure_structure`] chains all of the above for one structure.

mod angles;
mod boh;
mod error;
mod image;
mod local;
mod logger;
mod measure;
mod plane;
mod rotation;
mod trajectory;
mod types;

pub use angles::{bearing_difference, normalize_360};
pub use boh::{
    angle_of_fit, ActiveBoh, AngleOfFit, BohConfig, BohLine, BohPosition, BohState, BohUpdate,
};
pub use error::OrientError;
pub use image::{luma_rgb, FrameView, LumaImage, PixelFormat};
pub use local::{decompose_local, LocalOrientation, AZIMUTH_EPS};
pub use measure::{
    measure_all, measure_structure, MeasurementContext, StructureInput, StructureMeasurement,
    StructureSource,
};
pub use plane::{fit_plane, PointTrio, UnitNormal, DEGENERATE_EPS};
pub use rotation::{
    global_normal, local_to_global, real_orientation_from_global, to_real_orientation,
    DrillHoleRotation,
};
pub use trajectory::{
    position_along, to_spatial_position, trajectory, TrajectorySample, MAX_TRAJECTORY_SAMPLES,
};
pub use types::{
    CollarPosition, CoreCylinder, CorePoint, DrillHoleOrientation, RealOrientation,
    SpatialPosition, CORE_AXIS,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, LOG_ENV};
