//! High-level facade crate for the `drillcore-*` workspace.
//!
//! This crate provides:
//! - stable re-exports of the geometry engine and the edge detector
//! - JSON configuration and report helpers ([`io`])
//! - (feature `image`) helpers that run the edge analysis on decoded images
//!
//! ## Quickstart
//!
//! ```
//! use drillcore::core::{to_real_orientation, to_spatial_position, CollarPosition};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Structure at alpha 40°, beta 120° with BOH line at 90° in a hole
//! // drilled toward 210° at -55°.
//! let real = to_real_orientation(40.0, 120.0, 90.0, 210.0, -55.0)?;
//! assert!((0.0..=90.0).contains(&real.dip));
//!
//! let collar = CollarPosition::new(500_000.0, 6_200_000.0, 340.0);
//! let p = to_spatial_position(&collar, 100.0, 210.0, -55.0)?;
//! assert!(p.elevation < collar.elevation);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `drillcore::core`: data model, plane fit, local decomposition, BOH model,
//!   drill-hole rotation, trajectory and the measurement pipeline.
//! - `drillcore::edge`: per-frame edge analysis and the polling auto-capture
//!   detector.
//! - `drillcore::io`: `MeasurementConfig` / `DetectorConfig` JSON files.
//! - `drillcore::detect` (feature `image`): edge analysis from `image` types.

pub use drillcore_core as core;
pub use drillcore_edge as edge;

pub use drillcore_core::{
    measure_structure, to_real_orientation, to_spatial_position, BohState, CollarPosition,
    DrillHoleOrientation, OrientError, RealOrientation, SpatialPosition, StructureMeasurement,
};
pub use drillcore_edge::{
    CylinderEdgeDetector, EdgeDetectionResult, EdgeDetectorParams, SharedEdgeDetector,
};

pub mod io;

#[cfg(feature = "image")]
pub mod detect;
