//! End-to-end measurement of one structure: picked points (or a typed
//! alpha/beta pair) to dip, dip direction and position along the hole.

use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::boh::{ActiveBoh, BohState};
use crate::error::{ensure_finite, OrientError};
use crate::local::{decompose_local, LocalOrientation};
use crate::plane::PointTrio;
use crate::rotation::{global_normal, real_orientation_from_global};
use crate::trajectory::position_along;
use crate::types::{
    CollarPosition, CoreCylinder, CorePoint, DrillHoleOrientation, RealOrientation,
    SpatialPosition,
};

/// Where the orientation of a structure comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructureSource {
    /// Three points picked on the virtual cylinder, local cm.
    Points { points: [CorePoint; 3] },
    /// Alpha/beta read off the core directly, at a scene depth in cm.
    Angles { alpha: f64, beta: f64, depth_cm: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureInput {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub source: StructureSource,
}

/// Everything fixed for one scene of one hole.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementContext {
    pub hole: DrillHoleOrientation,
    pub collar: CollarPosition,
    /// Depth along hole of the scene's shallow end, collar units.
    pub scene_top_depth: f64,
    /// Collar units per centimeter of core (0.01 for meters).
    #[serde(default = "default_depth_unit_per_cm")]
    pub depth_unit_per_cm: f64,
    #[serde(default)]
    pub boh: BohState,
    #[serde(default)]
    pub cylinder: CoreCylinder,
}

fn default_depth_unit_per_cm() -> f64 {
    0.01
}

/// Immutable record of one measured structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureMeasurement {
    #[serde(default)]
    pub label: Option<String>,
    pub local: LocalOrientation,
    pub boh: ActiveBoh,
    /// Depth within the scene, cm.
    pub scene_depth_cm: f64,
    pub real: RealOrientation,
    /// Plane normal in (East, North, Up).
    pub global_normal: [f64; 3],
    pub depth_along_hole: f64,
    pub position: SpatialPosition,
}

#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(ctx), fields(label = ?input.label))
)]
pub fn measure_structure(
    input: &StructureInput,
    ctx: &MeasurementContext,
) -> Result<StructureMeasurement, OrientError> {
    let hole = ctx.hole.validated()?;
    ensure_finite(ctx.scene_top_depth, "scene top depth")?;
    ensure_finite(ctx.depth_unit_per_cm, "depth unit")?;

    let (local, active, scene_depth_cm) = match &input.source {
        StructureSource::Points { points } => {
            let trio = PointTrio::new(*points, &ctx.cylinder)?;
            let depth = trio.mean_depth();
            let active = ctx.boh.active_boh(depth);
            let local = decompose_local(&trio.normal(), active.angle)?;
            (local, active, depth)
        }
        StructureSource::Angles {
            alpha,
            beta,
            depth_cm,
        } => {
            let depth = ensure_finite(*depth_cm, "scene depth")?;
            let active = ctx.boh.active_boh(depth);
            (LocalOrientation::from_angles(*alpha, *beta)?, active, depth)
        }
    };

    if local.azimuth_indeterminate {
        log::debug!(
            "structure {:?}: normal along core axis, dip direction is arbitrary",
            input.label
        );
    }

    let g = global_normal(&local, active.angle, &hole)?;
    let real = real_orientation_from_global(&g);
    let depth_along_hole = ctx.scene_top_depth + scene_depth_cm * ctx.depth_unit_per_cm;
    let position = position_along(&ctx.collar, &hole, depth_along_hole)?;

    log::debug!(
        "structure {:?}: alpha={:.2} beta={:.2} (BOH {} at {:.1}) -> dip={:.2} dipdir={:.2}",
        input.label,
        local.alpha,
        local.beta,
        active.line.index(),
        active.angle,
        real.dip,
        real.dip_direction
    );

    Ok(StructureMeasurement {
        label: input.label.clone(),
        local,
        boh: active,
        scene_depth_cm,
        real,
        global_normal: [g.x, g.y, g.z],
        depth_along_hole,
        position,
    })
}

/// Measure every input; failures stay attached to their entry.
pub fn measure_all(
    inputs: &[StructureInput],
    ctx: &MeasurementContext,
) -> Vec<Result<StructureMeasurement, OrientError>> {
    inputs.iter().map(|i| measure_structure(i, ctx)).collect()
}
