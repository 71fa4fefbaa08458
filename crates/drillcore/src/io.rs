//! JSON configuration and report helpers.

use drillcore_core::{
    measure_structure, AngleOfFit, BohState, CollarPosition, CoreCylinder, DrillHoleOrientation,
    MeasurementContext, OrientError, StructureInput, StructureMeasurement,
};
use drillcore_edge::{CylinderEdgeDetector, EdgeDetectError, EdgeDetectorParams, MAX_FRAME_PIXELS};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum DrillcoreIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Orient(#[from] OrientError),
    #[error(transparent)]
    Edge(#[from] EdgeDetectError),
    #[error("unsupported frame size {width}x{height}")]
    FrameSize { width: usize, height: usize },
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, DrillcoreIoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<(), DrillcoreIoError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn default_depth_unit_per_cm() -> f64 {
    0.01
}

/// One hole scene and the structures picked on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementConfig {
    pub hole: DrillHoleOrientation,
    #[serde(default)]
    pub collar: CollarPosition,
    /// Depth along hole of the scene's shallow end, collar units.
    #[serde(default)]
    pub scene_top_depth: f64,
    #[serde(default = "default_depth_unit_per_cm")]
    pub depth_unit_per_cm: f64,
    #[serde(default)]
    pub boh: BohState,
    #[serde(default)]
    pub cylinder: CoreCylinder,
    #[serde(default)]
    pub structures: Vec<StructureInput>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl MeasurementConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DrillcoreIoError> {
        load_json(path)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DrillcoreIoError> {
        write_json(self, path)
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("drillcore_report.json"))
    }

    /// Validate the hole and build the shared measurement context.
    pub fn build_context(&self) -> Result<MeasurementContext, ConfigError> {
        Ok(MeasurementContext {
            hole: self.hole.validated()?,
            collar: self.collar,
            scene_top_depth: self.scene_top_depth,
            depth_unit_per_cm: self.depth_unit_per_cm,
            boh: self.boh,
            cylinder: self.cylinder,
        })
    }

    /// Measure every structure. Per-structure failures land in the report's
    /// `failures`; only an invalid context is an error.
    pub fn run(&self) -> Result<MeasurementReport, ConfigError> {
        let ctx = self.build_context()?;
        let mut measurements = Vec::with_capacity(self.structures.len());
        let mut failures = Vec::new();
        for (index, input) in self.structures.iter().enumerate() {
            match measure_structure(input, &ctx) {
                Ok(m) => measurements.push(m),
                Err(err) => {
                    log::warn!("structure {index} ({:?}) rejected: {err}", input.label);
                    failures.push(MeasurementFailure {
                        index,
                        label: input.label.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        log::info!(
            "measured {} of {} structures",
            measurements.len(),
            self.structures.len()
        );
        Ok(MeasurementReport {
            hole: ctx.hole,
            collar: ctx.collar,
            boh: ctx.boh,
            angle_of_fit: ctx.boh.angle_of_fit(),
            measurements,
            failures,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementFailure {
    pub index: usize,
    #[serde(default)]
    pub label: Option<String>,
    pub error: String,
}

/// Output of [`MeasurementConfig::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReport {
    pub hole: DrillHoleOrientation,
    pub collar: CollarPosition,
    pub boh: BohState,
    pub angle_of_fit: AngleOfFit,
    pub measurements: Vec<StructureMeasurement>,
    #[serde(default)]
    pub failures: Vec<MeasurementFailure>,
}

impl MeasurementReport {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DrillcoreIoError> {
        load_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DrillcoreIoError> {
        write_json(self, path)
    }
}

/// Edge detector settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default)]
    pub params: EdgeDetectorParams,
    /// Expected video resolution, used to pre-size scratch buffers.
    #[serde(default)]
    pub frame_size: Option<[usize; 2]>,
}

impl DetectorConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DrillcoreIoError> {
        load_json(path)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DrillcoreIoError> {
        write_json(self, path)
    }

    /// Validate the settings and build an idle detector.
    pub fn build_detector(&self) -> Result<CylinderEdgeDetector, ConfigError> {
        self.params.validate()?;
        let detector = CylinderEdgeDetector::new(self.params.clone());
        let Some([width, height]) = self.frame_size else {
            return Ok(detector);
        };
        match width.checked_mul(height) {
            Some(pixels) if pixels > 0 && pixels <= MAX_FRAME_PIXELS => {
                Ok(detector.with_frame_size(width, height))
            }
            _ => Err(ConfigError::FrameSize { width, height }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use drillcore_core::StructureSource;

    fn config_json() -> &'static str {
        r#"{
            "hole": { "azimuth": 0.0, "dip": -90.0 },
            "collar": { "utm_east": 1000.0, "utm_north": 2000.0, "elevation": 300.0 },
            "scene_top_depth": 12.0,
            "structures": [
                { "label": "vein", "kind": "angles", "alpha": 90.0, "beta": 0.0, "depth_cm": 10.0 },
                { "kind": "angles", "alpha": 120.0, "beta": 0.0, "depth_cm": 5.0 }
            ]
        }"#
    }

    #[test]
    fn config_defaults_fill_optional_sections() {
        let cfg: MeasurementConfig = serde_json::from_str(config_json()).expect("config");
        assert_eq!(cfg.depth_unit_per_cm, 0.01);
        assert_eq!(cfg.boh, BohState::default());
        assert_eq!(cfg.cylinder, CoreCylinder::default());
        assert_eq!(cfg.output_path(), PathBuf::from("drillcore_report.json"));
        assert_eq!(cfg.structures.len(), 2);
        assert_eq!(cfg.structures[0].label.as_deref(), Some("vein"));
        assert!(matches!(
            cfg.structures[1].source,
            StructureSource::Angles { alpha, .. } if alpha == 120.0
        ));
    }

    #[test]
    fn run_keeps_failures_next_to_measurements() {
        let cfg: MeasurementConfig = serde_json::from_str(config_json()).expect("config");
        let report = cfg.run().expect("run");
        assert_eq!(report.measurements.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);

        // Line 1 at 0° puts the normal on local -X, which this hole maps to Up.
        let m = &report.measurements[0];
        assert_abs_diff_eq!(m.real.dip, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.depth_along_hole, 12.1, epsilon = 1e-12);
        assert_abs_diff_eq!(m.position.elevation, 300.0 - 12.1, epsilon = 1e-9);
    }

    #[test]
    fn invalid_hole_is_a_config_error() {
        let mut cfg: MeasurementConfig = serde_json::from_str(config_json()).expect("config");
        cfg.hole.dip = 10.0;
        assert!(matches!(
            cfg.run(),
            Err(ConfigError::Orient(OrientError::HoleDipOutOfRange { .. }))
        ));
    }

    #[test]
    fn files_round_trip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg: MeasurementConfig = serde_json::from_str(config_json()).expect("config");
        let path = dir.path().join("cfg.json");
        cfg.write_json(&path).expect("write");
        let back = MeasurementConfig::load_json(&path).expect("load");
        assert_eq!(back.structures, cfg.structures);

        let report = cfg.run().expect("run");
        let report_path = dir.path().join("report.json");
        report.write_json(&report_path).expect("write report");
        let back = MeasurementReport::load_json(&report_path).expect("load");
        assert_eq!(back.failures, report.failures);
        assert_eq!(back.measurements.len(), 1);
        assert_eq!(back.measurements[0].label.as_deref(), Some("vein"));
        assert_abs_diff_eq!(back.measurements[0].real.dip, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = DetectorConfig::load_json("/nonexistent/drillcore/detector.json").unwrap_err();
        assert!(matches!(err, DrillcoreIoError::Io(_)));
    }

    #[test]
    fn detector_config_presizes_detector() {
        let cfg: DetectorConfig =
            serde_json::from_str(r#"{ "params": { "stable_ticks": 2 }, "frame_size": [64, 48] }"#)
                .expect("detector config");
        let det = cfg.build_detector().expect("detector");
        assert_eq!(det.params().stable_ticks, 2);
        assert!(!det.is_running());
    }

    #[test]
    fn oversized_frame_size_is_a_config_error() {
        let cfg: DetectorConfig =
            serde_json::from_str(r#"{ "frame_size": [1000000000, 1000000000] }"#)
                .expect("detector config");
        assert!(matches!(
            cfg.build_detector(),
            Err(ConfigError::FrameSize {
                width: 1_000_000_000,
                ..
            })
        ));

        let empty = DetectorConfig {
            frame_size: Some([0, 480]),
            ..DetectorConfig::default()
        };
        assert!(matches!(
            empty.build_detector(),
            Err(ConfigError::FrameSize { width: 0, .. })
        ));
    }

    #[test]
    fn invalid_detector_params_are_a_config_error() {
        let cfg: DetectorConfig =
            serde_json::from_str(r#"{ "params": { "target_distance_cm": 0.0 } }"#)
                .expect("detector config");
        assert!(matches!(
            cfg.build_detector(),
            Err(ConfigError::Edge(EdgeDetectError::InvalidParams {
                field: "target_distance_cm"
            }))
        ));
    }

    #[test]
    fn negative_boh_band_fails_to_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cfg.json");
        std::fs::write(
            &path,
            r#"{ "hole": { "azimuth": 0.0, "dip": -90.0 },
                 "boh": { "line1_angle": 0.0, "line2_angle": 90.0,
                          "config": { "line1_base": 0.0, "line2_base": 90.0, "band": -5.0,
                                      "split_depth_cm": 15.0, "centered_band": 5.0 } } }"#,
        )
        .expect("write config");
        let err = MeasurementConfig::load_json(&path).unwrap_err();
        assert!(matches!(err, DrillcoreIoError::Json(_)));
        assert!(err.to_string().contains("band"));
    }
}
