//! Base-of-hole reference lines.
//!
//! A scene shows one 30 cm core run. Line 1 is the bearing reference for the
//! shallow half, line 2 for the deep half. Each line may be displaced by the
//! operator within a fixed band around its base angle; values outside the band
//! are clamped, never stored raw.

use serde::{Deserialize, Serialize};

use crate::error::OrientError;

/// Band, split depth and descriptor settings for the two BOH lines.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BohConfig {
    /// Base angle of line 1, degrees.
    pub line1_base: f64,
    /// Base angle of line 2, degrees.
    pub line2_base: f64,
    /// Allowed displacement either side of the base, degrees.
    pub band: f64,
    /// Scene depth (cm) where line 2 takes over.
    pub split_depth_cm: f64,
    /// Offsets within this many degrees of the base read as centered.
    pub centered_band: f64,
}

impl Default for BohConfig {
    fn default() -> Self {
        Self {
            line1_base: 0.0,
            line2_base: 90.0,
            band: 20.0,
            split_depth_cm: 15.0,
            centered_band: 5.0,
        }
    }
}

impl BohConfig {
    /// Reject settings the clamp cannot honour: non-finite values or
    /// negative bands.
    pub fn validate(&self) -> Result<(), OrientError> {
        for (field, value) in [
            ("line1_base", self.line1_base),
            ("line2_base", self.line2_base),
            ("band", self.band),
            ("split_depth_cm", self.split_depth_cm),
            ("centered_band", self.centered_band),
        ] {
            if !value.is_finite() {
                return Err(OrientError::InvalidBohConfig { field, value });
            }
        }
        if self.band < 0.0 {
            return Err(OrientError::InvalidBohConfig {
                field: "band",
                value: self.band,
            });
        }
        if self.centered_band < 0.0 {
            return Err(OrientError::InvalidBohConfig {
                field: "centered_band",
                value: self.centered_band,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BohLine {
    First,
    Second,
}

impl BohLine {
    /// 1-based line index as shown to the operator.
    pub fn index(self) -> u8 {
        match self {
            BohLine::First => 1,
            BohLine::Second => 2,
        }
    }
}

/// Qualitative position of a line relative to its base, for operator feedback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BohPosition {
    LeftOfCenter,
    Centered,
    RightOfCenter,
}

/// Reference angle selected for a depth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveBoh {
    pub line: BohLine,
    pub angle: f64,
}

/// Outcome of a clamped mutation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BohUpdate {
    /// Value actually stored.
    pub angle: f64,
    /// True when the requested value fell outside the band.
    pub clamped: bool,
}

/// Angle of fit between the two lines.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngleOfFit {
    /// `|line2 - line1|`.
    pub ac: f64,
    /// `line2 - line1`; positive means the lines diverge.
    pub convergence: f64,
    pub line1_position: BohPosition,
    pub line2_position: BohPosition,
}

/// The operator-adjusted BOH angles.
///
/// Deserialization validates the config and goes through the same clamp as
/// the setters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBohState")]
pub struct BohState {
    line1_angle: f64,
    line2_angle: f64,
    config: BohConfig,
}

#[derive(Deserialize)]
struct RawBohState {
    line1_angle: f64,
    line2_angle: f64,
    #[serde(default)]
    config: BohConfig,
}

impl TryFrom<RawBohState> for BohState {
    type Error = OrientError;

    fn try_from(raw: RawBohState) -> Result<Self, Self::Error> {
        Self::with_angles(raw.config, raw.line1_angle, raw.line2_angle)
    }
}

impl Default for BohState {
    fn default() -> Self {
        let config = BohConfig::default();
        Self {
            line1_angle: config.line1_base,
            line2_angle: config.line2_base,
            config,
        }
    }
}

impl BohState {
    /// Both lines at their base angles.
    pub fn new(config: BohConfig) -> Result<Self, OrientError> {
        config.validate()?;
        Ok(Self {
            line1_angle: config.line1_base,
            line2_angle: config.line2_base,
            config,
        })
    }

    /// Build from stored angles, clamping each into its band.
    pub fn with_angles(config: BohConfig, line1: f64, line2: f64) -> Result<Self, OrientError> {
        let mut state = Self::new(config)?;
        state.set(BohLine::First, line1);
        state.set(BohLine::Second, line2);
        Ok(state)
    }

    pub fn config(&self) -> &BohConfig {
        &self.config
    }

    pub fn line1_angle(&self) -> f64 {
        self.line1_angle
    }

    pub fn line2_angle(&self) -> f64 {
        self.line2_angle
    }

    pub fn angle(&self, line: BohLine) -> f64 {
        match line {
            BohLine::First => self.line1_angle,
            BohLine::Second => self.line2_angle,
        }
    }

    fn base(&self, line: BohLine) -> f64 {
        match line {
            BohLine::First => self.config.line1_base,
            BohLine::Second => self.config.line2_base,
        }
    }

    pub fn set_line1(&mut self, angle: f64) -> BohUpdate {
        self.set(BohLine::First, angle)
    }

    pub fn set_line2(&mut self, angle: f64) -> BohUpdate {
        self.set(BohLine::Second, angle)
    }

    /// Set a line's angle, clamped to `base ± band`.
    ///
    /// Non-finite requests leave the line unchanged and report `clamped`.
    pub fn set(&mut self, line: BohLine, angle: f64) -> BohUpdate {
        let base = self.base(line);
        let lo = base - self.config.band;
        let hi = base + self.config.band;
        let slot = match line {
            BohLine::First => &mut self.line1_angle,
            BohLine::Second => &mut self.line2_angle,
        };

        if !angle.is_finite() {
            log::debug!("ignoring non-finite BOH angle for line {}", line.index());
            return BohUpdate {
                angle: *slot,
                clamped: true,
            };
        }

        let stored = angle.clamp(lo, hi);
        let clamped = stored != angle;
        if clamped {
            log::debug!(
                "BOH line {} request {angle:.2} clamped to {stored:.2} (band {lo:.1}..{hi:.1})",
                line.index()
            );
        }
        *slot = stored;
        BohUpdate {
            angle: stored,
            clamped,
        }
    }

    /// Shift a line by `delta` degrees (slider drag), clamped.
    pub fn nudge(&mut self, line: BohLine, delta: f64) -> BohUpdate {
        let current = self.angle(line);
        self.set(line, current + delta)
    }

    /// Return both lines to their base angles.
    pub fn reset(&mut self) {
        self.line1_angle = self.config.line1_base;
        self.line2_angle = self.config.line2_base;
    }

    /// Line 1 covers the shallow half of the scene, line 2 the deep half.
    pub fn active_boh(&self, depth_cm: f64) -> ActiveBoh {
        let line = if depth_cm < self.config.split_depth_cm {
            BohLine::First
        } else {
            BohLine::Second
        };
        ActiveBoh {
            line,
            angle: self.angle(line),
        }
    }

    pub fn position(&self, line: BohLine) -> BohPosition {
        let offset = self.angle(line) - self.base(line);
        if offset < -self.config.centered_band {
            BohPosition::LeftOfCenter
        } else if offset > self.config.centered_band {
            BohPosition::RightOfCenter
        } else {
            BohPosition::Centered
        }
    }

    /// AC plus per-line descriptors. Operator feedback only; it does not feed
    /// the orientation transform.
    pub fn angle_of_fit(&self) -> AngleOfFit {
        let (ac, convergence) = angle_of_fit(self.line1_angle, self.line2_angle);
        AngleOfFit {
            ac,
            convergence,
            line1_position: self.position(BohLine::First),
            line2_position: self.position(BohLine::Second),
        }
    }
}

/// `(ac, convergence)` for two raw line angles.
pub fn angle_of_fit(line1_deg: f64, line2_deg: f64) -> (f64, f64) {
    let convergence = line2_deg - line1_deg;
    (convergence.abs(), convergence)
}
