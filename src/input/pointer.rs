//! IR pointer smoothing
//!
//! The IR camera jitters noticeably while the remote is held still. The filter
//! lerps towards each new measurement with a factor that depends on how far the
//! measurement is from the current position: small moves are damped heavily,
//! large moves follow quickly so fast motion does not lag.

use serde::{Deserialize, Serialize};

use super::math::Vec2;
use crate::error::WiimoteError;

/// Smallest rest-tier step (`snap_epsilon * rest_factor`) that still moves an
/// `f32` coordinate in `[0, 4)`. Below this the filter can stall short of the
/// snap distance.
pub const MIN_REST_STEP: f32 = 5e-7;

/// Top-tier behaviour of the smoothing filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FastMotion {
    Lerp { factor: f32 },
    /// Jump straight to the measurement
    Snap,
}

/// Tunable thresholds and factors of the smoothing filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Distances below this are treated as jitter at rest
    pub rest_threshold: f32,
    /// Distances below this (and above `rest_threshold`) are slow motion
    pub motion_threshold: f32,
    pub rest_factor: f32,
    pub medium_factor: f32,
    pub fast_motion: FastMotion,
    /// Distances at or below this snap onto the measurement
    pub snap_epsilon: f32,
}

impl SmoothingConfig {
    /// Three lerp tiers (0.01 / 0.4 / 0.8)
    pub const fn lerp() -> Self {
        Self {
            rest_threshold: 0.03,
            motion_threshold: 0.05,
            rest_factor: 0.01,
            medium_factor: 0.4,
            fast_motion: FastMotion::Lerp { factor: 0.8 },
            snap_epsilon: 1e-4,
        }
    }

    /// Same lower tiers, hard snap on fast motion
    pub const fn snap() -> Self {
        Self {
            fast_motion: FastMotion::Snap,
            ..Self::lerp()
        }
    }

    pub fn validate(&self) -> Result<(), WiimoteError> {
        let factor_ok = |factor: f32| factor > 0.0 && factor <= 1.0;

        if !(self.rest_threshold > 0.0 && self.rest_threshold <= self.motion_threshold) {
            return Err(WiimoteError::InvalidConfig(format!(
                "smoothing thresholds must satisfy 0 < rest ({}) <= motion ({})",
                self.rest_threshold, self.motion_threshold
            )));
        }
        if !factor_ok(self.rest_factor) || !factor_ok(self.medium_factor) {
            return Err(WiimoteError::InvalidConfig(format!(
                "smoothing factors must be in (0, 1], got rest {} and medium {}",
                self.rest_factor, self.medium_factor
            )));
        }
        if let FastMotion::Lerp { factor } = self.fast_motion {
            if !factor_ok(factor) {
                return Err(WiimoteError::InvalidConfig(format!(
                    "fast motion factor must be in (0, 1], got {}",
                    factor
                )));
            }
        }
        if !(self.snap_epsilon > 0.0 && self.snap_epsilon < self.rest_threshold) {
            return Err(WiimoteError::InvalidConfig(format!(
                "snap epsilon {} must be in (0, {})",
                self.snap_epsilon, self.rest_threshold
            )));
        }
        if self.snap_epsilon * self.rest_factor < MIN_REST_STEP {
            return Err(WiimoteError::InvalidConfig(format!(
                "snap epsilon {} is too small for rest factor {}, their product must be at least {}",
                self.snap_epsilon, self.rest_factor, MIN_REST_STEP
            )));
        }
        Ok(())
    }

    /// One filter step from `previous` towards `measured`
    pub fn smooth(&self, previous: Vec2, measured: Vec2) -> Vec2 {
        let distance = previous.distance(measured);

        if distance <= self.snap_epsilon {
            measured
        } else if distance < self.rest_threshold {
            previous.lerp(measured, self.rest_factor)
        } else if distance < self.motion_threshold {
            previous.lerp(measured, self.medium_factor)
        } else {
            match self.fast_motion {
                FastMotion::Lerp { factor } => previous.lerp(measured, factor),
                FastMotion::Snap => measured,
            }
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self::lerp()
    }
}

/// Pointer of one slot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub smoothed: Vec2,
    pub raw: Vec2,
    /// False until the first IR sample after (re)assignment
    pub tracking: bool,
}

impl PointerState {
    /// Feed a measurement. `None` (no IR dots visible) leaves the pointer where it is.
    pub fn update(&mut self, measured: Option<Vec2>, smoothing: &SmoothingConfig) {
        let Some(measured) = measured else {
            return;
        };

        self.raw = measured;
        self.smoothed = if self.tracking {
            smoothing.smooth(self.smoothed, measured)
        } else {
            measured
        };
        self.tracking = true;
    }
}
