//! Nunchuck stick decoding
//!
//! The stick reports 8-bit samples centered around 128. Observed ranges differ
//! per axis (roughly 35-228 horizontal, 27-220 vertical), so the horizontal
//! axis is shifted before saturation and normalization.

use super::math::Vec2;
use crate::driver::{ExtensionType, RawReport};

const STICK_CENTER: f32 = 128.0;
/// Exclusive bounds of the center deadzone
const DEADZONE_LOW: i32 = 112;
const DEADZONE_HIGH: i32 = 144;
const HORIZONTAL_OFFSET: i32 = 8;
const SATURATE_HIGH: i32 = 200;
const SATURATE_LOW: i32 = 47;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickAxis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisSample {
    /// The remote has not produced a calibrated sample yet (raw 0)
    Uncalibrated,
    Value(f32),
}

impl AxisSample {
    pub fn value(self) -> f32 {
        match self {
            AxisSample::Uncalibrated => 0.0,
            AxisSample::Value(value) => value,
        }
    }
}

/// Map one raw stick sample to `[-1, 1]`
pub fn decode_stick_axis(raw: u8, axis: StickAxis) -> AxisSample {
    let mut value = i32::from(raw);
    if value == 0 {
        return AxisSample::Uncalibrated;
    }

    if value > DEADZONE_LOW && value < DEADZONE_HIGH {
        return AxisSample::Value(0.0);
    }

    if axis == StickAxis::Horizontal {
        value -= HORIZONTAL_OFFSET;
    }

    if value > SATURATE_HIGH {
        return AxisSample::Value(1.0);
    }
    if value < SATURATE_LOW {
        return AxisSample::Value(-1.0);
    }

    AxisSample::Value(((value as f32 - STICK_CENTER) / STICK_CENTER).clamp(-1.0, 1.0))
}

/// Last decoded stick position of one slot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisState {
    pub horizontal: f32,
    pub vertical: f32,
    /// A non-zero raw sample has been seen since assignment
    pub calibrated: bool,
}

impl AxisState {
    /// Decode the stick from `report`. Returns `true` when a raw zero sample was
    /// seen and the remote needs its report mode sent again.
    ///
    /// Without a Nunchuck the stick reads neutral.
    pub fn update(&mut self, report: &RawReport) -> bool {
        if report.extension != ExtensionType::Nunchuck {
            self.horizontal = 0.0;
            self.vertical = 0.0;
            return false;
        }

        let [raw_x, raw_y] = report.nunchuck.stick;
        let horizontal = decode_stick_axis(raw_x, StickAxis::Horizontal);
        let vertical = decode_stick_axis(raw_y, StickAxis::Vertical);

        if raw_x != 0 || raw_y != 0 {
            self.calibrated = true;
        }
        self.horizontal = horizontal.value();
        self.vertical = vertical.value();

        horizontal == AxisSample::Uncalibrated || vertical == AxisSample::Uncalibrated
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.horizontal, self.vertical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::NunchuckData;

    fn nunchuck(stick: [u8; 2]) -> RawReport {
        RawReport {
            extension: ExtensionType::Nunchuck,
            nunchuck: NunchuckData { stick, z: false, c: false },
            ..Default::default()
        }
    }

    #[test]
    fn center_is_deadzone() {
        assert_eq!(decode_stick_axis(128, StickAxis::Vertical), AxisSample::Value(0.0));
        assert_eq!(decode_stick_axis(113, StickAxis::Horizontal), AxisSample::Value(0.0));
        assert_eq!(decode_stick_axis(143, StickAxis::Vertical), AxisSample::Value(0.0));
    }

    #[test]
    fn zero_is_uncalibrated() {
        assert_eq!(decode_stick_axis(0, StickAxis::Vertical), AxisSample::Uncalibrated);
        assert_eq!(AxisSample::Uncalibrated.value(), 0.0);
    }

    #[test]
    fn saturates_at_the_edges() {
        assert_eq!(decode_stick_axis(210, StickAxis::Vertical), AxisSample::Value(1.0));
        assert_eq!(decode_stick_axis(30, StickAxis::Vertical), AxisSample::Value(-1.0));
        // 52 - 8 = 44, below the lower bound
        assert_eq!(decode_stick_axis(52, StickAxis::Horizontal), AxisSample::Value(-1.0));
        assert_eq!(decode_stick_axis(52, StickAxis::Vertical).value(), (52.0 - 128.0) / 128.0);
    }

    #[test]
    fn horizontal_is_offset() {
        assert_eq!(decode_stick_axis(160, StickAxis::Horizontal).value(), 24.0 / 128.0);
        assert_eq!(decode_stick_axis(160, StickAxis::Vertical).value(), 32.0 / 128.0);
        // 208 - 8 = 200 is not above the saturation bound
        assert_eq!(decode_stick_axis(208, StickAxis::Horizontal).value(), 72.0 / 128.0);
    }

    #[test]
    fn update_without_nunchuck_reads_neutral() {
        let mut state = AxisState {
            horizontal: 0.5,
            vertical: -0.5,
            calibrated: true,
        };
        let needs_recalibration = state.update(&RawReport::default());

        assert!(!needs_recalibration);
        assert_eq!(state.as_vec2(), Vec2::ZERO);
    }

    #[test]
    fn update_flags_zero_samples() {
        let mut state = AxisState::default();
        assert!(state.update(&nunchuck([0, 0])));
        assert!(!state.calibrated);

        assert!(!state.update(&nunchuck([128, 210])));
        assert!(state.calibrated);
        assert_eq!(state.as_vec2(), Vec2::new(0.0, 1.0));
    }
}
