//! Per-tick input translation
//!
//! [`InputEngine::tick`] runs once per host frame. For every assigned slot it
//! drains the remote's pending reports, then advances the button edge states and
//! re-decodes the stick, pointer and accelerometer from the newest sample.
//! Queries only read the state left by the last tick.

use std::fmt;
use tracing::{debug, trace, warn};

use super::axis::AxisState;
use super::buttons::{ButtonMap, ButtonState, WiimoteButton};
use super::math::{Vec2, Vec3};
use super::motion::accel_from_sensor;
use super::pointer::{PointerState, SmoothingConfig};
use crate::assignment::{AssignmentManager, PlayerSlot};
use crate::config::WiimoteConfig;
use crate::driver::{DeviceId, DriverError, RawReport, ReportMode, WiimoteDriver};
use crate::error::WiimoteError;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub smoothing: SmoothingConfig,
    /// Report mode re-sent when the stick reads uncalibrated
    pub report_mode: ReportMode,
    /// Upper bound on reads per device per tick
    pub max_reads_per_tick: usize,
    /// Log rejected queries at warn level instead of debug
    pub debug_mode: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            smoothing: SmoothingConfig::default(),
            report_mode: ReportMode::default(),
            max_reads_per_tick: 32,
            debug_mode: false,
        }
    }
}

impl From<&WiimoteConfig> for EngineSettings {
    fn from(config: &WiimoteConfig) -> Self {
        Self {
            smoothing: config.smoothing,
            report_mode: config.report_mode,
            max_reads_per_tick: config.max_reads_per_tick,
            debug_mode: config.debug_mode,
        }
    }
}

/// Decoded input of one player slot
#[derive(Debug, Clone, Default)]
pub struct SlotInput {
    /// Slot has a device
    pub active: bool,
    /// Device the state was decoded from
    pub device: Option<DeviceId>,
    pub buttons: [ButtonState; WiimoteButton::COUNT],
    pub axis: AxisState,
    pub pointer: PointerState,
    pub accel: Vec3,
}

impl SlotInput {
    /// Apply the newest sample. Returns `true` if the stick needs recalibration.
    fn apply(
        &mut self,
        report: &RawReport,
        button_map: &ButtonMap,
        smoothing: &SmoothingConfig,
    ) -> bool {
        for button in WiimoteButton::ALL {
            let state = &mut self.buttons[button.index()];
            let next = state.next(button_map.is_pressed(button, report));
            if next.down {
                trace!("Button {} down", button);
            } else if next.released {
                trace!("Button {} released", button);
            }
            *state = next;
        }

        let needs_recalibration = self.axis.update(report);
        self.accel = accel_from_sensor(report.accel);
        self.pointer
            .update(report.ir_pointer.map(Vec2::from), smoothing);

        needs_recalibration
    }

    pub fn button(&self, button: WiimoteButton) -> ButtonState {
        self.buttons[button.index()]
    }
}

/// Counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub slots_updated: usize,
    pub reports_read: usize,
    pub recalibrations: usize,
    pub read_failures: usize,
}

#[derive(Debug, Clone)]
pub struct InputEngine {
    slots: Box<[SlotInput]>,
    button_map: ButtonMap,
    settings: EngineSettings,
}

impl InputEngine {
    pub fn new(max_players: usize, settings: EngineSettings) -> Result<Self, WiimoteError> {
        settings.smoothing.validate()?;
        if settings.max_reads_per_tick == 0 {
            return Err(WiimoteError::InvalidConfig(
                "max_reads_per_tick must be at least 1".to_string(),
            ));
        }
        let button_map = ButtonMap::new()?;

        debug!(
            "Creating InputEngine for {} players with settings: {:?}",
            max_players, settings
        );
        Ok(Self {
            slots: vec![SlotInput::default(); max_players].into_boxed_slice(),
            button_map,
            settings,
        })
    }

    pub fn from_config(config: &WiimoteConfig) -> Result<Self, WiimoteError> {
        Self::new(config.max_players, EngineSettings::from(config))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn max_players(&self) -> usize {
        self.slots.len()
    }

    /// Whether the engine currently tracks a device for `slot`
    pub fn is_active(&self, slot: PlayerSlot) -> bool {
        self.slots.get(slot).is_some_and(|input| input.active)
    }

    /// Clear a slot's decoded state and mark whether it now has a device
    pub fn reset_slot(&mut self, slot: PlayerSlot, active: bool) {
        if let Some(input) = self.slots.get_mut(slot) {
            *input = SlotInput {
                active,
                ..SlotInput::default()
            };
        }
    }

    /// Update every assigned slot from its remote
    pub fn tick(
        &mut self,
        driver: &mut dyn WiimoteDriver,
        assignments: &AssignmentManager,
    ) -> TickStats {
        let mut stats = TickStats::default();

        for slot in 0..self.slots.len() {
            let Some(device) = assignments.device(slot) else {
                if self.slots[slot].active {
                    debug!("Player slot {} lost its wiimote, resetting input", slot);
                    self.reset_slot(slot, false);
                }
                continue;
            };
            if self.slots[slot].device != Some(device) {
                debug!("Player slot {} now reads from {}, resetting input", slot, device);
                self.reset_slot(slot, true);
                self.slots[slot].device = Some(device);
            }

            match self.drain(driver, device) {
                Ok(reads) => stats.reports_read += reads,
                Err(e) => {
                    warn!("Failed to read {} for player slot {}: {}", device, slot, e);
                    stats.read_failures += 1;
                    continue;
                }
            }

            let Some(report) = driver.report(device) else {
                debug!("No report available yet for {}", device);
                continue;
            };

            let needs_recalibration =
                self.slots[slot].apply(&report, &self.button_map, &self.settings.smoothing);
            stats.slots_updated += 1;

            if needs_recalibration {
                debug!("{}", WiimoteError::UncalibratedAxis(slot));
                stats.recalibrations += 1;
                if let Err(e) = driver.set_report_mode(device, self.settings.report_mode) {
                    warn!("Failed to re-send report mode to {}: {}", device, e);
                }
            }
        }

        trace!("Tick finished: {:?}", stats);
        stats
    }

    /// Read until the driver reports nothing pending or the read limit is hit
    fn drain(
        &self,
        driver: &mut dyn WiimoteDriver,
        device: DeviceId,
    ) -> Result<usize, DriverError> {
        let mut reads = 0;
        while reads < self.settings.max_reads_per_tick {
            if driver.drain_report(device)? == 0 {
                return Ok(reads);
            }
            reads += 1;
        }
        debug!(
            "{} still has pending data after {} reads, continuing next tick",
            device, reads
        );
        Ok(reads)
    }

    fn diagnostic(&self, message: fmt::Arguments<'_>) {
        if self.settings.debug_mode {
            warn!("{}", message);
        } else {
            debug!("{}", message);
        }
    }

    /// Decoded state of an assigned slot; logs and returns `None` otherwise
    pub fn slot_input(&self, slot: PlayerSlot, what: &str) -> Option<&SlotInput> {
        match self.slots.get(slot) {
            None => {
                self.diagnostic(format_args!(
                    "Attempted to read {} for player {}, but that player number is out of range (max players: {})",
                    what,
                    slot,
                    self.slots.len()
                ));
                None
            }
            Some(input) if !input.active => {
                self.diagnostic(format_args!(
                    "Attempted to read {} for player {}, but that player does not have a wiimote assigned",
                    what, slot
                ));
                None
            }
            Some(input) => Some(input),
        }
    }

    /// Button is held down
    pub fn button(&self, slot: PlayerSlot, button: WiimoteButton) -> bool {
        self.slot_input(slot, "a button")
            .is_some_and(|input| input.button(button).held)
    }

    /// Button went down this tick
    pub fn button_down(&self, slot: PlayerSlot, button: WiimoteButton) -> bool {
        self.slot_input(slot, "a button")
            .is_some_and(|input| input.button(button).down)
    }

    /// Button was released this tick
    pub fn button_up(&self, slot: PlayerSlot, button: WiimoteButton) -> bool {
        self.slot_input(slot, "a button")
            .is_some_and(|input| input.button(button).released)
    }

    pub fn axis_horizontal(&self, slot: PlayerSlot) -> f32 {
        self.slot_input(slot, "the stick")
            .map_or(0.0, |input| input.axis.horizontal)
    }

    pub fn axis_vertical(&self, slot: PlayerSlot) -> f32 {
        self.slot_input(slot, "the stick")
            .map_or(0.0, |input| input.axis.vertical)
    }

    pub fn axis_2d(&self, slot: PlayerSlot) -> Vec2 {
        self.slot_input(slot, "the stick")
            .map_or(Vec2::ZERO, |input| input.axis.as_vec2())
    }

    /// Whether the slot's stick has produced a non-zero sample
    pub fn axis_calibrated(&self, slot: PlayerSlot) -> bool {
        self.slot_input(slot, "the stick")
            .is_some_and(|input| input.axis.calibrated)
    }

    /// Smoothed pointer position in normalized screen space
    pub fn pointer_position(&self, slot: PlayerSlot) -> Vec2 {
        self.slot_input(slot, "the pointer position")
            .map_or(Vec2::ZERO, |input| input.pointer.smoothed)
    }

    /// Latest unfiltered pointer measurement
    pub fn pointer_position_raw(&self, slot: PlayerSlot) -> Vec2 {
        self.slot_input(slot, "the pointer position")
            .map_or(Vec2::ZERO, |input| input.pointer.raw)
    }

    pub fn accel_vector(&self, slot: PlayerSlot) -> Vec3 {
        self.accel_vector_raw(slot).normalized()
    }

    pub fn accel_vector_raw(&self, slot: PlayerSlot) -> Vec3 {
        self.slot_input(slot, "the accelerometer vector")
            .map_or(Vec3::ZERO, |input| input.accel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::classic_profiles;
    use crate::driver::{
        CoreButtons, ExtensionType, LedPattern, NunchuckData, SimulatedCommand, SimulatedDriver,
    };

    struct Rig {
        engine: InputEngine,
        manager: AssignmentManager,
        driver: SimulatedDriver,
        device: DeviceId,
    }

    impl Rig {
        fn new(settings: EngineSettings) -> Self {
            let mut driver = SimulatedDriver::new();
            let device = driver.add_remote();
            driver.enumerate().unwrap();
            let mut manager = AssignmentManager::new(2, LedPattern::ALL_ON, classic_profiles(2));
            manager.assign(&mut driver, 0, Some(device)).unwrap();
            driver.clear_commands();
            Self {
                engine: InputEngine::new(2, settings).unwrap(),
                manager,
                driver,
                device,
            }
        }

        fn tick_with(&mut self, report: RawReport) -> TickStats {
            self.driver.push_report(self.device, report);
            self.engine.tick(&mut self.driver, &self.manager)
        }
    }

    fn nunchuck(stick: [u8; 2]) -> RawReport {
        RawReport {
            extension: ExtensionType::Nunchuck,
            nunchuck: NunchuckData { stick, z: false, c: false },
            ..Default::default()
        }
    }

    #[test]
    fn button_edges_follow_ticks() {
        let mut rig = Rig::new(EngineSettings::default());
        let pressed = RawReport { buttons: CoreButtons::A, ..Default::default() };

        rig.tick_with(pressed);
        assert!(rig.engine.button_down(0, WiimoteButton::A));
        assert!(rig.engine.button(0, WiimoteButton::A));
        assert!(!rig.engine.button_up(0, WiimoteButton::A));

        // No new report: the last sample is still held
        rig.engine.tick(&mut rig.driver, &rig.manager);
        assert!(!rig.engine.button_down(0, WiimoteButton::A));
        assert!(rig.engine.button(0, WiimoteButton::A));

        rig.tick_with(RawReport::default());
        assert!(!rig.engine.button(0, WiimoteButton::A));
        assert!(rig.engine.button_up(0, WiimoteButton::A));
    }

    #[test]
    fn tick_uses_the_newest_queued_report() {
        let mut rig = Rig::new(EngineSettings::default());
        rig.driver.push_report(rig.device, RawReport { buttons: CoreButtons::B, ..Default::default() });
        rig.driver.push_report(rig.device, RawReport { accel: [0.0, 0.0, 1.0], ..Default::default() });

        let stats = rig.engine.tick(&mut rig.driver, &rig.manager);

        assert_eq!(stats.reports_read, 2);
        assert_eq!(rig.driver.pending_reports(rig.device), 0);
        assert!(!rig.engine.button(0, WiimoteButton::B));
        assert_eq!(rig.engine.accel_vector_raw(0), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn drain_is_bounded() {
        let mut rig = Rig::new(EngineSettings {
            max_reads_per_tick: 4,
            ..Default::default()
        });
        rig.driver.set_flooding(rig.device, true);

        let stats = rig.engine.tick(&mut rig.driver, &rig.manager);
        assert_eq!(stats.reports_read, 4);
        assert_eq!(stats.slots_updated, 1);
    }

    #[test]
    fn zero_stick_sample_resends_report_mode() {
        let mut rig = Rig::new(EngineSettings::default());

        let stats = rig.tick_with(nunchuck([0, 0]));

        assert_eq!(stats.recalibrations, 1);
        assert_eq!(rig.engine.axis_2d(0), Vec2::ZERO);
        assert!(!rig.engine.axis_calibrated(0));
        assert_eq!(
            rig.driver.commands(),
            vec![SimulatedCommand::ReportMode(rig.device, ReportMode::ButtonsAccelExt16)]
        );
    }

    #[test]
    fn stick_values_are_decoded() {
        let mut rig = Rig::new(EngineSettings::default());

        rig.tick_with(nunchuck([128, 210]));
        assert_eq!(rig.engine.axis_horizontal(0), 0.0);
        assert_eq!(rig.engine.axis_vertical(0), 1.0);
        assert!(rig.engine.axis_calibrated(0));
        assert!(rig.driver.commands().is_empty());
    }

    #[test]
    fn accel_is_remapped_and_normalized() {
        let mut rig = Rig::new(EngineSettings::default());

        rig.tick_with(RawReport { accel: [0.0, 3.0, 4.0], ..Default::default() });

        assert_eq!(rig.engine.accel_vector_raw(0), Vec3::new(0.0, 4.0, 3.0));
        let unit = rig.engine.accel_vector(0);
        assert!((unit.y - 0.8).abs() < 1e-6);
        assert!((unit.z - 0.6).abs() < 1e-6);

        rig.tick_with(RawReport::default());
        assert_eq!(rig.engine.accel_vector(0), Vec3::ZERO);
    }

    #[test]
    fn pointer_is_smoothed_between_ticks() {
        let mut rig = Rig::new(EngineSettings::default());

        rig.tick_with(RawReport { ir_pointer: Some([0.5, 0.5]), ..Default::default() });
        assert_eq!(rig.engine.pointer_position(0), Vec2::new(0.5, 0.5));

        rig.tick_with(RawReport { ir_pointer: Some([0.9, 0.5]), ..Default::default() });
        assert_eq!(rig.engine.pointer_position_raw(0), Vec2::new(0.9, 0.5));
        let smoothed = rig.engine.pointer_position(0);
        assert!((smoothed.x - 0.82).abs() < 1e-6);
    }

    #[test]
    fn disconnected_device_freezes_its_state() {
        let mut rig = Rig::new(EngineSettings::default());
        rig.tick_with(RawReport { buttons: CoreButtons::HOME, ..Default::default() });
        rig.driver.disconnect(rig.device);

        let stats = rig.engine.tick(&mut rig.driver, &rig.manager);

        assert_eq!(stats.read_failures, 1);
        assert!(rig.engine.button(0, WiimoteButton::Home));
    }

    #[test]
    fn invalid_slots_return_neutral_values() {
        let mut rig = Rig::new(EngineSettings::default());
        rig.tick_with(RawReport {
            buttons: CoreButtons::A,
            ir_pointer: Some([0.3, 0.3]),
            accel: [1.0, 0.0, 0.0],
            ..nunchuck([200, 200])
        });
        let before = rig.engine.slots.clone();

        // Out of range
        assert!(!rig.engine.button(2, WiimoteButton::A));
        assert!(!rig.engine.button_down(2, WiimoteButton::A));
        assert!(!rig.engine.button_up(2, WiimoteButton::A));
        assert_eq!(rig.engine.axis_2d(2), Vec2::ZERO);
        assert_eq!(rig.engine.axis_horizontal(2), 0.0);
        assert_eq!(rig.engine.pointer_position(2), Vec2::ZERO);
        assert_eq!(rig.engine.accel_vector(2), Vec3::ZERO);
        assert_eq!(rig.engine.accel_vector_raw(2), Vec3::ZERO);
        // In range but without a device
        assert!(!rig.engine.button(1, WiimoteButton::A));
        assert_eq!(rig.engine.pointer_position(1), Vec2::ZERO);

        for (slot, input) in rig.engine.slots.iter().enumerate() {
            assert_eq!(input.buttons, before[slot].buttons);
            assert_eq!(input.axis, before[slot].axis);
            assert_eq!(input.pointer, before[slot].pointer);
            assert_eq!(input.accel, before[slot].accel);
        }
    }

    #[test]
    fn unassigned_slot_is_reset_on_tick() {
        let mut rig = Rig::new(EngineSettings::default());
        rig.tick_with(RawReport { buttons: CoreButtons::A, ..Default::default() });
        rig.manager.unassign(0).unwrap();

        rig.engine.tick(&mut rig.driver, &rig.manager);
        assert!(!rig.engine.button(0, WiimoteButton::A));
        assert!(!rig.engine.slots[0].active);
    }

    #[test]
    fn swapped_device_starts_from_fresh_state() {
        let mut rig = Rig::new(EngineSettings::default());
        rig.tick_with(RawReport {
            buttons: CoreButtons::A,
            ir_pointer: Some([0.2, 0.2]),
            ..Default::default()
        });

        let other = rig.driver.add_remote();
        rig.driver.enumerate().unwrap();
        rig.manager.assign(&mut rig.driver, 0, Some(other)).unwrap();
        rig.driver.push_report(
            other,
            RawReport {
                buttons: CoreButtons::A,
                ir_pointer: Some([0.8, 0.6]),
                ..Default::default()
            },
        );
        rig.engine.tick(&mut rig.driver, &rig.manager);

        assert!(rig.engine.button_down(0, WiimoteButton::A));
        assert_eq!(rig.engine.pointer_position(0), Vec2::new(0.8, 0.6));
        assert_eq!(rig.engine.slots[0].device, Some(other));
    }

    #[test]
    fn rejects_invalid_settings() {
        let settings = EngineSettings {
            max_reads_per_tick: 0,
            ..Default::default()
        };
        assert!(InputEngine::new(2, settings).is_err());

        let settings = EngineSettings {
            smoothing: SmoothingConfig {
                snap_epsilon: 0.0,
                ..SmoothingConfig::lerp()
            },
            ..Default::default()
        };
        assert!(InputEngine::new(2, settings).is_err());
    }

    #[test]
    fn engine_keeps_configured_settings() {
        let config = WiimoteConfig {
            max_reads_per_tick: 8,
            debug_mode: true,
            ..Default::default()
        };
        let engine = InputEngine::from_config(&config).unwrap();

        assert_eq!(engine.max_players(), config.max_players);
        assert_eq!(engine.settings().max_reads_per_tick, 8);
        assert!(engine.settings().debug_mode);
        assert_eq!(engine.settings().smoothing, SmoothingConfig::lerp());
    }
}
