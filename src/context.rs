//! Wiimote Context - owns the driver, the slot table and the input engine
//!
//! The context is a two-state machine:
//!
//! ```text
//! create() ──► Setup ──init()──► Running ──tick()──► Running
//!                │                  │
//!                └──── shutdown() ◄─┘
//! ```
//!
//! Assignment operations are available in both states. Ticking and input
//! queries only exist once the context is running. There is no global
//! instance; whoever owns the frame loop owns the context.

use statum::{machine, state};
use tracing::{debug, info, warn};

use crate::assignment::{AssignmentManager, PlayerSlot};
use crate::config::WiimoteConfig;
use crate::driver::{DeviceId, IrMode, ReportMode, WiimoteDriver};
use crate::error::WiimoteError;
use crate::input::{InputEngine, TickStats, Vec2, Vec3, WiimoteButton};

#[state]
#[derive(Debug, Clone)]
pub enum ContextState {
    Setup,
    Running,
}

#[machine]
#[derive(Debug)]
pub struct WiimoteContext<S: ContextState> {
    // Transport layer
    driver: Box<dyn WiimoteDriver>,

    // Settings the context was created with
    config: WiimoteConfig,

    // Slot table
    assignments: AssignmentManager,

    // Decoded per-slot input
    engine: InputEngine,
}

// Methods available in all states
impl<S: ContextState> WiimoteContext<S> {
    pub fn config(&self) -> &WiimoteConfig {
        &self.config
    }

    pub fn assignments(&self) -> &AssignmentManager {
        &self.assignments
    }

    pub fn engine(&self) -> &InputEngine {
        &self.engine
    }

    pub fn driver(&self) -> &dyn WiimoteDriver {
        &*self.driver
    }

    pub fn max_players(&self) -> usize {
        self.assignments.max_players()
    }

    pub fn discover(
        &mut self,
        assign_default_lights: bool,
        report_mode: ReportMode,
        ir_mode: IrMode,
    ) -> Result<usize, WiimoteError> {
        self.assignments
            .discover(&mut *self.driver, assign_default_lights, report_mode, ir_mode)
    }

    /// Discover with the configured report and IR modes
    pub fn discover_default(&mut self, assign_default_lights: bool) -> Result<usize, WiimoteError> {
        self.assignments
            .discover_default(&mut *self.driver, assign_default_lights)
    }

    pub fn assign(
        &mut self,
        slot: PlayerSlot,
        device: Option<DeviceId>,
    ) -> Result<(), WiimoteError> {
        let previous_slot = device.and_then(|d| self.assignments.slot_of(d));
        let previous_device = self.assignments.device(slot);

        let result = self
            .assignments
            .assign(&mut *self.driver, slot, device);

        match &result {
            Ok(()) => {
                if let Some(previous) = previous_slot.filter(|p| *p != slot) {
                    self.engine.reset_slot(previous, false);
                }
                if previous_device != device {
                    self.engine.reset_slot(slot, true);
                }
            }
            Err(WiimoteError::AssignmentConflict(_)) => self.engine.reset_slot(slot, false),
            Err(_) => {}
        }
        result
    }

    pub fn unassign(&mut self, slot: PlayerSlot) -> Result<bool, WiimoteError> {
        let removed = self.assignments.unassign(slot)?;
        if removed {
            self.engine.reset_slot(slot, false);
        }
        Ok(removed)
    }

    pub fn auto_assign(&mut self) -> usize {
        let assigned = self.assignments.auto_assign(&mut *self.driver);
        self.sync_engine_slots();
        assigned
    }

    /// Discover without default lights, then auto-assign
    pub fn setup_and_auto_assign(&mut self) -> Result<usize, WiimoteError> {
        let assigned = self
            .assignments
            .setup_and_auto_assign(&mut *self.driver)?;
        self.sync_engine_slots();
        Ok(assigned)
    }

    pub fn has_device(&self, slot: PlayerSlot) -> bool {
        self.assignments.has_device(slot)
    }

    pub fn unassigned_slots(&self) -> Vec<PlayerSlot> {
        self.assignments.unassigned_slots()
    }

    pub fn unassigned_devices(&self) -> Vec<DeviceId> {
        self.assignments.unassigned_devices(&*self.driver)
    }

    /// Release every device through the driver and drop the context
    pub fn shutdown(mut self) {
        info!("Shutting down wiimote context");
        self.assignments.release_all(&mut *self.driver);
        info!("Wiimote context shut down");
    }

    fn sync_engine_slots(&mut self) {
        for slot in 0..self.max_players() {
            let has_device = self.assignments.has_device(slot);
            if self.engine.is_active(slot) != has_device {
                debug!("Syncing input state of player slot {} (device: {})", slot, has_device);
                self.engine.reset_slot(slot, has_device);
            }
        }
    }
}

// Implementation for Setup state
impl WiimoteContext<Setup> {
    pub fn create(
        config: WiimoteConfig,
        driver: Box<dyn WiimoteDriver>,
    ) -> Result<Self, WiimoteError> {
        info!("Creating wiimote context for {} players", config.max_players);
        config.validate()?;

        let assignments = AssignmentManager::from_config(&config);
        let engine = InputEngine::from_config(&config)?;
        debug!("Light profiles: {:?}", config.normalized_light_profiles());

        Ok(Self::new(driver, config, assignments, engine))
    }

    /// Finish setup and start accepting ticks.
    ///
    /// With `auto_assign_on_init` set, remotes are discovered and assigned first.
    /// A failed scan is logged; the context still starts and can discover later.
    pub fn init(mut self) -> Result<WiimoteContext<Running>, WiimoteError> {
        if self.config.auto_assign_on_init {
            match self.setup_and_auto_assign() {
                Ok(assigned) => info!("Assigned {} wiimotes during init", assigned),
                Err(e) => warn!("Wiimote discovery failed during init: {}", e),
            }
        }

        info!(
            "Wiimote context running, free player slots: {:?}",
            self.unassigned_slots()
        );
        Ok(self.transition())
    }
}

// Implementation for Running state
impl WiimoteContext<Running> {
    /// Advance every assigned slot by one frame
    pub fn tick(&mut self) -> TickStats {
        self.engine.tick(&mut *self.driver, &self.assignments)
    }

    pub fn button(&self, slot: PlayerSlot, button: WiimoteButton) -> bool {
        self.engine.button(slot, button)
    }

    pub fn button_down(&self, slot: PlayerSlot, button: WiimoteButton) -> bool {
        self.engine.button_down(slot, button)
    }

    pub fn button_up(&self, slot: PlayerSlot, button: WiimoteButton) -> bool {
        self.engine.button_up(slot, button)
    }

    pub fn axis_2d(&self, slot: PlayerSlot) -> Vec2 {
        self.engine.axis_2d(slot)
    }

    pub fn axis_horizontal(&self, slot: PlayerSlot) -> f32 {
        self.engine.axis_horizontal(slot)
    }

    pub fn axis_vertical(&self, slot: PlayerSlot) -> f32 {
        self.engine.axis_vertical(slot)
    }

    /// Whether the slot's Nunchuck stick has produced a calibrated sample yet
    pub fn axis_calibrated(&self, slot: PlayerSlot) -> bool {
        self.engine.axis_calibrated(slot)
    }

    pub fn pointer_position(&self, slot: PlayerSlot) -> Vec2 {
        self.engine.pointer_position(slot)
    }

    pub fn pointer_position_raw(&self, slot: PlayerSlot) -> Vec2 {
        self.engine.pointer_position_raw(slot)
    }

    pub fn accel_vector(&self, slot: PlayerSlot) -> Vec3 {
        self.engine.accel_vector(slot)
    }

    pub fn accel_vector_raw(&self, slot: PlayerSlot) -> Vec3 {
        self.engine.accel_vector_raw(slot)
    }
}
