//! Slot table and device bookkeeping
//!
//! The table is a fixed-size slice indexed by player slot. Every slot always has
//! an entry; unassigning stores `None`, so an out-of-range index is the only way
//! a lookup can fail.

use tracing::{debug, error, info, warn};

use super::lights::LightProfile;
use crate::config::WiimoteConfig;
use crate::driver::{DeviceId, IrMode, LedPattern, ReportMode, WiimoteDriver};
use crate::error::WiimoteError;

/// Logical player index in `[0, max_players)`
pub type PlayerSlot = usize;

#[derive(Debug, Clone)]
pub struct AssignmentManager {
    slots: Box<[Option<DeviceId>]>,
    default_lights: LedPattern,
    light_profiles: Vec<LightProfile>,
    report_mode: ReportMode,
    ir_mode: IrMode,
}

impl AssignmentManager {
    pub fn new(
        max_players: usize,
        default_lights: LedPattern,
        light_profiles: Vec<LightProfile>,
    ) -> Self {
        debug!(
            "Creating AssignmentManager for {} players with {} light profiles",
            max_players,
            light_profiles.len()
        );
        Self {
            slots: vec![None; max_players].into_boxed_slice(),
            default_lights,
            light_profiles,
            report_mode: ReportMode::default(),
            ir_mode: IrMode::default(),
        }
    }

    pub fn from_config(config: &WiimoteConfig) -> Self {
        let mut manager = Self::new(
            config.max_players,
            config.default_lights,
            config.normalized_light_profiles(),
        );
        manager.report_mode = config.report_mode;
        manager.ir_mode = config.ir_mode;
        manager
    }

    pub fn max_players(&self) -> usize {
        self.slots.len()
    }

    pub fn default_lights(&self) -> LedPattern {
        self.default_lights
    }

    pub fn light_profile(&self, slot: PlayerSlot) -> Option<&LightProfile> {
        self.light_profiles
            .iter()
            .find(|profile| profile.player == slot)
    }

    pub fn check_slot(&self, slot: PlayerSlot) -> Result<(), WiimoteError> {
        if slot >= self.max_players() {
            return Err(WiimoteError::ConfigurationError {
                slot,
                max_players: self.max_players(),
            });
        }
        Ok(())
    }

    /// Scan for remotes and configure every one found.
    ///
    /// Returns the number of devices the driver knows after the scan. Finding
    /// nothing is not an error. Slots are left untouched.
    pub fn discover(
        &self,
        driver: &mut dyn WiimoteDriver,
        assign_default_lights: bool,
        report_mode: ReportMode,
        ir_mode: IrMode,
    ) -> Result<usize, WiimoteError> {
        let devices = driver.enumerate()?;
        if devices.is_empty() {
            debug!("No wiimotes found, nothing to set up");
            return Ok(0);
        }

        info!("Found {} wiimotes:", devices.len());
        for (idx, device) in devices.iter().enumerate() {
            info!("  [{}] {}", idx, device);

            if assign_default_lights {
                if let Err(e) = driver.send_player_led(*device, self.default_lights) {
                    warn!("Failed to set default lights on {}: {}", device, e);
                }
            }
            if let Err(e) = driver.set_report_mode(*device, report_mode) {
                warn!("Failed to set report mode {:?} on {}: {}", report_mode, device, e);
            }
            if let Err(e) = driver.setup_ir_camera(*device, ir_mode) {
                warn!("Failed to set up IR camera ({:?}) on {}: {}", ir_mode, device, e);
            }
        }

        Ok(devices.len())
    }

    /// [`AssignmentManager::discover`] with the configured report and IR modes
    pub fn discover_default(
        &self,
        driver: &mut dyn WiimoteDriver,
        assign_default_lights: bool,
    ) -> Result<usize, WiimoteError> {
        self.discover(driver, assign_default_lights, self.report_mode, self.ir_mode)
    }

    /// Put `device` in `slot` and show the slot's light profile on it.
    ///
    /// A `None` device clears the slot and is still reported as
    /// [`WiimoteError::AssignmentConflict`]. If the device already belongs to
    /// another slot it is moved.
    pub fn assign(
        &mut self,
        driver: &mut dyn WiimoteDriver,
        slot: PlayerSlot,
        device: Option<DeviceId>,
    ) -> Result<(), WiimoteError> {
        if let Err(e) = self.check_slot(slot) {
            error!("Failed to assign wiimote: {}", e);
            return Err(e);
        }

        let Some(device) = device else {
            let e = WiimoteError::AssignmentConflict(slot);
            error!("{}", e);
            self.unassign(slot)?;
            return Err(e);
        };

        if let Some(previous) = self.slot_of(device) {
            if previous != slot {
                info!("Moving {} from player slot {} to {}", device, previous, slot);
                self.slots[previous] = None;
            }
        }

        self.slots[slot] = Some(device);
        info!("Assigned {} to player slot {}", device, slot);

        match self.light_profile(slot).map(|profile| profile.leds) {
            Some(leds) => {
                if let Err(e) = driver.send_player_led(device, leds) {
                    warn!("Failed to set lights {} on {}: {}", leds, device, e);
                } else {
                    debug!("Lights {} set on {}", leds, device);
                }
            }
            None => warn!("{}", WiimoteError::MissingLightProfile(slot)),
        }

        Ok(())
    }

    /// Clear `slot`. Returns whether a device was removed.
    pub fn unassign(&mut self, slot: PlayerSlot) -> Result<bool, WiimoteError> {
        if let Err(e) = self.check_slot(slot) {
            error!("Failed to remove wiimote: {}", e);
            return Err(e);
        }

        match self.slots[slot].take() {
            Some(device) => {
                info!("Removed {} from player slot {}", device, slot);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Give every free slot, lowest first, the next unowned device in discovery
    /// order. Devices left over once all slots are full get the default lights.
    ///
    /// Returns the number of devices assigned.
    pub fn auto_assign(&mut self, driver: &mut dyn WiimoteDriver) -> usize {
        let free_devices = self.unassigned_devices(&*driver);
        debug!("Auto-assigning {} free wiimotes", free_devices.len());

        let mut slot = 0;
        let mut assigned = 0;
        for device in free_devices {
            while slot < self.max_players() && self.slots[slot].is_some() {
                slot += 1;
            }

            if slot >= self.max_players() {
                info!(
                    "All {} player slots are taken, {} stays a spectator",
                    self.max_players(),
                    device
                );
                if let Err(e) = driver.send_player_led(device, self.default_lights) {
                    warn!("Failed to set default lights on {}: {}", device, e);
                }
                continue;
            }

            match self.assign(driver, slot, Some(device)) {
                Ok(()) => assigned += 1,
                Err(e) => warn!("Auto-assign of {} to slot {} failed: {}", device, slot, e),
            }
        }

        info!(
            "Auto-assign finished: {} assigned, {} player slots still free",
            assigned,
            self.unassigned_slots().len()
        );
        assigned
    }

    /// Discover without touching the lights, then auto-assign
    pub fn setup_and_auto_assign(
        &mut self,
        driver: &mut dyn WiimoteDriver,
    ) -> Result<usize, WiimoteError> {
        self.discover_default(driver, false)?;
        Ok(self.auto_assign(driver))
    }

    pub fn has_device(&self, slot: PlayerSlot) -> bool {
        self.device(slot).is_some()
    }

    pub fn device(&self, slot: PlayerSlot) -> Option<DeviceId> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn slot_of(&self, device: DeviceId) -> Option<PlayerSlot> {
        self.slots.iter().position(|entry| *entry == Some(device))
    }

    /// Occupied slots with their devices, in slot order
    pub fn assigned(&self) -> impl Iterator<Item = (PlayerSlot, DeviceId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.map(|device| (slot, device)))
    }

    pub fn unassigned_slots(&self) -> Vec<PlayerSlot> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_none())
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Devices in the driver registry that no slot holds, in discovery order
    pub fn unassigned_devices(&self, driver: &dyn WiimoteDriver) -> Vec<DeviceId> {
        driver
            .devices()
            .into_iter()
            .filter(|device| self.slot_of(*device).is_none())
            .collect()
    }

    /// Clear every slot and release every device in the driver's live registry.
    ///
    /// Walks the registry from the back and re-reads it on each step, since
    /// `cleanup` may remove the entry it is given.
    pub fn release_all(&mut self, driver: &mut dyn WiimoteDriver) {
        self.slots.iter_mut().for_each(|entry| *entry = None);

        let count = driver.devices().len();
        info!("Releasing {} wiimotes", count);
        for idx in (0..count).rev() {
            if let Some(device) = driver.devices().get(idx).copied() {
                debug!("Cleaning up {}", device);
                driver.cleanup(device);
            }
        }
    }
}
