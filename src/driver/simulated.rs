//! In-memory driver with scriptable report queues
//!
//! Cloning a [`SimulatedDriver`] shares the underlying state, so a test can hand
//! one clone to the context and keep another to feed reports and inspect the
//! commands the core sent.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, trace};

use super::{DeviceId, DriverError, IrMode, LedPattern, RawReport, ReportMode, WiimoteDriver};

/// Size of a buttons+accel+ext16 report in bytes
const REPORT_LEN: usize = 22;

/// Write-side command recorded by the simulated driver
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedCommand {
    PlayerLed(DeviceId, LedPattern),
    ReportMode(DeviceId, ReportMode),
    IrCamera(DeviceId, IrMode),
    Cleanup(DeviceId),
}

#[derive(Debug, Default)]
struct SimulatedRemote {
    id: DeviceId,
    queue: VecDeque<RawReport>,
    current: RawReport,
    leds: Option<LedPattern>,
    report_mode: Option<ReportMode>,
    ir_mode: Option<IrMode>,
    connected: bool,
    flooding: bool,
}

#[derive(Debug, Default)]
struct SimulatedState {
    next_id: u32,
    in_range: Vec<SimulatedRemote>,
    registry: Vec<DeviceId>,
    commands: Vec<SimulatedCommand>,
    enumerate_error: Option<DriverError>,
}

impl SimulatedState {
    fn remote(&self, device: DeviceId) -> Result<&SimulatedRemote, DriverError> {
        self.in_range
            .iter()
            .find(|remote| remote.id == device)
            .ok_or(DriverError::UnknownDevice(device))
    }

    fn remote_mut(&mut self, device: DeviceId) -> Result<&mut SimulatedRemote, DriverError> {
        self.in_range
            .iter_mut()
            .find(|remote| remote.id == device)
            .ok_or(DriverError::UnknownDevice(device))
    }

    fn connected_remote_mut(
        &mut self,
        device: DeviceId,
    ) -> Result<&mut SimulatedRemote, DriverError> {
        let remote = self.remote_mut(device)?;
        if !remote.connected {
            return Err(DriverError::Disconnected(device));
        }
        Ok(remote)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedDriver {
    state: Rc<RefCell<SimulatedState>>,
}

impl SimulatedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a new remote in range. It shows up in [`WiimoteDriver::devices`]
    /// after the next `enumerate()`.
    pub fn add_remote(&self) -> DeviceId {
        let mut state = self.state.borrow_mut();
        let id = DeviceId(state.next_id);
        state.next_id += 1;
        state.in_range.push(SimulatedRemote {
            id,
            connected: true,
            ..Default::default()
        });
        debug!("Simulated remote {} in range", id);
        id
    }

    /// Queue a report to be returned by the next `drain_report()`
    pub fn push_report(&self, device: DeviceId, report: RawReport) {
        if let Ok(remote) = self.state.borrow_mut().remote_mut(device) {
            remote.queue.push_back(report);
        }
    }

    /// Mark a remote as gone; further reads and writes fail
    pub fn disconnect(&self, device: DeviceId) {
        if let Ok(remote) = self.state.borrow_mut().remote_mut(device) {
            remote.connected = false;
        }
    }

    /// Make `drain_report()` report data forever without ever running dry
    pub fn set_flooding(&self, device: DeviceId, flooding: bool) {
        if let Ok(remote) = self.state.borrow_mut().remote_mut(device) {
            remote.flooding = flooding;
        }
    }

    pub fn fail_next_enumerate(&self, error: DriverError) {
        self.state.borrow_mut().enumerate_error = Some(error);
    }

    pub fn pending_reports(&self, device: DeviceId) -> usize {
        self.state
            .borrow()
            .remote(device)
            .map(|remote| remote.queue.len())
            .unwrap_or(0)
    }

    pub fn leds(&self, device: DeviceId) -> Option<LedPattern> {
        self.state.borrow().remote(device).ok().and_then(|r| r.leds)
    }

    pub fn report_mode(&self, device: DeviceId) -> Option<ReportMode> {
        self.state
            .borrow()
            .remote(device)
            .ok()
            .and_then(|r| r.report_mode)
    }

    pub fn ir_mode(&self, device: DeviceId) -> Option<IrMode> {
        self.state.borrow().remote(device).ok().and_then(|r| r.ir_mode)
    }

    pub fn commands(&self) -> Vec<SimulatedCommand> {
        self.state.borrow().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }
}

impl WiimoteDriver for SimulatedDriver {
    fn enumerate(&mut self) -> Result<Vec<DeviceId>, DriverError> {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.enumerate_error.take() {
            return Err(error);
        }

        let found: Vec<DeviceId> = state
            .in_range
            .iter()
            .filter(|remote| remote.connected)
            .map(|remote| remote.id)
            .collect();
        for id in found {
            if !state.registry.contains(&id) {
                debug!("Simulated driver registered {}", id);
                state.registry.push(id);
            }
        }
        Ok(state.registry.clone())
    }

    fn devices(&self) -> Vec<DeviceId> {
        self.state.borrow().registry.clone()
    }

    fn send_player_led(
        &mut self,
        device: DeviceId,
        leds: LedPattern,
    ) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.connected_remote_mut(device)?.leds = Some(leds);
        state.commands.push(SimulatedCommand::PlayerLed(device, leds));
        Ok(())
    }

    fn set_report_mode(&mut self, device: DeviceId, mode: ReportMode) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.connected_remote_mut(device)?.report_mode = Some(mode);
        state.commands.push(SimulatedCommand::ReportMode(device, mode));
        Ok(())
    }

    fn setup_ir_camera(&mut self, device: DeviceId, mode: IrMode) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.connected_remote_mut(device)?.ir_mode = Some(mode);
        state.commands.push(SimulatedCommand::IrCamera(device, mode));
        Ok(())
    }

    fn drain_report(&mut self, device: DeviceId) -> Result<usize, DriverError> {
        let mut state = self.state.borrow_mut();
        let remote = state.connected_remote_mut(device)?;
        if remote.flooding {
            return Ok(REPORT_LEN);
        }
        match remote.queue.pop_front() {
            Some(report) => {
                trace!("Simulated {} delivered report: {:?}", device, report);
                remote.current = report;
                Ok(REPORT_LEN)
            }
            None => Ok(0),
        }
    }

    fn report(&self, device: DeviceId) -> Option<RawReport> {
        self.state.borrow().remote(device).ok().map(|r| r.current)
    }

    fn cleanup(&mut self, device: DeviceId) {
        let mut state = self.state.borrow_mut();
        state.registry.retain(|id| *id != device);
        state.commands.push(SimulatedCommand::Cleanup(device));
        debug!("Simulated driver released {}", device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerate_registers_in_discovery_order() {
        let mut driver = SimulatedDriver::new();
        let first = driver.add_remote();
        let second = driver.add_remote();

        assert!(driver.devices().is_empty());
        assert_eq!(driver.enumerate().unwrap(), vec![first, second]);
        // A second scan must not duplicate entries
        assert_eq!(driver.enumerate().unwrap(), vec![first, second]);
    }

    #[test]
    fn drain_pops_queued_reports_until_empty() {
        let mut driver = SimulatedDriver::new();
        let id = driver.add_remote();
        driver.push_report(id, RawReport { accel: [1.0, 0.0, 0.0], ..Default::default() });
        driver.push_report(id, RawReport { accel: [2.0, 0.0, 0.0], ..Default::default() });

        assert_eq!(driver.drain_report(id), Ok(REPORT_LEN));
        assert_eq!(driver.drain_report(id), Ok(REPORT_LEN));
        assert_eq!(driver.drain_report(id), Ok(0));
        assert_eq!(driver.report(id).unwrap().accel, [2.0, 0.0, 0.0]);
    }

    #[test]
    fn disconnected_remote_rejects_io() {
        let mut driver = SimulatedDriver::new();
        let id = driver.add_remote();
        driver.disconnect(id);

        assert_eq!(driver.drain_report(id), Err(DriverError::Disconnected(id)));
        assert_eq!(
            driver.send_player_led(id, LedPattern::ALL_ON),
            Err(DriverError::Disconnected(id))
        );
    }

    #[test]
    fn cleanup_removes_from_registry() {
        let mut driver = SimulatedDriver::new();
        let id = driver.add_remote();
        driver.enumerate().unwrap();
        driver.cleanup(id);

        assert!(driver.devices().is_empty());
        assert_eq!(driver.commands(), vec![SimulatedCommand::Cleanup(id)]);
    }
}
