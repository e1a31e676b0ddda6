//! Driver boundary for the Wii Remote
//!
//! The wireless link and raw report parsing live outside this crate. Everything
//! the assignment manager and the input engine need from the hardware goes
//! through [`WiimoteDriver`]:
//!
//! ```text
//! Driver ──► drain_report() ──► report() ──► InputEngine
//!   ▲                                            │
//!   └──── send_player_led / set_report_mode ◄────┘
//! ```
//!
//! [`simulated`] provides an in-memory implementation for tests and the demo binary.

pub mod simulated;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use simulated::{SimulatedDriver, SimulatedCommand};

/// Opaque handle to a physical remote, issued by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wiimote#{}", self.0)
    }
}

bitflags::bitflags! {
    /// Core button bits as they appear in the two button bytes of every report
    /// (first byte in the high half).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CoreButtons: u16 {
        const TWO = 0x0001;
        const ONE = 0x0002;
        const B = 0x0004;
        const A = 0x0008;
        const MINUS = 0x0010;
        const HOME = 0x0080;
        const LEFT = 0x0100;
        const RIGHT = 0x0200;
        const DOWN = 0x0400;
        const UP = 0x0800;
        const PLUS = 0x1000;
    }
}

impl Default for CoreButtons {
    fn default() -> Self {
        Self::empty()
    }
}

/// Extension controller plugged into the remote's expansion port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtensionType {
    #[default]
    None,
    Nunchuck,
    ClassicController,
    ClassicControllerPro,
    MotionPlus,
    MotionPlusNunchuck,
    MotionPlusClassic,
}

/// Decoded Nunchuck payload. `stick` holds the raw 8-bit `[x, y]` sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NunchuckData {
    pub stick: [u8; 2],
    pub z: bool,
    pub c: bool,
}

/// Most recent decoded sample the driver holds for a device
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawReport {
    pub buttons: CoreButtons,
    pub extension: ExtensionType,
    pub nunchuck: NunchuckData,
    /// Normalized screen-space pointing position, `None` while the IR camera sees no dots
    pub ir_pointer: Option<[f32; 2]>,
    /// Calibrated accelerometer sample in sensor axis order
    pub accel: [f32; 3],
}

/// Which data channels the remote includes in each report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    ButtonsOnly,
    ButtonsAccel,
    ButtonsExt8,
    ButtonsAccelIr12,
    ButtonsExt19,
    #[default]
    ButtonsAccelExt16,
    ButtonsIr10Ext9,
    ButtonsAccelIr10Ext6,
}

/// IR camera data format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrMode {
    Off,
    #[default]
    Basic,
    Extended,
    Full,
}

/// The four player LEDs on the bottom of the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedPattern {
    pub led1: bool,
    pub led2: bool,
    pub led3: bool,
    pub led4: bool,
}

impl LedPattern {
    pub const ALL_ON: Self = Self::new(true, true, true, true);

    pub const fn new(led1: bool, led2: bool, led3: bool, led4: bool) -> Self {
        Self {
            led1,
            led2,
            led3,
            led4,
        }
    }

    /// Single LED lit for the given player, wrapping after four players
    pub const fn player(index: usize) -> Self {
        let lit = index % 4;
        Self::new(lit == 0, lit == 1, lit == 2, lit == 3)
    }
}

impl fmt::Display for LedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |on: bool| if on { '*' } else { '.' };
        write!(
            f,
            "[{}{}{}{}]",
            mark(self.led1),
            mark(self.led2),
            mark(self.led3),
            mark(self.led4)
        )
    }
}

/// Driver errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DriverError {
    #[error("Unknown device: {0}")]
    UnknownDevice(DeviceId),

    #[error("Device disconnected: {0}")]
    Disconnected(DeviceId),

    #[error("Driver I/O error: {0}")]
    Io(String),
}

/// Primitives the core consumes from the transport layer.
///
/// `read` calls must be non-blocking: [`WiimoteDriver::drain_report`] returns the
/// number of bytes it consumed and `0` once nothing is pending.
pub trait WiimoteDriver: fmt::Debug {
    /// Scan for remotes and return every device the driver now knows
    fn enumerate(&mut self) -> Result<Vec<DeviceId>, DriverError>;

    /// Live device registry in discovery order
    fn devices(&self) -> Vec<DeviceId>;

    fn send_player_led(&mut self, device: DeviceId, leds: LedPattern)
        -> Result<(), DriverError>;

    fn set_report_mode(&mut self, device: DeviceId, mode: ReportMode) -> Result<(), DriverError>;

    fn setup_ir_camera(&mut self, device: DeviceId, mode: IrMode) -> Result<(), DriverError>;

    /// Consume one pending report; `Ok(0)` when the queue is empty
    fn drain_report(&mut self, device: DeviceId) -> Result<usize, DriverError>;

    /// Latest decoded state for a device
    fn report(&self, device: DeviceId) -> Option<RawReport>;

    /// Release a device. May remove it from [`WiimoteDriver::devices`].
    fn cleanup(&mut self, device: DeviceId);
}
