//! Wii Remote input layer
//!
//! Turns raw remote reports into per-player input and keeps track of which
//! remote belongs to which player.
//!
//! 1. [`assignment`] - player slots, discovery and LED feedback
//! 2. [`input`] - per-tick button, stick, pointer and motion decoding
//! 3. [`context`] - lifecycle wrapper the host frame loop drives
//!
//! ```text
//! WiimoteDriver ──► AssignmentManager ──► InputEngine ──► queries
//!                   (slot ↔ device)       (per tick)
//! ```

pub mod assignment;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod input;

pub use assignment::{AssignmentManager, LightProfile, PlayerSlot};
pub use config::WiimoteConfig;
pub use context::{Running, Setup, WiimoteContext};
pub use driver::{DeviceId, WiimoteDriver};
pub use error::WiimoteError;
pub use input::{InputEngine, WiimoteButton};
