//! Player slot assignment
//!
//! Owns the mapping between logical player slots and the remotes the driver
//! discovered, and drives the LED feedback that tells players which slot they
//! are in.
//!
//! 1. [`manager`] - slot table, discovery, auto-assignment and release
//! 2. [`lights`] - per-player LED profiles

pub mod lights;
pub mod manager;

pub use lights::{classic_profiles, normalize_profiles, LightProfile};
pub use manager::{AssignmentManager, PlayerSlot};
