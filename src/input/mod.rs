//! Input translation for assigned remotes
//!
//! ```text
//! Driver ──► drain ──► RawReport ──► InputEngine ──► queries
//!                                     ├─ buttons  (edge FSM)
//!                                     ├─ axis     (Nunchuck stick)
//!                                     ├─ pointer  (IR smoothing)
//!                                     └─ motion   (accelerometer)
//! ```

pub mod axis;
pub mod buttons;
pub mod engine;
pub mod math;
pub mod motion;
pub mod pointer;

pub use axis::{decode_stick_axis, AxisSample, AxisState, StickAxis};
pub use buttons::{ButtonMap, ButtonSource, ButtonState, WiimoteButton};
pub use engine::{EngineSettings, InputEngine, SlotInput, TickStats};
pub use math::{Vec2, Vec3};
pub use pointer::{FastMotion, PointerState, SmoothingConfig};
