//! Logical buttons and edge detection

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::driver::{CoreButtons, ExtensionType, RawReport};
use crate::error::WiimoteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WiimoteButton {
    A,
    B,
    Up,
    Down,
    Left,
    Right,
    Plus,
    Minus,
    Home,
    One,
    Two,
    // Nunchuck
    Z,
    C,
}

impl WiimoteButton {
    pub const COUNT: usize = 13;

    pub const ALL: [WiimoteButton; Self::COUNT] = [
        WiimoteButton::A,
        WiimoteButton::B,
        WiimoteButton::Up,
        WiimoteButton::Down,
        WiimoteButton::Left,
        WiimoteButton::Right,
        WiimoteButton::Plus,
        WiimoteButton::Minus,
        WiimoteButton::Home,
        WiimoteButton::One,
        WiimoteButton::Two,
        WiimoteButton::Z,
        WiimoteButton::C,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for WiimoteButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Where a logical button reads its pressed bit from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonSource {
    Core(CoreButtons),
    NunchuckZ,
    NunchuckC,
}

impl ButtonSource {
    pub fn is_pressed(self, report: &RawReport) -> bool {
        match self {
            ButtonSource::Core(mask) => report.buttons.contains(mask),
            ButtonSource::NunchuckZ => {
                report.extension == ExtensionType::Nunchuck && report.nunchuck.z
            }
            ButtonSource::NunchuckC => {
                report.extension == ExtensionType::Nunchuck && report.nunchuck.c
            }
        }
    }
}

const BUTTON_SOURCES: [(WiimoteButton, ButtonSource); WiimoteButton::COUNT] = [
    (WiimoteButton::A, ButtonSource::Core(CoreButtons::A)),
    (WiimoteButton::B, ButtonSource::Core(CoreButtons::B)),
    (WiimoteButton::Up, ButtonSource::Core(CoreButtons::UP)),
    (WiimoteButton::Down, ButtonSource::Core(CoreButtons::DOWN)),
    (WiimoteButton::Left, ButtonSource::Core(CoreButtons::LEFT)),
    (WiimoteButton::Right, ButtonSource::Core(CoreButtons::RIGHT)),
    (WiimoteButton::Plus, ButtonSource::Core(CoreButtons::PLUS)),
    (WiimoteButton::Minus, ButtonSource::Core(CoreButtons::MINUS)),
    (WiimoteButton::Home, ButtonSource::Core(CoreButtons::HOME)),
    (WiimoteButton::One, ButtonSource::Core(CoreButtons::ONE)),
    (WiimoteButton::Two, ButtonSource::Core(CoreButtons::TWO)),
    (WiimoteButton::Z, ButtonSource::NunchuckZ),
    (WiimoteButton::C, ButtonSource::NunchuckC),
];

/// Button → source lookup, indexed by [`WiimoteButton::index`]
#[derive(Debug, Clone)]
pub struct ButtonMap {
    sources: [ButtonSource; WiimoteButton::COUNT],
}

impl ButtonMap {
    /// Build the lookup and check that every button has exactly one source and
    /// that no two core buttons share a bit.
    pub fn new() -> Result<Self, WiimoteError> {
        Self::from_table(&BUTTON_SOURCES)
    }

    fn from_table(table: &[(WiimoteButton, ButtonSource)]) -> Result<Self, WiimoteError> {
        let mut sources: [Option<ButtonSource>; WiimoteButton::COUNT] =
            [None; WiimoteButton::COUNT];
        let mut used_bits = CoreButtons::empty();

        for (button, source) in table {
            if sources[button.index()].replace(*source).is_some() {
                return Err(WiimoteError::InvalidConfig(format!(
                    "button {} is mapped twice",
                    button
                )));
            }
            if let ButtonSource::Core(mask) = source {
                if mask.bits().count_ones() != 1 || used_bits.intersects(*mask) {
                    return Err(WiimoteError::InvalidConfig(format!(
                        "button {} has an invalid or shared core bit {:#06x}",
                        button,
                        mask.bits()
                    )));
                }
                used_bits |= *mask;
            }
        }

        let mut resolved = [ButtonSource::NunchuckZ; WiimoteButton::COUNT];
        for button in WiimoteButton::ALL {
            resolved[button.index()] = sources[button.index()].ok_or_else(|| {
                WiimoteError::InvalidConfig(format!("button {} has no source", button))
            })?;
        }

        debug!("Button map validated for {} buttons", WiimoteButton::COUNT);
        Ok(Self { sources: resolved })
    }

    pub fn source(&self, button: WiimoteButton) -> ButtonSource {
        self.sources[button.index()]
    }

    pub fn is_pressed(&self, button: WiimoteButton, report: &RawReport) -> bool {
        self.source(button).is_pressed(report)
    }
}

/// Edge-triggered state of one button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    /// Pressed this tick, not held before
    pub down: bool,
    pub held: bool,
    /// Released this tick
    pub released: bool,
}

impl ButtonState {
    /// Advance one tick given the raw pressed bit
    pub fn next(self, pressed: bool) -> Self {
        if pressed {
            Self {
                down: !self.held,
                held: true,
                released: false,
            }
        } else {
            Self {
                down: false,
                held: false,
                released: self.held,
            }
        }
    }
}
