//! User interface - two command buttons and the board LEDs.
//!
//! ## Components
//!
//! - **Buttons**: ON and OFF keys. A short press toggles the light, a
//!   press held past the threshold dims it up (ON) or down (OFF) in steps
//!   until released.
//! - **LEDs**: network state and "peer found" indicators.

pub mod buttons;

use crate::zcl::{OnOff, StepMode};

/// Logical role of a command button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonRole {
    /// Switches the light on; held, steps the level up.
    On,
    /// Switches the light off; held, steps the level down.
    Off,
}

impl ButtonRole {
    pub const COUNT: usize = 2;

    /// Map a board key index to its role. Other keys have no command.
    pub const fn from_key(key: u8) -> Option<Self> {
        match key {
            0 => Some(ButtonRole::On),
            1 => Some(ButtonRole::Off),
            _ => None,
        }
    }

    /// Board key index of this role.
    pub const fn key(self) -> u8 {
        match self {
            ButtonRole::On => 0,
            ButtonRole::Off => 1,
        }
    }

    pub const fn index(self) -> usize {
        self.key() as usize
    }

    pub const fn on_off(self) -> OnOff {
        match self {
            ButtonRole::On => OnOff::On,
            ButtonRole::Off => OnOff::Off,
        }
    }

    pub const fn step_mode(self) -> StepMode {
        match self {
            ButtonRole::On => StepMode::Up,
            ButtonRole::Off => StepMode::Down,
        }
    }
}

/// Board LEDs by purpose.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Led {
    /// Blinks at startup.
    Status,
    /// Lit while joined to the network.
    Network,
    /// Lit once a light bulb has been found.
    PeerFound,
}

impl Led {
    /// Board LED index.
    pub const fn index(self) -> usize {
        match self {
            Led::Status => 0,
            Led::Network => 2,
            Led::PeerFound => 3,
        }
    }
}
