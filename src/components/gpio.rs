use strum::EnumCount;
use strum_macros::{Display, EnumIter};

/// Microcontroller port pins that the cartridge slot and the access LED are wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, strum_macros::EnumCount)]
pub enum Pin {
    PA0,
    PA1,
    PA2,
    PA3,
    PA4,
    PA8,
    PA9,
    PA10,
    PA15,
    PB3,
    PB4,
    PB5,
    PB6,
    PB7,
    PB8,
    PB9,
    PB10,
    PB11,
    PB13,
    PB14,
    PB15,
    PC13,
}

impl Pin {
    pub fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(&self) -> bool {
        *self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PinMode {
    Input,
    InputPullUp,
    Output,
}

/// Pin-level access to the microcontroller ports.
pub trait Gpio {
    fn set_pin(&mut self, pin: Pin, level: Level);
    fn read_pin(&mut self, pin: Pin) -> Level;
    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode);
}

/// Port register model: remembers the last level and mode written to every pin.
#[derive(Debug, Clone)]
pub struct SimulatedPort {
    levels: [Level; Pin::COUNT],
    modes: [PinMode; Pin::COUNT],
}

impl SimulatedPort {
    pub fn level(&self, pin: Pin) -> Level {
        self.levels[pin.index()]
    }

    pub fn mode(&self, pin: Pin) -> PinMode {
        self.modes[pin.index()]
    }
}

impl Default for SimulatedPort {
    fn default() -> Self {
        Self {
            levels: [Level::Low; Pin::COUNT],
            modes: [PinMode::Input; Pin::COUNT],
        }
    }
}

impl Gpio for SimulatedPort {
    fn set_pin(&mut self, pin: Pin, level: Level) {
        self.levels[pin.index()] = level;
    }

    /// Outputs read back what they drive. Floating inputs read low.
    fn read_pin(&mut self, pin: Pin) -> Level {
        match self.mode(pin) {
            PinMode::Output => self.level(pin),
            PinMode::InputPullUp => Level::High,
            PinMode::Input => Level::Low,
        }
    }

    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode) {
        self.modes[pin.index()] = mode;
    }
}
