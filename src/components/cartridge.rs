use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::components::gpio::{Gpio, Level, Pin, PinMode, SimulatedPort};
use crate::components::wiring::Wiring;
use crate::KIB;

pub const MAX_ROM_SIZE: usize = 4 * KIB;

#[derive(Debug, Error)]
pub enum RomError {
    #[error("Cartridge image is empty")]
    Empty,
    #[error("Cartridge image is {0} bytes, at most {} supported", MAX_ROM_SIZE)]
    TooLarge(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A 4 KiB cartridge ROM. Smaller images are mirrored across the window.
#[derive(Clone)]
pub struct CartridgeRom {
    rom: Box<[u8; MAX_ROM_SIZE]>,
}

impl CartridgeRom {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let image = fs::read(path)?;
        Self::try_from(image)
    }

    pub fn read(&self, offset: u16) -> u8 {
        self.rom[offset as usize % MAX_ROM_SIZE]
    }
}

impl TryFrom<Vec<u8>> for CartridgeRom {
    type Error = RomError;

    fn try_from(image: Vec<u8>) -> Result<Self, Self::Error> {
        if image.is_empty() {
            return Err(RomError::Empty);
        }
        if image.len() > MAX_ROM_SIZE {
            return Err(RomError::TooLarge(image.len()));
        }
        let mut rom = Box::new([0; MAX_ROM_SIZE]);
        for (i, byte) in rom.iter_mut().enumerate() {
            *byte = image[i % image.len()];
        }
        Ok(Self { rom })
    }
}

impl std::fmt::Debug for CartridgeRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartridgeRom({} bytes)", MAX_ROM_SIZE)
    }
}

/// Host-side stand-in for the microcontroller ports with a cartridge plugged into the slot.
#[derive(Debug)]
pub struct SimulatedSlot {
    wiring: Wiring,
    rom: CartridgeRom,
    port: SimulatedPort,
    contention_events: usize,
    chip_select_assertions: usize,
}

impl SimulatedSlot {
    pub fn new(rom: CartridgeRom, wiring: Wiring) -> Self {
        Self {
            wiring,
            rom,
            port: SimulatedPort::default(),
            contention_events: 0,
            chip_select_assertions: 0,
        }
    }

    /// Number of times the cartridge and the controller drove the data bus at once.
    pub fn contention_events(&self) -> usize {
        self.contention_events
    }

    pub fn chip_select_assertions(&self) -> usize {
        self.chip_select_assertions
    }

    pub fn level(&self, pin: Pin) -> Level {
        self.port.level(pin)
    }

    pub fn mode(&self, pin: Pin) -> PinMode {
        self.port.mode(pin)
    }

    /// The address currently presented on A0..A11.
    pub fn address_lines(&self) -> u16 {
        self.wiring
            .address
            .iter()
            .enumerate()
            .filter(|(_, pin)| self.level(**pin).is_high())
            .fold(0, |address, (bit, _)| address | (1 << bit))
    }

    /// The byte the controller is driving on D0..D7, ignoring lines that are inputs.
    pub fn driven_data(&self) -> u8 {
        self.wiring
            .data
            .iter()
            .enumerate()
            .filter(|(_, pin)| self.mode(**pin) == PinMode::Output && self.level(**pin).is_high())
            .fold(0, |data, (bit, _)| data | (1 << bit))
    }

    fn cartridge_selected(&self) -> bool {
        self.level(self.wiring.chip_select).is_high()
    }

    fn controller_drives_data(&self) -> bool {
        self.wiring
            .data
            .iter()
            .any(|pin| self.mode(*pin) == PinMode::Output)
    }

    fn check_contention(&mut self) {
        if self.cartridge_selected() && self.controller_drives_data() {
            self.contention_events += 1;
            log::error!(
                "Bus contention at address {:#06x}",
                self.address_lines()
            );
        }
    }
}

impl Gpio for SimulatedSlot {
    fn set_pin(&mut self, pin: Pin, level: Level) {
        let rising = pin == self.wiring.chip_select
            && level.is_high()
            && !self.level(pin).is_high();
        self.port.set_pin(pin, level);
        if rising {
            self.chip_select_assertions += 1;
            self.check_contention();
        }
    }

    fn read_pin(&mut self, pin: Pin) -> Level {
        if self.mode(pin) == PinMode::Output {
            return self.level(pin);
        }
        match self.wiring.data_line(pin) {
            Some(bit) if self.cartridge_selected() => {
                let byte = self.rom.read(self.address_lines());
                Level::from(byte & (1 << bit) != 0)
            }
            _ => self.port.read_pin(pin),
        }
    }

    fn set_pin_mode(&mut self, pin: Pin, mode: PinMode) {
        self.port.set_pin_mode(pin, mode);
        if mode == PinMode::Output && self.wiring.data_line(pin).is_some() {
            self.check_contention();
        }
    }
}
