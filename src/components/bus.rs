use thiserror::Error;

use crate::components::gpio::{Gpio, Level, PinMode};
use crate::components::wiring::Wiring;
use crate::HexWord;

/// Width of the console CPU address space. A12 is the cartridge chip-select.
pub const ADDRESS_MASK: u16 = 0x1FFF;
/// First address of the cartridge ROM. Below it the controller drives the data bus.
pub const ROM_BOUNDARY: u16 = 0x1000;
pub const RESET_VECTOR: u16 = 0xFFFC;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("Refused to enable chip-select at {address} while driving the data bus")]
    Contention { address: HexWord },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BusState {
    pub address: u16,
    pub drive_data_bus: bool,
    pub data_shadow: u8,
    pub chip_select: bool,
}

impl BusState {
    pub fn is_safe(&self) -> bool {
        !(self.chip_select && self.drive_data_bus)
    }
}

impl std::fmt::Display for BusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "address: {:#06x}, direction: {}, data: {:#04x}, chip-select: {}",
            self.address,
            if self.drive_data_bus { "out" } else { "in" },
            self.data_shadow,
            if self.chip_select { "on" } else { "off" }
        )
    }
}

/// Sole owner of the cartridge slot lines.
pub struct CartridgeBus<G: Gpio> {
    gpio: G,
    wiring: Wiring,
    state: BusState,
}

impl<G: Gpio> CartridgeBus<G> {
    pub fn new(gpio: G, wiring: Wiring) -> Self {
        let mut bus = Self {
            gpio,
            wiring,
            state: BusState::default(),
        };
        for pin in bus.wiring.address {
            bus.gpio.set_pin_mode(pin, PinMode::Output);
        }
        bus.gpio.set_pin_mode(bus.wiring.chip_select, PinMode::Output);
        bus.data_bus_input();
        bus.disable_chip_select();
        bus.set_address(RESET_VECTOR);
        bus
    }

    pub fn state(&self) -> BusState {
        self.state
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    pub fn set_address(&mut self, address: u16) {
        self.disable_chip_select();

        let address = address & ADDRESS_MASK;
        self.state.address = address;
        if address < ROM_BOUNDARY {
            self.data_bus_output();
        } else {
            self.data_bus_input();
        }

        for (bit, pin) in self.wiring.address.iter().enumerate() {
            self.gpio.set_pin(*pin, Level::from(address & (1 << bit) != 0));
        }
        log::trace!("Bus address set: {}", self.state);
        self.check_invariant();
    }

    /// Drives the data lines. Only meaningful while the bus is in output mode.
    pub fn set_data_bus(&mut self, value: u8) {
        if !self.state.drive_data_bus {
            log::warn!(
                "Writing data {:#04x} while the data bus is an input at {:#06x}",
                value,
                self.state.address
            );
        }
        self.state.data_shadow = value;
        for (bit, pin) in self.wiring.data.iter().enumerate() {
            self.gpio.set_pin(*pin, Level::from(value & (1 << bit) != 0));
        }
    }

    pub fn data_bus(&mut self) -> u8 {
        if self.state.drive_data_bus {
            return self.state.data_shadow;
        }
        let mut value = 0;
        for (bit, pin) in self.wiring.data.iter().enumerate() {
            if self.gpio.read_pin(*pin).is_high() {
                value |= 1 << bit;
            }
        }
        value
    }

    pub fn enable_chip_select(&mut self) -> Result<(), BusError> {
        if self.state.drive_data_bus {
            log::error!(
                "Chip-select requested while driving the data bus: {}",
                self.state
            );
            self.disable_chip_select();
            return Err(BusError::Contention {
                address: HexWord(self.state.address),
            });
        }
        self.gpio.set_pin(self.wiring.chip_select, Level::High);
        self.state.chip_select = true;
        self.check_invariant();
        Ok(())
    }

    pub fn disable_chip_select(&mut self) {
        self.gpio.set_pin(self.wiring.chip_select, Level::Low);
        self.state.chip_select = false;
    }

    /// Reads one byte: cartridge output in the ROM window, the controller's own shadow below it.
    pub fn read(&mut self, address: u16) -> Result<u8, BusError> {
        self.set_address(address);
        if !self.state.drive_data_bus {
            self.enable_chip_select()?;
        }
        Ok(self.data_bus())
    }

    /// Presents `data` at `address` as if the console had read it from memory.
    pub fn emulate_read(&mut self, address: u16, data: u8) {
        self.set_address(address);
        self.set_data_bus(data);
    }

    fn data_bus_input(&mut self) {
        self.state.drive_data_bus = false;
        self.set_data_mode(PinMode::InputPullUp);
    }

    fn data_bus_output(&mut self) {
        // Chip-select must already be off before the lines turn into outputs.
        debug_assert!(!self.state.chip_select);
        self.state.drive_data_bus = true;
        self.set_data_mode(PinMode::Output);
    }

    fn set_data_mode(&mut self, mode: PinMode) {
        for pin in self.wiring.data {
            self.gpio.set_pin_mode(pin, mode);
        }
    }

    fn check_invariant(&self) {
        debug_assert!(self.state.is_safe(), "Unsafe bus state: {}", self.state);
    }
}
