use crate::components::gpio::Pin;

/// Mapping from logical bus lines to the pins they are soldered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wiring {
    pub address: [Pin; 12],
    /// A12 doubles as the ROM chip-select.
    pub chip_select: Pin,
    pub data: [Pin; 8],
    pub access_led: Pin,
}

impl Wiring {
    pub const STANDARD: Wiring = Wiring {
        address: [
            Pin::PA15,
            Pin::PB3,
            Pin::PB4,
            Pin::PB5,
            Pin::PB6,
            Pin::PB7,
            Pin::PB8,
            Pin::PB9,
            Pin::PA0,
            Pin::PA1,
            Pin::PA3,
            Pin::PA2,
        ],
        chip_select: Pin::PA4,
        data: [
            Pin::PA8,
            Pin::PA9,
            Pin::PA10,
            Pin::PB11,
            Pin::PB10,
            Pin::PB13,
            Pin::PB14,
            Pin::PB15,
        ],
        access_led: Pin::PC13,
    };

    pub fn address_line(&self, pin: Pin) -> Option<usize> {
        self.address.iter().position(|p| *p == pin)
    }

    pub fn data_line(&self, pin: Pin) -> Option<usize> {
        self.data.iter().position(|p| *p == pin)
    }
}

impl Default for Wiring {
    fn default() -> Self {
        Self::STANDARD
    }
}
