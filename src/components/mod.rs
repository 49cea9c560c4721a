pub mod bus;
pub mod cartridge;
pub mod gpio;
pub mod indicator;
pub mod wiring;
