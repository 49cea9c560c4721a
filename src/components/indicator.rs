use std::thread;
use std::time::Duration;

use crate::components::gpio::{Gpio, Level, Pin, PinMode};

/// Access LED bracketing every bus transaction.
pub trait ActivityIndicator {
    fn on(&mut self);
    fn off(&mut self);

    fn blink(&mut self, times: usize, on_time: Duration, off_time: Duration) {
        for _ in 0..times {
            self.on();
            thread::sleep(on_time);
            self.off();
            thread::sleep(off_time);
        }
    }
}

/// Active-low LED on a port pin: the pin sinks current while lit.
#[derive(Debug)]
pub struct AccessLed<G: Gpio> {
    gpio: G,
    pin: Pin,
    lit: bool,
    activations: u64,
}

impl<G: Gpio> AccessLed<G> {
    /// Configures `pin` as an output and leaves the LED off.
    pub fn new(mut gpio: G, pin: Pin) -> Self {
        gpio.set_pin_mode(pin, PinMode::Output);
        gpio.set_pin(pin, Level::High);
        Self {
            gpio,
            pin,
            lit: false,
            activations: 0,
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn activations(&self) -> u64 {
        self.activations
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }
}

impl<G: Gpio> ActivityIndicator for AccessLed<G> {
    fn on(&mut self) {
        if !self.lit {
            self.activations += 1;
        }
        self.gpio.set_pin(self.pin, Level::Low);
        self.lit = true;
        log::trace!("Access LED on ({} low)", self.pin);
    }

    fn off(&mut self) {
        self.gpio.set_pin(self.pin, Level::High);
        self.lit = false;
        log::trace!("Access LED off ({} high)", self.pin);
    }
}
