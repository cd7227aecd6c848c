//! Heater/cooler relay pair driver.
//!
//! Drives two active-high relay outputs through `embedded-hal` digital
//! pins and implements [`ActuatorPort`] over them.
//!
//! ## Safety contract
//!
//! The pair must never be observably both-on: a heater fighting a
//! compressor wastes energy and stresses both loads. `set_outputs`
//! orders the writes so whichever relay is dropping falls before the
//! other one rises. Pin errors downgrade to a logged warning; the port
//! contract is total and the latched state tracks the commanded pair.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::ActuatorPort;

/// Relay pair over two push-pull GPIO outputs.
pub struct RelayPair<H: OutputPin, C: OutputPin> {
    heater: H,
    cooler: C,
    heater_on: bool,
    cooler_on: bool,
}

impl<H: OutputPin, C: OutputPin> RelayPair<H, C> {
    /// Wrap the two output pins. Both relays are driven low immediately
    /// so the pair starts in a known-off state.
    pub fn new(heater: H, cooler: C) -> Self {
        let mut pair = Self {
            heater,
            cooler,
            heater_on: false,
            cooler_on: false,
        };
        pair.drive(false, false);
        pair
    }

    /// Latched heater relay position.
    pub fn heater_on(&self) -> bool {
        self.heater_on
    }

    /// Latched cooler relay position.
    pub fn cooler_on(&self) -> bool {
        self.cooler_on
    }

    fn drive(&mut self, heater_on: bool, cooler_on: bool) {
        // Falling relay first, rising relay second.
        if !heater_on {
            write_pin(&mut self.heater, false, "heater");
        }
        if !cooler_on {
            write_pin(&mut self.cooler, false, "cooler");
        }
        if heater_on {
            write_pin(&mut self.heater, true, "heater");
        }
        if cooler_on {
            write_pin(&mut self.cooler, true, "cooler");
        }
        self.heater_on = heater_on;
        self.cooler_on = cooler_on;
    }
}

impl<H: OutputPin, C: OutputPin> ActuatorPort for RelayPair<H, C> {
    fn set_outputs(&mut self, heater_on: bool, cooler_on: bool) {
        self.drive(heater_on, cooler_on);
    }
}

fn write_pin(pin: &mut impl OutputPin, high: bool, label: &str) {
    let result = if high { pin.set_high() } else { pin.set_low() };
    if let Err(e) = result {
        warn!("relay '{label}' write failed: {e:?}");
    }
}
