//! Abstraction over the modem's power-toggle pin.

use log::info;

use crate::error::Result;

/// A single GPIO output pin driving the modem's power control line.
pub trait ModemPin {
    fn set_high(&mut self) -> Result<()>;
    fn set_low(&mut self) -> Result<()>;
}

/// A pin that only logs the transition. Used on hosts without real GPIO
/// (desktop development, tests) and whenever the `gpio` feature is off.
pub struct NullPin;

impl ModemPin for NullPin {
    fn set_high(&mut self) -> Result<()> {
        info!("modem power pin -> high (no-op pin)");
        Ok(())
    }

    fn set_low(&mut self) -> Result<()> {
        info!("modem power pin -> low (no-op pin)");
        Ok(())
    }
}

#[cfg(feature = "gpio")]
pub use rpi::RpiPowerPin;

#[cfg(feature = "gpio")]
mod rpi {
    use rppal::gpio::{Gpio, OutputPin};

    use super::ModemPin;
    use crate::error::{Error, Result};

    /// Drives the modem power pin through `rppal` on Raspberry-Pi-class hosts.
    pub struct RpiPowerPin {
        pin: OutputPin,
    }

    impl RpiPowerPin {
        pub fn new(bcm_pin: u8) -> Result<Self> {
            let pin = Gpio::new()
                .map_err(|e| Error::Gpio(e.to_string()))?
                .get(bcm_pin)
                .map_err(|e| Error::Gpio(e.to_string()))?
                .into_output();
            Ok(Self { pin })
        }
    }

    impl ModemPin for RpiPowerPin {
        fn set_high(&mut self) -> Result<()> {
            self.pin.set_high();
            Ok(())
        }

        fn set_low(&mut self) -> Result<()> {
            self.pin.set_low();
            Ok(())
        }
    }
}
