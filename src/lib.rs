//! A driver for SIM7080G-family LTE-M/NB-IoT modems: AT command transport,
//! a typed operations facade, and a supervisory state machine that brings
//! up a PDP context, synchronizes time, and publishes telemetry over MQTT.

pub mod app;
pub mod at;
pub mod config;
pub mod error;
pub mod gpio;
pub mod logging;
pub mod modem;
pub mod time;

pub use app::{App, AppState};
pub use config::Config;
pub use error::{Error, Result};
pub use modem::Sim7080;
