//! The supervisory state machine: Boot -> Configuration -> Idle <-> Track,
//! with Error as an absorbing sink. One `step()` call advances the
//! machine by exactly one state transition, so the binary entry point can
//! drive it in a plain loop without needing to understand the states.

use std::thread;
use std::time::Duration;

use log::{error, info, warn};
use serde_json::json;

use crate::at::SerialPort;
use crate::config::Config;
use crate::gpio::ModemPin;
use crate::modem::Sim7080;
use crate::time::ClockSink;

/// The closed set of application states. `Error` is absorbing: once
/// reached, `step()` is a no-op other than logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Boot,
    Configuration,
    Idle,
    Track,
    Error,
}

impl AppState {
    pub fn is_terminal(self) -> bool {
        matches!(self, AppState::Error)
    }
}

/// Drives the modem facade through one bring-up/telemetry cycle per
/// `step()` call.
pub struct App<P: SerialPort, G: ModemPin> {
    modem: Sim7080<P, G>,
    config_path: Option<String>,
    config: Option<Config>,
    clock_sink: Box<dyn ClockSink>,
    state: AppState,
}

impl<P: SerialPort, G: ModemPin> App<P, G> {
    /// `config_path` is the same path the binary entry point resolved to
    /// open the serial port, so the Configuration state loads the exact
    /// file the caller named instead of silently falling back to the
    /// default.
    pub fn new(modem: Sim7080<P, G>, clock_sink: Box<dyn ClockSink>, config_path: Option<String>) -> Self {
        Self {
            modem,
            config_path,
            config: None,
            clock_sink,
            state: AppState::Boot,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// Advances the state machine by one transition. Any error raised by
    /// a state handler is logged and the machine moves to `Error` rather
    /// than unwinding the caller.
    pub fn step(&mut self) {
        let result = match self.state {
            AppState::Boot => self.do_boot(),
            AppState::Configuration => self.do_configuration(),
            AppState::Idle => self.do_idle(),
            AppState::Track => self.do_track(),
            AppState::Error => {
                crate::critical!("application state machine halted in Error state");
                return;
            }
        };
        if let Err(e) = result {
            error!("state handler failed: {e}");
            self.state = AppState::Error;
        }
    }

    fn do_boot(&mut self) -> crate::error::Result<()> {
        info!("booting: power-cycling and probing modem");
        self.modem.initialize(true)?;
        self.state = AppState::Configuration;
        Ok(())
    }

    fn do_configuration(&mut self) -> crate::error::Result<()> {
        let config = Config::load(self.config_path.as_deref())?;

        if !self.modem.setup_lte() {
            return Err(crate::error::Error::Operation("setup_lte failed".to_string()));
        }

        log_identity(&mut self.modem);

        thread::sleep(Duration::from_secs(5));

        if !self.modem.setup_pdp_context() {
            return Err(crate::error::Error::Operation(
                "setup_pdp_context failed".to_string(),
            ));
        }
        for (id, up, ip) in self.modem.get_ip_addresses() {
            info!("PDP context {id}: up={up} ip={ip}");
        }

        self.modem.sync_ntp_time(
            &config.time.ntp_server,
            config.time.timezone_offset,
            self.clock_sink.as_mut(),
        )?;

        self.modem.setup_aws_context(
            &config.aws_config.smconf,
            &config.aws_config.csslcfg,
            &config.aws_config.smssl,
        );

        self.config = Some(config);
        self.state = AppState::Idle;
        Ok(())
    }

    fn do_idle(&mut self) -> crate::error::Result<()> {
        let interval = self
            .config
            .as_ref()
            .map(|c| c.tracking.camping_interval)
            .unwrap_or(300);
        thread::sleep(Duration::from_secs(interval));
        self.state = AppState::Track;
        Ok(())
    }

    fn do_track(&mut self) -> crate::error::Result<()> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| crate::error::Error::Operation("track before configuration".to_string()))?
            .clone();

        self.modem.turn_on_gnss();
        match self.modem.get_gnss_position() {
            Some(fix) => info!("gnss fix: {fix:?}"),
            None => info!("gnss: no fix yet"),
        }
        self.modem.turn_off_gnss();

        for urc in self.modem.urc_drain() {
            if urc.starts_with(crate::at::urc::NORMAL_POWER_DOWN) {
                warn!("modem reported NORMAL POWER DOWN during track cycle");
            }
        }

        if !self.modem.connect_aws() {
            return Err(crate::error::Error::Operation("connect_aws failed".to_string()));
        }

        let network_info = self.modem.get_network_info();
        let payload = json!({
            "state": {
                "reported": {
                    "network_info": network_info.fields,
                }
            }
        });
        self.modem
            .publish_mqtt(&config.aws_config.mqtt_update_topic, &payload.to_string(), 0, 0);
        self.modem.disconnect_aws();

        self.state = AppState::Idle;
        Ok(())
    }
}

fn log_identity<P: SerialPort, G: ModemPin>(modem: &mut Sim7080<P, G>) {
    let manufacturer = modem.get_manufacturer().unwrap_or_else(|_| "unknown".to_string());
    let model = modem.get_model().unwrap_or_else(|_| "unknown".to_string());
    let revision = modem.get_revision().unwrap_or_else(|_| "unknown".to_string());
    let imsi = modem.get_imsi().unwrap_or_else(|_| "unknown".to_string());
    let imei = modem.get_imei().unwrap_or_else(|_| "unknown".to_string());
    info!("modem identity: {manufacturer} {model} rev {revision}, IMSI {imsi}, IMEI {imei}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::at::fake::ScriptedSerialPort;
    use crate::gpio::NullPin;
    use chrono::{DateTime, FixedOffset};

    struct NoopSink;
    impl ClockSink for NoopSink {
        fn set_datetime(&mut self, _datetime: DateTime<FixedOffset>) -> crate::error::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn boot_succeeds_and_advances_to_configuration() {
        let port = ScriptedSerialPort::new(vec![
            ("AT\r\n", b"AT\r\r\nOK\r\n" as &[u8]),
            ("AT+CMEE=2\r\n", b"AT+CMEE=2\r\r\nOK\r\n"),
        ]);
        let modem = Sim7080::new(port, NullPin);
        let mut app = App::new(modem, Box::new(NoopSink), None);
        assert_eq!(app.state(), AppState::Boot);
        app.step();
        assert_eq!(app.state(), AppState::Configuration);
    }

    #[test]
    fn configuration_failure_transitions_to_error() {
        // Points at a path that doesn't exist, so Config::load fails and
        // the state machine moves to Error without touching the modem.
        let port = ScriptedSerialPort::empty();
        let modem = Sim7080::new(port, NullPin);
        let mut app = App::new(
            modem,
            Box::new(NoopSink),
            Some("no-such-config-file.json".to_string()),
        );
        app.state = AppState::Configuration;
        app.step();
        assert_eq!(app.state(), AppState::Error);
    }

    #[test]
    fn error_state_is_terminal_and_absorbing() {
        assert!(AppState::Error.is_terminal());
        assert!(!AppState::Idle.is_terminal());
    }
}
