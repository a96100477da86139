//! Binary entry point: wires configuration, the serial port, the GPIO
//! power pin, and the logging sink into the application state machine,
//! then drives it until it halts in `Error`.

use clap::Parser;
use log::{error, Level};

use sim7080_driver::app::App;
use sim7080_driver::at::{RealSerialPort, SerialPort};
use sim7080_driver::config::Config;
use sim7080_driver::critical;
use sim7080_driver::gpio::{ModemPin, NullPin};
use sim7080_driver::logging::StdoutLogger;
use sim7080_driver::modem::Sim7080;
use sim7080_driver::time::LoggingClockSink;

#[derive(Parser, Debug)]
#[command(name = "sim7080d", about = "SIM7080G modem driver")]
struct Args {
    /// Path to the JSON configuration file. Defaults to config.json in
    /// the current directory when omitted.
    #[arg(long)]
    config: Option<String>,

    /// BCM GPIO pin number driving the modem's power toggle. Only
    /// meaningful when built with the `gpio` feature; otherwise a no-op
    /// pin is used and this flag is ignored.
    #[arg(long)]
    power_pin: Option<u8>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_level(s: &str) -> Level {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "warn" | "warning" => Level::Warn,
        "error" | "critical" => Level::Error,
        _ => Level::Info,
    }
}

/// Drives the state machine until it halts. `Error` is the only terminal
/// state (Idle/Track cycle forever otherwise), so this always returns
/// once the modem or a configuration step fails unrecoverably.
/// `config_path` is the same path already used to open the serial port,
/// so the Configuration state reloads that exact file rather than
/// whatever `config.json` happens to resolve to in the working directory.
fn run<P: SerialPort, G: ModemPin>(modem: Sim7080<P, G>, config_path: Option<String>) {
    let mut app = App::new(modem, Box::new(LoggingClockSink), config_path);
    while !app.state().is_terminal() {
        app.step();
    }
}

fn main() {
    let args = Args::parse();
    StdoutLogger::install("sim7080d", parse_level(&args.log_level))
        .expect("logger installed exactly once at process start");

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            critical!("failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let port = match RealSerialPort::open(&config.serial.port, config.serial.baud_rate) {
        Ok(port) => port,
        Err(e) => {
            critical!("failed to open serial port {}: {e}", config.serial.port);
            std::process::exit(1);
        }
    };

    cfg_if_gpio(port, args.power_pin, args.config);
    critical!("application state machine halted in Error state");
    std::process::exit(1);
}

#[cfg(feature = "gpio")]
fn cfg_if_gpio(port: RealSerialPort, power_pin: Option<u8>, config_path: Option<String>) {
    use sim7080_driver::gpio::RpiPowerPin;

    match power_pin {
        Some(pin) => match RpiPowerPin::new(pin) {
            Ok(pin) => run(Sim7080::new(port, pin), config_path),
            Err(e) => error!("failed to open GPIO pin: {e}"),
        },
        None => run(Sim7080::new(port, NullPin), config_path),
    }
}

#[cfg(not(feature = "gpio"))]
fn cfg_if_gpio(port: RealSerialPort, _power_pin: Option<u8>, config_path: Option<String>) {
    run(Sim7080::new(port, NullPin), config_path)
}
