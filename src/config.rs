//! JSON configuration loading.
//!
//! The file mirrors the struct hierarchy below:
//!
//! ```json
//! {
//!   "serial": { "port": "/dev/ttyS0", "baud_rate": 9600 },
//!   "time": { "ntp_server": "pool.ntp.org", "timezone_offset": 1 },
//!   "aws_config": {
//!     "smconf": ["\"CLIENTID\",\"device-1\""],
//!     "csslcfg": ["\"cacert\",0,\"cacert.pem\""],
//!     "smssl": ["1,0"],
//!     "mqtt_update_topic": "devices/device-1/update"
//!   },
//!   "tracking": { "camping_interval": 300 }
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

const DEFAULT_CONFIG_PATH: &str = "config.json";
const DEFAULT_CAMPING_INTERVAL: u64 = 300;
const DEFAULT_BAUD_RATE: u32 = 9600;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    pub time: TimeConfig,
    pub aws_config: AwsConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

/// UART settings for the modem link.
#[derive(Debug, Clone, Deserialize)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// NTP server and timezone used by `sync_ntp_time`.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeConfig {
    pub ntp_server: String,
    /// Signed hour offset; the facade multiplies this by 4 before sending
    /// it to the modem, which counts in quarter-hours.
    pub timezone_offset: i32,
}

/// Parameter lists forwarded verbatim to the AWS IoT bring-up commands.
#[derive(Debug, Clone, Deserialize)]
pub struct AwsConfig {
    #[serde(default)]
    pub smconf: Vec<String>,
    #[serde(default)]
    pub csslcfg: Vec<String>,
    #[serde(default)]
    pub smssl: Vec<String>,
    pub mqtt_update_topic: String,
}

/// Cadence of the Idle/Track cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_camping_interval")]
    pub camping_interval: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            camping_interval: default_camping_interval(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

fn default_camping_interval() -> u64 {
    DEFAULT_CAMPING_INTERVAL
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_serial_port() -> String {
    "/dev/ttyS0".to_string()
}

impl Config {
    /// Loads configuration from `path`, or `config.json` in the current
    /// directory when `path` is `None`. Never panics: failures come back
    /// as `Error::ConfigRead`/`Error::ConfigParse` so the caller can
    /// transition the application state machine to `Error` instead of
    /// aborting the process.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);
        let content =
            std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
                path: path.to_string(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_string(),
            source,
        })
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load(path.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_a_well_formed_document() {
        let f = write_temp(
            r#"{
                "serial": {"port": "/dev/ttyUSB0", "baud_rate": 115200},
                "time": {"ntp_server": "pool.ntp.org", "timezone_offset": 2},
                "aws_config": {
                    "smconf": ["\"CLIENTID\",\"dev1\""],
                    "csslcfg": ["\"cacert\",0,\"ca.pem\""],
                    "smssl": ["1,0"],
                    "mqtt_update_topic": "devices/dev1/update"
                },
                "tracking": {"camping_interval": 120}
            }"#,
        );
        let config = Config::load(Some(f.path().to_str().unwrap())).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.time.ntp_server, "pool.ntp.org");
        assert_eq!(config.time.timezone_offset, 2);
        assert_eq!(config.tracking.camping_interval, 120);
        assert_eq!(config.aws_config.mqtt_update_topic, "devices/dev1/update");
    }

    #[test]
    fn defaults_camping_interval_when_omitted() {
        let f = write_temp(
            r#"{
                "time": {"ntp_server": "pool.ntp.org", "timezone_offset": 0},
                "aws_config": {"mqtt_update_topic": "t"}
            }"#,
        );
        let config = Config::load(Some(f.path().to_str().unwrap())).unwrap();
        assert_eq!(config.tracking.camping_interval, DEFAULT_CAMPING_INTERVAL);
        assert_eq!(config.serial.baud_rate, DEFAULT_BAUD_RATE);
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        let err = Config::load(Some("/nonexistent/path/config.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let f = write_temp("not json");
        let err = Config::load(Some(f.path().to_str().unwrap())).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }
}
