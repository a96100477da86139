use std::io;

/// Crate-wide result alias; nearly every fallible function in this driver
/// returns one of these instead of unwinding.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure mode the driver can surface, from the UART up to the
/// supervisory state machine.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No terminal line observed within `timeout_ms`.
    #[error("AT command timed out")]
    Timeout,

    /// The modem answered with a bare `ERROR`.
    #[error("modem returned ERROR")]
    ModemError,

    /// The modem answered with the bare NUL terminator (seen during boot).
    #[error("modem returned NUL terminator")]
    NullTerminated,

    /// The serial port could not be opened or returned an I/O error.
    #[error("serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// A blocking read/write on the underlying transport failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// GPIO power-pin control failed.
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead { path: String, source: io::Error },

    /// The configuration file was not valid JSON for the expected schema.
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        source: serde_json::Error,
    },

    /// A modem operation could not be carried out because a prior step in
    /// the same sequence did not finish cleanly.
    #[error("modem operation failed: {0}")]
    Operation(String),
}
