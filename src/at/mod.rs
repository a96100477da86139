//! The AT command transport layer: line framing, the per-request state
//! machine, and the URC catalog/ring. This is the core of the driver.

pub mod fake;
pub mod framer;
pub mod request;
pub mod serial;
pub mod transport;
pub mod urc;

pub use framer::{Frame, Framer};
pub use request::{AtRequest, AtRequestKind, AtRequestState};
pub use serial::{RealSerialPort, SerialPort};
pub use transport::Transport;
pub use urc::{UrcRing, URC_PREFIXES};
