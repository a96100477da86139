//! Scripted serial port test double, shared by unit tests inside this
//! crate and by the integration tests under `tests/`.

use std::collections::VecDeque;
use std::time::Duration;

use super::serial::SerialPort;
use crate::error::Result;

/// Replies with a fixed byte string the first time its expected wire
/// command is seen, then moves on to the next scripted entry. Every write
/// is recorded so tests can assert on exact wire traffic (echo bytes,
/// send-prompt chunking, and so on).
pub struct ScriptedSerialPort {
    scripted: VecDeque<(String, Vec<u8>)>,
    pending: VecDeque<u8>,
    pub writes: Vec<Vec<u8>>,
}

impl ScriptedSerialPort {
    pub fn new(scripted: Vec<(&str, &[u8])>) -> Self {
        Self {
            scripted: scripted
                .into_iter()
                .map(|(cmd, resp)| (cmd.to_string(), resp.to_vec()))
                .collect(),
            pending: VecDeque::new(),
            writes: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// All bytes written, concatenated in order.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.writes.iter().flatten().copied().collect()
    }
}

impl SerialPort for ScriptedSerialPort {
    fn read_ready(&mut self, _timeout: Duration) -> Result<Vec<u8>> {
        if self.pending.is_empty() {
            if let Some((expected_write, response)) = self.scripted.pop_front() {
                if let Some(last_write) = self.writes.last() {
                    assert_eq!(
                        String::from_utf8_lossy(last_write).as_ref(),
                        expected_write,
                        "unexpected wire command"
                    );
                }
                self.pending.extend(response);
            } else {
                return Ok(Vec::new());
            }
        }
        Ok(self.pending.drain(..).collect())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.writes.push(bytes.to_vec());
        Ok(())
    }
}
