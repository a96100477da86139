//! The AT command transport: a line-oriented, half-duplex request/response
//! engine. This is the part of the driver that is not self-framing —
//! responses and URCs share one channel, and several commands switch into
//! a payload-upload sub-protocol mid-flight.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error};

use super::framer::{Frame, Framer};
use super::request::{AtRequest, AtRequestState};
use super::serial::SerialPort;
use super::urc::{self, UrcRing};

/// Maximum payload bytes per send-prompt write burst.
const SEND_CHUNK_SIZE: usize = 100;
/// Pause between send-prompt write bursts, to respect the modem's
/// flow-control window.
const SEND_CHUNK_DELAY: Duration = Duration::from_millis(100);

/// Owns the serial port and the URC ring for the lifetime of the driver.
/// The queue is a plain FIFO — there is exactly one caller and one thread,
/// so no thread-safe mailbox is warranted.
pub struct Transport<P: SerialPort> {
    port: P,
    queue: std::collections::VecDeque<AtRequest>,
    urc_ring: UrcRing,
    framer: Framer,
}

impl<P: SerialPort> Transport<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            queue: std::collections::VecDeque::new(),
            urc_ring: UrcRing::default(),
            framer: Framer::new(),
        }
    }

    /// Places `req` at the tail of the queue. O(1), no I/O.
    pub fn enqueue(&mut self, mut req: AtRequest) {
        req.state = AtRequestState::Scheduled;
        self.queue.push_back(req);
    }

    /// Drains the queue in FIFO order, running each request to a terminal
    /// state, and returns the completed requests in the same order.
    /// Modem-level failures are not exceptions: the caller inspects
    /// `req.state`.
    pub fn run(&mut self) -> Vec<AtRequest> {
        let mut completed = Vec::with_capacity(self.queue.len());
        while let Some(mut req) = self.queue.pop_front() {
            self.execute(&mut req);
            completed.push(req);
        }
        completed
    }

    /// Enqueues `req`, drives a `run`, and returns the single completed
    /// request — the common case for facade operations built from one
    /// command.
    pub fn call(&mut self, req: AtRequest) -> AtRequest {
        self.enqueue(req);
        self.run().pop().expect("run() returns one entry per enqueued request")
    }

    /// Atomically takes and returns the accumulated URC lines.
    pub fn urc_drain(&mut self) -> Vec<String> {
        self.urc_ring.drain()
    }

    pub fn urc_contains(&self, prefix: &str) -> bool {
        self.urc_ring.contains_prefix(prefix)
    }

    fn execute(&mut self, req: &mut AtRequest) {
        let wire = req.wire_command();
        if let Err(e) = self.port.write(format!("{wire}\r\n").as_bytes()) {
            error!("UART write failed for {wire}: {e}");
            req.state = AtRequestState::Timeout;
            return;
        }
        debug!(">> {wire}");
        req.state = AtRequestState::Running;

        let t0 = Instant::now();
        let mut t1 = t0;

        // Loop while state ∈ {Running, RunningWait} and the deadline has
        // not been reached — expressed as a closed match plus a plain
        // timestamp comparison, not a bitwise combination of flags.
        while req.state.is_running() {
            let remaining = match req.state {
                AtRequestState::Running => req.timeout.checked_sub(t0.elapsed()),
                AtRequestState::RunningWait => req.afterrun.checked_sub(t1.elapsed()),
                _ => None,
            };
            let Some(remaining) = remaining else { break };
            if remaining.is_zero() {
                break;
            }

            let bytes = match self.port.read_ready(remaining) {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!("UART read failed for {wire}: {e}");
                    break;
                }
            };
            for frame in self.framer.feed(&bytes) {
                self.handle_frame(req, &wire, frame, &mut t1);
            }
        }

        match req.state {
            AtRequestState::Running => req.state = AtRequestState::Timeout,
            AtRequestState::RunningWait => req.state = AtRequestState::Finished,
            _ => {}
        }
        debug!("<< {wire} -> {:?}", req.state);
    }

    fn handle_frame(&mut self, req: &mut AtRequest, wire: &str, frame: Frame, t1: &mut Instant) {
        match frame {
            Frame::Line(line) => self.handle_line(req, wire, line, t1),
            Frame::Nul => req.state = AtRequestState::FinishedNull,
            Frame::Prompt | Frame::Download => self.send_payload(req),
        }
    }

    fn handle_line(&mut self, req: &mut AtRequest, wire: &str, line: String, t1: &mut Instant) {
        // Echo suppression must come first: an echoed write command whose
        // body starts with `head` must not be captured as a response.
        if line == wire {
            return;
        }
        if !req.head.is_empty() && line.starts_with(req.head.as_str()) {
            // Strips exactly two characters after `head` (the assumed
            // `": "` separator), matching the original behavior even
            // though a response that omits the space would lose its
            // first character.
            let value: String = line.chars().skip(req.head.chars().count() + 2).collect();
            req.res_tagged.push(value);
            return;
        }
        if line == "OK" {
            if !req.afterrun.is_zero() && req.state == AtRequestState::Running {
                req.state = AtRequestState::RunningWait;
                *t1 = Instant::now();
            } else {
                req.state = AtRequestState::Finished;
            }
            return;
        }
        if line == "ERROR" {
            req.state = AtRequestState::Failed;
            return;
        }
        if urc::is_urc(&line) {
            self.urc_ring.push(line);
        } else {
            req.res_other.push(line);
        }
    }

    fn send_payload(&mut self, req: &mut AtRequest) {
        if req.data.is_empty() {
            return;
        }
        for chunk in req.data.chunks(SEND_CHUNK_SIZE) {
            if let Err(e) = self.port.write(chunk) {
                error!("UART write failed mid send-prompt: {e}");
                return;
            }
            thread::sleep(SEND_CHUNK_DELAY);
        }
    }
}
