//! Byte-stream to line framer.
//!
//! Ordinary responses are newline-terminated, but the send-prompt tokens
//! (`>` and `DOWNLOAD`) are not — the modem stalls waiting for payload the
//! instant it has written them, so the framer must yield them the moment
//! they're unambiguous rather than waiting for a trailing `\n` that will
//! never come. Implemented as a small pushdown over an accumulator rather
//! than a call to a newline-splitting iterator, since the framer is fed
//! one read's worth of bytes at a time and must carry partial state
//! between calls.

const DOWNLOAD_TOKEN: &[u8] = b"DOWNLOAD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete, trimmed, non-empty text line.
    Line(String),
    /// The single-character send-prompt `>`.
    Prompt,
    /// The word `DOWNLOAD`, used as an alternate send-prompt by some commands.
    Download,
    /// A bare NUL byte line, seen after power-up transitions.
    Nul,
}

#[derive(Default)]
pub struct Framer {
    current: Vec<u8>,
}

impl Framer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of freshly-read bytes and returns every frame that
    /// became complete as a result, in arrival order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        for &byte in bytes {
            match byte {
                b'\n' => self.flush_line(&mut frames),
                b'>' if self.current.is_empty() => frames.push(Frame::Prompt),
                _ => {
                    self.current.push(byte);
                    if self.current == DOWNLOAD_TOKEN {
                        frames.push(Frame::Download);
                        self.current.clear();
                    }
                }
            }
        }
        frames
    }

    fn flush_line(&mut self, frames: &mut Vec<Frame>) {
        let raw = std::mem::take(&mut self.current);
        if raw == [0u8] {
            frames.push(Frame::Nul);
            return;
        }
        let text = String::from_utf8_lossy(&raw);
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            frames.push(Frame::Line(trimmed.to_string()));
        }
    }
}
