//! The closed catalog of unsolicited-result-code prefixes and the bounded
//! ring buffer that accumulates them between and during requests.

use std::collections::VecDeque;

/// Known URC prefixes. A line is a URC iff it isn't an echo, a tagged
/// response, or a terminator/prompt, and starts with one of these.
pub const URC_PREFIXES: &[&str] = &[
    "+CRING:",
    "+CREG:",
    "+CMTI:",
    "+CMT:",
    "+CBM:",
    "+CDS:",
    "*PSNWID:",
    "*PSUTTZ:",
    "+CTZV:",
    "DST:",
    "+CPIN:",
    "NORMAL POWER DOWN",
    "UNDER-VOLTAGE POWER DOWN",
    "UNDER-VOLTAGE WARNNING",
    "OVER-VOLTAGE POWER DOWN",
    "OVER-VOLTAGE WARNNING",
    "RDY",
    "+CFUN:",
    "CONNECT",
    "CONNECT OK",
    "CONNECT FAIL",
    "ALREADY CONNECT",
    "SEND OK",
    "CLOSED",
    "RECV FROM:",
    "+IPD,",
    "+RECEIVE,",
    "REMOTE IP:",
    "+CDNSGIP:",
    "+PDP:",
    "+APP PDP:",
];

pub const NORMAL_POWER_DOWN: &str = "NORMAL POWER DOWN";

/// Returns true if `line` starts with a recognized URC prefix.
pub fn is_urc(line: &str) -> bool {
    URC_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// Bounded, append-only accumulator for URCs observed while the transport
/// is driving `run()`. Oldest entries are evicted on overflow so a
/// long-running driver cannot exhaust memory.
pub struct UrcRing {
    lines: VecDeque<String>,
    capacity: usize,
}

impl UrcRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Atomically takes and returns all accumulated URC lines, leaving the
    /// ring empty.
    pub fn drain(&mut self) -> Vec<String> {
        self.lines.drain(..).collect()
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.lines.iter().any(|line| line.starts_with(prefix))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

impl Default for UrcRing {
    fn default() -> Self {
        // Generous enough to survive a burst of URCs between polls without
        // growing unbounded.
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_catalog_prefixes() {
        assert!(is_urc("+CPIN: READY"));
        assert!(is_urc("NORMAL POWER DOWN"));
        assert!(is_urc("+IPD,10"));
    }

    #[test]
    fn rejects_unknown_lines() {
        assert!(!is_urc("SIM7080G"));
        assert!(!is_urc("+CNACT: 0,1,\"10.0.0.5\""));
    }

    #[test]
    fn evicts_oldest_on_overflow() {
        let mut ring = UrcRing::new(2);
        ring.push("a".into());
        ring.push("b".into());
        ring.push("c".into());
        assert_eq!(ring.drain(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn drain_empties_the_ring() {
        let mut ring = UrcRing::new(4);
        ring.push("+CPIN: READY".into());
        assert_eq!(ring.len(), 1);
        let drained = ring.drain();
        assert_eq!(drained, vec!["+CPIN: READY".to_string()]);
        assert_eq!(ring.len(), 0);
    }
}
