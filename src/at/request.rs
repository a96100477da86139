//! The AT request value object and its state machine.

use std::time::Duration;

/// Controls the wire suffix appended after `head`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtRequestKind {
    /// `AT<head>=?`
    Test,
    /// `AT<head>?`
    Read,
    /// `AT<head>=<param>`
    Write,
    /// `AT<head>`
    Exec,
}

/// The closed set of states a request passes through. Transitions are
/// monotonic within one execution: once a request leaves `Running` it
/// never returns to it, except via the explicit `Running -> RunningWait
/// -> Finished` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtRequestState {
    Init,
    Scheduled,
    Running,
    RunningWait,
    Finished,
    FinishedNull,
    Failed,
    Timeout,
}

impl AtRequestState {
    /// True while the per-command loop should keep polling the UART.
    pub fn is_running(self) -> bool {
        matches!(self, AtRequestState::Running | AtRequestState::RunningWait)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_running() && !matches!(self, AtRequestState::Init | AtRequestState::Scheduled)
    }

    /// True for any state the facade should treat as a usable modem reply
    /// (as opposed to a transport-local failure).
    pub fn succeeded(self) -> bool {
        matches!(self, AtRequestState::Finished | AtRequestState::FinishedNull)
    }
}

/// A single AT command invocation and its accumulated results.
pub struct AtRequest {
    pub head: String,
    pub kind: AtRequestKind,
    pub param: Option<String>,
    pub timeout: Duration,
    pub afterrun: Duration,
    pub data: Vec<u8>,
    pub res_tagged: Vec<String>,
    pub res_other: Vec<String>,
    pub state: AtRequestState,
}

impl AtRequest {
    pub fn new(head: impl Into<String>, kind: AtRequestKind) -> Self {
        Self {
            head: head.into(),
            kind,
            param: None,
            timeout: Duration::from_millis(1000),
            afterrun: Duration::ZERO,
            data: Vec::new(),
            res_tagged: Vec::new(),
            res_other: Vec::new(),
            state: AtRequestState::Init,
        }
    }

    pub fn exec(head: impl Into<String>) -> Self {
        Self::new(head, AtRequestKind::Exec)
    }

    pub fn read(head: impl Into<String>) -> Self {
        Self::new(head, AtRequestKind::Read)
    }

    pub fn write(head: impl Into<String>, param: impl Into<String>) -> Self {
        let mut req = Self::new(head, AtRequestKind::Write);
        req.param = Some(param.into());
        req
    }

    pub fn test(head: impl Into<String>) -> Self {
        Self::new(head, AtRequestKind::Test)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_afterrun(mut self, afterrun: Duration) -> Self {
        self.afterrun = afterrun;
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Builds the ASCII wire form `AT<head><suffix>`, without the
    /// trailing CRLF (the transport appends that when it writes).
    pub fn wire_command(&self) -> String {
        let suffix = match self.kind {
            AtRequestKind::Test => "=?".to_string(),
            AtRequestKind::Read => "?".to_string(),
            AtRequestKind::Write => format!("={}", self.param.as_deref().unwrap_or_default()),
            AtRequestKind::Exec => String::new(),
        };
        format!("AT{}{}", self.head, suffix)
    }

    /// Returns the last `res_other` line, if any — used by the facade for
    /// the single-line identity queries (`+CGMI`, `+CGMM`, ...).
    pub fn last_other(&self) -> Option<&str> {
        self.res_other.last().map(String::as_str)
    }
}
