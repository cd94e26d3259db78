// ── Connection state machine ──
//
// Pure transition logic, no I/O. `DeviceSession` owns one of these behind
// a lock and is the only writer; everything observable flows out through
// the session's watch/broadcast channels.
//
//   Idle ──request──▶ RequestingCredentials ──ok──▶ ConfiguringWifi
//   Idle ──configure (credentials in hand)──▶ ConfiguringWifi
//   ConfiguringWifi ──join ok──▶ Connecting ──reachable──▶ Connected
//   any in-progress ──failure──▶ Failed (terminal until reset)
//   any ──cancel/reset──▶ Idle

use std::fmt;

/// The session's connection state. Exactly one per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    RequestingCredentials,
    ConfiguringWifi,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionState {
    /// One of the three transient negotiation states.
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            Self::RequestingCredentials | Self::ConfiguringWifi | Self::Connecting
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::RequestingCredentials => "requesting-credentials",
            Self::ConfiguringWifi => "configuring-wifi",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    /// An in-progress operation holds the machine; the new request is
    /// rejected rather than superseding it.
    Busy,
    /// Connected/Failed are terminal until an explicit reset.
    ResetRequired,
    /// The machine is not in the state this transition departs from.
    OutOfOrder,
}

/// The transition table. All methods are infallible observers or
/// `Result`-returning mutations; nothing here blocks or suspends.
#[derive(Debug)]
pub struct StateMachine {
    current: ConnectionState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: ConnectionState::Idle,
        }
    }

    pub fn current(&self) -> ConnectionState {
        self.current
    }

    fn require_idle(&self) -> Result<(), TransitionError> {
        match self.current {
            ConnectionState::Idle => Ok(()),
            s if s.is_in_progress() => Err(TransitionError::Busy),
            _ => Err(TransitionError::ResetRequired),
        }
    }

    /// Idle → RequestingCredentials.
    pub fn begin_request(&mut self) -> Result<(), TransitionError> {
        self.require_idle()?;
        self.current = ConnectionState::RequestingCredentials;
        Ok(())
    }

    /// Idle → ConfiguringWifi, for callers that already hold credentials.
    pub fn begin_configure(&mut self) -> Result<(), TransitionError> {
        self.require_idle()?;
        self.current = ConnectionState::ConfiguringWifi;
        Ok(())
    }

    /// RequestingCredentials → ConfiguringWifi.
    pub fn credentials_ok(&mut self) -> Result<(), TransitionError> {
        if self.current != ConnectionState::RequestingCredentials {
            return Err(TransitionError::OutOfOrder);
        }
        self.current = ConnectionState::ConfiguringWifi;
        Ok(())
    }

    /// ConfiguringWifi → Connecting.
    pub fn join_ok(&mut self) -> Result<(), TransitionError> {
        if self.current != ConnectionState::ConfiguringWifi {
            return Err(TransitionError::OutOfOrder);
        }
        self.current = ConnectionState::Connecting;
        Ok(())
    }

    /// Connecting → Connected.
    pub fn reachable(&mut self) -> Result<(), TransitionError> {
        if self.current != ConnectionState::Connecting {
            return Err(TransitionError::OutOfOrder);
        }
        self.current = ConnectionState::Connected;
        Ok(())
    }

    /// Any in-progress or Connected state → Failed.
    ///
    /// Failed is terminal: the machine never retries on its own.
    pub fn fail(&mut self) -> Result<(), TransitionError> {
        if self.current == ConnectionState::Idle {
            return Err(TransitionError::OutOfOrder);
        }
        self.current = ConnectionState::Failed;
        Ok(())
    }

    /// Any → Idle. Used by cancel and reset; always succeeds.
    ///
    /// Returns the state it left, so callers can skip the "cancelled"
    /// notification when nothing was actually in flight.
    pub fn to_idle(&mut self) -> ConnectionState {
        std::mem::replace(&mut self.current, ConnectionState::Idle)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
