use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Where a conversation is in its current turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    #[default]
    Idle,
    Sending,
    Streaming,
}

impl RequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Sending => "sending",
            RequestState::Streaming => "streaming",
        }
    }

    /// `Idle → Sending`; any other state means a turn is already running.
    pub fn begin_send(self, chat_id: i64) -> Result<Self, AppError> {
        match self {
            RequestState::Idle => Ok(RequestState::Sending),
            busy => Err(AppError::TurnInProgress { chat_id, state: busy.as_str().to_string() }),
        }
    }

    /// `Sending → Streaming`; already streaming stays streaming. An idle
    /// conversation has no turn to stream.
    pub fn begin_streaming(self, chat_id: i64) -> Result<Self, AppError> {
        match self {
            RequestState::Idle => Err(AppError::Unexpected(format!(
                "chat {chat_id} cannot start streaming while idle"
            ))),
            RequestState::Sending | RequestState::Streaming => Ok(RequestState::Streaming),
        }
    }

    pub fn finish(self) -> Self {
        RequestState::Idle
    }
}

/// Server-side table of per-conversation request states.
///
/// A conversation absent from the table is idle. [`TurnGuard::begin`] hands
/// out a [`TurnTicket`] that returns the conversation to idle when dropped.
#[derive(Clone, Default)]
pub struct TurnGuard {
    states: Arc<Mutex<HashMap<i64, RequestState>>>,
}

impl TurnGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, chat_id: i64) -> RequestState {
        self.states.lock().get(&chat_id).copied().unwrap_or_default()
    }

    pub fn begin(&self, chat_id: i64) -> Result<TurnTicket, AppError> {
        let mut states = self.states.lock();
        let current = states.get(&chat_id).copied().unwrap_or_default();
        let next = current.begin_send(chat_id)?;
        states.insert(chat_id, next);
        Ok(TurnTicket { chat_id, state: next, guard: self.clone() })
    }
}

impl std::fmt::Debug for TurnGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnGuard")
            .field("active", &self.states.lock().len())
            .finish()
    }
}

/// Exclusive right to run one turn on a conversation.
#[derive(Debug)]
pub struct TurnTicket {
    chat_id: i64,
    state: RequestState,
    guard: TurnGuard,
}

impl TurnTicket {
    pub fn streaming(&mut self) -> Result<(), AppError> {
        self.state = self.state.begin_streaming(self.chat_id)?;
        self.guard.states.lock().insert(self.chat_id, self.state);
        Ok(())
    }

    /// Ends the turn, returning the conversation's new state.
    pub fn finish(self) -> RequestState {
        self.state.finish()
    }
}

impl Drop for TurnTicket {
    fn drop(&mut self) {
        self.guard.states.lock().remove(&self.chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_follow_idle_sending_streaming() {
        let state = RequestState::Idle.begin_send(1).unwrap();
        assert_eq!(state, RequestState::Sending);
        let state = state.begin_streaming(1).unwrap();
        assert_eq!(state, RequestState::Streaming);
        assert_eq!(state.begin_streaming(1).unwrap(), RequestState::Streaming);
        assert_eq!(state.finish(), RequestState::Idle);
    }

    #[test]
    fn busy_states_reject_a_second_send() {
        for busy in [RequestState::Sending, RequestState::Streaming] {
            let err = busy.begin_send(7).unwrap_err();
            assert!(matches!(err, AppError::TurnInProgress { chat_id: 7, .. }));
        }
    }

    #[test]
    fn idle_cannot_start_streaming() {
        let err = RequestState::Idle.begin_streaming(5).unwrap_err();
        assert!(err.to_string().contains("chat 5"));
    }

    #[test]
    fn ticket_holds_conversation_until_dropped() {
        let guard = TurnGuard::new();
        let mut ticket = guard.begin(3).unwrap();
        assert_eq!(guard.state(3), RequestState::Sending);
        assert!(guard.begin(3).is_err());

        ticket.streaming().unwrap();
        assert_eq!(guard.state(3), RequestState::Streaming);

        // other conversations are unaffected
        drop(guard.begin(4).unwrap());

        assert_eq!(ticket.finish(), RequestState::Idle);
        assert_eq!(guard.state(3), RequestState::Idle);
        assert!(guard.begin(3).is_ok());
    }
}
