//! Backend lifecycle.
//!
//! `Unconfigured` and `Failed` are terminal. A configured backend starts in
//! `Connecting` and moves once to `Ready` or `Failed`; a ready backend may
//! later move to `Failed`. Nothing ever moves back.

use std::sync::atomic::{AtomicU8, Ordering};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Observable state of the cache backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BackendState {
    /// No backend configured; every read reports no cache and writes are no-ops.
    Unconfigured,
    /// Backend configured, connection not yet established.
    Connecting,
    /// Backend accepting reads and writes.
    Ready,
    /// Backend lost or never reached; the cache stays disabled for the life of the process.
    Failed,
}

impl BackendState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendState::Unconfigured => "unconfigured",
            BackendState::Connecting => "connecting",
            BackendState::Ready => "ready",
            BackendState::Failed => "failed",
        }
    }

    /// Whether requests may be served from the backend.
    pub fn is_ready(&self) -> bool {
        matches!(self, BackendState::Ready)
    }

    fn to_u8(self) -> u8 {
        match self {
            BackendState::Unconfigured => 0,
            BackendState::Connecting => 1,
            BackendState::Ready => 2,
            BackendState::Failed => 3,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => BackendState::Unconfigured,
            1 => BackendState::Connecting,
            2 => BackendState::Ready,
            _ => BackendState::Failed,
        }
    }
}

impl std::fmt::Display for BackendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomically updated lifecycle cell enforcing the forward-only transitions.
#[derive(Debug)]
pub(crate) struct Lifecycle(AtomicU8);

impl Lifecycle {
    pub(crate) fn new(initial: BackendState) -> Self {
        Self(AtomicU8::new(initial.to_u8()))
    }

    pub(crate) fn get(&self) -> BackendState {
        BackendState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// `Connecting -> Ready`. Returns false if the state was anything else.
    pub(crate) fn mark_ready(&self) -> bool {
        self.transition(BackendState::Connecting, BackendState::Ready)
    }

    /// `Connecting | Ready -> Failed`. Returns true only for the call that made the change.
    pub(crate) fn mark_failed(&self) -> bool {
        self.transition(BackendState::Connecting, BackendState::Failed)
            || self.transition(BackendState::Ready, BackendState::Failed)
    }

    fn transition(&self, from: BackendState, to: BackendState) -> bool {
        self.0.compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connecting_to_ready_to_failed() {
        let lifecycle = Lifecycle::new(BackendState::Connecting);
        assert!(lifecycle.mark_ready());
        assert_eq!(lifecycle.get(), BackendState::Ready);

        assert!(lifecycle.mark_failed());
        assert_eq!(lifecycle.get(), BackendState::Failed);
    }

    #[test]
    fn test_connecting_to_failed() {
        let lifecycle = Lifecycle::new(BackendState::Connecting);
        assert!(lifecycle.mark_failed());
        assert_eq!(lifecycle.get(), BackendState::Failed);
    }

    #[test]
    fn test_failed_is_terminal() {
        let lifecycle = Lifecycle::new(BackendState::Connecting);
        lifecycle.mark_failed();

        assert!(!lifecycle.mark_ready());
        assert!(!lifecycle.mark_failed());
        assert_eq!(lifecycle.get(), BackendState::Failed);
    }

    #[test]
    fn test_unconfigured_is_terminal() {
        let lifecycle = Lifecycle::new(BackendState::Unconfigured);
        assert!(!lifecycle.mark_ready());
        assert!(!lifecycle.mark_failed());
        assert_eq!(lifecycle.get(), BackendState::Unconfigured);
    }

    #[test]
    fn test_ready_only_once() {
        let lifecycle = Lifecycle::new(BackendState::Connecting);
        assert!(lifecycle.mark_ready());
        assert!(!lifecycle.mark_ready());
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(serde_json::to_string(&BackendState::Ready).unwrap(), "\"ready\"");
        assert_eq!(BackendState::Unconfigured.to_string(), "unconfigured");
        assert!(BackendState::Ready.is_ready());
        assert!(!BackendState::Connecting.is_ready());
    }
}
