//! Supervisor lifecycle state machine.

use serde::Serialize;

use crate::endpoint::ServerEndpoint;

/// Lifecycle state of the process supervisor.
///
/// Exactly one instance exists per shell process. The happy path is
/// `NotStarted → Spawning → AwaitingAnnouncement → Ready → Terminating →
/// Stopped`; `Failed` is reachable from `Spawning` and
/// `AwaitingAnnouncement` only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "camelCase")]
pub enum SupervisorState {
    /// No launch attempt has been made yet.
    #[default]
    NotStarted,
    /// The child process is being spawned.
    Spawning,
    /// The child is running; watching its output for the announcement.
    AwaitingAnnouncement,
    /// The announcement parsed; the endpoint is accepting connections.
    Ready(ServerEndpoint),
    /// A termination signal is being delivered to the child.
    Terminating,
    /// The child has been released.
    Stopped,
    /// The launch attempt failed terminally.
    Failed {
        /// Human-readable failure cause.
        reason: String,
    },
}

impl SupervisorState {
    /// The resolved endpoint, if the supervisor reached `Ready`.
    #[must_use]
    pub const fn endpoint(&self) -> Option<&ServerEndpoint> {
        match self {
            Self::Ready(endpoint) => Some(endpoint),
            _ => None,
        }
    }

    /// Whether the supervisor is serving a resolved endpoint.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_started() {
        assert_eq!(SupervisorState::default(), SupervisorState::NotStarted);
    }

    #[test]
    fn ready_exposes_endpoint() {
        let state = SupervisorState::Ready(ServerEndpoint::new("localhost", 43210));
        assert!(state.is_ready());
        assert_eq!(state.endpoint().map(|e| e.port), Some(43210));
    }

    #[test]
    fn non_ready_states_have_no_endpoint() {
        assert!(SupervisorState::AwaitingAnnouncement.endpoint().is_none());
        assert!(!SupervisorState::Stopped.is_ready());
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_string(&SupervisorState::Failed {
            reason: "timeout".to_string(),
        })
        .unwrap();
        assert!(json.contains("\"state\":\"failed\""));
        assert!(json.contains("timeout"));
    }
}
