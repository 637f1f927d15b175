//! Event names emitted to the frontend.

/// Emitted once the supervisor resolves the endpoint. Payload: the port.
pub const SERVER_READY: &str = "server-ready";
