#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

pub mod announce;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod state;

// Re-export commonly used types for convenience
pub use announce::{announcement_line, parse_announcement};
pub use config::{
    DEFAULT_DISCOVERY_TIMEOUT, DEFAULT_FALLBACK_PORT, DEFAULT_HOST, SupervisorConfig,
};
pub use endpoint::ServerEndpoint;
pub use error::SupervisorError;
pub use state::SupervisorState;
