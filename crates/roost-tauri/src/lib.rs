#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

pub mod commands;
pub mod error;
pub mod events;

// Re-export primary types
pub use error::BridgeError;

/// The invoke handler wiring both bridge commands.
///
/// The shell app passes this to `tauri::Builder::invoke_handler`.
pub fn handler<R: tauri::Runtime>() -> impl Fn(tauri::ipc::Invoke<R>) -> bool + Send + Sync {
    tauri::generate_handler![commands::get_api_url, commands::get_server_info]
}
