//! Tauri commands exposed to the WebView.
//!
//! The UI learns where the API server lives through `get_api_url` and
//! issues its HTTP calls directly; process management never crosses the
//! IPC boundary.

use std::sync::Arc;

use roost_runtime::{ServerProcessInfo, Supervisor};
use tracing::debug;

use crate::error::BridgeError;

/// Get the API server's base URL.
///
/// Never blocks and never fails: before the endpoint resolves this returns
/// the fixed fallback URL, afterwards the resolved URL (constant for the
/// rest of the shell's lifetime).
#[tauri::command]
pub async fn get_api_url(
    supervisor: tauri::State<'_, Arc<Supervisor>>,
) -> Result<String, BridgeError> {
    let url = supervisor.api_url().await;
    debug!(%url, "API URL requested");
    Ok(url)
}

/// Get a diagnostic snapshot of the supervised server process.
#[tauri::command]
pub async fn get_server_info(
    supervisor: tauri::State<'_, Arc<Supervisor>>,
) -> Result<ServerProcessInfo, BridgeError> {
    Ok(supervisor.server_info().await)
}
